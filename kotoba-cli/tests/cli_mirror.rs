use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use filetime::FileTime;
use httpmock::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const LAST_MODIFIED: &str = "Mon, 01 Apr 2019 12:30:15 GMT";
const LAST_MODIFIED_UNIX: i64 = 1_554_121_815;

const A1_LISTING: &str = r#"{"DATA":[
  {"RAWID":"A1-0001","KANA":"みず","KANJI":"水","ROMAJI":"mizu","UWRD":"water",
   "ATTR":[{"level":"A1","utext":"act","topic":1,"lesson":2}]},
  {"RAWID":"A1-0002","KANA":"おちゃ","KANJI":"お茶","ROMAJI":"ocha","UWRD":"tea",
   "ATTR":[{"level":"A1","utext":"vocab","topic":"3","lesson":"4"}]}
]}"#;

fn kotoba_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kotoba"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("RUST_LOG", "warn");
    cmd
}

/// `kotoba init` pointed at `server` with everything under `home/out`.
fn init_for(home: &TempDir, server: &MockServer) {
    kotoba_cmd(home.path())
        .args(["init", "--base-url"])
        .arg(server.base_url())
        .arg("--output-dir")
        .arg(home.path().join("out"))
        .assert()
        .success();
}

fn mock_listing(server: &MockServer, level: &str, body: &'static str) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/SearchCategoryAPI")
            .query_param("lv", level)
            .query_param("ut", "en");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(body);
    });
}

fn mock_audio(server: &MockServer, path: &str, body: &'static str) {
    let path = path.to_string();
    server.mock(move |when, then| {
        when.method(GET).path(path);
        then.status(200)
            .header("Last-Modified", LAST_MODIFIED)
            .body(body);
    });
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let home = TempDir::new().unwrap();

    kotoba_cmd(home.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Wrote config"));
    assert!(home.path().join(".kotoba").join("config.yaml").is_file());

    kotoba_cmd(home.path()).arg("init").assert().failure();
    kotoba_cmd(home.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn explicit_config_path_is_honoured() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.yaml");

    kotoba_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["init", "--base-url", "http://mirror.test"])
        .assert()
        .success();

    let text = fs::read_to_string(&config).unwrap();
    assert!(text.contains("http://mirror.test"));
    assert!(!home.path().join(".kotoba").exists());
}

#[test]
fn words_exports_pipe_delimited_csv() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    init_for(&home, &server);
    mock_listing(&server, "A1", A1_LISTING);

    kotoba_cmd(home.path())
        .args(["words", "--language", "en", "--level", "A1"])
        .assert()
        .success()
        .stdout(contains("Exported en-A1 (2 words)"));

    let csv = home
        .path()
        .join("out")
        .join("words")
        .join("MARUGOTO-NO-KOTOBA-en-A1.csv");
    assert_eq!(
        fs::read_to_string(csv).unwrap(),
        "A1-0001|みず|水|mizu|water|[sound:A1W_0001.mp3]|A1 Lesson2 Topic1 act\r\n\
         A1-0002|おちゃ|お茶|ocha|tea|[sound:A1W_0002.mp3]|A1 Lesson4 Topic3 vocab\r\n"
    );
}

#[test]
fn words_fails_when_listing_is_unavailable() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    init_for(&home, &server);
    server.mock(|when, then| {
        when.method(GET).path("/SearchCategoryAPI");
        then.status(500);
    });

    kotoba_cmd(home.path())
        .args(["words", "--language", "en", "--level", "A1"])
        .assert()
        .failure()
        .stdout(contains("en-A1"));
}

#[test]
fn audio_mirrors_then_skips_fresh_assets() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    init_for(&home, &server);
    mock_listing(&server, "A1", A1_LISTING);
    mock_audio(&server, "/res/keyword/audio/A1W/A1W_0001.mp3", "first-audio");
    mock_audio(&server, "/res/keyword/audio/A1W/A1W_0002.mp3", "second-audio");

    kotoba_cmd(home.path())
        .args(["audio", "--level", "A1"])
        .assert()
        .success()
        .stdout(contains("A1: 2 downloaded, 0 fresh, 0 failed"));

    let media = home
        .path()
        .join("out")
        .join("media")
        .join("MARUGOTO-NO-KOTOBA-A1");
    let first = media.join("A1W_0001.mp3");
    assert_eq!(fs::read(&first).unwrap(), b"first-audio");
    let meta = fs::metadata(&first).unwrap();
    assert_eq!(
        FileTime::from_last_modification_time(&meta).unix_seconds(),
        LAST_MODIFIED_UNIX
    );

    kotoba_cmd(home.path())
        .args(["audio", "--level", "A1"])
        .assert()
        .success()
        .stdout(contains("A1: 0 downloaded, 2 fresh, 0 failed"));
}

#[test]
fn strict_audio_fails_on_missing_asset() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    init_for(&home, &server);
    mock_listing(&server, "A1", A1_LISTING);
    mock_audio(&server, "/res/keyword/audio/A1W/A1W_0001.mp3", "first-audio");
    server.mock(|when, then| {
        when.method(GET).path("/res/keyword/audio/A1W/A1W_0002.mp3");
        then.status(404);
    });

    kotoba_cmd(home.path())
        .args(["audio", "--level", "A1"])
        .assert()
        .success()
        .stdout(contains("1 downloaded, 0 fresh, 1 failed"))
        .stdout(contains("A1-0002"));

    kotoba_cmd(home.path())
        .args(["audio", "--level", "A1", "--strict"])
        .assert()
        .failure()
        .stdout(contains("0 downloaded, 1 fresh, 1 failed"));
}

#[test]
fn all_still_mirrors_audio_when_a_word_list_fails() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start();
    let out = home.path().join("out");
    let config = home.path().join("kotoba.yaml");
    fs::write(
        &config,
        format!(
            "base_url: {}\noutput_dir: {}\nlevels: [A1]\nlanguages: [en, es]\n",
            server.base_url(),
            out.display()
        ),
    )
    .unwrap();

    mock_listing(&server, "A1", A1_LISTING);
    server.mock(|when, then| {
        when.method(GET)
            .path("/SearchCategoryAPI")
            .query_param("ut", "es");
        then.status(500);
    });
    mock_audio(&server, "/res/keyword/audio/A1W/A1W_0001.mp3", "first-audio");
    mock_audio(&server, "/res/keyword/audio/A1W/A1W_0002.mp3", "second-audio");

    kotoba_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("all")
        .assert()
        .failure()
        .stdout(contains("Exported en-A1 (2 words)"))
        .stdout(contains("es-A1"))
        .stdout(contains("A1: 2 downloaded, 0 fresh, 0 failed"));

    let media = out.join("media").join("MARUGOTO-NO-KOTOBA-A1");
    assert_eq!(fs::read(media.join("A1W_0002.mp3")).unwrap(), b"second-audio");
}

#[test]
fn audio_rejects_zero_concurrency() {
    let home = TempDir::new().unwrap();
    kotoba_cmd(home.path())
        .args(["audio", "--concurrency", "0"])
        .assert()
        .failure();
}

#[test]
fn status_reports_local_mirror_as_json() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("out");
    kotoba_cmd(home.path())
        .args(["init", "--output-dir"])
        .arg(&out)
        .assert()
        .success();

    let media = out.join("media").join("MARUGOTO-NO-KOTOBA-A1");
    fs::create_dir_all(&media).unwrap();
    fs::write(media.join("A1W_0001.mp3"), b"abcd").unwrap();
    fs::write(media.join("A1W_0002.mp3.kotoba.tmp"), b"ab").unwrap();
    let words = out.join("words");
    fs::create_dir_all(&words).unwrap();
    fs::write(words.join("MARUGOTO-NO-KOTOBA-en-A1.csv"), b"x\r\n").unwrap();

    let output = kotoba_cmd(home.path())
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let a1 = &json["levels"][0];
    assert_eq!(a1["level"], "A1");
    assert_eq!(a1["assets"], 1);
    assert_eq!(a1["bytes"], 4);
    assert_eq!(a1["leftover_tmp"].as_array().unwrap().len(), 1);

    let lists = json["word_lists"].as_array().unwrap();
    let en_a1 = lists
        .iter()
        .find(|l| l["language"] == "en" && l["level"] == "A1")
        .unwrap();
    assert_eq!(en_a1["present"], true);
    let es_a1 = lists
        .iter()
        .find(|l| l["language"] == "es" && l["level"] == "A1")
        .unwrap();
    assert_eq!(es_a1["present"], false);
}
