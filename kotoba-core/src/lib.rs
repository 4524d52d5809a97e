//! Kotoba core library: domain types, asset layout, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: identities, descriptors, level/language ids
//! - [`layout`]: identity → remote URL / local file name mapping
//! - [`config`]: `~/.kotoba/config.yaml` load / save
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod layout;
pub mod types;

pub use config::MirrorConfig;
pub use error::ConfigError;
pub use layout::{AssetLayout, AudioLayout};
pub use types::{LanguageId, LevelId, RemoteDescriptor, ResourceIdentity};
