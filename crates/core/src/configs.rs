//! Configuration file types
//!
//! `codelink.yml` lives at the workspace root. Every type here derives
//! [`schemars::JsonSchema`] so the CLI can publish the file's schema.

pub mod codelink;
pub mod display;

pub use codelink::{
    config_path, load_config, parse_config, CodelinkConfig, DesignConfig, CONFIG_FILE_NAME,
};
pub use display::{DisplayConfig, SpinnerConfig};
