use std::io::{self, IsTerminal};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::display::SpinnerOptions;
use crate::types::{CodelinkError, CodelinkResult};

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DisplayConfig {
    pub spinner: Option<SpinnerConfig>,
    /// Set to false to disable ANSI colours
    pub color: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpinnerConfig {
    pub frames: Option<Vec<String>>,
    pub interval_ms: Option<u64>,
    /// Set to false to print only final status lines, even on a terminal
    pub enabled: Option<bool>,
}

impl DisplayConfig {
    pub fn validate(&self) -> CodelinkResult<()> {
        let Some(spinner) = &self.spinner else {
            return Ok(());
        };
        if spinner.frames.as_ref().is_some_and(|frames| frames.is_empty()) {
            return Err(CodelinkError::Config(
                "display.spinner.frames must not be empty".to_string(),
            ));
        }
        if spinner.interval_ms == Some(0) {
            return Err(CodelinkError::Config(
                "display.spinner.intervalMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn color_enabled(&self) -> bool {
        self.color.unwrap_or(true)
    }

    pub fn spinner_options(&self) -> SpinnerOptions {
        let terminal = io::stderr().is_terminal();
        self.spinner_options_for(terminal)
    }

    fn spinner_options_for(&self, terminal: bool) -> SpinnerOptions {
        let mut options = SpinnerOptions {
            interactive: terminal,
            ..SpinnerOptions::default()
        };
        let Some(spinner) = &self.spinner else {
            return options;
        };
        if let Some(frames) = &spinner.frames {
            options.frames = frames.clone();
        }
        if let Some(interval_ms) = spinner.interval_ms {
            options.interval = Duration::from_millis(interval_ms);
        }
        options.interactive = terminal && spinner.enabled.unwrap_or(true);
        options
    }
}
