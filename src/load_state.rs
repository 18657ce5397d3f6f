//! Load phases and the read-only state snapshot handed to hosts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LoaderError;

/// Current phase of a single image's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Nothing requested yet, or the last load was cancelled
    #[default]
    Initial,
    /// A fetch is in flight
    Loading,
    /// The image is ready to display
    Loaded,
    /// The last fetch failed
    Error,
}

impl LoadState {
    /// Name used by hosts and in log output.
    pub fn name(&self) -> &'static str {
        match self {
            LoadState::Initial => "initial",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Error => "error",
        }
    }

    /// Whether `start()` is allowed to open a new fetch from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, LoadState::Initial | LoadState::Error)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoadState {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(LoadState::Initial),
            "loading" => Ok(LoadState::Loading),
            "loaded" => Ok(LoadState::Loaded),
            "error" => Ok(LoadState::Error),
            other => Err(LoaderError::invalid_state(other)),
        }
    }
}

/// Copy of the tracked controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerState {
    pub load_state: LoadState,
    pub on_line: bool,
    /// Only ever true while `load_state` is `Loading`
    pub over_threshold: bool,
    pub controlled_load: bool,
}
