//! Lazy image loading with low quality placeholders.
//!
//! Each [`ImageLoadController`] tracks the lifecycle of exactly one image:
//! a placeholder is shown until the full image is fetched, either
//! automatically or on click, with online/offline awareness and a
//! slow-network threshold. The controller is generic over a [`Platform`]
//! so the state machine runs natively in tests; the `web` module binds it to
//! the browser on wasm32.

mod callback;
mod config;
mod constants;
mod controller;
mod error;
mod indicator;
mod load_state;
mod logging;
mod platform;

pub use callback::{Deferred, Listener, Override};
pub use config::{CompletionStrategy, IconStyle, LoaderConfig, LogLevel, Signal};
pub use constants::*;
pub use controller::{ImageLoadController, LoaderInputs};
pub use error::{LoadFailure, LoaderError, Result};
pub use indicator::{Indicator, RenderModel, state_to_indicator};
pub use load_state::{ControllerState, LoadState};
pub use logging::init_logging;
pub use platform::{
    ConnectionEvent, FetchOutcome, LoadToken, Platform, PlatformEvent, Release,
};

// Browser bindings
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{LazyImage, WebImageLoader};
