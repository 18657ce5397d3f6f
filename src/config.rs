//! Construction-time configuration for an image loader.
//!
//! A [`LoaderConfig`] can be built in code or parsed from JSON, which is how the
//! wasm bindings receive it from JavaScript hosts.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::constants::{
    DEFAULT_DECODE_RETRIES, DEFAULT_ICON_COLOR, DEFAULT_ICON_SIZE, DEFAULT_TICK_INTERVAL_MS,
};
use crate::error::{LoaderError, Result};

/// Log level setting for the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    #[default]
    Warn,
    /// Show errors, warnings, and info messages
    Info,
    /// Show debug-level logging, including every transition
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// Convert to log crate's Level.
    pub fn to_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Who drives a boolean input of the loader.
///
/// The mode is fixed for the lifetime of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// The loader derives the value itself (click or platform events)
    #[default]
    Uncontrolled,
    /// The host supplies the value on every update. `None` means the host
    /// declared control but has not supplied a value yet.
    Controlled(Option<bool>),
}

impl Signal {
    pub fn controlled(value: bool) -> Self {
        Signal::Controlled(Some(value))
    }

    pub fn is_controlled(&self) -> bool {
        matches!(self, Signal::Controlled(_))
    }

    /// The supplied value, if controlled and supplied.
    pub fn value(&self) -> Option<bool> {
        match self {
            Signal::Uncontrolled => None,
            Signal::Controlled(value) => *value,
        }
    }
}

/// How completion of a fetch is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStrategy {
    /// Await the platform's explicit decode signal, falling back to the load
    /// callback when unsupported. No elapsed-time ticker.
    Decode,
    /// Load/error/abort callbacks plus a recurring elapsed-time ticker that
    /// drives the slow-network flag.
    #[default]
    CallbackWithTimer,
}

/// Presentation hints passed through to the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconStyle {
    #[serde(default = "default_icon_color")]
    pub color: String,
    #[serde(default = "default_icon_size")]
    pub size: u32,
}

fn default_icon_color() -> String {
    DEFAULT_ICON_COLOR.to_string()
}

fn default_icon_size() -> u32 {
    DEFAULT_ICON_SIZE
}

impl Default for IconStyle {
    fn default() -> Self {
        Self {
            color: default_icon_color(),
            size: default_icon_size(),
        }
    }
}

/// Configuration of one image loader instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// URL of the full image
    pub src: String,

    /// Intrinsic width in px
    pub width: u32,

    /// Intrinsic height in px
    pub height: u32,

    /// Low quality image placeholder shown until the image is loaded
    #[serde(default)]
    pub lqip: String,

    /// Alternative text
    #[serde(default)]
    pub alt: Option<String>,

    /// Whether loading is started by the host or by clicks
    #[serde(default)]
    pub load: Signal,

    /// Whether reachability is supplied by the host or observed from the platform
    #[serde(default)]
    pub online: Signal,

    /// Elapsed-time tick period while loading
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Elapsed time after which a load counts as slow
    #[serde(default)]
    pub threshold_ms: Option<u64>,

    /// Resource size in bytes, reported in instrumentation events only
    #[serde(default)]
    pub size: Option<u64>,

    #[serde(default)]
    pub strategy: CompletionStrategy,

    /// Automatic retries after a failed decode (decode strategy only)
    #[serde(default = "default_decode_retries")]
    pub decode_retries: u32,

    #[serde(default)]
    pub icon: IconStyle,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_decode_retries() -> u32 {
    DEFAULT_DECODE_RETRIES
}

impl LoaderConfig {
    /// Create a configuration with defaults for everything but the image itself.
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
            lqip: String::new(),
            alt: None,
            load: Signal::Uncontrolled,
            online: Signal::Uncontrolled,
            tick_interval_ms: default_tick_interval_ms(),
            threshold_ms: None,
            size: None,
            strategy: CompletionStrategy::default(),
            decode_retries: default_decode_retries(),
            icon: IconStyle::default(),
            log_level: LogLevel::default(),
        }
    }

    pub fn with_lqip(mut self, lqip: impl Into<String>) -> Self {
        self.lqip = lqip.into();
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_load(mut self, load: Signal) -> Self {
        self.load = load;
        self
    }

    pub fn with_online(mut self, online: Signal) -> Self {
        self.online = online;
        self
    }

    pub fn with_tick_interval_ms(mut self, interval: u64) -> Self {
        self.tick_interval_ms = interval;
        self
    }

    pub fn with_threshold_ms(mut self, threshold: u64) -> Self {
        self.threshold_ms = Some(threshold);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_strategy(mut self, strategy: CompletionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_decode_retries(mut self, retries: u32) -> Self {
        self.decode_retries = retries;
        self
    }

    pub fn with_icon(mut self, icon: IconStyle) -> Self {
        self.icon = icon;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn threshold(&self) -> Option<Duration> {
        self.threshold_ms.map(Duration::from_millis)
    }

    /// Check the configuration for values the controller cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.src.is_empty() {
            return Err(LoaderError::configuration("src must not be empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(LoaderError::configuration(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(LoaderError::configuration(
                "tick interval must be greater than zero",
            ));
        }
        if self.online == Signal::Controlled(None) {
            return Err(LoaderError::configuration(
                "You should pass onLine value to controlled component",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LoaderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config =
            LoaderConfig::from_json(r#"{"src": "https://example.com/a.jpg", "width": 300, "height": 200}"#)
                .unwrap();
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(config.threshold_ms, None);
        assert_eq!(config.load, Signal::Uncontrolled);
        assert_eq!(config.online, Signal::Uncontrolled);
        assert_eq!(config.strategy, CompletionStrategy::CallbackWithTimer);
        assert_eq!(config.icon, IconStyle::default());
        assert_eq!(config.decode_retries, DEFAULT_DECODE_RETRIES);
    }

    #[test]
    fn test_controlled_signals_from_json() {
        let config = LoaderConfig::from_json(
            r#"{
                "src": "a.jpg", "width": 1, "height": 1,
                "load": {"controlled": null},
                "online": {"controlled": false},
                "strategy": "decode",
                "threshold_ms": 200
            }"#,
        )
        .unwrap();
        assert_eq!(config.load, Signal::Controlled(None));
        assert_eq!(config.online, Signal::controlled(false));
        assert_eq!(config.strategy, CompletionStrategy::Decode);
        assert_eq!(config.threshold(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = LoaderConfig::new("a.jpg", 10, 20)
            .with_lqip("data:image/jpeg;base64,AAAA")
            .with_alt("A cat")
            .with_threshold_ms(1000);
        let parsed = LoaderConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_unusable_values() {
        assert!(LoaderConfig::new("", 1, 1).validate().is_err());
        assert!(LoaderConfig::new("a.jpg", 0, 1).validate().is_err());
        assert!(LoaderConfig::new("a.jpg", 1, 1)
            .with_tick_interval_ms(0)
            .validate()
            .is_err());
        assert!(LoaderConfig::new("a.jpg", 1, 1)
            .with_online(Signal::Controlled(None))
            .validate()
            .is_err());
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let err = LoaderConfig::from_json("{").unwrap_err();
        assert!(matches!(err, LoaderError::Json(_)));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
