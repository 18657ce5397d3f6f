//! Global constants for the lazy image loader

/// Default period between elapsed-time ticks while loading, in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

/// Default icon fill color handed to the rendering surface
pub const DEFAULT_ICON_COLOR: &str = "#fff";

/// Default icon size in px handed to the rendering surface
pub const DEFAULT_ICON_SIZE: u32 = 64;

/// Automatic retries after a failed decode before waiting for the user
pub const DEFAULT_DECODE_RETRIES: u32 = 1;

/// Name of the DOM event carrying elapsed-time instrumentation
pub const CONNECTION_EVENT_NAME: &str = "connection";
