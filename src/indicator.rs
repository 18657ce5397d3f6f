//! Status indicator selection and the model handed to the rendering surface.

use serde::Serialize;

use crate::config::{IconStyle, LoaderConfig};
use crate::load_state::{ControllerState, LoadState};

/// Status indicator shown over the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    /// Click to start loading
    Load,
    /// No network, loading is not possible
    Offline,
    /// Fetch in progress
    Loading,
    /// Image is displayed
    Loaded,
    /// Last fetch failed, click to retry
    Error,
}

impl Indicator {
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Load => "load",
            Indicator::Offline => "offline",
            Indicator::Loading => "loading",
            Indicator::Loaded => "loaded",
            Indicator::Error => "error",
        }
    }
}

/// Default mapping from tracked state to indicator.
///
/// `over_threshold` does not change the result yet; a distinct slow-loading
/// indicator would go in the `Loading` arm.
pub fn state_to_indicator(state: &ControllerState) -> Indicator {
    match state.load_state {
        LoadState::Loaded => Indicator::Loaded,
        LoadState::Loading => Indicator::Loading,
        LoadState::Initial if state.on_line => Indicator::Load,
        LoadState::Error if state.on_line => Indicator::Error,
        LoadState::Initial | LoadState::Error => Indicator::Offline,
    }
}

/// Everything the rendering surface needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub lqip: String,
    pub alt: Option<String>,
    /// Show the full image instead of the placeholder
    pub show_image: bool,
    pub indicator: Indicator,
    pub icon: IconStyle,
}

impl RenderModel {
    pub fn new(config: &LoaderConfig, state: &ControllerState, indicator: Indicator) -> Self {
        Self {
            src: config.src.clone(),
            width: config.width,
            height: config.height,
            lqip: config.lqip.clone(),
            alt: config.alt.clone(),
            show_image: state.load_state == LoadState::Loaded,
            indicator,
            icon: config.icon.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(load_state: LoadState, on_line: bool, over_threshold: bool) -> ControllerState {
        ControllerState {
            load_state,
            on_line,
            over_threshold,
            controlled_load: false,
        }
    }

    #[test]
    fn test_indicator_table() {
        let cases = [
            (LoadState::Initial, true, Indicator::Load),
            (LoadState::Initial, false, Indicator::Offline),
            (LoadState::Loading, true, Indicator::Loading),
            (LoadState::Loading, false, Indicator::Loading),
            (LoadState::Loaded, true, Indicator::Loaded),
            (LoadState::Loaded, false, Indicator::Loaded),
            (LoadState::Error, true, Indicator::Error),
            (LoadState::Error, false, Indicator::Offline),
        ];
        for (load_state, on_line, expected) in cases {
            assert_eq!(
                state_to_indicator(&state(load_state, on_line, false)),
                expected,
                "{} online={}",
                load_state,
                on_line
            );
        }
    }

    #[test]
    fn test_slow_loading_uses_loading_indicator() {
        assert_eq!(
            state_to_indicator(&state(LoadState::Loading, true, true)),
            Indicator::Loading
        );
    }

    #[test]
    fn test_render_model_shows_image_when_loaded() {
        let config = LoaderConfig::new("a.jpg", 4, 3).with_lqip("lqip").with_alt("alt");
        let loaded = state(LoadState::Loaded, true, false);
        let model = RenderModel::new(&config, &loaded, state_to_indicator(&loaded));
        assert!(model.show_image);
        assert_eq!(model.indicator, Indicator::Loaded);
        assert_eq!(model.alt.as_deref(), Some("alt"));

        let initial = state(LoadState::Initial, true, false);
        let model = RenderModel::new(&config, &initial, state_to_indicator(&initial));
        assert!(!model.show_image);
        assert_eq!(model.lqip, "lqip");
    }
}
