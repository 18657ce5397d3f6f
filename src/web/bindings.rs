//! JavaScript-facing handle.
//!
//! ```js
//! import init, { LazyImage } from "./lazy_image.js";
//! await init();
//! const image = new LazyImage(JSON.stringify({ src, width, height, lqip, threshold_ms: 2000 }));
//! image.setOnLoadStateChange((state) => render(JSON.parse(image.renderModel())));
//! image.mount();
//! element.onclick = () => image.click();
//! ```

use js_sys::Function;
use wasm_bindgen::prelude::*;

use super::WebImageLoader;
use crate::config::LoaderConfig;
use crate::controller::LoaderInputs;
use crate::logging::init_logging;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// One lazily loaded image, driven from JavaScript.
#[wasm_bindgen]
pub struct LazyImage {
    loader: WebImageLoader,
}

#[wasm_bindgen]
impl LazyImage {
    /// Create an unmounted loader from a JSON configuration document.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<LazyImage, JsError> {
        let config = LoaderConfig::from_json(config_json)?;
        init_logging(config.log_level);
        Ok(Self {
            loader: WebImageLoader::new(config)?,
        })
    }

    pub fn mount(&self) -> Result<(), JsError> {
        self.loader.with(|c| c.mount())??;
        Ok(())
    }

    pub fn unmount(&self) -> Result<(), JsError> {
        self.loader.with(|c| c.unmount())?;
        Ok(())
    }

    pub fn start(&self) -> Result<(), JsError> {
        self.loader.with(|c| c.start())??;
        Ok(())
    }

    pub fn cancel(&self) -> Result<(), JsError> {
        self.loader.with(|c| c.cancel())?;
        Ok(())
    }

    pub fn click(&self) -> Result<(), JsError> {
        self.loader.with(|c| c.click())??;
        Ok(())
    }

    /// Supply this cycle's inputs. Pass `undefined` for inputs the loader
    /// controls itself.
    pub fn update(
        &self,
        src: Option<String>,
        load: Option<bool>,
        online: Option<bool>,
    ) -> Result<(), JsError> {
        let inputs = LoaderInputs { src, load, online };
        self.loader.with(|c| c.update(inputs))??;
        Ok(())
    }

    /// Current load state name: `initial`, `loading`, `loaded` or `error`.
    pub fn state(&self) -> Result<String, JsError> {
        Ok(self.loader.read(|c| c.load_state().name().to_string())?)
    }

    pub fn indicator(&self) -> Result<String, JsError> {
        Ok(self.loader.read(|c| c.indicator().name().to_string())?)
    }

    #[wasm_bindgen(js_name = isOnline)]
    pub fn is_online(&self) -> Result<bool, JsError> {
        Ok(self.loader.read(|c| c.is_online())?)
    }

    #[wasm_bindgen(js_name = overThreshold)]
    pub fn over_threshold(&self) -> Result<bool, JsError> {
        Ok(self.loader.read(|c| c.over_threshold())?)
    }

    /// JSON encoded model for the rendering surface.
    #[wasm_bindgen(js_name = renderModel)]
    pub fn render_model(&self) -> Result<String, JsError> {
        let model = self.loader.read(|c| c.render_model())?;
        Ok(serde_json::to_string(&model)?)
    }

    /// Register `callback(stateName)` for every load state transition.
    ///
    /// Callbacks run once the loader call that caused the transition has
    /// returned, so they may read or drive this object.
    #[wasm_bindgen(js_name = setOnLoadStateChange)]
    pub fn set_on_load_state_change(&self, callback: Option<Function>) {
        self.loader.set_on_load_state_change(callback);
    }

    /// Register `callback(json)` receiving each elapsed-time event while loading.
    #[wasm_bindgen(js_name = setOnConnection)]
    pub fn set_on_connection(&self, callback: Option<Function>) {
        self.loader.set_on_connection(callback);
    }
}
