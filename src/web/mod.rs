//! Browser bindings (wasm32 only).

mod bindings;
mod platform;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;

pub use bindings::LazyImage;
pub use platform::{
    EventRouter, Notifier, SharedController, WebFetch, WebPlatform, WebReachability, WebTicker,
};

use crate::config::LoaderConfig;
use crate::controller::ImageLoadController;
use crate::error::{LoaderError, Result};

/// A mounted-or-not controller wired to the browser.
///
/// Cloning shares the same controller. JavaScript hooks run after the call
/// that triggered them has released the controller, so they may call back in.
#[derive(Clone)]
pub struct WebImageLoader {
    controller: SharedController,
    notifier: Notifier,
}

impl WebImageLoader {
    pub fn new(config: LoaderConfig) -> Result<Self> {
        let notifier = Notifier::new();
        let router = EventRouter::new(notifier.clone());
        let platform = WebPlatform::new(router.clone())?;
        let mut controller = ImageLoadController::new(config, platform)?;
        notifier.install(&mut controller);
        let controller = Rc::new(RefCell::new(controller));
        router.attach(&controller);
        Ok(Self {
            controller,
            notifier,
        })
    }

    /// Run `f` with exclusive access to the controller, then deliver the
    /// notifications it raised.
    pub fn with<R>(&self, f: impl FnOnce(&mut ImageLoadController<WebPlatform>) -> R) -> Result<R> {
        let result = {
            let mut controller = self.controller.try_borrow_mut().map_err(|_| {
                LoaderError::invalid_state("loader re-entered while it is being updated")
            })?;
            f(&mut controller)
        };
        self.notifier.flush();
        Ok(result)
    }

    /// Run `f` with shared access to the controller.
    pub fn read<R>(&self, f: impl FnOnce(&ImageLoadController<WebPlatform>) -> R) -> Result<R> {
        let controller = self.controller.try_borrow().map_err(|_| {
            LoaderError::invalid_state("loader read while it is being updated")
        })?;
        Ok(f(&controller))
    }

    pub fn set_on_load_state_change(&self, callback: Option<Function>) {
        self.notifier.set_on_load_state_change(callback);
    }

    pub fn set_on_connection(&self, callback: Option<Function>) {
        self.notifier.set_on_connection(callback);
    }
}
