//! Browser implementation of the platform seam.
//!
//! Fetches are `HtmlImageElement`s, the ticker is `setInterval`, reachability
//! comes from the window's `online`/`offline` events. Every browser callback
//! is routed back to its controller through an [`EventRouter`], which holds
//! only a weak reference so the controller can be dropped at any time.
//! Controller hooks reach JavaScript through a [`Notifier`] once the
//! controller is no longer borrowed.

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::{Function, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{CustomEvent, CustomEventInit, HtmlImageElement, Window};
use web_time::{Duration, Instant};

use crate::callback::Deferred;
use crate::config::CompletionStrategy;
use crate::constants::CONNECTION_EVENT_NAME;
use crate::controller::ImageLoadController;
use crate::error::{LoadFailure, LoaderError, Result};
use crate::load_state::LoadState;
use crate::platform::{
    ConnectionEvent, FetchOutcome, LoadToken, Platform, PlatformEvent, Release,
};

/// Controller shared between the JS-facing handle and browser callbacks.
pub type SharedController = Rc<RefCell<ImageLoadController<WebPlatform>>>;

/// Filled once the controller exists; browser callbacks only need a weak link.
type ControllerSlot = Rc<OnceCell<Weak<RefCell<ImageLoadController<WebPlatform>>>>>;

/// Delivers browser callbacks to the controller that requested them.
#[derive(Clone)]
pub struct EventRouter {
    slot: ControllerSlot,
    notifier: Notifier,
}

impl EventRouter {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            slot: ControllerSlot::default(),
            notifier,
        }
    }

    /// Point the router at its controller. Later calls are ignored.
    pub fn attach(&self, controller: &SharedController) {
        if self.slot.set(Rc::downgrade(controller)).is_err() {
            log::warn!("Event router already attached");
        }
    }

    fn deliver(&self, event: PlatformEvent) {
        let Some(controller) = self.slot.get().and_then(Weak::upgrade) else {
            return;
        };
        let Ok(mut borrowed) = controller.try_borrow_mut() else {
            // Fired synchronously from inside a controller call; retry
            // once the current call has returned.
            let router = self.clone();
            spawn_local(async move { router.deliver(event) });
            return;
        };
        borrowed.handle(event);
        drop(borrowed);
        self.notifier.flush();
    }
}

enum Notification {
    LoadState(LoadState),
    Connection(ConnectionEvent),
}

#[derive(Default)]
struct JsHooks {
    on_load_state_change: Option<Function>,
    on_connection: Option<Function>,
}

/// JavaScript hooks and the notifications waiting to reach them.
///
/// The controller only enqueues; [`flush`](Self::flush) runs after its borrow
/// has ended so hooks may call back into the loader.
#[derive(Clone, Default)]
pub struct Notifier {
    pending: Deferred<Notification>,
    hooks: Rc<RefCell<JsHooks>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route the controller's hooks into this notifier's queue.
    pub fn install(&self, controller: &mut ImageLoadController<WebPlatform>) {
        let pending = self.pending.clone();
        controller.on_load_state_change(move |state| pending.push(Notification::LoadState(state)));
        let pending = self.pending.clone();
        controller.on_connection(move |event| pending.push(Notification::Connection(event)));
    }

    pub fn set_on_load_state_change(&self, callback: Option<Function>) {
        self.hooks.borrow_mut().on_load_state_change = callback;
    }

    pub fn set_on_connection(&self, callback: Option<Function>) {
        self.hooks.borrow_mut().on_connection = callback;
    }

    /// Hand every queued notification to its hook, oldest first.
    pub fn flush(&self) {
        while let Some(notification) = self.pending.pop() {
            match notification {
                Notification::LoadState(state) => {
                    let hook = self.hooks.borrow().on_load_state_change.clone();
                    if let Some(hook) = hook {
                        if let Err(e) = hook.call1(&JsValue::NULL, &JsValue::from_str(state.name())) {
                            log::warn!("onLoadStateChange callback threw: {:?}", e);
                        }
                    }
                }
                Notification::Connection(event) => {
                    let hook = self.hooks.borrow().on_connection.clone();
                    let Some(hook) = hook else {
                        continue;
                    };
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            log::warn!("Failed to encode connection event: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = hook.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                        log::warn!("onConnection callback threw: {:?}", e);
                    }
                }
            }
        }
    }
}

fn describe(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    Reflect::get(value, &"name".into())
        .ok()
        .and_then(|name| name.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

/// An `HtmlImageElement` with its completion hooks attached.
pub struct WebFetch {
    image: Option<HtmlImageElement>,
    hooks: Vec<Closure<dyn FnMut()>>,
}

impl Release for WebFetch {
    fn release(&mut self) {
        if let Some(image) = self.image.take() {
            image.set_onload(None);
            image.set_onerror(None);
            image.set_onabort(None);
            // Clearing the source lets the browser abort the transfer.
            image.set_src("");
        }
        self.hooks.clear();
    }
}

impl Drop for WebFetch {
    fn drop(&mut self) {
        self.release();
    }
}

/// A `setInterval` registration.
pub struct WebTicker {
    window: Window,
    handle: Option<i32>,
    _tick: Closure<dyn FnMut()>,
}

impl Release for WebTicker {
    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.window.clear_interval_with_handle(handle);
        }
    }
}

impl Drop for WebTicker {
    fn drop(&mut self) {
        self.release();
    }
}

/// `online`/`offline` listeners on the window.
pub struct WebReachability {
    window: Window,
    listener: Option<Closure<dyn FnMut()>>,
}

impl WebReachability {
    const EVENTS: [&'static str; 2] = ["online", "offline"];
}

impl Release for WebReachability {
    fn release(&mut self) {
        if let Some(listener) = self.listener.take() {
            for name in Self::EVENTS {
                if let Err(e) = self
                    .window
                    .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
                {
                    log::warn!("Failed to remove {} listener: {:?}", name, e);
                }
            }
        }
    }
}

impl Drop for WebReachability {
    fn drop(&mut self) {
        self.release();
    }
}

/// Platform backed by the browser's `window`.
pub struct WebPlatform {
    window: Window,
    router: EventRouter,
}

impl WebPlatform {
    pub fn new(router: EventRouter) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| LoaderError::platform("no global window"))?;
        Ok(Self { window, router })
    }

    fn settle_hook(&self, token: LoadToken, outcome: FetchOutcome) -> Closure<dyn FnMut()> {
        let router = self.router.clone();
        Closure::wrap(Box::new(move || {
            router.deliver(PlatformEvent::FetchSettled {
                token,
                outcome: outcome.clone(),
            });
        }) as Box<dyn FnMut()>)
    }
}

impl Platform for WebPlatform {
    type Fetch = WebFetch;
    type Ticker = WebTicker;
    type Watch = WebReachability;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn is_online(&self) -> bool {
        self.window.navigator().on_line()
    }

    fn open_fetch(
        &mut self,
        src: &str,
        token: LoadToken,
        strategy: CompletionStrategy,
    ) -> Result<WebFetch> {
        let image = HtmlImageElement::new()
            .map_err(|e| LoaderError::platform(format!("Failed to create image: {:?}", e)))?;
        let mut hooks = Vec::with_capacity(3);

        let onerror = self.settle_hook(token, FetchOutcome::Failed(LoadFailure::Error));
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        hooks.push(onerror);
        let onabort = self.settle_hook(token, FetchOutcome::Failed(LoadFailure::Aborted));
        image.set_onabort(Some(onabort.as_ref().unchecked_ref()));
        hooks.push(onabort);

        let supports_decode = Reflect::has(&image, &"decode".into()).unwrap_or(false);
        let await_decode = strategy == CompletionStrategy::Decode && supports_decode;
        if !await_decode {
            let onload = self.settle_hook(token, FetchOutcome::Loaded);
            image.set_onload(Some(onload.as_ref().unchecked_ref()));
            hooks.push(onload);
        }

        image.set_src(src);

        if await_decode {
            let decoding = JsFuture::from(image.decode());
            let router = self.router.clone();
            spawn_local(async move {
                let outcome = match decoding.await {
                    Ok(_) => FetchOutcome::Loaded,
                    Err(e) => FetchOutcome::Failed(LoadFailure::Decode(describe(&e))),
                };
                router.deliver(PlatformEvent::FetchSettled { token, outcome });
            });
        }

        log::debug!(
            "Opened fetch {} for {} ({:?})",
            token.generation(),
            src,
            strategy
        );
        Ok(WebFetch {
            image: Some(image),
            hooks,
        })
    }

    fn start_ticker(&mut self, interval: Duration, token: LoadToken) -> Result<WebTicker> {
        let router = self.router.clone();
        let tick = Closure::wrap(Box::new(move || {
            router.deliver(PlatformEvent::Tick { token });
        }) as Box<dyn FnMut()>);
        let timeout = i32::try_from(interval.as_millis()).unwrap_or(i32::MAX);
        let handle = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                timeout,
            )
            .map_err(|e| LoaderError::platform(format!("setInterval failed: {:?}", e)))?;
        Ok(WebTicker {
            window: self.window.clone(),
            handle: Some(handle),
            _tick: tick,
        })
    }

    fn watch_reachability(&mut self) -> Result<WebReachability> {
        let router = self.router.clone();
        let window = self.window.clone();
        let listener = Closure::wrap(Box::new(move || {
            router.deliver(PlatformEvent::Reachability(window.navigator().on_line()));
        }) as Box<dyn FnMut()>);
        for name in WebReachability::EVENTS {
            self.window
                .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
                .map_err(|e| {
                    LoaderError::platform(format!("Failed to listen for {}: {:?}", name, e))
                })?;
        }
        Ok(WebReachability {
            window: self.window.clone(),
            listener: Some(listener),
        })
    }

    fn dispatch_connection(&mut self, event: &ConnectionEvent) {
        let Some(document) = self.window.document() else {
            return;
        };
        let detail = match serde_json::to_string(event)
            .map_err(|e| format!("{}", e))
            .and_then(|json| js_sys::JSON::parse(&json).map_err(|e| describe(&e)))
        {
            Ok(detail) => detail,
            Err(e) => {
                log::warn!("Failed to encode {} event: {}", CONNECTION_EVENT_NAME, e);
                return;
            }
        };
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(CONNECTION_EVENT_NAME, &init) {
            Ok(custom) => {
                if let Err(e) = document.dispatch_event(&custom) {
                    log::warn!("Failed to dispatch {} event: {:?}", CONNECTION_EVENT_NAME, e);
                }
            }
            Err(e) => log::warn!("Failed to create {} event: {:?}", CONNECTION_EVENT_NAME, e),
        }
    }
}
