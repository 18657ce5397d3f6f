//! Per-image load state machine.
//!
//! ```text
//! initial ──start──▶ loading ──success──▶ loaded
//!    ▲                 │  │
//!    └─────cancel──────┘  └──failure──▶ error ──start──▶ loading
//! ```
//!
//! Changing the source returns to `initial` from any state. Every fetch is
//! tagged with a fresh [`LoadToken`]; platform events carrying any other token
//! are dropped, so a superseded fetch can never affect the state.

use web_time::Instant;

use crate::callback::{Listener, Override};
use crate::config::{CompletionStrategy, LoaderConfig, Signal};
use crate::error::{LoadFailure, LoaderError, Result};
use crate::indicator::{Indicator, RenderModel, state_to_indicator};
use crate::load_state::{ControllerState, LoadState};
use crate::platform::{ConnectionEvent, FetchOutcome, LoadToken, Platform, PlatformEvent, Release};


/// Inputs supplied by the host on every update cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderInputs {
    /// New image source; `None` keeps the current one
    pub src: Option<String>,
    /// Required when loading is controlled, rejected otherwise
    pub load: Option<bool>,
    /// Required when reachability is controlled, rejected otherwise
    pub online: Option<bool>,
}

/// Resources owned by the load currently in flight.
struct ActiveLoad<P: Platform> {
    token: LoadToken,
    started_at: Instant,
    fetch: P::Fetch,
    ticker: Option<P::Ticker>,
}

impl<P: Platform> ActiveLoad<P> {
    fn release(mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.release();
        }
        self.fetch.release();
    }
}

/// Lazy loader for exactly one image.
///
/// Public operations return immediately; completion is fed back through
/// [`handle`](Self::handle) by the platform binding.
pub struct ImageLoadController<P: Platform> {
    config: LoaderConfig,
    platform: P,
    load_state: LoadState,
    on_line: bool,
    over_threshold: bool,
    /// Whether a controlled `load` value was ever supplied
    load_supplied: bool,
    next_token: LoadToken,
    active: Option<ActiveLoad<P>>,
    watch: Option<P::Watch>,
    decode_retries_used: u32,
    mounted: bool,
    on_load_state_change: Listener<LoadState>,
    on_connection: Listener<ConnectionEvent>,
    indicator_override: Override<ControllerState, Indicator>,
}

impl<P: Platform> ImageLoadController<P> {
    /// Create an unmounted controller in the `initial` state.
    pub fn new(config: LoaderConfig, platform: P) -> Result<Self> {
        config.validate()?;
        let on_line = config.online.value().unwrap_or(true);
        let load_supplied = config.load.value().is_some();
        Ok(Self {
            config,
            platform,
            load_state: LoadState::Initial,
            on_line,
            over_threshold: false,
            load_supplied,
            next_token: LoadToken::new(0),
            active: None,
            watch: None,
            decode_retries_used: 0,
            mounted: false,
            on_load_state_change: Listener::none(),
            on_connection: Listener::none(),
            indicator_override: Override::none(),
        })
    }

    /// Subscribe to reachability (when uncontrolled) and auto-start if the
    /// host asked for an immediate load.
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Ok(());
        }
        if !self.config.online.is_controlled() {
            self.watch = Some(self.platform.watch_reachability()?);
            self.on_line = self.platform.is_online();
        }
        self.mounted = true;
        log::info!(
            "Mounted loader for {} (online: {})",
            self.config.src,
            self.on_line
        );
        if self.config.load.value() == Some(true) {
            self.start()?;
        }
        Ok(())
    }

    /// Abandon any load in flight and release every platform resource.
    /// Also runs on drop.
    pub fn unmount(&mut self) {
        self.cancel();
        self.release_load();
        if let Some(mut watch) = self.watch.take() {
            watch.release();
        }
        if self.mounted {
            self.mounted = false;
            log::info!("Unmounted loader for {}", self.config.src);
        }
    }

    /// Begin loading unless already loading or loaded.
    pub fn start(&mut self) -> Result<()> {
        if self.config.load.is_controlled() && !self.load_supplied {
            return Err(LoaderError::configuration(
                "You should pass load value to controlled component",
            ));
        }
        if self.load_state.can_start() {
            self.decode_retries_used = 0;
        }
        self.begin_load();
        Ok(())
    }

    /// Abort the in-flight load and return to `initial`.
    pub fn cancel(&mut self) {
        if self.load_state != LoadState::Loading {
            return;
        }
        self.release_load();
        self.transition(LoadState::Initial);
    }

    /// User interaction entry point.
    pub fn click(&mut self) -> Result<()> {
        if !self.on_line {
            log::debug!("Ignoring click on {} while offline", self.config.src);
            return Ok(());
        }
        match self.load_state {
            LoadState::Loading => {
                if self.over_threshold {
                    self.cancel();
                }
                Ok(())
            }
            LoadState::Loaded => Ok(()),
            LoadState::Initial | LoadState::Error => self.start(),
        }
    }

    /// Apply the host's inputs for this update cycle.
    ///
    /// All inputs are checked before anything changes, so a rejected update
    /// leaves the controller untouched.
    pub fn update(&mut self, inputs: LoaderInputs) -> Result<()> {
        match (self.config.load.is_controlled(), inputs.load) {
            (true, None) => {
                return Err(LoaderError::configuration(
                    "You should pass load value to controlled component",
                ));
            }
            (false, Some(_)) => {
                return Err(LoaderError::configuration(
                    "load value passed to a component with uncontrolled loading",
                ));
            }
            _ => {}
        }
        match (self.config.online.is_controlled(), inputs.online) {
            (true, None) => {
                return Err(LoaderError::configuration(
                    "You should pass onLine value to controlled component",
                ));
            }
            (false, Some(_)) => {
                return Err(LoaderError::configuration(
                    "onLine value passed to a component observing the platform",
                ));
            }
            _ => {}
        }
        if inputs.src.as_deref() == Some("") {
            return Err(LoaderError::configuration("src must not be empty"));
        }

        if let Some(online) = inputs.online {
            self.config.online = Signal::controlled(online);
            self.set_online(online);
        }
        if let Some(src) = inputs.src {
            self.set_source(src);
        }
        if let Some(load) = inputs.load {
            self.config.load = Signal::controlled(load);
            self.load_supplied = true;
            if load {
                self.start()?;
            } else {
                self.cancel();
            }
        }
        Ok(())
    }

    /// Switch to a different image, dropping any progress on the current one.
    pub fn set_source(&mut self, src: impl Into<String>) {
        let src = src.into();
        if src == self.config.src {
            return;
        }
        log::debug!("Source changed from {} to {}", self.config.src, src);
        self.release_load();
        self.config.src = src;
        self.decode_retries_used = 0;
        if self.load_state != LoadState::Initial {
            self.transition(LoadState::Initial);
        }
    }

    /// Feed back something the platform observed.
    pub fn handle(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::FetchSettled { token, outcome } => {
                if !self.is_current(token) {
                    log::debug!(
                        "Dropping stale completion for load {} of {}",
                        token.generation(),
                        self.config.src
                    );
                    return;
                }
                self.release_load();
                match outcome {
                    FetchOutcome::Loaded => {
                        self.decode_retries_used = 0;
                        self.transition(LoadState::Loaded);
                    }
                    FetchOutcome::Failed(failure) => self.fail(failure),
                }
            }
            PlatformEvent::Tick { token } => self.tick(token),
            PlatformEvent::Reachability(online) => {
                if self.config.online.is_controlled() {
                    log::debug!("Ignoring platform reachability, controlled by host");
                    return;
                }
                self.set_online(online);
            }
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_online(&self) -> bool {
        self.on_line
    }

    pub fn over_threshold(&self) -> bool {
        self.over_threshold
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn snapshot(&self) -> ControllerState {
        ControllerState {
            load_state: self.load_state,
            on_line: self.on_line,
            over_threshold: self.over_threshold,
            controlled_load: self.config.load.is_controlled(),
        }
    }

    /// Indicator to display, honoring a host override if one is registered.
    pub fn indicator(&self) -> Indicator {
        self.indicator_override
            .resolve(&self.snapshot(), state_to_indicator)
    }

    pub fn render_model(&self) -> RenderModel {
        RenderModel::new(&self.config, &self.snapshot(), self.indicator())
    }

    /// Register the hook invoked on every load state transition.
    pub fn on_load_state_change<F>(&mut self, f: F)
    where
        F: Fn(LoadState) + 'static,
    {
        self.on_load_state_change.set(f);
    }

    /// Register the hook invoked on every tick while loading.
    pub fn on_connection<F>(&mut self, f: F)
    where
        F: Fn(ConnectionEvent) + 'static,
    {
        self.on_connection.set(f);
    }

    /// Register a host mapping that may replace the default indicator.
    pub fn set_indicator_override<F>(&mut self, f: F)
    where
        F: Fn(&ControllerState) -> Option<Indicator> + 'static,
    {
        self.indicator_override = Override::new(f);
    }

    /// Check the internal invariants.
    pub fn verify(&self) -> Result<()> {
        let loading = self.load_state == LoadState::Loading;
        if self.over_threshold && !loading {
            return Err(LoaderError::invalid_state(format!(
                "over threshold while {}",
                self.load_state
            )));
        }
        if self.active.is_some() != loading {
            return Err(LoaderError::invalid_state(format!(
                "{} with{} an active fetch",
                self.load_state,
                if self.active.is_some() { "" } else { "out" }
            )));
        }
        Ok(())
    }

    fn is_current(&self, token: LoadToken) -> bool {
        self.active.as_ref().is_some_and(|load| load.token == token)
    }

    fn begin_load(&mut self) {
        if !self.load_state.can_start() {
            log::debug!(
                "Not starting {}: already {}",
                self.config.src,
                self.load_state
            );
            return;
        }
        self.release_load();
        let token = self.next_token;
        self.next_token = token.next();
        self.transition(LoadState::Loading);

        let fetch = match self
            .platform
            .open_fetch(&self.config.src, token, self.config.strategy)
        {
            Ok(fetch) => fetch,
            Err(e) => {
                log::warn!("Could not open fetch for {}: {}", self.config.src, e);
                self.fail(LoadFailure::Error);
                return;
            }
        };
        let ticker = match self.config.strategy {
            CompletionStrategy::Decode => None,
            CompletionStrategy::CallbackWithTimer => {
                match self.platform.start_ticker(self.config.tick_interval(), token) {
                    Ok(ticker) => Some(ticker),
                    Err(e) => {
                        log::warn!("Elapsed-time ticker unavailable: {}", e);
                        None
                    }
                }
            }
        };
        self.active = Some(ActiveLoad {
            token,
            started_at: self.platform.now(),
            fetch,
            ticker,
        });
    }

    /// Only a rejected decode request is retried automatically.
    fn fail(&mut self, failure: LoadFailure) {
        log::warn!("Loading {} failed: {}", self.config.src, failure);
        self.transition(LoadState::Error);
        let retry = self.config.strategy == CompletionStrategy::Decode
            && matches!(failure, LoadFailure::Decode(_))
            && self.on_line
            && self.decode_retries_used < self.config.decode_retries;
        if retry {
            self.decode_retries_used += 1;
            log::debug!(
                "Retrying {} ({}/{})",
                self.config.src,
                self.decode_retries_used,
                self.config.decode_retries
            );
            self.begin_load();
        }
    }

    fn tick(&mut self, token: LoadToken) {
        let Some(started_at) = self
            .active
            .as_ref()
            .filter(|load| load.token == token && load.ticker.is_some())
            .map(|load| load.started_at)
        else {
            return;
        };
        let elapsed = self.platform.now().saturating_duration_since(started_at);
        let over = self
            .config
            .threshold()
            .is_some_and(|threshold| elapsed > threshold);
        if over && !self.over_threshold {
            log::debug!(
                "Loading {} exceeded threshold after {:?}",
                self.config.src,
                elapsed
            );
            self.over_threshold = true;
        }
        let event = ConnectionEvent::new(elapsed, self.config.size, over);
        self.platform.dispatch_connection(&event);
        self.on_connection.emit(event);
    }

    fn set_online(&mut self, online: bool) {
        if self.on_line != online {
            log::debug!(
                "{} is now {}",
                self.config.src,
                if online { "online" } else { "offline" }
            );
            self.on_line = online;
        }
    }

    fn release_load(&mut self) {
        if let Some(load) = self.active.take() {
            load.release();
        }
    }

    fn transition(&mut self, next: LoadState) {
        log::debug!("{}: {} -> {}", self.config.src, self.load_state, next);
        self.load_state = next;
        self.over_threshold = false;
        self.on_load_state_change.emit(next);
    }
}

impl<P: Platform> Drop for ImageLoadController<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}
