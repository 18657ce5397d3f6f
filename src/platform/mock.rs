//! In-memory platform for driving the controller from tests.
//!
//! Every resource handed out is recorded so tests can assert on what was
//! opened and released. The clock only moves when [`MockPlatform::advance`]
//! is called.

use std::cell::RefCell;
use std::rc::Rc;

use web_time::{Duration, Instant};

use super::{ConnectionEvent, LoadToken, Platform, Release};
use crate::config::CompletionStrategy;
use crate::error::{LoaderError, Result};

#[derive(Debug, Clone)]
pub struct FetchRecord {
    pub src: String,
    pub token: LoadToken,
    pub strategy: CompletionStrategy,
    pub releases: u32,
}

#[derive(Debug, Clone)]
pub struct TickerRecord {
    pub token: LoadToken,
    pub interval: Duration,
    pub releases: u32,
}

#[derive(Debug)]
struct MockState {
    origin: Instant,
    offset: Duration,
    online: bool,
    fail_fetch: bool,
    fetches: Vec<FetchRecord>,
    tickers: Vec<TickerRecord>,
    watches_opened: u32,
    watches_released: u32,
    connection_events: Vec<ConnectionEvent>,
}

/// Cloneable handle; clones share the recorded state.
#[derive(Debug, Clone)]
pub struct MockPlatform {
    state: Rc<RefCell<MockState>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                origin: Instant::now(),
                offset: Duration::ZERO,
                online: true,
                fail_fetch: false,
                fetches: Vec::new(),
                tickers: Vec::new(),
                watches_opened: 0,
                watches_released: 0,
                connection_events: Vec::new(),
            })),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.state.borrow_mut().offset += by;
    }

    pub fn set_online(&self, online: bool) {
        self.state.borrow_mut().online = online;
    }

    /// Make subsequent `open_fetch` calls fail.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.state.borrow_mut().fail_fetch = fail;
    }

    pub fn fetches(&self) -> Vec<FetchRecord> {
        self.state.borrow().fetches.clone()
    }

    pub fn last_token(&self) -> Option<LoadToken> {
        self.state.borrow().fetches.last().map(|f| f.token)
    }

    pub fn tickers(&self) -> Vec<TickerRecord> {
        self.state.borrow().tickers.clone()
    }

    /// Fetches and tickers handed out but not yet released.
    pub fn open_resources(&self) -> usize {
        let state = self.state.borrow();
        state.fetches.iter().filter(|f| f.releases == 0).count()
            + state.tickers.iter().filter(|t| t.releases == 0).count()
    }

    pub fn active_watches(&self) -> u32 {
        let state = self.state.borrow();
        state.watches_opened - state.watches_released
    }

    pub fn connection_events(&self) -> Vec<ConnectionEvent> {
        self.state.borrow().connection_events.clone()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MockFetch {
    index: usize,
    released: bool,
    state: Rc<RefCell<MockState>>,
}

impl Release for MockFetch {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.borrow_mut().fetches[self.index].releases += 1;
        }
    }
}

pub struct MockTicker {
    index: usize,
    released: bool,
    state: Rc<RefCell<MockState>>,
}

impl Release for MockTicker {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.borrow_mut().tickers[self.index].releases += 1;
        }
    }
}

pub struct MockWatch {
    released: bool,
    state: Rc<RefCell<MockState>>,
}

impl Release for MockWatch {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.borrow_mut().watches_released += 1;
        }
    }
}

impl Platform for MockPlatform {
    type Fetch = MockFetch;
    type Ticker = MockTicker;
    type Watch = MockWatch;

    fn now(&self) -> Instant {
        let state = self.state.borrow();
        state.origin + state.offset
    }

    fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    fn open_fetch(
        &mut self,
        src: &str,
        token: LoadToken,
        strategy: CompletionStrategy,
    ) -> Result<MockFetch> {
        let mut state = self.state.borrow_mut();
        if state.fail_fetch {
            return Err(LoaderError::platform("image element unavailable"));
        }
        state.fetches.push(FetchRecord {
            src: src.to_string(),
            token,
            strategy,
            releases: 0,
        });
        Ok(MockFetch {
            index: state.fetches.len() - 1,
            released: false,
            state: Rc::clone(&self.state),
        })
    }

    fn start_ticker(&mut self, interval: Duration, token: LoadToken) -> Result<MockTicker> {
        let mut state = self.state.borrow_mut();
        state.tickers.push(TickerRecord {
            token,
            interval,
            releases: 0,
        });
        Ok(MockTicker {
            index: state.tickers.len() - 1,
            released: false,
            state: Rc::clone(&self.state),
        })
    }

    fn watch_reachability(&mut self) -> Result<MockWatch> {
        self.state.borrow_mut().watches_opened += 1;
        Ok(MockWatch {
            released: false,
            state: Rc::clone(&self.state),
        })
    }

    fn dispatch_connection(&mut self, event: &ConnectionEvent) {
        self.state.borrow_mut().connection_events.push(*event);
    }
}
