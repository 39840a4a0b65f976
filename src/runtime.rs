use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::ticker::{TickHandle, TickToken, Ticker};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick(TickToken),
}

/// Source of terminal events (keyboard, resize, etc.) and timer ticks
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;

    /// Sender feeding the same queue, used by tick schedules.
    fn sender(&self) -> Sender<AppEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    key_tx.send(AppEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => key_tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    tracing::error!(%err, "terminal event reader stopped");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

/// Something that can start a repeating tick for a timer run.
pub trait TickScheduler {
    fn schedule(&self, token: TickToken) -> TickHandle;
}

/// Runner that advances the application one event at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to one tick interval; `None` when nothing arrived.
    pub fn step(&self) -> Option<AppEvent> {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn sender(&self) -> Sender<AppEvent> {
        self.event_source.sender()
    }
}

impl<E: EventSource, T: Ticker> TickScheduler for Runner<E, T> {
    fn schedule(&self, token: TickToken) -> TickHandle {
        let tx = self.event_source.sender();
        TickHandle::spawn(&self.ticker, token, move |t| tx.send(AppEvent::Tick(t)).is_ok())
    }
}
