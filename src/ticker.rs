use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Identifies one scheduled run of a timer.
///
/// Timers bump their generation whenever a run ends (reset, stop or
/// completion), so ticks still in flight for an older run can be told apart
/// and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickToken {
    generation: u64,
}

impl TickToken {
    pub(crate) fn new(generation: u64) -> Self {
        Self { generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns a background thread that fires `on_tick` once per ticker interval.
///
/// Dropping the handle cancels the schedule; the thread notices the flag on
/// its next wake-up and exits without firing again.
#[derive(Debug)]
pub struct TickHandle {
    token: TickToken,
    cancelled: Arc<AtomicBool>,
}

impl TickHandle {
    /// Start ticking. `on_tick` returning `false` stops the schedule, which
    /// is how a closed event channel ends the thread.
    pub fn spawn<T, F>(ticker: &T, token: TickToken, mut on_tick: F) -> Self
    where
        T: Ticker,
        F: FnMut(TickToken) -> bool + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let interval = ticker.interval();

        thread::spawn(move || loop {
            thread::sleep(interval);
            if flag.load(Ordering::SeqCst) || !on_tick(token) {
                break;
            }
        });

        tracing::trace!(generation = token.generation(), "tick schedule started");
        Self { token, cancelled }
    }

    pub fn token(&self) -> TickToken {
        self.token
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::trace!(generation = self.token.generation(), "tick schedule cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn fixed_ticker_reports_interval() {
        let ticker = FixedTicker::from_millis(16);
        assert_eq!(ticker.interval(), Duration::from_millis(16));
    }

    #[test]
    fn handle_delivers_ticks_tagged_with_token() {
        let (tx, rx) = mpsc::channel();
        let token = TickToken::new(7);
        let _handle = TickHandle::spawn(&FixedTicker::from_millis(1), token, move |t| {
            tx.send(t).is_ok()
        });

        let got = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(got.generation(), 7);
    }

    #[test]
    fn dropping_handle_stops_ticks() {
        let (tx, rx) = mpsc::channel();
        let handle = TickHandle::spawn(
            &FixedTicker::from_millis(1),
            TickToken::new(1),
            move |t| tx.send(t).is_ok(),
        );
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        drop(handle);
        // At most one tick can already be past the flag check.
        thread::sleep(Duration::from_millis(30));
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(30));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancel_is_idempotent() {
        let handle = TickHandle::spawn(&FixedTicker::from_millis(50), TickToken::new(3), |_| true);
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle.token(), TickToken::new(3));
    }
}
