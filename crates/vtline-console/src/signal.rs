// SPDX-License-Identifier: MIT
//
// Signal bridge — OS signals in, cancellation and resize events out.
//
// Signal handlers run in a context where almost nothing is allowed, so
// the handlers installed here do one thing: bump an atomic. A bridge
// thread looks at those atomics and turns them into things the render
// loop understands:
//
//   SIGINT / SIGTERM / SIGQUIT → call the cancel callback, once per signal
//   SIGWINCH                   → push `()` onto the resize channel
//
// The bridge never stops on its own when a signal arrives. It keeps going
// until the context it was given is cancelled, which the callback will
// usually do, and exits without looking at the counters again.
//
// # Lifecycle
//
//   SignalHandler (Idle)  ── subscribe() ──▶  Subscription (Running)
//   Subscription::run(ctx, cancel) returns when ctx is cancelled and the
//   handlers are unregistered when it drops (Terminated).
//
// # Latency
//
// The bridge waits on the context's condition variable with a short
// timeout. Cancellation wakes it at once; a signal is noticed within one
// poll interval (20 ms by default).
//
// Resize notifications coalesce: the channel holds one pending event, and
// a second SIGWINCH before the render loop picks up the first adds nothing.
// A render loop only ever needs to know "the size changed since I last
// looked", not how many times.
#![allow(unsafe_code)]

use std::ffi::c_int;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use signal_hook::SigId;

use crate::context::CancelToken;

/// Default interval between looks at the signal counters (milliseconds).
const DEFAULT_POLL_INTERVAL_MS: u64 = 20;

// ─── SignalConfig ────────────────────────────────────────────────────────────

/// Which signals the bridge listens for and how often it checks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalConfig {
    /// Signals that invoke the cancel callback.
    ///
    /// Default: `SIGINT`, `SIGTERM`, plus `SIGQUIT` on Unix.
    pub cancel_signals: Vec<c_int>,

    /// Signals that produce a resize notification.
    ///
    /// Default: `SIGWINCH` on Unix. Windows has no resize signal, so the
    /// list is empty there and the channel stays silent.
    pub resize_signals: Vec<c_int>,

    /// Upper bound on how long a received signal waits to be dispatched.
    pub poll_interval: Duration,
}

impl Default for SignalConfig {
    fn default() -> Self {
        #[cfg(unix)]
        let (cancel_signals, resize_signals) = {
            use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM, SIGWINCH};
            (vec![SIGINT, SIGTERM, SIGQUIT], vec![SIGWINCH])
        };

        #[cfg(not(unix))]
        let (cancel_signals, resize_signals) = {
            use signal_hook::consts::{SIGINT, SIGTERM};
            (vec![SIGINT, SIGTERM], Vec::new())
        };

        Self {
            cancel_signals,
            resize_signals,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

// ─── SignalHandler ───────────────────────────────────────────────────────────

/// Converts process signals into cancellation and resize notifications.
///
/// # Example
///
/// ```no_run
/// use vtline_console::context::CancelToken;
/// use vtline_console::signal::SignalHandler;
///
/// let mut handler = SignalHandler::new();
/// let resized = handler.resize_events().unwrap();
///
/// let ctx = CancelToken::new();
/// let bridge = {
///     let ctx = ctx.clone();
///     handler.spawn(ctx.clone(), move || ctx.cancel())?
/// };
///
/// while !ctx.is_cancelled() {
///     if resized.try_recv().is_ok() {
///         // re-layout
///     }
///     # ctx.cancel();
/// }
/// bridge.join().ok();
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct SignalHandler {
    config: SignalConfig,
    resize_tx: SyncSender<()>,
    resize_rx: Option<Receiver<()>>,
}

impl SignalHandler {
    /// A handler with the default signal set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    /// A handler with a custom signal set.
    #[must_use]
    pub fn with_config(config: SignalConfig) -> Self {
        let (resize_tx, resize_rx) = mpsc::sync_channel(1);
        Self {
            config,
            resize_tx,
            resize_rx: Some(resize_rx),
        }
    }

    /// The configuration this handler subscribes with.
    #[must_use]
    pub const fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Take the receiving end of the resize channel.
    ///
    /// There is one receiver; later calls return `None`.
    pub fn resize_events(&mut self) -> Option<Receiver<()>> {
        self.resize_rx.take()
    }

    /// Register the OS handlers and return the running subscription.
    ///
    /// A signal the OS refuses to hand over (for example one reserved by
    /// the runtime) is logged and skipped; the rest still work.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let mut ids = Vec::new();

        let mut cancel_counters = Vec::with_capacity(self.config.cancel_signals.len());
        for &signal in &self.config.cancel_signals {
            let counter = Arc::new(AtomicUsize::new(0));
            match register_counter(signal, Arc::clone(&counter)) {
                Ok(id) => {
                    ids.push(id);
                    cancel_counters.push((signal, counter));
                }
                Err(err) => tracing::warn!(signal, %err, "cannot subscribe to cancel signal"),
            }
        }

        let resized = Arc::new(AtomicBool::new(false));
        for &signal in &self.config.resize_signals {
            match signal_hook::flag::register(signal, Arc::clone(&resized)) {
                Ok(id) => ids.push(id),
                Err(err) => tracing::warn!(signal, %err, "cannot subscribe to resize signal"),
            }
        }

        tracing::debug!(
            cancel = ?self.config.cancel_signals,
            resize = ?self.config.resize_signals,
            "signal bridge subscribed"
        );

        Subscription {
            ids,
            cancel_counters,
            resized,
            resize_tx: self.resize_tx.clone(),
            poll_interval: self.config.poll_interval,
        }
    }

    /// Subscribe, then block until `ctx` is cancelled.
    ///
    /// `cancel` is called once for every cancel-class signal received
    /// while running. It may be called many times and should be
    /// idempotent; `|| ctx.cancel()` is.
    pub fn run<F: FnMut()>(&self, ctx: &CancelToken, cancel: F) {
        self.subscribe().run(ctx, cancel);
    }

    /// Subscribe on the calling thread, then run on a new named thread.
    ///
    /// Subscribing before the spawn means no signal sent after this
    /// returns can slip past the bridge.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot spawn the thread. The handlers
    /// are unregistered again in that case.
    pub fn spawn<F>(&self, ctx: CancelToken, cancel: F) -> io::Result<JoinHandle<()>>
    where
        F: FnMut() + Send + 'static,
    {
        let subscription = self.subscribe();
        thread::Builder::new()
            .name("signal-bridge".into())
            .spawn(move || subscription.run(&ctx, cancel))
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a handler that counts deliveries of `signal`.
fn register_counter(signal: c_int, counter: Arc<AtomicUsize>) -> io::Result<SigId> {
    // SAFETY: the action only performs an atomic increment, which is
    // async-signal-safe, and captures nothing but an `Arc` it keeps alive.
    unsafe {
        signal_hook::low_level::register(signal, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A live set of signal registrations, ready to be run.
///
/// Dropping it unregisters every handler it installed.
pub struct Subscription {
    ids: Vec<SigId>,
    cancel_counters: Vec<(c_int, Arc<AtomicUsize>)>,
    resized: Arc<AtomicBool>,
    resize_tx: SyncSender<()>,
    poll_interval: Duration,
}

impl Subscription {
    /// Dispatch signals until `ctx` is cancelled.
    pub fn run<F: FnMut()>(self, ctx: &CancelToken, mut cancel: F) {
        tracing::debug!("signal bridge running");
        while !ctx.wait_timeout(self.poll_interval) {
            self.dispatch(&mut cancel);
        }
        tracing::debug!("signal bridge terminated");
    }

    /// Hand everything counted since the last call to the outside world.
    fn dispatch<F: FnMut()>(&self, cancel: &mut F) {
        for (signal, counter) in &self.cancel_counters {
            for _ in 0..counter.swap(0, Ordering::SeqCst) {
                tracing::trace!(signal, "cancel signal");
                cancel();
            }
        }

        if self.resized.swap(false, Ordering::SeqCst) {
            match self.resize_tx.try_send(()) {
                Ok(()) => tracing::trace!("resize notification sent"),
                Err(TrySendError::Full(())) => tracing::trace!("resize notification coalesced"),
                Err(TrySendError::Disconnected(())) => {}
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("handlers", &self.ids.len())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
//
// Signals are process-wide and the test harness runs tests in parallel, so
// each test that raises a signal owns that signal: SIGUSR1, SIGUSR2,
// SIGQUIT and SIGWINCH are each raised by exactly one test.

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Instant;

    const GENEROUS: Duration = Duration::from_secs(5);

    fn quiet_config() -> SignalConfig {
        SignalConfig {
            cancel_signals: Vec::new(),
            resize_signals: Vec::new(),
            poll_interval: Duration::from_millis(5),
        }
    }

    /// Spin until `cond` holds or the deadline passes.
    fn eventually(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + GENEROUS;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    // ── Config ──────────────────────────────────────────────────

    #[test]
    fn default_config_covers_terminal_signals() {
        use signal_hook::consts::{SIGINT, SIGTERM};

        let config = SignalConfig::default();
        assert!(config.cancel_signals.contains(&SIGINT));
        assert!(config.cancel_signals.contains(&SIGTERM));
        assert_eq!(config.poll_interval, Duration::from_millis(20));

        #[cfg(unix)]
        {
            use signal_hook::consts::{SIGQUIT, SIGWINCH};
            assert!(config.cancel_signals.contains(&SIGQUIT));
            assert_eq!(config.resize_signals, vec![SIGWINCH]);
        }
    }

    #[test]
    fn resize_receiver_is_handed_out_once() {
        let mut handler = SignalHandler::with_config(quiet_config());
        assert!(handler.resize_events().is_some());
        assert!(handler.resize_events().is_none());
    }

    // ── Termination ─────────────────────────────────────────────

    #[test]
    fn run_returns_promptly_after_cancel_without_signals() {
        let handler = SignalHandler::with_config(SignalConfig {
            poll_interval: Duration::from_secs(60),
            ..quiet_config()
        });
        let ctx = CancelToken::new();
        let (done_tx, done_rx) = mpsc::channel();

        let bridge = {
            let ctx = ctx.clone();
            thread::spawn(move || {
                handler.run(&ctx, || {});
                done_tx.send(()).unwrap();
            })
        };

        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        ctx.cancel();
        done_rx.recv_timeout(GENEROUS).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        bridge.join().unwrap();
    }

    #[test]
    fn run_on_cancelled_context_returns_immediately() {
        let handler = SignalHandler::new();
        let ctx = CancelToken::new();
        ctx.cancel();

        let mut calls = 0;
        handler.run(&ctx, || calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn subscription_debug_counts_handlers() {
        let handler = SignalHandler::with_config(quiet_config());
        let s = format!("{:?}", handler.subscribe());
        assert!(s.contains("handlers: 0"));
    }

    // ── Delivery ────────────────────────────────────────────────

    #[cfg(unix)]
    #[test]
    fn each_cancel_signal_invokes_callback_once() {
        use signal_hook::consts::SIGUSR1;
        use signal_hook::low_level::raise;

        let handler = SignalHandler::with_config(SignalConfig {
            cancel_signals: vec![SIGUSR1],
            ..quiet_config()
        });
        let ctx = CancelToken::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let bridge = {
            let calls = Arc::clone(&calls);
            handler
                .spawn(ctx.clone(), move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
        };

        raise(SIGUSR1).unwrap();
        assert!(eventually(|| calls.load(Ordering::SeqCst) == 1));
        raise(SIGUSR1).unwrap();
        assert!(eventually(|| calls.load(Ordering::SeqCst) == 2));

        // The bridge keeps running after signals; only ctx stops it.
        assert!(!bridge.is_finished());
        ctx.cancel();
        bridge.join().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[cfg(unix)]
    #[test]
    fn callback_cancelling_context_stops_bridge() {
        use signal_hook::consts::SIGUSR2;
        use signal_hook::low_level::raise;

        let handler = SignalHandler::with_config(SignalConfig {
            cancel_signals: vec![SIGUSR2],
            ..quiet_config()
        });
        let ctx = CancelToken::new();
        let (done_tx, done_rx) = mpsc::channel();

        let subscription = handler.subscribe();
        let bridge = {
            let ctx = ctx.clone();
            thread::spawn(move || {
                let cancel_ctx = ctx.clone();
                subscription.run(&ctx, move || cancel_ctx.cancel());
                done_tx.send(()).unwrap();
            })
        };

        raise(SIGUSR2).unwrap();
        raise(SIGUSR2).unwrap();
        done_rx.recv_timeout(GENEROUS).unwrap();
        assert!(ctx.is_cancelled());
        bridge.join().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn default_handler_turns_sigquit_into_cancel() {
        use signal_hook::consts::SIGQUIT;
        use signal_hook::low_level::raise;

        // Subscribed before the raise, so the default action never runs.
        let subscription = SignalHandler::new().subscribe();
        let ctx = CancelToken::new();

        let bridge = {
            let ctx = ctx.clone();
            thread::spawn(move || {
                let cancel_ctx = ctx.clone();
                subscription.run(&ctx, move || cancel_ctx.cancel());
            })
        };

        raise(SIGQUIT).unwrap();
        assert!(eventually(|| ctx.is_cancelled()));
        bridge.join().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn resize_signals_become_coalesced_notifications() {
        use signal_hook::consts::SIGWINCH;
        use signal_hook::low_level::raise;

        let mut handler = SignalHandler::with_config(SignalConfig {
            resize_signals: vec![SIGWINCH],
            ..quiet_config()
        });
        let resized = handler.resize_events().unwrap();
        let ctx = CancelToken::new();

        // Two resizes before the bridge runs collapse into one event.
        let subscription = handler.subscribe();
        raise(SIGWINCH).unwrap();
        raise(SIGWINCH).unwrap();

        let bridge = {
            let ctx = ctx.clone();
            thread::spawn(move || subscription.run(&ctx, || panic!("resize is not a cancel")))
        };

        resized.recv_timeout(GENEROUS).unwrap();
        assert_eq!(
            resized.recv_timeout(Duration::from_millis(50)),
            Err(RecvTimeoutError::Timeout)
        );

        // A later resize is reported again.
        raise(SIGWINCH).unwrap();
        resized.recv_timeout(GENEROUS).unwrap();

        ctx.cancel();
        bridge.join().unwrap();
    }

    #[test]
    fn dropped_receiver_does_not_stall_bridge() {
        let mut handler = SignalHandler::with_config(quiet_config());
        drop(handler.resize_events());

        let subscription = handler.subscribe();
        subscription.resized.store(true, Ordering::SeqCst);
        let mut calls = 0;
        subscription.dispatch(&mut || calls += 1);
        assert_eq!(calls, 0);
        assert!(!subscription.resized.load(Ordering::SeqCst));
    }

    #[test]
    fn dispatch_calls_back_once_per_counted_signal() {
        let handler = SignalHandler::with_config(quiet_config());
        let mut subscription = handler.subscribe();
        let counter = Arc::new(AtomicUsize::new(3));
        subscription.cancel_counters.push((0, Arc::clone(&counter)));

        let mut calls = 0;
        subscription.dispatch(&mut || calls += 1);
        assert_eq!(calls, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        subscription.dispatch(&mut || calls += 1);
        assert_eq!(calls, 3);
    }
}
