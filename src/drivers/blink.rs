//! Per-channel blink supervision.
//!
//! Each LED channel owns one [`BlinkSupervisor`]. The supervisor holds at
//! most one background blink task and enforces the single-driver rule:
//! a new blink (or any steady set) first cancels the running task and waits,
//! bounded by the configured timeout, until the task has observably exited.
//! Only then may anything else write the channel's actuator.
//!
//! ```text
//!            start_continuous               stop / cancel
//!   Idle ──────────────────────▶ Running ──────────────────▶ Idle
//!     │                                                        ▲
//!     └──────── run_fixed (caller blocks, times × 2 × interval)┘
//! ```
//!
//! ## Signalling
//!
//! - **cancel**: a `bounded(1)` channel. The task sleeps with
//!   `recv_timeout(interval)`, so cancellation is observed as soon as it is
//!   sent, never mid-write. Dropping the supervisor drops the sender, which
//!   the task also treats as cancellation.
//! - **done**: a zero-capacity channel whose only sender lives inside the
//!   task closure. It disconnects when the task returns (or unwinds), which
//!   the supervisor waits for with a timeout before joining.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use log::{debug, info, warn};

use crate::drivers::actuator::ActuatorCell;
use crate::drivers::channel::LedColour;
use crate::error::BlinkError;

// ───────────────────────────────────────────────────────────────
// ShutdownSignal
// ───────────────────────────────────────────────────────────────

/// Process-wide stop signal.
///
/// Fixed blinks and buzzer pulses run on the caller's thread; they sleep on
/// this signal so that [`fire`](Self::fire) cuts them short.
pub struct ShutdownSignal {
    tx: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Trip the signal. Every current and future [`sleep`](Self::sleep)
    /// returns `false` immediately.
    pub fn fire(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_fired(&self) -> bool {
        matches!(
            self.rx.try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        )
    }

    /// Sleep for `dur`. Returns `true` if the full duration elapsed,
    /// `false` if shutdown was signalled first.
    pub fn sleep(&self, dur: Duration) -> bool {
        matches!(self.rx.recv_timeout(dur), Err(RecvTimeoutError::Timeout))
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// BlinkSupervisor
// ───────────────────────────────────────────────────────────────

struct BlinkTask {
    cancel: Sender<()>,
    done: Receiver<()>,
    handle: JoinHandle<()>,
    interval: Duration,
}

/// Counts a blink thread as live from just before spawn until its loop
/// has returned.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(count))
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Owns the (at most one) background blink task of a channel.
pub struct BlinkSupervisor {
    channel: LedColour,
    join_timeout: Duration,
    task: Option<BlinkTask>,
    live: Arc<AtomicUsize>,
}

impl BlinkSupervisor {
    pub fn new(channel: LedColour, join_timeout: Duration) -> Self {
        Self {
            channel,
            join_timeout,
            task: None,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Blink threads of this channel whose loop has not yet returned.
    /// Never more than one.
    pub fn live_tasks(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Shared handle to the live-task count, for lock-free readers.
    pub fn live_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live)
    }

    /// Whether a continuous blink task is tracked (running, or wedged after a
    /// failed cancellation wait).
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Half-period of the running task, if any.
    pub fn interval(&self) -> Option<Duration> {
        self.task.as_ref().map(|t| t.interval)
    }

    /// Signal the running task to stop without waiting for it.
    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            // A full buffer means cancellation is already pending.
            let _ = task.cancel.try_send(());
        }
    }

    /// Cancel the running task and wait for it to exit.
    ///
    /// On timeout the task stays tracked so a later call retries the wait;
    /// nothing else may drive the actuator until it succeeds.
    pub fn stop(&mut self) -> Result<(), BlinkError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        let _ = task.cancel.try_send(());

        match task.done.recv_timeout(self.join_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if task.handle.join().is_err() {
                    warn!("{} blink task panicked", self.channel);
                }
                debug!("{} blink task stopped", self.channel);
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "{} blink task ignored cancellation for {} ms",
                    self.channel,
                    self.join_timeout.as_millis()
                );
                self.task = Some(task);
                Err(BlinkError::CancelTimeout {
                    channel: self.channel,
                    waited_ms: self.join_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Supersede any running task with a new continuous blink.
    ///
    /// Returns once the new task is launched; the loop itself runs until
    /// cancelled and leaves the output wherever it was when cancellation
    /// was observed. The caller sets the terminal state.
    pub fn start_continuous(
        &mut self,
        output: ActuatorCell,
        interval: Duration,
    ) -> Result<(), BlinkError> {
        self.stop()?;

        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<()>(0);
        let channel = self.channel;
        let live = LiveGuard::enter(&self.live);

        let handle = thread::Builder::new()
            .name(format!("blink-{channel}"))
            .spawn(move || {
                // Dropped in reverse order: the live count falls before
                // `done` disconnects.
                let _done = done_tx;
                let _live = live;
                blink_loop(channel, &output, interval, &cancel_rx);
            })
            .map_err(|e| {
                warn!("{} blink task spawn failed: {}", channel, e);
                BlinkError::SpawnFailed(channel)
            })?;

        info!("{} blinking every {} ms", channel, interval.as_millis());
        self.task = Some(BlinkTask {
            cancel: cancel_tx,
            done: done_rx,
            handle,
            interval,
        });
        Ok(())
    }

    /// Stop any continuous task, then run `times` on/off cycles on the
    /// calling thread. Returns the number of completed cycles, which is
    /// short of `times` only when `shutdown` fired mid-run. The output is
    /// always left off.
    pub fn run_fixed(
        &mut self,
        output: &ActuatorCell,
        times: u32,
        interval: Duration,
        shutdown: &ShutdownSignal,
    ) -> Result<u32, BlinkError> {
        self.stop()?;

        let mut completed = 0;
        for _ in 0..times {
            output.set(true);
            let slept = shutdown.sleep(interval);
            output.set(false);
            if !slept || !shutdown.sleep(interval) {
                break;
            }
            completed += 1;
        }

        if completed < times {
            info!(
                "{} fixed blink cut short by shutdown after {}/{} cycles",
                self.channel, completed, times
            );
        }
        Ok(completed)
    }
}

/// Toggle until cancelled. Each write completes before the cancellation
/// check, so the output is never left half-way through a transition.
fn blink_loop(channel: LedColour, output: &ActuatorCell, interval: Duration, cancel: &Receiver<()>) {
    let mut cycles: u64 = 0;
    loop {
        output.set(true);
        if cancelled(cancel, interval) {
            break;
        }
        output.set(false);
        if cancelled(cancel, interval) {
            break;
        }
        cycles += 1;
    }
    debug!("{} blink loop exiting after {} cycles", channel, cycles);
}

fn cancelled(cancel: &Receiver<()>, interval: Duration) -> bool {
    !matches!(cancel.recv_timeout(interval), Err(RecvTimeoutError::Timeout))
}
