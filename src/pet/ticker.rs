//! Periodic scheduler driving [`Pet::tick`](super::Pet::tick).
//!
//! One tokio task per pet. The task only holds a weak reference to the pet, so
//! dropping the last [`Pet`](super::Pet) handle ends the loop; so does reaching
//! the terminal stage or an explicit stop.
//!
//! Design Notes:
//! * The interval uses `MissedTickBehavior::Skip`: if a tick overruns the
//!   period (slow subscribers, suspended host) the late firings are dropped,
//!   never run back to back or in parallel.
//! * The first tick fires one full period after start, not immediately.

use std::time::Duration;

use log::{debug, trace};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::engine::WeakPet;

/// Owner's side of a running scheduler task.
///
/// Dropping it closes the stop channel, which also ends the task.
pub(crate) struct Ticker {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    done: watch::Receiver<bool>,
}

/// Observer's view of a scheduler task; independent of the pet's lifetime.
#[derive(Clone, Debug)]
pub struct SchedulerWatch {
    done: watch::Receiver<bool>,
}

impl SchedulerWatch {
    pub fn is_running(&self) -> bool {
        !*self.done.borrow() && self.done.has_changed().is_ok()
    }

    /// Resolves once the task has left its loop.
    pub async fn stopped(&mut self) {
        // a closed channel means the task is gone as well
        let _ = self.done.wait_for(|done| *done).await;
    }
}

impl Ticker {
    /// Ask the task to stop without waiting for it.
    pub fn stop(self) {
        let _ = self.stop.send(());
    }

    /// Ask the task to stop and wait until it has exited.
    pub async fn shutdown(self) {
        let Ticker { stop, handle, .. } = self;
        let _ = stop.send(());
        let _ = handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn watch(&self) -> SchedulerWatch {
        SchedulerWatch {
            done: self.done.clone(),
        }
    }
}

/// Spawn the scheduler loop. Must be called from within a tokio runtime.
pub(crate) fn start_ticker(pet: WeakPet, period: Duration) -> Ticker {
    let (tx, mut rx) = oneshot::channel::<()>();
    let (done_tx, done) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("pet ticker started (period={}ms)", period.as_millis());
        loop {
            tokio::select! {
                _ = &mut rx => {
                    debug!("pet ticker stop requested");
                    break;
                }
                _ = interval.tick() => {
                    let Some(pet) = pet.upgrade() else {
                        debug!("pet dropped; ticker exiting");
                        break;
                    };
                    let report = pet.tick();
                    trace!("tick: {:?}", report);
                    if report.halted {
                        break;
                    }
                }
            }
        }
        debug!("pet ticker loop terminated");
        let _ = done_tx.send(true);
    });

    Ticker {
        stop: tx,
        handle,
        done,
    }
}
