//! Subscriber lists for the pet's two notification channels.
//!
//! Each channel is an ordered list of handlers keyed by a [`SubscriptionId`].
//! Delivery walks a snapshot of the list taken when delivery starts, so a
//! handler that unsubscribes itself (or anyone else) mid-pass does not change
//! who receives the event currently in flight. Each pass also re-checks an
//! `open` predicate before every handler, so a pass stops as soon as the pet
//! halts underneath it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use super::stage::LifeStage;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by a subscription; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Life-stage-changed handler; receives the new stage.
pub type StageHandler = dyn Fn(LifeStage) + Send + Sync;
/// Attribute-changed handler; carries no payload, re-read the pet instead.
pub type AttributesHandler = dyn Fn() + Send + Sync;

/// Ordered handler list for one channel.
pub(crate) struct Subscribers<H: ?Sized> {
    entries: Mutex<Vec<(SubscriptionId, Arc<H>)>>,
}

impl<H: ?Sized> Default for Subscribers<H> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<H: ?Sized> Subscribers<H> {
    pub fn add(&self, handler: Arc<H>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.lock().push((id, handler));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(sid, _)| *sid != id);
        entries.len() != before
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let n = entries.len();
        entries.clear();
        n
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Handlers in registration order, detached from the live list.
    pub fn snapshot(&self) -> Vec<Arc<H>> {
        self.lock().iter().map(|(_, h)| Arc::clone(h)).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Arc<H>)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Subscribers<StageHandler> {
    /// Returns how many handlers were called.
    pub fn deliver(&self, stage: LifeStage, open: impl Fn() -> bool) -> usize {
        let mut called = 0;
        for handler in self.snapshot() {
            if !open() {
                break;
            }
            handler(stage);
            called += 1;
        }
        called
    }
}

impl Subscribers<AttributesHandler> {
    /// Returns how many handlers were called.
    pub fn deliver(&self, open: impl Fn() -> bool) -> usize {
        let mut called = 0;
        for handler in self.snapshot() {
            if !open() {
                break;
            }
            handler();
            called += 1;
        }
        called
    }
}

#[derive(Default)]
struct Owner {
    thread: Option<ThreadId>,
    depth: usize,
}

/// Serializes "commit then notify" sections across threads.
///
/// The holding thread may take it again, so a handler that calls back into
/// the pet (a setter from inside a tick's notification) does not deadlock.
#[derive(Default)]
pub(crate) struct DeliveryLock {
    owner: Mutex<Owner>,
    released: Condvar,
}

pub(crate) struct DeliveryGuard<'a> {
    lock: &'a DeliveryLock,
}

impl DeliveryLock {
    pub fn acquire(&self) -> DeliveryGuard<'_> {
        let me = thread::current().id();
        let mut owner = self.lock_owner();
        loop {
            let holder = owner.thread;
            match holder {
                None => {
                    owner.thread = Some(me);
                    owner.depth = 1;
                    break;
                }
                Some(thread) if thread == me => {
                    owner.depth += 1;
                    break;
                }
                Some(_) => {
                    owner = self
                        .released
                        .wait(owner)
                        .unwrap_or_else(|e| e.into_inner());
                }
            }
        }
        DeliveryGuard { lock: self }
    }

    fn lock_owner(&self) -> MutexGuard<'_, Owner> {
        self.owner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self.lock.lock_owner();
        owner.depth -= 1;
        if owner.depth == 0 {
            owner.thread = None;
            self.lock.released.notify_one();
        }
    }
}
