//! The pet engine: vitals behind a single lock, the tick procedure, and the
//! read/write/subscription surface collaborators use.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError, Weak};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::attributes::{Attribute, Vitals};
use super::clock::{Clock, SystemClock};
use super::error::PetError;
use super::observer::{AttributesHandler, DeliveryLock, StageHandler, SubscriptionId, Subscribers};
use super::stage::{age_in_minutes, LifeStage};
use super::ticker::{start_ticker, SchedulerWatch, Ticker};
use crate::config::PetConfig;
use crate::logutil::escape_log;

/// Why a pet stopped ticking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HaltReason {
    /// The terminal stage was observed by a tick.
    Dead,
    /// The owner disposed of the pet.
    Disposed,
}

impl HaltReason {
    fn as_error(self) -> PetError {
        match self {
            HaltReason::Dead => PetError::Dead,
            HaltReason::Disposed => PetError::Disposed,
        }
    }
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// New stage, if the stage check saw a transition.
    pub stage_change: Option<LifeStage>,
    /// Attribute the decay step lowered, if any.
    pub decayed: Option<Attribute>,
    /// The pet is halted; no further ticks will do anything.
    pub halted: bool,
    /// Another tick was already running; this one was dropped.
    pub skipped: bool,
}

/// Point-in-time view of a pet, for rendering and JSON output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PetSnapshot {
    pub name: String,
    pub born: DateTime<Utc>,
    pub age_minutes: f64,
    pub hunger: i32,
    pub happiness: i32,
    pub intelligence: i32,
    pub stage: LifeStage,
    pub halted: Option<HaltReason>,
}

impl PetSnapshot {
    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Hunger => self.hunger,
            Attribute::Happiness => self.happiness,
            Attribute::Intelligence => self.intelligence,
        }
    }
}

struct PetState {
    name: String,
    vitals: Vitals,
    /// Stage seen by the previous tick; only used to detect transitions.
    last_observed: LifeStage,
    halt: Option<HaltReason>,
    ticks: u64,
    rng: StdRng,
}

struct Inner {
    born: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    state: Mutex<PetState>,
    /// Held for the whole of a tick so ticks never overlap.
    tick_gate: Mutex<()>,
    /// Held from a state change until its notification pass ends; halting
    /// takes it too, so no handler runs after a halt is committed.
    delivery: DeliveryLock,
    stage_subs: Subscribers<StageHandler>,
    attr_subs: Subscribers<AttributesHandler>,
    ticker: Mutex<Option<Ticker>>,
}

/// A single virtual pet.
///
/// `Pet` is a cheap handle; clones share the same animal. The periodic
/// scheduler (when started) stops once the last handle is dropped, so
/// subscribers that need to reach back into the pet should capture a
/// [`WeakPet`] from [`Pet::downgrade`] rather than a clone.
///
/// ```rust,no_run
/// use tamapet::pet::{Pet, LifeStage};
///
/// #[tokio::main]
/// async fn main() {
///     let pet = Pet::hatch("Beestje");
///     let watcher = pet.downgrade();
///     pet.on_stage_changed(|stage: LifeStage| println!("now a {stage}"));
///     pet.on_attributes_changed(move || {
///         if let Some(pet) = watcher.upgrade() {
///             println!("hunger={}", pet.hunger());
///         }
///     });
///     pet.feed();
///     pet.shutdown().await;
/// }
/// ```
#[derive(Clone)]
pub struct Pet {
    inner: Arc<Inner>,
}

/// Non-owning handle to a [`Pet`].
#[derive(Clone)]
pub struct WeakPet(Weak<Inner>);

impl WeakPet {
    pub fn upgrade(&self) -> Option<Pet> {
        self.0.upgrade().map(|inner| Pet { inner })
    }
}

impl fmt::Debug for WeakPet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakPet")
    }
}

impl Pet {
    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    /// Hatch a pet with the given name and start its scheduler.
    /// Must be called from within a tokio runtime.
    pub fn hatch(name: impl Into<String>) -> Self {
        Self::spawn(&PetConfig::named(name))
    }

    /// Hatch a pet with the default name.
    pub fn hatch_default() -> Self {
        Self::spawn(&PetConfig::default())
    }

    /// Build a pet from configuration and start its scheduler.
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &PetConfig) -> Self {
        Self::spawn_with_clock(config, Arc::new(SystemClock))
    }

    pub fn spawn_with_clock(config: &PetConfig, clock: Arc<dyn Clock>) -> Self {
        let pet = Self::build(config, clock);
        let ticker = start_ticker(pet.downgrade(), config.tick_interval());
        *pet.lock_ticker() = Some(ticker);
        pet
    }

    /// Build a pet with no scheduler; the caller drives [`Pet::tick`].
    pub fn manual(config: &PetConfig) -> Self {
        Self::build(config, Arc::new(SystemClock))
    }

    pub fn manual_with_clock(config: &PetConfig, clock: Arc<dyn Clock>) -> Self {
        Self::build(config, clock)
    }

    fn build(config: &PetConfig, clock: Arc<dyn Clock>) -> Self {
        let born = clock.now();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            "hatched pet '{}' at {}",
            escape_log(&config.name),
            born.format("%Y-%m-%dT%H:%M:%SZ")
        );
        Self {
            inner: Arc::new(Inner {
                born,
                clock,
                state: Mutex::new(PetState {
                    name: config.name.clone(),
                    vitals: Vitals::default(),
                    last_observed: LifeStage::Egg,
                    halt: None,
                    ticks: 0,
                    rng,
                }),
                tick_gate: Mutex::new(()),
                delivery: DeliveryLock::default(),
                stage_subs: Subscribers::default(),
                attr_subs: Subscribers::default(),
                ticker: Mutex::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakPet {
        WeakPet(Arc::downgrade(&self.inner))
    }

    // =========================================================================
    // READING
    // =========================================================================

    pub fn name(&self) -> String {
        self.lock_state().name.clone()
    }

    pub fn born(&self) -> DateTime<Utc> {
        self.inner.born
    }

    pub fn age(&self) -> Duration {
        self.inner.clock.now() - self.inner.born
    }

    pub fn hunger(&self) -> i32 {
        self.get(Attribute::Hunger)
    }

    pub fn happiness(&self) -> i32 {
        self.get(Attribute::Happiness)
    }

    pub fn intelligence(&self) -> i32 {
        self.get(Attribute::Intelligence)
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        self.lock_state().vitals.get(attribute)
    }

    pub fn vitals(&self) -> Vitals {
        self.lock_state().vitals
    }

    /// Current life stage, derived from age and vitals on every call.
    pub fn stage(&self) -> LifeStage {
        let vitals = self.vitals();
        LifeStage::derive(self.age(), &vitals)
    }

    pub fn snapshot(&self) -> PetSnapshot {
        let now = self.inner.clock.now();
        let state = self.lock_state();
        let age = now - self.inner.born;
        PetSnapshot {
            name: state.name.clone(),
            born: self.inner.born,
            age_minutes: age_in_minutes(age),
            hunger: state.vitals.hunger(),
            happiness: state.vitals.happiness(),
            intelligence: state.vitals.intelligence(),
            stage: LifeStage::derive(age, &state.vitals),
            halted: state.halt,
        }
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.lock_state().halt
    }

    pub fn is_halted(&self) -> bool {
        self.halt_reason().is_some()
    }

    /// Number of ticks that actually ran.
    pub fn tick_count(&self) -> u64 {
        self.lock_state().ticks
    }

    // =========================================================================
    // WRITING
    // =========================================================================

    pub fn rename(&self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.lock_state();
        info!(
            "pet '{}' renamed to '{}'",
            escape_log(&state.name),
            escape_log(&name)
        );
        state.name = name;
    }

    /// Guarded assignment. Out-of-range values, or any value once the pet is
    /// halted, are ignored. Fires attribute-changed if the value changed.
    ///
    /// Returns whether the value was accepted.
    pub fn set(&self, attribute: Attribute, value: i32) -> bool {
        self.try_set(attribute, value).is_ok()
    }

    /// Strict form of [`Pet::set`]: reports why a value was rejected.
    /// `Ok(changed)` on acceptance.
    pub fn try_set(&self, attribute: Attribute, value: i32) -> Result<bool, PetError> {
        self.update(attribute, |_| value)
    }

    pub fn set_hunger(&self, value: i32) -> bool {
        self.set(Attribute::Hunger, value)
    }

    pub fn set_happiness(&self, value: i32) -> bool {
        self.set(Attribute::Happiness, value)
    }

    pub fn set_intelligence(&self, value: i32) -> bool {
        self.set(Attribute::Intelligence, value)
    }

    /// Raise hunger by one. Returns whether anything changed.
    pub fn feed(&self) -> bool {
        self.raise(Attribute::Hunger)
    }

    /// Raise happiness by one. Returns whether anything changed.
    pub fn play(&self) -> bool {
        self.raise(Attribute::Happiness)
    }

    /// Raise intelligence by one. Returns whether anything changed.
    pub fn teach(&self) -> bool {
        self.raise(Attribute::Intelligence)
    }

    fn raise(&self, attribute: Attribute) -> bool {
        matches!(self.update(attribute, |v| v.saturating_add(1)), Ok(true))
    }

    /// Read-modify-write one attribute under the state lock, then notify
    /// with the lock released.
    fn update(&self, attribute: Attribute, f: impl FnOnce(i32) -> i32) -> Result<bool, PetError> {
        let _delivery = self.inner.delivery.acquire();
        let changed = {
            let mut state = self.lock_state();
            if let Some(reason) = state.halt {
                return Err(reason.as_error());
            }
            let value = f(state.vitals.get(attribute));
            state.vitals.set(attribute, value)?
        };
        if changed {
            debug!("{} set to {}", attribute, self.get(attribute));
            self.notify_attributes();
        }
        Ok(changed)
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    pub fn on_stage_changed<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(LifeStage) + Send + Sync + 'static,
    {
        self.inner.stage_subs.add(Arc::new(handler))
    }

    pub fn on_attributes_changed<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.attr_subs.add(Arc::new(handler))
    }

    /// Remove a handler from whichever channel holds it.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.stage_subs.remove(id) || self.inner.attr_subs.remove(id)
    }

    // =========================================================================
    // TIME ADVANCEMENT
    // =========================================================================

    /// Run one scheduler tick: stage-transition check, then decay.
    ///
    /// The stage check looks at vitals as the previous tick left them, so an
    /// attribute decayed to zero here is only reported dead on the next tick.
    /// A tick requested while another is still running is dropped.
    pub fn tick(&self) -> TickReport {
        let _gate = match self.inner.tick_gate.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) => {
                trace!("overlapping tick dropped");
                return TickReport {
                    skipped: true,
                    ..TickReport::default()
                };
            }
        };
        let _delivery = self.inner.delivery.acquire();

        let mut report = TickReport::default();
        let now = self.inner.clock.now();

        let transition = {
            let mut state = self.lock_state();
            if state.halt.is_some() {
                report.halted = true;
                return report;
            }
            state.ticks += 1;
            let stage = LifeStage::derive(now - self.inner.born, &state.vitals);
            if stage == state.last_observed {
                None
            } else {
                state.last_observed = stage;
                if stage.is_terminal() {
                    state.halt = Some(HaltReason::Dead);
                }
                Some((stage, state.name.clone()))
            }
        };

        if let Some((stage, name)) = transition {
            info!("pet '{}' is now {}", escape_log(&name), stage);
            report.stage_change = Some(stage);
            self.notify_stage(stage);
            if stage.is_terminal() {
                self.stop_ticker();
                info!("pet '{}' died; scheduler halted", escape_log(&name));
                report.halted = true;
                return report;
            }
        }

        let decayed = {
            let mut state = self.lock_state();
            if state.halt.is_some() {
                report.halted = true;
                return report;
            }
            let draw: u8 = state.rng.gen_range(0..10);
            Attribute::from_draw(draw).filter(|attribute| state.vitals.adjust(*attribute, -1))
        };

        if let Some(attribute) = decayed {
            trace!("decay lowered {}", attribute);
            report.decayed = Some(attribute);
            self.notify_attributes();
        }
        report
    }

    /// Attribute-changed pass; stops early if the pet halts mid-pass.
    fn notify_attributes(&self) {
        self.inner.attr_subs.deliver(|| !self.is_halted());
    }

    /// Stage-changed pass. `Dead` itself is still announced to everyone
    /// unless the pet gets disposed during the pass.
    fn notify_stage(&self, stage: LifeStage) {
        let expected = stage.is_terminal().then_some(HaltReason::Dead);
        self.inner
            .stage_subs
            .deliver(stage, || self.halt_reason() == expected);
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    /// Stop the scheduler and detach every subscriber without notifying
    /// anyone. Vitals are frozen afterwards. Idempotent.
    ///
    /// Waits for a notification pass running on another thread to finish, so
    /// no handler is called once this returns.
    pub fn dispose(&self) {
        self.stop_ticker();
        self.halt_disposed();
    }

    /// Like [`Pet::dispose`], but waits for the scheduler task to exit.
    pub async fn shutdown(&self) {
        let ticker = self.lock_ticker().take();
        self.halt_disposed();
        if let Some(ticker) = ticker {
            ticker.shutdown().await;
        }
    }

    /// Watch on the scheduler task, if one is attached. The watch outlives
    /// the pet, so it can confirm the task exited after the last handle went.
    pub fn scheduler(&self) -> Option<SchedulerWatch> {
        self.lock_ticker().as_ref().map(Ticker::watch)
    }

    /// True while a scheduler task is attached and still running.
    pub fn is_scheduled(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    fn halt_disposed(&self) {
        let _delivery = self.inner.delivery.acquire();
        {
            let mut state = self.lock_state();
            if state.halt.is_none() {
                state.halt = Some(HaltReason::Disposed);
                info!("pet '{}' disposed", escape_log(&state.name));
            }
        }
        let detached = self.inner.stage_subs.clear() + self.inner.attr_subs.clear();
        debug!("detached {} subscriber(s)", detached);
    }

    fn stop_ticker(&self) {
        if let Some(ticker) = self.lock_ticker().take() {
            ticker.stop();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PetState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_ticker(&self) -> MutexGuard<'_, Option<Ticker>> {
        self.inner.ticker.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Pet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Pet")
            .field("name", &state.name)
            .field("born", &self.inner.born)
            .field("vitals", &state.vitals)
            .field("halt", &state.halt)
            .finish()
    }
}
