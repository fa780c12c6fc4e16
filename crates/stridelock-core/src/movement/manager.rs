//! Movement data source manager.
//!
//! Owns the source fallback chain and today's counters. `start()` walks the
//! priority order, settles on the first usable source, and never lets a
//! registration failure escape; a failing source demotes to the next one at
//! runtime. Every update persists the counters to the preference store and
//! invokes the registered listeners synchronously, before returning.

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate, Utc};

use crate::error::{CoreError, SensorError};
use crate::events::{Event, EventQueue};
use crate::reset;
use crate::store::PrefStore;

use super::pedometer::StepPeakDetector;
use super::progress::ProgressState;
use super::source::{
    select_source, HealthApi, SensorReading, SourceCaps, SourceKind, StepSource, Subscription,
};

/// How often the health-platform branch polls for daily aggregates.
const HEALTH_POLL_SECS: u64 = 5;

/// Push consumer of movement updates. Callbacks run synchronously on the
/// thread that produced the reading.
pub trait MovementListener: Send + Sync {
    fn on_step_count(&self, _steps_today: u64) {}

    fn on_distance(&self, _distance_km: f64) {}
}

struct Session {
    kind: SourceKind,
    subscription: Option<Subscription>,
    poll_task: Option<tokio::task::JoinHandle<()>>,
}

impl Session {
    fn idle() -> Self {
        Self {
            kind: SourceKind::None,
            subscription: None,
            poll_task: None,
        }
    }
}

struct Inner {
    store: Arc<dyn PrefStore>,
    health: Mutex<Option<Arc<dyn HealthApi>>>,
    sources: Mutex<Vec<Arc<dyn StepSource>>>,
    listeners: Mutex<Vec<Arc<dyn MovementListener>>>,
    progress: Mutex<ProgressState>,
    detector: Mutex<StepPeakDetector>,
    steps_per_km: Mutex<u32>,
    session: Mutex<Session>,
    events: EventQueue,
    health_warned: Mutex<bool>,
}

/// Produces "steps today" / "distance today" from the best available source.
pub struct MovementManager {
    inner: Arc<Inner>,
}

impl MovementManager {
    pub fn new(store: Arc<dyn PrefStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                health: Mutex::new(None),
                sources: Mutex::new(Vec::new()),
                listeners: Mutex::new(Vec::new()),
                progress: Mutex::new(ProgressState::new(Local::now().date_naive())),
                detector: Mutex::new(StepPeakDetector::new()),
                steps_per_km: Mutex::new(1300),
                session: Mutex::new(Session::idle()),
                events: EventQueue::default(),
                health_warned: Mutex::new(false),
            }),
        }
    }

    /// Attach the external health platform (polled branch).
    pub fn set_health_api(&self, api: Arc<dyn HealthApi>) {
        *self.inner.health.lock().unwrap() = Some(api);
    }

    /// Register a hardware source. Priority comes from [`SourceKind`], not
    /// registration order.
    pub fn add_source(&self, source: Arc<dyn StepSource>) {
        self.inner.sources.lock().unwrap().push(source);
    }

    pub fn add_listener(&self, listener: Arc<dyn MovementListener>) {
        self.inner.listeners.lock().unwrap().push(listener);
    }

    /// Start a monitoring session.
    ///
    /// Applies a pending daily rollover, then walks the source priority
    /// order. Sensor registration failures are demoted to the next source
    /// and never propagate out of here; only preference-store failures do.
    ///
    /// The health-platform branch spawns its polling task on the ambient
    /// Tokio runtime; without one, that branch is skipped.
    pub fn start(&self) -> Result<(), CoreError> {
        let mut prefs = self.inner.store.load()?;
        let today = Local::now().date_naive();

        {
            let mut progress = self.inner.progress.lock().unwrap();
            *progress = ProgressState {
                steps_today: prefs.steps_today,
                distance_today_km: prefs.distance_today_km,
                sensor_baseline: prefs.sensor_baseline,
                last_reset_date: prefs.last_reset_date.unwrap_or(today),
            };
            if reset::rollover_due(prefs.last_reset_date, today) {
                reset::apply_rollover(&mut prefs, &mut progress, today);
                self.inner.store.save(&prefs)?;
                self.inner.push_event(Event::DailyReset {
                    date: today,
                    at: Utc::now(),
                });
            }
        }
        *self.inner.steps_per_km.lock().unwrap() = prefs.steps_per_km;

        self.inner.stop_session();
        let caps = self.inner.capabilities();
        let initial = select_source(&caps, prefs.health_opt_in);
        Inner::start_session(&self.inner, initial, prefs.health_opt_in);
        Ok(())
    }

    /// Availability snapshot over the registered sources.
    pub fn capabilities(&self) -> SourceCaps {
        self.inner.capabilities()
    }

    /// Unregister all sensor listeners and cancel the polling task together.
    pub fn stop(&self) {
        self.inner.stop_session();
    }

    /// First reading after midnight triggers the daily reset; also exposed
    /// for hosts that reconnect without restarting the session.
    pub fn check_daily_rollover(&self, today: NaiveDate) -> bool {
        self.inner.maybe_rollover(today)
    }

    /// Snapshot of today's progress.
    pub fn progress(&self) -> ProgressState {
        self.inner.progress.lock().unwrap().clone()
    }

    pub fn active_source(&self) -> SourceKind {
        self.inner.session.lock().unwrap().kind
    }

    /// Drain queued events (GUI/CLI polling).
    pub fn drain_events(&self) -> Vec<Event> {
        self.inner.events.drain()
    }
}

impl Inner {
    fn push_event(&self, event: Event) {
        self.events.push(event);
    }

    fn stop_session(&self) {
        let mut session = self.session.lock().unwrap();
        session.subscription = None;
        if let Some(task) = session.poll_task.take() {
            task.abort();
        }
        session.kind = SourceKind::None;
    }

    fn capabilities(&self) -> SourceCaps {
        let sources = self.sources.lock().unwrap();
        let has = |kind: SourceKind| sources.iter().any(|s| s.kind() == kind && s.is_available());
        SourceCaps {
            health_available: self
                .health
                .lock()
                .unwrap()
                .as_ref()
                .is_some_and(|api| api.is_available()),
            counter: has(SourceKind::Counter),
            detector: has(SourceKind::Detector),
            accelerometer: has(SourceKind::Accelerometer),
        }
    }

    /// Try sources from `from` down the priority order.
    fn start_session(this: &Arc<Self>, from: SourceKind, health_opt_in: bool) {
        let mut kind = from;
        loop {
            match kind {
                SourceKind::HealthPlatform => {
                    if health_opt_in {
                        match Inner::try_health(this) {
                            Ok(()) => break,
                            Err(e) => this.warn_health_fallback(&e),
                        }
                    }
                }
                SourceKind::Counter | SourceKind::Detector | SourceKind::Accelerometer => {
                    match Inner::try_hardware(this, kind) {
                        Ok(()) => break,
                        Err(e) => {
                            eprintln!("Warning: {kind} source failed, falling back: {e}");
                        }
                    }
                }
                SourceKind::None => {
                    this.session.lock().unwrap().kind = SourceKind::None;
                    this.push_event(Event::SourceSelected {
                        kind: SourceKind::None,
                        at: Utc::now(),
                    });
                    break;
                }
            }
            kind = kind.next_fallback();
        }
    }

    fn try_health(this: &Arc<Self>) -> Result<(), SensorError> {
        let api = this
            .health
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SensorError::Unavailable("health platform not configured".into()))?;
        if !api.is_available() {
            return Err(SensorError::Unavailable("health platform".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| SensorError::Unavailable("no async runtime for health polling".into()))?;

        // One synchronous poll up front so consumers never observe a stale
        // zero before the first interval fires.
        this.poll_health_once(&api)?;

        let weak = Arc::downgrade(this);
        let poll_api = api.clone();
        let task = runtime.spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(HEALTH_POLL_SECS));
            interval.tick().await; // the immediate tick; already polled
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                if let Err(e) = inner.poll_health_once(&poll_api) {
                    Inner::health_failed(&inner, e);
                    break;
                }
            }
        });

        let mut session = this.session.lock().unwrap();
        session.subscription = None;
        session.poll_task = Some(task);
        session.kind = SourceKind::HealthPlatform;
        drop(session);
        this.push_event(Event::SourceSelected {
            kind: SourceKind::HealthPlatform,
            at: Utc::now(),
        });
        Ok(())
    }

    fn try_hardware(this: &Arc<Self>, kind: SourceKind) -> Result<(), SensorError> {
        let source = {
            let sources = this.sources.lock().unwrap();
            sources
                .iter()
                .find(|s| s.kind() == kind && s.is_available())
                .cloned()
        }
        .ok_or_else(|| SensorError::Unavailable(kind.to_string()))?;

        let weak = Arc::downgrade(this);
        let subscription = source.subscribe(Box::new(move |reading| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_reading(reading);
            }
        }))?;

        let mut session = this.session.lock().unwrap();
        if let Some(task) = session.poll_task.take() {
            task.abort();
        }
        session.subscription = Some(subscription);
        session.kind = kind;
        drop(session);
        this.push_event(Event::SourceSelected {
            kind,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Runtime health failure: stop polling, warn once, demote to local
    /// hardware sources.
    fn health_failed(this: &Arc<Self>, err: SensorError) {
        this.warn_health_fallback(&err);
        this.stop_session();
        Inner::start_session(this, SourceKind::Counter, false);
    }

    fn warn_health_fallback(&self, err: &SensorError) {
        let mut warned = self.health_warned.lock().unwrap();
        if !*warned {
            eprintln!("Warning: health platform unavailable, using device sensors: {err}");
            *warned = true;
        }
        self.push_event(Event::SourceFallback {
            from: SourceKind::HealthPlatform,
            to: SourceKind::Counter,
            reason: err.to_string(),
            at: Utc::now(),
        });
    }

    fn poll_health_once(&self, api: &Arc<dyn HealthApi>) -> Result<(), SensorError> {
        let steps = api.steps_today()?;
        let km = api.distance_today_km()?;
        self.maybe_rollover(Local::now().date_naive());

        let (steps_today, distance_km) = {
            let mut progress = self.progress.lock().unwrap();
            progress.record_steps_aggregate(steps);
            progress.record_distance_aggregate(km);
            (progress.steps_today, progress.distance_today_km)
        };
        self.publish(steps_today, distance_km, false);
        Ok(())
    }

    /// Sensor-service thread entry point; must stay fast and non-blocking
    /// beyond the bounded preference-store write.
    fn handle_reading(&self, reading: SensorReading) {
        self.maybe_rollover(Local::now().date_naive());

        let steps_per_km = *self.steps_per_km.lock().unwrap();
        let mut baseline_captured = false;
        let (steps_today, distance_km) = {
            let mut progress = self.progress.lock().unwrap();
            match reading {
                SensorReading::CounterTotal(total) => {
                    baseline_captured = progress.record_counter_total(total);
                }
                SensorReading::StepDetected => progress.record_step(),
                SensorReading::Accel { x, y, z, at_ms } => {
                    let stepped = self.detector.lock().unwrap().on_sample(x, y, z, at_ms);
                    if !stepped {
                        return;
                    }
                    progress.record_step();
                }
            }
            progress.derive_distance(steps_per_km);
            (progress.steps_today, progress.distance_today_km)
        };
        // The baseline must hit disk before counts derived from it, so a
        // process restart cannot re-capture and zero today's progress.
        self.publish(steps_today, distance_km, baseline_captured);
    }

    /// Persist the counters, then invoke listeners synchronously.
    fn publish(&self, steps_today: u64, distance_km: f64, baseline_changed: bool) {
        match self.store.load() {
            Ok(mut prefs) => {
                prefs.steps_today = steps_today;
                prefs.distance_today_km = distance_km;
                prefs.detector_steps = steps_today;
                if baseline_changed {
                    prefs.sensor_baseline = self.progress.lock().unwrap().sensor_baseline;
                }
                if let Err(e) = self.store.save(&prefs) {
                    eprintln!("Warning: failed to persist movement counters: {e}");
                }
            }
            Err(e) => eprintln!("Warning: failed to load prefs for counter update: {e}"),
        }

        let listeners = self.listeners.lock().unwrap().clone();
        for listener in &listeners {
            listener.on_step_count(steps_today);
            listener.on_distance(distance_km);
        }
        self.push_event(Event::StepsUpdated {
            steps_today,
            at: Utc::now(),
        });
        self.push_event(Event::DistanceUpdated {
            distance_km,
            at: Utc::now(),
        });
    }

    fn maybe_rollover(&self, today: NaiveDate) -> bool {
        let due = {
            let progress = self.progress.lock().unwrap();
            progress.last_reset_date != today
        };
        if !due {
            return false;
        }
        match self.store.load() {
            Ok(mut prefs) => {
                let mut progress = self.progress.lock().unwrap();
                reset::apply_rollover(&mut prefs, &mut progress, today);
                drop(progress);
                if let Err(e) = self.store.save(&prefs) {
                    eprintln!("Warning: failed to persist daily reset: {e}");
                }
                self.push_event(Event::DailyReset {
                    date: today,
                    at: Utc::now(),
                });
                true
            }
            Err(e) => {
                eprintln!("Warning: failed to load prefs for daily reset: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryPrefStore, Prefs};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    struct FakeCounter {
        available: bool,
        sink: Mutex<Option<Box<dyn FnMut(SensorReading) + Send>>>,
    }

    impl FakeCounter {
        fn new(available: bool) -> Self {
            Self {
                available,
                sink: Mutex::new(None),
            }
        }

        fn emit(&self, reading: SensorReading) {
            if let Some(sink) = self.sink.lock().unwrap().as_mut() {
                sink(reading);
            }
        }
    }

    impl StepSource for FakeCounter {
        fn kind(&self) -> SourceKind {
            SourceKind::Counter
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn subscribe(
            &self,
            sink: Box<dyn FnMut(SensorReading) + Send>,
        ) -> Result<Subscription, SensorError> {
            if !self.available {
                return Err(SensorError::Unavailable("counter".into()));
            }
            *self.sink.lock().unwrap() = Some(sink);
            Ok(Subscription::noop())
        }
    }

    struct DeniedSource(SourceKind);

    impl StepSource for DeniedSource {
        fn kind(&self) -> SourceKind {
            self.0
        }

        fn is_available(&self) -> bool {
            true
        }

        fn subscribe(
            &self,
            _sink: Box<dyn FnMut(SensorReading) + Send>,
        ) -> Result<Subscription, SensorError> {
            Err(SensorError::PermissionDenied(self.0.to_string()))
        }
    }

    struct FakeHealth {
        available: bool,
        steps: AtomicU64,
        fail: AtomicBool,
    }

    impl HealthApi for FakeHealth {
        fn is_available(&self) -> bool {
            self.available
        }

        fn steps_today(&self) -> Result<u64, SensorError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SensorError::QueryFailed("revoked".into()));
            }
            Ok(self.steps.load(Ordering::SeqCst))
        }

        fn distance_today_km(&self) -> Result<f64, SensorError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SensorError::QueryFailed("revoked".into()));
            }
            Ok(self.steps.load(Ordering::SeqCst) as f64 / 1300.0)
        }
    }

    struct CountingListener {
        step_calls: AtomicU64,
        last_steps: AtomicU64,
    }

    impl MovementListener for CountingListener {
        fn on_step_count(&self, steps_today: u64) {
            self.step_calls.fetch_add(1, Ordering::SeqCst);
            self.last_steps.store(steps_today, Ordering::SeqCst);
        }
    }

    fn store_with(prefs: Prefs) -> Arc<MemoryPrefStore> {
        Arc::new(MemoryPrefStore::new(prefs))
    }

    fn today_prefs() -> Prefs {
        Prefs {
            last_reset_date: Some(Local::now().date_naive()),
            ..Prefs::default()
        }
    }

    #[test]
    fn counter_source_captures_and_persists_baseline() {
        let store = store_with(today_prefs());
        let manager = MovementManager::new(store.clone());
        let counter = Arc::new(FakeCounter::new(true));
        manager.add_source(counter.clone());

        manager.start().unwrap();
        assert_eq!(manager.active_source(), SourceKind::Counter);

        counter.emit(SensorReading::CounterTotal(100_000));
        assert_eq!(store.load().unwrap().sensor_baseline, Some(100_000));
        assert_eq!(manager.progress().steps_today, 0);

        counter.emit(SensorReading::CounterTotal(100_500));
        let prefs = store.load().unwrap();
        assert_eq!(prefs.steps_today, 500);
        assert_eq!(manager.progress().steps_today, 500);
    }

    #[test]
    fn listeners_fire_synchronously_on_each_update() {
        let store = store_with(today_prefs());
        let manager = MovementManager::new(store);
        let counter = Arc::new(FakeCounter::new(true));
        manager.add_source(counter.clone());
        let listener = Arc::new(CountingListener {
            step_calls: AtomicU64::new(0),
            last_steps: AtomicU64::new(0),
        });
        manager.add_listener(listener.clone());

        manager.start().unwrap();
        counter.emit(SensorReading::CounterTotal(1000));
        counter.emit(SensorReading::CounterTotal(1200));

        assert_eq!(listener.step_calls.load(Ordering::SeqCst), 2);
        assert_eq!(listener.last_steps.load(Ordering::SeqCst), 200);
    }

    #[test]
    fn denied_counter_falls_back_to_detector() {
        let store = store_with(today_prefs());
        let manager = MovementManager::new(store.clone());
        manager.add_source(Arc::new(DeniedSource(SourceKind::Counter)));

        let detector = Arc::new(FakeCounter::new(true));
        // Reuse the fake but claim the detector slot.
        struct FakeDetector(Arc<FakeCounter>);
        impl StepSource for FakeDetector {
            fn kind(&self) -> SourceKind {
                SourceKind::Detector
            }
            fn is_available(&self) -> bool {
                true
            }
            fn subscribe(
                &self,
                sink: Box<dyn FnMut(SensorReading) + Send>,
            ) -> Result<Subscription, SensorError> {
                *self.0.sink.lock().unwrap() = Some(sink);
                Ok(Subscription::noop())
            }
        }
        manager.add_source(Arc::new(FakeDetector(detector.clone())));

        manager.start().unwrap();
        assert_eq!(manager.active_source(), SourceKind::Detector);

        detector.emit(SensorReading::StepDetected);
        detector.emit(SensorReading::StepDetected);
        assert_eq!(manager.progress().steps_today, 2);
        assert_eq!(store.load().unwrap().steps_today, 2);
    }

    #[test]
    fn no_sources_means_frozen_counters() {
        let store = store_with(today_prefs());
        let manager = MovementManager::new(store);
        manager.start().unwrap();
        assert_eq!(manager.active_source(), SourceKind::None);
        assert_eq!(manager.progress().steps_today, 0);
    }

    #[tokio::test]
    async fn health_branch_polls_immediately_on_start() {
        let mut prefs = today_prefs();
        prefs.health_opt_in = true;
        let store = store_with(prefs);
        let manager = MovementManager::new(store.clone());
        manager.set_health_api(Arc::new(FakeHealth {
            available: true,
            steps: AtomicU64::new(4200),
            fail: AtomicBool::new(false),
        }));

        manager.start().unwrap();
        assert_eq!(manager.active_source(), SourceKind::HealthPlatform);
        // The synchronous first poll already ran.
        assert_eq!(manager.progress().steps_today, 4200);
        assert_eq!(store.load().unwrap().steps_today, 4200);
        manager.stop();
    }

    #[tokio::test]
    async fn health_failure_at_start_falls_back_to_counter() {
        let mut prefs = today_prefs();
        prefs.health_opt_in = true;
        let store = store_with(prefs);
        let manager = MovementManager::new(store);
        manager.set_health_api(Arc::new(FakeHealth {
            available: true,
            steps: AtomicU64::new(0),
            fail: AtomicBool::new(true),
        }));
        manager.add_source(Arc::new(FakeCounter::new(true)));

        manager.start().unwrap();
        assert_eq!(manager.active_source(), SourceKind::Counter);
    }

    #[test]
    fn stale_reset_date_clears_counters_on_start() {
        let mut prefs = Prefs::default();
        prefs.steps_today = 9999;
        prefs.distance_today_km = 7.3;
        prefs.sensor_baseline = Some(5);
        prefs.last_reset_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let store = store_with(prefs);

        let manager = MovementManager::new(store.clone());
        manager.start().unwrap();

        let progress = manager.progress();
        assert_eq!(progress.steps_today, 0);
        assert_eq!(progress.distance_today_km, 0.0);
        assert_eq!(progress.sensor_baseline, None);

        let saved = store.load().unwrap();
        assert_eq!(saved.steps_today, 0);
        assert_eq!(saved.last_reset_date, Some(Local::now().date_naive()));
    }

    #[test]
    fn accelerometer_readings_run_the_peak_detector() {
        let store = store_with(today_prefs());
        let manager = MovementManager::new(store);
        let accel = Arc::new(FakeCounter::new(true));
        struct FakeAccel(Arc<FakeCounter>);
        impl StepSource for FakeAccel {
            fn kind(&self) -> SourceKind {
                SourceKind::Accelerometer
            }
            fn is_available(&self) -> bool {
                true
            }
            fn subscribe(
                &self,
                sink: Box<dyn FnMut(SensorReading) + Send>,
            ) -> Result<Subscription, SensorError> {
                *self.0.sink.lock().unwrap() = Some(sink);
                Ok(Subscription::noop())
            }
        }
        manager.add_source(Arc::new(FakeAccel(accel.clone())));
        manager.start().unwrap();
        assert_eq!(manager.active_source(), SourceKind::Accelerometer);

        // Two strides with a settle in between, then an in-refractory spike.
        accel.emit(SensorReading::Accel { x: 0.0, y: 0.0, z: 12.0, at_ms: 0 });
        accel.emit(SensorReading::Accel { x: 0.0, y: 0.0, z: 9.0, at_ms: 250 });
        accel.emit(SensorReading::Accel { x: 0.0, y: 0.0, z: 12.0, at_ms: 500 });
        accel.emit(SensorReading::Accel { x: 0.0, y: 0.0, z: 9.0, at_ms: 600 });
        accel.emit(SensorReading::Accel { x: 0.0, y: 0.0, z: 12.5, at_ms: 700 });

        assert_eq!(manager.progress().steps_today, 2);
    }
}
