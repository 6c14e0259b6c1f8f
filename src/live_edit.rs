//! Debounced live-edit orchestration.
//!
//! The editor widget reports every keystroke; the session turns that stream
//! into at most one execution per quiet period. Time is plain data: the host
//! passes `Instant`s into [`LiveEditSession::notify_change`] and
//! [`LiveEditSession::tick`], so there are no timers to cancel and the whole
//! state machine is testable without sleeping.
//!
//! `Idle → PendingDebounce → Validating → (Executing | Idle)`:
//! a change (re)arms the single pending deadline; when a tick passes the
//! deadline the draft is transpiled for validation (errors logged and
//! swallowed, nothing else happens), then the source is persisted and the
//! explicit-run path executes it. An explicit run skips the debounce but is
//! otherwise identical, including the rollback ladder on failure.

use std::time::{Duration, Instant};

use crate::fixtures::{FixtureError, FixtureSet};
use crate::sandbox::{self, RollbackFailed, RunOutcome};
use crate::scene::{Scene, SceneHandle};
use crate::storage::{KeyValueStore, SOURCE_KEY};
use crate::transpile::{transpile, CompiledScript, SandboxLimits};

/// Quiet period before a draft is executed.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Sample script used when nothing has been persisted yet.
pub const DEFAULT_SOURCE: &str = r#"// Create a point
let p = point(1.0, 1.0, 1.0);

// Create a line
let l = line(point(0.0, 0.0, 0.0), point(5.0, 5.0, 1.0));

// Visualize objects
visualizer.show(p);
visualizer.show(l);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    PendingDebounce,
    Validating,
    Executing,
}

/// One editing session: scene, fixtures, persistence, and the
/// last-known-good script.
pub struct LiveEditSession<S: KeyValueStore> {
    store: S,
    scene: SceneHandle,
    fixtures: FixtureSet,
    limits: SandboxLimits,
    debounce: Duration,
    /// Deadline and latest draft; replaced wholesale on every change.
    pending: Option<(Instant, String)>,
    last_good: Option<CompiledScript>,
    state: SessionState,
}

impl<S: KeyValueStore> LiveEditSession<S> {
    pub fn new(store: S) -> Self {
        let fixtures = FixtureSet::load(&store);
        Self {
            store,
            scene: Scene::new_handle(),
            fixtures,
            limits: SandboxLimits::default(),
            debounce: DEBOUNCE,
            pending: None,
            last_good: None,
            state: SessionState::Idle,
        }
    }

    pub fn with_debounce(store: S, debounce: Duration) -> Self {
        let mut session = Self::new(store);
        session.debounce = debounce;
        session
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn fixtures(&self) -> &FixtureSet {
        &self.fixtures
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_good(&self) -> Option<&CompiledScript> {
        self.last_good.as_ref()
    }

    /// The text the editor should start with: the persisted source, or the
    /// built-in sample.
    pub fn initial_source(&self) -> String {
        self.store
            .get(SOURCE_KEY)
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string())
    }

    /// Editor content changed: cancel any pending deadline and arm a new one
    /// with the latest draft. Only the most recent text survives.
    pub fn notify_change(&mut self, text: &str, now: Instant) {
        self.pending = Some((now + self.debounce, text.to_string()));
        self.state = SessionState::PendingDebounce;
    }

    /// Advance the state machine. Returns the run result when a debounced
    /// execution happened on this tick, `None` otherwise.
    pub fn tick(&mut self, now: Instant) -> Option<Result<RunOutcome, RollbackFailed>> {
        let text = match self.pending.take() {
            Some((deadline, text)) if now >= deadline => text,
            other => {
                self.pending = other;
                return None;
            }
        };

        // Live-preview validation: a draft that does not even parse is
        // logged and dropped, leaving the scene and the persisted source on
        // the last good state.
        self.state = SessionState::Validating;
        if let Err(e) = transpile(&text, &self.limits) {
            log::debug!("live preview: {}", e.diagnostic);
            self.state = SessionState::Idle;
            return None;
        }

        Some(self.run_now(&text))
    }

    /// Explicit run: no debounce, persist the source, then transpile and
    /// execute. A transpile failure here enters the same rollback ladder as
    /// a runtime failure.
    pub fn run_now(&mut self, text: &str) -> Result<RunOutcome, RollbackFailed> {
        self.state = SessionState::Executing;
        self.store.set(SOURCE_KEY, text);

        let result = match transpile(text, &self.limits) {
            Ok(script) => sandbox::execute(
                &script,
                &self.scene,
                &self.fixtures,
                &mut self.last_good,
                &self.limits,
            ),
            Err(e) => {
                log::error!("run failed to transpile: {}", e.diagnostic);
                sandbox::recover(
                    e.diagnostic,
                    &self.scene,
                    &self.fixtures,
                    self.last_good.as_ref(),
                    &self.limits,
                )
            }
        };

        self.state = SessionState::Idle;
        result
    }

    /// Validate and attach one fixture document, persisting the set. The
    /// host is expected to confirm with the user before calling.
    pub fn add_fixture(&mut self, json: &str) -> Result<(), FixtureError> {
        self.fixtures.add(json)?;
        self.fixtures.save(&mut self.store);
        Ok(())
    }

    /// Drop all fixtures and persist the empty set.
    pub fn clear_fixtures(&mut self) {
        self.fixtures.clear();
        self.fixtures.save(&mut self.store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;
    use crate::storage::{MemoryStore, FIXTURES_KEY};

    fn session() -> LiveEditSession<MemoryStore> {
        LiveEditSession::new(MemoryStore::new())
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_debounce_coalesces_rapid_changes() {
        let mut session = session();
        let t0 = Instant::now();

        session.notify_change("visualizer.show(point(1, 0, 0));", t0);
        session.notify_change("visualizer.show(point(2, 0, 0));", t0 + ms(50));
        session.notify_change("visualizer.show(point(3, 0, 0));", t0 + ms(100));
        assert_eq!(session.state(), SessionState::PendingDebounce);

        // Last change at t0+100 → deadline t0+400; nothing runs before it.
        assert!(session.tick(t0 + ms(250)).is_none());

        let outcome = session.tick(t0 + ms(450)).expect("debounced run").unwrap();
        assert_eq!(outcome, RunOutcome::Applied);
        assert_eq!(session.state(), SessionState::Idle);

        // Exactly one execution, using the last draft.
        let scene = session.scene().borrow();
        assert_eq!(scene.transient().len(), 1);
        match &scene.transient()[0] {
            SceneObject::Sphere { center, .. } => assert_eq!(*center, [3.0, 0.0, 0.0]),
            other => panic!("expected sphere, got {other:?}"),
        }
        drop(scene);

        // Timer consumed; further ticks are quiet.
        assert!(session.tick(t0 + ms(600)).is_none());
    }

    #[test]
    fn test_new_change_restarts_the_timer() {
        let mut session = session();
        let t0 = Instant::now();

        session.notify_change("visualizer.show(point(1, 0, 0));", t0);
        // Just before the first deadline, a new draft arrives.
        session.notify_change("visualizer.show(point(2, 0, 0));", t0 + ms(290));

        // The old deadline passes with nothing to run.
        assert!(session.tick(t0 + ms(310)).is_none());

        let outcome = session.tick(t0 + ms(600)).expect("run").unwrap();
        assert_eq!(outcome, RunOutcome::Applied);
    }

    #[test]
    fn test_validation_failure_is_swallowed() {
        let mut session = session();
        let t0 = Instant::now();

        // Establish a good state first.
        session.run_now("visualizer.show(point(1, 1, 1));").unwrap();
        let good_source = session.store().get(SOURCE_KEY).unwrap();

        session.notify_change("let broken = ;", t0);
        assert!(session.tick(t0 + ms(500)).is_none());

        // Scene and persisted source untouched, session back to idle.
        assert_eq!(session.scene().borrow().transient().len(), 1);
        assert_eq!(session.store().get(SOURCE_KEY).unwrap(), good_source);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_explicit_run_bypasses_debounce_and_persists() {
        let mut session = session();

        let outcome = session.run_now("visualizer.show(point(4, 5, 6));").unwrap();
        assert_eq!(outcome, RunOutcome::Applied);
        assert_eq!(
            session.store().get(SOURCE_KEY).as_deref(),
            Some("visualizer.show(point(4, 5, 6));")
        );
        assert!(session.last_good().is_some());
    }

    #[test]
    fn test_explicit_run_transpile_failure_rolls_back() {
        let mut session = session();

        session.run_now("visualizer.show(point(1, 1, 1));").unwrap();
        let good: Vec<SceneObject> = session.scene().borrow().transient().to_vec();

        let outcome = session.run_now("let broken = ;").unwrap();
        assert!(matches!(outcome, RunOutcome::RolledBack(_)));
        assert_eq!(session.scene().borrow().transient().to_vec(), good);
    }

    #[test]
    fn test_explicit_run_transpile_failure_without_good_clears() {
        let mut session = session();

        let outcome = session.run_now("let broken = ;").unwrap();
        assert!(matches!(outcome, RunOutcome::Cleared(_)));
        assert!(session.scene().borrow().transient().is_empty());
    }

    #[test]
    fn test_initial_source_prefers_persisted_text() {
        let mut store = MemoryStore::new();
        store.set(SOURCE_KEY, "visualizer.show(point(0, 0, 0));");
        let session = LiveEditSession::new(store);
        assert_eq!(session.initial_source(), "visualizer.show(point(0, 0, 0));");

        let fresh = LiveEditSession::new(MemoryStore::new());
        assert_eq!(fresh.initial_source(), DEFAULT_SOURCE);
    }

    #[test]
    fn test_default_source_runs() {
        let mut session = session();
        let source = session.initial_source();
        let outcome = session.run_now(&source).unwrap();
        assert_eq!(outcome, RunOutcome::Applied);
        assert_eq!(session.scene().borrow().transient().len(), 2);
    }

    #[test]
    fn test_fixture_lifecycle_persists() {
        let mut session = session();

        assert!(session.add_fixture("{bad json").is_err());
        session.add_fixture("{\"x\": 1, \"y\": 2}").unwrap();
        assert_eq!(session.fixtures().len(), 1);
        assert!(session.store().get(FIXTURES_KEY).is_some());

        session.clear_fixtures();
        assert!(session.fixtures().is_empty());
        assert_eq!(session.store().get(FIXTURES_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn test_fixtures_reach_scripts() {
        let mut session = session();
        session
            .add_fixture("{\"type\": \"point\", \"x\": 1, \"y\": 2, \"z\": 3}")
            .unwrap();

        let outcome = session.run_now("visualizer.show(json0);").unwrap();
        assert_eq!(outcome, RunOutcome::Applied);
        assert_eq!(session.scene().borrow().transient().len(), 1);
    }

    #[test]
    fn test_custom_debounce_window() {
        let mut session = LiveEditSession::with_debounce(MemoryStore::new(), ms(50));
        let t0 = Instant::now();

        session.notify_change("visualizer.show(point(1, 1, 1));", t0);
        assert!(session.tick(t0 + ms(20)).is_none());
        assert!(session.tick(t0 + ms(60)).is_some());
    }
}
