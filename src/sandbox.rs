//! One-shot sandboxed execution with rollback to the last known good script.
//!
//! Every execution starts from a clean slate: the scene is reset to its
//! permanent prefix and the binding environment is rebuilt, so the only
//! state that survives across runs is the scene handle itself and the
//! last-known-good script owned by the caller.
//!
//! Failure ladder:
//! 1. the current script fails → log it and, if a known-good script exists,
//!    reset the scene again and re-execute the known-good script;
//! 2. the known-good re-execution fails too → reset the scene to the
//!    permanent prefix and surface [`RollbackFailed`]; never retried;
//! 3. no known-good script → the scene stays at the permanent prefix.

use rhai::Scope;

use crate::diagnostics::{from_eval_error, ScriptDiagnostic, ScriptPhase};
use crate::fixtures::FixtureSet;
use crate::scene::SceneHandle;
use crate::script_api::{build_engine, install_bindings};
use crate::script_log::reset_run_log_count;
use crate::transpile::{CompiledScript, SandboxLimits};

/// How a run ended, short of the terminal case.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The current script ran cleanly; it is the new last-known-good.
    Applied,
    /// The current script failed; the last-known-good script was re-applied
    /// and the scene shows its output.
    RolledBack(ScriptDiagnostic),
    /// The current script failed and nothing has ever succeeded; the scene
    /// is the permanent prefix only.
    Cleared(ScriptDiagnostic),
}

/// Terminal double-failure: both the current script and the known-good
/// re-execution raised. Surfaced to the caller without further retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackFailed {
    pub current: ScriptDiagnostic,
    pub rollback: ScriptDiagnostic,
}

impl std::fmt::Display for RollbackFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "script failed ({}) and rollback failed too ({})",
            self.current, self.rollback
        )
    }
}

impl std::error::Error for RollbackFailed {}

/// Reset the scene and execute one script against freshly-built bindings.
fn run_once(
    script: &CompiledScript,
    phase: ScriptPhase,
    scene: &SceneHandle,
    fixtures: &FixtureSet,
    limits: &SandboxLimits,
) -> Result<(), ScriptDiagnostic> {
    scene.borrow_mut().clear_transient();
    reset_run_log_count();

    let mut engine = build_engine(limits);
    let mut scope = Scope::new();
    install_bindings(&mut engine, &mut scope, scene, fixtures);

    engine
        .run_ast_with_scope(&mut scope, &script.ast)
        .map_err(|e| from_eval_error(phase, &e))
}

/// Execute `script`. On success it becomes the last-known-good; on failure
/// the ladder above applies.
pub fn execute(
    script: &CompiledScript,
    scene: &SceneHandle,
    fixtures: &FixtureSet,
    last_good: &mut Option<CompiledScript>,
    limits: &SandboxLimits,
) -> Result<RunOutcome, RollbackFailed> {
    match run_once(script, ScriptPhase::Execute, scene, fixtures, limits) {
        Ok(()) => {
            log::info!("script {} applied", script.short_fingerprint());
            *last_good = Some(script.clone());
            Ok(RunOutcome::Applied)
        }
        Err(diagnostic) => {
            log::error!("script {} failed: {diagnostic}", script.short_fingerprint());
            recover(diagnostic, scene, fixtures, last_good.as_ref(), limits)
        }
    }
}

/// The failure half of the ladder. Also entered directly when an explicit
/// run fails to transpile. The last-known-good script is consulted, never
/// cleared.
pub(crate) fn recover(
    diagnostic: ScriptDiagnostic,
    scene: &SceneHandle,
    fixtures: &FixtureSet,
    last_good: Option<&CompiledScript>,
    limits: &SandboxLimits,
) -> Result<RunOutcome, RollbackFailed> {
    let Some(good) = last_good else {
        scene.borrow_mut().clear_transient();
        return Ok(RunOutcome::Cleared(diagnostic));
    };

    match run_once(good, ScriptPhase::Rollback, scene, fixtures, limits) {
        Ok(()) => {
            log::info!("rolled back to script {}", good.short_fingerprint());
            Ok(RunOutcome::RolledBack(diagnostic))
        }
        Err(rollback) => {
            log::error!(
                "rollback to script {} failed: {rollback}",
                good.short_fingerprint()
            );
            scene.borrow_mut().clear_transient();
            Err(RollbackFailed {
                current: diagnostic,
                rollback,
            })
        }
    }
}
