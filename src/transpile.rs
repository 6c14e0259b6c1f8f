//! Source-text to executable-script conversion.
//!
//! [`transpile`] is a pure function: it builds a fresh engine with the fixed
//! sandbox configuration, compiles the text, and fingerprints the source.
//! Nothing is executed and no shared state is touched, so the same text
//! always produces the same result. Binding injection happens later, at
//! execution time.

use rhai::Engine;
use sha2::{Digest, Sha256};

use crate::diagnostics::{from_parse_error, ScriptDiagnostic};

/// Fixed sandbox configuration applied to every engine the playground
/// creates, for compilation and execution alike. These budgets turn runaway
/// scripts into ordinary runtime errors instead of a hung host.
#[derive(Debug, Clone)]
pub struct SandboxLimits {
    pub max_operations: u64,
    pub max_expr_depth: usize,
    pub max_call_levels: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_expr_depth: 64,
            max_call_levels: 64,
            max_string_size: 10_000,
            max_array_size: 1_000,
            max_map_size: 500,
        }
    }
}

impl SandboxLimits {
    pub fn apply(&self, engine: &mut Engine) {
        engine.set_max_expr_depths(self.max_expr_depth, self.max_expr_depth);
        engine.set_max_call_levels(self.max_call_levels);
        engine.set_max_operations(self.max_operations);
        engine.set_max_string_size(self.max_string_size);
        engine.set_max_array_size(self.max_array_size);
        engine.set_max_map_size(self.max_map_size);
    }
}

/// A successfully transpiled script: the original text, its SHA-256
/// fingerprint, and the compiled form ready for the executor.
#[derive(Clone)]
pub struct CompiledScript {
    pub source: String,
    pub fingerprint: String,
    pub(crate) ast: rhai::AST,
}

impl CompiledScript {
    /// Short fingerprint prefix for log lines.
    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..12.min(self.fingerprint.len())]
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("fingerprint", &self.fingerprint)
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// Source text that could not be converted to executable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileError {
    pub diagnostic: ScriptDiagnostic,
}

impl std::fmt::Display for TranspileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transpile failed: {}", self.diagnostic)
    }
}

impl std::error::Error for TranspileError {}

fn fingerprint(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Convert user source text into a compiled script.
pub fn transpile(source: &str, limits: &SandboxLimits) -> Result<CompiledScript, TranspileError> {
    let mut engine = Engine::new();
    limits.apply(&mut engine);

    match engine.compile(source) {
        Ok(ast) => Ok(CompiledScript {
            source: source.to_string(),
            fingerprint: fingerprint(source),
            ast,
        }),
        Err(e) => Err(TranspileError {
            diagnostic: from_parse_error(&e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, ScriptPhase};

    #[test]
    fn test_transpile_is_deterministic() {
        let limits = SandboxLimits::default();
        let source = "let p = point(1.0, 1.0, 1.0);";

        let a = transpile(source, &limits).unwrap();
        let b = transpile(source, &limits).unwrap();

        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.source, b.source);
    }

    #[test]
    fn test_different_sources_have_different_fingerprints() {
        let limits = SandboxLimits::default();
        let a = transpile("let a = 1;", &limits).unwrap();
        let b = transpile("let a = 2;", &limits).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_unknown_functions_compile() {
        // Function calls resolve at execution time; the transpiler only
        // checks syntax.
        let limits = SandboxLimits::default();
        assert!(transpile("frobnicate(1, 2, 3);", &limits).is_ok());
    }

    #[test]
    fn test_parse_error_maps_to_user_line() {
        let limits = SandboxLimits::default();
        let source = "let a = 1;\nlet b = ;\n";

        let err = transpile(source, &limits).unwrap_err();
        assert_eq!(err.diagnostic.kind, DiagnosticKind::ParseError);
        assert_eq!(err.diagnostic.phase, ScriptPhase::Transpile);
        let loc = err.diagnostic.location.as_ref().expect("location");
        assert_eq!(loc.line, 2);
    }

    #[test]
    fn test_short_fingerprint() {
        let limits = SandboxLimits::default();
        let script = transpile("1;", &limits).unwrap();
        assert_eq!(script.short_fingerprint().len(), 12);
        assert!(script.fingerprint.starts_with(script.short_fingerprint()));
    }
}
