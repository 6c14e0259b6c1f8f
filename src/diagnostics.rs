//! Structured script diagnostics.
//!
//! The script engine reports rich error types (parse + runtime) with
//! positions. These are wrapped into a stable, JSON-serializable record the
//! host can surface in an editor gutter or console without parsing Rust
//! error strings.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Syntax/parse errors (transpile time).
    ParseError,
    /// Runtime errors in user code.
    RuntimeError,
    /// The script used the injected API incorrectly (missing members, wrong
    /// types, unknown functions).
    HostApiMisuse,
}

/// Which stage of the pipeline produced the diagnostic.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    Transpile,
    Execute,
    /// Re-execution of the last-known-good script after a failure.
    Rollback,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptLocation {
    /// 1-based line number in the user script.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptDiagnostic {
    pub kind: DiagnosticKind,
    pub phase: ScriptPhase,
    pub message: String,
    pub location: Option<ScriptLocation>,
}

impl std::fmt::Display for ScriptDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} (line {}, column {})", self.message, loc.line, loc.column),
            None => write!(f, "{}", self.message),
        }
    }
}

fn classify_message(message: &str) -> DiagnosticKind {
    // Engine error strings are fairly stable; this is a pragmatic
    // classification that avoids depending on internal enum variants.
    let lower = message.to_ascii_lowercase();

    if lower.contains("variable not found")
        || lower.contains("property not found")
        || lower.contains("function not found")
        || lower.contains("mismatched types")
        || lower.contains("array index")
        || lower.contains("map key")
        || lower.contains("invalid")
    {
        return DiagnosticKind::HostApiMisuse;
    }

    DiagnosticKind::RuntimeError
}

fn location_from(line: u32, column: u32) -> Option<ScriptLocation> {
    if line == 0 {
        return None;
    }
    Some(ScriptLocation {
        line,
        column: column.max(1),
    })
}

pub fn from_parse_error(err: &rhai::ParseError) -> ScriptDiagnostic {
    let pos = err.position();
    let line = pos.line().unwrap_or(0) as u32;
    let column = pos.position().unwrap_or(0) as u32;

    ScriptDiagnostic {
        kind: DiagnosticKind::ParseError,
        phase: ScriptPhase::Transpile,
        message: err.to_string(),
        location: location_from(line, column),
    }
}

pub fn from_eval_error(phase: ScriptPhase, err: &rhai::EvalAltResult) -> ScriptDiagnostic {
    let message = err.to_string();
    let kind = classify_message(&message);

    let pos = err.position();
    let line = pos.line().unwrap_or(0) as u32;
    let column = pos.position().unwrap_or(0) as u32;

    ScriptDiagnostic {
        kind,
        phase,
        message,
        location: location_from(line, column),
    }
}
