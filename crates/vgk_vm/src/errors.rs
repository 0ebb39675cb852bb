//! Diagnostic codes and constructors for scheduler VM build failures.
//!
//! Continues the numbering scheme `vgk_elaborate::errors` started:
//! errors `E400`-`E402` abort (or locally truncate) a process's bytecode,
//! warnings `W400`-`W402` mark a degraded but still well-formed fallback.

use vgk_diagnostics::{Category, Diagnostic, DiagnosticCode};
use vgk_source::Span;

/// An expression would need more than [`crate::opcodes::EXPR_STACK_MAX`]
/// operands live on the sub-VM stack at once.
pub const E400: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 400 };

/// A case-item pattern, delay amount, or part-select bound failed to
/// constant-fold.
pub const E401: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 401 };

/// A side-table index would overflow `u32` (an internal consistency check,
/// not expected to fire on any design this core can otherwise elaborate).
pub const E402: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 402 };

/// A construct the builder doesn't lower was encountered; the statement was
/// replaced with a no-op so the surrounding process stays well-formed.
pub const W400: DiagnosticCode = DiagnosticCode { category: Category::Warning, number: 400 };

/// A system task/function name wasn't recognized; the call was replaced
/// with a fallback service entry.
pub const W401: DiagnosticCode = DiagnosticCode { category: Category::Warning, number: 401 };

/// An expression referenced a signal that isn't in the flattened module's
/// net table (should not happen after elaboration; defensive).
pub const W402: DiagnosticCode = DiagnosticCode { category: Category::Warning, number: 402 };

pub fn error_expr_stack_overflow(span: Span) -> Diagnostic {
    Diagnostic::error(
        E400,
        "expression requires more than 32 live operands on the evaluation stack",
        span,
    )
    .with_help("split the expression into multiple assignments through an intermediate signal")
}

pub fn error_not_constant(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E401, format!("{what} must be a constant expression"), span)
}

pub fn error_index_overflow(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E402, format!("internal limit exceeded building {what}"), span)
}

pub fn warn_unsupported_statement(what: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(W400, format!("{what} is not lowered by the scheduler VM builder; skipped"), span)
}

pub fn warn_unknown_system_task(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(W401, format!("unrecognized system task/function `{name}`"), span)
}

pub fn warn_undeclared_signal(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(W402, format!("reference to undeclared signal `{name}` in compiled expression"), span)
}
