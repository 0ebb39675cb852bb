//! Diagnostic codes and constructors for elaboration errors and warnings.
//!
//! Error codes `E300`-`E312` cover flattening failures (unknown modules,
//! driver conflicts, recursive instantiation, etc). Warning codes
//! `W300`-`W303` cover non-fatal issues (unconnected ports, undeclared
//! clocks).

use vgk_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use vgk_source::Span;

/// Unknown module referenced in an instantiation.
pub const E300: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 300 };

/// No top-level module could be identified (every module is instantiated).
pub const E301: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 301 };

/// More than one candidate top-level module.
pub const E302: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 302 };

/// Explicitly named top module doesn't exist.
pub const E303: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 303 };

/// Recursive (directly or indirectly self-instantiating) module hierarchy.
pub const E304: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 304 };

/// A signal is driven by more than one continuous assign / always block.
pub const E305: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 305 };

/// Two flattened instances collide on the same mangled flat name.
pub const E306: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 306 };

/// Unknown port name in an instantiation connection.
pub const E307: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 307 };

/// Too many positional connections for the target module's port list.
pub const E308: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 308 };

/// A parameter override or range bound failed to constant-fold.
pub const E309: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 309 };

/// A port connection's actual expression is neither a name nor a literal.
pub const E310: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 310 };

/// An unsupported construct was encountered during flattening.
pub const E311: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 311 };

/// A `defparam` target could not be resolved.
pub const E312: DiagnosticCode = DiagnosticCode { category: Category::Error, number: 312 };

/// An input port is left unconnected (defaults to a constant-zero driver).
pub const W300: DiagnosticCode = DiagnosticCode { category: Category::Warning, number: 300 };

/// An output port is left unconnected (its value is simply dropped).
pub const W301: DiagnosticCode = DiagnosticCode { category: Category::Warning, number: 301 };

/// An edge-sensitive always block's clock signal isn't a declared net/port.
pub const W302: DiagnosticCode = DiagnosticCode { category: Category::Warning, number: 302 };

/// A generate/gate/function/task construct was skipped (not elaborated).
pub const W303: DiagnosticCode = DiagnosticCode { category: Category::Warning, number: 303 };

/// Creates a diagnostic for an unknown module in an instantiation.
pub fn error_unknown_module(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E300, format!("unknown module `{name}`"), span)
        .with_help("check that the module is defined in one of the compiled source files")
}

/// Creates a diagnostic for no discoverable top-level module.
pub fn error_no_top_found(span: Span) -> Diagnostic {
    Diagnostic::error(E301, "no top-level module found", span)
        .with_note("every module in this design is instantiated by another module")
        .with_help("pass an explicit top module name")
}

/// Creates a diagnostic for multiple candidate top-level modules.
pub fn error_multiple_tops(names: &[String], span: Span) -> Diagnostic {
    Diagnostic::error(
        E302,
        format!("multiple top-level modules found: {}", names.join(", ")),
        span,
    )
    .with_help("pass an explicit top module name to disambiguate")
}

/// Creates a diagnostic for an explicitly named top module that doesn't exist.
pub fn error_top_not_found(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E303, format!("top-level module `{name}` not found"), span)
}

/// Creates a diagnostic for a recursive instantiation cycle.
pub fn error_recursive_instantiation(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E304, format!("recursive instantiation of module `{name}`"), span)
        .with_note("the module directly or indirectly instantiates itself")
}

/// Creates a diagnostic for a signal driven by more than one process.
pub fn error_multiple_drivers(name: &str, span: Span, prev_span: Span) -> Diagnostic {
    Diagnostic::error(E305, format!("signal `{name}` has more than one driver"), span)
        .with_label(Label::secondary(prev_span, "also driven here"))
}

/// Creates a diagnostic for two instances colliding on the same flat name.
pub fn error_flat_name_collision(name: &str, span: Span, prev_span: Span) -> Diagnostic {
    Diagnostic::error(E306, format!("flattened name `{name}` collides with another instance"), span)
        .with_label(Label::secondary(prev_span, "first introduced here"))
}

/// Creates a diagnostic for an unknown port on a named connection.
pub fn error_unknown_port(port_name: &str, module_name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E307, format!("unknown port `{port_name}` on module `{module_name}`"), span)
}

/// Creates a diagnostic when positional connections exceed the port list.
pub fn error_too_many_connections(module_name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E308,
        format!("too many positional port connections for module `{module_name}`"),
        span,
    )
}

/// Creates a diagnostic when a parameter or range bound can't be folded.
pub fn error_param_not_const(msg: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E309, format!("cannot evaluate constant expression: {msg}"), span)
}

/// Creates a diagnostic for a connection that is neither a name nor a literal.
pub fn error_unsupported_connection(span: Span) -> Diagnostic {
    Diagnostic::error(E310, "port connection must be a signal name or a literal", span)
}

/// Creates a diagnostic for an unsupported construct encountered during
/// flattening (one that halts elaboration, as opposed to [`warn_unsupported_construct`]).
pub fn error_unsupported(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E311, format!("unsupported construct: {what}"), span)
}

/// Creates a diagnostic for a `defparam` whose target can't be resolved.
pub fn error_defparam_unresolved(target: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E312, format!("cannot resolve defparam target `{target}`"), span)
}

/// Creates a warning for an unconnected input port.
pub fn warn_unconnected_input(port_name: &str, instance_name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        W300,
        format!("input port `{port_name}` is unconnected on instance `{instance_name}`; defaulting to zero"),
        span,
    )
}

/// Creates a warning for an unconnected output port.
pub fn warn_unconnected_output(port_name: &str, instance_name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        W301,
        format!("output port `{port_name}` is unconnected on instance `{instance_name}`"),
        span,
    )
}

/// Creates a warning for an edge-sensitive always block whose clock signal
/// isn't a net or port declared anywhere in the flattened design.
pub fn warn_undeclared_clock(name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(W302, format!("clock signal `{name}` is not a declared net or port"), span)
}

/// Creates a warning for a generate/gate/function/task construct that was
/// encountered but not elaborated.
pub fn warn_unsupported_construct(what: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(W303, format!("{what} is not elaborated; skipped"), span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_formats() {
        assert_eq!(format!("{E300}"), "E300");
        assert_eq!(format!("{E304}"), "E304");
        assert_eq!(format!("{W300}"), "W300");
        assert_eq!(format!("{W303}"), "W303");
    }

    #[test]
    fn unknown_module_diagnostic() {
        let d = error_unknown_module("counter", Span::DUMMY);
        assert_eq!(d.code, E300);
        assert!(d.message.contains("counter"));
    }

    #[test]
    fn multiple_drivers_diagnostic() {
        let d = error_multiple_drivers("q", Span::DUMMY, Span::DUMMY);
        assert_eq!(d.code, E305);
        assert_eq!(d.labels.len(), 1);
    }

    #[test]
    fn recursive_instantiation_diagnostic() {
        let d = error_recursive_instantiation("top", Span::DUMMY);
        assert_eq!(d.code, E304);
        assert!(d.message.contains("top"));
    }

    #[test]
    fn unconnected_input_warning() {
        let d = warn_unconnected_input("en", "u1", Span::DUMMY);
        assert_eq!(d.code, W300);
        assert!(d.message.contains("en"));
    }

    #[test]
    fn flat_name_collision_diagnostic() {
        let d = error_flat_name_collision("u1__q", Span::DUMMY, Span::DUMMY);
        assert_eq!(d.code, E306);
        assert_eq!(d.labels.len(), 1);
    }
}
