//! The context threaded through flattening: the module registry, the
//! interner, the diagnostic sink, and the recursion-detection stack.
//!
//! There's no per-module-instance cache here: flattening always produces
//! fresh nets per instance, since no two instances of the same module ever
//! share storage, so memoizing by parameter hash would be incorrect.

use std::collections::HashMap;

use vgk_common::{Ident, Interner};
use vgk_diagnostics::DiagnosticSink;
use vgk_source::Span;
use vgk_verilog::ast::ModuleDecl;

use crate::errors;

/// Holds everything flattening needs but doesn't own the output itself.
pub struct ElaborationContext<'a> {
    /// Every parsed module, keyed by name, available for instantiation.
    registry: HashMap<Ident, &'a ModuleDecl>,
    /// The shared identifier interner.
    pub interner: &'a Interner,
    /// Where diagnostics go.
    pub sink: &'a DiagnosticSink,
    /// Modules currently being flattened, innermost last; used to detect
    /// recursive instantiation.
    elab_stack: Vec<Ident>,
    /// Set once a recursive cycle (or any other abort-worthy condition) is
    /// detected; checked by the flattening loop after every recursive call
    /// so elaboration unwinds instead of producing partial output.
    aborted: bool,
}

impl<'a> ElaborationContext<'a> {
    /// Builds a context from the full set of parsed modules.
    pub fn new(modules: &'a [ModuleDecl], interner: &'a Interner, sink: &'a DiagnosticSink) -> Self {
        let registry = modules.iter().map(|m| (m.name, m)).collect();
        Self {
            registry,
            interner,
            sink,
            elab_stack: Vec::new(),
            aborted: false,
        }
    }

    /// Looks up a module declaration by name.
    pub fn lookup(&self, name: Ident) -> Option<&'a ModuleDecl> {
        self.registry.get(&name).copied()
    }

    /// All registered module declarations, in registry order.
    pub fn modules(&self) -> impl Iterator<Item = &'a ModuleDecl> + '_ {
        self.registry.values().copied()
    }

    /// Whether elaboration has been aborted (recursion or another
    /// unrecoverable condition).
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Pushes a module onto the recursion stack. Returns `false` (and emits
    /// a diagnostic, and marks the context aborted) if the module is already
    /// on the stack, i.e. it directly or indirectly instantiates itself.
    ///
    /// Recursion aborts elaboration entirely, producing no elaborated output.
    pub fn push_elab_stack(&mut self, name: Ident, span: Span) -> bool {
        if self.elab_stack.contains(&name) {
            self.sink.emit(errors::error_recursive_instantiation(self.interner.resolve(name), span));
            self.aborted = true;
            return false;
        }
        self.elab_stack.push(name);
        true
    }

    /// Pops the most recently pushed module off the recursion stack.
    pub fn pop_elab_stack(&mut self) {
        self.elab_stack.pop();
    }

    /// Marks the context aborted without a recursion-specific diagnostic
    /// (the caller has already emitted its own).
    pub fn abort(&mut self) {
        self.aborted = true;
    }
}
