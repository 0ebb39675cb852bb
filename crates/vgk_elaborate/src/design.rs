//! The flattened design produced by elaboration.
//!
//! A [`Design`] holds exactly one [`FlatModule`]: the recursively inlined
//! top-level module, with every instance's nets, ports, and processes
//! renamed under a `__`-mangled prefix and spliced into one flat namespace.
//! There is no separate hierarchical IR stage between the AST and this flat
//! form (see DESIGN.md).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vgk_common::Ident;
use vgk_source::Span;
use vgk_verilog::ast::{Direction, Expr, Statement};

/// The fully elaborated, flattened design.
#[derive(Debug, Clone)]
pub struct Design {
    /// The single flattened module (formerly the top module plus every
    /// instance transitively instantiated underneath it).
    pub module: FlatModule,
    /// Maps each flat (mangled) identifier back to its dotted hierarchical
    /// path, e.g. `u_cpu__u_alu__result` -> `top.u_cpu.u_alu.result`.
    pub hier_names: HashMap<Ident, String>,
}

/// The kind of storage a flattened net occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetKind {
    /// A `wire`-like net: driven continuously, no storage between events.
    Wire,
    /// A `reg`-like variable: retains its value between procedural updates.
    Reg,
    /// A 32-bit `integer` variable.
    Integer,
}

/// A single flattened net or variable.
#[derive(Debug, Clone)]
pub struct FlatNet {
    /// The flat (mangled) name.
    pub name: Ident,
    /// Storage kind.
    pub kind: NetKind,
    /// Whether arithmetic on this net treats it as signed.
    pub signed: bool,
    /// Bit width.
    pub width: u32,
    /// Source span of the declaration that introduced it.
    pub span: Span,
}

/// A top-level port, retained under its original (unmangled) name.
#[derive(Debug, Clone)]
pub struct FlatPort {
    /// Port direction.
    pub direction: Direction,
    /// The port's (unmangled, top-level) name.
    pub name: Ident,
    /// Whether the port is signed.
    pub signed: bool,
    /// Bit width.
    pub width: u32,
    /// Source span.
    pub span: Span,
}

/// A flattened continuous assignment.
#[derive(Debug, Clone)]
pub struct FlatAssign {
    /// The target lvalue expression, renamed into the flat namespace.
    pub target: Expr,
    /// The value expression, renamed into the flat namespace.
    pub value: Expr,
    /// Source span.
    pub span: Span,
}

/// A flattened `always` block.
#[derive(Debug, Clone)]
pub struct FlatAlways {
    /// The block body, renamed into the flat namespace.
    pub body: Statement,
    /// Source span.
    pub span: Span,
}

/// A flattened `initial` block.
#[derive(Debug, Clone)]
pub struct FlatInitial {
    /// The block body, renamed into the flat namespace.
    pub body: Statement,
    /// Source span.
    pub span: Span,
}

/// One fully flattened module: the inlined top module plus every instance
/// transitively instantiated underneath it, spliced into a single namespace.
#[derive(Debug, Clone, Default)]
pub struct FlatModule {
    /// Top-level ports, under their original (unmangled) names.
    pub ports: Vec<FlatPort>,
    /// Every net/reg/integer in the flattened design, including ports.
    pub nets: Vec<FlatNet>,
    /// Continuous assignments, including synthetic ones for literal port
    /// connections.
    pub assigns: Vec<FlatAssign>,
    /// `always` blocks.
    pub always_blocks: Vec<FlatAlways>,
    /// `initial` blocks.
    pub initial_blocks: Vec<FlatInitial>,
}

impl FlatModule {
    /// Looks up a net's declared width by its flat name.
    pub fn net_width(&self, name: Ident) -> Option<u32> {
        self.nets.iter().find(|n| n.name == name).map(|n| n.width)
    }
}
