//! The flattening algorithm: picks a top module, then walks its instance
//! tree depth-first, inlining every instance's nets, ports, and processes
//! into one [`Design`] under a `__`-mangled flat namespace.
//!
//! Uses `ElaborationContext` for recursion bookkeeping and `ConstEnv`-threaded
//! parameter folding, building one flat module directly rather than a
//! separate hierarchical IR, since the scheduler VM builder
//! (`vgk_vm::builder`) only ever sees a single [`FlatModule`].

use std::collections::{HashMap, HashSet};

use vgk_common::{Ident, Interner};
use vgk_diagnostics::DiagnosticSink;
use vgk_source::Span;
use vgk_verilog::ast::{
    CaseArm, Connection, Direction, Expr, Instance, ModuleDecl, ModuleItem, NetType, PortStyle,
    Range, SensitivityItem, SensitivityList, Statement,
};
use vgk_verilog::constfold::{self, ConstEnv, ConstValue};

use crate::context::ElaborationContext;
use crate::design::{Design, FlatAlways, FlatAssign, FlatInitial, FlatModule, FlatNet, FlatPort, NetKind};
use crate::errors;

/// Elaborates a full set of parsed modules into one flattened [`Design`].
///
/// `top_name` explicitly selects the top module; when `None`, the top is
/// inferred as the one module nothing else instantiates. Returns `None` when
/// top selection fails or elaboration is aborted (recursive instantiation).
pub fn elaborate(
    modules: &[ModuleDecl],
    top_name: Option<&str>,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Option<Design> {
    let top = select_top(modules, top_name, interner, sink)?;

    let mut ctx = ElaborationContext::new(modules, interner, sink);
    let mut design = Design {
        module: FlatModule::default(),
        hier_names: HashMap::new(),
    };
    let env = ConstEnv::new();
    let bindings = HashMap::new();
    let top_hier = interner.resolve(top.name).to_string();

    flatten_module_body(&mut ctx, &mut design, top, &env, "", &top_hier, &bindings, true);

    if ctx.is_aborted() {
        return None;
    }

    check_single_driver(&design, interner, sink);
    check_clock_sanity(&design, interner, sink);

    Some(design)
}

fn select_top<'a>(
    modules: &'a [ModuleDecl],
    top_name: Option<&str>,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Option<&'a ModuleDecl> {
    if let Some(name) = top_name {
        let ident = interner.get_or_intern(name);
        return match modules.iter().find(|m| m.name == ident) {
            Some(m) => Some(m),
            None => {
                sink.emit(errors::error_top_not_found(name, Span::DUMMY));
                None
            }
        };
    }

    let instantiated: HashSet<Ident> = modules
        .iter()
        .flat_map(|m| &m.items)
        .filter_map(|item| match item {
            ModuleItem::Instantiation(inst) => Some(inst.module_name),
            _ => None,
        })
        .collect();

    let candidates: Vec<&ModuleDecl> = modules.iter().filter(|m| !instantiated.contains(&m.name)).collect();

    match candidates.len() {
        0 => {
            let span = modules.first().map(|m| m.span).unwrap_or(Span::DUMMY);
            sink.emit(errors::error_no_top_found(span));
            None
        }
        1 => Some(candidates[0]),
        _ => {
            let names: Vec<String> = candidates.iter().map(|m| interner.resolve(m.name).to_string()).collect();
            let span = candidates[0].span;
            sink.emit(errors::error_multiple_tops(&names, span));
            None
        }
    }
}

/// The resolved shape (storage kind, width, signedness) of a declared net,
/// reg, integer, or port, after re-evaluating any range expression against
/// the enclosing instance's parameter environment.
#[derive(Debug, Clone, Copy)]
struct NetShape {
    kind: NetKind,
    width: u32,
    signed: bool,
    span: Span,
}

/// Recursively flattens one module instance (or the top module) into
/// `design`, under the given mangling `prefix` and dotted `hier_path`.
///
/// `bindings` maps this module's *port* names to the flat identifiers they're
/// bound to by the caller (empty for the top module, since its ports become
/// flat ports directly).
fn flatten_module_body(
    ctx: &mut ElaborationContext,
    design: &mut Design,
    module: &ModuleDecl,
    env: &ConstEnv,
    prefix: &str,
    hier_path: &str,
    bindings: &HashMap<Ident, Ident>,
    is_top: bool,
) {
    if !ctx.push_elab_stack(module.name, module.span) {
        return;
    }

    let interner = ctx.interner;
    let sink = ctx.sink;

    let shapes = collect_net_shapes(module, env, interner, sink);
    let port_dirs: HashMap<Ident, Direction> = port_order_and_dir(module).into_iter().collect();

    let resolve = |name: Ident| -> Ident {
        if let Some(&flat) = bindings.get(&name) {
            flat
        } else {
            mangled_ident(interner, prefix, name)
        }
    };

    // Every declared name not bound to a caller-side net gets its own flat
    // storage. Top-level ports additionally become `FlatPort`s.
    for (&name, shape) in &shapes {
        if bindings.contains_key(&name) {
            continue;
        }
        let flat_name = resolve(name);
        let local_hier = format!("{hier_path}.{}", interner.resolve(name));
        if !register_net(design, interner, sink, flat_name, local_hier, shape.span, *shape) {
            continue;
        }
        if is_top {
            if let Some(&direction) = port_dirs.get(&name) {
                design.module.ports.push(FlatPort {
                    direction,
                    name: flat_name,
                    signed: shape.signed,
                    width: shape.width,
                    span: shape.span,
                });
            }
        }
    }

    for item in &module.items {
        match item {
            ModuleItem::ContinuousAssign(ca) => {
                design.module.assigns.push(FlatAssign {
                    target: rename_expr(&ca.target, &resolve),
                    value: rename_expr(&ca.value, &resolve),
                    span: ca.span,
                });
            }
            ModuleItem::AlwaysBlock(ab) => {
                design.module.always_blocks.push(FlatAlways {
                    body: rename_stmt(&ab.body, &resolve),
                    span: ab.span,
                });
            }
            ModuleItem::InitialBlock(ib) => {
                design.module.initial_blocks.push(FlatInitial {
                    body: rename_stmt(&ib.body, &resolve),
                    span: ib.span,
                });
            }
            ModuleItem::Instantiation(inst) => {
                for instance in &inst.instances {
                    flatten_instance(ctx, design, module, env, prefix, hier_path, inst.module_name, &inst.param_overrides, instance, &resolve);
                }
            }
            ModuleItem::GateInst(g) => {
                sink.emit(errors::warn_unsupported_construct("gate primitive instantiation", g.span));
            }
            ModuleItem::GenerateBlock(_) => {
                sink.emit(errors::warn_unsupported_construct("generate block", module.span));
            }
            ModuleItem::FunctionDecl(f) => {
                sink.emit(errors::warn_unsupported_construct("function declaration", f.span));
            }
            ModuleItem::TaskDecl(t) => {
                sink.emit(errors::warn_unsupported_construct("task declaration", t.span));
            }
            ModuleItem::DefparamDecl(d) => {
                sink.emit(errors::warn_unsupported_construct("defparam", d.span));
            }
            ModuleItem::GenvarDecl(_)
            | ModuleItem::NetDecl(_)
            | ModuleItem::RegDecl(_)
            | ModuleItem::IntegerDecl(_)
            | ModuleItem::RealDecl(_)
            | ModuleItem::ParameterDecl(_)
            | ModuleItem::LocalparamDecl(_)
            | ModuleItem::PortDecl(_)
            | ModuleItem::Error(_) => {
                // Already accounted for by `collect_net_shapes`, or nothing to flatten.
            }
        }
    }

    ctx.pop_elab_stack();
}

/// Flattens one instance of a module (one `Instance` out of one
/// `Instantiation`'s comma-separated list): folds its parameter overrides,
/// builds its port-binding map, and recurses into its body.
#[allow(clippy::too_many_arguments)]
fn flatten_instance(
    ctx: &mut ElaborationContext,
    design: &mut Design,
    _caller_module: &ModuleDecl,
    caller_env: &ConstEnv,
    caller_prefix: &str,
    caller_hier: &str,
    child_name: Ident,
    param_overrides: &[Connection],
    instance: &Instance,
    caller_resolve: &impl Fn(Ident) -> Ident,
) {
    let interner = ctx.interner;
    let sink = ctx.sink;

    let Some(child) = ctx.lookup(child_name) else {
        sink.emit(errors::error_unknown_module(interner.resolve(child_name), instance.span));
        return;
    };

    let overrides = fold_param_overrides(param_overrides, child, caller_env, interner, sink);
    let child_env = build_param_env(child, &overrides, interner, sink);
    let child_shapes = collect_net_shapes(child, &child_env, interner, sink);
    let child_ports = port_order_and_dir(child);

    let instance_name = interner.resolve(instance.name).to_string();
    let child_prefix = format!("{caller_prefix}{instance_name}__");
    let child_hier = format!("{caller_hier}.{instance_name}");

    let named = instance.connections.first().map(|c| c.formal.is_some()).unwrap_or(false);
    let mixed = instance
        .connections
        .iter()
        .any(|c| c.formal.is_some() != named);
    if mixed {
        sink.emit(errors::error_unsupported("mixed positional and named port connections", instance.span));
    }
    if !named && instance.connections.len() > child_ports.len() {
        sink.emit(errors::error_too_many_connections(interner.resolve(child_name), instance.span));
    }

    let mut bindings: HashMap<Ident, Ident> = HashMap::new();

    for (idx, &(port_name, direction)) in child_ports.iter().enumerate() {
        let connection: Option<&Connection> = if mixed {
            None
        } else if named {
            instance.connections.iter().find(|c| c.formal == Some(port_name))
        } else {
            instance.connections.get(idx)
        };

        let shape = child_shapes.get(&port_name).copied().unwrap_or(NetShape {
            kind: NetKind::Wire,
            width: 1,
            signed: false,
            span: instance.span,
        });

        let actual = connection.and_then(|c| c.actual.as_ref());
        let port_str = interner.resolve(port_name).to_string();
        let port_str = port_str.as_str();

        match direction {
            Direction::Input => match actual {
                Some(Expr::Identifier { name, .. }) => {
                    bindings.insert(port_name, caller_resolve(*name));
                }
                Some(lit @ Expr::Literal { value, .. }) => {
                    let wire_name = interner.get_or_intern(&format!("{child_prefix}{port_str}__lit"));
                    let wire_hier = format!("{child_hier}.{port_str}__lit");
                    if register_net(
                        design,
                        interner,
                        sink,
                        wire_name,
                        wire_hier,
                        lit.span(),
                        NetShape { kind: NetKind::Wire, width: value.width(), signed: false, span: lit.span() },
                    ) {
                        design.module.assigns.push(FlatAssign {
                            target: Expr::Identifier { name: wire_name, span: lit.span() },
                            value: (*lit).clone(),
                            span: lit.span(),
                        });
                    }
                    bindings.insert(port_name, wire_name);
                }
                Some(other) => {
                    sink.emit(errors::error_unsupported_connection(other.span()));
                    bindings.insert(port_name, synth_unconnected(design, interner, sink, &child_prefix, &child_hier, port_str, shape, other.span()));
                }
                None => {
                    sink.emit(errors::warn_unconnected_input(port_str, &instance_name, instance.span));
                    bindings.insert(port_name, synth_unconnected(design, interner, sink, &child_prefix, &child_hier, port_str, shape, instance.span));
                }
            },
            Direction::Output | Direction::Inout => match actual {
                Some(Expr::Identifier { name, .. }) => {
                    bindings.insert(port_name, caller_resolve(*name));
                }
                Some(other) => {
                    sink.emit(errors::error_unsupported_connection(other.span()));
                    bindings.insert(port_name, synth_unconnected(design, interner, sink, &child_prefix, &child_hier, port_str, shape, other.span()));
                }
                None => {
                    sink.emit(errors::warn_unconnected_output(port_str, &instance_name, instance.span));
                    bindings.insert(port_name, synth_unconnected(design, interner, sink, &child_prefix, &child_hier, port_str, shape, instance.span));
                }
            },
        }
    }

    flatten_module_body(ctx, design, child, &child_env, &child_prefix, &child_hier, &bindings, false);
}

/// Allocates an unbound storage wire for an unconnected or unsupported
/// connection, so the child body still has something to read from or write
/// to.
fn synth_unconnected(
    design: &mut Design,
    interner: &Interner,
    sink: &DiagnosticSink,
    child_prefix: &str,
    child_hier: &str,
    port_str: &str,
    shape: NetShape,
    span: Span,
) -> Ident {
    let wire_name = interner.get_or_intern(&format!("{child_prefix}{port_str}__unconn"));
    let wire_hier = format!("{child_hier}.{port_str}__unconn");
    register_net(design, interner, sink, wire_name, wire_hier, span, shape);
    wire_name
}

/// Registers a flat net, checking for a mangled-name collision against
/// anything already registered under the same name. Returns `false` (after
/// emitting a diagnostic) when the name collides with a different hierarchy
/// path.
fn register_net(
    design: &mut Design,
    interner: &Interner,
    sink: &DiagnosticSink,
    flat_name: Ident,
    hier_path: String,
    span: Span,
    shape: NetShape,
) -> bool {
    if let Some(existing) = design.hier_names.get(&flat_name) {
        if *existing != hier_path {
            sink.emit(errors::error_flat_name_collision(interner.resolve(flat_name), span, span));
            return false;
        }
        return true;
    }
    design.hier_names.insert(flat_name, hier_path);
    design.module.nets.push(FlatNet {
        name: flat_name,
        kind: shape.kind,
        signed: shape.signed,
        width: shape.width,
        span,
    });
    true
}

fn mangled_ident(interner: &Interner, prefix: &str, name: Ident) -> Ident {
    if prefix.is_empty() {
        name
    } else {
        interner.get_or_intern(&format!("{prefix}{}", interner.resolve(name)))
    }
}

/// Returns this module's ports in declared order, paired with their
/// direction, regardless of ANSI/non-ANSI style.
fn port_order_and_dir(module: &ModuleDecl) -> Vec<(Ident, Direction)> {
    match module.port_style {
        PortStyle::Ansi => module
            .ports
            .iter()
            .flat_map(|p| p.names.iter().map(move |&n| (n, p.direction)))
            .collect(),
        PortStyle::NonAnsi => {
            let mut dirs: HashMap<Ident, Direction> = HashMap::new();
            for item in &module.items {
                if let ModuleItem::PortDecl(p) = item {
                    for &n in &p.names {
                        dirs.insert(n, p.direction);
                    }
                }
            }
            module
                .port_names
                .iter()
                .map(|&n| (n, dirs.get(&n).copied().unwrap_or(Direction::Input)))
                .collect()
        }
        PortStyle::Empty => Vec::new(),
    }
}

/// Resolves every declared net, reg, integer, and port in `module` to its
/// concrete shape, folding any range expression against `env`.
fn collect_net_shapes(module: &ModuleDecl, env: &ConstEnv, interner: &Interner, sink: &DiagnosticSink) -> HashMap<Ident, NetShape> {
    let mut shapes = HashMap::new();

    if module.port_style == PortStyle::Ansi {
        for p in &module.ports {
            let kind = if p.net_type == Some(NetType::Reg) { NetKind::Reg } else { NetKind::Wire };
            let width = resolve_width(&p.range, env, interner, sink, 1);
            for &name in &p.names {
                shapes.insert(name, NetShape { kind, width, signed: p.signed, span: p.span });
            }
        }
    }

    for item in &module.items {
        match item {
            ModuleItem::PortDecl(p) => {
                let kind = if p.net_type == Some(NetType::Reg) { NetKind::Reg } else { NetKind::Wire };
                let width = resolve_width(&p.range, env, interner, sink, 1);
                for &name in &p.names {
                    shapes.insert(name, NetShape { kind, width, signed: p.signed, span: p.span });
                }
            }
            ModuleItem::NetDecl(n) => {
                let width = resolve_width(&n.range, env, interner, sink, 1);
                for dn in &n.names {
                    shapes.insert(dn.name, NetShape { kind: NetKind::Wire, width, signed: n.signed, span: dn.span });
                }
            }
            ModuleItem::RegDecl(n) => {
                let width = resolve_width(&n.range, env, interner, sink, 1);
                for dn in &n.names {
                    shapes.insert(dn.name, NetShape { kind: NetKind::Reg, width, signed: n.signed, span: dn.span });
                }
            }
            ModuleItem::IntegerDecl(n) => {
                for dn in &n.names {
                    shapes.insert(dn.name, NetShape { kind: NetKind::Integer, width: 32, signed: true, span: dn.span });
                }
            }
            ModuleItem::RealDecl(n) => {
                for dn in &n.names {
                    sink.emit(errors::warn_unsupported_construct("real variable", dn.span));
                }
            }
            _ => {}
        }
    }

    shapes
}

fn resolve_width(range: &Option<Range>, env: &ConstEnv, interner: &Interner, sink: &DiagnosticSink, default: u32) -> u32 {
    let Some(r) = range else { return default };
    let msb = constfold::fold_expr(&r.msb, env, interner);
    let lsb = constfold::fold_expr(&r.lsb, env, interner);
    match (msb, lsb) {
        (Ok(m), Ok(l)) => {
            let m = m.value.to_i64().unwrap_or(0);
            let l = l.value.to_i64().unwrap_or(0);
            ((m - l).unsigned_abs() as u32).saturating_add(1)
        }
        (Err(e), _) | (_, Err(e)) => {
            sink.emit(errors::error_param_not_const(&e, r.span));
            default
        }
    }
}

/// Folds an instance's `#(...)` parameter overrides against the caller's own
/// environment (parameter override expressions live in the caller's scope,
/// not the instantiated module's).
fn fold_param_overrides(
    overrides: &[Connection],
    module: &ModuleDecl,
    caller_env: &ConstEnv,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> HashMap<Ident, ConstValue> {
    let mut result = HashMap::new();
    if overrides.is_empty() {
        return result;
    }
    let named = overrides.first().map(|c| c.formal.is_some()).unwrap_or(false);
    if named {
        for c in overrides {
            let (Some(formal), Some(actual)) = (c.formal, &c.actual) else { continue };
            match constfold::fold_expr(actual, caller_env, interner) {
                Ok(v) => {
                    result.insert(formal, v);
                }
                Err(e) => sink.emit(errors::error_param_not_const(&e, c.span)),
            }
        }
    } else {
        for (i, c) in overrides.iter().enumerate() {
            let Some(param) = module.params.get(i) else { continue };
            let Some(actual) = &c.actual else { continue };
            match constfold::fold_expr(actual, caller_env, interner) {
                Ok(v) => {
                    result.insert(param.name, v);
                }
                Err(e) => sink.emit(errors::error_param_not_const(&e, c.span)),
            }
        }
    }
    result
}

/// Builds the constant environment for one module instantiation: the ANSI
/// `#(...)` parameter list, then any body-level `parameter`/`localparam`
/// declarations, each folded in source order against everything folded
/// before it. An override wins over the declared default, but never for a
/// `localparam` (those can't be overridden from an instantiation).
fn build_param_env(module: &ModuleDecl, overrides: &HashMap<Ident, ConstValue>, interner: &Interner, sink: &DiagnosticSink) -> ConstEnv {
    let mut env = ConstEnv::new();
    for p in &module.params {
        insert_param(&mut env, p, overrides, interner, sink);
    }
    for item in &module.items {
        match item {
            ModuleItem::ParameterDecl(p) | ModuleItem::LocalparamDecl(p) => {
                insert_param(&mut env, p, overrides, interner, sink);
            }
            _ => {}
        }
    }
    env
}

fn insert_param(
    env: &mut ConstEnv,
    p: &vgk_verilog::ast::ParameterDecl,
    overrides: &HashMap<Ident, ConstValue>,
    interner: &Interner,
    sink: &DiagnosticSink,
) {
    if !p.local {
        if let Some(v) = overrides.get(&p.name) {
            env.insert(p.name, v.clone());
            return;
        }
    }
    if let Some(value_expr) = &p.value {
        match constfold::fold_expr(value_expr, env, interner) {
            Ok(v) => env.insert(p.name, v),
            Err(e) => sink.emit(errors::error_param_not_const(&e, p.span)),
        }
    }
}

fn lhs_base_ident(expr: &Expr) -> Option<Ident> {
    match expr {
        Expr::Identifier { name, .. } => Some(*name),
        Expr::Index { base, .. } | Expr::RangeSelect { base, .. } | Expr::PartSelect { base, .. } => lhs_base_ident(base),
        _ => None,
    }
}

fn collect_stmt_targets(stmt: &Statement, out: &mut Vec<(Ident, Span)>) {
    match stmt {
        Statement::Blocking { target, span, .. } | Statement::NonBlocking { target, span, .. } => {
            if let Some(name) = lhs_base_ident(target) {
                out.push((name, *span));
            }
        }
        Statement::Block { stmts, .. } => {
            for s in stmts {
                collect_stmt_targets(s, out);
            }
        }
        Statement::If { then_stmt, else_stmt, .. } => {
            collect_stmt_targets(then_stmt, out);
            if let Some(e) = else_stmt {
                collect_stmt_targets(e, out);
            }
        }
        Statement::Case { arms, .. } => {
            for arm in arms {
                collect_stmt_targets(&arm.body, out);
            }
        }
        Statement::For { body, .. }
        | Statement::While { body, .. }
        | Statement::Forever { body }
        | Statement::Repeat { body, .. } => collect_stmt_targets(body, out),
        Statement::Wait { body, .. } => {
            if let Some(b) = body {
                collect_stmt_targets(b, out);
            }
        }
        Statement::EventControl { body, .. } | Statement::Delay { body, .. } => collect_stmt_targets(body, out),
        _ => {}
    }
}

/// Checks that every signal is driven by at most one continuous assign or
/// always block (not both, and not twice).
fn check_single_driver(design: &Design, interner: &Interner, sink: &DiagnosticSink) {
    let mut drivers: HashMap<Ident, Span> = HashMap::new();
    let mut all: Vec<(Ident, Span)> = Vec::new();

    for a in &design.module.assigns {
        if let Some(name) = lhs_base_ident(&a.target) {
            all.push((name, a.span));
        }
    }
    for ab in &design.module.always_blocks {
        collect_stmt_targets(&ab.body, &mut all);
    }

    for (name, span) in all {
        if let Some(&prev) = drivers.get(&name) {
            sink.emit(errors::error_multiple_drivers(interner.resolve(name), span, prev));
        } else {
            drivers.insert(name, span);
        }
    }
}

fn expr_base_ident(expr: &Expr) -> Option<Ident> {
    lhs_base_ident(expr)
}

/// Warns when an edge-sensitive always block's clock expression isn't a net
/// or port anywhere in the flattened design (a likely typo or a signal that
/// was optimized away upstream).
fn check_clock_sanity(design: &Design, interner: &Interner, sink: &DiagnosticSink) {
    let known: HashSet<Ident> = design.module.nets.iter().map(|n| n.name).collect();
    for ab in &design.module.always_blocks {
        if let Statement::EventControl { sensitivity, .. } = &ab.body {
            if let SensitivityList::List(items) = sensitivity {
                for item in items {
                    if item.edge.is_some() {
                        if let Some(name) = expr_base_ident(&item.signal) {
                            if !known.contains(&name) {
                                sink.emit(errors::warn_undeclared_clock(interner.resolve(name), item.span));
                            }
                        }
                    }
                }
            }
        }
    }
}

fn rename_expr(expr: &Expr, resolve: &impl Fn(Ident) -> Ident) -> Expr {
    match expr {
        Expr::Identifier { name, span } => Expr::Identifier { name: resolve(*name), span: *span },
        Expr::HierarchicalName { .. } | Expr::Literal { .. } | Expr::RealLiteral { .. } | Expr::StringLiteral { .. } | Expr::Error(_) => {
            expr.clone()
        }
        Expr::Index { base, index, span } => Expr::Index {
            base: Box::new(rename_expr(base, resolve)),
            index: Box::new(rename_expr(index, resolve)),
            span: *span,
        },
        Expr::RangeSelect { base, msb, lsb, span } => Expr::RangeSelect {
            base: Box::new(rename_expr(base, resolve)),
            msb: Box::new(rename_expr(msb, resolve)),
            lsb: Box::new(rename_expr(lsb, resolve)),
            span: *span,
        },
        Expr::PartSelect { base, index, ascending, width, span } => Expr::PartSelect {
            base: Box::new(rename_expr(base, resolve)),
            index: Box::new(rename_expr(index, resolve)),
            ascending: *ascending,
            width: Box::new(rename_expr(width, resolve)),
            span: *span,
        },
        Expr::Concat { elements, span } => Expr::Concat {
            elements: elements.iter().map(|e| rename_expr(e, resolve)).collect(),
            span: *span,
        },
        Expr::Repeat { count, elements, span } => Expr::Repeat {
            count: Box::new(rename_expr(count, resolve)),
            elements: elements.iter().map(|e| rename_expr(e, resolve)).collect(),
            span: *span,
        },
        Expr::Unary { op, operand, span } => Expr::Unary {
            op: *op,
            operand: Box::new(rename_expr(operand, resolve)),
            span: *span,
        },
        Expr::Binary { left, op, right, span } => Expr::Binary {
            left: Box::new(rename_expr(left, resolve)),
            op: *op,
            right: Box::new(rename_expr(right, resolve)),
            span: *span,
        },
        Expr::Ternary { condition, then_expr, else_expr, span } => Expr::Ternary {
            condition: Box::new(rename_expr(condition, resolve)),
            then_expr: Box::new(rename_expr(then_expr, resolve)),
            else_expr: Box::new(rename_expr(else_expr, resolve)),
            span: *span,
        },
        Expr::FuncCall { name, args, span } => Expr::FuncCall {
            name: Box::new(rename_expr(name, resolve)),
            args: args.iter().map(|a| rename_expr(a, resolve)).collect(),
            span: *span,
        },
        Expr::SystemCall { name, args, span } => Expr::SystemCall {
            name: *name,
            args: args.iter().map(|a| rename_expr(a, resolve)).collect(),
            span: *span,
        },
        Expr::Paren { inner, span } => Expr::Paren {
            inner: Box::new(rename_expr(inner, resolve)),
            span: *span,
        },
    }
}

fn rename_stmt(stmt: &Statement, resolve: &impl Fn(Ident) -> Ident) -> Statement {
    match stmt {
        Statement::Blocking { target, value, span } => Statement::Blocking {
            target: rename_expr(target, resolve),
            value: rename_expr(value, resolve),
            span: *span,
        },
        Statement::NonBlocking { target, value, span } => Statement::NonBlocking {
            target: rename_expr(target, resolve),
            value: rename_expr(value, resolve),
            span: *span,
        },
        Statement::Block { label, decls, stmts, span } => Statement::Block {
            label: *label,
            decls: decls.clone(),
            stmts: stmts.iter().map(|s| rename_stmt(s, resolve)).collect(),
            span: *span,
        },
        Statement::If { condition, then_stmt, else_stmt, span } => Statement::If {
            condition: rename_expr(condition, resolve),
            then_stmt: Box::new(rename_stmt(then_stmt, resolve)),
            else_stmt: else_stmt.as_ref().map(|e| Box::new(rename_stmt(e, resolve))),
            span: *span,
        },
        Statement::Case { kind, expr, arms, span } => Statement::Case {
            kind: *kind,
            expr: rename_expr(expr, resolve),
            arms: arms
                .iter()
                .map(|a| CaseArm {
                    patterns: a.patterns.iter().map(|p| rename_expr(p, resolve)).collect(),
                    is_default: a.is_default,
                    body: rename_stmt(&a.body, resolve),
                    span: a.span,
                })
                .collect(),
            span: *span,
        },
        Statement::For { init, condition, step, body, span } => Statement::For {
            init: Box::new(rename_stmt(init, resolve)),
            condition: rename_expr(condition, resolve),
            step: Box::new(rename_stmt(step, resolve)),
            body: Box::new(rename_stmt(body, resolve)),
            span: *span,
        },
        Statement::While { condition, body, span } => Statement::While {
            condition: rename_expr(condition, resolve),
            body: Box::new(rename_stmt(body, resolve)),
            span: *span,
        },
        Statement::Forever { body, span } => Statement::Forever {
            body: Box::new(rename_stmt(body, resolve)),
            span: *span,
        },
        Statement::Repeat { count, body, span } => Statement::Repeat {
            count: rename_expr(count, resolve),
            body: Box::new(rename_stmt(body, resolve)),
            span: *span,
        },
        Statement::Wait { condition, body, span } => Statement::Wait {
            condition: rename_expr(condition, resolve),
            body: body.as_ref().map(|b| Box::new(rename_stmt(b, resolve))),
            span: *span,
        },
        Statement::EventControl { sensitivity, body, span } => Statement::EventControl {
            sensitivity: match sensitivity {
                SensitivityList::Star => SensitivityList::Star,
                SensitivityList::List(items) => SensitivityList::List(
                    items
                        .iter()
                        .map(|i| SensitivityItem {
                            edge: i.edge,
                            signal: rename_expr(&i.signal, resolve),
                            span: i.span,
                        })
                        .collect(),
                ),
            },
            body: Box::new(rename_stmt(body, resolve)),
            span: *span,
        },
        Statement::Delay { delay, body, span } => Statement::Delay {
            delay: rename_expr(delay, resolve),
            body: Box::new(rename_stmt(body, resolve)),
            span: *span,
        },
        Statement::TaskCall { name, args, span } => Statement::TaskCall {
            name: rename_expr(name, resolve),
            args: args.iter().map(|a| rename_expr(a, resolve)).collect(),
            span: *span,
        },
        Statement::SystemTaskCall { name, args, span } => Statement::SystemTaskCall {
            name: *name,
            args: args.iter().map(|a| rename_expr(a, resolve)).collect(),
            span: *span,
        },
        Statement::Disable { name, span } => Statement::Disable { name: *name, span: *span },
        Statement::Null { span } => Statement::Null { span: *span },
        Statement::Error(span) => Statement::Error(*span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgk_diagnostics::DiagnosticSink;
    use vgk_source::Span;
    use vgk_verilog::lexer::lex;
    use vgk_verilog::parser::VerilogParser;
    use vgk_source::FileId;

    fn parse(src: &str, interner: &Interner, sink: &DiagnosticSink) -> Vec<ModuleDecl> {
        let file = FileId::from_raw(0);
        let tokens = lex(src, file, sink);
        let mut parser = VerilogParser::new(tokens, src, file, interner, sink);
        parser
            .parse_source_file()
            .items
            .into_iter()
            .filter_map(|item| match item {
                vgk_verilog::ast::VerilogItem::Module(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn flattens_single_module_verbatim() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let src = "module top(input a, input b, output y); assign y = a & b; endmodule";
        let modules = parse(src, &interner, &sink);
        let design = elaborate(&modules, None, &interner, &sink).expect("elaboration succeeds");
        assert_eq!(design.module.ports.len(), 3);
        assert_eq!(design.module.assigns.len(), 1);
        assert!(!sink.has_errors());
    }

    #[test]
    fn mangles_nested_instance_names() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let src = "\
            module leaf(input a, output y); assign y = a; endmodule\n\
            module top(input a, output y); leaf u1(.a(a), .y(y)); endmodule\n\
        ";
        let modules = parse(src, &interner, &sink);
        let design = elaborate(&modules, None, &interner, &sink).expect("elaboration succeeds");
        // `a` and `y` are bound straight through to top's own ports; no
        // internal net should be synthesized for them.
        assert_eq!(design.module.nets.len(), 2);
        assert!(!sink.has_errors());
    }

    #[test]
    fn unconnected_input_warns_and_defaults() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let src = "\
            module leaf(input a, output y); assign y = a; endmodule\n\
            module top(output y); leaf u1(.y(y)); endmodule\n\
        ";
        let modules = parse(src, &interner, &sink);
        let design = elaborate(&modules, None, &interner, &sink).expect("elaboration succeeds");
        assert!(sink.has_errors() == false);
        let warnings = sink.take_all();
        assert!(warnings.iter().any(|d| d.code == errors::W300));
        assert!(design.hier_names.values().any(|h| h.ends_with("a__unconn")));
    }

    #[test]
    fn recursive_instantiation_aborts() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let src = "module bad(input a); bad u1(.a(a)); endmodule\n";
        let modules = parse(src, &interner, &sink);
        let design = elaborate(&modules, Some("bad"), &interner, &sink);
        assert!(design.is_none());
        assert!(sink.has_errors());
    }

    #[test]
    fn multiple_drivers_rejected() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let src = "module top(input a, input b, output reg y); assign y = a; always @(posedge a) y <= b; endmodule";
        let modules = parse(src, &interner, &sink);
        let _ = elaborate(&modules, None, &interner, &sink);
        let diags = sink.take_all();
        assert!(diags.iter().any(|d| d.code == errors::E305));
    }

    #[test]
    fn literal_port_connection_synthesizes_wire() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let src = "\
            module leaf(input en, output y); assign y = en; endmodule\n\
            module top(output y); leaf u1(.en(1'b1), .y(y)); endmodule\n\
        ";
        let modules = parse(src, &interner, &sink);
        let design = elaborate(&modules, None, &interner, &sink).expect("elaboration succeeds");
        assert!(design.hier_names.keys().any(|&k| interner.resolve(k).ends_with("__lit")));
    }
}
