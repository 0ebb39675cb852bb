//! Lowers one flattened module into a [`SchedulerVmLayout`].
//!
//! One process is built per continuous assignment, `always` block, and
//! `initial` block: a continuous assign and a combinational `always @*` are
//! lowered the same way, as a process that waits for any read signal to
//! change, re-runs its body, and loops.

use std::collections::HashMap;

use vgk_common::{Ident, Interner};
use vgk_diagnostics::{Diagnostic, DiagnosticSink};
use vgk_elaborate::design::{Design, FlatAlways, FlatAssign, FlatInitial};
use vgk_fourstate::FourState;
use vgk_source::Span;
use vgk_verilog::ast::{CaseArm, CaseKind as AstCaseKind, EdgeKind, Expr, SensitivityList, Statement};
use vgk_verilog::constfold::{self, ConstEnv};

use crate::errors;
use crate::exprvm::ExprBuilder;
use crate::layout::{
    AssignEntry, CaseEntry, CaseHeader, CondEntry, DelayAssignEntry, RepeatEntry, SchedulerVmLayout,
    SensitivityItem, ServiceArg, ServiceArgKind, ServiceEntry,
};
use crate::opcodes::{
    self, CaseKind, CaseStrategy, CondKind, Op, ASSIGN_FLAG_NONBLOCKING, DELAY_ASSIGN_FLAG_NONBLOCKING,
    SERVICE_FLAG_FINISH, SERVICE_FLAG_MONITOR, SERVICE_FLAG_STOP,
};
use crate::service_kind;

/// Builds a [`SchedulerVmLayout`] for `design`'s single flattened module.
/// Diagnostics for unsupported constructs are emitted to `sink`; the caller
/// decides (as with elaboration) whether their presence should fail the run.
pub fn build(design: &Design, interner: &Interner, sink: &DiagnosticSink) -> SchedulerVmLayout {
    let mut layout = SchedulerVmLayout::new();

    let mut signal_index = HashMap::new();
    let mut signal_width = HashMap::new();
    for net in &design.module.nets {
        let default = FourState::all_x(net.width);
        let val_offset = layout.val_words.len() as u32;
        layout.val_words.extend_from_slice(default.val_limbs());
        let xz_offset = layout.xz_words.len() as u32;
        layout.xz_words.extend_from_slice(&default.unknown_limbs());
        let idx = layout.signals.len() as u32;
        layout.signals.push(crate::layout::SignalEntry {
            val_slot: val_offset,
            xz_slot: xz_offset,
            width: net.width,
            limb_count: default.val_limbs().len() as u32,
        });
        signal_index.insert(net.name, idx);
        signal_width.insert(net.name, net.width);
    }

    let mut diagnostics = Vec::new();

    for assign in &design.module.assigns {
        let entry = build_continuous_assign(&mut layout, &signal_index, &signal_width, interner, &mut diagnostics, assign);
        layout.process_entry_points.push(entry);
    }
    for always in &design.module.always_blocks {
        let entry = build_always_process(&mut layout, &signal_index, &signal_width, interner, &mut diagnostics, always);
        layout.process_entry_points.push(entry);
    }
    for initial in &design.module.initial_blocks {
        let entry = build_initial_process(&mut layout, &signal_index, &signal_width, interner, &mut diagnostics, initial);
        layout.process_entry_points.push(entry);
    }

    for d in diagnostics {
        sink.emit(d);
    }

    layout
}

fn build_continuous_assign(
    layout: &mut SchedulerVmLayout,
    signal_index: &HashMap<Ident, u32>,
    signal_width: &HashMap<Ident, u32>,
    interner: &Interner,
    diagnostics: &mut Vec<Diagnostic>,
    assign: &FlatAssign,
) -> u32 {
    let entry = layout.main_words.len() as u32;
    let mut lower = Lowering::new(layout, signal_index, signal_width, interner, diagnostics);

    let loop_start = lower.main_len();
    let cond_idx = lower.push_cond(CondEntry {
        kind: CondKind::Dynamic,
        val: 0,
        xz: 0,
        expr_offset: 0,
        branch_target: 0,
        sensitivity_first: 0,
        sensitivity_count: 0,
    });
    lower.emit_main(Op::WaitEvent.encode(cond_idx));
    lower.lower_blocking_like(&assign.target, &assign.value, false, assign.span);
    lower.emit_main(Op::Jump.encode(loop_start));
    entry
}

fn build_always_process(
    layout: &mut SchedulerVmLayout,
    signal_index: &HashMap<Ident, u32>,
    signal_width: &HashMap<Ident, u32>,
    interner: &Interner,
    diagnostics: &mut Vec<Diagnostic>,
    always: &FlatAlways,
) -> u32 {
    let entry = layout.main_words.len() as u32;
    let mut lower = Lowering::new(layout, signal_index, signal_width, interner, diagnostics);
    let loop_start = lower.main_len();
    lower.lower_stmt(&always.body);
    lower.emit_main(Op::Jump.encode(loop_start));
    entry
}

fn build_initial_process(
    layout: &mut SchedulerVmLayout,
    signal_index: &HashMap<Ident, u32>,
    signal_width: &HashMap<Ident, u32>,
    interner: &Interner,
    diagnostics: &mut Vec<Diagnostic>,
    initial: &FlatInitial,
) -> u32 {
    let entry = layout.main_words.len() as u32;
    let mut lower = Lowering::new(layout, signal_index, signal_width, interner, diagnostics);
    lower.lower_stmt(&initial.body);
    lower.emit_main(Op::Done.encode(0));
    entry
}

/// Threads the side tables through one process's statement lowering.
struct Lowering<'a> {
    layout: &'a mut SchedulerVmLayout,
    signal_index: &'a HashMap<Ident, u32>,
    signal_width: &'a HashMap<Ident, u32>,
    interner: &'a Interner,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Lowering<'a> {
    fn new(
        layout: &'a mut SchedulerVmLayout,
        signal_index: &'a HashMap<Ident, u32>,
        signal_width: &'a HashMap<Ident, u32>,
        interner: &'a Interner,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            layout,
            signal_index,
            signal_width,
            interner,
            diagnostics,
        }
    }

    fn main_len(&self) -> u32 {
        self.layout.main_words.len() as u32
    }

    fn emit_main(&mut self, word: u32) -> u32 {
        let at = self.layout.main_words.len() as u32;
        self.layout.main_words.push(word);
        at
    }

    fn patch_main(&mut self, at: u32, word: u32) {
        self.layout.main_words[at as usize] = word;
    }

    fn push_cond(&mut self, entry: CondEntry) -> u32 {
        let idx = self.layout.conds.len() as u32;
        self.layout.conds.push(entry);
        idx
    }

    fn compile_expr(&mut self, expr: &Expr) -> u32 {
        let mut b = ExprBuilder::new(
            self.interner,
            self.signal_index,
            self.signal_width,
            &mut self.layout.expr_words,
            &mut self.layout.consts,
            &mut self.layout.val_words,
            &mut self.layout.xz_words,
            self.diagnostics,
        );
        b.compile(expr)
    }

    fn const_fold(&self, expr: &Expr) -> Option<FourState> {
        let env = ConstEnv::new();
        constfold::fold_expr(expr, &env, self.interner).ok().map(|v| v.value)
    }

    fn static_width(&self, expr: &Expr) -> Option<u32> {
        match expr {
            Expr::Identifier { name, .. } => self.signal_width.get(name).copied(),
            Expr::Literal { value, .. } => Some(value.width()),
            Expr::Paren { inner, .. } => self.static_width(inner),
            other => self.const_fold(other).map(|v| v.width()),
        }
    }

    fn lower_stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Blocking { target, value, span } => self.lower_blocking_like(target, value, false, *span),
            Statement::NonBlocking { target, value, span } => self.lower_blocking_like(target, value, true, *span),
            Statement::Block { stmts, .. } => {
                for s in stmts {
                    self.lower_stmt(s);
                }
            }
            Statement::If {
                condition,
                then_stmt,
                else_stmt,
                ..
            } => self.lower_if(condition, then_stmt, else_stmt.as_deref()),
            Statement::Case { kind, expr, arms, span } => self.lower_case(*kind, expr, arms, *span),
            Statement::For { init, condition, step, body, .. } => self.lower_for(init, condition, step, body),
            Statement::While { condition, body, .. } => self.lower_while(condition, body),
            Statement::Forever { body, .. } => self.lower_forever(body),
            Statement::Repeat { count, body, span } => self.lower_repeat(count, body, *span),
            Statement::Wait { condition, body, .. } => self.lower_wait(condition, body.as_deref()),
            Statement::EventControl { sensitivity, body, .. } => self.lower_event_control(sensitivity, body),
            Statement::Delay { delay, body, span } => self.lower_delay(delay, body, *span),
            Statement::SystemTaskCall { name, args, span } => self.lower_system_task(*name, args, *span),
            Statement::TaskCall { span, .. } => {
                self.diagnostics.push(errors::warn_unsupported_statement("a user task call", *span));
                self.emit_main(Op::Noop.encode(0));
            }
            Statement::Disable { .. } => {
                self.emit_main(Op::Disable.encode(opcodes::DisableKind::Block as u32));
            }
            Statement::Null { .. } => {
                self.emit_main(Op::Noop.encode(0));
            }
            Statement::Error(span) => {
                self.diagnostics.push(errors::warn_unsupported_statement("a malformed statement", *span));
                self.emit_main(Op::Noop.encode(0));
            }
        }
    }

    fn resolve_lhs(&mut self, target: &Expr) -> Option<(u32, u32, u32)> {
        match target {
            Expr::Identifier { name, span } => match self.signal_index.get(name) {
                Some(&idx) => Some((idx, 0, *self.signal_width.get(name).unwrap_or(&1))),
                None => {
                    self.diagnostics
                        .push(errors::warn_undeclared_signal(self.interner.resolve(*name), *span));
                    None
                }
            },
            Expr::Index { base, index, span } => {
                let Expr::Identifier { name, .. } = base.as_ref() else {
                    self.diagnostics.push(errors::error_not_constant("an assignment target base", *span));
                    return None;
                };
                let &idx = self.signal_index.get(name)?;
                let Some(bit) = self.const_fold(index).and_then(|v| v.to_u64()) else {
                    self.diagnostics.push(errors::error_not_constant("a bit-select assignment target", *span));
                    return None;
                };
                Some((idx, bit as u32, 1))
            }
            Expr::RangeSelect { base, msb, lsb, span } => {
                let Expr::Identifier { name, .. } = base.as_ref() else {
                    self.diagnostics.push(errors::error_not_constant("an assignment target base", *span));
                    return None;
                };
                let &idx = self.signal_index.get(name)?;
                let (Some(msb_v), Some(lsb_v)) = (
                    self.const_fold(msb).and_then(|v| v.to_u64()),
                    self.const_fold(lsb).and_then(|v| v.to_u64()),
                ) else {
                    self.diagnostics.push(errors::error_not_constant("a part-select assignment target", *span));
                    return None;
                };
                let (hi, lo) = if msb_v >= lsb_v { (msb_v, lsb_v) } else { (lsb_v, msb_v) };
                Some((idx, lo as u32, (hi - lo + 1) as u32))
            }
            Expr::PartSelect { base, index, width, span, .. } => {
                let Expr::Identifier { name, .. } = base.as_ref() else {
                    self.diagnostics.push(errors::error_not_constant("an assignment target base", *span));
                    return None;
                };
                let &idx = self.signal_index.get(name)?;
                let (Some(start), Some(w)) = (
                    self.const_fold(index).and_then(|v| v.to_u64()),
                    self.const_fold(width).and_then(|v| v.to_u64()),
                ) else {
                    self.diagnostics
                        .push(errors::error_not_constant("an indexed part-select assignment target", *span));
                    return None;
                };
                Some((idx, start as u32, w as u32))
            }
            other => {
                self.diagnostics
                    .push(errors::warn_unsupported_statement("a non-lvalue assignment target", other.span()));
                None
            }
        }
    }

    fn lower_blocking_like(&mut self, target: &Expr, value: &Expr, nonblocking: bool, _span: Span) {
        let rhs = self.compile_expr(value);
        let Some((signal, lsb, width)) = self.resolve_lhs(target) else {
            self.emit_main(Op::Noop.encode(0));
            return;
        };
        let flags = if nonblocking { ASSIGN_FLAG_NONBLOCKING } else { 0 };
        let idx = self.layout.assigns.len() as u32;
        self.layout.assigns.push(AssignEntry {
            signal,
            rhs_expr_offset: rhs,
            flags,
            lsb,
            width,
        });
        let op = if nonblocking { Op::AssignNb } else { Op::Assign };
        self.emit_main(op.encode(idx));
    }

    fn lower_if(&mut self, condition: &Expr, then_stmt: &Statement, else_stmt: Option<&Statement>) {
        let expr_off = self.compile_expr(condition);
        let cond_idx = self.push_cond(CondEntry {
            kind: CondKind::Expr,
            val: 0,
            xz: 0,
            expr_offset: expr_off,
            branch_target: 0,
            sensitivity_first: 0,
            sensitivity_count: 0,
        });
        self.emit_main(Op::JumpIf.encode(cond_idx));
        self.lower_stmt(then_stmt);
        if let Some(else_stmt) = else_stmt {
            let jump_end_at = self.emit_main(Op::Jump.encode(0));
            let else_start = self.main_len();
            self.layout.conds[cond_idx as usize].branch_target = else_start;
            self.lower_stmt(else_stmt);
            let end = self.main_len();
            self.patch_main(jump_end_at, Op::Jump.encode(end));
        } else {
            let end = self.main_len();
            self.layout.conds[cond_idx as usize].branch_target = end;
        }
    }

    /// Lowers a `case`/`casex`/`casez` statement. `Op::Case` always
    /// transfers control itself (to a matched arm, the default, or straight
    /// past the whole statement if nothing matches and there's no default);
    /// no bytecode word directly after it is ever reached by fallthrough.
    fn lower_case(&mut self, kind: AstCaseKind, selector: &Expr, arms: &[CaseArm], _span: Span) {
        let selector_off = self.compile_expr(selector);
        let selector_width = self.static_width(selector).unwrap_or(32);
        let header_idx = self.layout.case_headers.len() as u32;
        let entries_start = self.layout.case_entries.len() as u32;
        self.layout.case_headers.push(CaseHeader {
            kind: vm_case_kind(kind),
            strategy: if arms.len() > 8 { CaseStrategy::Bucket } else { CaseStrategy::Linear },
            selector_expr_offset: selector_off,
            first_entry: entries_start,
            entry_count: 0,
            default_target: 0,
            has_default: false,
        });
        self.emit_main(Op::Case.encode(header_idx));

        let mut default_target = None;
        let mut pending_ends = Vec::new();
        for arm in arms {
            let body_target = self.main_len();
            if arm.is_default {
                default_target = Some(body_target);
            } else {
                for pattern in &arm.patterns {
                    let Some(pat_value) = self.const_fold(pattern) else {
                        self.diagnostics.push(errors::error_not_constant("a case-item pattern", pattern.span()));
                        continue;
                    };
                    let (want, care) = want_care_for(kind, &pat_value, selector_width);
                    let want_offset = self.layout.case_words.len() as u32;
                    self.layout.case_words.extend_from_slice(&want);
                    let care_offset = self.layout.case_words.len() as u32;
                    self.layout.case_words.extend_from_slice(&care);
                    self.layout.case_entries.push(CaseEntry {
                        want_offset,
                        care_offset,
                        limb_count: want.len() as u32,
                        target: body_target,
                    });
                }
            }
            self.lower_stmt(&arm.body);
            pending_ends.push(self.emit_main(Op::Jump.encode(0)));
        }
        let case_end = self.main_len();
        for at in pending_ends {
            self.patch_main(at, Op::Jump.encode(case_end));
        }
        let header = &mut self.layout.case_headers[header_idx as usize];
        header.entry_count = self.layout.case_entries.len() as u32 - entries_start;
        header.has_default = default_target.is_some();
        header.default_target = default_target.unwrap_or(case_end);
    }

    fn lower_for(&mut self, init: &Statement, condition: &Expr, step: &Statement, body: &Statement) {
        self.lower_stmt(init);
        let loop_start = self.main_len();
        let expr_off = self.compile_expr(condition);
        let cond_idx = self.push_cond(CondEntry {
            kind: CondKind::Expr,
            val: 0,
            xz: 0,
            expr_offset: expr_off,
            branch_target: 0,
            sensitivity_first: 0,
            sensitivity_count: 0,
        });
        self.emit_main(Op::JumpIf.encode(cond_idx));
        self.lower_stmt(body);
        self.lower_stmt(step);
        self.emit_main(Op::Jump.encode(loop_start));
        let end = self.main_len();
        self.layout.conds[cond_idx as usize].branch_target = end;
    }

    fn lower_while(&mut self, condition: &Expr, body: &Statement) {
        let loop_start = self.main_len();
        let expr_off = self.compile_expr(condition);
        let cond_idx = self.push_cond(CondEntry {
            kind: CondKind::Expr,
            val: 0,
            xz: 0,
            expr_offset: expr_off,
            branch_target: 0,
            sensitivity_first: 0,
            sensitivity_count: 0,
        });
        self.emit_main(Op::JumpIf.encode(cond_idx));
        self.lower_stmt(body);
        self.emit_main(Op::Jump.encode(loop_start));
        let end = self.main_len();
        self.layout.conds[cond_idx as usize].branch_target = end;
    }

    fn lower_forever(&mut self, body: &Statement) {
        let loop_start = self.main_len();
        self.lower_stmt(body);
        self.emit_main(Op::Jump.encode(loop_start));
    }

    fn lower_repeat(&mut self, count: &Expr, body: &Statement, _span: Span) {
        let count_off = self.compile_expr(count);
        let idx = self.layout.repeats.len() as u32;
        self.layout.repeats.push(RepeatEntry {
            count_expr_offset: count_off,
            body_len: 0,
        });
        self.emit_main(Op::Repeat.encode(idx));
        let body_start = self.main_len();
        self.lower_stmt(body);
        let body_len = self.main_len() - body_start;
        self.layout.repeats[idx as usize].body_len = body_len;
    }

    fn lower_wait(&mut self, condition: &Expr, body: Option<&Statement>) {
        let expr_off = self.compile_expr(condition);
        let cond_idx = self.push_cond(CondEntry {
            kind: CondKind::Expr,
            val: 0,
            xz: 0,
            expr_offset: expr_off,
            branch_target: 0,
            sensitivity_first: 0,
            sensitivity_count: 0,
        });
        self.emit_main(Op::WaitCond.encode(cond_idx));
        if let Some(body) = body {
            self.lower_stmt(body);
        }
    }

    fn lower_event_control(&mut self, sensitivity: &SensitivityList, body: &Statement) {
        let cond_idx = match sensitivity {
            SensitivityList::Star => self.push_cond(CondEntry {
                kind: CondKind::Dynamic,
                val: 0,
                xz: 0,
                expr_offset: 0,
                branch_target: 0,
                sensitivity_first: 0,
                sensitivity_count: 0,
            }),
            SensitivityList::List(items) => {
                let first = self.layout.sensitivity_items.len() as u32;
                let mut count = 0u32;
                for item in items {
                    let Expr::Identifier { name, span } = &item.signal else {
                        self.diagnostics
                            .push(errors::warn_unsupported_statement("a non-identifier sensitivity item", item.span));
                        continue;
                    };
                    let Some(&sig) = self.signal_index.get(name) else {
                        self.diagnostics.push(errors::warn_undeclared_signal(self.interner.resolve(*name), *span));
                        continue;
                    };
                    let edge = match item.edge {
                        Some(EdgeKind::Posedge) => 1,
                        Some(EdgeKind::Negedge) => 2,
                        None => 0,
                    };
                    self.layout.sensitivity_items.push(SensitivityItem { signal: sig, edge });
                    count += 1;
                }
                self.push_cond(CondEntry {
                    kind: CondKind::Sensitivity,
                    val: 0,
                    xz: 0,
                    expr_offset: 0,
                    branch_target: 0,
                    sensitivity_first: first,
                    sensitivity_count: count,
                })
            }
        };
        let has_edge = matches!(sensitivity, SensitivityList::List(items) if items.iter().any(|i| i.edge.is_some()));
        let op = if has_edge { Op::WaitEdge } else { Op::WaitEvent };
        self.emit_main(op.encode(cond_idx));
        self.lower_stmt(body);
    }

    fn lower_delay(&mut self, delay: &Expr, body: &Statement, _span: Span) {
        if let Some((target, value, nonblocking)) = single_assign(body) {
            let rhs = self.compile_expr(value);
            let delay_off = self.compile_expr(delay);
            let Some((signal, lsb, width)) = self.resolve_lhs(target) else {
                self.emit_main(Op::Noop.encode(0));
                return;
            };
            let flags = if nonblocking { DELAY_ASSIGN_FLAG_NONBLOCKING } else { 0 };
            let idx = self.layout.delay_assigns.len() as u32;
            self.layout.delay_assigns.push(DelayAssignEntry {
                signal,
                rhs_expr_offset: rhs,
                delay_expr_offset: delay_off,
                flags,
                lsb,
                width,
            });
            self.emit_main(Op::AssignDelay.encode(idx));
        } else {
            let delay_off = self.compile_expr(delay);
            let cond_idx = self.push_cond(CondEntry {
                kind: CondKind::Expr,
                val: 0,
                xz: 0,
                expr_offset: delay_off,
                branch_target: 0,
                sensitivity_first: 0,
                sensitivity_count: 0,
            });
            self.emit_main(Op::WaitTime.encode(cond_idx));
            self.lower_stmt(body);
        }
    }

    fn lower_system_task(&mut self, name: Ident, args: &[Expr], span: Span) {
        let name_text = self.interner.resolve(name).to_string();
        if let Some(kind) = service_kind_from_name(&name_text) {
            let mut flags = 0u32;
            if name_text == "$finish" {
                flags |= SERVICE_FLAG_FINISH;
            }
            if name_text == "$stop" {
                flags |= SERVICE_FLAG_STOP;
            }
            if name_text.starts_with("$monitor") {
                flags |= SERVICE_FLAG_MONITOR;
            }
            let first_arg = self.layout.service_args.len() as u32;
            for arg in args {
                let service_arg = match arg {
                    Expr::StringLiteral { span: str_span } => {
                        self.diagnostics.push(errors::warn_unsupported_statement(
                            "a string literal argument's text (the VM builder does not yet thread the source text through)",
                            *str_span,
                        ));
                        ServiceArg {
                            kind: ServiceArgKind::StringLiteral,
                            payload: self.intern_string_placeholder(),
                        }
                    }
                    _ => {
                        let off = self.compile_expr(arg);
                        ServiceArg {
                            kind: ServiceArgKind::Expr,
                            payload: off,
                        }
                    }
                };
                self.layout.service_args.push(service_arg);
            }
            let idx = self.layout.services.len() as u32;
            self.layout.services.push(ServiceEntry {
                kind,
                flags,
                first_arg,
                arg_count: args.len() as u32,
            });
            self.emit_main(Op::ServiceCall.encode(idx));
            if name_text == "$finish" {
                self.emit_main(Op::HaltSim.encode(0));
            }
        } else {
            self.diagnostics.push(errors::warn_unknown_system_task(&name_text, span));
            self.emit_main(Op::Noop.encode(0));
        }
    }

    fn intern_string_placeholder(&mut self) -> u32 {
        let offset = self.layout.string_pool.len() as u32;
        self.layout.string_pool.push(0);
        offset
    }
}

fn single_assign(stmt: &Statement) -> Option<(&Expr, &Expr, bool)> {
    match stmt {
        Statement::Blocking { target, value, .. } => Some((target, value, false)),
        Statement::NonBlocking { target, value, .. } => Some((target, value, true)),
        Statement::Block { stmts, .. } if stmts.len() == 1 => single_assign(&stmts[0]),
        _ => None,
    }
}

fn vm_case_kind(kind: AstCaseKind) -> CaseKind {
    match kind {
        AstCaseKind::Case => CaseKind::Case,
        AstCaseKind::Casex => CaseKind::CaseX,
        AstCaseKind::Casez => CaseKind::CaseZ,
    }
}

/// Builds the `(want, care)` limb pair for one case-item pattern, folding in
/// the don't-care rules `casex`/`casez` apply to X/Z pattern bits.
fn want_care_for(kind: AstCaseKind, pattern: &FourState, width: u32) -> (Vec<u64>, Vec<u64>) {
    let extended = if pattern.width() < width {
        pattern.zero_extend(width)
    } else {
        pattern.clone()
    };
    let want = extended.val_limbs().to_vec();
    let mut care = vec![u64::MAX; want.len()];
    if kind != AstCaseKind::Case {
        for i in 0..width {
            let is_x = (extended.x_limbs().get((i / 64) as usize).copied().unwrap_or(0) >> (i % 64)) & 1 == 1;
            let is_z = (extended.z_limbs().get((i / 64) as usize).copied().unwrap_or(0) >> (i % 64)) & 1 == 1;
            let dont_care = match kind {
                AstCaseKind::Casex => is_x || is_z,
                AstCaseKind::Casez => is_z,
                AstCaseKind::Case => false,
            };
            if dont_care {
                care[(i / 64) as usize] &= !(1u64 << (i % 64));
            }
        }
    }
    (want, care)
}

fn service_kind_from_name(name: &str) -> Option<u32> {
    Some(match name {
        "$display" | "$displayb" | "$displayh" | "$displayo" => service_kind::DISPLAY,
        "$monitor" | "$monitorb" | "$monitorh" | "$monitoro" | "$monitoron" | "$monitoroff" => service_kind::MONITOR,
        "$finish" => service_kind::FINISH,
        "$dumpfile" => service_kind::DUMPFILE,
        "$dumpvars" => service_kind::DUMPVARS,
        "$readmemh" => service_kind::READMEMH,
        "$readmemb" => service_kind::READMEMB,
        "$stop" => service_kind::STOP,
        "$strobe" | "$strobeb" | "$strobeh" | "$strobeo" => service_kind::STROBE,
        "$dumpoff" => service_kind::DUMPOFF,
        "$dumpon" => service_kind::DUMPON,
        "$dumpflush" => service_kind::DUMPFLUSH,
        "$dumpall" => service_kind::DUMPALL,
        "$dumplimit" => service_kind::DUMPLIMIT,
        "$fwrite" | "$fwriteb" | "$fwriteh" | "$fwriteo" => service_kind::FWRITE,
        "$fdisplay" | "$fdisplayb" | "$fdisplayh" | "$fdisplayo" => service_kind::FDISPLAY,
        "$fopen" => service_kind::FOPEN,
        "$fclose" => service_kind::FCLOSE,
        "$fgetc" => service_kind::FGETC,
        "$fgets" => service_kind::FGETS,
        "$feof" => service_kind::FEOF,
        "$fscanf" => service_kind::FSCANF,
        "$sscanf" => service_kind::SSCANF,
        "$ftell" => service_kind::FTELL,
        "$rewind" => service_kind::REWIND,
        "$writememh" => service_kind::WRITEMEMH,
        "$writememb" => service_kind::WRITEMEMB,
        "$fseek" => service_kind::FSEEK,
        "$fflush" => service_kind::FFLUSH,
        "$ferror" => service_kind::FERROR,
        "$fungetc" => service_kind::FUNGETC,
        "$fread" => service_kind::FREAD,
        "$write" | "$writeb" | "$writeh" | "$writeo" => service_kind::WRITE,
        "$sformat" | "$swrite" => service_kind::SFORMAT,
        "$timeformat" => service_kind::TIMEFORMAT,
        "$printtimescale" => service_kind::PRINTTIMESCALE,
        "$test$plusargs" => service_kind::TESTPLUSARGS,
        "$value$plusargs" => service_kind::VALUEPLUSARGS,
        _ => return None,
    })
}
