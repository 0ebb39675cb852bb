//! Lowers [`vgk_verilog::ast::Expr`] into the expression sub-VM's bytecode
//! a tiny stack machine, independent of the main scheduler
//! bytecode, whose only job is producing one four-state value per
//! evaluation.
//!
//! One shared word stream and one shared constant pool serve every
//! expression in the flattened module; each compiled expression is a
//! self-contained run of words ending in [`ExprOp::Done`], addressed by the
//! offset of its first word.

use std::collections::HashMap;

use vgk_common::{Ident, Interner};
use vgk_diagnostics::Diagnostic;
use vgk_fourstate::FourState;
use vgk_source::Span;
use vgk_verilog::ast::{BinaryOp, Expr, UnaryOp};
use vgk_verilog::constfold::{self, ConstEnv};

use crate::errors;
use crate::layout::ConstEntry;
use crate::opcodes::{ExprBinaryOp, ExprCallOp, ExprOp, ExprUnaryOp, EXPR_STACK_MAX};

/// Per-module tables the expression builder reads from and appends to.
pub struct ExprBuilder<'a> {
    pub interner: &'a Interner,
    /// Flat net name -> signal-table index, shared with the main builder.
    pub signal_index: &'a HashMap<Ident, u32>,
    /// Flat net name -> declared bit width, for `$bits` and defensive checks.
    pub signal_width: &'a HashMap<Ident, u32>,
    pub words: &'a mut Vec<u32>,
    pub consts: &'a mut Vec<ConstEntry>,
    pub val_words: &'a mut Vec<u64>,
    pub xz_words: &'a mut Vec<u64>,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    depth: usize,
}

impl<'a> ExprBuilder<'a> {
    pub fn new(
        interner: &'a Interner,
        signal_index: &'a HashMap<Ident, u32>,
        signal_width: &'a HashMap<Ident, u32>,
        words: &'a mut Vec<u32>,
        consts: &'a mut Vec<ConstEntry>,
        val_words: &'a mut Vec<u64>,
        xz_words: &'a mut Vec<u64>,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            interner,
            signal_index,
            signal_width,
            words,
            consts,
            val_words,
            xz_words,
            diagnostics,
            depth: 0,
        }
    }

    /// Compiles one self-contained expression, returning the word offset its
    /// evaluation starts at. Never fails outright: an expression the builder
    /// can't lower becomes an all-X placeholder of width 1, with a
    /// diagnostic recorded explaining why (the fallback-path rule).
    pub fn compile(&mut self, expr: &Expr) -> u32 {
        self.depth = 0;
        let start = self.words.len() as u32;
        if !self.emit(expr) {
            // `emit` already recorded a diagnostic; truncate back to `start`
            // and emit a single well-formed placeholder instead.
            self.words.truncate(start as usize);
            self.depth = 0;
            self.push_const(&FourState::all_x(1));
        }
        self.words.push(ExprOp::Done.encode(0));
        start
    }

    fn push(&mut self) -> bool {
        self.depth += 1;
        self.depth <= EXPR_STACK_MAX
    }

    fn pop_n_push_one(&mut self, n: usize) {
        self.depth -= n;
        self.depth += 1;
    }

    fn push_const(&mut self, value: &FourState) {
        let idx = self.intern_const(value);
        self.words.push(ExprOp::PushConst.encode(idx));
        self.push();
    }

    fn push_imm(&mut self, value: u32) {
        self.words.push(ExprOp::PushImm.encode(value));
        self.push();
    }

    fn intern_const(&mut self, value: &FourState) -> u32 {
        let val = value.val_limbs().to_vec();
        let xz = value.unknown_limbs();
        let val_offset = self.val_words.len() as u32;
        self.val_words.extend_from_slice(&val);
        let xz_offset = self.xz_words.len() as u32;
        self.xz_words.extend_from_slice(&xz);
        let idx = self.consts.len() as u32;
        self.consts.push(ConstEntry {
            val_offset,
            xz_offset,
            width: value.width(),
            limb_count: val.len() as u32,
        });
        idx
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

    /// Emits `expr`'s bytecode, leaving exactly one value on the stack.
    /// Returns `false` (with a diagnostic already recorded) if it couldn't.
    fn emit(&mut self, expr: &Expr) -> bool {
        match expr {
            Expr::Literal { value, .. } => {
                self.push_const(value);
                true
            }
            Expr::Identifier { name, span } => match self.signal_index.get(name) {
                Some(&idx) => {
                    self.words.push(ExprOp::PushSignal.encode(idx));
                    self.push()
                }
                None => {
                    self.diagnostics
                        .push(errors::warn_undeclared_signal(self.interner.resolve(*name), *span));
                    false
                }
            },
            Expr::Paren { inner, .. } => self.emit(inner),
            Expr::HierarchicalName { span, .. } => {
                self.diagnostics
                    .push(errors::warn_unsupported_statement("a hierarchical reference", *span));
                false
            }
            Expr::RealLiteral { span } | Expr::StringLiteral { span } => {
                self.diagnostics
                    .push(errors::warn_unsupported_statement("a real or string literal in value position", *span));
                false
            }
            Expr::Unary { op, operand, .. } => {
                if !self.emit(operand) {
                    return false;
                }
                self.words.push(ExprOp::Unary.encode(unary_op_code(*op)));
                true
            }
            Expr::Binary { left, op, right, span } => self.emit_binary(left, *op, right, *span),
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => {
                if !self.emit(condition) || !self.emit(then_expr) || !self.emit(else_expr) {
                    return false;
                }
                self.pop_n_push_one(3);
                self.words.push(ExprOp::Ternary.encode(0));
                true
            }
            Expr::Concat { elements, span } => self.emit_concat(elements, *span),
            Expr::Repeat { count, elements, span } => self.emit_replicate(count, elements, *span),
            Expr::Index { base, index, span } => self.emit_index_select(base, index, *span),
            Expr::RangeSelect { base, msb, lsb, span } => self.emit_range_select(base, msb, lsb, *span),
            Expr::PartSelect {
                base,
                index,
                ascending,
                width,
                span,
            } => self.emit_part_select(base, index, *ascending, width, *span),
            Expr::SystemCall { name, args, span } => self.emit_system_call(*name, args, *span),
            Expr::FuncCall { span, .. } => {
                self.diagnostics
                    .push(errors::warn_unsupported_statement("a user-defined function call", *span));
                false
            }
            Expr::Error(span) => {
                self.diagnostics
                    .push(errors::warn_unsupported_statement("a malformed expression", *span));
                false
            }
        }
    }

    fn emit_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr, _span: Span) -> bool {
        if !self.emit(left) {
            return false;
        }
        if !self.emit(right) {
            return false;
        }
        self.pop_n_push_one(2);
        self.words.push(ExprOp::Binary.encode(binary_op_code(op)));
        true
    }

    fn emit_concat(&mut self, elements: &[Expr], span: Span) -> bool {
        if elements.is_empty() {
            self.diagnostics.push(errors::warn_unsupported_statement("an empty concatenation", span));
            return false;
        }
        for e in elements {
            if !self.emit(e) {
                return false;
            }
        }
        self.pop_n_push_one(elements.len());
        if self.depth > EXPR_STACK_MAX {
            self.diagnostics.push(errors::error_expr_stack_overflow(span));
            return false;
        }
        self.words.push(ExprOp::Concat.encode(elements.len() as u32));
        true
    }

    fn emit_replicate(&mut self, count: &Expr, elements: &[Expr], span: Span) -> bool {
        let Some(count_v) = self.const_fold(count).and_then(|v| v.to_u64()) else {
            self.diagnostics.push(errors::error_not_constant("a replication count", span));
            return false;
        };
        let total = count_v as usize * elements.len();
        if total == 0 || total > EXPR_STACK_MAX {
            self.diagnostics.push(errors::error_expr_stack_overflow(span));
            return false;
        }
        for _ in 0..count_v {
            for e in elements {
                if !self.emit(e) {
                    return false;
                }
            }
        }
        self.pop_n_push_one(total);
        self.words.push(ExprOp::Concat.encode(total as u32));
        true
    }

    fn emit_index_select(&mut self, base: &Expr, index: &Expr, span: Span) -> bool {
        if !self.emit(base) {
            return false;
        }
        if !self.emit(index) {
            return false;
        }
        if !self.push() {
            self.diagnostics.push(errors::error_expr_stack_overflow(span));
            return false;
        }
        self.push_imm(1);
        self.pop_n_push_one(3);
        self.words.push(ExprOp::Index.encode(2));
        true
    }

    fn emit_range_select(&mut self, base: &Expr, msb: &Expr, lsb: &Expr, span: Span) -> bool {
        let (Some(msb_v), Some(lsb_v)) = (
            self.const_fold(msb).and_then(|v| v.to_u64()),
            self.const_fold(lsb).and_then(|v| v.to_u64()),
        ) else {
            self.diagnostics.push(errors::error_not_constant("a part-select bound", span));
            return false;
        };
        if !self.emit(base) {
            return false;
        }
        self.push_imm(msb_v as u32);
        self.push_imm(lsb_v as u32);
        self.pop_n_push_one(3);
        self.words.push(ExprOp::Select.encode(0));
        true
    }

    fn emit_part_select(&mut self, base: &Expr, index: &Expr, ascending: bool, width: &Expr, span: Span) -> bool {
        let Some(width_v) = self.const_fold(width).and_then(|v| v.to_u64()) else {
            self.diagnostics.push(errors::error_not_constant("an indexed part-select width", span));
            return false;
        };
        if !self.emit(base) {
            return false;
        }
        if !self.emit(index) {
            return false;
        }
        self.push_imm(width_v as u32);
        self.pop_n_push_one(3);
        let mode = if ascending { 0 } else { 1 };
        self.words.push(ExprOp::Index.encode(mode));
        true
    }

    fn emit_system_call(&mut self, name: Ident, args: &[Expr], span: Span) -> bool {
        let name_text = self.interner.resolve(name).to_string();
        match name_text.as_str() {
            "$time" | "$stime" | "$realtime" => {
                let op = match name_text.as_str() {
                    "$time" => ExprCallOp::Time,
                    "$stime" => ExprCallOp::Stime,
                    _ => ExprCallOp::Realtime,
                };
                if !self.push() {
                    self.diagnostics.push(errors::error_expr_stack_overflow(span));
                    return false;
                }
                self.words.push(ExprOp::Call.encode(op as u32));
                true
            }
            "$bits" => {
                let Some(arg) = args.first() else {
                    self.diagnostics.push(errors::error_not_constant("$bits' argument", span));
                    return false;
                };
                let Some(width) = self.static_width(arg) else {
                    self.diagnostics.push(errors::error_not_constant("$bits' argument width", span));
                    return false;
                };
                self.push_const(&FourState::from_u64(width as u64, 32));
                true
            }
            "$clog2" => {
                let Some(arg) = args.first() else {
                    self.diagnostics.push(errors::error_not_constant("$clog2's argument", span));
                    return false;
                };
                if let Some(v) = self.const_fold(arg) {
                    let n = v.to_u64().unwrap_or(0);
                    let bits = if n <= 1 { 0 } else { 64 - (n - 1).leading_zeros() };
                    self.push_const(&FourState::from_u64(bits as u64, 32));
                    true
                } else {
                    if !self.emit(arg) {
                        return false;
                    }
                    self.words.push(ExprOp::Call.encode(ExprCallOp::Clog2Dynamic as u32));
                    true
                }
            }
            "$signed" | "$unsigned" => {
                let Some(arg) = args.first() else {
                    self.diagnostics.push(errors::error_not_constant("a sign-cast argument", span));
                    return false;
                };
                if !self.emit(arg) {
                    return false;
                }
                let op = if name_text == "$signed" { ExprCallOp::Signed } else { ExprCallOp::Unsigned };
                self.words.push(ExprOp::Call.encode(op as u32));
                true
            }
            "$itor" | "$rtoi" | "$bitstoreal" | "$realtobits" => {
                let Some(arg) = args.first() else {
                    self.diagnostics
                        .push(errors::error_not_constant("a real-conversion argument", span));
                    return false;
                };
                if !self.emit(arg) {
                    return false;
                }
                let op = match name_text.as_str() {
                    "$itor" => ExprCallOp::IToR,
                    "$rtoi" => ExprCallOp::RToI,
                    "$bitstoreal" => ExprCallOp::BitsToReal,
                    _ => ExprCallOp::RealToBits,
                };
                self.words.push(ExprOp::Call.encode(op as u32));
                true
            }
            other => {
                self.diagnostics.push(errors::warn_unknown_system_task(other, span));
                false
            }
        }
    }
}

fn unary_op_code(op: UnaryOp) -> u32 {
    (match op {
        UnaryOp::Plus => ExprUnaryOp::Plus,
        UnaryOp::Minus => ExprUnaryOp::Minus,
        UnaryOp::LogNot => ExprUnaryOp::LogNot,
        UnaryOp::BitNot => ExprUnaryOp::BitNot,
        UnaryOp::RedAnd => ExprUnaryOp::RedAnd,
        UnaryOp::RedNand => ExprUnaryOp::RedNand,
        UnaryOp::RedOr => ExprUnaryOp::RedOr,
        UnaryOp::RedNor => ExprUnaryOp::RedNor,
        UnaryOp::RedXor => ExprUnaryOp::RedXor,
        UnaryOp::RedXnor => ExprUnaryOp::RedXnor,
    }) as u32
}

fn binary_op_code(op: BinaryOp) -> u32 {
    (match op {
        BinaryOp::Add => ExprBinaryOp::Add,
        BinaryOp::Sub => ExprBinaryOp::Sub,
        BinaryOp::Mul => ExprBinaryOp::Mul,
        BinaryOp::Div => ExprBinaryOp::Div,
        BinaryOp::Mod => ExprBinaryOp::Mod,
        BinaryOp::Pow => ExprBinaryOp::Pow,
        BinaryOp::Eq => ExprBinaryOp::Eq,
        BinaryOp::Neq => ExprBinaryOp::Neq,
        BinaryOp::CaseEq => ExprBinaryOp::CaseEq,
        BinaryOp::CaseNeq => ExprBinaryOp::CaseNeq,
        BinaryOp::WildEq => ExprBinaryOp::WildcardEq,
        BinaryOp::WildNeq => ExprBinaryOp::WildcardNeq,
        BinaryOp::Lt => ExprBinaryOp::Lt,
        BinaryOp::Le => ExprBinaryOp::Le,
        BinaryOp::Gt => ExprBinaryOp::Gt,
        BinaryOp::Ge => ExprBinaryOp::Ge,
        BinaryOp::LogAnd => ExprBinaryOp::LogAnd,
        BinaryOp::LogOr => ExprBinaryOp::LogOr,
        BinaryOp::BitAnd => ExprBinaryOp::And,
        BinaryOp::BitOr => ExprBinaryOp::Or,
        BinaryOp::BitXor => ExprBinaryOp::Xor,
        BinaryOp::BitXnor => ExprBinaryOp::Xnor,
        BinaryOp::Shl | BinaryOp::AShl => ExprBinaryOp::Shl,
        BinaryOp::Shr => ExprBinaryOp::Shr,
        BinaryOp::AShr => ExprBinaryOp::Ashr,
    }) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgk_source::FileId;

    fn span() -> Span {
        Span::new(FileId::from_raw(0), 0, 1)
    }

    fn setup() -> (Interner, HashMap<Ident, u32>, HashMap<Ident, u32>) {
        let interner = Interner::new();
        let mut idx = HashMap::new();
        let mut width = HashMap::new();
        let a = interner.get_or_intern("a");
        idx.insert(a, 0);
        width.insert(a, 8);
        (interner, idx, width)
    }

    #[test]
    fn literal_compiles_to_one_pushconst_and_done() {
        let (interner, idx, width) = setup();
        let mut words = Vec::new();
        let mut consts = Vec::new();
        let mut val_words = Vec::new();
        let mut xz_words = Vec::new();
        let mut diags = Vec::new();
        let mut b = ExprBuilder::new(&interner, &idx, &width, &mut words, &mut consts, &mut val_words, &mut xz_words, &mut diags);
        let offset = b.compile(&Expr::literal_from_u64(5, 8, span()));
        assert_eq!(offset, 0);
        assert_eq!(words.len(), 2);
        assert!(diags.is_empty());
    }

    #[test]
    fn binary_add_emits_two_pushes_and_one_binary() {
        let (interner, idx, width) = setup();
        let a = interner.get_or_intern("a");
        let mut words = Vec::new();
        let mut consts = Vec::new();
        let mut val_words = Vec::new();
        let mut xz_words = Vec::new();
        let mut diags = Vec::new();
        let mut b = ExprBuilder::new(&interner, &idx, &width, &mut words, &mut consts, &mut val_words, &mut xz_words, &mut diags);
        let expr = Expr::Binary {
            left: Box::new(Expr::Identifier { name: a, span: span() }),
            op: BinaryOp::Add,
            right: Box::new(Expr::literal_from_u64(1, 8, span())),
            span: span(),
        };
        b.compile(&expr);
        assert_eq!(words.len(), 4);
        assert!(diags.is_empty());
    }

    #[test]
    fn wildcard_eq_lowers_to_the_wildcard_eq_opcode() {
        let (interner, idx, width) = setup();
        let a = interner.get_or_intern("a");
        let mut words = Vec::new();
        let mut consts = Vec::new();
        let mut val_words = Vec::new();
        let mut xz_words = Vec::new();
        let mut diags = Vec::new();
        let mut b = ExprBuilder::new(&interner, &idx, &width, &mut words, &mut consts, &mut val_words, &mut xz_words, &mut diags);
        let expr = Expr::Binary {
            left: Box::new(Expr::Identifier { name: a, span: span() }),
            op: BinaryOp::WildEq,
            right: Box::new(Expr::literal_from_u64(1, 8, span())),
            span: span(),
        };
        b.compile(&expr);
        let binary_word = words[2];
        assert_eq!(crate::opcodes::decode_arg(binary_word), ExprBinaryOp::WildcardEq as u32);
        assert!(diags.is_empty());
    }

    #[test]
    fn replication_past_stack_limit_falls_back() {
        let (interner, idx, width) = setup();
        let a = interner.get_or_intern("a");
        let mut words = Vec::new();
        let mut consts = Vec::new();
        let mut val_words = Vec::new();
        let mut xz_words = Vec::new();
        let mut diags = Vec::new();
        let mut b = ExprBuilder::new(&interner, &idx, &width, &mut words, &mut consts, &mut val_words, &mut xz_words, &mut diags);
        let expr = Expr::Repeat {
            count: Box::new(Expr::literal_from_u64(40, 32, span())),
            elements: vec![Expr::Identifier { name: a, span: span() }],
            span: span(),
        };
        b.compile(&expr);
        assert!(!diags.is_empty());
    }

    #[test]
    fn undeclared_identifier_falls_back_with_diagnostic() {
        let (interner, idx, width) = setup();
        let missing = interner.get_or_intern("missing");
        let mut words = Vec::new();
        let mut consts = Vec::new();
        let mut val_words = Vec::new();
        let mut xz_words = Vec::new();
        let mut diags = Vec::new();
        let mut b = ExprBuilder::new(&interner, &idx, &width, &mut words, &mut consts, &mut val_words, &mut xz_words, &mut diags);
        b.compile(&Expr::Identifier { name: missing, span: span() });
        assert_eq!(diags.len(), 1);
    }
}
