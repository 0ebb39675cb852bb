//! Constant-expression folding over the parsed AST.
//!
//! Parameters and localparams must initialize from a constant expression.
//! This module evaluates such expressions against an incremental
//! `name -> value` environment, scoped per module: a later parameter may
//! reference an earlier one declared in the same module, but not one
//! declared after it (the environment simply won't contain it yet).
//!
//! Folding reuses [`vgk_fourstate::ops`] exclusively — the same per-operator
//! formulas the runtime VM's expression sub-VM evaluates, so a constant
//! folded here and the same expression evaluated at simulation time never
//! disagree.

use std::collections::HashMap;

use vgk_common::{Ident, Interner};
use vgk_fourstate::{ops, FourState};

use crate::ast::{BinaryOp, Expr, UnaryOp};

/// A folded constant: the value plus whether it was declared/derived signed
/// (Verilog's self-determined signedness rules need this to pick sign- vs.
/// zero-extension when two operands of different widths combine).
#[derive(Debug, Clone)]
pub struct ConstValue {
    pub value: FourState,
    pub signed: bool,
}

impl ConstValue {
    fn unsigned(value: FourState) -> Self {
        ConstValue { value, signed: false }
    }
}

/// The per-module (or per-scope) constant environment: parameter/localparam
/// names already folded, available to expressions folded afterward.
#[derive(Debug, Default, Clone)]
pub struct ConstEnv {
    values: HashMap<Ident, ConstValue>,
}

impl ConstEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: Ident, value: ConstValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: Ident) -> Option<&ConstValue> {
        self.values.get(&name)
    }
}

/// Folds `expr` to a constant value against `env`, resolving identifiers via
/// `env` and system-function names (`$clog2` and friends) via `interner`.
///
/// Returns `Err` with a human-readable message when the expression isn't a
/// constant expression: an unresolved identifier, a hierarchical reference,
/// a real/string literal, or an unsupported function call.
pub fn fold_expr(expr: &Expr, env: &ConstEnv, interner: &Interner) -> Result<ConstValue, String> {
    match expr {
        Expr::Literal { value, signed, .. } => Ok(ConstValue {
            value: value.clone(),
            signed: *signed,
        }),
        Expr::Identifier { name, .. } => env
            .get(*name)
            .cloned()
            .ok_or_else(|| "reference to an unresolved or non-constant identifier".to_string()),
        Expr::HierarchicalName { .. } => Err("hierarchical names are not constant expressions".to_string()),
        Expr::RealLiteral { .. } => Err("real literals are not supported in constant folding".to_string()),
        Expr::StringLiteral { .. } => Err("string literals are not constant-foldable".to_string()),
        Expr::Paren { inner, .. } => fold_expr(inner, env, interner),
        Expr::Unary { op, operand, .. } => fold_unary(*op, operand, env, interner),
        Expr::Binary { left, op, right, .. } => fold_binary(left, *op, right, env, interner),
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
            ..
        } => {
            let cond = fold_expr(condition, env, interner)?;
            let then_v = fold_expr(then_expr, env, interner)?;
            let else_v = fold_expr(else_expr, env, interner)?;
            let width = then_v.value.width().max(else_v.value.width());
            let signed = then_v.signed && else_v.signed;
            let then_ext = extend(&then_v.value, width, then_v.signed);
            let else_ext = extend(&else_v.value, width, else_v.signed);
            Ok(ConstValue {
                value: ops::ternary(&cond.value, &then_ext, &else_ext),
                signed,
            })
        }
        Expr::Concat { elements, .. } => {
            let parts = elements
                .iter()
                .map(|e| fold_expr(e, env, interner).map(|v| v.value))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ConstValue::unsigned(FourState::concat(&parts)))
        }
        Expr::Repeat { count, elements, .. } => {
            let count_v = fold_expr(count, env, interner)?;
            let count = count_v
                .value
                .to_u64()
                .ok_or("replication count must be a known constant")?;
            let parts = elements
                .iter()
                .map(|e| fold_expr(e, env, interner).map(|v| v.value))
                .collect::<Result<Vec<_>, _>>()?;
            let unit = FourState::concat(&parts);
            Ok(ConstValue::unsigned(FourState::replicate(count as u32, &unit)))
        }
        Expr::Index { base, index, .. } => {
            let base_v = fold_expr(base, env, interner)?;
            let index_v = fold_expr(index, env, interner)?;
            let idx = index_v.value.to_u64().ok_or("bit-select index must be a known constant")?;
            Ok(ConstValue::unsigned(base_v.value.bit_select(idx as u32)))
        }
        Expr::RangeSelect { base, msb, lsb, .. } => {
            let base_v = fold_expr(base, env, interner)?;
            let msb_v = fold_expr(msb, env, interner)?
                .value
                .to_i64()
                .ok_or("part-select MSB must be a known constant")?;
            let lsb_v = fold_expr(lsb, env, interner)?
                .value
                .to_i64()
                .ok_or("part-select LSB must be a known constant")?;
            Ok(ConstValue::unsigned(base_v.value.part_select(msb_v, lsb_v)))
        }
        Expr::PartSelect {
            base,
            index,
            ascending,
            width,
            ..
        } => {
            let base_v = fold_expr(base, env, interner)?;
            let index_v = fold_expr(index, env, interner)?
                .value
                .to_i64()
                .ok_or("indexed part-select base must be a known constant")?;
            let width_v = fold_expr(width, env, interner)?
                .value
                .to_u64()
                .ok_or("indexed part-select width must be a known constant")?;
            let width_v = width_v as i64;
            let (msb, lsb) = if *ascending {
                (index_v + width_v - 1, index_v)
            } else {
                (index_v, index_v - width_v + 1)
            };
            Ok(ConstValue::unsigned(base_v.value.part_select(msb, lsb)))
        }
        Expr::SystemCall { name, args, .. } => fold_system_call(interner.resolve(*name), args, env, interner),
        Expr::FuncCall { .. } => Err("user-defined function calls are not constant-foldable".to_string()),
        Expr::Error(_) => Err("expression failed to parse".to_string()),
    }
}

fn extend(value: &FourState, width: u32, signed: bool) -> FourState {
    if width <= value.width() {
        return value.clone();
    }
    if signed {
        value.sign_extend(width)
    } else {
        value.zero_extend(width)
    }
}

fn fold_unary(op: UnaryOp, operand: &Expr, env: &ConstEnv, interner: &Interner) -> Result<ConstValue, String> {
    let v = fold_expr(operand, env, interner)?;
    let value = match op {
        UnaryOp::Plus => v.value.clone(),
        UnaryOp::Minus => {
            let width = v.value.width();
            ops::sub(&FourState::from_u64(0, width), &v.value, width)
        }
        UnaryOp::LogNot => ops::log_not(&v.value),
        UnaryOp::BitNot => ops::bitnot(&v.value),
        UnaryOp::RedAnd => ops::red_and(&v.value),
        UnaryOp::RedNand => ops::red_nand(&v.value),
        UnaryOp::RedOr => ops::red_or(&v.value),
        UnaryOp::RedNor => ops::red_nor(&v.value),
        UnaryOp::RedXor => ops::red_xor(&v.value),
        UnaryOp::RedXnor => ops::red_xnor(&v.value),
    };
    let signed = matches!(op, UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot) && v.signed;
    Ok(ConstValue { value, signed })
}

fn fold_binary(left: &Expr, op: BinaryOp, right: &Expr, env: &ConstEnv, interner: &Interner) -> Result<ConstValue, String> {
    let l = fold_expr(left, env, interner)?;
    let r = fold_expr(right, env, interner)?;

    // Logical ops reduce each operand independently; no common-width extension.
    if matches!(op, BinaryOp::LogAnd | BinaryOp::LogOr) {
        let value = match op {
            BinaryOp::LogAnd => ops::log_and(&l.value, &r.value),
            BinaryOp::LogOr => ops::log_or(&l.value, &r.value),
            _ => unreachable!(),
        };
        return Ok(ConstValue::unsigned(value));
    }

    // Wildcard equality widens each operand by its own signedness rather
    // than the `both_signed` AND-rule below: an unsigned operand is
    // zero-extended even when compared against a signed one.
    if matches!(op, BinaryOp::WildEq | BinaryOp::WildNeq) {
        let width = l.value.width().max(r.value.width());
        let lv = extend(&l.value, width, l.signed);
        let rv = extend(&r.value, width, r.signed);
        let value = match op {
            BinaryOp::WildEq => ops::wildcard_eq(&lv, &rv),
            BinaryOp::WildNeq => ops::wildcard_neq(&lv, &rv),
            _ => unreachable!(),
        };
        return Ok(ConstValue::unsigned(value));
    }

    let both_signed = l.signed && r.signed;
    let width = l.value.width().max(r.value.width());
    let lv = extend(&l.value, width, both_signed);
    let rv = extend(&r.value, width, both_signed);

    let (value, signed) = match op {
        BinaryOp::Add => (ops::add(&lv, &rv, width), both_signed),
        BinaryOp::Sub => (ops::sub(&lv, &rv, width), both_signed),
        BinaryOp::Mul => (ops::mul(&lv, &rv, width), both_signed),
        BinaryOp::Div => (ops::div(&lv, &rv, width, both_signed), both_signed),
        BinaryOp::Mod => (ops::rem(&lv, &rv, width, both_signed), both_signed),
        BinaryOp::Pow => (ops::pow(&lv, &rv, width, both_signed), both_signed),
        BinaryOp::Eq => (ops::eq(&lv, &rv), false),
        BinaryOp::Neq => (ops::neq(&lv, &rv), false),
        BinaryOp::CaseEq => (ops::case_eq(&lv, &rv), false),
        BinaryOp::CaseNeq => (ops::case_neq(&lv, &rv), false),
        BinaryOp::Lt => (ops::lt(&lv, &rv, both_signed), false),
        BinaryOp::Le => (ops::le(&lv, &rv, both_signed), false),
        BinaryOp::Gt => (ops::gt(&lv, &rv, both_signed), false),
        BinaryOp::Ge => (ops::ge(&lv, &rv, both_signed), false),
        BinaryOp::BitAnd => (ops::bitand(&lv, &rv), both_signed),
        BinaryOp::BitOr => (ops::bitor(&lv, &rv), both_signed),
        BinaryOp::BitXor => (ops::bitxor(&lv, &rv), both_signed),
        BinaryOp::BitXnor => (ops::bitxnor(&lv, &rv), both_signed),
        // Shift amount is self-determined (its own width); result keeps the
        // left operand's width/signedness, not the common-width extension.
        BinaryOp::Shl | BinaryOp::AShl => (ops::shl(&l.value, &r.value, l.value.width()), l.signed),
        BinaryOp::Shr => (ops::shr(&l.value, &r.value, l.value.width()), l.signed),
        BinaryOp::AShr => {
            let v = if l.signed {
                ops::ashr(&l.value, &r.value, l.value.width())
            } else {
                ops::shr(&l.value, &r.value, l.value.width())
            };
            (v, l.signed)
        }
        BinaryOp::LogAnd | BinaryOp::LogOr | BinaryOp::WildEq | BinaryOp::WildNeq => unreachable!(),
    };
    Ok(ConstValue { value, signed })
}

/// Resolves one of the constant system functions Verilog parameter
/// expressions commonly use.
fn fold_system_call(name_text: &str, args: &[Expr], env: &ConstEnv, interner: &Interner) -> Result<ConstValue, String> {
    let values = args
        .iter()
        .map(|a| fold_expr(a, env, interner))
        .collect::<Result<Vec<_>, _>>()?;
    match name_text {
        "$clog2" => {
            let v = values.first().ok_or("$clog2 expects one argument")?;
            let n = v.value.to_u64().ok_or("$clog2 argument must be a known constant")?;
            Ok(ConstValue::unsigned(FourState::from_u64(clog2(n) as u64, 32)))
        }
        "$signed" => {
            let v = values.first().ok_or("$signed expects one argument")?;
            Ok(ConstValue {
                value: v.value.clone(),
                signed: true,
            })
        }
        "$unsigned" => {
            let v = values.first().ok_or("$unsigned expects one argument")?;
            Ok(ConstValue::unsigned(v.value.clone()))
        }
        "$bits" => {
            let v = values.first().ok_or("$bits expects one argument")?;
            Ok(ConstValue::unsigned(FourState::from_u64(v.value.width() as u64, 32)))
        }
        other => Err(format!("`{other}` is not a constant system function")),
    }
}

fn clog2(n: u64) -> u32 {
    if n <= 1 {
        return 0;
    }
    64 - (n - 1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgk_source::Span;

    fn dummy_span() -> Span {
        Span::new(vgk_source::FileId::from_raw(0), 0, 1)
    }

    fn lit(value: u64, width: u32) -> Expr {
        Expr::literal_from_u64(value, width, dummy_span())
    }

    #[test]
    fn folds_literal() {
        let env = ConstEnv::new();
        let interner = Interner::new();
        let v = fold_expr(&lit(5, 8), &env, &interner).unwrap();
        assert_eq!(v.value.to_u64(), Some(5));
    }

    #[test]
    fn folds_identifier_reference() {
        let interner = Interner::new();
        let name = interner.get_or_intern("WIDTH");
        let mut env = ConstEnv::new();
        env.insert(name, ConstValue::unsigned(FourState::from_u64(8, 32)));
        let expr = Expr::Identifier { name, span: dummy_span() };
        let v = fold_expr(&expr, &env, &interner).unwrap();
        assert_eq!(v.value.to_u64(), Some(8));
    }

    #[test]
    fn folds_binary_add_with_width_promotion() {
        let env = ConstEnv::new();
        let interner = Interner::new();
        let expr = Expr::Binary {
            left: Box::new(lit(1, 4)),
            op: BinaryOp::Add,
            right: Box::new(lit(1, 8)),
            span: dummy_span(),
        };
        let v = fold_expr(&expr, &env, &interner).unwrap();
        assert_eq!(v.value.width(), 8);
        assert_eq!(v.value.to_u64(), Some(2));
    }

    #[test]
    fn unresolved_identifier_is_an_error() {
        let interner = Interner::new();
        let name = interner.get_or_intern("UNKNOWN");
        let env = ConstEnv::new();
        let expr = Expr::Identifier { name, span: dummy_span() };
        assert!(fold_expr(&expr, &env, &interner).is_err());
    }

    #[test]
    fn clog2_resolves_through_system_call() {
        let interner = Interner::new();
        let name = interner.get_or_intern("$clog2");
        let env = ConstEnv::new();
        let expr = Expr::SystemCall {
            name,
            args: vec![lit(256, 32)],
            span: dummy_span(),
        };
        let v = fold_expr(&expr, &env, &interner).unwrap();
        assert_eq!(v.value.to_u64(), Some(8));
    }

    #[test]
    fn clog2_rounds_up() {
        assert_eq!(clog2(1), 0);
        assert_eq!(clog2(2), 1);
        assert_eq!(clog2(3), 2);
        assert_eq!(clog2(256), 8);
        assert_eq!(clog2(257), 9);
    }

    #[test]
    fn wildcard_eq_treats_pattern_x_as_dont_care() {
        use vgk_fourstate::FourBit;
        let env = ConstEnv::new();
        let interner = Interner::new();
        let pattern = FourState::from_bits_msb_first(&[FourBit::One, FourBit::X, FourBit::Zero, FourBit::One]);
        let expr = Expr::Binary {
            left: Box::new(lit(0b1001, 4)),
            op: BinaryOp::WildEq,
            right: Box::new(Expr::Literal {
                value: pattern,
                base: crate::ast::NumberBase::Binary,
                signed: false,
                span: dummy_span(),
            }),
            span: dummy_span(),
        };
        let v = fold_expr(&expr, &env, &interner).unwrap();
        assert_eq!(v.value.to_u64(), Some(1));
    }

    #[test]
    fn wildcard_neq_widens_each_operand_by_its_own_signedness() {
        let interner = Interner::new();
        let mut env = ConstEnv::new();
        let unsigned_name = interner.get_or_intern("U");
        let signed_name = interner.get_or_intern("S");
        // 8-bit unsigned zero, only here to force the common width to 8.
        env.insert(unsigned_name, ConstValue::unsigned(FourState::from_u64(0, 8)));
        // -1 as a 4-bit signed value; widening to 8 bits must sign-extend
        // it to 0xFF, not zero-extend it to 0x0F the way the shared
        // `both_signed` rule would (one operand here is unsigned, so
        // `both_signed` is false).
        env.insert(
            signed_name,
            ConstValue {
                value: FourState::from_u64(0b1111, 4),
                signed: true,
            },
        );
        let expr = Expr::Binary {
            left: Box::new(Expr::Identifier {
                name: unsigned_name,
                span: dummy_span(),
            }),
            op: BinaryOp::WildNeq,
            right: Box::new(Expr::Identifier {
                name: signed_name,
                span: dummy_span(),
            }),
            span: dummy_span(),
        };
        // 0x00 != 0xFF: the signed operand was sign-extended to 0xFF, not
        // zero-extended to 0x0F.
        let v = fold_expr(&expr, &env, &interner).unwrap();
        assert_eq!(v.value.to_u64(), Some(1));
    }
}
