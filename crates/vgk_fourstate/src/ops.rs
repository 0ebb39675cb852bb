//! Per-operator four-state semantics.
//!
//! Every function here is a pure `(FourState, FourState) -> FourState` (or
//! unary equivalent) and is the single source of truth shared by host-side
//! constant folding and any device-side mirror: the formulas must match
//! exactly, so no operator is implemented twice.

use crate::limb;
use crate::value::FourState;

/// Bitwise NOT: `val <- !val`, unknown mask passes through unchanged (Z
/// collapses into X — the output never reports Z).
pub fn bitnot(a: &FourState) -> FourState {
    let w = a.width();
    let val = limb::not(a.val_limbs(), w);
    let unknown = a.unknown_limbs();
    FourState::from_limbs(val, unknown, vec![0; limb::limb_count(w)], w)
}

/// Bitwise AND, bit-granular: a known-0 on either input forces known-0 on
/// the output even when the other input is unknown.
pub fn bitand(a: &FourState, b: &FourState) -> FourState {
    assert_eq!(a.width(), b.width());
    bitwise_known(a, b, |av, bv, aunk, bunk| {
        if (!aunk && !av) || (!bunk && !bv) {
            (false, false) // known 0
        } else if !aunk && !bunk {
            (av && bv, false) // both known, neither forces 0
        } else {
            (false, true) // unknown
        }
    })
}

/// Bitwise OR: a known-1 on either input forces known-1.
pub fn bitor(a: &FourState, b: &FourState) -> FourState {
    assert_eq!(a.width(), b.width());
    bitwise_known(a, b, |av, bv, aunk, bunk| {
        if (!aunk && av) || (!bunk && bv) {
            (true, false)
        } else if !aunk && !bunk {
            (av || bv, false)
        } else {
            (false, true)
        }
    })
}

/// Bitwise XOR: any unknown input bit makes that output bit unknown.
pub fn bitxor(a: &FourState, b: &FourState) -> FourState {
    assert_eq!(a.width(), b.width());
    bitwise_known(a, b, |av, bv, aunk, bunk| {
        if aunk || bunk {
            (false, true)
        } else {
            (av ^ bv, false)
        }
    })
}

/// Bitwise XNOR (`~^`/`^~`): the complement of [`bitxor`].
pub fn bitxnor(a: &FourState, b: &FourState) -> FourState {
    bitnot(&bitxor(a, b))
}

fn bitwise_known(
    a: &FourState,
    b: &FourState,
    f: impl Fn(bool, bool, bool, bool) -> (bool, bool),
) -> FourState {
    let w = a.width();
    let mut val = vec![0u64; limb::limb_count(w)];
    let mut unk = vec![0u64; limb::limb_count(w)];
    for i in 0..w {
        let av = limb::bit(a.val_limbs(), i);
        let aunk = limb::bit(a.x_limbs(), i) || limb::bit(a.z_limbs(), i);
        let bv = limb::bit(b.val_limbs(), i);
        let bunk = limb::bit(b.x_limbs(), i) || limb::bit(b.z_limbs(), i);
        let (v, u) = f(av, bv, aunk, bunk);
        limb::set_bit(&mut val, i, v);
        limb::set_bit(&mut unk, i, u);
    }
    FourState::from_limbs(val, unk, vec![0; limb::limb_count(w)], w)
}

/// Any arithmetic binary op (`+ - * / % **`): if any input bit is unknown,
/// the entire result is all-X; otherwise the result is computed modulo 2^width.
fn arith(a: &FourState, b: &FourState, width: u32, f: impl Fn(&[u64], &[u64], u32) -> Vec<u64>) -> FourState {
    if a.has_any_unknown() || b.has_any_unknown() {
        return FourState::all_x(width);
    }
    let av = a.zero_extend(width);
    let bv = b.zero_extend(width);
    let val = f(av.val_limbs(), bv.val_limbs(), width);
    FourState::from_limbs(val, vec![0; limb::limb_count(width)], vec![0; limb::limb_count(width)], width)
}

pub fn add(a: &FourState, b: &FourState, width: u32) -> FourState {
    arith(a, b, width, |x, y, w| limb::add(x, y, w))
}

pub fn sub(a: &FourState, b: &FourState, width: u32) -> FourState {
    arith(a, b, width, |x, y, w| limb::sub(x, y, w))
}

pub fn mul(a: &FourState, b: &FourState, width: u32) -> FourState {
    arith(a, b, width, |x, y, w| limb::mul(x, y, w))
}

/// Division: unknown operand or divide-by-zero both yield all-X.
/// Signed division negates the dividend/divisor magnitudes as needed and
/// re-negates the quotient.
pub fn div(a: &FourState, b: &FourState, width: u32, signed: bool) -> FourState {
    if a.has_any_unknown() || b.has_any_unknown() {
        return FourState::all_x(width);
    }
    let av = a.zero_extend(width);
    let bv = b.zero_extend(width);
    if limb::is_zero(bv.val_limbs()) {
        return FourState::all_x(width);
    }
    if !signed {
        let (q, _) = limb::divmod(av.val_limbs(), bv.val_limbs(), width);
        return FourState::from_limbs(q, vec![0; limb::limb_count(width)], vec![0; limb::limb_count(width)], width);
    }
    let a_neg = limb::bit(av.val_limbs(), width - 1);
    let b_neg = limb::bit(bv.val_limbs(), width - 1);
    let a_mag = if a_neg { limb::neg(av.val_limbs(), width) } else { av.val_limbs().to_vec() };
    let b_mag = if b_neg { limb::neg(bv.val_limbs(), width) } else { bv.val_limbs().to_vec() };
    let (mut q, _) = limb::divmod(&a_mag, &b_mag, width);
    if a_neg != b_neg {
        q = limb::neg(&q, width);
    }
    FourState::from_limbs(q, vec![0; limb::limb_count(width)], vec![0; limb::limb_count(width)], width)
}

/// Modulo: same unknown/zero-divisor rule as [`div`]. The remainder takes the
/// sign of the dividend, matching IEEE-1364 `%`.
pub fn rem(a: &FourState, b: &FourState, width: u32, signed: bool) -> FourState {
    if a.has_any_unknown() || b.has_any_unknown() {
        return FourState::all_x(width);
    }
    let av = a.zero_extend(width);
    let bv = b.zero_extend(width);
    if limb::is_zero(bv.val_limbs()) {
        return FourState::all_x(width);
    }
    if !signed {
        let (_, r) = limb::divmod(av.val_limbs(), bv.val_limbs(), width);
        return FourState::from_limbs(r, vec![0; limb::limb_count(width)], vec![0; limb::limb_count(width)], width);
    }
    let a_neg = limb::bit(av.val_limbs(), width - 1);
    let b_neg = limb::bit(bv.val_limbs(), width - 1);
    let a_mag = if a_neg { limb::neg(av.val_limbs(), width) } else { av.val_limbs().to_vec() };
    let b_mag = if b_neg { limb::neg(bv.val_limbs(), width) } else { bv.val_limbs().to_vec() };
    let (_, mut r) = limb::divmod(&a_mag, &b_mag, width);
    if a_neg {
        r = limb::neg(&r, width);
    }
    FourState::from_limbs(r, vec![0; limb::limb_count(width)], vec![0; limb::limb_count(width)], width)
}

/// Power (`**`). A negative signed exponent yields 0.
pub fn pow(a: &FourState, b: &FourState, width: u32, signed: bool) -> FourState {
    if a.has_any_unknown() || b.has_any_unknown() {
        return FourState::all_x(width);
    }
    if signed {
        if let Some(exp) = b.zero_extend(width).to_i64() {
            if exp < 0 {
                return FourState::from_u64(0, width);
            }
        }
    }
    let exp = b.zero_extend(width).to_u64().unwrap_or(0);
    let base = a.zero_extend(width);
    let mut acc = FourState::from_u64(1, width);
    let mut remaining = exp;
    let mut cur = base;
    while remaining > 0 {
        if remaining & 1 == 1 {
            acc = mul(&acc, &cur, width);
        }
        cur = mul(&cur, &cur, width);
        remaining >>= 1;
    }
    acc
}

/// Logical shift-left. Unknown in the shift amount or an out-of-range amount
/// both yield an all-X (resp. zero) result; the X mask shifts with the value.
pub fn shl(a: &FourState, amount: &FourState, width: u32) -> FourState {
    if amount.has_any_unknown() {
        return FourState::all_x(width);
    }
    let amt = amount.to_u64().unwrap_or(u64::MAX);
    if amt >= width as u64 {
        return FourState::from_u64(0, width);
    }
    let amt = amt as u32;
    let av = a.zero_extend(width);
    FourState::from_limbs(
        limb::shl(av.val_limbs(), amt, width),
        limb::shl(av.unknown_limbs().as_slice(), amt, width),
        vec![0; limb::limb_count(width)],
        width,
    )
}

/// Logical shift-right.
pub fn shr(a: &FourState, amount: &FourState, width: u32) -> FourState {
    if amount.has_any_unknown() {
        return FourState::all_x(width);
    }
    let amt = amount.to_u64().unwrap_or(u64::MAX);
    if amt >= width as u64 {
        return FourState::from_u64(0, width);
    }
    let amt = amt as u32;
    let av = a.zero_extend(width);
    FourState::from_limbs(
        limb::shr(av.val_limbs(), amt, width),
        limb::shr(av.unknown_limbs().as_slice(), amt, width),
        vec![0; limb::limb_count(width)],
        width,
    )
}

/// Arithmetic (signed) shift-right. An unknown sign bit taints the whole result.
pub fn ashr(a: &FourState, amount: &FourState, width: u32) -> FourState {
    if amount.has_any_unknown() {
        return FourState::all_x(width);
    }
    let av = a.zero_extend(width);
    if av.get_bit(width - 1).is_none() {
        return FourState::all_x(width);
    }
    let amt = amount.to_u64().unwrap_or(u64::MAX).min(width as u64) as u32;
    FourState::from_limbs(
        limb::ashr(av.val_limbs(), amt, width),
        limb::ashr(av.unknown_limbs().as_slice(), amt, width),
        vec![0; limb::limb_count(width)],
        width,
    )
}

/// Logical equality `==`: any unknown bit anywhere makes the result X.
pub fn eq(a: &FourState, b: &FourState) -> FourState {
    assert_eq!(a.width(), b.width());
    if a.has_any_unknown() || b.has_any_unknown() {
        return FourState::unknown_bit();
    }
    FourState::from_bool(a.val_limbs() == b.val_limbs())
}

/// Logical inequality `!=`.
pub fn neq(a: &FourState, b: &FourState) -> FourState {
    let e = eq(a, b);
    if e.is_fully_known() {
        FourState::from_bool(e.to_u64() == Some(0))
    } else {
        e
    }
}

/// Case equality `===`: exact bit-for-bit comparison of the full `(val, x, z)`
/// triple. Never unknown; `X === X` and `Z === Z` are both 1.
pub fn case_eq(a: &FourState, b: &FourState) -> FourState {
    assert_eq!(a.width(), b.width());
    let same = a.val_limbs() == b.val_limbs() && a.x_limbs() == b.x_limbs() && a.z_limbs() == b.z_limbs();
    FourState::from_bool(same)
}

/// Case inequality `!==`.
pub fn case_neq(a: &FourState, b: &FourState) -> FourState {
    let e = case_eq(a, b);
    FourState::from_bool(e.to_u64() == Some(0))
}

/// Wildcard equality `==?`: unknown bits in `pattern` are don't-care. Any
/// remaining unknown bit in `value` (at a position pattern doesn't excuse)
/// makes the result X.
pub fn wildcard_eq(value: &FourState, pattern: &FourState) -> FourState {
    assert_eq!(value.width(), pattern.width());
    let w = value.width();
    let mut saw_unresolved_unknown = false;
    for i in 0..w {
        let pattern_dont_care = limb::bit(pattern.x_limbs(), i) || limb::bit(pattern.z_limbs(), i);
        if pattern_dont_care {
            continue;
        }
        let value_unknown = limb::bit(value.x_limbs(), i) || limb::bit(value.z_limbs(), i);
        if value_unknown {
            saw_unresolved_unknown = true;
            continue;
        }
        let pv = limb::bit(pattern.val_limbs(), i);
        let vv = limb::bit(value.val_limbs(), i);
        if pv != vv {
            return FourState::from_bool(false);
        }
    }
    if saw_unresolved_unknown {
        FourState::unknown_bit()
    } else {
        FourState::from_bool(true)
    }
}

/// Wildcard inequality `!=?`.
pub fn wildcard_neq(value: &FourState, pattern: &FourState) -> FourState {
    let e = wildcard_eq(value, pattern);
    if e.is_fully_known() {
        FourState::from_bool(e.to_u64() == Some(0))
    } else {
        e
    }
}

/// Signed/unsigned relational compare. Any unknown bit -> X.
fn relational(a: &FourState, b: &FourState, signed: bool, f: impl Fn(std::cmp::Ordering) -> bool) -> FourState {
    assert_eq!(a.width(), b.width());
    if a.has_any_unknown() || b.has_any_unknown() {
        return FourState::unknown_bit();
    }
    let ord = if signed {
        let ai = a.to_i64();
        let bi = b.to_i64();
        match (ai, bi) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => compare_wide_signed(a, b),
        }
    } else {
        limb::compare_unsigned(a.val_limbs(), b.val_limbs())
    };
    FourState::from_bool(f(ord))
}

/// Signed comparison for widths beyond a host `i64` (sign bit plus unsigned
/// magnitude compare on the remainder, inverted when both operands are negative).
fn compare_wide_signed(a: &FourState, b: &FourState) -> std::cmp::Ordering {
    let w = a.width();
    let a_neg = a.get_bit(w - 1) == Some(true);
    let b_neg = b.get_bit(w - 1) == Some(true);
    match (a_neg, b_neg) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        (false, false) => limb::compare_unsigned(a.val_limbs(), b.val_limbs()),
        (true, true) => limb::compare_unsigned(a.val_limbs(), b.val_limbs()).reverse(),
    }
}

pub fn lt(a: &FourState, b: &FourState, signed: bool) -> FourState {
    relational(a, b, signed, |o| o == std::cmp::Ordering::Less)
}

pub fn le(a: &FourState, b: &FourState, signed: bool) -> FourState {
    relational(a, b, signed, |o| o != std::cmp::Ordering::Greater)
}

pub fn gt(a: &FourState, b: &FourState, signed: bool) -> FourState {
    relational(a, b, signed, |o| o == std::cmp::Ordering::Greater)
}

pub fn ge(a: &FourState, b: &FourState, signed: bool) -> FourState {
    relational(a, b, signed, |o| o != std::cmp::Ordering::Less)
}

/// Reduction AND: 0 if any bit is known-0, 1 if all bits are known-1, X otherwise.
pub fn red_and(a: &FourState) -> FourState {
    let mut any_known_zero = false;
    let mut any_unknown = false;
    for i in 0..a.width() {
        match a.get_bit(i) {
            Some(false) => any_known_zero = true,
            None => any_unknown = true,
            Some(true) => {}
        }
    }
    if any_known_zero {
        FourState::from_bool(false)
    } else if any_unknown {
        FourState::unknown_bit()
    } else {
        FourState::from_bool(true)
    }
}

/// Reduction OR: dual of [`red_and`].
pub fn red_or(a: &FourState) -> FourState {
    let mut any_known_one = false;
    let mut any_unknown = false;
    for i in 0..a.width() {
        match a.get_bit(i) {
            Some(true) => any_known_one = true,
            None => any_unknown = true,
            Some(false) => {}
        }
    }
    if any_known_one {
        FourState::from_bool(true)
    } else if any_unknown {
        FourState::unknown_bit()
    } else {
        FourState::from_bool(false)
    }
}

/// Reduction XOR: X if any bit is unknown, else the parity of known bits.
pub fn red_xor(a: &FourState) -> FourState {
    if a.has_any_unknown() {
        return FourState::unknown_bit();
    }
    let mut parity = false;
    for i in 0..a.width() {
        if a.get_bit(i) == Some(true) {
            parity = !parity;
        }
    }
    FourState::from_bool(parity)
}

pub fn red_nand(a: &FourState) -> FourState {
    bitnot_scalar(&red_and(a))
}

pub fn red_nor(a: &FourState) -> FourState {
    bitnot_scalar(&red_or(a))
}

pub fn red_xnor(a: &FourState) -> FourState {
    bitnot_scalar(&red_xor(a))
}

fn bitnot_scalar(a: &FourState) -> FourState {
    match a.get_bit(0) {
        Some(v) => FourState::from_bool(!v),
        None => FourState::unknown_bit(),
    }
}

/// Tri-state predicate: `Some(true)`/`Some(false)` if the value is known-nonzero
/// or known-zero under reduction-OR, `None` if genuinely ambiguous (some bits
/// unknown and none of the known bits are 1).
fn tri_truth(a: &FourState) -> Option<bool> {
    red_or(a).get_bit(0)
}

/// Logical NOT (`!`), tri-state.
pub fn log_not(a: &FourState) -> FourState {
    match tri_truth(a) {
        Some(v) => FourState::from_bool(!v),
        None => FourState::unknown_bit(),
    }
}

/// Logical AND (`&&`): known-false on either side short-circuits to false.
pub fn log_and(a: &FourState, b: &FourState) -> FourState {
    let ta = tri_truth(a);
    let tb = tri_truth(b);
    if ta == Some(false) || tb == Some(false) {
        FourState::from_bool(false)
    } else if ta == Some(true) && tb == Some(true) {
        FourState::from_bool(true)
    } else {
        FourState::unknown_bit()
    }
}

/// Logical OR (`||`): known-true on either side short-circuits to true.
pub fn log_or(a: &FourState, b: &FourState) -> FourState {
    let ta = tri_truth(a);
    let tb = tri_truth(b);
    if ta == Some(true) || tb == Some(true) {
        FourState::from_bool(true)
    } else if ta == Some(false) && tb == Some(false) {
        FourState::from_bool(false)
    } else {
        FourState::unknown_bit()
    }
}

/// Ternary merge: if `cond` is unknown, bits where both branches agree and
/// are known pass through; all other bits become X.
pub fn ternary(cond: &FourState, then_val: &FourState, else_val: &FourState) -> FourState {
    assert_eq!(then_val.width(), else_val.width());
    match tri_truth(cond) {
        Some(true) => then_val.clone(),
        Some(false) => else_val.clone(),
        None => {
            let w = then_val.width();
            let mut val = vec![0u64; limb::limb_count(w)];
            let mut unk = vec![0u64; limb::limb_count(w)];
            for i in 0..w {
                match (then_val.get_bit(i), else_val.get_bit(i)) {
                    (Some(t), Some(e)) if t == e => limb::set_bit(&mut val, i, t),
                    _ => limb::set_bit(&mut unk, i, true),
                }
            }
            FourState::from_limbs(val, unk, vec![0; limb::limb_count(w)], w)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs(bits: &str) -> FourState {
        // MSB-first string of 0/1/x/z
        let width = bits.len() as u32;
        let mut val = vec![0u64];
        let mut x = vec![0u64];
        let mut z = vec![0u64];
        for (i, c) in bits.chars().rev().enumerate() {
            match c {
                '0' => {}
                '1' => limb::set_bit(&mut val, i as u32, true),
                'x' => limb::set_bit(&mut x, i as u32, true),
                'z' => limb::set_bit(&mut z, i as u32, true),
                _ => panic!("bad digit"),
            }
        }
        FourState::from_limbs(val, x, z, width)
    }

    #[test]
    fn four_state_and_with_unknown_bits() {
        // 4'b10x1 & 4'b11x0 -> val=0b1000, x=0b0100
        let a = fs("10x1");
        let b = fs("11x0");
        let r = bitand(&a, &b);
        assert_eq!(r.val_limbs()[0], 0b1000);
        assert_eq!(r.x_limbs()[0], 0b0100);
    }

    #[test]
    fn case_equality_on_z_is_one_logical_is_x() {
        let a = fs("zzzz");
        let b = fs("zzzz");
        assert_eq!(case_eq(&a, &b).to_u64(), Some(1));
        assert!(!eq(&a, &b).is_fully_known());
    }

    #[test]
    fn div_by_zero_is_all_x() {
        let a = FourState::from_u64(10, 8);
        let z = FourState::from_u64(0, 8);
        assert!(div(&a, &z, 8, false).has_any_unknown());
        assert!(rem(&a, &z, 8, false).has_any_unknown());
    }

    #[test]
    fn pow_negative_signed_exponent_is_zero() {
        let base = FourState::from_u64(2, 8);
        let exp = FourState::from_u64(0xFF, 8); // -1 signed
        let r = pow(&base, &exp, 8, true);
        assert_eq!(r.to_u64(), Some(0));
    }

    #[test]
    fn shift_ge_width_is_zero() {
        let a = FourState::from_u64(0xFF, 8);
        let amt = FourState::from_u64(8, 8);
        assert_eq!(shl(&a, &amt, 8).to_u64(), Some(0));
        assert_eq!(shr(&a, &amt, 8).to_u64(), Some(0));
    }

    #[test]
    fn reduction_and_or_xor() {
        let a = fs("10x1");
        assert_eq!(red_and(&a).get_bit(0), Some(false));
        assert_eq!(red_or(&a).get_bit(0), Some(true));
        let b = fs("1001");
        assert_eq!(red_xor(&b).get_bit(0), Some(false));
    }

    #[test]
    fn ternary_unknown_condition_merges_branches() {
        let cond = FourState::unknown_bit();
        let t = FourState::from_u64(0b101, 3);
        let e = FourState::from_u64(0b100, 3);
        let r = ternary(&cond, &t, &e);
        assert_eq!(r.get_bit(2), Some(true));
        assert_eq!(r.get_bit(0), None);
    }

    #[test]
    fn wildcard_equality_dont_cares() {
        let value = fs("1011");
        let pattern = fs("10x1");
        assert_eq!(wildcard_eq(&value, &pattern).to_u64(), Some(1));
    }
}
