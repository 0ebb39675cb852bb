//! Decodes a lexed `IntLiteral`/`SizedLiteral` token's source text into a
//! folded [`FourState`] value (the Number literal rules).
//!
//! The lexer has already fused `<size>'<s>?<base><digits>` into one token
//! (see `lexer.rs`), so this module only deals with well-formed literal text:
//! splitting out the optional size, the optional `s` sign prefix, the base
//! letter, and the digit run, then packing the digits into a [`FourState`].

use vgk_fourstate::{FourBit, FourState};

use crate::ast::NumberBase;

/// An unsized plain decimal integer's default width, per IEEE-1364 §3.5.1.
const UNSIZED_DECIMAL_WIDTH: u32 = 32;

/// The decoded shape of a literal: its value, the radix it was written in,
/// and whether it carries an explicit `'s` sign prefix (or is an unsized
/// plain decimal, which Verilog also treats as signed).
pub struct DecodedLiteral {
    pub value: FourState,
    pub base: NumberBase,
    pub signed: bool,
}

/// Parses a literal token's raw source text (e.g. `"8'hFF"`, `"'b10x1"`,
/// `"42"`) into a [`DecodedLiteral`].
///
/// Returns `Err` with a human-readable message on malformed text (digit not
/// valid for its base, zero-width size, etc). The lexer only ever accepts
/// characters that are individually valid for *some* base, so the errors
/// caught here are narrow: a size of `0`, or text that the lexer's own
/// lookahead let through inconsistently.
pub fn decode_literal(text: &str) -> Result<DecodedLiteral, String> {
    match text.find('\'') {
        None => decode_plain_decimal(text),
        Some(tick) => decode_based(&text[..tick], &text[tick + 1..]),
    }
}

fn decode_plain_decimal(text: &str) -> Result<DecodedLiteral, String> {
    let digits: String = text.chars().filter(|c| *c != '_').collect();
    let magnitude: u128 = digits
        .parse()
        .map_err(|_| format!("invalid decimal literal `{text}`"))?;
    let value = FourState::from_u64(magnitude as u64, UNSIZED_DECIMAL_WIDTH);
    Ok(DecodedLiteral {
        value,
        base: NumberBase::Decimal,
        signed: true,
    })
}

fn decode_based(size_text: &str, rest: &str) -> Result<DecodedLiteral, String> {
    let mut chars = rest.chars();
    let mut signed = false;
    let mut base_ch = chars.next().ok_or("based literal missing base letter")?;
    if base_ch == 's' || base_ch == 'S' {
        signed = true;
        base_ch = chars.next().ok_or("based literal missing base letter after 's'")?;
    }
    let digits_text: String = chars.collect();
    let digits: String = digits_text.chars().filter(|c| *c != '_').collect();

    let base = match base_ch.to_ascii_lowercase() {
        'b' => NumberBase::Binary,
        'o' => NumberBase::Octal,
        'd' => NumberBase::Decimal,
        'h' => NumberBase::Hex,
        other => return Err(format!("unknown literal base `{other}`")),
    };

    let explicit_width = if size_text.is_empty() {
        None
    } else {
        let size_digits: String = size_text.chars().filter(|c| *c != '_').collect();
        let width: u32 = size_digits
            .parse()
            .map_err(|_| format!("invalid literal size `{size_text}`"))?;
        if width == 0 {
            return Err("literal size must be nonzero".to_string());
        }
        Some(width)
    };

    let value = match base {
        NumberBase::Decimal => decode_decimal_digits(&digits, explicit_width)?,
        NumberBase::Binary => decode_radix_digits(&digits, 1, explicit_width)?,
        NumberBase::Octal => decode_radix_digits(&digits, 3, explicit_width)?,
        NumberBase::Hex => decode_radix_digits(&digits, 4, explicit_width)?,
    };

    Ok(DecodedLiteral { value, base, signed })
}

/// A based-decimal literal is either a run of `0`-`9` digits forming a plain
/// magnitude, or a single `x`/`z`/`?` standing for the whole field (IEEE-1364
/// §3.5.2: decimal numbers don't carry per-digit x/z).
fn decode_decimal_digits(digits: &str, explicit_width: Option<u32>) -> Result<FourState, String> {
    if digits.is_empty() {
        return Err("decimal literal has no digits".to_string());
    }
    let lowered = digits.to_ascii_lowercase();
    let width = explicit_width.unwrap_or(UNSIZED_DECIMAL_WIDTH);
    if lowered == "x" {
        return Ok(FourState::all_x(width));
    }
    if lowered == "z" || lowered == "?" {
        return Ok(FourState::all_z(width));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid decimal digits `{digits}`"));
    }
    let magnitude: u128 = digits
        .parse()
        .map_err(|_| format!("decimal literal `{digits}` out of range"))?;
    Ok(fit_to_width(magnitude, width))
}

/// Packs binary/octal/hex digits into a [`FourState`], `bits_per_digit` bits
/// per character, most-significant digit first. When no explicit size was
/// given, the width is the digit count times `bits_per_digit`.
fn decode_radix_digits(digits: &str, bits_per_digit: u32, explicit_width: Option<u32>) -> Result<FourState, String> {
    if digits.is_empty() {
        return Err("based literal has no digits".to_string());
    }
    let mut bits: Vec<FourBit> = Vec::with_capacity(digits.len() * bits_per_digit as usize);
    for ch in digits.chars() {
        let group = digit_to_bits(ch, bits_per_digit)?;
        bits.extend(group);
    }
    let natural_width = bits.len() as u32;
    let value = FourState::from_bits_msb_first(&bits);
    match explicit_width {
        None => Ok(value),
        Some(width) if width == natural_width => Ok(value),
        Some(width) if width > natural_width => {
            let sign_bit_unknown = matches!(bits.first(), Some(FourBit::X) | Some(FourBit::Z));
            if sign_bit_unknown {
                Ok(value.sign_extend(width))
            } else {
                Ok(value.zero_extend(width))
            }
        }
        Some(width) => Ok(value.part_select(width as i64 - 1, 0)),
    }
}

fn digit_to_bits(ch: char, bits_per_digit: u32) -> Result<Vec<FourBit>, String> {
    let lowered = ch.to_ascii_lowercase();
    if lowered == 'x' {
        return Ok(vec![FourBit::X; bits_per_digit as usize]);
    }
    if lowered == 'z' || lowered == '?' {
        return Ok(vec![FourBit::Z; bits_per_digit as usize]);
    }
    let digit_value = lowered
        .to_digit(16)
        .ok_or_else(|| format!("invalid digit `{ch}`"))?;
    let mut bits = Vec::with_capacity(bits_per_digit as usize);
    for i in (0..bits_per_digit).rev() {
        bits.push(if digit_value & (1 << i) != 0 { FourBit::One } else { FourBit::Zero });
    }
    Ok(bits)
}

fn fit_to_width(magnitude: u128, width: u32) -> FourState {
    if width <= 64 {
        FourState::from_u64(magnitude as u64, width)
    } else {
        // u128 covers every magnitude a decimal literal can realistically
        // spell out in source text; wider declared widths just zero-extend.
        FourState::from_u64(magnitude as u64, 64).zero_extend(width)
    }
}
