//! Operand classification: numeric literals, registers, label identifiers
//! and the reserved-word set.

use std::sync::LazyLock;

use regex::Regex;

use crate::assembler::instructions;
use crate::assembler::symbols::LabelTable;
use crate::assembler::ErrorKind;

/// Why a token failed to parse as a numeric literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberError {
    /// `0x` with no, too many, or stray hexadecimal digits
    Hex,
    /// `0b` with no, too many, or stray binary digits
    Bin,
    /// Decimal with a leading zero (octal notation in GNU assembly)
    Octal,
    /// Decimal above 255
    Range,
    /// Negative literal below -128
    SignedRange,
    /// Not a numeric literal at all
    NotANumber,
}

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

/// `<label> ::= <letter> (<letter> | <digit> | "_")*`
///
/// Syntax only; reserved words pass this check and must be rejected
/// separately with [reserved].
pub fn is_label(s: &str) -> bool {
    LABEL_RE.is_match(s)
}

/// Instruction mnemonics and register aliases may never serve as labels
pub fn reserved(s: &str) -> bool {
    instructions::size1(s) || instructions::size2(s) || regnum(s).is_some()
}

/// Maps a register alias to its index. `FLAGS` aliases `R6`, `SP` aliases `R7`.
pub fn regnum(s: &str) -> Option<u8> {
    match s.to_ascii_uppercase().as_str() {
        "R0" => Some(0),
        "R1" => Some(1),
        "R2" => Some(2),
        "R3" => Some(3),
        "R4" => Some(4),
        "R5" => Some(5),
        "R6" | "FLAGS" => Some(6),
        "R7" | "SP" => Some(7),
        _ => None,
    }
}

/// Converts a literal to a byte according to:
/// `<number> ::= "0x" <hex>{1,2} | "0b" <bit>{1,8} | <decimal 0-255>`
///
/// A leading `-` is accepted on every form; the magnitude is limited to 128
/// and the result is the two's complement byte. Decimal literals may not
/// start with a zero.
pub fn number(s: &str) -> Result<u8, NumberError> {
    let (negative, literal) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let prefix = literal.get(..2).map(str::to_ascii_uppercase);
    let magnitude = if let Some("0X") = prefix.as_deref() {
        let digits = &literal[2..];
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(NumberError::Hex);
        }
        u32::from_str_radix(digits, 16).map_err(|_| NumberError::Hex)?
    } else if let Some("0B") = prefix.as_deref() {
        let digits = &literal[2..];
        if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b == b'0' || b == b'1')
        {
            return Err(NumberError::Bin);
        }
        u32::from_str_radix(digits, 2).map_err(|_| NumberError::Bin)?
    } else {
        if literal.is_empty() || !literal.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NumberError::NotANumber);
        }
        if literal.len() > 1 && literal.starts_with('0') {
            return Err(NumberError::Octal);
        }
        let range_error = if negative {
            NumberError::SignedRange
        } else {
            NumberError::Range
        };
        literal.parse::<u32>().map_err(|_| range_error)?
    };

    if negative {
        if magnitude > 128 {
            return Err(NumberError::SignedRange);
        }
        Ok((magnitude as u8).wrapping_neg())
    } else {
        if magnitude > 255 {
            return Err(NumberError::Range);
        }
        Ok(magnitude as u8)
    }
}

/// Resolves a token to a byte: a numeric literal, or the value of a
/// collected label. Lookup may detect a duplicate label definition.
pub fn value(s: &str, labels: &LabelTable) -> Result<Option<u8>, ErrorKind> {
    if let Ok(n) = number(s) {
        return Ok(Some(n));
    }
    Ok(labels.find(s)?.map(|index| labels.value(index)))
}
