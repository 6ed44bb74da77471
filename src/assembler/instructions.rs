//! Instruction shape classifiers and the second-pass encoder.
//!
//! The first token of a line selects one of six shape classes, each with
//! its own operand syntax. Classifiers are pure: they hand back the opcode
//! prefix bit-string and the encoder alone writes RAM cells, filling the
//! remaining bits from the operands.

use crate::assembler::image::{bitcopy, Image};
use crate::assembler::operand::{regnum, value};
use crate::assembler::source::Cursor;
use crate::assembler::{Error, ErrorKind};

/// `"HLT" | "NOP" | "RETURN"` - one word, no operands
pub fn instr_noarg(s: &str) -> Option<&'static str> {
    match s.to_ascii_uppercase().as_str() {
        "HLT" => Some("00000000"),
        "NOP" => Some("00000001"),
        "RETURN" => Some("00001111"),
        _ => None,
    }
}

/// `"RSHIFT" | "LSHIFT" | "PUSH" | "POP"` - one word, register in [2:0]
pub fn instr_reg(s: &str) -> Option<&'static str> {
    match s.to_ascii_uppercase().as_str() {
        "RSHIFT" => Some("10100"),
        "LSHIFT" => Some("11000"),
        "PUSH" => Some("11100"),
        "POP" => Some("11110"),
        _ => None,
    }
}

/// Conditional jumps and `CALL` - two words, value byte in the second
pub fn instr_n(s: &str) -> Option<&'static str> {
    match s.to_ascii_uppercase().as_str() {
        "JC" => Some("00000100"),
        "JNC" => Some("00000101"),
        "JZ" => Some("00000110"),
        "JNZ" => Some("00000111"),
        "JS" => Some("00001010"),
        "JNS" => Some("00001011"),
        "JV" => Some("00001100"),
        "JNV" => Some("00001101"),
        "CALL" => Some("00001110"),
        _ => None,
    }
}

/// `"JMP"` - two words, mode bit selects immediate or register operand
pub fn instr_op1(s: &str) -> Option<&'static str> {
    match s.to_ascii_uppercase().as_str() {
        "JMP" => Some("0000001"), // mode bit appended, so never equal to NOP
        _ => None,
    }
}

/// ALU and memory instructions taking `reg, op2` - two words
pub fn instr_reg_op2(s: &str) -> Option<&'static str> {
    match s.to_ascii_uppercase().as_str() {
        "MOV" => Some("0001"),
        "ADD" => Some("0010"),
        "SUB" => Some("0011"),
        "ROR" => Some("0100"),
        "AND" => Some("0101"),
        "OR" => Some("0110"),
        "XOR" => Some("0111"),
        "STORE" => Some("1000"),
        "LOAD" => Some("1001"),
        "CMP" => Some("1011"),
        _ => None,
    }
}

/// `"BIT"` - two words, register in [2:0] and bit number in the second
pub fn instr_reg_n(s: &str) -> Option<&'static str> {
    match s.to_ascii_uppercase().as_str() {
        "BIT" => Some("11010"),
        _ => None,
    }
}

/// `LOAD`/`STORE` address their op2 through brackets
pub fn load_store(s: &str) -> bool {
    matches!(s.to_ascii_uppercase().as_str(), "LOAD" | "STORE")
}

/// True if `s` is a single-word instruction
pub fn size1(s: &str) -> bool {
    instr_noarg(s).is_some() || instr_reg(s).is_some()
}

/// True if `s` is a two-word instruction
pub fn size2(s: &str) -> bool {
    instr_n(s).is_some()
        || instr_op1(s).is_some()
        || instr_reg_op2(s).is_some()
        || instr_reg_n(s).is_some()
}

/// Second pass over the instruction lines: encodes each instruction into
/// RAM starting back at address 0 and records its mnemonic comment on the
/// last word. Label definition lines are skipped (collected already);
/// label uses resolve through the table.
pub fn run(cursor: &mut Cursor, image: &mut Image) -> Result<(), Error> {
    image.addr = 0;
    while cursor.has_line() {
        let token = cursor.token().to_string();
        if let Some(op) = instr_noarg(&token) {
            // <instruction> ::= <instr_noarg>
            *image.cell() = op.to_string();
            *image.comment_cell() = token.clone();
            image.next_addr().map_err(|kind| cursor.error(kind))?;
        } else if let Some(op) = instr_reg(&token) {
            // <instruction> ::= <instr_reg> <reg>
            *image.cell() = op.to_string();
            let reg = regnum(cursor.next_token()?)
                .ok_or_else(|| cursor.error(ErrorKind::Register))?;
            bitcopy(image.cell(), reg, 2, 0); // <reg> in Instr1[2:0]
            *image.comment_cell() = format!("{} R{}", token, reg);
            image.next_addr().map_err(|kind| cursor.error(kind))?;
        } else if let Some(op) = instr_n(&token) {
            // <instruction> ::= <instr_n> <value>
            *image.cell() = op.to_string();
            cursor.next_token()?;
            let n = value(cursor.token(), &image.labels)
                .map_err(|kind| cursor.error(kind))?
                .ok_or_else(|| cursor.error(ErrorKind::Value))?;
            image.next_addr().map_err(|kind| cursor.error(kind))?;
            bitcopy(image.cell(), n, 7, 0); // <value> in Instr2
            *image.comment_cell() = format!("{} {}", token, n);
            image.next_addr().map_err(|kind| cursor.error(kind))?;
        } else if let Some(op) = instr_op1(&token) {
            // <instruction> ::= <instr_op1> <op>
            *image.cell() = op.to_string();
            cursor.next_token()?;
            let n = value(cursor.token(), &image.labels).map_err(|kind| cursor.error(kind))?;
            let reg = regnum(cursor.token());
            if let Some(n) = n {
                image.cell().push('0'); // immediate mode
                image.next_addr().map_err(|kind| cursor.error(kind))?;
                bitcopy(image.cell(), n, 7, 0);
                *image.comment_cell() = format!("{} {}", token, n);
            } else if let Some(reg) = reg {
                image.cell().push('1'); // register mode
                image.next_addr().map_err(|kind| cursor.error(kind))?;
                bitcopy(image.cell(), reg, 7, 0); // zero-padded register index
                *image.comment_cell() = format!("{} R{}", token, reg);
            } else {
                return Err(cursor.error(ErrorKind::Op));
            }
            image.next_addr().map_err(|kind| cursor.error(kind))?;
        } else if let Some(op) = instr_reg_op2(&token) {
            // <instruction> ::= <instr_reg_op2> <reg> <,> <op2>
            let bracketed = load_store(&token);
            *image.cell() = op.to_string();
            let reg = regnum(cursor.next_token()?)
                .ok_or_else(|| cursor.error(ErrorKind::Register))?;
            if cursor.next_token()? != "," {
                return Err(cursor.error(ErrorKind::Comma));
            }
            let mut text = format!("{} R{}, ", token, reg);
            cursor.next_token()?;
            if bracketed {
                if cursor.token() != "[" {
                    return Err(cursor.error(ErrorKind::LeftBracket));
                }
                text.push('[');
                cursor.next_token()?;
            }
            let n = value(cursor.token(), &image.labels).map_err(|kind| cursor.error(kind))?;
            let reg2 = regnum(cursor.token());
            if let Some(n) = n {
                // op2 = <value>
                bitcopy(image.cell(), reg, 3, 0); // <reg> in Instr1[3:0]
                image.next_addr().map_err(|kind| cursor.error(kind))?;
                bitcopy(image.cell(), n, 7, 0); // <value> in Instr2
                if n < 128 || bracketed {
                    *image.comment_cell() = format!("{}{}", text, n);
                } else {
                    // signed equivalent for non-address immediates
                    *image.comment_cell() = format!("{}{} (-{})", text, n, 256 - u16::from(n));
                }
            } else if let Some(reg2) = reg2 {
                // op2 = <reg>
                image.cell().push_str("1000"); // register-mode marker
                image.next_addr().map_err(|kind| cursor.error(kind))?;
                bitcopy(image.cell(), reg, 7, 4); // <reg> in Instr2[7:4]
                bitcopy(image.cell(), reg2, 3, 0); // op2 <reg> in Instr2[3:0]
                *image.comment_cell() = format!("{}R{}", text, reg2);
            } else {
                return Err(cursor.error(ErrorKind::Op));
            }
            if bracketed {
                if cursor.next_token()? != "]" {
                    return Err(cursor.error(ErrorKind::RightBracket));
                }
                image.comment_cell().push(']');
            }
            image.next_addr().map_err(|kind| cursor.error(kind))?;
        } else if let Some(op) = instr_reg_n(&token) {
            // <instruction> ::= <instr_reg_n> <reg> <,> <value>
            *image.cell() = op.to_string();
            let reg = regnum(cursor.next_token()?)
                .ok_or_else(|| cursor.error(ErrorKind::Register))?;
            if cursor.next_token()? != "," {
                return Err(cursor.error(ErrorKind::Comma));
            }
            cursor.next_token()?;
            let n = value(cursor.token(), &image.labels)
                .map_err(|kind| cursor.error(kind))?
                .ok_or_else(|| cursor.error(ErrorKind::Value))?;
            bitcopy(image.cell(), reg, 2, 0);
            image.next_addr().map_err(|kind| cursor.error(kind))?;
            bitcopy(image.cell(), n, 7, 0);
            if n < 128 {
                *image.comment_cell() = format!("{} R{}, {}", token, reg, n);
            } else {
                *image.comment_cell() = format!("{} R{}, {} (-{})", token, reg, n, 256 - u16::from(n));
            }
            image.next_addr().map_err(|kind| cursor.error(kind))?;
        } else if image
            .labels
            .find(&token)
            .map_err(|kind| cursor.error(kind))?
            .is_some()
        {
            // label syntax was checked during symbol collection; skip the
            // colon and stay on the line for a trailing instruction
            cursor.next_token()?;
            cursor.next_token()?;
            continue;
        } else if !token.is_empty() {
            return Err(cursor.error(ErrorKind::InstructionLabel));
        }
        if !cursor.next_token()?.is_empty() {
            return Err(cursor.error(ErrorKind::Extraneous));
        }
        cursor.next_line()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifiers_are_case_insensitive() {
        assert_eq!(instr_noarg("hlt"), Some("00000000"));
        assert_eq!(instr_reg("Push"), Some("11100"));
        assert_eq!(instr_n("call"), Some("00001110"));
        assert_eq!(instr_op1("jmp"), Some("0000001"));
        assert_eq!(instr_reg_op2("Store"), Some("1000"));
        assert_eq!(instr_reg_n("bit"), Some("11010"));
    }

    #[test]
    fn test_classes_are_disjoint() {
        for s in ["HLT", "NOP", "RETURN", "RSHIFT", "LSHIFT", "PUSH", "POP"] {
            assert!(size1(s) && !size2(s), "{s}");
        }
        for s in [
            "JMP", "JC", "JNC", "JZ", "JNZ", "JS", "JNS", "JV", "JNV", "CALL", "MOV", "ADD",
            "SUB", "ROR", "AND", "OR", "XOR", "STORE", "LOAD", "CMP", "BIT",
        ] {
            assert!(size2(s) && !size1(s), "{s}");
        }
        assert!(!size1("MOVE") && !size2("MOVE"));
    }

    #[test]
    fn test_only_load_and_store_take_brackets() {
        assert!(load_store("LOAD"));
        assert!(load_store("store"));
        assert!(!load_store("MOV"));
    }
}
