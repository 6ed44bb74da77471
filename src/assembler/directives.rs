//! Second-pass directive interpreter.
//!
//! Directives must precede the instructions; the first token that is
//! neither a directive nor empty hands control to the instruction encoder
//! on the same line. The address counter is NOT reset on entry: it still
//! points past the last instruction word counted in the first pass, which
//! is where `.DATA` bytes belong in the shared code/data RAM.

use crate::assembler::image::{bitcopy, Image, MAX_FREQUENCY, MIN_FREQUENCY};
use crate::assembler::operand::{number, value};
use crate::assembler::source::Cursor;
use crate::assembler::{Error, ErrorKind};

pub fn run(cursor: &mut Cursor, image: &mut Image) -> Result<(), Error> {
    cursor.first_line()?;
    while cursor.has_line() {
        let token = cursor.token().to_string();
        if token.eq_ignore_ascii_case(".TITLE") {
            // <directive> ::= ".TITLE" <quoted_string>
            if !image.title.is_empty() {
                return Err(cursor.error(ErrorKind::DuplicateTitle));
            }
            cursor.next_token()?;
            let quoted = cursor.token();
            if !quoted.starts_with('"') {
                return Err(cursor.error(ErrorKind::UnquotedTitle));
            }
            image.title = quoted[1..quoted.len() - 1].to_string();
        } else if token.eq_ignore_ascii_case(".FREQUENCY") {
            // <directive> ::= ".FREQUENCY" <number>
            // <number> is an exception here, it's not restricted to 1 byte
            let frequency = cursor.next_token()?.parse::<i64>().unwrap_or(0);
            if !(i64::from(MIN_FREQUENCY)..=i64::from(MAX_FREQUENCY)).contains(&frequency) {
                return Err(cursor.error(ErrorKind::Frequency));
            }
            image.frequency = frequency as u32;
        } else if token.eq_ignore_ascii_case(".SIMDIP") {
            // <directive> ::= ".SIMDIP" <value>
            cursor.next_token()?;
            let dip = value(cursor.token(), &image.labels)
                .map_err(|kind| cursor.error(kind))?
                .ok_or_else(|| cursor.error(ErrorKind::Value))?;
            bitcopy(&mut image.simdip, dip, 7, 0);
        } else if token.eq_ignore_ascii_case(".LABEL") || token.eq_ignore_ascii_case(".NAME") {
            // collected in the first pass; the lookup performs the
            // duplicate check
            let name = cursor.next_token()?.to_string();
            image.labels.find(&name).map_err(|kind| cursor.error(kind))?;
            cursor.next_token()?; // the number was validated already
        } else if token.eq_ignore_ascii_case(".DATA") {
            // <directive> ::= ".DATA" <label> <array>
            data(cursor, image)?;
        } else if token.starts_with('.') {
            return Err(cursor.error(ErrorKind::Directive));
        } else if !token.is_empty() {
            // a non-empty token which is no directive ends this pass
            break;
        }
        if !cursor.next_token()?.is_empty() {
            return Err(cursor.error(ErrorKind::Extraneous));
        }
        cursor.next_line()?;
    }
    Ok(())
}

/// `.DATA` patches its label to the current address and lays the array
/// elements out byte by byte: numbers directly, quoted strings one ASCII
/// character per cell.
fn data(cursor: &mut Cursor, image: &mut Image) -> Result<(), Error> {
    let name = cursor.next_token()?.to_string();
    let index = image
        .labels
        .find(&name)
        .map_err(|kind| cursor.error(kind))?
        .ok_or_else(|| cursor.error(ErrorKind::Label))?;
    image.labels.set_value(index, image.addr as u8);

    // <array> ::= <array_element> (<,> <array_element>)*
    loop {
        cursor.next_token()?;
        let element = cursor.token().to_string();
        if element.starts_with('"') {
            // <quoted_string> ::= "\"" <char+> "\""
            if element.len() < 3 {
                return Err(cursor.error(ErrorKind::EmptyString));
            }
            for byte in element[1..element.len() - 1].bytes() {
                bitcopy(image.cell(), byte, 7, 0);
                *image.comment_cell() = format!("'{}' ({})", byte as char, byte);
                image.next_addr().map_err(|kind| cursor.error(kind))?;
            }
        } else {
            let n = match number(&element) {
                Ok(n) => n,
                Err(_) => return Err(cursor.error(ErrorKind::ArrayElement)),
            };
            bitcopy(image.cell(), n, 7, 0);
            *image.comment_cell() = element.clone();
            image.next_addr().map_err(|kind| cursor.error(kind))?;
        }
        if cursor.next_token()? != "," {
            break;
        }
    }
    if !cursor.token().is_empty() {
        return Err(cursor.error(ErrorKind::Comma));
    }
    Ok(())
}
