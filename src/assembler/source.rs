//! Line storage and tokenization for the assembly input.
//!
//! The input is kept as an ordered list of trimmed lines; a [Cursor] walks
//! the list twice (once per pass), handing out tokens on demand. Tokens are
//! raw character slices of three shapes: a quoted string (with `\"` escaping
//! the inner quote), a single-character delimiter, or a run of characters up
//! to the next delimiter or whitespace.

use crate::assembler::{Error, ErrorKind};

/// Maximum accepted source line length, terminator included
pub const MAX_LINE_LENGTH: usize = 150;

/// End-of-transmit byte; truncates the input when pasted interactively
const EOT: char = '\u{0004}';

const SINGLE_CHAR_DELIMITERS: [char; 5] = ['[', ']', '"', ',', ':'];

/// Splits the raw input into trimmed lines, enforcing the line-length
/// limit and honouring an embedded EOT byte
pub fn read_lines(source: &str) -> Result<Vec<String>, Error> {
    let source = match source.find(EOT) {
        Some(eot) => &source[..eot],
        None => source,
    };

    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        if raw.len() >= MAX_LINE_LENGTH {
            return Err(Error::at_line(ErrorKind::MaxLengthExceeded, index + 1, raw));
        }
        lines.push(trim(raw));
    }
    Ok(lines)
}

/// Deletes everything from the first unquoted `;` onwards, then strips
/// surrounding whitespace. `\"` does not terminate a quoted part.
fn trim(line: &str) -> String {
    let mut quoted = false;
    let mut prev = '\0';
    let mut cut = line.len();
    for (i, c) in line.char_indices() {
        if c == '"' && prev != '\\' {
            quoted = !quoted;
        }
        if !quoted && c == ';' {
            cut = i;
            break;
        }
        prev = c;
    }
    line[..cut].trim().to_string()
}

/// A position within the stored lines, holding the most recently produced
/// token and the one before it (kept for diagnostic context).
///
/// After the cursor has advanced past the last line, `current` is cleared
/// and [Cursor::first_line] is required before any further read.
pub struct Cursor {
    lines: Vec<String>,
    current: Option<usize>,
    line_number: usize,
    pos: usize,
    token: String,
    previous: String,
}

impl Cursor {
    pub fn new(lines: Vec<String>) -> Cursor {
        Cursor {
            lines,
            current: None,
            line_number: 0,
            pos: 0,
            token: String::new(),
            previous: String::new(),
        }
    }

    /// The most recently produced token; empty when the line is exhausted
    pub fn token(&self) -> &str {
        &self.token
    }

    /// True while a line remains to be processed
    pub fn has_line(&self) -> bool {
        self.current.is_some()
    }

    /// Resets the cursor to the first line and primes its first token
    pub fn first_line(&mut self) -> Result<(), Error> {
        self.line_number = 0;
        self.current = None;
        self.pos = 0;
        self.token.clear();
        self.previous.clear();
        self.next_line()?;
        Ok(())
    }

    /// Advances to the next stored line and primes its first token.
    /// Returns false once the lines are exhausted.
    pub fn next_line(&mut self) -> Result<bool, Error> {
        let next = match self.current {
            Some(index) => index + 1,
            None if self.line_number == 0 => 0,
            None => {
                // past the last line; restart with first_line
                self.next_token()?;
                return Ok(false);
            }
        };
        if next < self.lines.len() {
            self.current = Some(next);
            self.line_number += 1;
        } else {
            self.current = None;
        }
        self.pos = 0;
        self.next_token()?;
        Ok(self.current.is_some())
    }

    /// Produces the next token of the current line, retaining the previous
    /// one. Returns an empty token once the line is exhausted.
    pub fn next_token(&mut self) -> Result<&str, Error> {
        self.previous = std::mem::take(&mut self.token);

        let Some(index) = self.current else {
            return Ok(&self.token);
        };
        let line = &self.lines[index];
        let rest = &line[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();

        let Some(first) = trimmed.chars().next() else {
            return Ok(&self.token);
        };

        let mut len = 0;
        if first == '"' {
            // quoted string: copy through the matching quote, turning the
            // \" escape into a literal quote
            self.token.push('"');
            len = 1;
            let mut closed = false;
            let mut iter = trimmed[1..].char_indices();
            while let Some((i, c)) = iter.next() {
                if c == '"' {
                    self.token.push('"');
                    len = 1 + i + 1;
                    closed = true;
                    break;
                }
                if c == '\\' && trimmed[1 + i + 1..].starts_with('"') {
                    iter.next();
                    self.token.push('"');
                    continue;
                }
                self.token.push(c);
            }
            if !closed {
                return Err(self.error(ErrorKind::UnclosedString));
            }
        } else if SINGLE_CHAR_DELIMITERS.contains(&first) {
            self.token.push(first);
            len = first.len_utf8();
        } else {
            for (i, c) in trimmed.char_indices() {
                if c.is_whitespace() || SINGLE_CHAR_DELIMITERS.contains(&c) {
                    break;
                }
                self.token.push(c);
                len = i + c.len_utf8();
            }
        }
        self.pos += len;
        Ok(&self.token)
    }

    /// Builds an error carrying the current line and token context
    pub fn error(&self, kind: ErrorKind) -> Error {
        Error::in_context(
            kind,
            self.current.map(|index| (self.line_number, self.lines[index].clone())),
            &self.token,
            &self.previous,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(source: &str) -> Cursor {
        Cursor::new(read_lines(source).unwrap())
    }

    #[test]
    fn test_trim_strips_comments_and_whitespace() {
        assert_eq!(trim("  MOV R0, 1  ; set it up"), "MOV R0, 1");
        assert_eq!(trim("; whole line comment"), "");
        assert_eq!(trim("\t\t"), "");
    }

    #[test]
    fn test_trim_keeps_quoted_semicolons() {
        assert_eq!(trim(".TITLE \"a;b\" ; real comment"), ".TITLE \"a;b\"");
        assert_eq!(trim(".DATA s \"\\\";\" ; c"), ".DATA s \"\\\";\"");
    }

    #[test]
    fn test_read_lines_stops_at_eot() {
        let lines = read_lines("NOP\nHLT\u{0004}\nJMP 0").unwrap();
        assert_eq!(lines, vec!["NOP", "HLT"]);
    }

    #[test]
    fn test_read_lines_rejects_long_lines() {
        let long = "A".repeat(151);
        let err = read_lines(&long).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MaxLengthExceeded);
        assert!(read_lines(&"A".repeat(140)).is_ok());
    }

    #[test]
    fn test_tokens_split_on_delimiters() {
        let mut c = cursor("MOV R0,[loop]:");
        c.first_line().unwrap();
        assert_eq!(c.token(), "MOV");
        assert_eq!(c.next_token().unwrap(), "R0");
        assert_eq!(c.next_token().unwrap(), ",");
        assert_eq!(c.next_token().unwrap(), "[");
        assert_eq!(c.next_token().unwrap(), "loop");
        assert_eq!(c.next_token().unwrap(), "]");
        assert_eq!(c.next_token().unwrap(), ":");
        assert_eq!(c.next_token().unwrap(), "");
    }

    #[test]
    fn test_quoted_token_with_escape() {
        let mut c = cursor(".TITLE \"say \\\"hi\\\"\"");
        c.first_line().unwrap();
        assert_eq!(c.next_token().unwrap(), "\"say \"hi\"\"");
    }

    #[test]
    fn test_unclosed_string_is_an_error() {
        let mut c = cursor(".TITLE \"oops");
        c.first_line().unwrap();
        let err = c.next_token().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnclosedString);
    }

    #[test]
    fn test_previous_token_is_retained() {
        let mut c = cursor("PUSH R3");
        c.first_line().unwrap();
        c.next_token().unwrap();
        let err = c.error(ErrorKind::Comma);
        assert!(err.to_string().contains("'PUSH'"));
    }

    #[test]
    fn test_cursor_restarts_from_first_line() {
        let mut c = cursor("NOP\nHLT");
        c.first_line().unwrap();
        assert_eq!(c.token(), "NOP");
        assert!(c.next_line().unwrap());
        assert_eq!(c.token(), "HLT");
        assert!(!c.next_line().unwrap());
        assert!(!c.has_line());
        c.first_line().unwrap();
        assert_eq!(c.token(), "NOP");
    }
}
