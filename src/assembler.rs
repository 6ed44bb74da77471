//! Translates E80 assembly into a VHDL firmware image in a two-pass manner
//!
//! The first pass resolves labels into a sorted symbol table, while the
//! second pass interprets directives and encodes instructions into the
//! 254-byte RAM image. The image is finally rendered by splicing machine
//! code and header values into a VHDL template file.
//!
//! Comments start with a semicolon (`;`) and continue to the end of the
//! line. Everything outside quoted strings is case-insensitive. A label is
//! defined with a colon and may share its line with an instruction:
//!
//! ```ignore
//! .TITLE "Counter"
//! .LABEL step 1
//! loop:
//!     ADD R0, step   ; R0 counts up forever
//!     JMP loop
//! ```
//!
//! The assembler supports the following directives, which must precede
//! the first instruction:
//! - .TITLE "string": name the program inside the generated VHDL
//! - .FREQUENCY n: clock frequency constant, 1 to 1000
//! - .SIMDIP value: the simulated DIP-switch byte
//! - .LABEL name n (.NAME is an alias): a named byte constant
//! - .DATA name element, ...: named data bytes, laid out after the code;
//!   each element is a number or a quoted string stored one ASCII
//!   character per byte
//!
//! The instruction set falls into six shape classes:
//! - HLT, NOP, RETURN: no operands
//! - RSHIFT, LSHIFT, PUSH, POP: one register
//! - JC, JNC, JZ, JNZ, JS, JNS, JV, JNV, CALL: one byte value
//! - JMP: a byte value or a register
//! - MOV, ADD, SUB, ROR, AND, OR, XOR, CMP: `reg, op2` where op2 is a
//!   byte value or a register; STORE and LOAD write op2 in brackets
//! - BIT: `reg, n`
//!
//! Registers are `R0` to `R7`; `FLAGS` aliases `R6` and `SP` aliases `R7`.
//! Values are numbers (`15`, `0x0F`, `0b00001111`, optionally negated) or
//! label names.

pub mod directives;
pub mod image;
pub mod instructions;
pub mod operand;
pub mod source;
pub mod symbols;

use std::fmt;

pub use image::Image;

use image::{MAX_FREQUENCY, MIN_FREQUENCY, RAM_SIZE};
use operand::NumberError;
use source::MAX_LINE_LENGTH;
use symbols::MAX_LABELS;

/// The VHDL template read from the working directory
pub const TEMPLATE: &str = "Template.vhd";

/// Assemble source code into a firmware image ready for rendering
pub fn assemble(source: &str) -> Result<Image, Error> {
    let lines = source::read_lines(source)?;
    let mut cursor = source::Cursor::new(lines);
    let mut image = Image::new();

    // pass one: collect and sort the labels
    symbols::collect(&mut cursor, &mut image)?;
    // pass two: directives first (data lands after the code counted in
    // pass one), then the instructions from address 0
    directives::run(&mut cursor, &mut image)?;
    instructions::run(&mut cursor, &mut image)?;

    Ok(image)
}

/// The closed error taxonomy. The discriminant doubles as the process
/// exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OpenTemplate = 1,
    MaxLengthExceeded,
    Label,
    EmptyString,
    UnclosedString,
    ArrayElement,
    Frequency,
    Number,
    ManyLabels,
    DuplicateLabel,
    MemoryAllocation,
    Extraneous,
    Directive,
    InstructionLabel,
    InstructionColon,
    Instruction,
    Reserved,
    Register,
    Value,
    Comma,
    LeftBracket,
    RightBracket,
    Op,
    RamLimit,
    UnquotedTitle,
    DuplicateTitle,
}

impl ErrorKind {
    /// The exit status reported for this kind
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A diagnostic carrying the offending line and the tokens around the
/// failure point. The first error terminates the translation.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    line: Option<(usize, String)>,
    token: String,
    previous: String,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Error {
        Error {
            kind,
            line: None,
            token: String::new(),
            previous: String::new(),
        }
    }

    pub(crate) fn at_line(kind: ErrorKind, number: usize, text: &str) -> Error {
        Error {
            kind,
            line: Some((number, text.to_string())),
            ..Error::new(kind)
        }
    }

    pub(crate) fn in_context(
        kind: ErrorKind,
        line: Option<(usize, String)>,
        token: &str,
        previous: &str,
    ) -> Error {
        Error {
            kind,
            line,
            token: token.to_string(),
            previous: previous.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn message(&self) -> String {
        use ErrorKind::*;
        match self.kind {
            OpenTemplate => format!("can't open the template file '{}'", TEMPLATE),
            MaxLengthExceeded => format!("line exceeds maximum {} characters", MAX_LINE_LENGTH),
            Label => format!("'{}' is not a valid label", self.token),
            EmptyString => "empty strings are not permitted".to_string(),
            UnclosedString => format!("quote expected after string '{}'", self.token),
            ArrayElement => {
                if self.token.is_empty() {
                    "expected an array element".to_string()
                } else {
                    format!("'{}' is not an array element", self.token)
                }
            }
            Frequency => format!(
                "frequency must be between {} and {}",
                MIN_FREQUENCY, MAX_FREQUENCY
            ),
            Number => format!("'{}' is not a valid number", self.token),
            ManyLabels => format!("maximum number of {} labels reached", MAX_LABELS),
            DuplicateLabel => "this label has been set in a previous line".to_string(),
            MemoryAllocation => "memory allocation error".to_string(),
            Extraneous => format!("'{}' was unexpected", self.token),
            Directive => format!("'{}' is not a directive", self.token),
            InstructionLabel => format!("'{}' is no instruction or label", self.token),
            InstructionColon => {
                format!("'{}' is no instruction, or missing a colon", self.previous)
            }
            Instruction => format!("'{}' is no instruction", self.token),
            Reserved => format!("'{}' is reserved and cannot be used here", self.token),
            Register => {
                if self.token.is_empty() {
                    format!("expected register after '{}'", self.previous)
                } else {
                    format!("'{}' is not a register", self.token)
                }
            }
            Value => format!("'{}' is not a number or label", self.token),
            Comma => format!("comma expected after '{}'", self.previous),
            LeftBracket => {
                format!("LOAD/STORE requires a left bracket before '{}'", self.token)
            }
            RightBracket => {
                format!("LOAD/STORE requires a right bracket after '{}'", self.previous)
            }
            Op => {
                if self.token.is_empty() {
                    "expected a number, label or register after the comma".to_string()
                } else {
                    format!("'{}' is not a number, label or register", self.token)
                }
            }
            RamLimit => format!("{}-byte RAM limit exceeded", RAM_SIZE),
            UnquotedTitle => "quoted title string expected".to_string(),
            DuplicateTitle => "only one .TITLE directive is allowed".to_string(),
        }
    }

    /// A targeted hint for number-shaped failures, chosen by
    /// re-classifying the offending token
    fn hint(&self) -> Option<&'static str> {
        use ErrorKind::*;
        match self.kind {
            Number => Some(NUMBER_FORMAT_HELP),
            Value | Op | ArrayElement => match operand::number(&self.token) {
                Err(NumberError::Hex) => {
                    Some("hexadecimals are limited to 2 digits (eg. 0xF or 0x1A)")
                }
                Err(NumberError::Bin) => {
                    Some("binaries are limited to 8 digits (eg. 0b00101011)")
                }
                Err(NumberError::Octal) => {
                    Some("leading zeroes are not allowed on decimal numbers")
                }
                Err(NumberError::Range) => Some("unsigned numbers are limited to 0-255"),
                Err(NumberError::SignedRange) => Some("signed minimum is -128"),
                Err(NumberError::NotANumber) if self.kind == ArrayElement => {
                    Some("example of an array: .DATA str 12, \"abc\", 0xAF, 0b1011")
                }
                _ => None,
            },
            _ => None,
        }
    }
}

const NUMBER_FORMAT_HELP: &str = "numbers can either be:\n\
    1) hexadecimal preceded by 0x, up to 2 digits (eg. 0x0F)\n\
    2) binary preceded by 0b, up to 8 digits (eg. 0b00001111)\n\
    3) decimal 0-255 with no leading zeroes (eg. 15)\n\
    signed minimum is -128, -0b10000000, -0x80";

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.line {
            Some((number, text)) => {
                writeln!(f, "{} at line {}", self.message(), number)?;
                write!(f, "{}\t{}", number, text)?;
            }
            None => write!(f, "{}", self.message())?,
        }
        if let Some(hint) = self.hint() {
            write!(f, "\n{}", hint)?;
        }
        Ok(())
    }
}
