//! The assembled firmware image and its VHDL rendering.
//!
//! RAM cells are 8-character bit-strings; a cell left empty was never
//! written and falls through to the `OTHERS =>` default of the VHDL RAM
//! declaration. Each instruction's last word carries a mnemonic comment,
//! which is how the emitter knows where an instruction ends and pairs the
//! two words of a two-word instruction onto a single line.

use std::io::{self, BufRead, Write};

use crate::assembler::symbols::LabelTable;
use crate::assembler::ErrorKind;

/// Usable RAM of the E80, in bytes
pub const RAM_SIZE: usize = 254;

pub const MIN_FREQUENCY: u32 = 1;
pub const MAX_FREQUENCY: u32 = 1000;
pub const DEFAULT_FREQUENCY: u32 = 15;

const DEFAULT_TITLE: &str = "Untitled E80 program";

/// Everything the second pass produces: machine code, mnemonic comments,
/// the label table and the header values spliced into the template.
#[derive(Debug)]
pub struct Image {
    ram: Vec<String>,
    comment: Vec<String>,
    pub addr: usize,
    pub title: String,
    pub frequency: u32,
    pub simdip: String,
    pub labels: LabelTable,
}

impl Image {
    pub fn new() -> Image {
        // one spare cell past the limit; a write may land there right
        // before the following next_addr reports the RAM limit
        Image {
            ram: vec![String::new(); RAM_SIZE + 1],
            comment: vec![String::new(); RAM_SIZE + 1],
            addr: 0,
            title: String::new(),
            frequency: DEFAULT_FREQUENCY,
            simdip: "00000000".to_string(),
            labels: LabelTable::new(),
        }
    }

    /// Moves to the next RAM address, checking the 254-byte limit
    pub fn next_addr(&mut self) -> Result<(), ErrorKind> {
        self.addr += 1;
        if self.addr > RAM_SIZE {
            Err(ErrorKind::RamLimit)
        } else {
            Ok(())
        }
    }

    /// The RAM cell at the current address
    pub fn cell(&mut self) -> &mut String {
        &mut self.ram[self.addr]
    }

    /// The comment cell at the current address
    pub fn comment_cell(&mut self) -> &mut String {
        &mut self.comment[self.addr]
    }

    pub fn ram(&self, addr: usize) -> &str {
        &self.ram[addr]
    }

    pub fn comment(&self, addr: usize) -> &str {
        &self.comment[addr]
    }

    /// Streams the template through to `out`, substituting the title,
    /// frequency, DIP switches and machine code at their placeholders.
    pub fn render<R: BufRead, W: Write>(&self, template: R, mut out: W) -> io::Result<()> {
        for line in template.lines() {
            let line = line?;
            if line.contains("TITLE_PLACEHOLDER") {
                let title = if self.title.is_empty() { DEFAULT_TITLE } else { &self.title };
                writeln!(out, "-- {}", title)?;
            } else if line.contains("DefaultFrequency") {
                writeln!(out, "{}", line.replace("%d", &self.frequency.to_string()))?;
            } else if line.contains("SimDIP") {
                writeln!(out, "{}", line.replace("%s", &self.simdip))?;
            } else if line.contains("MACHINE_CODE_PLACEHOLDER") {
                self.render_machine_code(&mut out)?;
            } else {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }

    /// Emits one VHDL RAM assignment line per instruction or data byte:
    ///
    /// ```text
    /// addr => "bits1", addr2 => "bits2", -- hhhh  MNEMONIC ops
    /// addr => "bits",                    -- hh    MNEMONIC ops
    /// ```
    ///
    /// A word without a comment is the first half of a two-word
    /// instruction and stays on the open line. Data bytes show `data` in
    /// the hex column.
    fn render_machine_code<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut line = String::new();
        let mut hex = String::new();
        for addr in 0..RAM_SIZE {
            let bits = &self.ram[addr];
            if bits.is_empty() {
                continue;
            }
            let word = u8::from_str_radix(bits, 2).unwrap_or(0);
            let comment = &self.comment[addr];
            line.push_str(&addr.to_string());
            if line.len() < 15 {
                // first word; 1-3 address digits
                let pad = 4 - line.len();
                if comment.starts_with(|c: char| c == '\'' || c == '-' || c.is_ascii_digit()) {
                    hex = "data".to_string();
                } else {
                    hex = format!("{:02X}", word);
                }
                line.push_str(&" ".repeat(pad));
            } else {
                // second word of a two-word instruction
                let pad = 23 - line.len();
                hex.push_str(&format!("{:02X}", word));
                line.push_str(&" ".repeat(pad));
            }
            line.push_str(&format!("=> \"{}\", ", bits));
            if !comment.is_empty() {
                let pad = 39usize.saturating_sub(line.len());
                line.push_str(&" ".repeat(pad));
                line.push_str(&format!("-- {:<6}{}", hex, comment));
                writeln!(out, "{}", line)?;
                line.clear();
                hex.clear();
            }
        }
        Ok(())
    }
}

/// Writes the `high..low` bit slice of `num` (MSB first) into the
/// 8-character cell: bit `high` lands at position `7-high`, bit `low` at
/// `7-low`, matching VHDL's `7 DOWNTO 0`. Positions the slice skips over
/// are padded with '0' only when the cell is too short to reach them.
pub fn bitcopy(cell: &mut String, num: u8, high: u32, low: u32) {
    let msb = (7 - high) as usize;
    let lsb = (7 - low) as usize;
    let mut buf: Vec<char> = cell.chars().collect();
    if buf.len() <= lsb {
        buf.resize(lsb + 1, '0');
    }
    let mut num = num;
    for i in (msb..=lsb).rev() {
        buf[i] = if num & 1 == 1 { '1' } else { '0' };
        num >>= 1;
    }
    cell.clear();
    cell.extend(buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitcopy_full_byte() {
        let mut cell = String::new();
        bitcopy(&mut cell, 0b1011_0010, 7, 0);
        assert_eq!(cell, "10110010");
    }

    #[test]
    fn test_bitcopy_fills_the_low_bits_after_a_prefix() {
        let mut cell = "10100".to_string();
        bitcopy(&mut cell, 5, 2, 0);
        assert_eq!(cell, "10100101");
    }

    #[test]
    fn test_bitcopy_slices_read_back_modulo() {
        for (num, high, low) in [(0xABu8, 7, 4), (7, 2, 0), (0xFF, 3, 0), (1, 7, 0)] {
            let mut cell = "00000000".to_string();
            bitcopy(&mut cell, num, high, low);
            let slice = &cell[(7 - high as usize)..=(7 - low as usize)];
            let width = high - low + 1;
            let expected = u32::from(num) % 2u32.pow(width);
            assert_eq!(u32::from_str_radix(slice, 2).unwrap(), expected);
        }
    }

    #[test]
    fn test_next_addr_enforces_the_ram_limit() {
        let mut image = Image::new();
        image.addr = RAM_SIZE - 1;
        assert_eq!(image.next_addr(), Ok(()));
        assert_eq!(image.next_addr(), Err(ErrorKind::RamLimit));
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let mut image = Image::new();
        image.title = "Blink".to_string();
        image.frequency = 100;
        image.simdip = "00001111".to_string();
        *image.cell() = "00000000".to_string();
        *image.comment_cell() = "HLT".to_string();

        let template = "\
-- TITLE_PLACEHOLDER
constant DefaultFrequency : positive := %d;
constant SimDIP : word := \"%s\";
-- MACHINE_CODE_PLACEHOLDER
end;";
        let mut out = Vec::new();
        image.render(template.as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "-- Blink");
        assert_eq!(lines[1], "constant DefaultFrequency : positive := 100;");
        assert_eq!(lines[2], "constant SimDIP : word := \"00001111\";");
        assert_eq!(
            lines[3],
            "0   => \"00000000\",                     -- 00    HLT"
        );
        assert_eq!(lines[4], "end;");
    }

    #[test]
    fn test_render_uses_the_default_title() {
        let image = Image::new();
        let mut out = Vec::new();
        image.render("-- TITLE_PLACEHOLDER".as_bytes(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("-- {}\n", DEFAULT_TITLE));
    }

    #[test]
    fn test_render_pairs_two_word_instructions() {
        let mut image = Image::new();
        *image.cell() = "00000010".to_string();
        image.next_addr().unwrap();
        *image.cell() = "00000101".to_string();
        *image.comment_cell() = "JMP 5".to_string();

        let mut out = Vec::new();
        image.render("-- MACHINE_CODE_PLACEHOLDER".as_bytes(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0   => \"00000010\", 1   => \"00000101\",  -- 0205  JMP 5\n"
        );
    }

    #[test]
    fn test_render_marks_data_words() {
        let mut image = Image::new();
        image.addr = 100;
        *image.cell() = "01001000".to_string();
        *image.comment_cell() = "'H' (72)".to_string();

        let mut out = Vec::new();
        image.render("-- MACHINE_CODE_PLACEHOLDER".as_bytes(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "100 => \"01001000\",                     -- data  'H' (72)\n"
        );
    }
}
