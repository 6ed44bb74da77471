//! End-to-end tests: assemble a program and render it through a template.

use e80asm::assembler::assemble;

const TEMPLATE: &str = "\
-- TITLE_PLACEHOLDER
library IEEE;
use IEEE.STD_LOGIC_1164.ALL;

constant DefaultFrequency : positive := %d; -- Hz
constant SimDIP : std_logic_vector(7 downto 0) := \"%s\";

architecture Behavioral of RAM is
    signal cells : ram_type := (
-- MACHINE_CODE_PLACEHOLDER
        OTHERS => \"00000000\"
    );
end Behavioral;
";

fn render(source: &str) -> String {
    let image = assemble(source).expect("assembly failed");
    let mut out = Vec::new();
    image.render(TEMPLATE.as_bytes(), &mut out).expect("render failed");
    String::from_utf8(out).expect("render produced non-UTF-8 output")
}

#[test]
fn test_a_complete_program() {
    let source = r#"
        .TITLE "Blink demo"   ; shown in the VHDL header
        .FREQUENCY 100
        .SIMDIP 0b00000001

        start:
            MOV R0, 1
            JMP start
    "#;
    let out = render(source);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "-- Blink demo");
    assert_eq!(lines[4], "constant DefaultFrequency : positive := 100; -- Hz");
    assert_eq!(
        lines[5],
        "constant SimDIP : std_logic_vector(7 downto 0) := \"00000001\";"
    );
    assert_eq!(
        lines[9],
        "0   => \"00010000\", 1   => \"00000001\",  -- 1001  MOV R0, 1"
    );
    assert_eq!(
        lines[10],
        "2   => \"00000010\", 3   => \"00000000\",  -- 0200  JMP 0"
    );
    assert_eq!(lines[11], "        OTHERS => \"00000000\"");
}

#[test]
fn test_untouched_template_lines_pass_through() {
    let out = render("HLT");
    assert!(out.contains("library IEEE;"));
    assert!(out.contains("use IEEE.STD_LOGIC_1164.ALL;"));
    // defaults apply when no directives are given
    assert!(out.contains("-- Untitled E80 program"));
    assert!(out.contains(":= 15; -- Hz"));
    assert!(out.contains(":= \"00000000\";"));
}

#[test]
fn test_data_words_are_marked_in_the_hex_column() {
    let out = render(".DATA greet \"Hi\", 0\nNOP");
    assert!(out.contains("1   => \"01001000\",                     -- data  'H' (72)"));
    assert!(out.contains("2   => \"01101001\",                     -- data  'i' (105)"));
    assert!(out.contains("3   => \"00000000\",                     -- data  0"));
    assert!(out.contains("0   => \"00000001\",                     -- 01    NOP"));
}

#[test]
fn test_code_and_data_share_the_ram() {
    // 254 words of code leave no room for data
    let mut source = String::from(".DATA tail 1\n");
    source.push_str(&"NOP\n".repeat(254));
    let image = assemble(&source);
    assert!(image.is_err());
}
