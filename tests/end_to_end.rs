//! Integration tests driving the assembler end to end through its public
//! `Assembler` API, one real source program at a time.

use std::path::PathBuf;

use tlcs900_asm::Assembler;

struct TempSource {
    path: PathBuf,
}

impl TempSource {
    fn new(contents: &str) -> Self {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "tlcs900_asm_e2e_{}_{:x}.asm",
            std::process::id(),
            contents.len() as u64 * 2654435761
        ));
        std::fs::write(&path, contents).unwrap();
        TempSource { path }
    }
}

impl Drop for TempSource {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn assemble(src: &str) -> Vec<u8> {
    let file = TempSource::new(src);
    let mut asm = Assembler::new();
    asm.assemble_file(&file.path).unwrap().to_vec()
}

#[test]
fn forward_jr_to_self_converges_in_one_sizing_iteration() {
    let bytes = assemble("ORG $1000\nstart: NOP\nJR start\n");
    assert_eq!(bytes, vec![0x00, 0x68, 0xFD]);
}

#[test]
fn equ_constant_selects_8_bit_direct_store() {
    let bytes = assemble("ORG $100\nVAL EQU $42\nLD (VAL), #$37\n");
    assert_eq!(bytes, vec![0x08, 0x42, 0x37]);
}

#[test]
fn label_derived_address_is_not_shortened_even_when_small() {
    // LABEL is a Label, not a constant, so even though its address fits in
    // a byte the encoder must not use the 8-bit direct form.
    let bytes = assemble("ORG $100\nLABEL: DB 0\nLD (LABEL), #$37\n");
    assert_eq!(bytes, vec![0xF1, 0x00, 0x01, 0x00, 0x37]);
}

#[test]
fn djnz_with_immediately_following_target() {
    let bytes = assemble("ORG $0\nDJNZ A, back\nback: NOP\n");
    assert_eq!(bytes, vec![0xC8, 0x1D, 0xFD, 0x00]);
}

#[test]
fn ld_xwa_immediate_long_is_compact_form() {
    let bytes = assemble("LD XWA, #$12345678\n");
    assert_eq!(bytes, vec![0x40, 0x78, 0x56, 0x34, 0x12]);
}

#[test]
fn jrl_reaches_a_target_outside_jrs_eight_bit_range() {
    let mut src = String::from("ORG $100\nfwd_jrl:\n");
    for _ in 0..200 {
        src.push_str("NOP\n");
    }
    src.push_str("JRL fwd_jrl\n");

    let bytes = assemble(&src);
    // JRL is fixed at a 16-bit displacement regardless of distance, unlike
    // JR's 8-bit field (which this target is 200+ bytes past).
    assert_eq!(bytes[200], 0x78);
    assert_eq!(bytes[201], 0x35);
    assert_eq!(bytes[202], 0xFF);
}

#[test]
fn pass_one_and_pass_two_program_counters_agree() {
    let file = TempSource::new("JR T, FWD\nDS 200\nFWD: NOP\n");
    let mut asm = Assembler::new();
    assert!(asm.assemble_file(&file.path).is_ok());
    assert_eq!(asm.error_count(), 0);
}

#[test]
fn dw_emits_little_endian_and_dd_emits_four_bytes() {
    let bytes = assemble("DW $1234\nDD $12345678\n");
    assert_eq!(bytes, vec![0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
}

#[test]
fn case_insensitive_symbol_resolution() {
    let bytes = assemble("foo: NOP\nLD XWA, #FOO\n");
    assert_eq!(&bytes[1..], &[0x40, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn undefined_symbol_in_emitting_pass_fails_assembly() {
    let file = TempSource::new("LD XWA, #NOPE\n");
    let mut asm = Assembler::new();
    assert!(asm.assemble_file(&file.path).is_err());
}

#[test]
fn division_by_zero_in_an_equ_fails_assembly() {
    let file = TempSource::new("VAL EQU 1 / 0\n");
    let mut asm = Assembler::new();
    assert!(asm.assemble_file(&file.path).is_err());
}

#[test]
fn include_directive_pulls_in_a_sibling_file() {
    let dir = std::env::temp_dir().join(format!("tlcs900_asm_include_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let included = dir.join("included.asm");
    std::fs::write(&included, "DB 9\n").unwrap();
    let main = dir.join("main.asm");
    std::fs::write(&main, "INCLUDE \"included.asm\"\n").unwrap();

    let mut asm = Assembler::new();
    let bytes = asm.assemble_file(&main).unwrap().to_vec();
    assert_eq!(bytes, vec![9]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn ds_with_explicit_fill_value() {
    let bytes = assemble("DS 4, $FF\n");
    assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn macro_expands_and_sizes_stably_across_iterations() {
    let bytes = assemble("SETREG MACRO DST, VAL\nLD DST, #VAL\nENDM\nSETREG A, 5\n");
    assert_eq!(bytes, vec![0x21, 5]);
}
