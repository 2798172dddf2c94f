//! The TLCS-900/H register file.
//!
//! Identities map deterministically onto three disjoint numeric code
//! families (byte/word/long), following fixed tables rather than a formula,
//! since the hardware's register numbering is itself arbitrary history.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    // Current-bank byte registers.
    W,
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    // Index-register byte halves.
    IXL,
    IXH,
    IYL,
    IYH,
    IZL,
    IZH,
    // Q-bank (shadow) byte registers.
    QW,
    QA,
    QB,
    QC,
    QD,
    QE,
    QH,
    QL,
    QIXL,
    QIXH,
    QIYL,
    QIYH,
    QIZL,
    QIZH,

    // 16-bit registers.
    WA,
    BC,
    DE,
    HL,
    IX,
    IY,
    IZ,
    SP,
    QWA,
    QBC,
    QDE,
    QHL,
    QIX,
    QIY,
    QIZ,

    // 32-bit registers.
    XWA,
    XBC,
    XDE,
    XHL,
    XIX,
    XIY,
    XIZ,
    XSP,

    // Special registers, outside the three numeric families.
    PC,
    SR,
    F,
    FDash,
}

/// Width a register identity belongs to; used by the operand parser to
/// infer an implicit operand size when none was given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWidth {
    Byte,
    Word,
    Long,
    Special,
}

impl Register {
    /// Parses a register mnemonic (case-insensitive). Returns `None` for
    /// anything that isn't a register name, including condition-code-only
    /// spellings that never double as registers.
    pub fn parse(name: &str) -> Option<Register> {
        use Register::*;
        let upper = name.to_ascii_uppercase();
        Some(match upper.as_str() {
            "W" => W,
            "A" => A,
            "B" => B,
            "C" => C,
            "D" => D,
            "E" => E,
            "H" => H,
            "L" => L,
            "IXL" => IXL,
            "IXH" => IXH,
            "IYL" => IYL,
            "IYH" => IYH,
            "IZL" => IZL,
            "IZH" => IZH,
            "QW" => QW,
            "QA" => QA,
            "QB" => QB,
            "QC" => QC,
            "QD" => QD,
            "QE" => QE,
            "QH" => QH,
            "QL" => QL,
            "QIXL" => QIXL,
            "QIXH" => QIXH,
            "QIYL" => QIYL,
            "QIYH" => QIYH,
            "QIZL" => QIZL,
            "QIZH" => QIZH,
            "WA" => WA,
            "BC" => BC,
            "DE" => DE,
            "HL" => HL,
            "IX" => IX,
            "IY" => IY,
            "IZ" => IZ,
            "SP" => SP,
            "QWA" => QWA,
            "QBC" => QBC,
            "QDE" => QDE,
            "QHL" => QHL,
            "QIX" => QIX,
            "QIY" => QIY,
            "QIZ" => QIZ,
            "XWA" => XWA,
            "XBC" => XBC,
            "XDE" => XDE,
            "XHL" => XHL,
            "XIX" => XIX,
            "XIY" => XIY,
            "XIZ" => XIZ,
            "XSP" => XSP,
            "PC" => PC,
            "SR" => SR,
            "F" => F,
            "F'" => FDash,
            _ => return None,
        })
    }

    pub fn width(self) -> RegisterWidth {
        use Register::*;
        match self {
            W | A | B | C | D | E | H | L | IXL | IXH | IYL | IYH | IZL | IZH | QW | QA | QB
            | QC | QD | QE | QH | QL | QIXL | QIXH | QIYL | QIYH | QIZL | QIZH => {
                RegisterWidth::Byte
            }
            WA | BC | DE | HL | IX | IY | IZ | SP | QWA | QBC | QDE | QHL | QIX | QIY | QIZ => {
                RegisterWidth::Word
            }
            XWA | XBC | XDE | XHL | XIX | XIY | XIZ | XSP => RegisterWidth::Long,
            PC | SR | F | FDash => RegisterWidth::Special,
        }
    }

    /// The byte-register code, 0-29, or `None` if this register has no byte
    /// encoding (words, longs, and the special registers).
    pub fn byte_code(self) -> Option<u8> {
        use Register::*;
        Some(match self {
            W => 0,
            A => 1,
            B => 2,
            C => 3,
            D => 4,
            E => 5,
            H => 6,
            L => 7,
            IXL => 8,
            IXH => 9,
            IYL => 10,
            IYH => 11,
            IZL => 12,
            IZH => 13,
            QW => 14,
            QA => 15,
            QB => 16,
            QC => 17,
            QD => 18,
            QE => 19,
            QH => 20,
            QL => 21,
            QIXL => 22,
            QIXH => 23,
            QIYL => 24,
            QIYH => 25,
            QIZL => 26,
            QIZH => 27,
            _ => return None,
        })
    }

    /// The word-register code, 0-14.
    pub fn word_code(self) -> Option<u8> {
        use Register::*;
        Some(match self {
            WA => 0,
            BC => 1,
            DE => 2,
            HL => 3,
            IX => 4,
            IY => 5,
            IZ => 6,
            SP => 7,
            QWA => 8,
            QBC => 9,
            QDE => 10,
            QHL => 11,
            QIX => 12,
            QIY => 13,
            QIZ => 14,
            _ => return None,
        })
    }

    /// The long-register code, 0-7. The 32-bit file does not have a
    /// Q-bank of its own; `XWA` et al. already straddle both banks.
    pub fn long_code(self) -> Option<u8> {
        use Register::*;
        Some(match self {
            XWA => 0,
            XBC => 1,
            XDE => 2,
            XHL => 3,
            XIX => 4,
            XIY => 5,
            XIZ => 6,
            XSP => 7,
            _ => return None,
        })
    }

    /// True for the eight primary 32-bit registers that the encoder may
    /// address with a compact merged prefix+mode byte.
    pub fn is_primary_long(self) -> bool {
        use Register::*;
        matches!(self, XWA | XBC | XDE | XHL | XIX | XIY | XIZ | XSP)
    }

    /// Pair code used for the `0xC8 + pair_code` byte-register-kinded
    /// prefix family: the four current-bank byte pairs (W,A) (B,C) (D,E)
    /// (H,L), identified by their word-sized register name.
    pub fn byte_pair(self) -> Option<(u8, u8)> {
        use Register::*;
        // (pair_code, element bit: 0 for the first register of the pair, 1 for the second)
        Some(match self {
            W => (0, 0),
            A => (0, 1),
            B => (1, 0),
            C => (1, 1),
            D => (2, 0),
            E => (2, 1),
            H => (3, 0),
            L => (3, 1),
            _ => return None,
        })
    }
}

/// The 16 four-bit branch condition codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    F,
    Lt,
    Le,
    Ule,
    Ov,
    Mi,
    Z,
    Carry,
    T,
    Ge,
    Gt,
    Ugt,
    Nov,
    Pl,
    Nz,
    Nc,
}

impl Condition {
    pub fn parse(name: &str) -> Option<Condition> {
        use Condition::*;
        Some(match name.to_ascii_uppercase().as_str() {
            "F" => F,
            "LT" => Lt,
            "LE" => Le,
            "ULE" => Ule,
            "OV" | "PE" => Ov,
            "MI" | "M" => Mi,
            "Z" | "EQ" => Z,
            "C" | "ULT" => Carry,
            "T" => T,
            "GE" => Ge,
            "GT" => Gt,
            "UGT" => Ugt,
            "NOV" | "PO" => Nov,
            "PL" | "P" => Pl,
            "NZ" | "NE" => Nz,
            "NC" | "UGE" => Nc,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        use Condition::*;
        match self {
            F => 0,
            Lt => 1,
            Le => 2,
            Ule => 3,
            Ov => 4,
            Mi => 5,
            Z => 6,
            Carry => 7,
            T => 8,
            Ge => 9,
            Gt => 10,
            Ugt => 11,
            Nov => 12,
            Pl => 13,
            Nz => 14,
            Nc => 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use yare::parameterized;

    use super::*;

    #[parameterized(
        w = { Register::W, 0 },
        a = { Register::A, 1 },
        l = { Register::L, 7 },
        ixl = { Register::IXL, 8 },
        qw = { Register::QW, 14 },
        qizh = { Register::QIZH, 27 },
    )]
    fn byte_code_matches_fixed_table(reg: Register, code: u8) {
        assert_eq!(reg.byte_code(), Some(code));
    }

    #[parameterized(
        wa = { Register::WA, 0 },
        sp = { Register::SP, 7 },
        qwa = { Register::QWA, 8 },
        qiz = { Register::QIZ, 14 },
    )]
    fn word_code_matches_fixed_table(reg: Register, code: u8) {
        assert_eq!(reg.word_code(), Some(code));
    }

    #[parameterized(
        xwa = { Register::XWA, 0 },
        xsp = { Register::XSP, 7 },
    )]
    fn long_code_matches_fixed_table(reg: Register, code: u8) {
        assert_eq!(reg.long_code(), Some(code));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Register::parse("wa"), Some(Register::WA));
        assert_eq!(Register::parse("Xwa"), Some(Register::XWA));
    }

    #[test]
    fn byte_pair_groups_wa_bc_de_hl() {
        assert_eq!(Register::W.byte_pair(), Some((0, 0)));
        assert_eq!(Register::A.byte_pair(), Some((0, 1)));
        assert_eq!(Register::L.byte_pair(), Some((3, 1)));
    }

    #[test]
    fn long_code_has_no_q_bank() {
        assert_eq!(Register::XWA.long_code(), Some(0));
        assert_eq!(Register::QWA.long_code(), None);
    }

    #[test]
    fn condition_t_is_always_true_code_eight() {
        assert_eq!(Condition::parse("T").unwrap().code(), 8);
    }
}
