//! Directive name resolution: maps every recognized keyword (and its
//! synonyms) onto one canonical [`Directive`], so the line dispatcher
//! never has to special-case alias spelling beyond this one table.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Org,
    Equ,
    Set,
    Macro,
    Endm,
    Db,
    Dw,
    Dd,
    Ds,
    Align,
    Include,
    Bincinclude,
    Cpu,
    Maxmode,
    End,
    Ignored,
}

pub fn lookup_directive(word: &str) -> Option<Directive> {
    use Directive::*;
    let upper = word.to_ascii_uppercase();
    Some(match upper.as_str() {
        "ORG" => Org,
        "EQU" => Equ,
        "SET" => Set,
        "MACRO" => Macro,
        "ENDM" => Endm,
        "DB" | "DEFB" | "DC.B" | "FCB" | "BYT" | ".BYTE" => Db,
        "DW" | "DEFW" | "DC.W" | "FDB" | "WOR" | ".WORD" | "DATA" => Dw,
        "DD" | "DEFL" | "DC.L" | ".LONG" => Dd,
        "DS" | "DEFS" | "RMB" | "RES" | ".BLKB" => Ds,
        "ALIGN" => Align,
        "INCLUDE" => Include,
        "BINCLUDE" | "INCBIN" => Bincinclude,
        "CPU" | ".CPU" => Cpu,
        "MAXMODE" => Maxmode,
        "END" => End,
        "PAGE" | "NEWPAGE" | "LISTING" | "PRTINIT" | "PRTEXIT" => Ignored,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_db_synonyms() {
        for word in ["DB", "defb", "DC.B", "Fcb", "BYT", ".byte"] {
            assert_eq!(lookup_directive(word), Some(Directive::Db));
        }
    }

    #[test]
    fn unknown_word_is_none() {
        assert_eq!(lookup_directive("FROBNICATE"), None);
    }
}
