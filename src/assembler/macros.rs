//! Macro collection and expansion.
//!
//! `MACRO`/`ENDM` capture is a line-capture state machine driven by the line
//! dispatcher; this module holds only the mechanics once a body has been
//! captured: splitting a call's argument list and substituting parameters
//! into the stored body text. Expansion always re-tokenizes from the
//! stored raw lines — nothing here retains lexer state across calls, so a
//! macro invoked with different arguments on successive sizing iterations
//! can never see stale lookahead.

use crate::diagnostics::Diagnostics;
use crate::symbol::MacroBody;

pub const MAX_MACRO_DEPTH: usize = 16;
pub const MAX_MACRO_PARAMS: usize = 16;

/// In-progress `MACRO` capture, owned transiently by the driver between
/// seeing `MACRO` and its matching `ENDM`.
#[derive(Debug, Default)]
pub struct MacroCollector {
    pub name: String,
    pub params: Vec<String>,
    pub lines: Vec<String>,
}

impl MacroCollector {
    pub fn new(name: String, params: Vec<String>) -> Self {
        MacroCollector {
            name,
            params,
            lines: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn into_body(self) -> MacroBody {
        MacroBody {
            params: self.params,
            lines: self.lines,
        }
    }
}

/// Splits a macro call's argument text on top-level commas — commas nested
/// inside parentheses (an addressing-mode operand) do not separate
/// arguments.
pub fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() || !args.is_empty() {
        args.push(trimmed.to_string());
    }
    args
}

/// Textually substitutes each parameter name with its argument's raw text,
/// matching whole identifiers only (so a parameter named `A` does not
/// clobber `BA` or `AX`).
fn substitute_line(line: &str, params: &[String], args: &[String]) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut result = String::with_capacity(line.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            match params.iter().position(|p| p.eq_ignore_ascii_case(&word)) {
                Some(pos) => result.push_str(args.get(pos).map(String::as_str).unwrap_or("")),
                None => result.push_str(&word),
            }
        } else {
            result.push(c);
            i += 1;
        }
    }
    result
}

/// Expands one macro call into its substituted body lines, fresh every
/// time. `depth` is the caller's current macro-nesting depth (0 for a
/// top-level call); exceeding [`MAX_MACRO_DEPTH`] is a resource error.
pub fn expand(
    body: &MacroBody,
    args: &[String],
    depth: usize,
    diagnostics: &mut Diagnostics,
    file: &str,
    line: usize,
) -> Result<Vec<String>, ()> {
    if depth > MAX_MACRO_DEPTH {
        diagnostics.error(file, line, "macro expansion nested too deeply (> 16)");
        return Err(());
    }
    if args.len() > MAX_MACRO_PARAMS || body.params.len() > MAX_MACRO_PARAMS {
        diagnostics.error(file, line, "macro has too many parameters (> 16)");
        return Err(());
    }
    Ok(body
        .lines
        .iter()
        .map(|l| substitute_line(l, &body.params, args))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_top_level_commas_only() {
        let args = split_args("A, (HL+4), #$10");
        assert_eq!(args, vec!["A", "(HL+4)", "#$10"]);
    }

    #[test]
    fn split_args_of_empty_text_is_empty() {
        assert!(split_args("").is_empty());
    }

    #[test]
    fn substitutes_whole_identifiers_only() {
        let params = vec!["DST".to_string()];
        let args = vec!["XWA".to_string()];
        let out = substitute_line("LD DST, #1", &params, &args);
        assert_eq!(out, "LD XWA, #1");
    }

    #[test]
    fn does_not_clobber_longer_identifiers() {
        let params = vec!["A".to_string()];
        let args = vec!["1".to_string()];
        let out = substitute_line("LD BA, A", &params, &args);
        assert_eq!(out, "LD BA, 1");
    }

    #[test]
    fn expand_rejects_depth_over_limit() {
        let body = MacroBody {
            params: vec![],
            lines: vec!["NOP".to_string()],
        };
        let mut diagnostics = Diagnostics::new();
        let result = expand(&body, &[], 17, &mut diagnostics, "t.asm", 1);
        assert!(result.is_err());
        assert_eq!(diagnostics.error_count, 1);
    }
}
