//! Recursive-descent expression evaluator.
//!
//! Every call threads a tri-state [`EvalResult`] through the grammar:
//! `known` (every referenced symbol was defined this pass) and
//! `is_constant` (every leaf was a literal or an Equ/Set symbol, never a
//! label, `$`, or an unresolved name). Operators combine both flags as a
//! conjunction — a single `known` boolean would lose the distinction the
//! encoder's short-form address selection depends on.

use crate::diagnostics::Diagnostics;
use crate::lexer::{Lexer, TokenKind};
use crate::symbol::SymbolTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalResult {
    pub value: i64,
    pub known: bool,
    pub is_constant: bool,
}

impl EvalResult {
    fn literal(value: i64) -> Self {
        EvalResult {
            value,
            known: true,
            is_constant: true,
        }
    }

    fn unknown() -> Self {
        EvalResult {
            value: 0,
            known: false,
            is_constant: false,
        }
    }

    fn combine(self, other: EvalResult, value: i64) -> EvalResult {
        EvalResult {
            value,
            known: self.known && other.known,
            is_constant: self.is_constant && other.is_constant,
        }
    }
}

pub struct Context<'a> {
    pub symbols: &'a mut SymbolTable,
    pub diagnostics: &'a mut Diagnostics,
    pub pc: i64,
    pub pass: u8,
    pub file: &'a str,
    pub line: usize,
}

pub fn evaluate(lexer: &mut Lexer, ctx: &mut Context) -> Result<EvalResult, ()> {
    or_expr(lexer, ctx)
}

macro_rules! left_assoc {
    ($name:ident, $next:ident, [ $( $tok:pat => $op:expr ),+ $(,)? ]) => {
        fn $name(lexer: &mut Lexer, ctx: &mut Context) -> Result<EvalResult, ()> {
            let mut lhs = $next(lexer, ctx)?;
            loop {
                match lexer.peek() {
                    $( $tok => {
                        lexer.next();
                        let rhs = $next(lexer, ctx)?;
                        let value = $op(lhs.value, rhs.value);
                        lhs = lhs.combine(rhs, value);
                    } )+
                    _ => break,
                }
            }
            Ok(lhs)
        }
    };
}

left_assoc!(or_expr, and_expr, [
    TokenKind::PipePipe => (|a: i64, b: i64| i64::from(a != 0 || b != 0)),
]);

left_assoc!(and_expr, bitor_expr, [
    TokenKind::AmpAmp => (|a: i64, b: i64| i64::from(a != 0 && b != 0)),
]);

left_assoc!(bitor_expr, bitxor_expr, [
    TokenKind::Pipe => (|a: i64, b: i64| a | b),
]);

left_assoc!(bitxor_expr, bitand_expr, [
    TokenKind::Caret => (|a: i64, b: i64| a ^ b),
]);

left_assoc!(bitand_expr, equality_expr, [
    TokenKind::Amp => (|a: i64, b: i64| a & b),
]);

left_assoc!(equality_expr, relational_expr, [
    TokenKind::EqEq => (|a: i64, b: i64| i64::from(a == b)),
    TokenKind::Ne => (|a: i64, b: i64| i64::from(a != b)),
]);

left_assoc!(relational_expr, shift_expr, [
    TokenKind::Lt => (|a: i64, b: i64| i64::from(a < b)),
    TokenKind::Le => (|a: i64, b: i64| i64::from(a <= b)),
    TokenKind::Gt => (|a: i64, b: i64| i64::from(a > b)),
    TokenKind::Ge => (|a: i64, b: i64| i64::from(a >= b)),
]);

fn shift_expr(lexer: &mut Lexer, ctx: &mut Context) -> Result<EvalResult, ()> {
    let mut lhs = additive_expr(lexer, ctx)?;
    loop {
        match lexer.peek() {
            TokenKind::Shl => {
                lexer.next();
                let rhs = additive_expr(lexer, ctx)?;
                let value = ((lhs.value as u64).wrapping_shl(rhs.value as u32 & 63)) as i64;
                lhs = lhs.combine(rhs, value);
            }
            TokenKind::Shr => {
                lexer.next();
                let rhs = additive_expr(lexer, ctx)?;
                let value = ((lhs.value as u64).wrapping_shr(rhs.value as u32 & 63)) as i64;
                lhs = lhs.combine(rhs, value);
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn additive_expr(lexer: &mut Lexer, ctx: &mut Context) -> Result<EvalResult, ()> {
    let mut lhs = multiplicative_expr(lexer, ctx)?;
    loop {
        match lexer.peek() {
            TokenKind::Plus => {
                lexer.next();
                let rhs = multiplicative_expr(lexer, ctx)?;
                let value = lhs.value.wrapping_add(rhs.value);
                lhs = lhs.combine(rhs, value);
            }
            TokenKind::Minus => {
                lexer.next();
                let rhs = multiplicative_expr(lexer, ctx)?;
                let value = lhs.value.wrapping_sub(rhs.value);
                lhs = lhs.combine(rhs, value);
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn multiplicative_expr(lexer: &mut Lexer, ctx: &mut Context) -> Result<EvalResult, ()> {
    let mut lhs = unary_expr(lexer, ctx)?;
    loop {
        match lexer.peek() {
            TokenKind::Star => {
                lexer.next();
                let rhs = unary_expr(lexer, ctx)?;
                let value = lhs.value.wrapping_mul(rhs.value);
                lhs = lhs.combine(rhs, value);
            }
            TokenKind::Slash => {
                lexer.next();
                let rhs = unary_expr(lexer, ctx)?;
                if rhs.value == 0 {
                    ctx.diagnostics.error(ctx.file, ctx.line, "division by zero");
                    return Err(());
                }
                let value = lhs.value.wrapping_div(rhs.value);
                lhs = lhs.combine(rhs, value);
            }
            TokenKind::Percent => {
                lexer.next();
                let rhs = unary_expr(lexer, ctx)?;
                if rhs.value == 0 {
                    ctx.diagnostics.error(ctx.file, ctx.line, "modulo by zero");
                    return Err(());
                }
                let value = lhs.value.wrapping_rem(rhs.value);
                lhs = lhs.combine(rhs, value);
            }
            _ => break,
        }
    }
    Ok(lhs)
}

fn unary_expr(lexer: &mut Lexer, ctx: &mut Context) -> Result<EvalResult, ()> {
    match lexer.peek() {
        TokenKind::Plus => {
            lexer.next();
            unary_expr(lexer, ctx)
        }
        TokenKind::Minus => {
            lexer.next();
            let inner = unary_expr(lexer, ctx)?;
            Ok(EvalResult {
                value: inner.value.wrapping_neg(),
                ..inner
            })
        }
        TokenKind::Tilde => {
            lexer.next();
            let inner = unary_expr(lexer, ctx)?;
            Ok(EvalResult {
                value: !inner.value,
                ..inner
            })
        }
        TokenKind::Bang => {
            lexer.next();
            let inner = unary_expr(lexer, ctx)?;
            Ok(EvalResult {
                value: i64::from(inner.value == 0),
                ..inner
            })
        }
        _ => primary_expr(lexer, ctx),
    }
}

fn primary_expr(lexer: &mut Lexer, ctx: &mut Context) -> Result<EvalResult, ()> {
    match lexer.peek().clone() {
        TokenKind::Number(value) | TokenKind::Char(value) => {
            lexer.next();
            Ok(EvalResult::literal(value))
        }
        TokenKind::Dollar => {
            lexer.next();
            Ok(EvalResult {
                value: ctx.pc,
                known: true,
                is_constant: false,
            })
        }
        TokenKind::LParen => {
            lexer.next();
            let inner = evaluate(lexer, ctx)?;
            lexer
                .expect(&TokenKind::RParen)
                .map_err(|e| ctx.diagnostics.error(ctx.file, ctx.line, e))?;
            Ok(inner)
        }
        TokenKind::Ident(name) => {
            lexer.next();
            if let TokenKind::LParen = lexer.peek() {
                if let Some(func) = builtin(&name) {
                    lexer.next();
                    let inner = evaluate(lexer, ctx)?;
                    lexer
                        .expect(&TokenKind::RParen)
                        .map_err(|e| ctx.diagnostics.error(ctx.file, ctx.line, e))?;
                    let value = func(inner.value);
                    return Ok(EvalResult { value, ..inner });
                }
            }
            lookup_symbol(&name, ctx)
        }
        other => {
            ctx.diagnostics
                .error(ctx.file, ctx.line, format!("unexpected token {other:?} in expression"));
            Err(())
        }
    }
}

fn builtin(name: &str) -> Option<fn(i64) -> i64> {
    match name.to_ascii_uppercase().as_str() {
        "HIGH" => Some(|v| (v >> 8) & 0xFF),
        "LOW" => Some(|v| v & 0xFF),
        "BANK" => Some(|v| (v >> 16) & 0xFF),
        _ => None,
    }
}

fn lookup_symbol(name: &str, ctx: &mut Context) -> Result<EvalResult, ()> {
    ctx.symbols.mark_referenced(name);
    match ctx.symbols.lookup(name) {
        Some(sym) if sym.defined => {
            let is_constant = matches!(
                sym.kind,
                crate::symbol::SymbolKind::Equ | crate::symbol::SymbolKind::Set
            );
            Ok(EvalResult {
                value: sym.value,
                known: true,
                is_constant,
            })
        }
        Some(_) => {
            // Exists, but not (yet) defined this iteration: a label whose
            // defined-flag was reset, or a forward reference within the
            // same pass. Not an error — see the Label re-evaluation rule.
            Ok(EvalResult::unknown())
        }
        None => {
            if ctx.pass == 2 {
                ctx.diagnostics
                    .error(ctx.file, ctx.line, format!("undefined symbol '{name}'"));
                return Err(());
            }
            Ok(EvalResult::unknown())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Origin, SymbolKind};

    fn eval(line: &str, pc: i64, pass: u8, symbols: &mut SymbolTable) -> Result<EvalResult, ()> {
        let mut lexer = Lexer::tokenize(line).unwrap();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = Context {
            symbols,
            diagnostics: &mut diagnostics,
            pc,
            pass,
            file: "test.asm",
            line: 1,
        };
        evaluate(&mut lexer, &mut ctx)
    }

    #[test]
    fn precedence_mul_before_add() {
        let mut symbols = SymbolTable::new();
        let result = eval("2 + 3 * 4", 0, 1, &mut symbols).unwrap();
        assert_eq!(result.value, 14);
    }

    #[test]
    fn division_by_zero_errors() {
        let mut symbols = SymbolTable::new();
        assert!(eval("1 / 0", 0, 1, &mut symbols).is_err());
    }

    #[test]
    fn dollar_is_pc_and_not_constant() {
        let mut symbols = SymbolTable::new();
        let result = eval("$", 0x1234, 1, &mut symbols).unwrap();
        assert_eq!(result.value, 0x1234);
        assert!(!result.is_constant);
    }

    #[test]
    fn equ_symbol_is_constant() {
        let mut symbols = SymbolTable::new();
        symbols.define("VAL", SymbolKind::Equ, 0x42, Origin::new("t.asm", 1), 1);
        let result = eval("VAL", 0, 1, &mut symbols).unwrap();
        assert_eq!(result.value, 0x42);
        assert!(result.known);
        assert!(result.is_constant);
    }

    #[test]
    fn label_symbol_is_known_but_not_constant() {
        let mut symbols = SymbolTable::new();
        symbols.define("LOOP", SymbolKind::Label, 0x100, Origin::new("t.asm", 1), 1);
        let result = eval("LOOP", 0, 1, &mut symbols).unwrap();
        assert_eq!(result.value, 0x100);
        assert!(result.known);
        assert!(!result.is_constant);
    }

    #[test]
    fn undefined_symbol_in_pass_one_is_unknown_not_error() {
        let mut symbols = SymbolTable::new();
        let result = eval("NOPE", 0, 1, &mut symbols).unwrap();
        assert!(!result.known);
        assert_eq!(result.value, 0);
    }

    #[test]
    fn undefined_symbol_in_pass_two_is_an_error() {
        let mut symbols = SymbolTable::new();
        assert!(eval("NOPE", 0, 2, &mut symbols).is_err());
    }

    #[test]
    fn high_low_bank_builtins() {
        let mut symbols = SymbolTable::new();
        assert_eq!(eval("HIGH($1234)", 0, 1, &mut symbols).unwrap().value, 0x12);
        assert_eq!(eval("LOW($1234)", 0, 1, &mut symbols).unwrap().value, 0x34);
        assert_eq!(eval("BANK($123456)", 0, 1, &mut symbols).unwrap().value, 0x12);
    }
}
