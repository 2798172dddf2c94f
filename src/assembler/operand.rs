//! Operand parsing: turns a token stream into a typed [`Operand`] record.
//!
//! Addressing modes are a tagged union with per-variant payloads, rather
//! than one flat struct with fields that only make sense for some variants
//! — an index register on an `Immediate` operand is simply unrepresentable.

use crate::expr::{evaluate, Context, EvalResult};
use crate::lexer::{Lexer, TokenKind};
use crate::register::{Condition, Register};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    None,
    Byte,
    Word,
    Long,
}

impl Size {
    pub fn bytes(self) -> usize {
        match self {
            Size::None => 0,
            Size::Byte => 1,
            Size::Word => 2,
            Size::Long => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddressingMode {
    Immediate,
    Register,
    RegIndirect,
    RegIndirectPostInc,
    RegIndirectPreDec,
    Indexed { displacement: i64 },
    IndexedReg { index: Register },
    Direct,
    Relative,
    Bit { bit: i64 },
    Condition(Condition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub mode: AddressingMode,
    pub size: Size,
    pub register: Option<Register>,
    pub index_register: Option<Register>,
    pub value: i64,
    pub known: bool,
    pub is_constant: bool,
    /// Explicit `:8`/`:16`/`:24` address-size hint; 0 means "auto".
    pub address_size_hint: u8,
    pub unresolved_name: Option<String>,
}

impl Operand {
    fn immediate(eval: EvalResult, size: Size) -> Self {
        Operand {
            mode: AddressingMode::Immediate,
            size,
            register: None,
            index_register: None,
            value: eval.value,
            known: eval.known,
            is_constant: eval.is_constant,
            address_size_hint: 0,
            unresolved_name: None,
        }
    }

    fn register(reg: Register) -> Self {
        Operand {
            mode: AddressingMode::Register,
            size: Size::None,
            register: Some(reg),
            index_register: None,
            value: 0,
            known: true,
            is_constant: true,
            address_size_hint: 0,
            unresolved_name: None,
        }
    }

    fn condition(cond: Condition) -> Self {
        Operand {
            mode: AddressingMode::Condition(cond),
            size: Size::None,
            register: None,
            index_register: None,
            value: 0,
            known: true,
            is_constant: true,
            address_size_hint: 0,
            unresolved_name: None,
        }
    }

    /// Re-tags a generically-parsed `Immediate` as a bit index, once the
    /// caller knows (from the mnemonic) that this operand position names a
    /// bit rather than a plain value. `parse_operand` has no mnemonic
    /// context of its own to make that call up front.
    pub fn retag_as_bit(&mut self) {
        if self.mode == AddressingMode::Immediate {
            self.mode = AddressingMode::Bit { bit: self.value };
        }
    }

    /// Re-tags a generically-parsed `Immediate` (a label reference or a
    /// literal offset) as a PC-relative branch target, for the same reason.
    pub fn retag_as_relative(&mut self) {
        if self.mode == AddressingMode::Immediate {
            self.mode = AddressingMode::Relative;
        }
    }
}

/// Parses an optional `:8`/`:16`/`:24` address-size suffix following an
/// expression inside parentheses.
fn parse_size_suffix(lexer: &mut Lexer, ctx: &mut Context) -> Result<u8, ()> {
    if lexer.peek() == &TokenKind::Colon {
        lexer.next();
        let eval = evaluate(lexer, ctx)?;
        match eval.value {
            8 | 16 | 24 => Ok(eval.value as u8),
            other => {
                ctx.diagnostics
                    .error(ctx.file, ctx.line, format!("invalid address size ':{other}'"));
                Err(())
            }
        }
    } else {
        Ok(0)
    }
}

/// Parses one operand. `implied_size` is the operand size carried by the
/// mnemonic (e.g. the `W` in `ADDW`), used when the operand itself doesn't
/// pin one down (memory operands take their size from the instruction).
pub fn parse_operand(
    lexer: &mut Lexer,
    ctx: &mut Context,
    implied_size: Size,
) -> Result<Operand, ()> {
    match lexer.peek().clone() {
        TokenKind::Hash => {
            lexer.next();
            let eval = evaluate(lexer, ctx)?;
            Ok(Operand::immediate(eval, implied_size))
        }
        TokenKind::LParen => parse_memory_operand(lexer, ctx, implied_size),
        TokenKind::Ident(name) => parse_register_or_condition_or_immediate(lexer, ctx, &name, implied_size),
        _ => {
            let eval = evaluate(lexer, ctx)?;
            Ok(Operand::immediate(eval, implied_size))
        }
    }
}

fn parse_register_or_condition_or_immediate(
    lexer: &mut Lexer,
    ctx: &mut Context,
    name: &str,
    implied_size: Size,
) -> Result<Operand, ()> {
    let as_register = Register::parse(name);
    let as_condition = Condition::parse(name);

    match (as_register, as_condition) {
        (Some(reg), Some(cond)) => {
            // Ambiguous spelling (e.g. "C"): consume it, then peek past a
            // following comma to decide register-vs-condition.
            lexer.next();
            if lexer.peek() == &TokenKind::Comma {
                let after_comma = lexer.mark();
                lexer.next();
                let looks_like_operand = matches!(
                    lexer.peek(),
                    TokenKind::LParen
                        | TokenKind::Hash
                        | TokenKind::Dollar
                        | TokenKind::Number(_)
                        | TokenKind::Char(_)
                ) || matches!(lexer.peek(), TokenKind::Ident(id) if Register::parse(id).is_some());
                lexer.restore(after_comma);
                if looks_like_operand {
                    Ok(Operand::register(reg))
                } else {
                    Ok(Operand::condition(cond))
                }
            } else {
                Ok(Operand::register(reg))
            }
        }
        (Some(reg), None) => {
            lexer.next();
            Ok(Operand::register(reg))
        }
        (None, Some(cond)) => {
            lexer.next();
            Ok(Operand::condition(cond))
        }
        (None, None) => {
            let eval = evaluate(lexer, ctx)?;
            Ok(Operand::immediate(eval, implied_size))
        }
    }
}

fn parse_memory_operand(
    lexer: &mut Lexer,
    ctx: &mut Context,
    implied_size: Size,
) -> Result<Operand, ()> {
    lexer.next(); // consume '('

    // (-reg)
    if lexer.peek() == &TokenKind::Minus {
        let mark = lexer.mark();
        lexer.next();
        if let TokenKind::Ident(name) = lexer.peek().clone() {
            if let Some(reg) = Register::parse(&name) {
                lexer.next();
                lexer
                    .expect(&TokenKind::RParen)
                    .map_err(|e| ctx.diagnostics.error(ctx.file, ctx.line, e))?;
                return Ok(Operand {
                    mode: AddressingMode::RegIndirectPreDec,
                    size: implied_size,
                    register: Some(reg),
                    index_register: None,
                    value: 0,
                    known: true,
                    is_constant: true,
                    address_size_hint: 0,
                    unresolved_name: None,
                });
            }
        }
        lexer.restore(mark);
    }

    // (reg+), (reg+expr[:N]), (reg-expr[:N]), (reg)
    if let TokenKind::Ident(name) = lexer.peek().clone() {
        if let Some(reg) = Register::parse(&name) {
            let mark = lexer.mark();
            lexer.next();
            match lexer.peek().clone() {
                TokenKind::Plus => {
                    lexer.next();
                    if lexer.peek() == &TokenKind::RParen {
                        lexer.next();
                        return Ok(Operand {
                            mode: AddressingMode::RegIndirectPostInc,
                            size: implied_size,
                            register: Some(reg),
                            index_register: None,
                            value: 0,
                            known: true,
                            is_constant: true,
                            address_size_hint: 0,
                            unresolved_name: None,
                        });
                    }
                    let eval = evaluate(lexer, ctx)?;
                    let hint = parse_size_suffix(lexer, ctx)?;
                    lexer
                        .expect(&TokenKind::RParen)
                        .map_err(|e| ctx.diagnostics.error(ctx.file, ctx.line, e))?;
                    return Ok(Operand {
                        mode: AddressingMode::Indexed {
                            displacement: eval.value,
                        },
                        size: implied_size,
                        register: Some(reg),
                        index_register: None,
                        value: eval.value,
                        known: eval.known,
                        is_constant: eval.is_constant,
                        address_size_hint: hint,
                        unresolved_name: None,
                    });
                }
                TokenKind::Minus => {
                    lexer.next();
                    let eval = evaluate(lexer, ctx)?;
                    let hint = parse_size_suffix(lexer, ctx)?;
                    lexer
                        .expect(&TokenKind::RParen)
                        .map_err(|e| ctx.diagnostics.error(ctx.file, ctx.line, e))?;
                    return Ok(Operand {
                        mode: AddressingMode::Indexed {
                            displacement: eval.value.wrapping_neg(),
                        },
                        size: implied_size,
                        register: Some(reg),
                        index_register: None,
                        value: eval.value.wrapping_neg(),
                        known: eval.known,
                        is_constant: eval.is_constant,
                        address_size_hint: hint,
                        unresolved_name: None,
                    });
                }
                TokenKind::RParen => {
                    lexer.next();
                    return Ok(Operand {
                        mode: AddressingMode::RegIndirect,
                        size: implied_size,
                        register: Some(reg),
                        index_register: None,
                        value: 0,
                        known: true,
                        is_constant: true,
                        address_size_hint: 0,
                        unresolved_name: None,
                    });
                }
                TokenKind::Ident(idx_name) if Register::parse(&idx_name).is_some() => {
                    lexer.next();
                    lexer
                        .expect(&TokenKind::RParen)
                        .map_err(|e| ctx.diagnostics.error(ctx.file, ctx.line, e))?;
                    let idx = Register::parse(&idx_name).unwrap();
                    return Ok(Operand {
                        mode: AddressingMode::IndexedReg { index: idx },
                        size: implied_size,
                        register: Some(reg),
                        index_register: Some(idx),
                        value: 0,
                        known: true,
                        is_constant: true,
                        address_size_hint: 0,
                        unresolved_name: None,
                    });
                }
                _ => {
                    lexer.restore(mark);
                }
            }
        }
    }

    // (expr[:N]) — direct memory
    let eval = evaluate(lexer, ctx)?;
    let hint = parse_size_suffix(lexer, ctx)?;
    lexer
        .expect(&TokenKind::RParen)
        .map_err(|e| ctx.diagnostics.error(ctx.file, ctx.line, e))?;
    Ok(Operand {
        mode: AddressingMode::Direct,
        size: implied_size,
        register: None,
        index_register: None,
        value: eval.value,
        known: eval.known,
        is_constant: eval.is_constant,
        address_size_hint: hint,
        unresolved_name: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::symbol::SymbolTable;

    fn parse(line: &str) -> Operand {
        let mut lexer = Lexer::tokenize(line).unwrap();
        let mut symbols = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let mut ctx = Context {
            symbols: &mut symbols,
            diagnostics: &mut diagnostics,
            pc: 0,
            pass: 1,
            file: "t.asm",
            line: 1,
        };
        parse_operand(&mut lexer, &mut ctx, Size::Byte).unwrap()
    }

    #[test]
    fn parses_immediate() {
        let op = parse("#$37");
        assert_eq!(op.mode, AddressingMode::Immediate);
        assert_eq!(op.value, 0x37);
    }

    #[test]
    fn parses_register_indirect() {
        let op = parse("(XHL)");
        assert_eq!(op.mode, AddressingMode::RegIndirect);
        assert_eq!(op.register, Some(Register::XHL));
    }

    #[test]
    fn parses_pre_decrement() {
        let op = parse("(-XSP)");
        assert_eq!(op.mode, AddressingMode::RegIndirectPreDec);
    }

    #[test]
    fn parses_post_increment() {
        let op = parse("(XIX+)");
        assert_eq!(op.mode, AddressingMode::RegIndirectPostInc);
    }

    #[test]
    fn parses_indexed_displacement() {
        let op = parse("(XIX+4)");
        assert_eq!(op.mode, AddressingMode::Indexed { displacement: 4 });
    }

    #[test]
    fn parses_direct_memory() {
        let op = parse("($1234)");
        assert_eq!(op.mode, AddressingMode::Direct);
        assert_eq!(op.value, 0x1234);
    }

    #[test]
    fn parses_direct_memory_with_size_hint() {
        let op = parse("($42:8)");
        assert_eq!(op.address_size_hint, 8);
    }

    #[test]
    fn parses_plain_register() {
        let op = parse("XWA");
        assert_eq!(op.mode, AddressingMode::Register);
        assert_eq!(op.register, Some(Register::XWA));
    }
}
