//! Instruction encoder: dispatch table keyed by mnemonic, plus the shared
//! addressing-mode/emission machinery every family module builds on.
//!
//! Each encoder is a pure function over `(&mut EncodeContext, &[Operand])`
//! mirroring the closed, exhaustive dispatch the design calls for — the
//! mnemonic is resolved to an [`Op`] once, up front, and every family
//! function downstream matches on typed operands rather than strings.

use crate::diagnostics::Diagnostics;
use crate::register::Register;

use super::operand::{AddressingMode, Operand};
use super::sink::OutputSink;

pub mod arithmetic;
pub mod bit;
pub mod branch;
pub mod data;
pub mod logical;
pub mod shift;
pub mod stack;
pub mod system;

/// Every mnemonic the design names in its instruction surface. Mnemonic
/// text is resolved to a variant once, case-insensitively, up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    Ei,
    Di,
    Halt,
    Scf,
    Rcf,
    Ccf,
    Zcf,
    Swi,
    Push,
    PushW,
    Pop,
    Link,
    Unlk,
    Ret,
    Reti,
    Retd,
    Jp,
    Jr,
    Jrl,
    Call,
    Calr,
    Djnz,
    Ld,
    Lda,
    Ldc,
    Ldi,
    Ldir,
    Ldiw,
    Ldirw,
    Ldd,
    Lddr,
    Lddw,
    Lddrw,
    Ldw,
    Ex,
    Add,
    Addw,
    Adc,
    Sub,
    Sbc,
    Cp,
    Cpw,
    Inc,
    Incw,
    Dec,
    Decw,
    Neg,
    Mul,
    Muls,
    Div,
    Divs,
    Daa,
    And,
    Andw,
    Or,
    Orw,
    Xor,
    Xorw,
    Cpl,
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
    Bit,
    Set,
    Res,
    Tset,
    Chg,
    Stcf,
    Ldcf,
    Xorcf,
    Bs1b,
    Bs1f,
    Extz,
    Exts,
    Scc,
}

/// Case-insensitive lookup into the ~80-entry mnemonic table. A linear scan
/// — this is not a hot path.
pub fn lookup_mnemonic(name: &str) -> Option<Op> {
    use Op::*;
    let upper = name.to_ascii_uppercase();
    Some(match upper.as_str() {
        "NOP" => Nop,
        "EI" => Ei,
        "DI" => Di,
        "HALT" => Halt,
        "SCF" => Scf,
        "RCF" => Rcf,
        "CCF" => Ccf,
        "ZCF" => Zcf,
        "SWI" => Swi,
        "PUSH" => Push,
        "PUSHW" => PushW,
        "POP" => Pop,
        "LINK" => Link,
        "UNLK" => Unlk,
        "RET" => Ret,
        "RETI" => Reti,
        "RETD" => Retd,
        "JP" => Jp,
        "JR" => Jr,
        "JRL" => Jrl,
        "CALL" => Call,
        "CALR" => Calr,
        "DJNZ" => Djnz,
        "LD" => Ld,
        "LDA" => Lda,
        "LDC" => Ldc,
        "LDI" => Ldi,
        "LDIR" => Ldir,
        "LDIW" => Ldiw,
        "LDIRW" => Ldirw,
        "LDD" => Ldd,
        "LDDR" => Lddr,
        "LDDW" => Lddw,
        "LDDRW" => Lddrw,
        "LDW" => Ldw,
        "EX" => Ex,
        "ADD" => Add,
        "ADDW" => Addw,
        "ADC" => Adc,
        "SUB" => Sub,
        "SBC" => Sbc,
        "CP" => Cp,
        "CPW" => Cpw,
        "INC" => Inc,
        "INCW" => Incw,
        "DEC" => Dec,
        "DECW" => Decw,
        "NEG" => Neg,
        "MUL" => Mul,
        "MULS" => Muls,
        "DIV" => Div,
        "DIVS" => Divs,
        "DAA" => Daa,
        "AND" => And,
        "ANDW" => Andw,
        "OR" => Or,
        "ORW" => Orw,
        "XOR" => Xor,
        "XORW" => Xorw,
        "CPL" => Cpl,
        "RLC" => Rlc,
        "RRC" => Rrc,
        "RL" => Rl,
        "RR" => Rr,
        "SLA" => Sla,
        "SRA" => Sra,
        "SLL" => Sll,
        "SRL" => Srl,
        "BIT" => Bit,
        "SET" => Set,
        "RES" => Res,
        "TSET" => Tset,
        "CHG" => Chg,
        "STCF" => Stcf,
        "LDCF" => Ldcf,
        "XORCF" => Xorcf,
        "BS1B" => Bs1b,
        "BS1F" => Bs1f,
        "EXTZ" => Extz,
        "EXTS" => Exts,
        "SCC" => Scc,
        _ => return None,
    })
}

/// Mutable state threaded through every encoder: the sink, the live PC
/// (advanced by every `emit`, regardless of pass — only the sink's writes
/// are pass-gated), and enough diagnostic context to report a failure.
pub struct EncodeContext<'a> {
    pub sink: &'a mut OutputSink,
    pub pc: &'a mut i64,
    pub diagnostics: &'a mut Diagnostics,
    pub file: &'a str,
    pub line: usize,
    pub pass: u8,
    pub sizing_pass: bool,
    pub max_mode: bool,
}

impl EncodeContext<'_> {
    pub fn emit(&mut self, byte: u8) {
        self.sink.write_at(*self.pc, byte, self.file, self.line);
        *self.pc += 1;
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.emit(b);
        }
    }

    pub fn emit_le16(&mut self, value: i64) {
        self.emit(value as u8);
        self.emit((value >> 8) as u8);
    }

    pub fn emit_le24(&mut self, value: i64) {
        self.emit(value as u8);
        self.emit((value >> 8) as u8);
        self.emit((value >> 16) as u8);
    }

    pub fn emit_le32(&mut self, value: i64) {
        self.emit(value as u8);
        self.emit((value >> 8) as u8);
        self.emit((value >> 16) as u8);
        self.emit((value >> 24) as u8);
    }

    pub fn error(&mut self, message: impl std::fmt::Display) {
        self.diagnostics.error(self.file, self.line, message);
    }
}

/// Resolves the direct-address field width (8/16/24), per §4.2: an
/// explicit `:N` suffix always wins; otherwise the magnitude picks the
/// shortest form, but only `is_constant` values may shrink below 24 bits —
/// an unresolved value (sizing pass, or a forward reference) must take the
/// conservative maximal form so relaxation stays monotone.
pub fn resolve_address_width(op: &Operand) -> u8 {
    if op.address_size_hint != 0 {
        return op.address_size_hint;
    }
    if !op.known {
        return 24;
    }
    if op.value >= 0 && op.value <= 0xFF && op.is_constant {
        8
    } else if op.value >= 0 && op.value <= 0xFFFF {
        16
    } else {
        24
    }
}

pub fn emit_address(ctx: &mut EncodeContext, width: u8, value: i64) {
    match width {
        8 => ctx.emit(value as u8),
        16 => ctx.emit_le16(value),
        _ => ctx.emit_le24(value),
    }
}

/// The addressing-mode byte for register-relative memory operands (simple
/// indirect, pre/post-inc, 8/16-bit indexed, the direct forms, and
/// register-indexed), merged into a single byte with its data-size prefix
/// since every register the parser accepts here is one of the eight
/// primary 32-bit registers that the compact encoding covers.
pub fn memory_mode(ctx: &mut EncodeContext, op: &Operand) -> Result<(u8, Vec<u8>), ()> {
    match &op.mode {
        AddressingMode::RegIndirect => {
            let idx = primary_index(ctx, op.register)?;
            Ok((idx, Vec::new()))
        }
        AddressingMode::RegIndirectPostInc => {
            let idx = primary_index(ctx, op.register)?;
            Ok((0x08 + idx, Vec::new()))
        }
        AddressingMode::RegIndirectPreDec => {
            let idx = primary_index(ctx, op.register)?;
            Ok((0x10 + idx, Vec::new()))
        }
        AddressingMode::Indexed { displacement } => {
            let idx = primary_index(ctx, op.register)?;
            if *displacement >= -128 && *displacement <= 127 {
                Ok((0x18 + idx, vec![*displacement as u8]))
            } else {
                let mut bytes = Vec::with_capacity(2);
                bytes.push(*displacement as u8);
                bytes.push((*displacement >> 8) as u8);
                Ok((0x20 + idx, bytes))
            }
        }
        AddressingMode::IndexedReg { index } => {
            let idx = primary_index(ctx, op.register)?;
            let reg_byte = index.word_code().or(index.byte_code()).unwrap_or(0);
            Ok((0x28 + idx, vec![reg_byte]))
        }
        AddressingMode::Direct => {
            let width = resolve_address_width(op);
            let mut bytes = Vec::with_capacity(3);
            match width {
                8 => bytes.push(op.value as u8),
                16 => {
                    bytes.push(op.value as u8);
                    bytes.push((op.value >> 8) as u8);
                }
                _ => {
                    bytes.push(op.value as u8);
                    bytes.push((op.value >> 8) as u8);
                    bytes.push((op.value >> 16) as u8);
                }
            }
            let mode = match width {
                8 => 0x3C,
                16 => 0x3D,
                _ => 0x3E,
            };
            Ok((mode, bytes))
        }
        other => {
            ctx.error(format!("unsupported memory addressing mode {other:?}"));
            Err(())
        }
    }
}

fn primary_index(ctx: &mut EncodeContext, reg: Option<Register>) -> Result<u8, ()> {
    match reg.and_then(Register::long_code) {
        Some(code) => Ok(code),
        None => {
            ctx.error("addressing mode requires a 32-bit register");
            Err(())
        }
    }
}

/// Top-level dispatch: resolves the mnemonic, then hands off to the family
/// encoder. Returns `Err(())` on an unsupported operand combination — the
/// error is already reported, PC is not advanced, and the caller moves on
/// to the next line.
pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    use Op::*;
    match op {
        Nop | Ei | Di | Halt | Scf | Rcf | Ccf | Zcf | Swi => {
            system::encode(op, operands, ctx)
        }
        Push | PushW | Pop | Link | Unlk => stack::encode(op, operands, ctx),
        Ret | Reti | Retd | Jp | Jr | Jrl | Call | Calr | Djnz => {
            branch::encode(op, operands, ctx)
        }
        Ld | Lda | Ldc | Ldi | Ldir | Ldiw | Ldirw | Ldd | Lddr | Lddw | Lddrw | Ldw | Ex => {
            data::encode(op, operands, ctx)
        }
        Add | Addw | Adc | Sub | Sbc | Cp | Cpw | Inc | Incw | Dec | Decw | Neg | Mul | Muls
        | Div | Divs | Daa => arithmetic::encode(op, operands, ctx),
        And | Andw | Or | Orw | Xor | Xorw | Cpl => logical::encode(op, operands, ctx),
        Rlc | Rrc | Rl | Rr | Sla | Sra | Sll | Srl => shift::encode(op, operands, ctx),
        Bit | Set | Res | Tset | Chg | Stcf | Ldcf | Xorcf | Bs1b | Bs1f | Extz | Exts | Scc => {
            bit::encode(op, operands, ctx)
        }
    }
}

/// Shared by the arithmetic/logical families: `op dst, src` where `dst` is
/// always a register and `src` is a register, immediate, or memory
/// operand. The three shapes share one op-byte tag (`base`) carried
/// through whichever prefix family the source operand picks.
pub fn alu_two_operand(ctx: &mut EncodeContext, base: u8, operands: &[Operand]) -> Result<(), ()> {
    let (dst, src) = match operands {
        [dst, src] => (dst, src),
        _ => {
            ctx.error("expected exactly two operands");
            return Err(());
        }
    };
    let dst_reg = dst.register.ok_or(()).map_err(|_| {
        ctx.error("destination must be a register");
    })?;

    match &src.mode {
        AddressingMode::Immediate => {
            reg_op(ctx, dst_reg, base)?;
            emit_sized_immediate(ctx, dst_reg, src.value);
            Ok(())
        }
        AddressingMode::Register => {
            reg_op(ctx, dst_reg, base | 0x80)?;
            let src_reg = src.register.unwrap();
            ctx.emit(register_code(src_reg));
            Ok(())
        }
        _ => {
            let (mode_byte, extra) = memory_mode(ctx, src)?;
            let prefix = match dst_reg.width() {
                crate::register::RegisterWidth::Byte => 0x80,
                crate::register::RegisterWidth::Word => 0x90,
                crate::register::RegisterWidth::Long => 0xA0,
                crate::register::RegisterWidth::Special => {
                    ctx.error("special registers cannot take a memory operand here");
                    return Err(());
                }
            };
            ctx.emit(prefix + mode_byte);
            ctx.emit(base);
            ctx.emit_bytes(&extra);
            Ok(())
        }
    }
}

fn emit_sized_immediate(ctx: &mut EncodeContext, reg: Register, value: i64) {
    use crate::register::RegisterWidth::*;
    match reg.width() {
        Byte | Special => ctx.emit(value as u8),
        Word => ctx.emit_le16(value),
        Long => ctx.emit_le32(value),
    }
}

fn register_code(reg: Register) -> u8 {
    reg.byte_code()
        .or_else(|| reg.word_code())
        .or_else(|| reg.long_code())
        .unwrap_or(0)
}

/// Shared by the single-operand register forms (`INC`, `DEC`, `NEG`,
/// `CPL`, ...): register operand routes through the register-kinded
/// prefix family, memory operand through the generic addressing prefixes.
pub fn single_operand(ctx: &mut EncodeContext, base: u8, operands: &[Operand]) -> Result<(), ()> {
    let operand = match operands.first() {
        Some(op) => op,
        None => {
            ctx.error("expected one operand");
            return Err(());
        }
    };
    if let Some(reg) = operand.register {
        reg_op(ctx, reg, base)
    } else {
        let (mode_byte, extra) = memory_mode(ctx, operand)?;
        ctx.emit(0x80 + mode_byte);
        ctx.emit(base);
        ctx.emit_bytes(&extra);
        Ok(())
    }
}

/// Shared by every family that has a single implicit register operand
/// (`INC reg`, `PUSH reg`, `DJNZ reg, label`, ...): the byte/word/long
/// register-kinded prefix families from §4.2, disambiguated purely by the
/// register's width.
pub fn reg_op(ctx: &mut EncodeContext, reg: Register, base_op: u8) -> Result<(), ()> {
    use crate::register::RegisterWidth::*;
    match reg.width() {
        Byte => {
            let (pair, elem) = reg.byte_pair().ok_or(())?;
            ctx.emit(0xC8 + pair);
            ctx.emit(base_op | elem);
            Ok(())
        }
        Word => {
            let code = reg.word_code().ok_or(())?;
            ctx.emit(0xD8 + code);
            ctx.emit(base_op);
            Ok(())
        }
        Long => {
            let code = reg.long_code().ok_or(())?;
            ctx.emit(0xE8 + code);
            ctx.emit(base_op);
            Ok(())
        }
        Special => {
            ctx.error("this operation does not support special registers");
            Err(())
        }
    }
}
