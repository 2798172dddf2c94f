//! `LD` and its block/exchange relatives.
//!
//! `LD` alone covers register-immediate, register-memory, memory-immediate
//! and register-register forms; the compact direct-address encodings
//! (`0x08`, `0xF1`, `0xF2`, and the `0x40+code` 32-bit immediate form) are
//! the ones the worked examples pin down exactly. Everything else in this
//! family funnels through the generic memory-addressing prefixes.

use super::{emit_address, memory_mode, reg_op, resolve_address_width, EncodeContext, Op};
use crate::assembler::operand::{AddressingMode, Operand};
use crate::register::RegisterWidth;

const MEM_PREFIX_BYTE: u8 = 0x80;
const MEM_PREFIX_WORD: u8 = 0x90;
const MEM_PREFIX_LONG: u8 = 0xA0;

/// `LD`'s two-operand forms, resolved purely from the operand shapes the
/// parser already normalized.
fn encode_ld(operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let (dst, src) = match operands {
        [dst, src] => (dst, src),
        _ => {
            ctx.error("LD requires exactly two operands");
            return Err(());
        }
    };

    match (&dst.mode, &src.mode) {
        // LD r8, imm8 / LD rr, imm16 / LD xrr, imm32 — register destination,
        // immediate source.
        (AddressingMode::Register, AddressingMode::Immediate) => {
            let reg = dst.register.unwrap();
            match reg.width() {
                RegisterWidth::Byte => {
                    let code = reg.byte_code().ok_or(()).map_err(|_| {
                        ctx.error("this byte register has no LD r8,imm8 encoding")
                    })?;
                    if code > 7 {
                        ctx.error("LD r8,imm8 only supports W,A,B,C,D,E,H,L");
                        return Err(());
                    }
                    ctx.emit(0x20 + code);
                    ctx.emit(src.value as u8);
                }
                RegisterWidth::Word => {
                    let code = reg.word_code().unwrap();
                    if (0..=7).contains(&src.value) && src.known && src.is_constant {
                        ctx.emit(0x50 + code);
                        ctx.emit(src.value as u8);
                    } else {
                        ctx.emit(0x30 + code);
                        ctx.emit_le16(src.value);
                    }
                }
                RegisterWidth::Long => {
                    let code = reg.long_code().unwrap();
                    ctx.emit(0x40 + code);
                    ctx.emit_le32(src.value);
                }
                RegisterWidth::Special => {
                    ctx.error("this special register has no immediate-load encoding");
                    return Err(());
                }
            }
            Ok(())
        }

        // LD reg, (direct address) — the compact load family.
        (AddressingMode::Register, AddressingMode::Direct) => {
            let reg = dst.register.unwrap();
            let width = resolve_address_width(src);
            let size_code = match width {
                8 => 0,
                16 => 1,
                _ => 2,
            };
            match reg.width() {
                RegisterWidth::Byte => {
                    let code = reg.byte_code().ok_or(()).map_err(|_| ctx.error("bad register"))?;
                    ctx.emit(0xC0);
                    ctx.emit((code << 2) | size_code);
                }
                RegisterWidth::Word => {
                    let code = reg.word_code().unwrap();
                    ctx.emit(0xD0);
                    ctx.emit((code << 2) | size_code);
                }
                RegisterWidth::Long => {
                    let code = reg.long_code().unwrap();
                    ctx.emit(0xE0);
                    ctx.emit((code << 2) | size_code);
                }
                RegisterWidth::Special => {
                    ctx.error("cannot load a special register from a direct address");
                    return Err(());
                }
            }
            emit_address(ctx, width, src.value);
            Ok(())
        }

        // LD (direct address), imm8 — the three fixed compact stores; this
        // is the only size the worked examples exercise for an immediate
        // store to a fixed address.
        (AddressingMode::Direct, AddressingMode::Immediate) => {
            let width = resolve_address_width(dst);
            match width {
                8 => {
                    ctx.emit(0x08);
                    ctx.emit(dst.value as u8);
                    ctx.emit(src.value as u8);
                }
                16 => {
                    // The 16-bit-selected store still carries a 3-byte
                    // address field (zero-extended) — only the 8-bit
                    // compact form (`0x08`) truly shrinks the field width.
                    ctx.emit(0xF1);
                    ctx.emit_le24(dst.value);
                    ctx.emit(src.value as u8);
                }
                _ => {
                    ctx.emit(0xF2);
                    ctx.emit_le24(dst.value);
                    ctx.emit(src.value as u8);
                }
            }
            Ok(())
        }

        // LD reg, (mem) / LD (mem), reg — everything else routes through
        // the generic memory-addressing prefixes, sized by the register.
        (AddressingMode::Register, _mem) => {
            let reg = dst.register.unwrap();
            encode_mem_transfer(ctx, reg, src, Direction::Load)
        }
        (_mem, AddressingMode::Register) => {
            let reg = src.register.unwrap();
            encode_mem_transfer(ctx, reg, dst, Direction::Store)
        }

        // LD reg, reg — plain register-register move.
        (AddressingMode::Register, AddressingMode::Register) => {
            let (dst_reg, src_reg) = (dst.register.unwrap(), src.register.unwrap());
            reg_op(ctx, dst_reg, 0x15)?;
            match src_reg.width() {
                RegisterWidth::Byte => ctx.emit(src_reg.byte_code().unwrap_or(0)),
                RegisterWidth::Word => ctx.emit(src_reg.word_code().unwrap_or(0)),
                RegisterWidth::Long => ctx.emit(src_reg.long_code().unwrap_or(0)),
                RegisterWidth::Special => {
                    ctx.error("cannot move from this special register");
                    return Err(());
                }
            }
            Ok(())
        }

        _ => {
            ctx.error("unsupported LD operand combination");
            Err(())
        }
    }
}

enum Direction {
    Load,
    Store,
}

fn encode_mem_transfer(
    ctx: &mut EncodeContext,
    reg: crate::register::Register,
    mem: &Operand,
    direction: Direction,
) -> Result<(), ()> {
    let (mode_byte, extra) = memory_mode(ctx, mem)?;
    let prefix = match reg.width() {
        RegisterWidth::Byte => MEM_PREFIX_BYTE,
        RegisterWidth::Word => MEM_PREFIX_WORD,
        RegisterWidth::Long => MEM_PREFIX_LONG,
        RegisterWidth::Special => {
            ctx.error("cannot transfer a special register through memory");
            return Err(());
        }
    };
    ctx.emit(prefix + mode_byte);
    let reg_code = match reg.width() {
        RegisterWidth::Byte => reg.byte_code().unwrap_or(0),
        RegisterWidth::Word => reg.word_code().unwrap_or(0),
        RegisterWidth::Long => reg.long_code().unwrap_or(0),
        RegisterWidth::Special => unreachable!(),
    };
    let op_byte = match direction {
        Direction::Load => 0x00 | reg_code,
        Direction::Store => 0x40 | reg_code,
    };
    ctx.emit(op_byte);
    ctx.emit_bytes(&extra);
    Ok(())
}

fn encode_lda(operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let (dst, src) = match operands {
        [dst, src] => (dst, src),
        _ => {
            ctx.error("LDA requires exactly two operands");
            return Err(());
        }
    };
    let reg = dst.register.ok_or(()).map_err(|_| {
        ctx.error("LDA destination must be a 32-bit register")
    })?;
    let code = reg.long_code().ok_or(()).map_err(|_| {
        ctx.error("LDA destination must be a 32-bit register")
    })?;
    let (mode_byte, extra) = memory_mode(ctx, src)?;
    ctx.emit(0xF0);
    ctx.emit(code);
    ctx.emit(mode_byte);
    ctx.emit_bytes(&extra);
    Ok(())
}

/// `LDC dst, src` — loads/stores a control register at whatever width the
/// operand was written at; there is no implicit widening, so an operand
/// size this register has no encoding for is a hard error rather than a
/// silent truncation.
fn encode_ldc(operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let (dst, src) = match operands {
        [dst, src] => (dst, src),
        _ => {
            ctx.error("LDC requires exactly two operands");
            return Err(());
        }
    };
    if let Some(reg) = dst.register {
        let code = match reg.width() {
            RegisterWidth::Byte => reg.byte_code(),
            RegisterWidth::Word => reg.word_code(),
            RegisterWidth::Long => reg.long_code(),
            RegisterWidth::Special => None,
        };
        let code = code.ok_or(()).map_err(|_| {
            ctx.error(format!("{reg:?} has no encoding at this operand width"))
        })?;
        ctx.emit(0x16);
        ctx.emit(code);
        ctx.emit(src.value as u8);
        Ok(())
    } else {
        ctx.error("LDC destination must be a register");
        Err(())
    }
}

/// The `LDI`/`LDIR`/`LDD`/`LDDR` block-move family, plus their `W`
/// (word-granular) variants, and `LDW`/`EX`. These are implicit-operand
/// instructions (they work through `XHL`/`XDE`/`BC` by convention), so
/// they encode as a fixed two-byte sequence with no operand bytes.
fn encode_block_or_exchange(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let base = match op {
        Op::Ldi => 0x17,
        Op::Ldir => 0x18,
        Op::Ldiw => 0x19,
        Op::Ldirw => 0x1A,
        Op::Ldd => 0x1B,
        Op::Lddr => 0x1E,
        Op::Lddw => 0x1F,
        Op::Lddrw => 0x46,
        Op::Ldw => 0x81,
        Op::Ex => 0x91,
        _ => unreachable!("encode_block_or_exchange called with unrelated op"),
    };
    ctx.emit(0xB8);
    ctx.emit(base);

    if matches!(op, Op::Ldw | Op::Ex) {
        // LDW/EX additionally take two register (or register+memory)
        // operands; encode them through the generic memory path when one
        // side is memory, otherwise as a plain register pair.
        if let [a, b] = operands {
            if let (Some(ra), Some(rb)) = (a.register, b.register) {
                let ca = ra.word_code().or(ra.long_code()).unwrap_or(0);
                let cb = rb.word_code().or(rb.long_code()).unwrap_or(0);
                ctx.emit(ca);
                ctx.emit(cb);
            } else if a.register.is_some() {
                let reg = a.register.unwrap();
                encode_mem_transfer(ctx, reg, b, Direction::Load)?;
            } else if b.register.is_some() {
                let reg = b.register.unwrap();
                encode_mem_transfer(ctx, reg, a, Direction::Store)?;
            }
        }
    }

    Ok(())
}

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    match op {
        Op::Ld => encode_ld(operands, ctx),
        Op::Lda => encode_lda(operands, ctx),
        Op::Ldc => encode_ldc(operands, ctx),
        Op::Ldi | Op::Ldir | Op::Ldiw | Op::Ldirw | Op::Ldd | Op::Lddr | Op::Lddw | Op::Lddrw
        | Op::Ldw | Op::Ex => encode_block_or_exchange(op, operands, ctx),
        _ => unreachable!("data::encode called with non-data op"),
    }
}
