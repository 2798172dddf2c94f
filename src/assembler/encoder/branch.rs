//! Control-flow transfer: conditional/unconditional jumps and calls,
//! relative branches, returns, and the register-counted `DJNZ` loop.
//!
//! Condition codes live in the low nibble of `JR`/`JRL`'s opcode byte and
//! in a dedicated byte alongside the address-size selector for `JP`/`CALL`
//! (a full register's worth of conditions would otherwise eat a 16-slot
//! block out of the leading-byte space).

use super::{emit_address, reg_op, resolve_address_width, EncodeContext, Op};
use crate::assembler::operand::{AddressingMode, Operand};
use crate::register::Condition;

fn condition_of(operands: &[Operand]) -> (Condition, usize) {
    match operands.first().map(|o| &o.mode) {
        Some(AddressingMode::Condition(cc)) => (*cc, 1),
        _ => (Condition::T, 0),
    }
}

fn relative_disp(ctx: &mut EncodeContext, target: &Operand, instr_len: i64) -> Result<i64, ()> {
    if target.mode != AddressingMode::Relative {
        ctx.error("branch target must be a label or an address expression");
        return Err(());
    }
    let end_pc = *ctx.pc + instr_len;
    Ok(target.value - end_pc)
}

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    match op {
        Op::Ret => {
            let (cc, _) = condition_of(operands);
            ctx.emit(0x0F);
            ctx.emit(cc.code());
            Ok(())
        }
        Op::Reti => {
            ctx.emit(0x0A);
            Ok(())
        }
        Op::Retd => {
            ctx.emit(0x0B);
            let imm = operands.first().map(|o| o.value).unwrap_or(0);
            ctx.emit_le16(imm);
            Ok(())
        }
        Op::Jp => {
            let (cc, addr_idx) = condition_of(operands);
            let addr = operands.get(addr_idx).ok_or(()).map_err(|_| {
                ctx.error("JP requires a target address");
            })?;
            let width = resolve_address_width(addr);
            let size_code = match width {
                8 => 0,
                16 => 1,
                _ => 2,
            };
            ctx.emit(0x0D);
            ctx.emit((cc.code() << 2) | size_code);
            emit_address(ctx, width, addr.value);
            Ok(())
        }
        Op::Call => {
            let (cc, addr_idx) = condition_of(operands);
            let addr = operands.get(addr_idx).ok_or(()).map_err(|_| {
                ctx.error("CALL requires a target address");
            })?;
            let width = resolve_address_width(addr);
            let size_code = match width {
                8 => 0,
                16 => 1,
                _ => 2,
            };
            ctx.emit(0x0E);
            ctx.emit((cc.code() << 2) | size_code);
            emit_address(ctx, width, addr.value);
            Ok(())
        }
        Op::Calr => {
            let target = operands.first().ok_or(()).map_err(|_| {
                ctx.error("CALR requires a target address");
            })?;
            ctx.emit(0x0C);
            let disp = relative_disp(ctx, target, 2)?;
            if target.known && !(-32768..=32767).contains(&disp) {
                ctx.error("CALR target out of 16-bit relative range");
                return Err(());
            }
            ctx.emit_le16(disp);
            Ok(())
        }
        Op::Jr => {
            let (cc, addr_idx) = condition_of(operands);
            let target = operands.get(addr_idx).ok_or(()).map_err(|_| {
                ctx.error("JR requires a target address");
            })?;
            ctx.emit(0x60 | cc.code());
            let disp = relative_disp(ctx, target, 1)?;
            if target.known && !(-128..=127).contains(&disp) {
                ctx.error("JR target out of 8-bit relative range; use JRL");
                return Err(());
            }
            ctx.emit(disp as u8);
            Ok(())
        }
        Op::Jrl => {
            let (cc, addr_idx) = condition_of(operands);
            let target = operands.get(addr_idx).ok_or(()).map_err(|_| {
                ctx.error("JRL requires a target address");
            })?;
            ctx.emit(0x70 | cc.code());
            let disp = relative_disp(ctx, target, 2)?;
            if target.known && !(-32768..=32767).contains(&disp) {
                ctx.error("JRL target out of 16-bit relative range");
                return Err(());
            }
            ctx.emit_le16(disp);
            Ok(())
        }
        Op::Djnz => {
            let reg = operands.first().and_then(|o| o.register).ok_or(()).map_err(|_| {
                ctx.error("DJNZ requires a register operand");
            })?;
            let target = operands.get(1).ok_or(()).map_err(|_| {
                ctx.error("DJNZ requires a target label");
            })?;
            reg_op(ctx, reg, 0x1C)?;
            let disp = relative_disp(ctx, target, 1)?;
            if target.known && !(-128..=127).contains(&disp) {
                ctx.error("DJNZ target out of 8-bit relative range");
                return Err(());
            }
            ctx.emit(disp as u8);
            Ok(())
        }
        _ => unreachable!("branch::encode called with non-branch op"),
    }
}
