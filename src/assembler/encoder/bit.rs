//! Bit-level operations: `BIT`/`SET`/`RES`/`TSET`/`CHG` (bit index + target),
//! the carry-flag bit ops `STCF`/`LDCF`/`XORCF`, the bit-search primitives
//! `BS1B`/`BS1F`, the extend forms `EXTZ`/`EXTS`, and `SCC` (set byte on
//! condition).

use super::{memory_mode, reg_op, single_operand, EncodeContext, Op};
use crate::assembler::operand::{AddressingMode, Operand};

fn encode_bit_indexed(base: u8, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let (bit, target) = match operands {
        [bit, target] => (bit, target),
        _ => {
            ctx.error("expected a bit index and a target operand");
            return Err(());
        }
    };
    let bit_index = match bit.mode {
        AddressingMode::Bit { bit: index } => (index & 0x07) as u8,
        _ => {
            ctx.error("expected a bit index operand");
            return Err(());
        }
    };
    if let Some(reg) = target.register {
        reg_op(ctx, reg, base)?;
        ctx.emit(bit_index);
        Ok(())
    } else {
        let (mode_byte, extra) = memory_mode(ctx, target)?;
        ctx.emit(0xB0 + mode_byte);
        ctx.emit(base);
        ctx.emit(bit_index);
        ctx.emit_bytes(&extra);
        Ok(())
    }
}

fn encode_scc(operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let (cc, reg) = match operands {
        [cc_op, reg_op] => match (&cc_op.mode, reg_op.register) {
            (AddressingMode::Condition(cc), Some(reg)) => (*cc, reg),
            _ => {
                ctx.error("SCC expects a condition and a register operand");
                return Err(());
            }
        },
        _ => {
            ctx.error("SCC expects exactly two operands");
            return Err(());
        }
    };
    reg_op(ctx, reg, 0x50 | cc.code())
}

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    match op {
        Op::Bit => encode_bit_indexed(0x60, operands, ctx),
        Op::Set => encode_bit_indexed(0x61, operands, ctx),
        Op::Res => encode_bit_indexed(0x62, operands, ctx),
        Op::Tset => encode_bit_indexed(0x63, operands, ctx),
        Op::Chg => encode_bit_indexed(0x64, operands, ctx),
        Op::Stcf => encode_bit_indexed(0x65, operands, ctx),
        Op::Ldcf => encode_bit_indexed(0x66, operands, ctx),
        Op::Xorcf => encode_bit_indexed(0x67, operands, ctx),
        Op::Bs1b => single_operand(ctx, 0x68, operands),
        Op::Bs1f => single_operand(ctx, 0x69, operands),
        Op::Extz => single_operand(ctx, 0x6A, operands),
        Op::Exts => single_operand(ctx, 0x6B, operands),
        Op::Scc => encode_scc(operands, ctx),
        _ => unreachable!("bit::encode called with non-bit op"),
    }
}
