//! Rotate/shift family. All eight mnemonics take a register (or memory
//! operand) and an optional shift count; an omitted count means "shift by
//! one", matching the single-operand forms the other families use.

use super::{single_operand, EncodeContext, Op};
use crate::assembler::operand::Operand;

fn encode_shift(base: u8, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    if operands.is_empty() {
        ctx.error("expected at least one operand");
        return Err(());
    }
    single_operand(ctx, base, &operands[..1])?;
    if let Some(count) = operands.get(1) {
        ctx.emit(count.value as u8);
    }
    Ok(())
}

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let base = match op {
        Op::Rlc => 0x40,
        Op::Rrc => 0x41,
        Op::Rl => 0x42,
        Op::Rr => 0x43,
        Op::Sla => 0x44,
        Op::Sra => 0x45,
        Op::Sll => 0x46,
        Op::Srl => 0x47,
        _ => unreachable!("shift::encode called with non-shift op"),
    };
    encode_shift(base, operands, ctx)
}
