//! Bitwise logical: `AND`/`OR`/`XOR` (plus their `W` widenings) and `CPL`.

use super::{alu_two_operand, single_operand, EncodeContext, Op};
use crate::assembler::operand::Operand;

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    match op {
        Op::And => alu_two_operand(ctx, 0x27, operands),
        Op::Andw => alu_two_operand(ctx, 0x28, operands),
        Op::Or => alu_two_operand(ctx, 0x29, operands),
        Op::Orw => alu_two_operand(ctx, 0x2A, operands),
        Op::Xor => alu_two_operand(ctx, 0x2B, operands),
        Op::Xorw => alu_two_operand(ctx, 0x2C, operands),
        Op::Cpl => single_operand(ctx, 0x2D, operands),
        _ => unreachable!("logical::encode called with non-logical op"),
    }
}
