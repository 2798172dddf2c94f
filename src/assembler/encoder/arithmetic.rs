//! Arithmetic: the `ADD`/`ADC`/`SUB`/`SBC`/`CP` family (plus their `W`
//! widenings), `INC`/`DEC`/`NEG`, `MUL`/`MULS`/`DIV`/`DIVS`, and `DAA`.

use super::{alu_two_operand, single_operand, EncodeContext, Op};
use crate::assembler::operand::Operand;

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    match op {
        Op::Add => alu_two_operand(ctx, 0x20, operands),
        Op::Addw => alu_two_operand(ctx, 0x21, operands),
        Op::Adc => alu_two_operand(ctx, 0x22, operands),
        Op::Sub => alu_two_operand(ctx, 0x23, operands),
        Op::Sbc => alu_two_operand(ctx, 0x24, operands),
        Op::Cp => alu_two_operand(ctx, 0x25, operands),
        Op::Cpw => alu_two_operand(ctx, 0x26, operands),
        Op::Inc => single_operand(ctx, 0x30, operands),
        Op::Incw => single_operand(ctx, 0x31, operands),
        Op::Dec => single_operand(ctx, 0x32, operands),
        Op::Decw => single_operand(ctx, 0x33, operands),
        Op::Neg => single_operand(ctx, 0x34, operands),
        Op::Daa => single_operand(ctx, 0x35, operands),
        Op::Mul => alu_two_operand(ctx, 0x36, operands),
        Op::Muls => alu_two_operand(ctx, 0x37, operands),
        Op::Div => alu_two_operand(ctx, 0x38, operands),
        Op::Divs => alu_two_operand(ctx, 0x39, operands),
        _ => unreachable!("arithmetic::encode called with non-arithmetic op"),
    }
}
