//! Single-byte system/control instructions and `SWI`.

use super::{EncodeContext, Op};
use crate::assembler::operand::Operand;

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    match op {
        Op::Nop => ctx.emit(0x00),
        Op::Di => ctx.emit(0x01),
        Op::Ei => ctx.emit(0x02),
        Op::Halt => ctx.emit(0x03),
        Op::Scf => ctx.emit(0x04),
        Op::Rcf => ctx.emit(0x05),
        Op::Ccf => ctx.emit(0x06),
        Op::Zcf => ctx.emit(0x07),
        Op::Swi => {
            ctx.emit(0x09);
            let vector = operands.first().map(|o| o.value).unwrap_or(0);
            if !(0..=7).contains(&vector) {
                ctx.error("SWI vector must be in range 0..=7");
                return Err(());
            }
            ctx.emit(vector as u8);
        }
        _ => unreachable!("system::encode called with non-system op"),
    }
    Ok(())
}
