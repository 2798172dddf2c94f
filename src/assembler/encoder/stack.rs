//! Stack-frame instructions: `PUSH`/`POP`/`PUSHW`/`LINK`/`UNLK`, all built
//! on the register-kinded prefix family shared with the arithmetic and
//! logical single-register forms.

use super::{reg_op, EncodeContext, Op};
use crate::assembler::operand::Operand;

pub fn encode(op: Op, operands: &[Operand], ctx: &mut EncodeContext) -> Result<(), ()> {
    let reg = match operands.first().and_then(|o| o.register) {
        Some(reg) => reg,
        None => {
            ctx.error(format!("{op:?} requires a register operand"));
            return Err(());
        }
    };

    match op {
        Op::Push => reg_op(ctx, reg, 0x10),
        Op::PushW => reg_op(ctx, reg, 0x11),
        Op::Pop => reg_op(ctx, reg, 0x12),
        Op::Link => {
            reg_op(ctx, reg, 0x13)?;
            let frame_size = operands.get(1).map(|o| o.value).unwrap_or(0);
            ctx.emit_le16(frame_size);
            Ok(())
        }
        Op::Unlk => reg_op(ctx, reg, 0x14),
        _ => unreachable!("stack::encode called with non-stack op"),
    }
}
