use crate::cpu::instructions::{Instruction, JumpCondition, Operand8, RmwTarget, Target8};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::cpu::CpuError;
use crate::memory::AddressSpace;

/// Decode the instruction at `pc`. Returns the decoded instruction together
/// with the address of the following instruction.
///
/// # Errors
///
/// Returns [`CpuError::UnknownOpcode`] for the eleven base-table opcodes the
/// hardware leaves unassigned. The CB table is fully populated.
pub fn decode_next_instruction(
    bus: &AddressSpace,
    pc: u16,
) -> Result<(Instruction, u16), CpuError> {
    let opcode = bus.read_address_u8(pc);

    let decoded = match opcode {
        0x00 => (Instruction::Nop, pc.wrapping_add(1)),
        0x01 | 0x11 | 0x21 | 0x31 => {
            let pair = register_pair_from_opcode(opcode, CpuRegisterPair::SP);
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (Instruction::LoadPairImmediate(pair, nn), pc.wrapping_add(3))
        }
        0x02 => (
            Instruction::Load(Target8::IndirectBc, Operand8::Register(CpuRegister::A)),
            pc.wrapping_add(1),
        ),
        0x03 | 0x13 | 0x23 | 0x33 => {
            let pair = register_pair_from_opcode(opcode, CpuRegisterPair::SP);
            (Instruction::IncrementPair(pair), pc.wrapping_add(1))
        }
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            let target = rmw_target_from_mid_bits(opcode);
            (Instruction::Increment(target), pc.wrapping_add(1))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            let target = rmw_target_from_mid_bits(opcode);
            (Instruction::Decrement(target), pc.wrapping_add(1))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(Target8::IndirectHl, Target8::Register);
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (
                Instruction::Load(target, Operand8::Immediate(n)),
                pc.wrapping_add(2),
            )
        }
        0x07 => (
            Instruction::RotateLeftCircular(RmwTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0x08 => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (Instruction::LoadDirectSp(nn), pc.wrapping_add(3))
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            let pair = register_pair_from_opcode(opcode, CpuRegisterPair::SP);
            (Instruction::AddHlPair(pair), pc.wrapping_add(1))
        }
        0x0A => (
            Instruction::Load(Target8::Register(CpuRegister::A), Operand8::IndirectBc),
            pc.wrapping_add(1),
        ),
        0x0B | 0x1B | 0x2B | 0x3B => {
            let pair = register_pair_from_opcode(opcode, CpuRegisterPair::SP);
            (Instruction::DecrementPair(pair), pc.wrapping_add(1))
        }
        0x0F => (
            Instruction::RotateRightCircular(RmwTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        // STOP carries a padding byte
        0x10 => (Instruction::Stop, pc.wrapping_add(2)),
        0x12 => (
            Instruction::Load(Target8::IndirectDe, Operand8::Register(CpuRegister::A)),
            pc.wrapping_add(1),
        ),
        0x17 => (
            Instruction::RotateLeft(RmwTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0x18 => {
            let offset = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            (Instruction::JumpRelative(offset), pc.wrapping_add(2))
        }
        0x1A => (
            Instruction::Load(Target8::Register(CpuRegister::A), Operand8::IndirectDe),
            pc.wrapping_add(1),
        ),
        0x1F => (
            Instruction::RotateRight(RmwTarget::Accumulator),
            pc.wrapping_add(1),
        ),
        0x20 | 0x28 | 0x30 | 0x38 => {
            let condition = jump_condition_from_opcode(opcode);
            let offset = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            (
                Instruction::JumpRelativeIf(condition, offset),
                pc.wrapping_add(2),
            )
        }
        0x22 => (
            Instruction::Load(Target8::IndirectHlInc, Operand8::Register(CpuRegister::A)),
            pc.wrapping_add(1),
        ),
        0x27 => (Instruction::DecimalAdjust, pc.wrapping_add(1)),
        0x2A => (
            Instruction::Load(Target8::Register(CpuRegister::A), Operand8::IndirectHlInc),
            pc.wrapping_add(1),
        ),
        0x2F => (Instruction::Complement, pc.wrapping_add(1)),
        0x32 => (
            Instruction::Load(Target8::IndirectHlDec, Operand8::Register(CpuRegister::A)),
            pc.wrapping_add(1),
        ),
        0x37 => (Instruction::SetCarryFlag, pc.wrapping_add(1)),
        0x3A => (
            Instruction::Load(Target8::Register(CpuRegister::A), Operand8::IndirectHlDec),
            pc.wrapping_add(1),
        ),
        0x3F => (Instruction::ComplementCarryFlag, pc.wrapping_add(1)),
        0x76 => (Instruction::Halt, pc.wrapping_add(1)),
        opcode @ 0x40..=0x7F => {
            let target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(Target8::IndirectHl, Target8::Register);
            let source = operand_from_low_bits(opcode);
            (Instruction::Load(target, source), pc.wrapping_add(1))
        }
        opcode @ 0x80..=0x87 => (
            Instruction::Add(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        opcode @ 0x88..=0x8F => (
            Instruction::AddWithCarry(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        opcode @ 0x90..=0x97 => (
            Instruction::Subtract(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        opcode @ 0x98..=0x9F => (
            Instruction::SubtractWithCarry(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        opcode @ 0xA0..=0xA7 => (
            Instruction::And(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        opcode @ 0xA8..=0xAF => (
            Instruction::Xor(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        opcode @ 0xB0..=0xB7 => (
            Instruction::Or(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        opcode @ 0xB8..=0xBF => (
            Instruction::Compare(operand_from_low_bits(opcode)),
            pc.wrapping_add(1),
        ),
        0xC0 | 0xC8 | 0xD0 | 0xD8 => (
            Instruction::ReturnIf(jump_condition_from_opcode(opcode)),
            pc.wrapping_add(1),
        ),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            let pair = register_pair_from_opcode(opcode, CpuRegisterPair::AF);
            (Instruction::Pop(pair), pc.wrapping_add(1))
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let condition = jump_condition_from_opcode(opcode);
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (Instruction::JumpIf(condition, nn), pc.wrapping_add(3))
        }
        0xC3 => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (Instruction::Jump(nn), pc.wrapping_add(3))
        }
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let condition = jump_condition_from_opcode(opcode);
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (Instruction::CallIf(condition, nn), pc.wrapping_add(3))
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            let pair = register_pair_from_opcode(opcode, CpuRegisterPair::AF);
            (Instruction::Push(pair), pc.wrapping_add(1))
        }
        0xC6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (Instruction::Add(Operand8::Immediate(n)), pc.wrapping_add(2))
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            (Instruction::Restart(opcode & 0x38), pc.wrapping_add(1))
        }
        0xC9 => (Instruction::Return, pc.wrapping_add(1)),
        0xCB => decode_cb_opcode(bus, pc),
        0xCD => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (Instruction::Call(nn), pc.wrapping_add(3))
        }
        0xCE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (
                Instruction::AddWithCarry(Operand8::Immediate(n)),
                pc.wrapping_add(2),
            )
        }
        0xD6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (
                Instruction::Subtract(Operand8::Immediate(n)),
                pc.wrapping_add(2),
            )
        }
        0xD9 => (Instruction::ReturnFromInterrupt, pc.wrapping_add(1)),
        0xDE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (
                Instruction::SubtractWithCarry(Operand8::Immediate(n)),
                pc.wrapping_add(2),
            )
        }
        0xE0 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (
                Instruction::Load(Target8::HighImmediate(n), Operand8::Register(CpuRegister::A)),
                pc.wrapping_add(2),
            )
        }
        0xE2 => (
            Instruction::Load(Target8::HighC, Operand8::Register(CpuRegister::A)),
            pc.wrapping_add(1),
        ),
        0xE6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (Instruction::And(Operand8::Immediate(n)), pc.wrapping_add(2))
        }
        0xE8 => {
            let offset = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            (Instruction::AddSpOffset(offset), pc.wrapping_add(2))
        }
        0xE9 => (Instruction::JumpHl, pc.wrapping_add(1)),
        0xEA => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (
                Instruction::Load(Target8::Direct(nn), Operand8::Register(CpuRegister::A)),
                pc.wrapping_add(3),
            )
        }
        0xEE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (Instruction::Xor(Operand8::Immediate(n)), pc.wrapping_add(2))
        }
        0xF0 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (
                Instruction::Load(Target8::Register(CpuRegister::A), Operand8::HighImmediate(n)),
                pc.wrapping_add(2),
            )
        }
        0xF2 => (
            Instruction::Load(Target8::Register(CpuRegister::A), Operand8::HighC),
            pc.wrapping_add(1),
        ),
        0xF3 => (Instruction::DisableInterrupts, pc.wrapping_add(1)),
        0xF6 => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (Instruction::Or(Operand8::Immediate(n)), pc.wrapping_add(2))
        }
        0xF8 => {
            let offset = bus.read_address_u8(pc.wrapping_add(1)) as i8;
            (Instruction::LoadHlSpOffset(offset), pc.wrapping_add(2))
        }
        0xF9 => (Instruction::LoadSpHl, pc.wrapping_add(1)),
        0xFA => {
            let nn = bus.read_address_u16(pc.wrapping_add(1));
            (
                Instruction::Load(Target8::Register(CpuRegister::A), Operand8::Direct(nn)),
                pc.wrapping_add(3),
            )
        }
        0xFB => (Instruction::EnableInterrupts, pc.wrapping_add(1)),
        0xFE => {
            let n = bus.read_address_u8(pc.wrapping_add(1));
            (
                Instruction::Compare(Operand8::Immediate(n)),
                pc.wrapping_add(2),
            )
        }
        _ => return Err(CpuError::UnknownOpcode { opcode, pc }),
    };

    Ok(decoded)
}

fn decode_cb_opcode(bus: &AddressSpace, pc: u16) -> (Instruction, u16) {
    let opcode = bus.read_address_u8(pc.wrapping_add(1));
    let next_pc = pc.wrapping_add(2);

    let instruction = match opcode {
        opcode @ 0x00..=0x07 => Instruction::RotateLeftCircular(rmw_target_from_low_bits(opcode)),
        opcode @ 0x08..=0x0F => Instruction::RotateRightCircular(rmw_target_from_low_bits(opcode)),
        opcode @ 0x10..=0x17 => Instruction::RotateLeft(rmw_target_from_low_bits(opcode)),
        opcode @ 0x18..=0x1F => Instruction::RotateRight(rmw_target_from_low_bits(opcode)),
        opcode @ 0x20..=0x27 => Instruction::ShiftLeftArithmetic(rmw_target_from_low_bits(opcode)),
        opcode @ 0x28..=0x2F => Instruction::ShiftRightArithmetic(rmw_target_from_low_bits(opcode)),
        opcode @ 0x30..=0x37 => Instruction::Swap(rmw_target_from_low_bits(opcode)),
        opcode @ 0x38..=0x3F => Instruction::ShiftRightLogical(rmw_target_from_low_bits(opcode)),
        opcode @ 0x40..=0x7F => {
            Instruction::TestBit(cb_bit_index(opcode), operand_from_low_bits(opcode))
        }
        opcode @ 0x80..=0xBF => {
            Instruction::ResetBit(cb_bit_index(opcode), rmw_target_from_low_bits(opcode))
        }
        opcode => Instruction::SetBit(cb_bit_index(opcode), rmw_target_from_low_bits(opcode)),
    };

    (instruction, next_pc)
}

fn cb_bit_index(opcode: u8) -> u8 {
    (opcode >> 3) & 0x07
}

fn operand_from_low_bits(opcode: u8) -> Operand8 {
    CpuRegister::from_low_opcode_bits(opcode).map_or(Operand8::IndirectHl, Operand8::Register)
}

fn rmw_target_from_low_bits(opcode: u8) -> RmwTarget {
    CpuRegister::from_low_opcode_bits(opcode).map_or(RmwTarget::IndirectHl, RmwTarget::Register)
}

fn rmw_target_from_mid_bits(opcode: u8) -> RmwTarget {
    CpuRegister::from_mid_opcode_bits(opcode).map_or(RmwTarget::IndirectHl, RmwTarget::Register)
}

// Bits 4-5 select BC/DE/HL plus either SP (arithmetic and 16-bit loads) or
// AF (PUSH/POP).
fn register_pair_from_opcode(opcode: u8, fourth: CpuRegisterPair) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => fourth,
    }
}

fn jump_condition_from_opcode(opcode: u8) -> JumpCondition {
    match opcode & 0x18 {
        0x00 => JumpCondition::NZ,
        0x08 => JumpCondition::Z,
        0x10 => JumpCondition::NC,
        _ => JumpCondition::C,
    }
}
