pub(crate) mod instructions;
mod registers;


use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use thiserror::Error;

pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters, Flag};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("unknown opcode {opcode:02X} at pc {pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },
}

/// The five interrupt sources, in priority order. The bit index in IE/IF
/// matches the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    pub const PRIORITY_ORDER: [Self; 5] = [
        Self::VBlank,
        Self::LcdStatus,
        Self::Timer,
        Self::Serial,
        Self::Joypad,
    ];

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }
}

/// Cycles consumed by jumping to an interrupt handler.
pub const ISR_CYCLES: u32 = 12;

// Cycles consumed while halted with nothing pending.
const HALT_IDLE_CYCLES: u32 = 4;

fn pending_interrupts(bus: &AddressSpace) -> u8 {
    bus.ie_register() & bus.io_registers().interrupt_flags() & 0x1F
}

/// Execute one instruction (or idle while halted), then service at most one
/// pending interrupt. Returns the total clock cycles consumed.
///
/// # Errors
///
/// Returns [`CpuError::UnknownOpcode`] when dispatch lands on an unassigned
/// opcode; the machine should stop and report PC and opcode to the host.
pub fn execute_next(
    registers: &mut CpuRegisters,
    bus: &mut AddressSpace,
) -> Result<u32, CpuError> {
    if registers.halted {
        // HALT ends as soon as any enabled interrupt is requested, whether or
        // not IME is set
        if pending_interrupts(bus) == 0 {
            return Ok(HALT_IDLE_CYCLES);
        }
        registers.halted = false;

        // With IME set the wakeup goes straight into the handler
        let isr_cycles = service_interrupt(registers, bus);
        if isr_cycles > 0 {
            return Ok(isr_cycles);
        }
    }

    let (instruction, next_pc) = instructions::decode_next_instruction(bus, registers.pc)?;

    log::trace!(
        "pc {:04X} -> {:04X}: executing {instruction:02X?}",
        registers.pc,
        next_pc
    );

    registers.pc = next_pc;
    let mut cycles = instruction.cycles(registers);
    instruction.execute(registers, bus);

    cycles += service_interrupt(registers, bus);

    Ok(cycles)
}

// Service the highest-priority pending interrupt, if IME allows it. Clears
// IME and the serviced IF bit, pushes PC, and jumps to the handler. At most
// one interrupt is serviced per instruction boundary.
fn service_interrupt(registers: &mut CpuRegisters, bus: &mut AddressSpace) -> u32 {
    if !registers.ime || registers.interrupt_delay {
        return 0;
    }

    let pending = pending_interrupts(bus);
    if pending == 0 {
        return 0;
    }

    for interrupt_type in InterruptType::PRIORITY_ORDER {
        if pending & interrupt_type.bit() != 0 {
            log::trace!(
                "servicing {interrupt_type:?} interrupt, handler {:04X}",
                interrupt_type.handler_address()
            );

            registers.ime = false;
            registers.halted = false;

            let flags = bus.io_registers().interrupt_flags() & !interrupt_type.bit();
            bus.io_registers_mut().write_register(IoRegister::IF, flags);

            registers.sp = registers.sp.wrapping_sub(2);
            bus.write_address_u16(registers.sp, registers.pc);
            registers.pc = interrupt_type.handler_address();

            return ISR_CYCLES;
        }
    }

    0
}
