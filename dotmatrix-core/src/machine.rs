use crate::config::GameBoyOptions;
use crate::cpu::{self, CpuError, CpuRegisters};
use crate::joypad::{self, JoypadState};
use crate::memory::ioregisters::IoRegister;
use crate::memory::{address, AddressSpace, Cartridge, CartridgeLoadError};
use crate::ppu::{self, FrameBuffer, PpuState};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Cartridge(#[from] CartridgeLoadError),
    #[error("boot image must be exactly 256 bytes, was {len} bytes")]
    BootRomLength { len: usize },
}

// An upper bound on the cycles one frame can take; `run_frame` returns after
// this much work even if the PPU never signals (LCD disabled).
const FRAME_CYCLES: u32 = 70_224;

/// The assembled machine: CPU registers, memory bus, PPU, and the joypad
/// latch, advanced in lockstep one instruction at a time.
pub struct GameBoy {
    registers: CpuRegisters,
    bus: AddressSpace,
    ppu: PpuState,
    joypad: JoypadState,
    options: GameBoyOptions,
}

impl GameBoy {
    /// Build a machine from raw ROM bytes and an optional 256-byte boot
    /// image. Without a boot image (or with `skip_boot_rom` set) the machine
    /// starts from the post-boot register and I/O state.
    pub fn new(
        rom: Vec<u8>,
        boot_rom: Option<Vec<u8>>,
        options: GameBoyOptions,
    ) -> Result<Self, InitError> {
        let cartridge = Cartridge::new(rom, None, options.force_cart_type)?;
        Self::with_cartridge(cartridge, boot_rom, options)
    }

    /// Build a machine from a ROM file on disk. A sibling `.sav` file is used
    /// for battery-backed external RAM.
    pub fn from_file(
        rom_path: &str,
        boot_rom: Option<Vec<u8>>,
        options: GameBoyOptions,
    ) -> Result<Self, InitError> {
        let cartridge = Cartridge::from_file(rom_path, options.force_cart_type)?;
        Self::with_cartridge(cartridge, boot_rom, options)
    }

    fn with_cartridge(
        cartridge: Cartridge,
        boot_rom: Option<Vec<u8>>,
        options: GameBoyOptions,
    ) -> Result<Self, InitError> {
        log::info!("Machine options:\n{options}");

        let boot_rom = if options.skip_boot_rom { None } else { boot_rom };
        if let Some(boot_rom) = &boot_rom {
            if boot_rom.len() != address::BOOT_ROM_LEN {
                return Err(InitError::BootRomLength { len: boot_rom.len() });
            }
        }

        let mut bus = AddressSpace::new(cartridge, boot_rom);

        let registers = if bus.boot_rom_mapped() {
            CpuRegisters::new_with_boot_rom()
        } else {
            // The boot image normally leaves these behind
            let io = bus.io_registers_mut();
            io.write_register(IoRegister::JOYP, 0x0F);
            io.write_register(IoRegister::LCDC, 0x91);
            io.write_register(IoRegister::STAT, 0x02);
            io.write_register(IoRegister::BGP, 0xFC);
            io.write_register(IoRegister::OBP0, 0xFF);
            io.write_register(IoRegister::OBP1, 0xFF);

            CpuRegisters::new()
        };

        Ok(Self {
            registers,
            bus,
            ppu: PpuState::new(),
            joypad: JoypadState::new(),
            options,
        })
    }

    /// Execute one instruction and feed the consumed cycles to the PPU.
    /// Returns the cycle count.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::UnknownOpcode`] when dispatch fails; the machine
    /// should not be stepped further.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        joypad::update_joyp_register(self.joypad, self.bus.io_registers_mut());

        if self.options.debug {
            log::debug!(
                "pc={:04X} af={:04X} bc={:04X} de={:04X} hl={:04X} sp={:04X} ime={} if={:02X} ie={:02X} ly={:02X}",
                self.registers.pc,
                self.registers.af(),
                self.registers.bc(),
                self.registers.de(),
                self.registers.hl(),
                self.registers.sp,
                self.registers.ime,
                self.bus.io_registers().interrupt_flags(),
                self.bus.ie_register(),
                self.bus.io_registers().read_register(IoRegister::LY),
            );
        }

        let cycles = cpu::execute_next(&mut self.registers, &mut self.bus).map_err(|err| {
            log::error!("stopping machine: {err}");
            err
        })?;

        ppu::update(&mut self.ppu, &mut self.bus, cycles);

        Ok(cycles)
    }

    /// Step until the PPU enters V-Blank with a finished frame, then hand the
    /// framebuffer to the caller. Returns after a frame's worth of cycles
    /// even if the LCD is disabled, so hosts can keep pacing.
    pub fn run_frame(&mut self) -> Result<&FrameBuffer, CpuError> {
        let mut cycles = 0;
        while !self.ppu.frame_ready() && cycles < FRAME_CYCLES {
            cycles += self.step()?;
        }

        self.ppu.clear_frame_ready();
        Ok(self.ppu.frame_buffer())
    }

    /// Latch the host's button state: one bit per button, 1 = released.
    /// See [`crate::Button`] for the bit layout.
    pub fn set_buttons(&mut self, mask: u8) {
        self.joypad.set_mask(mask);
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        self.ppu.frame_buffer()
    }

    /// The ROM title from the cartridge header.
    pub fn rom_title(&self) -> &str {
        &self.bus.cartridge().header().title
    }

    /// Write battery-backed external RAM to disk if it changed since the
    /// last call.
    pub fn persist_sav(&mut self) -> Result<(), io::Error> {
        self.bus.persist_cartridge_ram()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joypad::Button;
    use crate::memory::address;

    fn test_rom(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![0; 0x8000];
        rom[address::ENTRY_POINT as usize..address::ENTRY_POINT as usize + program.len()]
            .copy_from_slice(program);
        rom
    }

    #[test]
    fn boot_overlay_runs_then_unmaps() {
        let mut rom = vec![0; 0x8000];
        rom[0] = 0x5A;

        // LD A, 0x01; LDH (0x50), A
        let mut boot_rom = vec![0; address::BOOT_ROM_LEN];
        boot_rom[..4].copy_from_slice(&[0x3E, 0x01, 0xE0, 0x50]);

        let mut gameboy =
            GameBoy::new(rom, Some(boot_rom), GameBoyOptions::default()).unwrap();

        assert!(gameboy.bus.boot_rom_mapped());
        assert_eq!(0, gameboy.registers.pc);

        gameboy.step().unwrap();
        gameboy.step().unwrap();

        assert!(!gameboy.bus.boot_rom_mapped());
        assert_eq!(0x5A, gameboy.bus.read_address_u8(0x0000));
    }

    #[test]
    fn rejects_wrong_boot_rom_length() {
        let result = GameBoy::new(
            vec![0; 0x8000],
            Some(vec![0; 0x80]),
            GameBoyOptions::default(),
        );

        assert!(matches!(result, Err(InitError::BootRomLength { len: 0x80 })));
    }

    #[test]
    fn skip_boot_rom_starts_at_entry_point() {
        let gameboy = GameBoy::new(
            vec![0; 0x8000],
            Some(vec![0; address::BOOT_ROM_LEN]),
            GameBoyOptions { skip_boot_rom: true, ..GameBoyOptions::default() },
        )
        .unwrap();

        assert!(!gameboy.bus.boot_rom_mapped());
        assert_eq!(address::ENTRY_POINT, gameboy.registers.pc);
    }

    #[test]
    fn unknown_opcode_stops_the_machine() {
        let mut gameboy = GameBoy::new(
            test_rom(&[0xD3]),
            None,
            GameBoyOptions::default(),
        )
        .unwrap();

        assert_eq!(
            Err(CpuError::UnknownOpcode { opcode: 0xD3, pc: address::ENTRY_POINT }),
            gameboy.step()
        );
    }

    #[test]
    fn pressed_button_raises_joypad_interrupt() {
        // Select the action group, then idle
        let mut gameboy = GameBoy::new(
            test_rom(&[0x3E, 0x10, 0xE0, 0x00, 0x00, 0x00]),
            None,
            GameBoyOptions::default(),
        )
        .unwrap();

        gameboy.step().unwrap();
        gameboy.step().unwrap();
        gameboy.step().unwrap();
        assert_eq!(0, gameboy.bus.io_registers().interrupt_flags() & 0x10);

        gameboy.set_buttons(!Button::A.mask_bit());
        gameboy.step().unwrap();

        assert_ne!(0, gameboy.bus.io_registers().interrupt_flags() & 0x10);
    }

    #[test]
    fn run_frame_returns_even_with_lcd_disabled() {
        // LDH (0x40), A with A=0 disables the LCD
        let mut gameboy = GameBoy::new(
            test_rom(&[0x3E, 0x00, 0xE0, 0x40, 0x18, 0xFE]),
            None,
            GameBoyOptions::default(),
        )
        .unwrap();

        gameboy.run_frame().unwrap();
        gameboy.run_frame().unwrap();
    }
}
