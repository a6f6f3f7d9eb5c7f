pub mod address;
pub mod ioregisters;
mod mapper;

use crate::memory::ioregisters::IoRegisters;
use crate::memory::mapper::{Mapper, RamMapping};
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("header should be at least 336 bytes, was {header_len} bytes")]
    HeaderTooShort { header_len: usize },
    #[error("unknown or unsupported cartridge type byte: {cart_type:02X}")]
    UnknownMapper { cart_type: u8 },
    #[error("invalid ROM size code in cartridge header: {rom_size_code:02X}")]
    InvalidRomSize { rom_size_code: u8 },
    #[error("error reading data from {file_path}: {source}")]
    FileReadError {
        file_path: String,
        #[source]
        source: io::Error,
    },
}

/// Parsed cartridge header fields, fixed offsets per the DMG layout.
#[derive(Debug, Clone)]
pub struct CartridgeHeader {
    pub title: String,
    pub manufacturer_code: [u8; 4],
    pub uses_sgb_features: bool,
    pub cart_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
    pub international: bool,
    pub licensee: u8,
    pub version: u8,
}

impl CartridgeHeader {
    fn parse(rom: &[u8]) -> Self {
        let title_bytes = &rom[address::TITLE_START as usize..address::TITLE_END as usize];
        let title: String = title_bytes
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| char::from(b))
            .collect();

        let mut manufacturer_code = [0; 4];
        manufacturer_code.copy_from_slice(
            &rom[address::MANUFACTURER_START as usize..address::MANUFACTURER_END as usize],
        );

        Self {
            title,
            manufacturer_code,
            uses_sgb_features: rom[address::SGB_FLAG as usize] == 0x03,
            cart_type: rom[address::CART_TYPE as usize],
            rom_size_code: rom[address::ROM_SIZE as usize],
            ram_size_code: rom[address::RAM_SIZE as usize],
            international: rom[address::REGION as usize] == 0x01,
            licensee: rom[address::LICENSEE as usize],
            version: rom[address::VERSION as usize],
        }
    }
}

#[derive(Debug)]
struct SavBattery {
    dirty: bool,
    sav_path: PathBuf,
}

impl SavBattery {
    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn persist_ram(&mut self, ram: &[u8]) -> Result<(), io::Error> {
        if !self.dirty {
            return Ok(());
        }

        let tmp_file = self.sav_path.with_extension("sav.tmp");
        fs::write(&tmp_file, ram)?;
        fs::rename(&tmp_file, &self.sav_path)?;

        self.dirty = false;

        Ok(())
    }
}

fn load_sav_file<P>(sav_file: P) -> Option<Vec<u8>>
where
    P: AsRef<Path>,
{
    let ram = fs::read(sav_file.as_ref()).ok()?;
    log::info!("Loaded external RAM from {}", sav_file.as_ref().display());
    Some(ram)
}

pub struct Cartridge {
    rom: Vec<u8>,
    header: CartridgeHeader,
    mapper: Mapper,
    ram: Vec<u8>,
    battery: Option<SavBattery>,
}

// External RAM is four 8 KiB banks regardless of the header's RAM size code
const EXTERNAL_RAM_LEN: usize = 4 * address::EXTERNAL_RAM_BANK_LEN;

impl Cartridge {
    /// Create a new Cartridge from raw ROM bytes.
    ///
    /// `force_cart_type` overrides the header's cartridge type byte, which is
    /// how unknown mapper bytes can still be loaded.
    ///
    /// # Errors
    ///
    /// Fails if the image is shorter than the 336-byte header, if the ROM
    /// size code is out of range, or if the cartridge type byte names a
    /// mapper this core does not implement and no override was given.
    pub fn new(
        rom: Vec<u8>,
        sav_path: Option<PathBuf>,
        force_cart_type: Option<u8>,
    ) -> Result<Self, CartridgeLoadError> {
        if rom.len() < address::HEADER_LEN {
            return Err(CartridgeLoadError::HeaderTooShort { header_len: rom.len() });
        }

        let mut header = CartridgeHeader::parse(&rom);
        if let Some(cart_type) = force_cart_type {
            log::info!(
                "Overriding cartridge type {:02X} with {cart_type:02X}",
                header.cart_type
            );
            header.cart_type = cart_type;
        }

        let Some((mapper_type, features)) = mapper::parse_byte(header.cart_type) else {
            return Err(CartridgeLoadError::UnknownMapper { cart_type: header.cart_type });
        };

        if header.rom_size_code > 0x08 {
            return Err(CartridgeLoadError::InvalidRomSize {
                rom_size_code: header.rom_size_code,
            });
        }
        let rom_bank_count = 2_u32 << header.rom_size_code;

        log::info!("Loaded ROM '{}' ({} bytes)", header.title, rom.len());
        log::info!(
            "Cartridge type {:02X} -> {mapper_type:?} ({features}), {rom_bank_count} ROM banks",
            header.cart_type
        );

        let ram = if features.has_ram {
            let mut ram = sav_path
                .as_ref()
                .and_then(load_sav_file)
                .unwrap_or_default();
            ram.resize(EXTERNAL_RAM_LEN, 0);
            ram
        } else {
            Vec::new()
        };

        let battery = match (features.has_battery, sav_path) {
            (true, Some(sav_path)) => {
                log::info!("Persisting external RAM to {}", sav_path.display());
                Some(SavBattery { dirty: false, sav_path })
            }
            _ => None,
        };

        let mapper = Mapper::new(mapper_type, rom_bank_count);

        Ok(Self { rom, header, mapper, ram, battery })
    }

    pub fn from_file(
        file_path: &str,
        force_cart_type: Option<u8>,
    ) -> Result<Self, CartridgeLoadError> {
        log::info!("Loading cartridge from '{file_path}'");

        let rom = fs::read(Path::new(file_path)).map_err(|err| {
            CartridgeLoadError::FileReadError { file_path: file_path.into(), source: err }
        })?;

        let sav_file = Path::new(file_path).with_extension("sav");

        Self::new(rom, Some(sav_file), force_cart_type)
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    /// Read a byte from the ROM address range (0x0000-0x7FFF) through the
    /// current bank mapping. Reads past the end of the image yield 0xFF.
    pub fn read_rom_address(&self, address: u16) -> u8 {
        let mapped = self.mapper.map_rom_address(address);
        self.rom.get(mapped as usize).copied().unwrap_or(0xFF)
    }

    /// A write to the ROM address range sets a mapper control register.
    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        self.mapper.write_rom_address(address, value);
    }

    /// Read a byte from the external RAM range (0xA000-0xBFFF). Returns 0xFF
    /// when RAM is absent, disabled, or the region addresses the RTC.
    pub fn read_ram_address(&self, address: u16) -> u8 {
        match self.mapper.map_ram_address(address) {
            RamMapping::Address(mapped) => {
                self.ram.get(mapped as usize).copied().unwrap_or(0xFF)
            }
            RamMapping::RtcRegister | RamMapping::Disabled => 0xFF,
        }
    }

    /// Write a byte to the external RAM range. Dropped when RAM is absent,
    /// disabled, or the region addresses the RTC.
    pub fn write_ram_address(&mut self, address: u16, value: u8) {
        if let RamMapping::Address(mapped) = self.mapper.map_ram_address(address) {
            if let Some(ram_value) = self.ram.get_mut(mapped as usize) {
                *ram_value = value;
                if let Some(battery) = &mut self.battery {
                    battery.mark_dirty();
                }
            }
        }
    }

    /// For battery-backed cartridges, save external RAM to disk if it has
    /// been modified since the last call.
    pub fn persist_external_ram(&mut self) -> Result<(), io::Error> {
        match &mut self.battery {
            Some(battery) => battery.persist_ram(&self.ram),
            None => Ok(()),
        }
    }
}

/// The CPU-visible 16-bit address space: routes every access to the
/// cartridge, VRAM, WRAM, OAM, I/O registers, or HRAM, applies the
/// forbidden-range filter, and owns the boot-image overlay.
pub struct AddressSpace {
    cartridge: Cartridge,
    boot_rom: Option<Vec<u8>>,
    vram: [u8; 0x2000],
    working_ram: [u8; 0x2000],
    oam: [u8; address::OAM_LEN],
    io_registers: IoRegisters,
    hram: [u8; 0x7F],
    ie_register: u8,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge, boot_rom: Option<Vec<u8>>) -> Self {
        Self {
            cartridge,
            boot_rom,
            vram: [0; 0x2000],
            working_ram: [0; 0x2000],
            oam: [0; address::OAM_LEN],
            io_registers: IoRegisters::new(),
            hram: [0; 0x7F],
            ie_register: 0,
        }
    }

    /// Read the byte at the given address. Forbidden ranges (echo RAM and
    /// 0xFEA0-0xFEFF) read as 0xFF.
    pub fn read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                if let Some(boot_rom) = &self.boot_rom {
                    if (address as usize) < address::BOOT_ROM_LEN {
                        return boot_rom[address as usize];
                    }
                }
                self.cartridge.read_rom_address(address)
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize]
            }
            address::ECHO_RAM_START..=address::ECHO_RAM_END => 0xFF,
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.cpu_read(address)
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    /// Read a little-endian 16-bit value at the given address.
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    /// Write the byte at the given address. Writes to forbidden ranges are
    /// dropped.
    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.write_rom_address(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize] = value;
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize] = value;
            }
            address::ECHO_RAM_START..=address::ECHO_RAM_END => {}
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize] = value;
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                match address {
                    // OAM DMA trigger: modeled as an immediate block copy
                    0xFF46 => {
                        self.io_registers.write_register(ioregisters::IoRegister::DMA, value);
                        self.run_oam_dma(value);
                    }
                    // Boot-overlay disable latch: one-shot, any non-zero value
                    0xFF50 => {
                        if value != 0 && self.boot_rom.take().is_some() {
                            log::debug!("Boot image unmapped, cartridge ROM restored");
                        }
                    }
                    _ => self.io_registers.cpu_write(address, value),
                }
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// Write a little-endian 16-bit value at the given address.
    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }

    // Copies 160 bytes from (source_high << 8) into OAM. The cycle cost is
    // folded into the instruction that wrote the DMA register.
    fn run_oam_dma(&mut self, source_high: u8) {
        let source = u16::from(source_high) << 8;
        for i in 0..address::OAM_LEN as u16 {
            self.oam[i as usize] = self.read_address_u8(source.wrapping_add(i));
        }
    }

    pub fn io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    pub fn ie_register(&self) -> u8 {
        self.ie_register
    }

    /// Raw VRAM view for the PPU's tile and tilemap fetches.
    pub fn vram(&self) -> &[u8; 0x2000] {
        &self.vram
    }

    /// Raw OAM view for the PPU's sprite scan.
    pub fn oam(&self) -> &[u8; address::OAM_LEN] {
        &self.oam
    }

    pub fn boot_rom_mapped(&self) -> bool {
        self.boot_rom.is_some()
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn persist_cartridge_ram(&mut self) -> Result<(), io::Error> {
        self.cartridge.persist_external_ram()
    }
}
