use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperType {
    None,
    Mbc1,
    Mbc3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperFeatures {
    pub has_ram: bool,
    pub has_battery: bool,
}

impl std::fmt::Display for MapperFeatures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "has_ram={}, has_battery={}",
            self.has_ram, self.has_battery
        )
    }
}

/// Parse the cartridge type byte at 0x0147 into a mapper type and its feature set.
///
/// Returns None for cartridge types that are not supported (MBC2/MBC5/etc.).
pub fn parse_byte(cart_type: u8) -> Option<(MapperType, MapperFeatures)> {
    let (mapper_type, has_ram, has_battery) = match cart_type {
        0x00 => (MapperType::None, false, false),
        0x01 => (MapperType::Mbc1, false, false),
        0x02 => (MapperType::Mbc1, true, false),
        0x03 => (MapperType::Mbc1, true, true),
        0x08 => (MapperType::None, true, false),
        0x09 => (MapperType::None, true, true),
        // 0x0F/0x10 carry an RTC; the clock itself is not modeled
        0x0F => (MapperType::Mbc3, false, true),
        0x10 | 0x13 => (MapperType::Mbc3, true, true),
        0x11 => (MapperType::Mbc3, false, false),
        0x12 => (MapperType::Mbc3, true, false),
        _ => return None,
    };

    Some((mapper_type, MapperFeatures { has_ram, has_battery }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamMapping {
    // Relative offset into the full external RAM array
    Address(u32),
    // A000-BFFF currently addresses the (unimplemented) real-time clock
    RtcRegister,
    // RAM access is disabled or not present
    Disabled,
}

/// Bank-switching state for the supported cartridge mappers.
///
/// Register writes land here via the ROM address range; reads are translated
/// into flat offsets into the ROM image / external RAM array.
#[derive(Debug, Clone)]
pub enum Mapper {
    None,
    Mbc1 {
        rom_bank_mask: u8,
        ram_enable: bool,
        // 5-bit bank number; a written 0 is coerced to 1
        rom_bank_lo: u8,
        // 2 bits, high ROM bank bits in ROM mode / RAM bank in RAM mode
        bank_hi: u8,
        // false = ROM banking mode, true = RAM banking mode
        ram_banking_mode: bool,
    },
    Mbc3 {
        rom_bank_mask: u8,
        ram_enable: bool,
        // 7-bit bank number; a written 0 is coerced to 1
        rom_bank: u8,
        // 0-3 select a RAM bank; bit 3 selects the RTC
        ram_bank: u8,
    },
}

impl Mapper {
    pub fn new(mapper_type: MapperType, rom_bank_count: u32) -> Self {
        let rom_bank_mask = rom_bank_count.saturating_sub(1).min(0xFF) as u8;
        log::debug!("ROM bank mask {rom_bank_mask:02X} for {rom_bank_count} banks");

        match mapper_type {
            MapperType::None => Self::None,
            MapperType::Mbc1 => Self::Mbc1 {
                rom_bank_mask,
                ram_enable: false,
                rom_bank_lo: 0x01,
                bank_hi: 0x00,
                ram_banking_mode: false,
            },
            MapperType::Mbc3 => Self::Mbc3 {
                rom_bank_mask,
                ram_enable: false,
                rom_bank: 0x01,
                ram_bank: 0x00,
            },
        }
    }

    /// Translate a CPU address in 0x0000-0x7FFF into a flat offset into the ROM
    /// image, honoring the currently selected bank.
    pub fn map_rom_address(&self, address: u16) -> u32 {
        match *self {
            Self::None => u32::from(address),
            Self::Mbc1 {
                rom_bank_mask,
                rom_bank_lo,
                bank_hi,
                ram_banking_mode,
                ..
            } => match address {
                // Bank 0 stays fixed regardless of the bank registers
                address @ 0x0000..=0x3FFF => u32::from(address),
                address => {
                    let bank = if ram_banking_mode {
                        rom_bank_lo
                    } else {
                        (bank_hi << 5) | rom_bank_lo
                    } & rom_bank_mask;
                    u32::from(address - 0x4000) + (u32::from(bank) << 14)
                }
            },
            Self::Mbc3 {
                rom_bank_mask,
                rom_bank,
                ..
            } => match address {
                address @ 0x0000..=0x3FFF => u32::from(address),
                address => {
                    let bank = rom_bank & rom_bank_mask;
                    u32::from(address - 0x4000) + (u32::from(bank) << 14)
                }
            },
        }
    }

    /// A write into 0x0000-0x7FFF sets a mapper control register; the ROM
    /// itself is never modified.
    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None => {}
            Self::Mbc1 {
                ram_enable,
                rom_bank_lo,
                bank_hi,
                ram_banking_mode,
                ..
            } => match address {
                0x0000..=0x1FFF => {
                    *ram_enable = value & 0x0F == 0x0A;
                    log::trace!("MBC1 ram_enable={ram_enable}");
                }
                0x2000..=0x3FFF => {
                    let bank = value & 0x1F;
                    *rom_bank_lo = if bank == 0 { 1 } else { bank };
                    log::trace!("MBC1 rom_bank_lo={rom_bank_lo:02X}");
                }
                0x4000..=0x5FFF => {
                    *bank_hi = value & 0x03;
                    log::trace!("MBC1 bank_hi={bank_hi:02X}");
                }
                _ => {
                    *ram_banking_mode = value & 0x01 != 0;
                    log::trace!("MBC1 ram_banking_mode={ram_banking_mode}");
                }
            },
            Self::Mbc3 {
                ram_enable,
                rom_bank,
                ram_bank,
                ..
            } => match address {
                0x0000..=0x1FFF => {
                    *ram_enable = value & 0x0F == 0x0A;
                    log::trace!("MBC3 ram_enable={ram_enable}");
                }
                0x2000..=0x3FFF => {
                    let bank = value & 0x7F;
                    *rom_bank = if bank == 0 { 1 } else { bank };
                    log::trace!("MBC3 rom_bank={rom_bank:02X}");
                }
                0x4000..=0x5FFF => {
                    *ram_bank = value;
                    log::trace!("MBC3 ram_bank={ram_bank:02X}");
                }
                // 0x6000-0x7FFF would latch the RTC, which is not modeled
                _ => {}
            },
        }
    }

    /// Translate a CPU address in 0xA000-0xBFFF into a flat offset into the
    /// external RAM array, or report that the region is disabled / RTC-mapped.
    pub fn map_ram_address(&self, address: u16) -> RamMapping {
        let relative = u32::from(address - 0xA000);

        match *self {
            Self::None => RamMapping::Address(relative),
            Self::Mbc1 {
                ram_enable,
                bank_hi,
                ram_banking_mode,
                ..
            } => {
                if !ram_enable {
                    return RamMapping::Disabled;
                }
                let bank = if ram_banking_mode { bank_hi } else { 0 };
                RamMapping::Address(relative + (u32::from(bank) << 13))
            }
            Self::Mbc3 {
                ram_enable,
                ram_bank,
                ..
            } => {
                if !ram_enable {
                    RamMapping::Disabled
                } else if ram_bank & 0x08 != 0 {
                    RamMapping::RtcRegister
                } else {
                    RamMapping::Address(relative + (u32::from(ram_bank & 0x03) << 13))
                }
            }
        }
    }
}
