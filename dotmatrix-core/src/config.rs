use std::fmt::Formatter;

/// Host-configurable behavior of the emulator core.
#[derive(Debug, Clone, Default)]
pub struct GameBoyOptions {
    /// Log CPU state before every instruction (log level `debug`).
    pub debug: bool,
    /// Override the cartridge type byte from the header, forcing a specific
    /// mapper.
    pub force_cart_type: Option<u8>,
    /// Ignore any provided boot image and start at the cartridge entry point.
    pub skip_boot_rom: bool,
}

impl std::fmt::Display for GameBoyOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "debug: {}", self.debug)?;
        writeln!(
            f,
            "force_cart_type: {}",
            match self.force_cart_type {
                Some(cart_type) => format!("{cart_type:02X}"),
                None => "<None>".into(),
            }
        )?;
        writeln!(f, "skip_boot_rom: {}", self.skip_boot_rom)?;

        Ok(())
    }
}
