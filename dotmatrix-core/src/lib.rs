//! Cycle-driven emulator core for the original Game Boy (DMG): a Sharp
//! LR35902 CPU, the bank-switched memory bus, and the four-mode PPU that
//! renders a 160x144 four-shade framebuffer.
//!
//! The host owns pacing and presentation: drive [`GameBoy::run_frame`] (or
//! [`GameBoy::step`] directly), copy out the framebuffer, and latch button
//! state with [`GameBoy::set_buttons`].

mod config;
mod cpu;
mod joypad;
mod machine;
mod memory;
mod ppu;

pub use config::GameBoyOptions;
pub use cpu::{CpuError, InterruptType};
pub use joypad::Button;
pub use machine::{GameBoy, InitError};
pub use memory::{CartridgeLoadError, CartridgeHeader};
pub use ppu::{
    decode_palette, Color, FrameBuffer, DMG_PALETTE, SCREEN_HEIGHT, SCREEN_WIDTH,
};
