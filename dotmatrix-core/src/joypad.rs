use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};

/// The eight buttons, as bit positions in the host-facing button mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
}

impl Button {
    /// Bit of this button in the mask passed to `set_buttons`.
    pub fn mask_bit(self) -> u8 {
        match self {
            Self::A => 0x01,
            Self::B => 0x02,
            Self::Select => 0x04,
            Self::Start => 0x08,
            Self::Right => 0x10,
            Self::Left => 0x20,
            Self::Up => 0x40,
            Self::Down => 0x80,
        }
    }
}

/// Latched button state as the hardware sees it: one bit per button,
/// 1 = released (pull-up), 0 = pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoypadState {
    mask: u8,
}

impl JoypadState {
    pub fn new() -> Self {
        Self { mask: 0xFF }
    }

    /// Replace the whole latch with a host-provided mask.
    pub fn set_mask(&mut self, mask: u8) {
        self.mask = mask;
    }

    fn pressed(self, button: Button) -> bool {
        self.mask & button.mask_bit() == 0
    }
}

impl Default for JoypadState {
    fn default() -> Self {
        Self::new()
    }
}

/// Refresh the low nibble of P1 from the latched buttons and the select bits
/// written by the CPU, and request a joypad interrupt when a selected line
/// newly goes low.
///
/// Runs once per machine step: the CPU can rewrite the select bits at any
/// instruction, and both button groups share the same four line bits.
pub fn update_joyp_register(joypad: JoypadState, io: &mut IoRegisters) {
    let joyp = io.read_register(IoRegister::JOYP);
    // A select bit of 0 connects that button group to the lines
    let directions_selected = joyp & 0x10 == 0;
    let actions_selected = joyp & 0x20 == 0;

    let line = |action: Button, direction: Button| -> bool {
        // Line is low (0) when any selected, pressed button pulls it down
        !((actions_selected && joypad.pressed(action))
            || (directions_selected && joypad.pressed(direction)))
    };

    let new_joyp = (joyp & 0x30)
        | (u8::from(line(Button::Start, Button::Down)) << 3)
        | (u8::from(line(Button::Select, Button::Up)) << 2)
        | (u8::from(line(Button::B, Button::Left)) << 1)
        | u8::from(line(Button::A, Button::Right));

    io.write_register(IoRegister::JOYP, new_joyp);

    // Any line transitioning 1 -> 0 raises the joypad interrupt
    if joyp & 0x0F & !new_joyp != 0 {
        io.request_interrupt(InterruptType::Joypad);
    }
}
