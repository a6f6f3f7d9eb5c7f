use anyhow::{anyhow, Context};
use clap::Parser;
use dotmatrix_core::{Button, GameBoy, GameBoyOptions, SCREEN_HEIGHT, SCREEN_WIDTH};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use std::fs;
use std::time::{Duration, Instant};

fn parse_cart_type(s: &str) -> Result<u8, String> {
    u8::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|err| format!("invalid cartridge type byte '{s}': {err}"))
}

#[derive(Parser)]
#[command(about = "Game Boy (DMG) emulator", version)]
struct Cli {
    /// Path to the cartridge ROM image
    #[arg(short = 'f', long = "rom-file-path")]
    rom_file_path: String,

    /// Optional 256-byte boot image, overlaid until the program unlatches it
    #[arg(short = 'b', long = "boot-rom-path")]
    boot_rom_path: Option<String>,

    /// Ignore the boot image and start from post-boot state
    #[arg(long = "skip-boot-rom", default_value_t = false)]
    skip_boot_rom: bool,

    /// Override the cartridge type header byte (hex), forcing a mapper
    #[arg(long = "force-cart-type", value_parser = parse_cart_type)]
    force_cart_type: Option<u8>,

    /// Integer window scale factor
    #[arg(short = 's', long = "scale", default_value_t = 4)]
    scale: u32,

    #[arg(long = "no-vsync", default_value_t = true, action = clap::ArgAction::SetFalse)]
    vsync_enabled: bool,

    /// Log CPU state before every instruction (pair with RUST_LOG=debug)
    #[arg(long = "debug", default_value_t = false)]
    debug: bool,
}

// One frame of the 4.194304 MHz clock (70224 cycles)
const FRAME_DURATION: Duration = Duration::from_nanos(16_742_706);

fn map_key(keycode: Keycode) -> Option<Button> {
    let button = match keycode {
        Keycode::Z => Button::A,
        Keycode::X => Button::B,
        Keycode::RShift => Button::Select,
        Keycode::Return => Button::Start,
        Keycode::Right => Button::Right,
        Keycode::Left => Button::Left,
        Keycode::Up => Button::Up,
        Keycode::Down => Button::Down,
        _ => return None,
    };

    Some(button)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();

    let boot_rom = args
        .boot_rom_path
        .as_deref()
        .map(fs::read)
        .transpose()
        .context("error reading boot image")?;

    let options = GameBoyOptions {
        debug: args.debug,
        force_cart_type: args.force_cart_type,
        skip_boot_rom: args.skip_boot_rom,
    };
    let mut gameboy = GameBoy::from_file(&args.rom_file_path, boot_rom, options)
        .context("error initializing machine")?;

    let sdl = sdl2::init().map_err(|msg| anyhow!("SDL init error: {msg}"))?;
    let video = sdl.video().map_err(|msg| anyhow!("SDL video error: {msg}"))?;

    let window = video
        .window(
            &format!("dotmatrix - {}", gameboy.rom_title()),
            SCREEN_WIDTH as u32 * args.scale,
            SCREEN_HEIGHT as u32 * args.scale,
        )
        .position_centered()
        .build()?;

    let mut canvas_builder = window.into_canvas();
    if args.vsync_enabled {
        canvas_builder = canvas_builder.present_vsync();
    }
    let mut canvas = canvas_builder.build()?;

    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator.create_texture_streaming(
        PixelFormatEnum::RGBA32,
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    )?;

    let mut event_pump = sdl
        .event_pump()
        .map_err(|msg| anyhow!("SDL event error: {msg}"))?;

    // 1 = released, matching the hardware pull-ups
    let mut buttons = 0xFF_u8;
    let mut rendered_frames = 0_u64;
    let mut next_frame_time = Instant::now();

    'running: loop {
        let frame = gameboy.run_frame().context("emulation stopped")?;

        texture
            .with_lock(None, |pixels: &mut [u8], pitch: usize| {
                for (y, row) in frame.iter().enumerate() {
                    for (x, color) in row.iter().enumerate() {
                        let start = y * pitch + 4 * x;
                        pixels[start..start + 4].copy_from_slice(&color.to_be_bytes());
                    }
                }
            })
            .map_err(|msg| anyhow!("texture update error: {msg}"))?;

        canvas.clear();
        canvas
            .copy(&texture, None, None)
            .map_err(|msg| anyhow!("render error: {msg}"))?;
        canvas.present();

        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown { keycode: Some(Keycode::Escape), .. } => break 'running,
                Event::KeyDown { keycode: Some(keycode), .. } => {
                    if let Some(button) = map_key(keycode) {
                        buttons &= !button.mask_bit();
                    }
                }
                Event::KeyUp { keycode: Some(keycode), .. } => {
                    if let Some(button) = map_key(keycode) {
                        buttons |= button.mask_bit();
                    }
                }
                _ => {}
            }
        }
        gameboy.set_buttons(buttons);

        // Flush battery RAM roughly once per second
        rendered_frames += 1;
        if rendered_frames % 60 == 0 {
            gameboy.persist_sav().context("error writing sav file")?;
        }

        // Pace manually when vsync is not doing it for us
        if !args.vsync_enabled {
            next_frame_time += FRAME_DURATION;
            let now = Instant::now();
            if next_frame_time > now {
                std::thread::sleep(next_frame_time - now);
            } else {
                next_frame_time = now;
            }
        }
    }

    gameboy.persist_sav().context("error writing sav file")?;

    Ok(())
}
