mod keymap;

use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{ensure, Context};
use chip8_vm::{
    pixel_bytes, render_pixels, Chip8Builder, Chip8Color, PrintMode, Quirks,
    DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR, SCREEN_HEIGHT, SCREEN_WIDTH,
};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use sdl2::{event::Event, keyboard::Keycode, pixels::PixelFormatEnum};

use crate::keymap::keymap;

/// Longest wall time slice fed to the CPU in one iteration
const MAX_FRAME_TIME: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DumpMode {
    Dec,
    Hex,
    Bin,
}

impl From<DumpMode> for PrintMode {
    fn from(mode: DumpMode) -> PrintMode {
        match mode {
            DumpMode::Dec => PrintMode::Dec,
            DumpMode::Hex => PrintMode::Hex,
            DumpMode::Bin => PrintMode::Bin,
        }
    }
}

/// CHIP-8 Emulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Filepath to Chip-8 ROM file that will be executed
    #[clap(index = 1)]
    rom: PathBuf,

    /// Filepath to font file
    #[clap(long)]
    font: Option<PathBuf>,

    /// Background Color as HEX 0xAABBFF [default: 0x000000]
    #[clap(long)]
    background: Option<Chip8Color>,

    /// Foreground Color as HEX 0xAABBFF [default: 0xF0FF00]
    #[clap(long)]
    foreground: Option<Chip8Color>,

    /// Display scaling factor
    #[clap(short, long, default_value_t = 20)]
    scale: u32,

    /// Instructions per second
    #[clap(short, long, default_value_t = 10_000)]
    ips: u32,

    /// Timer and vblank checks per second
    #[clap(long, default_value_t = 60)]
    fps: u32,

    /// PRNG seed
    #[clap(long)]
    seed: Option<u64>,

    /// FX55/FX65 advance I past the transferred registers
    #[clap(long)]
    load_store_increments_i: bool,

    /// Wrap sprites around the screen edges instead of clipping them
    #[clap(long)]
    wrap_sprites: bool,

    /// Print registers and the display when the emulator exits
    #[clap(long, value_enum)]
    dump: Option<DumpMode>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    ensure!(
        (1..=100).contains(&args.scale),
        "Display scaling factor must be between [1-100]"
    );
    ensure!(
        (1..=1_000_000).contains(&args.ips),
        "Instructions per second must be between [1-1000000]"
    );
    ensure!((1..=1000).contains(&args.fps), "Frame rate must be between [1-1000]");

    let rom_data = std::fs::read(&args.rom)
        .with_context(|| format!("Failed to read ROM file {}", args.rom.display()))?;

    let quirks = Quirks {
        load_store_increments_i: args.load_store_increments_i,
        clip_sprites: !args.wrap_sprites,
        ..Quirks::default()
    };
    let mut builder = Chip8Builder::new().with_rom(rom_data).with_quirks(quirks);

    if let Some(font) = &args.font {
        let font_data = std::fs::read(font)
            .with_context(|| format!("Failed to read font file {}", font.display()))?;
        builder = builder.with_font(font_data);
    }

    if let Some(seed) = args.seed {
        builder = builder.with_rng_seed(seed);
    }

    let foreground = args.foreground.unwrap_or(DEFAULT_FOREGROUND_COLOR);
    let background = args.background.unwrap_or(DEFAULT_BACKGROUND_COLOR);

    let mut chip = builder.build().context("Failed to start emulator")?;
    info!("Loaded {}", args.rom.display());

    let sdl_context = sdl2::init().map_err(anyhow::Error::msg)?;
    let video_subsystem = sdl_context.video().map_err(anyhow::Error::msg)?;

    let window = video_subsystem
        .window(
            "chip8-emulator",
            SCREEN_WIDTH as u32 * args.scale,
            SCREEN_HEIGHT as u32 * args.scale,
        )
        .position_centered()
        .resizable()
        .build()
        .context("Failed to create window")?;

    let mut canvas = window
        .into_canvas()
        .build()
        .context("Failed to create renderer")?;

    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator
        .create_texture_streaming(
            PixelFormatEnum::RGBX8888,
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
        )
        .context("Failed to create display texture")?;

    let mut event_pump = sdl_context.event_pump().map_err(anyhow::Error::msg)?;
    let mut pixels = vec![background; SCREEN_WIDTH * SCREEN_HEIGHT];

    let cpu_period = Duration::from_secs(1) / args.ips;
    let frame_period = Duration::from_secs(1) / args.fps;
    let mut cpu_budget = Duration::ZERO;
    let mut frame_budget = Duration::ZERO;
    let mut prev = Instant::now();

    'running: loop {
        // Process events
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::KeyDown {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => {
                    if let Some(code) = keymap(key) {
                        chip.press(code);
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(code) = keymap(key) {
                        chip.release(code);
                    }
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let elapsed = (now - prev).min(MAX_FRAME_TIME);
        prev = now;
        cpu_budget += elapsed;
        frame_budget += elapsed;

        // Execute CHIP-8 instructions owed for the elapsed time
        while cpu_budget >= cpu_period {
            chip.step();
            cpu_budget -= cpu_period;
        }

        while frame_budget >= frame_period {
            chip.tick_vblank();
            frame_budget -= frame_period;
        }

        // If display buffer was changed then draw changes on canvas
        if let Some(display) = chip.take_frame() {
            render_pixels(display, foreground, background, &mut pixels);

            // Copy CHIP-8 display buffer into GPU texture
            texture
                .update(None, pixel_bytes(&pixels), SCREEN_WIDTH * 4)
                .context("Failed to upload display texture")?;

            // Copy texture to Canvas
            canvas.clear();
            canvas.copy(&texture, None, None).map_err(anyhow::Error::msg)?;

            // present canvas on screen
            canvas.present();
        }

        thread::sleep(Duration::from_millis(1));
    }

    if let Some(mode) = args.dump {
        println!("{}", chip.dump(mode.into()));
        println!("{}", chip.display());
    }

    Ok(())
}
