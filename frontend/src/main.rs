use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use picobridge_core::session::Session;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod audio;
mod config;
mod emulator;
mod input;
mod pattern;
mod rom_path;
mod video;

use config::{Config, FormatName};

/// Presentation bridge between a fixed-rate emulation core and SDL2.
#[derive(Parser, Debug)]
#[command(name = "picobridge", version)]
struct Args {
    /// Cartridge image (.bin/.md/.gen/.smd or a .zip holding one)
    rom: Option<PathBuf>,

    /// Config file (default: <config dir>/picobridge/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window scale factor
    #[arg(long)]
    scale: Option<u32>,

    /// Requested audio sample rate in Hz
    #[arg(long)]
    rate: Option<u32>,

    /// Start without audio
    #[arg(long)]
    no_audio: bool,

    /// Native framebuffer pixel format
    #[arg(long, value_enum)]
    format: Option<FormatName>,

    /// Log filter, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)),
        )
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    apply_args(&mut config, &args);

    let sdl_context = sdl2::init()
        .map_err(anyhow::Error::msg)
        .context("failed to initialize SDL2")?;
    let sdl_video = sdl_context
        .video()
        .map_err(anyhow::Error::msg)
        .context("failed to init SDL video")?;
    let sdl_audio = match sdl_context.audio() {
        Ok(audio) => Some(audio),
        Err(e) => {
            warn!("SDL audio unavailable: {e}");
            None
        }
    };
    let mut event_pump = sdl_context
        .event_pump()
        .map_err(anyhow::Error::msg)
        .context("failed to get event pump")?;

    let session_config = config.session_config();
    let core = pattern::TestPatternCore::new(session_config.native_format, session_config.sample_rate);
    let display = video::SdlDisplay::new(&sdl_video, "picobridge", config.video.scale)?;
    let mut session = Session::new(
        core,
        audio::SdlAudioHost::new(sdl_audio),
        display,
        &session_config,
    );
    for (port, pad) in config.session.pads.iter().enumerate() {
        session.set_input_device(port, (*pad).into());
    }

    let rom = match &args.rom {
        Some(path) => rom_path::load_cartridge(path)
            .with_context(|| format!("failed to read cartridge {}", path.display()))?,
        None => {
            info!("no cartridge given, running test pattern");
            pattern::blank_cartridge()
        }
    };
    if let Err(e) = session.load_cartridge(&rom) {
        error!("cartridge load failed, running idle: {e}");
    }

    let mut key_map = input::default_key_map();
    key_map.apply_overrides(&config.input);

    emulator::run(&mut session, &mut event_pump, &key_map);

    session.unload_cartridge();
    Ok(())
}

fn apply_args(config: &mut Config, args: &Args) {
    if let Some(scale) = args.scale {
        config.video.scale = scale;
    }
    if let Some(rate) = args.rate {
        config.audio.sample_rate = rate;
    }
    if let Some(format) = args.format {
        config.video.format = format;
    }
    if args.no_audio {
        config.audio.enabled = false;
    }
}
