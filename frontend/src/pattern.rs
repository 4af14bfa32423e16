//! Stand-in emulation core that draws colour bars and plays a tone.
//!
//! Lets the bridge run end to end without the real core: it honours the
//! cartridge region byte, reports a column-mode change when Mode is
//! pressed, and pitches its tone by the held d-pad direction.

use picobridge_core::core::{EmulationCore, FrameIo, InputDevice, ModeSignal, PAD_PORTS, Region};
use picobridge_core::error::CoreError;
use picobridge_core::pump::{NATIVE_HEIGHT, NATIVE_WIDTH};
use picobridge_core::video::NativeFormat;
use tracing::debug;

use crate::input::pad;

/// Offset of the first region character in a Mega Drive header.
const REGION_OFFSET: usize = 0x1F0;

/// Eight SMPTE-ish bars as 5-bit RGB.
const BARS: [(u16, u16, u16); 8] = [
    (31, 31, 31),
    (31, 31, 0),
    (0, 31, 31),
    (0, 31, 0),
    (31, 0, 31),
    (31, 0, 0),
    (0, 0, 31),
    (0, 0, 0),
];

pub struct TestPatternCore {
    format: NativeFormat,
    cartridge: Option<Vec<u8>>,
    region: Region,
    wide: bool,
    frame: u32,
    sample_rate: u32,
    phase: u32,
    pads: [u16; PAD_PORTS],
    devices: [InputDevice; PAD_PORTS],
    mode_held: bool,
    sprite_limit: bool,
}

impl TestPatternCore {
    pub fn new(format: NativeFormat, sample_rate: u32) -> Self {
        Self {
            format,
            cartridge: None,
            region: Region::Ntsc,
            wide: true,
            frame: 0,
            sample_rate,
            phase: 0,
            pads: [0; PAD_PORTS],
            devices: [InputDevice::ThreeButton; PAD_PORTS],
            mode_held: false,
            sprite_limit: true,
        }
    }

    fn pack(&self, (r, g, b): (u16, u16, u16)) -> u16 {
        match self.format {
            NativeFormat::Rgb565 => (r << 11) | ((g << 1 | g >> 4) << 5) | b,
            NativeFormat::Rgb555 => (r << 10) | (g << 5) | b,
        }
    }

    fn render(&self, io: &mut FrameIo<'_>) {
        let colours = BARS.map(|bar| self.pack(bar));
        let width = if self.wide { 320 } else { 256 };
        let bar_width = width / BARS.len();
        let scroll = self.frame as usize;
        // Without the sprite limit a marker row crosses the bars.
        let marker = (!self.sprite_limit).then_some(self.frame as usize % NATIVE_HEIGHT);

        let (pixels, pitch) = io.framebuffer();
        for (y, row) in pixels.chunks_mut(pitch).take(NATIVE_HEIGHT).enumerate() {
            for (x, px) in row.iter_mut().take(NATIVE_WIDTH).enumerate() {
                *px = if x >= width || Some(y) == marker {
                    0
                } else {
                    colours[((x + scroll) / bar_width) % BARS.len()]
                };
            }
        }
    }

    fn tone_hz(&self) -> u32 {
        let held = self.pads[0];
        if held & pad::UP != 0 {
            880
        } else if held & pad::DOWN != 0 {
            220
        } else {
            440
        }
    }

    fn mix(&mut self, io: &mut FrameIo<'_>) {
        let frames = self.samples_per_frame();
        let period = (self.sample_rate / self.tone_hz()).max(2);
        let muted = self.devices[0] == InputDevice::None;
        let mut block = Vec::with_capacity(frames * 2);
        for _ in 0..frames {
            let level = if muted {
                0
            } else if self.phase < period / 2 {
                2000
            } else {
                -2000
            };
            block.extend_from_slice(&[level, level]);
            self.phase = (self.phase + 1) % period;
        }
        io.on_audio_block_produced(&block);
    }

    fn signal(&self) -> ModeSignal {
        match self.region {
            Region::Pal => ModeSignal {
                start_line: 0,
                line_count: 240,
                wide_columns: self.wide,
            },
            Region::Ntsc => ModeSignal {
                start_line: 8,
                line_count: 224,
                wide_columns: self.wide,
            },
        }
    }
}

impl EmulationCore for TestPatternCore {
    fn insert_cartridge(&mut self, rom: Vec<u8>) -> Result<(), CoreError> {
        if rom.is_empty() {
            return Err(CoreError::EmptyCartridge);
        }
        self.region = match rom.get(REGION_OFFSET) {
            Some(b'E') => Region::Pal,
            _ => Region::Ntsc,
        };
        self.frame = 0;
        self.phase = 0;
        self.cartridge = Some(rom);
        debug!(region = ?self.region, "test pattern cartridge inserted");
        Ok(())
    }

    fn unload_cartridge(&mut self) {
        self.cartridge = None;
    }

    fn apply_patches(&mut self) {}

    fn run_frame(&mut self, io: &mut FrameIo<'_>) {
        let mode_pressed = self.pads[0] & pad::MODE != 0;
        if mode_pressed && !self.mode_held {
            self.wide = !self.wide;
            let signal = self.signal();
            io.on_video_mode_change(signal.start_line, signal.line_count, signal.wide_columns);
        }
        self.mode_held = mode_pressed;

        self.frame = self.frame.wrapping_add(1);
        self.render(io);
        self.mix(io);
    }

    fn draw_frame(&mut self, io: &mut FrameIo<'_>) {
        self.render(io);
    }

    fn rerate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.phase = 0;
    }

    fn samples_per_frame(&self) -> usize {
        let hz = match self.region {
            Region::Pal => 50,
            Region::Ntsc => 60,
        };
        (self.sample_rate / hz) as usize
    }

    fn region(&self) -> Region {
        self.region
    }

    fn video_mode(&self) -> ModeSignal {
        self.signal()
    }

    fn set_sprite_limit(&mut self, enabled: bool) {
        self.sprite_limit = enabled;
    }

    fn set_input_device(&mut self, port: usize, device: InputDevice) {
        self.devices[port] = device;
    }

    fn set_pad(&mut self, port: usize, buttons: u16) {
        self.pads[port] = buttons;
    }
}

/// Minimal header-only image used when no cartridge path is given.
pub fn blank_cartridge() -> Vec<u8> {
    let mut rom = vec![0u8; 0x200];
    rom[0x100..0x104].copy_from_slice(b"SEGA");
    rom[REGION_OFFSET] = b'U';
    rom
}
