#![allow(dead_code)]

use picobridge_core::audio::{AudioConsumer, AudioSpec};
use picobridge_core::core::{
    AudioHost, Display, EmulationCore, FrameIo, InputDevice, ModeSignal, PAD_PORTS,
    PresentationSurface, Region,
};
use picobridge_core::error::{AudioHostError, CoreError, DisplayError};

pub const NARROW_224: ModeSignal = ModeSignal {
    start_line: 8,
    line_count: 224,
    wide_columns: false,
};

pub const WIDE_224: ModeSignal = ModeSignal {
    start_line: 8,
    line_count: 224,
    wide_columns: true,
};

/// Emulation core double: fills the framebuffer with one colour and emits
/// a constant audio block, recording every call made on it.
pub struct MockCore {
    pub sample_rate: u32,
    pub region: Region,
    pub mode: ModeSignal,
    pub colour: u16,
    pub cartridge: Option<Vec<u8>>,
    pub reject_cartridge: bool,
    /// Region the core detects from the next inserted cartridge.
    pub insert_region: Option<Region>,
    pub frames_run: u32,
    pub frames_drawn: u32,
    pub patches_applied: u32,
    pub rerates: Vec<u32>,
    pub pads: [u16; PAD_PORTS],
    pub devices: [InputDevice; PAD_PORTS],
    pub sprite_limit: bool,
    /// Reported through `FrameIo` on the next `run_frame`.
    pub pending_mode: Option<ModeSignal>,
}

impl MockCore {
    pub fn new() -> Self {
        Self {
            sample_rate: 44_100,
            region: Region::Ntsc,
            mode: NARROW_224,
            colour: 0xF800,
            cartridge: None,
            reject_cartridge: false,
            insert_region: None,
            frames_run: 0,
            frames_drawn: 0,
            patches_applied: 0,
            rerates: Vec::new(),
            pads: [0; PAD_PORTS],
            devices: [InputDevice::ThreeButton; PAD_PORTS],
            sprite_limit: false,
            pending_mode: None,
        }
    }

    fn render(&self, io: &mut FrameIo<'_>) {
        let colour = self.colour;
        let (pixels, _pitch) = io.framebuffer();
        pixels.fill(colour);
    }
}

impl EmulationCore for MockCore {
    fn insert_cartridge(&mut self, rom: Vec<u8>) -> Result<(), CoreError> {
        if rom.is_empty() {
            return Err(CoreError::EmptyCartridge);
        }
        if self.reject_cartridge {
            return Err(CoreError::Rejected("bad header".into()));
        }
        if let Some(region) = self.insert_region.take() {
            self.region = region;
        }
        self.cartridge = Some(rom);
        Ok(())
    }

    fn unload_cartridge(&mut self) {
        self.cartridge = None;
    }

    fn apply_patches(&mut self) {
        self.patches_applied += 1;
    }

    fn run_frame(&mut self, io: &mut FrameIo<'_>) {
        self.frames_run += 1;
        self.render(io);
        let block = vec![1000i16; self.samples_per_frame() * 2];
        io.on_audio_block_produced(&block);
        if let Some(mode) = self.pending_mode.take() {
            self.mode = mode;
            io.on_video_mode_change(mode.start_line, mode.line_count, mode.wide_columns);
        }
    }

    fn draw_frame(&mut self, io: &mut FrameIo<'_>) {
        self.frames_drawn += 1;
        self.render(io);
    }

    fn rerate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.rerates.push(sample_rate);
    }

    fn samples_per_frame(&self) -> usize {
        let hz = match self.region {
            Region::Ntsc => 60,
            Region::Pal => 50,
        };
        (self.sample_rate / hz) as usize
    }

    fn region(&self) -> Region {
        self.region
    }

    fn video_mode(&self) -> ModeSignal {
        self.mode
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

/// Audio host double. Grants exactly what is asked unless told to coerce
/// the rate or block size.
#[derive(Default)]
pub struct MockAudioHost {
    pub grant_rate: Option<u32>,
    pub grant_block: Option<u16>,
    pub fail: bool,
    pub opens: Vec<(AudioSpec, bool)>,
    pub closes: u32,
    pub resumes: u32,
    pub consumer: Option<AudioConsumer>,
}

impl MockAudioHost {
    pub fn coercing(rate: u32) -> Self {
        Self {
            grant_rate: Some(rate),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl AudioHost for MockAudioHost {
    fn open(
        &mut self,
        desired: &AudioSpec,
        allow_rate_change: bool,
        consumer: AudioConsumer,
    ) -> Result<AudioSpec, AudioHostError> {
        self.opens.push((*desired, allow_rate_change));
        if self.fail {
            return Err(AudioHostError::NoDevice);
        }
        let granted = if allow_rate_change {
            AudioSpec {
                rate: self.grant_rate.unwrap_or(desired.rate),
                block_size: self.grant_block.unwrap_or(desired.block_size),
                ..*desired
            }
        } else {
            *desired
        };
        self.consumer = Some(consumer);
        Ok(granted)
    }

    fn resume(&mut self) {
        self.resumes += 1;
    }

    fn close(&mut self) {
        self.closes += 1;
        self.consumer = None;
    }
}

/// Display double backed by a plain pixel vector.
#[derive(Default)]
pub struct MockDisplay {
    pub pixels: Vec<u32>,
    pub width: usize,
    pub height: usize,
    pub resizes: Vec<(u32, u32)>,
    pub clears: u32,
    pub presents: u32,
    pub fail_surface: bool,
}

impl Display for MockDisplay {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width as usize;
        self.height = height as usize;
        self.pixels = vec![0; self.width * self.height];
        self.resizes.push((width, height));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn with_surface(
        &mut self,
        blit: &mut dyn FnMut(&mut PresentationSurface<'_>),
    ) -> Result<(), DisplayError> {
        if self.fail_surface {
            return Err(DisplayError::Surface("locked elsewhere".into()));
        }
        let mut surface = PresentationSurface {
            pixels: &mut self.pixels,
            width: self.width,
            height: self.height,
            pitch: self.width,
        };
        blit(&mut surface);
        Ok(())
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        self.presents += 1;
        Ok(())
    }
}
