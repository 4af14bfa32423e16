use crate::error::CoreError;

/// Number of controller ports the core exposes.
pub const PAD_PORTS: usize = 2;

/// Console region, read from the core when timing changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
}

/// Controller type plugged into a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputDevice {
    None,
    #[default]
    ThreeButton,
    SixButton,
}

/// Raw timing notification as the core reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSignal {
    pub start_line: u16,
    pub line_count: u16,
    pub wide_columns: bool,
}

/// Per-step context lent to the core for the duration of one
/// `run_frame` or `draw_frame` call.
///
/// The framebuffer is caller-owned memory the core renders into; the
/// audio block and any timing change are collected here and handed back
/// to the frame pump once the step returns.
pub struct FrameIo<'a> {
    framebuffer: &'a mut [u16],
    pitch: usize,
    audio: &'a mut Vec<i16>,
    mode_change: Option<ModeSignal>,
}

impl<'a> FrameIo<'a> {
    /// `pitch` is in pixels. The audio block is cleared before the core sees it.
    pub fn new(framebuffer: &'a mut [u16], pitch: usize, audio: &'a mut Vec<i16>) -> Self {
        audio.clear();
        Self {
            framebuffer,
            pitch,
            audio,
            mode_change: None,
        }
    }

    /// The native framebuffer and its pitch in pixels.
    pub fn framebuffer(&mut self) -> (&mut [u16], usize) {
        (&mut *self.framebuffer, self.pitch)
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Append interleaved stereo samples produced by this step.
    pub fn on_audio_block_produced(&mut self, samples: &[i16]) {
        self.audio.extend_from_slice(samples);
    }

    /// Latch a timing change. The last one reported within a step wins.
    pub fn on_video_mode_change(&mut self, start_line: u16, line_count: u16, wide_columns: bool) {
        self.mode_change = Some(ModeSignal {
            start_line,
            line_count,
            wide_columns,
        });
    }

    pub fn audio_block(&self) -> &[i16] {
        self.audio.as_slice()
    }

    pub fn take_mode_change(&mut self) -> Option<ModeSignal> {
        self.mode_change.take()
    }
}

/// The emulation core driven by the frame pump.
///
/// The bridge never looks inside the core: it hands over cartridge bytes,
/// controller state and a [`FrameIo`] per tick, and reads back timing.
pub trait EmulationCore {
    /// Replace any loaded cartridge with `rom`, taking ownership of the image.
    fn insert_cartridge(&mut self, rom: Vec<u8>) -> Result<(), CoreError>;

    /// Release the current cartridge.
    fn unload_cartridge(&mut self);

    /// Apply pending memory patches (cheats) before the next frame.
    fn apply_patches(&mut self);

    /// Advance one frame, rendering into the framebuffer and producing one
    /// block of audio.
    fn run_frame(&mut self, io: &mut FrameIo<'_>);

    /// Redraw the current frame without advancing emulated state.
    fn draw_frame(&mut self, io: &mut FrameIo<'_>);

    /// Recompute sample-rate dependent tables for a new output rate.
    fn rerate(&mut self, sample_rate: u32);

    /// Stereo sample frames produced per emulated frame at the current rate.
    fn samples_per_frame(&self) -> usize;

    fn region(&self) -> Region;

    /// Current video timing. Queried after a cartridge insert, when the
    /// core re-detects region and display mode.
    fn video_mode(&self) -> ModeSignal;

    fn set_sprite_limit(&mut self, enabled: bool);

    /// `port` is always below [`PAD_PORTS`].
    fn set_input_device(&mut self, port: usize, device: InputDevice);

    /// `port` is always below [`PAD_PORTS`].
    fn set_pad(&mut self, port: usize, buttons: u16);
}
