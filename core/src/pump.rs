//! Per-tick driver: steps the core, converts and presents the frame, and
//! hands the audio block to playback.

use tracing::warn;

use crate::audio::PlaybackBridge;
use crate::core::{AudioHost, Display, EmulationCore, FrameIo, ModeSignal};
use crate::session::SessionFlags;
use crate::video::{MarginPolicy, ModeDescriptor, NativeFormat, NativeFrame, convert_frame};

/// Native framebuffer geometry: widest column mode by tallest PAL frame.
pub const NATIVE_WIDTH: usize = 320;
pub const NATIVE_HEIGHT: usize = 240;

/// Room for one frame of stereo audio at rates up to 96 kHz / 50 Hz.
const AUDIO_BLOCK_CAPACITY: usize = 4096;

/// What a single tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The core advanced one frame.
    pub stepped: bool,
    /// A frame was converted and presented.
    pub blitted: bool,
    pub audio_pushed: bool,
    /// Timing change reported by the core during the step.
    pub mode_change: Option<ModeSignal>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub ticks: u64,
    pub frames_stepped: u64,
    pub blits: u64,
    pub audio_pushes: u64,
}

pub struct FramePump {
    framebuffer: Vec<u16>,
    pitch: usize,
    audio: Vec<i16>,
    format: NativeFormat,
    margin: MarginPolicy,
    stats: PumpStats,
}

impl FramePump {
    /// Allocates the native framebuffer and audio block once.
    pub fn new(format: NativeFormat, margin: MarginPolicy) -> Self {
        Self {
            framebuffer: vec![0; NATIVE_WIDTH * NATIVE_HEIGHT],
            pitch: NATIVE_WIDTH,
            audio: Vec::with_capacity(AUDIO_BLOCK_CAPACITY),
            format,
            margin,
            stats: PumpStats::default(),
        }
    }

    pub fn stats(&self) -> &PumpStats {
        &self.stats
    }

    pub fn format(&self) -> NativeFormat {
        self.format
    }

    /// The most recent audio block produced by the core.
    pub fn audio_block(&self) -> &[i16] {
        &self.audio
    }

    /// Run one host-scheduled tick.
    ///
    /// With graphics on, the display is cleared, the core is stepped (or
    /// only redrawn while simulation is paused), and the visible window is
    /// converted and presented. With graphics off the core is stepped
    /// headless. Without a cartridge the core is left alone and the tick
    /// completes as an idle frame.
    pub fn tick<C, A, D>(
        &mut self,
        flags: &SessionFlags,
        loaded: bool,
        mode: &ModeDescriptor,
        core: &mut C,
        display: &mut D,
        playback: &PlaybackBridge<A>,
    ) -> TickReport
    where
        C: EmulationCore + ?Sized,
        A: AudioHost,
        D: Display + ?Sized,
    {
        let mut report = TickReport::default();
        self.stats.ticks += 1;

        if flags.render_graphics {
            display.clear();
            if loaded {
                let mut io = FrameIo::new(&mut self.framebuffer, self.pitch, &mut self.audio);
                if flags.simulate {
                    core.apply_patches();
                    core.run_frame(&mut io);
                    report.stepped = true;
                } else {
                    core.draw_frame(&mut io);
                }
                report.mode_change = io.take_mode_change();
            }
            report.blitted = self.blit(mode, display);
        } else if flags.simulate && loaded {
            let mut io = FrameIo::new(&mut self.framebuffer, self.pitch, &mut self.audio);
            core.apply_patches();
            core.run_frame(&mut io);
            report.stepped = true;
            report.mode_change = io.take_mode_change();
        }

        if report.stepped {
            self.stats.frames_stepped += 1;
            if flags.render_audio && !self.audio.is_empty() {
                report.audio_pushed = playback.push(&self.audio);
            }
        }
        if report.blitted {
            self.stats.blits += 1;
        }
        if report.audio_pushed {
            self.stats.audio_pushes += 1;
        }
        report
    }

    fn blit<D: Display + ?Sized>(&self, mode: &ModeDescriptor, display: &mut D) -> bool {
        let first = (mode.start_line as usize * self.pitch).min(self.framebuffer.len());
        let frame = NativeFrame {
            pixels: &self.framebuffer[first..],
            width: mode.width() as usize,
            height: mode.line_count as usize,
            pitch: self.pitch,
        };
        let (format, margin) = (self.format, self.margin);

        let result = display
            .with_surface(&mut |surface| {
                convert_frame(&frame, surface, format, margin);
            })
            .and_then(|()| display.present());
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("frame dropped: {e}");
                false
            }
        }
    }
}
