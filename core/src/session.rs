//! Control surface for one emulation session.
//!
//! A [`Session`] owns every piece of per-session state (core, flags, audio
//! ring, playback device, video mode and frame pump) and is driven by the
//! host shell: control calls mutate it between ticks, and the host calls
//! [`Session::tick`] once per cadence period.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::audio::{AudioRing, PlaybackBridge, PlaybackState};
use crate::core::{AudioHost, Display, EmulationCore, InputDevice, ModeSignal, PAD_PORTS};
use crate::error::SessionError;
use crate::pump::{FramePump, PumpStats, TickReport};
use crate::video::{Cadence, MarginPolicy, ModeDescriptor, NativeFormat, VideoModeController};

/// Flags the frame pump reads every tick. Only the session writes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionFlags {
    pub simulate: bool,
    pub render_graphics: bool,
    pub render_audio: bool,
    pub sprite_limit_enabled: bool,
}

impl Default for SessionFlags {
    fn default() -> Self {
        Self {
            simulate: true,
            render_graphics: true,
            render_audio: false,
            sprite_limit_enabled: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Output rate requested from the audio host.
    pub sample_rate: u32,
    /// Ring size in samples, rounded up to a power of two.
    pub ring_capacity: usize,
    pub native_format: NativeFormat,
    pub margin: MarginPolicy,
    /// Try to open audio at startup.
    pub audio_enabled: bool,
    pub simulate: bool,
    pub sprite_limit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            ring_capacity: 8192,
            native_format: NativeFormat::Rgb565,
            margin: MarginPolicy::Keep,
            audio_enabled: true,
            simulate: true,
            sprite_limit: true,
        }
    }
}

pub struct Session<C: EmulationCore, A: AudioHost, D: Display> {
    core: C,
    display: D,
    flags: SessionFlags,
    ring: Arc<AudioRing>,
    playback: PlaybackBridge<A>,
    video: VideoModeController,
    pump: FramePump,
    loaded: bool,
}

impl<C: EmulationCore, A: AudioHost, D: Display> Session<C, A, D> {
    /// Set up the session at the default video mode with its cadence armed.
    ///
    /// When audio is enabled but the host has no device, the session starts
    /// video-only.
    pub fn new(mut core: C, audio_host: A, mut display: D, config: &SessionConfig) -> Self {
        let ring = Arc::new(AudioRing::new(config.ring_capacity));
        let mut playback = PlaybackBridge::new(audio_host, Arc::clone(&ring), config.sample_rate);
        let video = VideoModeController::new();
        display.resize(video.current().width(), video.current().height());

        core.set_sprite_limit(config.sprite_limit);
        let mut flags = SessionFlags {
            simulate: config.simulate,
            sprite_limit_enabled: config.sprite_limit,
            ..SessionFlags::default()
        };

        if config.audio_enabled {
            match playback.open(&mut core) {
                Ok(()) => flags.render_audio = true,
                Err(e) => warn!("running without audio: {e}"),
            }
        }

        Self {
            core,
            display,
            flags,
            ring,
            playback,
            video,
            pump: FramePump::new(config.native_format, config.margin),
            loaded: false,
        }
    }

    /// Insert a cartridge, replacing the current one.
    ///
    /// The image is copied into a fallibly allocated buffer handed to the
    /// core. On success the audio ring is cleared and the core's timing is
    /// re-read, which may change video mode and cadence. An open audio
    /// device is reopened if the per-frame block size changed.
    pub fn load_cartridge(&mut self, data: &[u8]) -> Result<(), SessionError> {
        let mut rom = Vec::new();
        rom.try_reserve_exact(data.len())
            .map_err(|source| SessionError::Allocation {
                size: data.len(),
                source,
            })?;
        rom.extend_from_slice(data);

        if let Err(e) = self.core.insert_cartridge(rom) {
            warn!("cartridge load failed: {e}");
            self.loaded = false;
            return Err(e.into());
        }
        self.loaded = true;
        self.ring.reset();
        info!(size = data.len(), "cartridge loaded");

        let signal = self.core.video_mode();
        self.on_video_mode_change(signal.start_line, signal.line_count, signal.wide_columns);

        // New timing can change samples per frame; the device block follows.
        if !self.playback.block_matches(&self.core) {
            info!("cartridge changed audio block size, reopening device");
            if let Err(e) = self.playback.open(&mut self.core) {
                warn!("running without audio: {e}");
                self.flags.render_audio = false;
            }
        }
        Ok(())
    }

    pub fn unload_cartridge(&mut self) {
        if self.loaded {
            self.core.unload_cartridge();
            self.loaded = false;
            info!("cartridge unloaded");
        }
    }

    pub fn set_sprite_limit(&mut self, enabled: bool) {
        self.flags.sprite_limit_enabled = enabled;
        self.core.set_sprite_limit(enabled);
    }

    /// Out-of-range ports are ignored.
    pub fn set_input_device(&mut self, port: usize, device: InputDevice) {
        if port >= PAD_PORTS {
            debug!(port, "ignoring input device for unknown port");
            return;
        }
        self.core.set_input_device(port, device);
    }

    /// Out-of-range ports are ignored.
    pub fn send_input(&mut self, port: usize, buttons: u16) {
        if port < PAD_PORTS {
            self.core.set_pad(port, buttons);
        }
    }

    /// Update the loop flags. Turning audio on reopens the playback device;
    /// turning it off closes it.
    ///
    /// If the device cannot be opened the session stays video-only and the
    /// error is returned for the shell to report.
    pub fn set_loop_mode(
        &mut self,
        simulate: bool,
        render_graphics: bool,
        render_audio: bool,
    ) -> Result<(), SessionError> {
        self.flags.simulate = simulate;
        self.flags.render_graphics = render_graphics;

        if render_audio == self.flags.render_audio {
            return Ok(());
        }
        if render_audio {
            if let Err(e) = self.playback.open(&mut self.core) {
                warn!("audio stays off: {e}");
                return Err(e.into());
            }
            self.flags.render_audio = true;
        } else {
            self.playback.close();
            self.flags.render_audio = false;
        }
        Ok(())
    }

    /// Timing notification from the core.
    pub fn on_video_mode_change(&mut self, start_line: u16, line_count: u16, wide_columns: bool) {
        let signal = ModeSignal {
            start_line,
            line_count,
            wide_columns,
        };
        let region = self.core.region();
        self.video
            .on_video_mode_change(signal, region, &mut self.display);
    }

    /// One cadence period of work.
    pub fn tick(&mut self) -> TickReport {
        let mode = *self.video.current();
        let report = self.pump.tick(
            &self.flags,
            self.loaded,
            &mode,
            &mut self.core,
            &mut self.display,
            &self.playback,
        );
        if let Some(signal) = report.mode_change {
            self.on_video_mode_change(signal.start_line, signal.line_count, signal.wide_columns);
        }
        report
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mode(&self) -> &ModeDescriptor {
        self.video.current()
    }

    /// The active frame cadence. Host loops clone it and poll its token.
    pub fn cadence(&self) -> Option<&Cadence> {
        self.video.cadence()
    }

    pub fn video(&self) -> &VideoModeController {
        &self.video
    }

    pub fn playback_state(&self) -> &PlaybackState {
        self.playback.state()
    }

    pub fn audio_host(&self) -> &A {
        self.playback.host()
    }

    pub fn ring(&self) -> &Arc<AudioRing> {
        &self.ring
    }

    pub fn stats(&self) -> &PumpStats {
        self.pump.stats()
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }
}
