use std::sync::Arc;

use tracing::{debug, error, info};

use crate::audio::ring::AudioRing;
use crate::core::{AudioHost, EmulationCore};
use crate::error::AudioHostError;

/// Stereo sample frames per device callback.
pub type BlockSize = u16;

/// Playback format as requested from, or granted by, the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioSpec {
    pub rate: u32,
    pub channels: u8,
    pub block_size: BlockSize,
}

impl AudioSpec {
    pub fn stereo(rate: u32, block_size: BlockSize) -> Self {
        Self {
            rate,
            channels: 2,
            block_size,
        }
    }
}

/// Negotiated device parameters. Only [`PlaybackBridge`] writes these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub requested_rate: u32,
    pub actual_rate: u32,
    pub requested_block_size: BlockSize,
    pub actual_block_size: BlockSize,
    pub is_open: bool,
}

/// Owns the live audio output and reconciles what the core produces with
/// what the host grants.
///
/// `Closed -> Open -> Closed`; reopening an open bridge closes first.
pub struct PlaybackBridge<A: AudioHost> {
    host: A,
    ring: Arc<AudioRing>,
    state: PlaybackState,
    // Rate the core's tables were last computed for. Requested on open.
    core_rate: u32,
}

impl<A: AudioHost> PlaybackBridge<A> {
    /// `requested_rate` is also the rate the core starts out at.
    pub fn new(host: A, ring: Arc<AudioRing>, requested_rate: u32) -> Self {
        Self {
            host,
            ring,
            state: PlaybackState {
                requested_rate,
                ..PlaybackState::default()
            },
            core_rate: requested_rate,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn ring(&self) -> &Arc<AudioRing> {
        &self.ring
    }

    pub fn host(&self) -> &A {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut A {
        &mut self.host
    }

    /// Open the output device, renegotiating with the host if it coerces
    /// the rate, then clear the ring and start playback.
    ///
    /// On failure the bridge is left closed; the caller decides whether to
    /// carry on without audio.
    pub fn open<C: EmulationCore + ?Sized>(&mut self, core: &mut C) -> Result<(), AudioHostError> {
        if self.state.is_open {
            self.close();
        }

        // A coerced rate sticks: the core stays at what the host granted and
        // later opens ask for that, so each open rerates at most once.
        let desired = AudioSpec::stereo(self.core_rate, block_size_of(core));
        self.state.requested_rate = desired.rate;
        self.state.requested_block_size = desired.block_size;

        let granted = match self.negotiate(core, &desired) {
            Ok(granted) => granted,
            Err(e) => {
                error!("audio open failed: {e}");
                self.state.is_open = false;
                return Err(e);
            }
        };

        self.state.actual_rate = granted.rate;
        self.state.actual_block_size = granted.block_size;
        self.state.is_open = true;
        self.ring.reset();
        self.host.resume();

        info!(
            rate = granted.rate,
            block_size = granted.block_size,
            "audio device open"
        );
        Ok(())
    }

    fn negotiate<C: EmulationCore + ?Sized>(
        &mut self,
        core: &mut C,
        desired: &AudioSpec,
    ) -> Result<AudioSpec, AudioHostError> {
        let mut granted = self.host.open(desired, true, self.ring.consumer())?;
        if granted.rate == desired.rate {
            return Ok(granted);
        }

        debug!(
            requested = desired.rate,
            granted = granted.rate,
            "host coerced sample rate"
        );
        self.rerate(core, granted.rate);

        // The producer's block must match the device block or playback drifts.
        let block_size = block_size_of(core);
        if granted.block_size != block_size {
            debug!(
                granted = granted.block_size,
                wanted = block_size,
                "reopening with exact block size"
            );
            self.host.close();
            let exact = AudioSpec {
                block_size,
                ..granted
            };
            granted = self.host.open(&exact, false, self.ring.consumer())?;
        }
        Ok(granted)
    }

    fn rerate<C: EmulationCore + ?Sized>(&mut self, core: &mut C, rate: u32) {
        core.rerate(rate);
        self.core_rate = rate;
    }

    /// Release the device. Pushes are dropped until the next `open`.
    pub fn close(&mut self) {
        if self.state.is_open {
            self.host.close();
            self.state.is_open = false;
            info!("audio device closed");
        }
    }

    /// Whether the device block still matches what the core produces per
    /// frame. False after a timing change on an open device.
    pub fn block_matches<C: EmulationCore + ?Sized>(&self, core: &C) -> bool {
        !self.state.is_open || self.state.actual_block_size == block_size_of(core)
    }

    /// Forward a produced block to the ring. Returns false when the device
    /// is closed and the block was dropped.
    pub fn push(&self, samples: &[i16]) -> bool {
        if !self.state.is_open {
            return false;
        }
        self.ring.push(samples);
        true
    }
}

fn block_size_of<C: EmulationCore + ?Sized>(core: &C) -> BlockSize {
    core.samples_per_frame().min(BlockSize::MAX as usize) as BlockSize
}
