use picobridge_core::audio::{AudioConsumer, AudioSpec};
use picobridge_core::core::AudioHost;
use picobridge_core::error::AudioHostError;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};
use tracing::debug;

/// Number of samples over which to fade in (~2.9 ms of stereo at 44.1 kHz).
const FADE_SAMPLES: u32 = 256;

/// SDL callback that pulls interleaved stereo from the session's ring.
pub(crate) struct AudioPlayer {
    consumer: AudioConsumer,
    fade_in_pos: u32,
}

impl AudioCallback for AudioPlayer {
    type Channel = i16;
    fn callback(&mut self, out: &mut [i16]) {
        self.consumer.fill(out);

        // Ramp up from silence after every (re)open to avoid a click
        for sample in out.iter_mut() {
            if self.fade_in_pos >= FADE_SAMPLES {
                break;
            }
            let gain = self.fade_in_pos as f32 / FADE_SAMPLES as f32;
            *sample = (*sample as f32 * gain) as i16;
            self.fade_in_pos += 1;
        }
    }
}

/// [`AudioHost`] over an SDL2 playback device.
///
/// SDL reports the spec it actually opened with; that is what the bridge
/// sees as granted. `sdl2` opens without SDL's allowed-changes flags, so
/// SDL converts internally and `allow_rate_change` has no effect here.
pub struct SdlAudioHost {
    subsystem: Option<sdl2::AudioSubsystem>,
    device: Option<AudioDevice<AudioPlayer>>,
}

impl SdlAudioHost {
    /// `None` means SDL audio failed to initialize; every open will fail
    /// and the session runs video-only.
    pub fn new(subsystem: Option<sdl2::AudioSubsystem>) -> Self {
        Self {
            subsystem,
            device: None,
        }
    }
}

impl AudioHost for SdlAudioHost {
    fn open(
        &mut self,
        desired: &AudioSpec,
        allow_rate_change: bool,
        consumer: AudioConsumer,
    ) -> Result<AudioSpec, AudioHostError> {
        self.close();
        let subsystem = self.subsystem.as_ref().ok_or(AudioHostError::NoDevice)?;

        let desired_spec = AudioSpecDesired {
            freq: Some(desired.rate as i32),
            channels: Some(desired.channels),
            samples: Some(desired.block_size),
        };
        debug!(?desired, allow_rate_change, "opening SDL playback");

        let mut obtained_spec = None;
        let device = subsystem
            .open_playback(None, &desired_spec, |obtained| {
                obtained_spec = Some((obtained.freq, obtained.channels, obtained.samples));
                AudioPlayer {
                    consumer,
                    fade_in_pos: 0,
                }
            })
            .map_err(AudioHostError::Open)?;
        let granted = match obtained_spec {
            Some((freq, channels, samples)) => granted_spec(freq, channels, samples)?,
            None => *desired,
        };

        // Device starts paused; the bridge resumes it once negotiation is done.
        self.device = Some(device);
        Ok(granted)
    }

    fn resume(&mut self) {
        if let Some(device) = &self.device {
            device.resume();
        }
    }

    fn close(&mut self) {
        if let Some(device) = self.device.take() {
            device.pause();
        }
    }
}

/// Translate SDL's obtained spec. The ring carries interleaved stereo, so
/// any other channel count would play at the wrong speed.
fn granted_spec(freq: i32, channels: u8, samples: u16) -> Result<AudioSpec, AudioHostError> {
    if channels != 2 {
        return Err(AudioHostError::Open(format!(
            "device granted {channels} channel(s), stereo required"
        )));
    }
    let rate = u32::try_from(freq)
        .map_err(|_| AudioHostError::Open(format!("device granted invalid rate {freq}")))?;
    Ok(AudioSpec::stereo(rate, samples))
}
