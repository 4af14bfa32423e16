use crate::audio::{AudioConsumer, AudioSpec};
use crate::error::{AudioHostError, DisplayError};

/// Locked 32-bit presentation memory. `pitch` is in pixels.
pub struct PresentationSurface<'a> {
    pub pixels: &'a mut [u32],
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
}

/// Host display: owns the window and the presentation surface.
pub trait Display {
    /// Resize the presentation output to a new native resolution.
    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    /// Lock the presentation surface, run `blit` over it, and release it.
    fn with_surface(
        &mut self,
        blit: &mut dyn FnMut(&mut PresentationSurface<'_>),
    ) -> Result<(), DisplayError>;

    fn present(&mut self) -> Result<(), DisplayError>;
}

/// Host audio subsystem.
///
/// The host pulls samples through the [`AudioConsumer`] it is given on
/// `open`, from whatever execution context it likes.
pub trait AudioHost {
    /// Request a playback device. When `allow_rate_change` is set the host
    /// may grant a different rate and block size; the granted spec is
    /// returned either way.
    fn open(
        &mut self,
        desired: &AudioSpec,
        allow_rate_change: bool,
        consumer: AudioConsumer,
    ) -> Result<AudioSpec, AudioHostError>;

    /// Start pulling from the consumer. Devices open paused.
    fn resume(&mut self);

    /// Release the device. A no-op when nothing is open.
    fn close(&mut self);
}
