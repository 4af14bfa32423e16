pub mod playback;
pub mod ring;

pub use playback::{AudioSpec, PlaybackBridge, PlaybackState};
pub use ring::{AudioConsumer, AudioRing};
