pub mod audio;
pub mod core;
pub mod error;
pub mod pump;
pub mod session;
pub mod video;

pub mod prelude {
    pub use crate::audio::{AudioConsumer, AudioRing, AudioSpec, PlaybackBridge, PlaybackState};
    pub use crate::core::{
        AudioHost, Display, EmulationCore, FrameIo, InputDevice, ModeSignal, PresentationSurface,
        Region,
    };
    pub use crate::error::{AudioHostError, CoreError, DisplayError, SessionError};
    pub use crate::pump::{FramePump, PumpStats, TickReport};
    pub use crate::session::{Session, SessionConfig, SessionFlags};
    pub use crate::video::{
        Cadence, CancelToken, ColumnMode, FrameSchedule, MarginPolicy, ModeDescriptor,
        NativeFormat, RefreshRate, VideoModeController,
    };
}
