pub mod mode;
pub mod pixel;
pub mod schedule;

pub use mode::{ColumnMode, ModeDescriptor, RefreshRate, VideoModeController};
pub use pixel::{MarginPolicy, NativeFormat, NativeFrame, convert_frame};
pub use schedule::{Cadence, CancelToken, FrameSchedule};
