pub mod emulation;
pub mod host;

pub use emulation::{EmulationCore, FrameIo, InputDevice, ModeSignal, PAD_PORTS, Region};
pub use host::{AudioHost, Display, PresentationSurface};
