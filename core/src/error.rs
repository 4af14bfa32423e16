use std::collections::TryReserveError;

use thiserror::Error;

/// Failures reported by the emulation core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cartridge image is empty")]
    EmptyCartridge,
    #[error("cartridge rejected: {0}")]
    Rejected(String),
}

/// The host refused to hand out an audio output resource.
#[derive(Debug, Error)]
pub enum AudioHostError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("audio device open failed: {0}")]
    Open(String),
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("presentation surface unavailable: {0}")]
    Surface(String),
    #[error("present failed: {0}")]
    Present(String),
}

/// Errors surfaced by the session control surface.
///
/// None of these are fatal: a failed cartridge load leaves the session
/// idle, a failed audio open leaves it running video-only.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cartridge allocation of {size} bytes failed")]
    Allocation {
        size: usize,
        #[source]
        source: TryReserveError,
    },
    #[error(transparent)]
    Cartridge(#[from] CoreError),
    #[error(transparent)]
    Audio(#[from] AudioHostError),
}
