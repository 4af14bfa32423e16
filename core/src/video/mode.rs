use tracing::info;

use crate::core::{Display, ModeSignal, Region};
use crate::video::schedule::{Cadence, FrameSchedule};

/// Horizontal resolution selected by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColumnMode {
    /// 32 cells, 256 pixels.
    #[default]
    Narrow,
    /// 40 cells, 320 pixels.
    Wide,
}

impl ColumnMode {
    pub fn width(self) -> u32 {
        match self {
            ColumnMode::Narrow => 256,
            ColumnMode::Wide => 320,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RefreshRate {
    Hz50,
    #[default]
    Hz60,
}

impl RefreshRate {
    pub fn hz(self) -> u32 {
        match self {
            RefreshRate::Hz50 => 50,
            RefreshRate::Hz60 => 60,
        }
    }
}

impl From<Region> for RefreshRate {
    fn from(region: Region) -> Self {
        match region {
            Region::Pal => RefreshRate::Hz50,
            Region::Ntsc => RefreshRate::Hz60,
        }
    }
}

/// Video timing in effect. Always replaced whole, never patched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeDescriptor {
    pub start_line: u16,
    pub line_count: u16,
    pub column_mode: ColumnMode,
    pub refresh: RefreshRate,
}

impl Default for ModeDescriptor {
    fn default() -> Self {
        Self {
            start_line: 8,
            line_count: 224,
            column_mode: ColumnMode::Narrow,
            refresh: RefreshRate::Hz60,
        }
    }
}

impl ModeDescriptor {
    /// Build a descriptor from a core notification and the region read at
    /// the same moment.
    pub fn from_signal(signal: ModeSignal, region: Region) -> Self {
        Self {
            start_line: signal.start_line,
            line_count: signal.line_count,
            column_mode: if signal.wide_columns {
                ColumnMode::Wide
            } else {
                ColumnMode::Narrow
            },
            refresh: region.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.column_mode.width()
    }

    pub fn height(&self) -> u32 {
        self.line_count as u32
    }
}

/// Owns the current [`ModeDescriptor`] and the frame cadence derived from
/// it. This is the only place cadence changes.
pub struct VideoModeController {
    current: ModeDescriptor,
    schedule: FrameSchedule,
}

impl Default for VideoModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoModeController {
    /// Start at the default mode with its cadence armed.
    pub fn new() -> Self {
        let current = ModeDescriptor::default();
        let mut schedule = FrameSchedule::new();
        schedule.arm(current.refresh);
        Self { current, schedule }
    }

    pub fn current(&self) -> &ModeDescriptor {
        &self.current
    }

    pub fn schedule(&self) -> &FrameSchedule {
        &self.schedule
    }

    pub fn cadence(&self) -> Option<&Cadence> {
        self.schedule.active()
    }

    /// Handle a timing notification from the core.
    ///
    /// A changed descriptor resizes the display and restarts the cadence.
    /// An unchanged one does nothing. Returns whether anything changed.
    pub fn on_video_mode_change<D: Display + ?Sized>(
        &mut self,
        signal: ModeSignal,
        region: Region,
        display: &mut D,
    ) -> bool {
        let next = ModeDescriptor::from_signal(signal, region);
        if next == self.current {
            return false;
        }

        info!(
            width = next.width(),
            lines = next.line_count,
            start_line = next.start_line,
            hz = next.refresh.hz(),
            "video mode changed"
        );
        self.current = next;
        display.resize(next.width(), next.height());
        self.schedule.arm(next.refresh);
        true
    }
}
