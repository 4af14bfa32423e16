//! Frontend configuration: a TOML file under the user config directory,
//! overridden by command-line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use picobridge_core::core::InputDevice;
use picobridge_core::session::SessionConfig;
use picobridge_core::video::{MarginPolicy, NativeFormat};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatName {
    Rgb565,
    Rgb555,
}

impl From<FormatName> for NativeFormat {
    fn from(name: FormatName) -> Self {
        match name {
            FormatName::Rgb565 => NativeFormat::Rgb565,
            FormatName::Rgb555 => NativeFormat::Rgb555,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadName {
    None,
    #[serde(rename = "3button")]
    ThreeButton,
    #[serde(rename = "6button")]
    SixButton,
}

impl From<PadName> for InputDevice {
    fn from(name: PadName) -> Self {
        match name {
            PadName::None => InputDevice::None,
            PadName::ThreeButton => InputDevice::ThreeButton,
            PadName::SixButton => InputDevice::SixButton,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sample_rate: u32,
    pub ring_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 44_100,
            ring_capacity: 8192,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub scale: u32,
    pub format: FormatName,
    /// Blank the part of the window the native frame does not cover.
    pub clear_margins: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            scale: 3,
            format: FormatName::Rgb565,
            clear_margins: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub simulate: bool,
    pub sprite_limit: bool,
    pub pads: [PadName; 2],
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            simulate: true,
            sprite_limit: true,
            pads: [PadName::ThreeButton, PadName::ThreeButton],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub video: VideoConfig,
    pub session: SessionSection,
    /// Pad button name to SDL scancode name, e.g. `start = "Space"`.
    pub input: BTreeMap<String, String>,
}

impl Config {
    /// `$XDG_CONFIG_HOME/picobridge/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("picobridge").join("config.toml"))
    }

    /// Load from `path`, or from the default location if none is given.
    /// A missing default file yields the defaults; an explicit path must
    /// exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sample_rate: self.audio.sample_rate,
            ring_capacity: self.audio.ring_capacity,
            native_format: self.video.format.into(),
            margin: if self.video.clear_margins {
                MarginPolicy::Clear
            } else {
                MarginPolicy::Keep
            },
            audio_enabled: self.audio.enabled,
            simulate: self.session.simulate,
            sprite_limit: self.session.sprite_limit,
        }
    }
}
