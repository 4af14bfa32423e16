use std::collections::{BTreeMap, HashMap};

use sdl2::keyboard::Scancode;
use tracing::warn;

/// Mega Drive pad bits as the core reads them.
pub mod pad {
    pub const UP: u16 = 1 << 0;
    pub const DOWN: u16 = 1 << 1;
    pub const LEFT: u16 = 1 << 2;
    pub const RIGHT: u16 = 1 << 3;
    pub const B: u16 = 1 << 4;
    pub const C: u16 = 1 << 5;
    pub const A: u16 = 1 << 6;
    pub const START: u16 = 1 << 7;
    pub const Z: u16 = 1 << 8;
    pub const Y: u16 = 1 << 9;
    pub const X: u16 = 1 << 10;
    pub const MODE: u16 = 1 << 11;
}

/// Button names accepted in the `[input]` config table.
const BUTTONS: &[(&str, u16)] = &[
    ("up", pad::UP),
    ("down", pad::DOWN),
    ("left", pad::LEFT),
    ("right", pad::RIGHT),
    ("a", pad::A),
    ("b", pad::B),
    ("c", pad::C),
    ("start", pad::START),
    ("x", pad::X),
    ("y", pad::Y),
    ("z", pad::Z),
    ("mode", pad::MODE),
];

/// Maps SDL scancodes to pad button bits.
pub struct KeyMap {
    map: HashMap<Scancode, u16>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a scancode to a pad button, replacing any earlier binding of
    /// the same button.
    pub fn bind(&mut self, scancode: Scancode, button: u16) {
        self.map.retain(|_, &mut b| b != button);
        self.map.insert(scancode, button);
    }

    /// Look up the pad button for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<u16> {
        self.map.get(&scancode).copied()
    }

    /// Apply `button = "ScancodeName"` overrides from config. Unknown
    /// names are reported and skipped.
    pub fn apply_overrides(&mut self, keys: &BTreeMap<String, String>) {
        for (button, key) in keys {
            let Some(&(_, bit)) = BUTTONS.iter().find(|(name, _)| name.eq_ignore_ascii_case(button))
            else {
                warn!("unknown pad button in config: {button}");
                continue;
            };
            match Scancode::from_name(key) {
                Some(sc) => self.bind(sc, bit),
                None => warn!("unknown key name in config: {key}"),
            }
        }
    }
}

/// Default keyboard layout for port 0.
pub fn default_key_map() -> KeyMap {
    let mut km = KeyMap::new();
    km.bind(Scancode::Up, pad::UP);
    km.bind(Scancode::Down, pad::DOWN);
    km.bind(Scancode::Left, pad::LEFT);
    km.bind(Scancode::Right, pad::RIGHT);
    km.bind(Scancode::Z, pad::A);
    km.bind(Scancode::X, pad::B);
    km.bind(Scancode::C, pad::C);
    km.bind(Scancode::Return, pad::START);
    km.bind(Scancode::A, pad::X);
    km.bind(Scancode::S, pad::Y);
    km.bind(Scancode::D, pad::Z);
    km.bind(Scancode::RShift, pad::MODE);
    km
}
