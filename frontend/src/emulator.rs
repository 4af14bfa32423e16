use std::time::Instant;

use picobridge_core::core::{EmulationCore, InputDevice};
use picobridge_core::session::Session;
use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use tracing::{debug, info, warn};

use crate::audio::SdlAudioHost;
use crate::input::KeyMap;
use crate::video::SdlDisplay;

pub type SdlSession<C> = Session<C, SdlAudioHost, SdlDisplay>;

/// Drive the session at its active cadence until the window closes.
///
/// The loop keeps a clone of the cadence and paces ticks by its frame
/// interval; when a mode change cancels it, the replacement is picked up
/// and pacing restarts from now.
pub fn run<C: EmulationCore>(session: &mut SdlSession<C>, event_pump: &mut EventPump, key_map: &KeyMap) {
    let Some(mut cadence) = session.cadence().cloned() else {
        warn!("no frame cadence armed");
        return;
    };
    let mut next_frame = Instant::now();
    let mut buttons: u16 = 0;

    'main: loop {
        // Poll all pending SDL events: hotkeys drive the control surface,
        // everything else goes to pad 0
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,

                Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => break 'main,

                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => {
                    if !hotkey(session, sc)
                        && let Some(bit) = key_map.get(sc)
                    {
                        buttons |= bit;
                    }
                }

                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    if let Some(bit) = key_map.get(sc) {
                        buttons &= !bit;
                    }
                }

                _ => {}
            }
        }

        session.send_input(0, buttons);
        session.tick();

        if cadence.is_cancelled()
            && let Some(next) = session.cadence()
        {
            debug!(hz = next.hz(), "switching to new frame cadence");
            cadence = next.clone();
            next_frame = Instant::now();
        }

        next_frame += cadence.frame_interval();
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
        } else if now - next_frame > cadence.frame_interval() * 4 {
            // Fell far behind (window drag, debugger): don't try to catch up
            next_frame = now;
        }
    }
}

/// Session toggles bound to hotkeys. Returns true if `sc` was one.
fn hotkey<C: EmulationCore>(session: &mut SdlSession<C>, sc: Scancode) -> bool {
    let flags = *session.flags();
    let result = match sc {
        Scancode::P => session.set_loop_mode(!flags.simulate, flags.render_graphics, flags.render_audio),
        Scancode::V => session.set_loop_mode(flags.simulate, !flags.render_graphics, flags.render_audio),
        Scancode::M => session.set_loop_mode(flags.simulate, flags.render_graphics, !flags.render_audio),
        Scancode::L => {
            session.set_sprite_limit(!flags.sprite_limit_enabled);
            Ok(())
        }
        Scancode::F1 => {
            session.set_input_device(0, InputDevice::ThreeButton);
            Ok(())
        }
        Scancode::F2 => {
            session.set_input_device(0, InputDevice::SixButton);
            Ok(())
        }
        _ => return false,
    };
    match result {
        Ok(()) => info!(flags = ?session.flags(), "session updated"),
        Err(e) => warn!("toggle failed: {e}"),
    }
    true
}
