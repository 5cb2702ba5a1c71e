//! PhysicsBox entry point
//!
//! On the web the page drives a `WebSession` from its animation-frame loop;
//! this start hook only installs logging and the panic hook. Natively there
//! is no window, so `main` plays a short scripted session per mode and prints
//! the HUD.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger init failed: {}", e).into());
    }
    log::info!("PhysicsBox {} ready", env!("CARGO_PKG_VERSION"));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use physicsbox::consts::TICK_MS;
    use physicsbox::persistence::MemoryStore;
    use physicsbox::sim::{ArcadeWorld, GameMode};
    use physicsbox::{Pointer, Session, Tool};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("PhysicsBox (native, headless) starting...");

    let mut session = Session::new(Box::new(MemoryStore::new()), Box::new(ArcadeWorld::default), 0x5eed);
    let mut time = 0.0;
    let mut run = |session: &mut Session<ArcadeWorld>, seconds: f64| {
        let frames = (seconds * 1000.0 / TICK_MS) as usize;
        for _ in 0..frames {
            session.frame(time);
            time += TICK_MS;
        }
    };

    for mode in [
        GameMode::Sandbox,
        GameMode::Challenge,
        GameMode::Survival,
        GameMode::Collection,
        GameMode::Reaction,
    ] {
        session.select_mode(mode);
        match mode {
            GameMode::Sandbox | GameMode::Challenge => {
                session.update_settings(|s| {
                    s.tool = Tool::Spray;
                    s.burst_size = 50;
                });
                session.pointer(Pointer::Primary(Vec2::new(600.0, 200.0)));
            }
            GameMode::Reaction => {
                session.update_settings(|s| s.tool = Tool::Explode);
                session.pointer(Pointer::Primary(physicsbox::arena_center()));
            }
            _ => {}
        }
        run(&mut session, 10.0);

        match serde_json::to_string_pretty(&session.hud()) {
            Ok(json) => println!("{} after 10s:\n{}", mode.as_str(), json),
            Err(e) => log::warn!("HUD encode failed: {}", e),
        }
    }
}
