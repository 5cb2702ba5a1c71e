//! JS-facing surface
//!
//! The host page owns the canvas, DOM controls and the animation-frame loop;
//! it forwards input here and reads back a JSON HUD snapshot each frame.

use wasm_bindgen::prelude::*;

use super::{Viewport, now_ms};
use crate::ledger::{Purchase, ShopItem};
use crate::persistence::{LocalStore, MemoryStore, Store};
use crate::session::{Pointer, Session};
use crate::settings::Tool;
use crate::sim::{ArcadeWorld, GameMode, ParticleKind, PhysicsEngine};

#[wasm_bindgen]
pub struct WebSession {
    session: Session<ArcadeWorld>,
    viewport: Viewport,
}

#[wasm_bindgen]
impl WebSession {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> WebSession {
        let store: Box<dyn Store> = match LocalStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{}; progress will not be saved", e);
                Box::new(MemoryStore::new())
            }
        };
        let seed = js_sys::Date::now() as u64;
        WebSession {
            session: Session::new(store, Box::new(ArcadeWorld::default), seed),
            viewport: Viewport::new(width, height),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport::new(width, height);
    }

    /// Animation-frame callback; returns ticks simulated
    pub fn frame(&mut self, time: f64) -> u32 {
        self.session.frame(time)
    }

    /// Current HUD as JSON
    pub fn hud(&self) -> String {
        serde_json::to_string(&self.session.hud()).unwrap_or_else(|e| {
            log::warn!("HUD encode failed: {}", e);
            String::from("{}")
        })
    }

    /// Particle positions as a flat [x0, y0, x1, y1, ...] array
    pub fn positions(&self) -> Vec<f32> {
        let sim = self.session.simulation();
        sim.registry
            .ids()
            .filter_map(|id| sim.engine.position(id))
            .flat_map(|p| [p.x, p.y])
            .collect()
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, button: u8, erase: bool) {
        let pos = self.viewport.to_arena(x, y);
        let gesture = match (button, erase) {
            (0, _) => Pointer::Primary(pos),
            (_, true) => Pointer::Erase(pos),
            _ => Pointer::Secondary(pos),
        };
        self.session.pointer(gesture);
    }

    pub fn pointer_drag(&mut self, from_x: f32, from_y: f32, x: f32, y: f32) {
        let from = self.viewport.to_arena(from_x, from_y);
        let to = self.viewport.to_arena(x, y);
        self.session.pointer(Pointer::Drag { from, to });
    }

    /// Returns false for an unknown mode name
    pub fn select_mode(&mut self, name: &str) -> bool {
        let Some(mode) = GameMode::from_str(name) else {
            return false;
        };
        self.session.select_mode(mode);
        true
    }

    pub fn select_tool(&mut self, name: &str) -> bool {
        let Some(tool) = Tool::from_str(name) else {
            return false;
        };
        self.session.update_settings(|s| s.tool = tool);
        true
    }

    pub fn select_collider(&mut self, name: &str) -> bool {
        let mut accepted = false;
        self.session.update_settings(|s| accepted = s.set_collider(name));
        accepted
    }

    pub fn select_particle(&mut self, name: &str) -> bool {
        ParticleKind::from_str(name).is_some_and(|kind| self.session.select_kind(kind))
    }

    /// Slider change; unknown names are ignored
    pub fn set_slider(&mut self, name: &str, value: f32) {
        self.session.update_settings(|s| match name {
            "gravity" => s.set_gravity(value),
            "particleSize" => s.set_particle_size(value),
            "wind" => s.set_wind(value),
            "magnetStrength" => s.set_magnet_strength(value),
            "timeScale" => s.set_time_scale(value),
            "explosionPower" => s.set_explosion_power(value),
            other => log::debug!("Unknown slider {}", other),
        });
    }

    pub fn set_trails(&mut self, on: bool) {
        self.session.update_settings(|s| s.trails = on);
    }

    pub fn set_neighbor_forces(&mut self, on: bool) {
        self.session.update_settings(|s| s.neighbor_forces = on);
    }

    pub fn toggle_pause(&mut self) {
        self.session.toggle_pause();
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn next_level(&mut self) {
        self.session.next_level();
    }

    pub fn quit(&mut self) {
        self.session.quit();
    }

    pub fn clear(&mut self) {
        self.session.simulation_mut().clear_particles();
    }

    /// Buy a shop item by id; returns the coins left, or -1 if refused
    pub fn buy(&mut self, item: &str) -> f64 {
        let Some(item) = ShopItem::from_id(item) else {
            return -1.0;
        };
        match self.session.buy(item) {
            Purchase::Bought { remaining } => remaining as f64,
            _ => -1.0,
        }
    }

    /// Host clock, for pages that do not pass their own timestamps
    pub fn now(&self) -> f64 {
        now_ms()
    }
}
