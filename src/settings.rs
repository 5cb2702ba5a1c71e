//! Sliders, tool selection and toggles
//!
//! Persisted as JSON under its own key, separate from the ledger.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistError, Store, keys, load_or_default, save_json};
use crate::sim::{ColliderKind, ParticleKind, TickInput};

pub const GRAVITY_RANGE: (f32, f32) = (-2.0, 3.0);
pub const PARTICLE_SIZE_RANGE: (f32, f32) = (1.0, 30.0);
pub const WIND_RANGE: (f32, f32) = (-50.0, 50.0);
pub const MAGNET_RANGE: (f32, f32) = (-100.0, 100.0);
pub const TIME_SCALE_RANGE: (f32, f32) = (0.1, 3.0);
pub const EXPLOSION_POWER_RANGE: (f32, f32) = (10.0, 200.0);

/// Pointer tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Spawn,
    Spray,
    Gun,
    Explode,
    Drag,
    Patrol,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Spawn => "spawn",
            Tool::Spray => "spray",
            Tool::Gun => "gun",
            Tool::Explode => "explode",
            Tool::Drag => "drag",
            Tool::Patrol => "patrol",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "spawn" => Some(Tool::Spawn),
            "spray" => Some(Tool::Spray),
            "gun" => Some(Tool::Gun),
            "explode" | "explosion" => Some(Tool::Explode),
            "drag" => Some(Tool::Drag),
            "patrol" => Some(Tool::Patrol),
            _ => None,
        }
    }
}

fn clamp(value: f32, (lo, hi): (f32, f32)) -> f32 {
    if value.is_nan() { lo } else { value.clamp(lo, hi) }
}

/// User-facing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics sliders ===
    pub gravity: f32,
    pub particle_size: f32,
    pub wind: f32,
    pub magnet_strength: f32,
    pub time_scale: f32,
    pub explosion_power: f32,

    // === Tools ===
    pub particle_kind: ParticleKind,
    pub tool: Tool,
    /// Collider placed by a right click, by toolbar name
    pub collider: String,
    /// Particles per spray/spawn click
    pub burst_size: u32,

    // === Toggles ===
    pub trails: bool,
    pub neighbor_forces: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: 1.0,
            particle_size: 5.0,
            wind: 0.0,
            magnet_strength: 0.0,
            time_scale: 1.0,
            explosion_power: 50.0,

            particle_kind: ParticleKind::Standard,
            tool: Tool::Spawn,
            collider: "platform".to_string(),
            burst_size: 10,

            trails: false,
            neighbor_forces: false,
        }
    }
}

impl Settings {
    pub fn set_gravity(&mut self, v: f32) {
        self.gravity = clamp(v, GRAVITY_RANGE);
    }

    pub fn set_particle_size(&mut self, v: f32) {
        self.particle_size = clamp(v, PARTICLE_SIZE_RANGE);
    }

    pub fn set_wind(&mut self, v: f32) {
        self.wind = clamp(v, WIND_RANGE);
    }

    pub fn set_magnet_strength(&mut self, v: f32) {
        self.magnet_strength = clamp(v, MAGNET_RANGE);
    }

    pub fn set_time_scale(&mut self, v: f32) {
        self.time_scale = clamp(v, TIME_SCALE_RANGE);
    }

    pub fn set_explosion_power(&mut self, v: f32) {
        self.explosion_power = clamp(v, EXPLOSION_POWER_RANGE);
    }

    /// Select a collider by toolbar name; unknown names are ignored
    pub fn set_collider(&mut self, name: &str) -> bool {
        if ColliderKind::from_tool(name).is_none() {
            return false;
        }
        self.collider = name.to_string();
        true
    }

    pub fn collider_kind(&self) -> ColliderKind {
        ColliderKind::from_tool(&self.collider).unwrap_or(ColliderKind::Obstacle)
    }

    /// Re-apply every clamp (after loading hand-edited JSON)
    pub fn sanitize(&mut self) {
        self.set_gravity(self.gravity);
        self.set_particle_size(self.particle_size);
        self.set_wind(self.wind);
        self.set_magnet_strength(self.magnet_strength);
        self.set_time_scale(self.time_scale);
        self.set_explosion_power(self.explosion_power);
        if ColliderKind::from_tool(&self.collider).is_none() {
            self.collider = Self::default().collider;
        }
    }

    /// Per-tick inputs derived from the sliders
    pub fn tick_input(&self) -> TickInput {
        TickInput {
            gravity: self.gravity,
            wind: self.wind,
            magnet_strength: self.magnet_strength,
            time_scale: self.time_scale,
            neighbor_forces: self.neighbor_forces,
            trails: self.trails,
            pause: false,
        }
    }

    pub fn load(store: &dyn Store) -> Self {
        let mut settings: Self = load_or_default(store, keys::SETTINGS);
        settings.sanitize();
        settings
    }

    pub fn save(&self, store: &mut dyn Store) -> Result<(), PersistError> {
        save_json(store, keys::SETTINGS, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_slider_clamps() {
        let mut s = Settings::default();
        s.set_gravity(9.0);
        s.set_particle_size(0.0);
        s.set_wind(-80.0);
        s.set_time_scale(f32::NAN);
        assert_eq!(s.gravity, 3.0);
        assert_eq!(s.particle_size, 1.0);
        assert_eq!(s.wind, -50.0);
        assert_eq!(s.time_scale, 0.1);
    }

    #[test]
    fn test_collider_selection() {
        let mut s = Settings::default();
        assert!(s.set_collider("portal"));
        assert_eq!(s.collider_kind(), ColliderKind::Portal);
        assert!(!s.set_collider("trampoline"));
        assert_eq!(s.collider, "portal");
    }

    #[test]
    fn test_load_sanitizes_and_fills_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(keys::SETTINGS, r#"{"gravity": 12.0, "tool": "Gun"}"#)
            .unwrap();
        let s = Settings::load(&store);
        assert_eq!(s.gravity, 3.0);
        assert_eq!(s.tool, Tool::Gun);
        assert_eq!(s.explosion_power, 50.0);
    }

    #[test]
    fn test_tick_input_mirrors_sliders() {
        let mut s = Settings::default();
        s.set_wind(12.0);
        s.trails = true;
        let input = s.tick_input();
        assert_eq!(input.wind, 12.0);
        assert!(input.trails);
        assert!(!input.pause);
    }
}
