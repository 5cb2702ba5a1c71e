//! Session: the long-lived owner of progress, settings and the current round
//!
//! Rounds are disposable. Switching mode, restarting, advancing a level or
//! quitting tears the current [`Simulation`] down and builds a new one on a
//! fresh engine, with a new round id.

use glam::Vec2;
use serde::Serialize;

use crate::consts::ARENA_HEIGHT;
use crate::ledger::{HighScore, Ledger, Purchase, ShopItem};
use crate::persistence::Store;
use crate::platform::{FpsCounter, FrameClock};
use crate::settings::{Settings, Tool};
use crate::sim::{
    ColorTally, GameMode, ParticleKind, PhysicsEngine, RoundState, Simulation, star_rating,
};

/// High-score / achievement checkpoint period (ms)
pub const CHECKPOINT_MS: f64 = 1000.0;
/// Spread of a spray burst
const SPRAY_SPREAD: f32 = 60.0;

pub type EngineFactory<E> = Box<dyn Fn() -> E>;

/// Pointer gestures, already mapped to arena units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointer {
    /// Primary click: run the selected tool
    Primary(Vec2),
    /// Secondary click: place the selected collider
    Secondary(Vec2),
    /// Secondary click with modifier: remove the nearest collider
    Erase(Vec2),
    /// Drag gesture (drag tool only)
    Drag { from: Vec2, to: Vec2 },
}

/// Everything the HUD shows, as one serializable snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub mode: GameMode,
    pub level: usize,
    pub state: RoundState,
    pub fps: u32,
    pub particles: usize,
    pub particles_spawned: u32,
    pub budget_remaining: Option<u32>,
    pub score: u64,
    pub lives: u8,
    pub objective: Option<String>,
    pub progress: Option<(u32, u32)>,
    pub combo: u32,
    pub wave: u32,
    pub wave_countdown: u32,
    pub time_remaining: Option<u32>,
    pub explosions_remaining: Option<u32>,
    pub chain_reactions: u32,
    pub collected: ColorTally,
    pub coins: u64,
    pub high_score: HighScore,
    /// Challenge stars once the round is won
    pub stars: Option<u8>,
    /// Coins paid for the finished round
    pub reward: Option<u64>,
}

pub struct Session<E: PhysicsEngine> {
    pub ledger: Ledger,
    pub settings: Settings,
    store: Box<dyn Store>,
    sim: Simulation<E>,
    factory: EngineFactory<E>,
    next_round_id: u64,
    seed: u64,
    clock: FrameClock,
    fps: FpsCounter,
    last_checkpoint: Option<f64>,
    reward: Option<u64>,
}

impl<E: PhysicsEngine> Session<E> {
    /// Load progress from `store` and open a sandbox round
    pub fn new(store: Box<dyn Store>, factory: EngineFactory<E>, seed: u64) -> Self {
        let ledger = Ledger::load(store.as_ref());
        let settings = Settings::load(store.as_ref());
        let sim = Simulation::new(factory(), GameMode::Sandbox, 0, 1, seed);
        Self {
            ledger,
            settings,
            store,
            sim,
            factory,
            next_round_id: 2,
            seed,
            clock: FrameClock::new(),
            fps: FpsCounter::new(),
            last_checkpoint: None,
            reward: None,
        }
    }

    pub fn simulation(&self) -> &Simulation<E> {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation<E> {
        &mut self.sim
    }

    pub fn mode(&self) -> GameMode {
        self.sim.round.mode
    }

    fn rebuild(&mut self, mode: GameMode, level: usize) {
        self.sim.teardown();
        let id = self.next_round_id;
        self.next_round_id += 1;
        let seed = self.seed.wrapping_add(id);
        self.sim = Simulation::new((self.factory)(), mode, level, id, seed);
        self.reward = None;
        self.clock.reset();
    }

    pub fn select_mode(&mut self, mode: GameMode) {
        self.rebuild(mode, 0);
    }

    pub fn restart(&mut self) {
        self.rebuild(self.sim.round.mode, self.sim.round.level);
    }

    /// Back to the sandbox
    pub fn quit(&mut self) {
        self.rebuild(GameMode::Sandbox, 0);
    }

    /// Advance to the next level after a win; otherwise replay the current one
    pub fn next_level(&mut self) {
        let (mode, state, next) = (self.sim.round.mode, self.sim.round.state, self.sim.round.level + 1);
        if state == RoundState::Won && next < mode.level_count() {
            self.rebuild(mode, next);
        } else {
            self.restart();
        }
    }

    pub fn toggle_pause(&mut self) {
        self.sim.round.toggle_pause();
        self.clock.reset();
    }

    /// Run one host frame; returns the number of ticks simulated
    pub fn frame(&mut self, now_ms: f64) -> u32 {
        self.fps.record(now_ms);
        let ticks = self.clock.advance(now_ms);
        let input = self.settings.tick_input();
        for _ in 0..ticks {
            self.sim.tick(&input);
        }

        self.settle_round();
        let due = self
            .last_checkpoint
            .is_none_or(|last| now_ms - last >= CHECKPOINT_MS);
        if due {
            self.last_checkpoint = Some(now_ms);
            self.checkpoint();
        }
        ticks
    }

    /// Pay a decided round once
    fn settle_round(&mut self) {
        let round = &self.sim.round;
        if !round.is_terminal() {
            return;
        }
        let (id, won) = (round.id, round.state == RoundState::Won);
        if let Some(coins) = self.ledger.grant_round_reward(id, won) {
            self.reward = Some(coins);
            self.persist();
        }
    }

    /// Once-per-second high-score sample and achievement check
    pub fn checkpoint(&mut self) {
        let count = u32::try_from(self.sim.registry.count()).unwrap_or(u32::MAX);
        let moved = self.ledger.record_sample(count, self.fps.fps());
        let granted = self.ledger.check_achievements(
            self.sim.registry.particles_spawned(),
            self.sim.round.explosions_used,
        );
        if moved || !granted.is_empty() {
            self.persist();
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.ledger.save(self.store.as_mut()) {
            log::warn!("Could not save progress: {}", e);
        }
    }

    /// Change settings and write them back
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.settings);
        self.settings.sanitize();
        if let Err(e) = self.settings.save(self.store.as_mut()) {
            log::warn!("Could not save settings: {}", e);
        }
    }

    /// Select a particle kind; locked shop kinds are refused
    pub fn select_kind(&mut self, kind: ParticleKind) -> bool {
        if !self.ledger.kind_available(kind) {
            return false;
        }
        self.update_settings(|s| s.particle_kind = kind);
        true
    }

    pub fn buy(&mut self, item: ShopItem) -> Purchase {
        let result = self.ledger.buy(item);
        if matches!(result, Purchase::Bought { .. }) {
            self.persist();
        }
        result
    }

    fn active_kind(&self) -> ParticleKind {
        let kind = self.settings.particle_kind;
        if self.ledger.kind_available(kind) { kind } else { ParticleKind::Standard }
    }

    /// Route a pointer gesture to the round
    pub fn pointer(&mut self, gesture: Pointer) {
        let kind = self.active_kind();
        let size = self.settings.particle_size;
        match gesture {
            Pointer::Primary(pos) => match self.settings.tool {
                Tool::Spawn => {
                    self.sim.spawn(pos, kind, size);
                }
                Tool::Spray => {
                    let count = self.settings.burst_size as usize;
                    self.sim.spawn_burst(pos, count, SPRAY_SPREAD, kind, size);
                }
                Tool::Gun => {
                    let muzzle = Vec2::new(40.0, ARENA_HEIGHT - 40.0);
                    self.sim.fire_gun(muzzle, pos, kind, size);
                }
                Tool::Explode => {
                    self.sim.explode(pos, self.settings.explosion_power);
                }
                Tool::Patrol => {
                    self.sim.place_patrol(pos);
                }
                Tool::Drag => {}
            },
            Pointer::Secondary(pos) => {
                self.sim.place_collider(self.settings.collider_kind(), pos);
            }
            Pointer::Erase(pos) => {
                self.sim.remove_collider_at(pos);
            }
            Pointer::Drag { from, to } => {
                if self.settings.tool == Tool::Drag {
                    self.sim.drag(from, to);
                }
            }
        }
    }

    pub fn hud(&self) -> Hud {
        let round = &self.sim.round;
        let registry = &self.sim.registry;
        let stars = (round.mode == GameMode::Challenge && round.state == RoundState::Won)
            .then(|| star_rating(round.score, round.level as u32 + 1));
        Hud {
            mode: round.mode,
            level: round.level,
            state: round.state,
            fps: self.fps.fps(),
            particles: registry.count(),
            particles_spawned: registry.particles_spawned(),
            budget_remaining: registry.budget_remaining(),
            score: round.score,
            lives: round.lives,
            objective: round.objective.as_ref().map(|o| o.description.clone()),
            progress: round.progress(),
            combo: round.combo,
            wave: round.wave,
            wave_countdown: round.wave_countdown,
            time_remaining: round.time_remaining_secs(),
            explosions_remaining: round.explosions_remaining(),
            chain_reactions: round.chain_reactions,
            collected: round.collected,
            coins: self.ledger.coins,
            high_score: self.ledger.high_score,
            stars,
            reward: self.reward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LOSS_COINS, WIN_COINS};
    use crate::persistence::{MemoryStore, keys, load_json};
    use crate::sim::ArcadeWorld;

    fn session() -> Session<ArcadeWorld> {
        Session::new(Box::new(MemoryStore::new()), Box::new(ArcadeWorld::default), 7)
    }

    fn frames(s: &mut Session<ArcadeWorld>, start: f64, count: usize) -> f64 {
        let mut t = start;
        for _ in 0..count {
            s.frame(t);
            t += 1000.0 / 60.0;
        }
        t
    }

    #[test]
    fn test_mode_switch_resets_round() {
        let mut s = session();
        s.pointer(Pointer::Primary(Vec2::new(300.0, 300.0)));
        assert_eq!(s.simulation().registry.count(), 1);
        let first = s.simulation().round.id;

        s.select_mode(GameMode::Survival);
        let round = &s.simulation().round;
        assert!(round.id > first);
        assert_eq!(round.lives, 3);
        assert_eq!(round.wave, 1);
        assert_eq!(s.simulation().registry.count(), 0);
        assert_eq!(s.simulation().colliders.len(), 1);
    }

    #[test]
    fn test_reward_granted_once_per_round() {
        let mut s = session();
        s.select_mode(GameMode::Survival);
        s.simulation_mut().round.lose();
        frames(&mut s, 0.0, 5);
        assert_eq!(s.ledger.coins, LOSS_COINS);
        assert_eq!(s.hud().reward, Some(LOSS_COINS));

        s.restart();
        s.simulation_mut().round.win();
        frames(&mut s, 1000.0, 3);
        assert_eq!(s.ledger.coins, LOSS_COINS + WIN_COINS);
    }

    #[test]
    fn test_sandbox_never_finishes() {
        let mut s = session();
        s.simulation_mut().round.win();
        assert_eq!(s.simulation().round.state, RoundState::Playing);
    }

    #[test]
    fn test_next_level_after_win() {
        let mut s = session();
        s.select_mode(GameMode::Challenge);
        s.simulation_mut().round.win();
        s.next_level();
        assert_eq!(s.simulation().round.level, 1);
        assert_eq!(s.simulation().registry.budget_remaining(), Some(40));

        // Not won: replay the same level
        s.next_level();
        assert_eq!(s.simulation().round.level, 1);
    }

    #[test]
    fn test_checkpoint_records_high_score() {
        let mut s = session();
        s.update_settings(|st| st.burst_size = 25);
        s.update_settings(|st| st.tool = Tool::Spray);
        s.pointer(Pointer::Primary(Vec2::new(400.0, 200.0)));
        frames(&mut s, 0.0, 70);
        assert_eq!(s.ledger.high_score.particles, 25);
        let stored: Option<HighScore> = load_json(s.store.as_ref(), keys::HIGH_SCORE).unwrap();
        assert_eq!(stored.map(|h| h.particles), Some(25));
    }

    #[test]
    fn test_locked_kind_falls_back() {
        let mut s = session();
        assert!(!s.select_kind(ParticleKind::Dense));
        s.ledger.coins = 200;
        assert!(matches!(s.buy(ShopItem::Metal), Purchase::Bought { remaining: 50 }));
        assert!(s.select_kind(ParticleKind::Dense));
        s.pointer(Pointer::Primary(Vec2::new(300.0, 300.0)));
        let sim = s.simulation();
        assert!(sim.registry.iter().all(|(_, m)| m.kind == ParticleKind::Dense));
    }

    #[test]
    fn test_pause_overlay_freezes_clock() {
        let mut s = session();
        s.select_mode(GameMode::Collection);
        frames(&mut s, 0.0, 10);
        let before = s.simulation().tick_count;
        s.toggle_pause();
        frames(&mut s, 500.0, 30);
        assert_eq!(s.simulation().tick_count, before);
        assert_eq!(s.hud().state, RoundState::Paused);
    }
}
