//! Game modes, level tables and the per-round state machine
//!
//! A [`Round`] is pure bookkeeping: score, lives, objective, timers. It never
//! touches bodies; the tick loop feeds it gameplay events and reads back
//! whether the round is still running.

use serde::{Deserialize, Serialize};

use super::registry::{ParticleColor, SpawnPolicy};

/// Starting lives for every mode
pub const START_LIVES: u8 = 3;
/// Score for a goal-zone capture
pub const GOAL_POINTS: u64 = 10;
/// Score for a destroyer kill (challenge only)
pub const DESTROYER_POINTS: u64 = 5;
/// Base score for a correct color sort (multiplied by combo)
pub const SORT_POINTS: u64 = 20;
/// Penalty for a wrong color sort
pub const MISSORT_PENALTY: u64 = 10;
/// Correct sorts within this window keep the combo going (ms)
pub const COMBO_WINDOW_MS: f64 = 2000.0;
/// Seconds between survival waves
pub const WAVE_COUNTDOWN_SECS: u32 = 5;
/// Collection round: sorts needed and time allowed
pub const COLLECTION_TARGET: u32 = 50;
pub const COLLECTION_TIME_SECS: u32 = 120;

/// Selectable game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Sandbox,
    Challenge,
    Survival,
    Collection,
    Reaction,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Sandbox => "sandbox",
            GameMode::Challenge => "challenge",
            GameMode::Survival => "survival",
            GameMode::Collection => "collection",
            GameMode::Reaction => "reaction",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sandbox" => Some(GameMode::Sandbox),
            "challenge" => Some(GameMode::Challenge),
            "survival" => Some(GameMode::Survival),
            "collection" => Some(GameMode::Collection),
            "reaction" => Some(GameMode::Reaction),
            _ => None,
        }
    }

    /// How spawns are counted for this mode at a given level index
    pub fn spawn_policy(&self, level: usize) -> SpawnPolicy {
        match self {
            GameMode::Sandbox => SpawnPolicy::Unlimited,
            GameMode::Challenge => SpawnPolicy::Counted {
                budget: Some(challenge_level(level).particle_budget),
            },
            // The pre-built grid uses the whole budget
            GameMode::Reaction => SpawnPolicy::Counted {
                budget: Some(reaction_level(level).particle_count),
            },
            GameMode::Survival | GameMode::Collection => SpawnPolicy::Counted { budget: None },
        }
    }

    /// Number of levels available (1 for modes without a level table)
    pub fn level_count(&self) -> usize {
        match self {
            GameMode::Challenge => CHALLENGE_LEVELS.len(),
            GameMode::Reaction => REACTION_LEVELS.len(),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeLevel {
    pub level: u32,
    pub name: &'static str,
    pub objective: &'static str,
    pub target: u32,
    pub time_limit_secs: u32,
    pub particle_budget: u32,
    pub difficulty: u32,
}

const fn challenge(
    level: u32,
    name: &'static str,
    objective: &'static str,
    target: u32,
    time_limit_secs: u32,
    particle_budget: u32,
    difficulty: u32,
) -> ChallengeLevel {
    ChallengeLevel {
        level,
        name,
        objective,
        target,
        time_limit_secs,
        particle_budget,
        difficulty,
    }
}

/// Every challenge level is won by goal-zone captures; the level name sets
/// the theme and the time limit and budget set the pressure.
pub const CHALLENGE_LEVELS: [ChallengeLevel; 20] = [
    challenge(1, "First Steps", "Collect 20 particles in the goal zone", 20, 60, 50, 1),
    challenge(2, "Gravity Master", "Collect 30 particles in the goal zone within 45 seconds", 30, 45, 40, 1),
    challenge(3, "Destroyer", "Collect 50 particles in the goal zone past the destroyers", 50, 60, 100, 2),
    challenge(4, "Portal Puzzle", "Route 25 particles into the goal zone through portals", 25, 90, 50, 2),
    challenge(5, "Bouncer Challenge", "Bounce 10 particles into the goal zone", 10, 120, 80, 2),
    challenge(6, "Speed Run", "Collect 40 particles in the goal zone in 30 seconds", 40, 30, 60, 3),
    challenge(7, "Magnetic Mastery", "Guide 35 particles into the goal zone with magnets", 35, 90, 50, 3),
    challenge(8, "Precision", "Collect 50 particles in the goal zone with only 50 spawns", 50, 120, 50, 3),
    challenge(9, "Chaos Control", "Collect 60 of 100 particles in the goal zone", 60, 150, 100, 4),
    challenge(10, "The Gauntlet", "Collect 100 particles in the goal zone", 100, 180, 150, 4),
    challenge(11, "Reverse Gravity", "Collect 45 particles in the goal zone against the gravity", 45, 90, 70, 4),
    challenge(12, "Time Trial", "Collect 60 particles in the goal zone in 45 seconds", 60, 45, 80, 5),
    challenge(13, "Spinner Madness", "Use spinners to collect 50 particles in the goal zone", 50, 120, 80, 5),
    challenge(14, "Multi-Portal", "Route 40 particles into the goal zone through portals", 40, 100, 60, 5),
    challenge(15, "Endurance", "Collect 50 particles in the goal zone within 2 minutes", 50, 120, 60, 5),
    challenge(16, "Expert Precision", "Collect 70 particles in the goal zone with only 70 spawns", 70, 150, 70, 6),
    challenge(17, "Destruction Derby", "Collect 100 particles in the goal zone past the destroyers", 100, 120, 150, 6),
    challenge(18, "Ultimate Speed", "Collect 80 particles in the goal zone in 40 seconds", 80, 40, 100, 6),
    challenge(19, "Master Challenge", "Collect 100 particles in the goal zone around complex obstacles", 100, 180, 120, 7),
    challenge(20, "FINAL BOSS", "Collect 150 particles in the goal zone", 150, 240, 200, 10),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivalWave {
    pub wave: u32,
    pub particles_per_spawn: u32,
    pub spawn_interval_ms: f64,
    pub particle_speed: f32,
}

const fn wave(wave: u32, particles_per_spawn: u32, spawn_interval_ms: f64, particle_speed: f32) -> SurvivalWave {
    SurvivalWave {
        wave,
        particles_per_spawn,
        spawn_interval_ms,
        particle_speed,
    }
}

pub const SURVIVAL_WAVES: [SurvivalWave; 10] = [
    wave(1, 5, 3000.0, 0.5),
    wave(2, 7, 2800.0, 0.6),
    wave(3, 10, 2500.0, 0.7),
    wave(4, 12, 2200.0, 0.8),
    wave(5, 15, 2000.0, 0.9),
    wave(6, 18, 1800.0, 1.0),
    wave(7, 20, 1600.0, 1.1),
    wave(8, 25, 1400.0, 1.2),
    wave(9, 30, 1200.0, 1.3),
    wave(10, 40, 1000.0, 1.5),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionLevel {
    pub level: u32,
    pub target: u32,
    pub max_explosions: u32,
    pub particle_count: u32,
}

pub const REACTION_LEVELS: [ReactionLevel; 5] = [
    ReactionLevel { level: 1, target: 10, max_explosions: 3, particle_count: 30 },
    ReactionLevel { level: 2, target: 20, max_explosions: 4, particle_count: 50 },
    ReactionLevel { level: 3, target: 30, max_explosions: 5, particle_count: 70 },
    ReactionLevel { level: 4, target: 50, max_explosions: 6, particle_count: 100 },
    ReactionLevel { level: 5, target: 75, max_explosions: 7, particle_count: 150 },
];

/// Challenge level by 0-based index (clamped to the last level)
pub fn challenge_level(index: usize) -> &'static ChallengeLevel {
    &CHALLENGE_LEVELS[index.min(CHALLENGE_LEVELS.len() - 1)]
}

/// Reaction level by 0-based index (clamped to the last level)
pub fn reaction_level(index: usize) -> &'static ReactionLevel {
    &REACTION_LEVELS[index.min(REACTION_LEVELS.len() - 1)]
}

/// Survival wave config by 1-based wave number (clamped to the last wave)
pub fn survival_wave(wave: u32) -> &'static SurvivalWave {
    let index = (wave.max(1) as usize - 1).min(SURVIVAL_WAVES.len() - 1);
    &SURVIVAL_WAVES[index]
}

/// Star rating (0-3) for a finished challenge level
pub fn star_rating(score: u64, level: u32) -> u8 {
    let difficulty = level.div_ceil(7).clamp(1, 3);
    let (bronze, silver, gold) = match difficulty {
        1 => (100, 200, 300),
        2 => (150, 300, 500),
        _ => (200, 400, 700),
    };
    if score >= gold {
        3
    } else if score >= silver {
        2
    } else if score >= bronze {
        1
    } else {
        0
    }
}

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    Playing,
    Paused,
    Won,
    Lost,
}

impl RoundState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundState::Won | RoundState::Lost)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub description: String,
    pub target: u32,
    pub progress: u32,
}

impl Objective {
    pub fn new(description: impl Into<String>, target: u32) -> Self {
        Self {
            description: description.into(),
            target,
            progress: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.target
    }
}

/// Sorted-particle tallies per palette color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTally {
    pub red: u32,
    pub blue: u32,
    pub green: u32,
    pub yellow: u32,
}

impl ColorTally {
    pub fn get(&self, color: ParticleColor) -> u32 {
        match color {
            ParticleColor::Red => self.red,
            ParticleColor::Blue => self.blue,
            ParticleColor::Green => self.green,
            ParticleColor::Yellow => self.yellow,
        }
    }

    fn bump(&mut self, color: ParticleColor) {
        match color {
            ParticleColor::Red => self.red += 1,
            ParticleColor::Blue => self.blue += 1,
            ParticleColor::Green => self.green += 1,
            ParticleColor::Yellow => self.yellow += 1,
        }
    }
}

/// Result of dropping a particle into a color zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    /// Colors matched; particle is consumed
    Correct { points: u64 },
    /// Colors differ; particle stays in play
    Wrong,
    /// Not a collection round, or the particle has no color
    Ignored,
}

/// What a second of the wave countdown produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveStep {
    /// Still counting down
    Counting(u32),
    /// Next wave has started
    Advanced { wave: u32 },
    /// Final wave survived
    Victory,
    /// Not applicable (not survival, or round not running)
    Idle,
}

/// One lifecycle of a game mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: u64,
    pub mode: GameMode,
    /// 0-based level index
    pub level: usize,
    pub state: RoundState,
    pub objective: Option<Objective>,
    pub score: u64,
    pub lives: u8,
    pub wave: u32,
    pub wave_countdown: u32,
    pub combo: u32,
    last_sort_ms: Option<f64>,
    pub collected: ColorTally,
    pub chain_reactions: u32,
    pub explosions_used: u32,
    pub max_explosions: Option<u32>,
    pub time_limit_ms: Option<f64>,
    pub elapsed_ms: f64,
}

impl Round {
    pub fn new(id: u64, mode: GameMode, level: usize) -> Self {
        let mut round = Self {
            id,
            mode,
            level,
            state: RoundState::Playing,
            objective: None,
            score: 0,
            lives: START_LIVES,
            wave: 1,
            wave_countdown: 0,
            combo: 0,
            last_sort_ms: None,
            collected: ColorTally::default(),
            chain_reactions: 0,
            explosions_used: 0,
            max_explosions: None,
            time_limit_ms: None,
            elapsed_ms: 0.0,
        };

        match mode {
            GameMode::Sandbox => {}
            GameMode::Challenge => {
                let def = challenge_level(level);
                round.level = def.level as usize - 1;
                round.objective = Some(Objective::new(def.objective, def.target));
                round.time_limit_ms = Some(def.time_limit_secs as f64 * 1000.0);
            }
            GameMode::Survival => {
                round.objective = Some(Objective::new(
                    format!("Survive {} waves", SURVIVAL_WAVES.len()),
                    SURVIVAL_WAVES.len() as u32,
                ));
                round.wave_countdown = WAVE_COUNTDOWN_SECS;
            }
            GameMode::Collection => {
                round.objective = Some(Objective::new(
                    format!("Sort {} particles into matching zones", COLLECTION_TARGET),
                    COLLECTION_TARGET,
                ));
                round.time_limit_ms = Some(COLLECTION_TIME_SECS as f64 * 1000.0);
            }
            GameMode::Reaction => {
                let def = reaction_level(level);
                round.level = def.level as usize - 1;
                round.objective = Some(Objective::new(
                    format!("Trigger {} chain reactions", def.target),
                    def.target,
                ));
                round.max_explosions = Some(def.max_explosions);
            }
        }

        log::info!("Round {} started: {} level {}", id, mode.as_str(), round.level + 1);
        round
    }

    /// Forces, physics and timers advance only while playing
    pub fn is_running(&self) -> bool {
        self.state == RoundState::Playing
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn pause(&mut self) {
        if self.state == RoundState::Playing {
            self.state = RoundState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RoundState::Paused {
            self.state = RoundState::Playing;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            RoundState::Playing => self.pause(),
            RoundState::Paused => self.resume(),
            _ => {}
        }
    }

    fn finish(&mut self, state: RoundState) {
        if self.is_terminal() || self.mode == GameMode::Sandbox {
            return;
        }
        self.state = state;
        log::info!(
            "Round {} {}: score {}",
            self.id,
            if state == RoundState::Won { "won" } else { "lost" },
            self.score
        );
    }

    pub fn win(&mut self) {
        self.finish(RoundState::Won);
    }

    pub fn lose(&mut self) {
        self.finish(RoundState::Lost);
    }

    /// Add progress; reaching the target wins on that exact call
    pub fn advance_objective(&mut self, amount: u32) {
        let Some(objective) = self.objective.as_mut() else {
            return;
        };
        objective.progress += amount;
        if objective.is_complete() {
            self.win();
        }
    }

    pub fn progress(&self) -> Option<(u32, u32)> {
        self.objective.as_ref().map(|o| (o.progress, o.target))
    }

    /// Goal-zone capture (challenge)
    pub fn goal_capture(&mut self) -> bool {
        if self.mode != GameMode::Challenge {
            return false;
        }
        self.score += GOAL_POINTS;
        self.advance_objective(1);
        true
    }

    /// Destroyer kill; only challenge pays for it
    pub fn destroyer_kill(&mut self) {
        if self.mode == GameMode::Challenge {
            self.score += DESTROYER_POINTS;
        }
    }

    /// Enemy reached the core (survival)
    pub fn core_hit(&mut self) {
        if self.mode != GameMode::Survival {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.lose();
        }
    }

    /// A particle of `particle` color landed in a `zone` color zone
    pub fn color_sort(&mut self, zone: ParticleColor, particle: Option<ParticleColor>, now_ms: f64) -> Sort {
        let Some(particle) = particle else {
            return Sort::Ignored;
        };
        if self.mode != GameMode::Collection {
            return Sort::Ignored;
        }

        if zone != particle {
            self.score = self.score.saturating_sub(MISSORT_PENALTY);
            self.combo = 0;
            return Sort::Wrong;
        }

        let in_window = self
            .last_sort_ms
            .is_some_and(|last| now_ms - last <= COMBO_WINDOW_MS);
        self.combo = if in_window { self.combo + 1 } else { 1 };
        self.last_sort_ms = Some(now_ms);

        let points = SORT_POINTS * self.combo as u64;
        self.score += points;
        self.collected.bump(zone);
        self.advance_objective(1);
        Sort::Correct { points }
    }

    /// A secondary explosion went off
    pub fn chain_fired(&mut self) {
        self.chain_reactions += 1;
        if self.mode == GameMode::Reaction {
            self.advance_objective(1);
        }
    }

    /// Explosions left this round (None = unlimited)
    pub fn explosions_remaining(&self) -> Option<u32> {
        self.max_explosions
            .map(|max| max.saturating_sub(self.explosions_used))
    }

    /// Spend one user explosion; false when the level's cap is used up
    pub fn use_explosion(&mut self) -> bool {
        if self.explosions_remaining() == Some(0) {
            return false;
        }
        self.explosions_used += 1;
        true
    }

    /// Advance the round clock; running out of time loses unmet objectives
    pub fn advance_time(&mut self, dt_ms: f64) {
        if !self.is_running() {
            return;
        }
        self.elapsed_ms += dt_ms;
        if let Some(limit) = self.time_limit_ms {
            if self.elapsed_ms >= limit {
                let met = self.objective.as_ref().is_some_and(|o| o.is_complete());
                if met {
                    self.win();
                } else {
                    self.lose();
                }
            }
        }
    }

    /// Whole seconds left on the clock (None = untimed)
    pub fn time_remaining_secs(&self) -> Option<u32> {
        self.time_limit_ms
            .map(|limit| ((limit - self.elapsed_ms).max(0.0) / 1000.0).ceil() as u32)
    }

    /// Reaction: nothing left that could still reach the target
    pub fn check_reaction_exhausted(&mut self, blast_active: bool, blast_pending: bool) {
        if self.mode != GameMode::Reaction || !self.is_running() {
            return;
        }
        if self.explosions_remaining() == Some(0) && !blast_active && !blast_pending {
            self.lose();
        }
    }

    /// One second of the survival wave countdown
    pub fn wave_countdown_step(&mut self) -> WaveStep {
        if self.mode != GameMode::Survival || !self.is_running() {
            return WaveStep::Idle;
        }
        self.wave_countdown = self.wave_countdown.saturating_sub(1);
        if self.wave_countdown > 0 {
            return WaveStep::Counting(self.wave_countdown);
        }

        let cleared = self.wave;
        self.score += cleared as u64 * 100;
        if let Some(objective) = self.objective.as_mut() {
            objective.progress = cleared;
        }
        if cleared as usize >= SURVIVAL_WAVES.len() {
            self.win();
            return WaveStep::Victory;
        }
        self.wave += 1;
        self.wave_countdown = WAVE_COUNTDOWN_SECS;
        log::info!("Wave {} cleared, wave {} incoming", cleared, self.wave);
        WaveStep::Advanced { wave: self.wave }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_round_resets() {
        let round = Round::new(4, GameMode::Survival, 0);
        assert_eq!(round.lives, START_LIVES);
        assert_eq!(round.wave, 1);
        assert_eq!(round.score, 0);
        assert_eq!(round.combo, 0);
        assert_eq!(round.state, RoundState::Playing);
        assert_eq!(round.progress(), Some((0, 10)));
    }

    #[test]
    fn test_challenge_wins_on_target() {
        let mut round = Round::new(1, GameMode::Challenge, 0);
        for _ in 0..19 {
            round.goal_capture();
        }
        assert_eq!(round.state, RoundState::Playing);
        round.goal_capture();
        assert_eq!(round.state, RoundState::Won);
        assert_eq!(round.score, 200);
    }

    #[test]
    fn test_survival_loses_on_third_hit() {
        let mut round = Round::new(1, GameMode::Survival, 0);
        round.core_hit();
        round.core_hit();
        assert_eq!(round.state, RoundState::Playing);
        round.core_hit();
        assert_eq!(round.state, RoundState::Lost);
        assert_eq!(round.lives, 0);
    }

    #[test]
    fn test_color_sort_combo() {
        let mut round = Round::new(1, GameMode::Collection, 0);
        let red = Some(ParticleColor::Red);

        assert_eq!(round.color_sort(ParticleColor::Red, red, 0.0), Sort::Correct { points: 20 });
        assert_eq!(round.color_sort(ParticleColor::Red, red, 1500.0), Sort::Correct { points: 40 });
        assert_eq!(round.score, 60);
        assert_eq!(round.collected.red, 2);

        // Window lapsed: combo restarts
        assert_eq!(round.color_sort(ParticleColor::Red, red, 4000.0), Sort::Correct { points: 20 });
        assert_eq!(round.combo, 1);

        assert_eq!(round.color_sort(ParticleColor::Blue, red, 4100.0), Sort::Wrong);
        assert_eq!(round.combo, 0);
        assert_eq!(round.score, 70);
        assert_eq!(round.collected.red, 3);
        assert_eq!(round.collected.blue, 0);
    }

    #[test]
    fn test_missort_floors_at_zero() {
        let mut round = Round::new(1, GameMode::Collection, 0);
        round.color_sort(ParticleColor::Green, Some(ParticleColor::Yellow), 0.0);
        assert_eq!(round.score, 0);
    }

    #[test]
    fn test_sorting_inert_outside_collection() {
        let mut round = Round::new(1, GameMode::Sandbox, 0);
        assert_eq!(
            round.color_sort(ParticleColor::Red, Some(ParticleColor::Red), 0.0),
            Sort::Ignored
        );
        assert_eq!(round.score, 0);
        assert!(!round.goal_capture());
    }

    #[test]
    fn test_time_limit_loses() {
        let mut round = Round::new(1, GameMode::Challenge, 5);
        assert_eq!(round.time_remaining_secs(), Some(30));
        round.advance_time(29_000.0);
        assert_eq!(round.state, RoundState::Playing);
        round.advance_time(1_000.0);
        assert_eq!(round.state, RoundState::Lost);
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut round = Round::new(1, GameMode::Collection, 0);
        round.pause();
        round.advance_time(500_000.0);
        assert_eq!(round.state, RoundState::Paused);
        assert_eq!(round.elapsed_ms, 0.0);
        round.resume();
        assert!(round.is_running());
        assert_eq!(round.id, 1);
    }

    #[test]
    fn test_terminal_is_sticky() {
        let mut round = Round::new(1, GameMode::Survival, 0);
        round.lives = 1;
        round.core_hit();
        round.win();
        round.toggle_pause();
        assert_eq!(round.state, RoundState::Lost);
    }

    #[test]
    fn test_reaction_explosion_cap() {
        let mut round = Round::new(1, GameMode::Reaction, 0);
        assert!(round.use_explosion());
        assert!(round.use_explosion());
        assert!(round.use_explosion());
        assert!(!round.use_explosion());
        assert_eq!(round.explosions_used, 3);

        round.check_reaction_exhausted(true, false);
        assert!(round.is_running());
        round.check_reaction_exhausted(false, false);
        assert_eq!(round.state, RoundState::Lost);
    }

    #[test]
    fn test_wave_countdown() {
        let mut round = Round::new(1, GameMode::Survival, 0);
        for remaining in (1..WAVE_COUNTDOWN_SECS).rev() {
            assert_eq!(round.wave_countdown_step(), WaveStep::Counting(remaining));
        }
        assert_eq!(round.wave_countdown_step(), WaveStep::Advanced { wave: 2 });
        assert_eq!(round.score, 100);

        round.wave = SURVIVAL_WAVES.len() as u32;
        round.wave_countdown = 1;
        assert_eq!(round.wave_countdown_step(), WaveStep::Victory);
        assert_eq!(round.state, RoundState::Won);
    }

    #[test]
    fn test_star_rating() {
        assert_eq!(star_rating(50, 1), 0);
        assert_eq!(star_rating(250, 3), 2);
        assert_eq!(star_rating(500, 10), 3);
        assert_eq!(star_rating(650, 20), 2);
    }

    #[test]
    fn test_challenge_objectives_name_goal_target() {
        for def in &CHALLENGE_LEVELS {
            assert!(def.objective.contains("goal zone"), "level {}", def.level);
            assert!(def.objective.contains(&def.target.to_string()), "level {}", def.level);
            assert!(def.target <= def.particle_budget, "level {}", def.level);
        }
    }

    #[test]
    fn test_level_lookup_clamps() {
        assert_eq!(challenge_level(99).level, 20);
        assert_eq!(reaction_level(7).max_explosions, 7);
        assert_eq!(survival_wave(0).wave, 1);
        assert_eq!(survival_wave(42).particles_per_spawn, 40);
    }
}
