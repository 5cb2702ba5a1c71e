//! High score, coins, achievements and shop unlocks
//!
//! Persisted through a [`Store`]; loaded once at startup and written back at
//! checkpoints only.

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistError, Store, keys, load_or_default, save_json};
use crate::sim::ParticleKind;

/// Coins for a won round
pub const WIN_COINS: u64 = 5;
/// Coins for a lost round
pub const LOSS_COINS: u64 = 1;

/// Best particle count reached, with the frame rate it ran at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighScore {
    pub particles: u32,
    pub fps: u32,
}

impl HighScore {
    /// More particles wins; equal counts are broken by frame rate
    pub fn beaten_by(&self, particles: u32, fps: u32) -> bool {
        particles > self.particles || (particles == self.particles && fps > self.fps)
    }
}

/// One-time milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Achievement {
    Spawn1000,
    Explosions10,
}

impl Achievement {
    pub const ALL: [Achievement; 2] = [Achievement::Spawn1000, Achievement::Explosions10];

    pub fn id(&self) -> &'static str {
        match self {
            Achievement::Spawn1000 => "spawn_1000",
            Achievement::Explosions10 => "expl_10",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::Spawn1000 => "Spawn 1k",
            Achievement::Explosions10 => "Use 10 explosions",
        }
    }

    pub fn reward(&self) -> u64 {
        match self {
            Achievement::Spawn1000 => 50,
            Achievement::Explosions10 => 25,
        }
    }

    fn reached(&self, particles_spawned: u32, explosions_used: u32) -> bool {
        match self {
            Achievement::Spawn1000 => particles_spawned > 1000,
            Achievement::Explosions10 => explosions_used > 10,
        }
    }
}

/// Stored form of an unlocked achievement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub id: String,
    pub name: String,
    pub reward: u64,
}

/// Particle kinds sold in the shop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopItem {
    Plasma,
    Metal,
}

impl ShopItem {
    pub const ALL: [ShopItem; 2] = [ShopItem::Plasma, ShopItem::Metal];

    pub fn id(&self) -> &'static str {
        match self {
            ShopItem::Plasma => "plasma",
            ShopItem::Metal => "metal",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.id() == id)
    }

    pub fn cost(&self) -> u64 {
        match self {
            ShopItem::Plasma => 100,
            ShopItem::Metal => 150,
        }
    }

    pub fn kind(&self) -> ParticleKind {
        match self {
            ShopItem::Plasma => ParticleKind::HighEnergy,
            ShopItem::Metal => ParticleKind::Dense,
        }
    }

    /// Shop item gating a particle kind, if any
    pub fn for_kind(kind: ParticleKind) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.kind() == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purchase {
    Bought { remaining: u64 },
    AlreadyOwned,
    InsufficientCoins { needed: u64 },
}

/// Persistent progress
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub high_score: HighScore,
    pub coins: u64,
    pub achievements: Vec<AchievementRecord>,
    pub unlocked: Vec<String>,
    /// Last round id that received its coin reward (session-local)
    last_rewarded_round: Option<u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every record; unreadable entries fall back to defaults
    pub fn load(store: &dyn Store) -> Self {
        let ledger = Self {
            high_score: load_or_default(store, keys::HIGH_SCORE),
            coins: load_or_default(store, keys::TOTAL_COINS),
            achievements: load_or_default(store, keys::ACHIEVEMENTS),
            unlocked: load_or_default(store, keys::UNLOCKED_PARTICLES),
            last_rewarded_round: None,
        };
        log::info!(
            "Ledger loaded: best {} particles @ {} fps, {} coins",
            ledger.high_score.particles,
            ledger.high_score.fps,
            ledger.coins
        );
        ledger
    }

    pub fn save(&self, store: &mut dyn Store) -> Result<(), PersistError> {
        save_json(store, keys::HIGH_SCORE, &self.high_score)?;
        save_json(store, keys::TOTAL_COINS, &self.coins)?;
        save_json(store, keys::ACHIEVEMENTS, &self.achievements)?;
        save_json(store, keys::UNLOCKED_PARTICLES, &self.unlocked)?;
        Ok(())
    }

    /// Once-per-second sample; true if the high score moved
    pub fn record_sample(&mut self, particles: u32, fps: u32) -> bool {
        if !self.high_score.beaten_by(particles, fps) {
            return false;
        }
        self.high_score = HighScore { particles, fps };
        true
    }

    /// Pay out a finished round exactly once; returns the coins granted
    pub fn grant_round_reward(&mut self, round_id: u64, won: bool) -> Option<u64> {
        if self.last_rewarded_round == Some(round_id) {
            return None;
        }
        self.last_rewarded_round = Some(round_id);
        let coins = if won { WIN_COINS } else { LOSS_COINS };
        self.coins += coins;
        log::info!("Round {} rewarded {} coins", round_id, coins);
        Some(coins)
    }

    pub fn has_achievement(&self, achievement: Achievement) -> bool {
        self.achievements.iter().any(|a| a.id == achievement.id())
    }

    /// Grant every newly reached achievement
    pub fn check_achievements(&mut self, particles_spawned: u32, explosions_used: u32) -> Vec<Achievement> {
        let mut granted = Vec::new();
        for achievement in Achievement::ALL {
            if self.has_achievement(achievement) || !achievement.reached(particles_spawned, explosions_used) {
                continue;
            }
            self.achievements.push(AchievementRecord {
                id: achievement.id().to_string(),
                name: achievement.name().to_string(),
                reward: achievement.reward(),
            });
            self.coins += achievement.reward();
            log::info!("Achievement unlocked: {}", achievement.name());
            granted.push(achievement);
        }
        granted
    }

    pub fn owns(&self, item: ShopItem) -> bool {
        self.unlocked.iter().any(|id| id == item.id())
    }

    /// Whether a particle kind may be selected
    pub fn kind_available(&self, kind: ParticleKind) -> bool {
        ShopItem::for_kind(kind).is_none_or(|item| self.owns(item))
    }

    pub fn buy(&mut self, item: ShopItem) -> Purchase {
        if self.owns(item) {
            return Purchase::AlreadyOwned;
        }
        if self.coins < item.cost() {
            return Purchase::InsufficientCoins {
                needed: item.cost() - self.coins,
            };
        }
        self.coins -= item.cost();
        self.unlocked.push(item.id().to_string());
        log::info!("Unlocked {} for {} coins", item.id(), item.cost());
        Purchase::Bought { remaining: self.coins }
    }
}
