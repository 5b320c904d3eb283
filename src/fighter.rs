use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rng::CombatRng;

/// Power of the move a confused fighter uses on itself.
pub const SELF_HIT_POWER: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum MoveCategory {
    Normal,
    Psychic,
    Defense,
    Health,
}

impl MoveCategory {
    pub fn label(self) -> &'static str {
        match self {
            MoveCategory::Normal => "NORMAL",
            MoveCategory::Psychic => "PSYCHIC",
            MoveCategory::Defense => "DEFENSE",
            MoveCategory::Health => "HEALTH",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MoveTemplate {
    pub name: String,
    pub category: MoveCategory,
    pub power: i32,
    /// Authored but not consulted by combat resolution.
    #[serde(default)]
    pub accuracy: i32,
    pub max_pp: i32,
    #[serde(default)]
    pub description: String,
}

impl MoveTemplate {
    /// The fixed move used when confusion makes a fighter hit itself.
    pub fn self_hit() -> Self {
        Self {
            name: String::new(),
            category: MoveCategory::Normal,
            power: SELF_HIT_POWER,
            accuracy: 0,
            max_pp: 0,
            description: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LearnableMove {
    pub template: MoveTemplate,
    /// Level the move is learned at. Every declared move is granted when a
    /// fighter is created, regardless of this value.
    pub level: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BaseStats {
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub sp_attack: i32,
    pub sp_defense: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FighterTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sprite: String,
    pub stats: BaseStats,
    pub level: i32,
    pub moves: Vec<LearnableMove>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FighterStatus {
    #[default]
    Ok,
    Confused,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Move {
    pub template: MoveTemplate,
    /// Remaining uses. Never replenished and never floored.
    pub pp: i32,
}

impl Move {
    pub fn new(template: MoveTemplate) -> Self {
        let pp = template.max_pp;
        Self { template, pp }
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn category(&self) -> MoveCategory {
        self.template.category
    }

    pub fn spend(&mut self) {
        self.pp -= 1;
    }

    pub fn is_exhausted(&self) -> bool {
        self.pp <= 0
    }
}

/// `floor(base * level / 100) + 5`
pub fn derived_stat(base: i32, level: i32) -> i32 {
    (base * level).div_euclid(100) + 5
}

/// `floor(base * level / 100) + 10`
pub fn derived_max_hp(base: i32, level: i32) -> i32 {
    (base * level).div_euclid(100) + 10
}

/// `(2 * level + 10) / 250`, shared by damage, healing and defense changes.
pub fn level_factor(level: i32) -> f32 {
    (2 * level + 10) as f32 / 250.0
}

fn scaled_amount(level: i32, power: i32, rng: &mut impl CombatRng) -> i32 {
    let modifier = rng.modifier();
    (level_factor(level) * power as f32 * modifier).floor() as i32
}

/// A combat participant. HP may drop below zero; any HP `<= 0` is a faint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Fighter {
    pub template: FighterTemplate,
    pub level: i32,
    pub hp: i32,
    pub defense: i32,
    pub status: FighterStatus,
    pub moves: Vec<Move>,
}

impl Fighter {
    pub fn new(template: FighterTemplate) -> Self {
        let level = template.level;
        let moves = template
            .moves
            .iter()
            .map(|learnable| Move::new(learnable.template.clone()))
            .collect();
        let mut fighter = Self {
            template,
            level,
            hp: 0,
            defense: 0,
            status: FighterStatus::Ok,
            moves,
        };
        fighter.hp = fighter.max_hp();
        fighter.defense = fighter.max_defense();
        fighter
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn attack(&self) -> i32 {
        derived_stat(self.template.stats.attack, self.level)
    }

    pub fn max_defense(&self) -> i32 {
        derived_stat(self.template.stats.defense, self.level)
    }

    pub fn max_hp(&self) -> i32 {
        derived_max_hp(self.template.stats.max_hp, self.level)
    }

    pub fn speed(&self) -> i32 {
        derived_stat(self.template.stats.speed, self.level)
    }

    pub fn sp_attack(&self) -> i32 {
        derived_stat(self.template.stats.sp_attack, self.level)
    }

    pub fn sp_defense(&self) -> i32 {
        derived_stat(self.template.stats.sp_defense, self.level)
    }

    pub fn is_fainted(&self) -> bool {
        self.hp <= 0
    }

    pub fn is_confused(&self) -> bool {
        self.status == FighterStatus::Confused
    }

    pub fn confuse(&mut self) {
        self.status = FighterStatus::Confused;
    }

    pub fn recover(&mut self) {
        self.status = FighterStatus::Ok;
    }

    /// HP as a fraction of max HP, clamped to `[0, 1]`.
    pub fn hp_ratio(&self) -> f32 {
        let max = self.max_hp();
        if max <= 0 {
            return 0.0;
        }
        (self.hp as f32 / max as f32).clamp(0.0, 1.0)
    }

    /// Applies the damage formula unconditionally and returns the HP lost.
    ///
    /// The defender's derived max defense is used, not the mutable
    /// `defense` value.
    pub fn take_damage(
        &mut self,
        mv: &MoveTemplate,
        attacker: &Fighter,
        rng: &mut impl CombatRng,
    ) -> i32 {
        let modifier = rng.modifier();
        let ratio = attacker.attack() as f32 / self.max_defense() as f32;
        let base = level_factor(attacker.level) * mv.power as f32 * ratio + 2.0;
        let damage = (base * modifier).floor() as i32;
        self.hp -= damage;
        damage
    }

    /// Attack entry point used by battles: moves without positive power deal
    /// nothing and draw nothing.
    pub fn receive_attack(
        &mut self,
        mv: &MoveTemplate,
        attacker: &Fighter,
        rng: &mut impl CombatRng,
    ) -> i32 {
        if mv.power <= 0 {
            return 0;
        }
        self.take_damage(mv, attacker, rng)
    }

    /// Heals by the scaled move power, never past max HP. Returns HP gained.
    pub fn heal(&mut self, mv: &MoveTemplate, rng: &mut impl CombatRng) -> i32 {
        let amount = scaled_amount(self.level, mv.power, rng);
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp());
        self.hp - before
    }

    pub fn boost_defense(&mut self, mv: &MoveTemplate, rng: &mut impl CombatRng) -> i32 {
        let amount = scaled_amount(self.level, mv.power, rng);
        self.defense += amount;
        amount
    }

    /// Subtracts the scaled amount. With the non-positive power that marks a
    /// decrease move, the amount itself is non-positive.
    pub fn decrease_defense(&mut self, mv: &MoveTemplate, rng: &mut impl CombatRng) -> i32 {
        let amount = scaled_amount(self.level, mv.power, rng);
        self.defense -= amount;
        amount
    }

    /// Uniform pick over every move, PP included or not.
    pub fn random_move_index(&self, rng: &mut impl CombatRng) -> Option<usize> {
        if self.moves.is_empty() {
            return None;
        }
        Some(rng.below(self.moves.len()))
    }
}
