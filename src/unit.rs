//! On-screen combatants: a fighter, its HUD and the animation it is playing.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fighter::{Fighter, FighterTemplate};

pub const CONFUSION_MARKS: usize = 5;
const CONFUSION_MARK_MS: u64 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Enemy => "enemy",
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Animation {
    Enter,
    Attack,
    Hit,
    Defense,
    BoostDefense,
    Decrease,
    Confusion,
    Faint,
}

impl Animation {
    pub fn duration(self) -> Duration {
        Duration::from_millis(match self {
            Animation::Enter => 1000,
            Animation::Attack => 500,
            Animation::Hit => 200,
            Animation::Defense => 700,
            Animation::BoostDefense => 800,
            Animation::Decrease => 650,
            Animation::Confusion => CONFUSION_MARK_MS * CONFUSION_MARKS as u64,
            Animation::Faint => 500,
        })
    }

    pub fn sound_cue(self) -> Option<&'static str> {
        match self {
            Animation::Hit => Some("HitSFX"),
            Animation::Faint => Some("GameOverSFX"),
            Animation::Defense | Animation::Confusion => Some("BoingSFX"),
            Animation::Decrease => Some("Hit2SFX"),
            Animation::BoostDefense => Some("BoostDefenseSFX"),
            Animation::Enter | Animation::Attack => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Tint {
    #[default]
    None,
    Gray,
    Green,
    Red,
}

/// Where and how a unit should be drawn this frame, relative to its rest
/// position. `dx` is measured toward the opponent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pose {
    pub dx: i16,
    pub dy: i16,
    pub tint: Tint,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Hud {
    pub name: String,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    /// `clamp01(hp / max_hp)`.
    pub hp_ratio: f32,
}

impl Hud {
    fn from_fighter(fighter: &Fighter) -> Self {
        Self {
            name: fighter.name().to_string(),
            level: fighter.level,
            hp: fighter.hp,
            max_hp: fighter.max_hp(),
            hp_ratio: fighter.hp_ratio(),
        }
    }

    pub fn level_label(&self) -> String {
        format!("Lvl {}", self.level)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActiveAnimation {
    pub kind: Animation,
    pub elapsed_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BattleUnit {
    pub side: Side,
    pub fighter: Fighter,
    pub hud: Hud,
    pub animation: Option<ActiveAnimation>,
    pub fainted: bool,
}

impl BattleUnit {
    pub fn new(side: Side, template: FighterTemplate) -> Self {
        let fighter = Fighter::new(template);
        let hud = Hud::from_fighter(&fighter);
        Self {
            side,
            fighter,
            hud,
            animation: None,
            fainted: false,
        }
    }

    /// Starts `animation`, replacing whatever was playing, and returns the
    /// sound that goes with it.
    pub fn play(&mut self, animation: Animation) -> Option<&'static str> {
        self.animation = Some(ActiveAnimation {
            kind: animation,
            elapsed_ms: 0,
        });
        animation.sound_cue()
    }

    pub fn advance(&mut self, dt: Duration) {
        let Some(active) = self.animation.as_mut() else {
            return;
        };
        active.elapsed_ms = active.elapsed_ms.saturating_add(dt.as_millis() as u64);
        if active.elapsed_ms >= active.kind.duration().as_millis() as u64 {
            if active.kind == Animation::Faint {
                self.fainted = true;
            }
            self.animation = None;
        }
    }

    pub fn update_hud(&mut self) {
        self.hud = Hud::from_fighter(&self.fighter);
    }

    /// Number of `?` marks shown by a running confusion animation.
    pub fn confusion_marks(&self) -> usize {
        match self.animation {
            Some(ActiveAnimation {
                kind: Animation::Confusion,
                elapsed_ms,
            }) => ((elapsed_ms / CONFUSION_MARK_MS) as usize + 1).min(CONFUSION_MARKS),
            _ => 0,
        }
    }

    pub fn pose(&self) -> Pose {
        let rest = Pose {
            visible: !self.fainted,
            ..Pose::default()
        };
        let Some(active) = self.animation else {
            return rest;
        };
        let t = active.elapsed_ms;
        match active.kind {
            Animation::Enter => {
                let total = active.kind.duration().as_millis() as u64;
                let remaining = total.saturating_sub(t);
                Pose {
                    dx: -((remaining * 20 / total.max(1)) as i16),
                    ..rest
                }
            }
            Animation::Attack => Pose {
                dx: if t < 250 { 3 } else { 1 },
                ..rest
            },
            Animation::Hit => Pose {
                tint: Tint::Gray,
                ..rest
            },
            Animation::Defense => {
                let wobble = [(1, -1), (0, -1), (-1, -1), (-1, 1), (0, 1), (1, 1), (0, 0)];
                let (dx, dy) = wobble[((t / 100) as usize).min(wobble.len() - 1)];
                Pose { dx, dy, ..rest }
            }
            Animation::BoostDefense => Pose {
                tint: if (t / 200) % 2 == 0 { Tint::Green } else { Tint::None },
                ..rest
            },
            Animation::Decrease => Pose {
                dy: if t < 250 { 1 } else { 0 },
                tint: if (250..650).contains(&t) { Tint::Red } else { Tint::None },
                ..rest
            },
            Animation::Confusion => rest,
            Animation::Faint => Pose {
                dy: (t / 250 + 1) as i16,
                visible: t < 400,
                ..rest
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fighter::{BaseStats, LearnableMove, MoveCategory, MoveTemplate};

    fn unit() -> BattleUnit {
        BattleUnit::new(
            Side::Player,
            FighterTemplate {
                name: "sparkit".to_string(),
                description: String::new(),
                sprite: "spark".to_string(),
                stats: BaseStats {
                    max_hp: 40,
                    attack: 50,
                    defense: 40,
                    speed: 70,
                    sp_attack: 50,
                    sp_defense: 40,
                },
                level: 10,
                moves: vec![LearnableMove {
                    template: MoveTemplate {
                        name: "tackle".to_string(),
                        category: MoveCategory::Normal,
                        power: 40,
                        accuracy: 100,
                        max_pp: 35,
                        description: String::new(),
                    },
                    level: 1,
                }],
            },
        )
    }

    #[test]
    fn animations_carry_their_sound_cues() {
        let mut unit = unit();
        assert_eq!(unit.play(Animation::Hit), Some("HitSFX"));
        assert_eq!(unit.play(Animation::Confusion), Some("BoingSFX"));
        assert_eq!(unit.play(Animation::Attack), None);
        assert_eq!(Animation::Confusion.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn confusion_marks_accumulate_then_clear() {
        let mut unit = unit();
        unit.play(Animation::Confusion);
        assert_eq!(unit.confusion_marks(), 1);
        unit.advance(Duration::from_millis(650));
        assert_eq!(unit.confusion_marks(), 3);
        unit.advance(Duration::from_millis(700));
        assert_eq!(unit.confusion_marks(), 5);
        unit.advance(Duration::from_millis(200));
        assert_eq!(unit.confusion_marks(), 0);
        assert!(unit.animation.is_none());
    }

    #[test]
    fn faint_hides_the_unit() {
        let mut unit = unit();
        unit.play(Animation::Faint);
        assert!(unit.pose().visible);
        unit.advance(Duration::from_millis(500));
        assert!(unit.fainted);
        assert!(!unit.pose().visible);
    }

    #[test]
    fn hud_tracks_hp_ratio() {
        let mut unit = unit();
        assert_eq!(unit.hud.level_label(), "Lvl 10");
        assert_eq!(unit.hud.hp_ratio, 1.0);
        unit.fighter.hp = -3;
        unit.update_hud();
        assert_eq!(unit.hud.hp_ratio, 0.0);
        assert_eq!(unit.hud.hp, -3);
    }
}
