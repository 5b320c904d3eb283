//! Authored fighter, move and trainer data.
//!
//! The roster is a RON document. Fighters list their moves by name; loading
//! resolves those names against the move catalog so every
//! [`FighterTemplate`] carries complete [`MoveTemplate`]s.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fighter::{
    derived_max_hp, derived_stat, BaseStats, FighterTemplate, LearnableMove, MoveTemplate,
};

const EMBEDDED_ROSTER: &str = include_str!("../assets/roster.ron");

#[derive(thiserror::Error, Debug)]
pub enum RosterError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse roster: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("fighter `{fighter}` references unknown move `{name}`")]
    UnknownMove { fighter: String, name: String },
    #[error("unknown fighter `{0}`")]
    UnknownFighter(String),
    #[error("fighter `{0}` has no moves")]
    NoMoves(String),
    #[error("fighter `{fighter}` has non-positive {stat} ({value}) at level {level}")]
    InvalidStat {
        fighter: String,
        stat: &'static str,
        value: i32,
        level: i32,
    },
}

#[derive(Clone, Debug, Deserialize)]
struct RosterDocument {
    moves: Vec<MoveTemplate>,
    fighters: Vec<FighterEntry>,
    player: String,
    #[serde(default)]
    trainers: Vec<TrainerEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct FighterEntry {
    name: String,
    #[serde(default)]
    description: String,
    sprite: String,
    level: i32,
    stats: BaseStats,
    moves: Vec<MoveEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct MoveEntry {
    name: String,
    #[serde(default = "default_learn_level")]
    level: i32,
}

#[derive(Clone, Debug, Deserialize)]
struct TrainerEntry {
    id: String,
    name: String,
    fighter: String,
    intro: String,
    defeated: String,
}

/// An opponent the player can challenge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Trainer {
    pub id: String,
    pub name: String,
    pub fighter: FighterTemplate,
    /// Dialog key shown before the battle starts.
    pub intro_key: String,
    /// Dialog key shown when challenged after being beaten.
    pub defeated_key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Roster {
    pub moves: Vec<MoveTemplate>,
    pub fighters: Vec<FighterTemplate>,
    pub player: FighterTemplate,
    pub trainers: Vec<Trainer>,
}

impl Roster {
    pub fn embedded() -> Result<Self, RosterError> {
        Self::from_ron_str(EMBEDDED_ROSTER)
    }

    pub async fn load(path: &Path) -> Result<Self, RosterError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RosterError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_ron_str(&text)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, RosterError> {
        let document: RosterDocument = ron::de::from_str(text)?;
        let fighters = document
            .fighters
            .iter()
            .map(|entry| resolve_fighter(entry, &document.moves))
            .collect::<Result<Vec<_>, _>>()?;

        let find = |name: &str| {
            fighters
                .iter()
                .find(|fighter| fighter.name == name)
                .cloned()
                .ok_or_else(|| RosterError::UnknownFighter(name.to_string()))
        };

        let player = find(&document.player)?;
        let trainers = document
            .trainers
            .iter()
            .map(|entry| {
                Ok(Trainer {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    fighter: find(&entry.fighter)?,
                    intro_key: entry.intro.clone(),
                    defeated_key: entry.defeated.clone(),
                })
            })
            .collect::<Result<Vec<_>, RosterError>>()?;

        Ok(Self {
            moves: document.moves,
            fighters,
            player,
            trainers,
        })
    }

    pub fn fighter(&self, name: &str) -> Option<&FighterTemplate> {
        self.fighters.iter().find(|fighter| fighter.name == name)
    }

}

fn resolve_fighter(
    entry: &FighterEntry,
    catalog: &[MoveTemplate],
) -> Result<FighterTemplate, RosterError> {
    if entry.moves.is_empty() {
        return Err(RosterError::NoMoves(entry.name.clone()));
    }
    // Damage divides by max defense.
    let derived = [
        ("defense", derived_stat(entry.stats.defense, entry.level)),
        ("max HP", derived_max_hp(entry.stats.max_hp, entry.level)),
    ];
    if let Some(&(stat, value)) = derived.iter().find(|(_, value)| *value <= 0) {
        return Err(RosterError::InvalidStat {
            fighter: entry.name.clone(),
            stat,
            value,
            level: entry.level,
        });
    }
    let moves = entry
        .moves
        .iter()
        .map(|mv| {
            catalog
                .iter()
                .find(|template| template.name == mv.name)
                .map(|template| LearnableMove {
                    template: template.clone(),
                    level: mv.level,
                })
                .ok_or_else(|| RosterError::UnknownMove {
                    fighter: entry.name.clone(),
                    name: mv.name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FighterTemplate {
        name: entry.name.clone(),
        description: entry.description.clone(),
        sprite: entry.sprite.clone(),
        stats: entry.stats.clone(),
        level: entry.level,
        moves,
    })
}

fn default_learn_level() -> i32 {
    1
}
