use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::battle::Battle;
use crate::config::Pacing;
use crate::locale::{compose_dialog, Locales};
use crate::rng::SeededRng;
use crate::roster::{Roster, Trainer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum GameMode {
    /// The trainer ladder.
    Overworld,
    Battle,
    GameOver,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub mode: GameMode,
    pub roster: Roster,
    pub locales: Locales,
    pub pacing: Pacing,
    /// Cursor on the trainer ladder.
    pub selected: usize,
    /// Ids of trainers beaten this run.
    #[serde(default)]
    pub defeated: BTreeSet<String>,
    pub battle: Option<Battle>,
    /// Ladder index of the trainer being fought.
    pub opponent: Option<usize>,
    pub message: Option<String>,
    #[serde(default)]
    pub music_paused: bool,
    /// First battle ticket not yet handed out.
    pub next_ticket: u64,
    #[serde(default)]
    pub tick: u64,
    #[schemars(skip)]
    pub rng: SeededRng,
}

impl AppState {
    pub fn new(roster: Roster, locales: Locales, pacing: Pacing, rng: SeededRng) -> Self {
        Self {
            terminal_size: (80, 24),
            mode: GameMode::Overworld,
            roster,
            locales,
            pacing,
            selected: 0,
            defeated: BTreeSet::new(),
            battle: None,
            opponent: None,
            message: None,
            music_paused: false,
            next_ticket: 1,
            tick: 0,
            rng,
        }
    }

    pub fn trainers(&self) -> &[Trainer] {
        &self.roster.trainers
    }

    pub fn selected_trainer(&self) -> Option<&Trainer> {
        self.roster.trainers.get(self.selected)
    }

    pub fn is_defeated(&self, trainer: &Trainer) -> bool {
        self.defeated.contains(&trainer.id)
    }

    pub fn ladder_cleared(&self) -> bool {
        self.roster
            .trainers
            .iter()
            .all(|trainer| self.is_defeated(trainer))
    }

    /// Composes a dialog line in the active language.
    pub fn line(&self, key: &str) -> String {
        compose_dialog(&self.locales, key, None, None)
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let mut sections = vec![
            DebugSection::new("Mode")
                .entry("mode", ron_string(&self.mode))
                .entry("language", ron_string(&self.locales.language))
                .entry("message", ron_string(&self.message)),
            DebugSection::new("Ladder")
                .entry("selected", ron_string(&self.selected))
                .entry("defeated", ron_string(&self.defeated))
                .entry("opponent", ron_string(&self.opponent)),
        ];

        if let Some(battle) = &self.battle {
            sections.push(
                DebugSection::new("Battle")
                    .entry("phase", ron_string(&battle.phase))
                    .entry("player_hp", ron_string(&battle.player.fighter.hp))
                    .entry("enemy_hp", ron_string(&battle.enemy.fighter.hp))
                    .entry("player_confused", ron_string(&battle.player.fighter.is_confused()))
                    .entry("enemy_confused", ron_string(&battle.enemy.fighter.is_confused()))
                    .entry("pending_beats", ron_string(&battle.pending_beats()))
                    .entry("next_ticket", ron_string(&battle.next_ticket())),
            );
        }

        sections
    }
}
