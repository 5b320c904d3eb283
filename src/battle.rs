//! Turn-based battle orchestration.
//!
//! A battle runs a script of [`Beat`]s front to back. Dialog lines and
//! pauses block the script; when that happens the battle hands back a
//! [`Cue`] carrying a ticket, and the caller resumes it with
//! [`Battle::resume`] or [`Battle::dialog_letter`] once the delay elapses.
//! [`Step`]s are continuation points: executing one mutates combat state and
//! pushes the beats that follow it onto the front of the script, so nested
//! routines keep strict ordering and random draws happen in protocol order.

use std::collections::VecDeque;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Pacing;
use crate::dialog::{DialogBox, ACTION_COUNT, MOVE_SLOTS};
use crate::fighter::{FighterTemplate, MoveCategory, MoveTemplate};
use crate::locale::{compose_dialog, Localizer};
use crate::rng::CombatRng;
use crate::unit::{Animation, BattleUnit, Side};

/// Chance out of ten rolls below which confusion neither hurts nor clears.
const CONFUSION_THRESHOLD: usize = 5;
const CONFUSION_ROLL: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum BattlePhase {
    Start,
    PlayerAction,
    PlayerMove,
    EnemyMove,
    Busy,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Up and right are positive steps.
    fn is_positive(self) -> bool {
        matches!(self, Direction::Up | Direction::Right)
    }
}

/// A dialog key and the raw values substituted into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Line {
    pub key: String,
    pub values: Vec<String>,
}

impl Line {
    pub fn new(key: &str, values: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            values: values.iter().map(|value| value.to_string()).collect(),
        }
    }

    fn compose(&self, strings: &dyn Localizer) -> String {
        compose_dialog(
            strings,
            &self.key,
            self.values.first().map(String::as_str),
            self.values.get(1).map(String::as_str),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MoveRef {
    Slot(usize),
    /// The fixed move a confused fighter uses on itself.
    SelfHit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum Beat {
    Say(Line),
    Pause { ms: u64 },
    Animate(Side, Animation),
    Phase(BattlePhase),
    RefreshHud,
    Step(Step),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum Step {
    PlayerAction,
    OfferActions,
    ShowSelection,
    PlayerTurn { slot: usize },
    AfterPlayerTurn,
    EnemyTurn,
    AfterEnemyTurn,
    Execute { attacker: Side, mv: MoveRef },
    ConfusionRoll { attacker: Side, mv: MoveRef },
    Dispatch { attacker: Side, mv: MoveRef },
    Strike { attacker: Side, target: Side, mv: MoveRef },
    Confuse { target: Side },
    DefenseEffect { attacker: Side, mv: MoveRef },
    Heal { attacker: Side, mv: MoveRef },
    SpendPp { side: Side, slot: usize },
    EndBattle { loser: Side },
    Finish { loser: Side },
}

/// Output of the battle for whoever drives it.
#[derive(Clone, Debug, PartialEq)]
pub enum Cue {
    /// Call [`Battle::resume`] with `ticket` after `duration`.
    Wait { ticket: u64, duration: Duration },
    /// Call [`Battle::dialog_letter`] with `ticket` after `delay`.
    TypeLetter { ticket: u64, delay: Duration },
    Sound(&'static str),
    BattleOver { player_won: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
struct Typing {
    ticket: u64,
    blocks_script: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Battle {
    pub phase: BattlePhase,
    pub player: BattleUnit,
    pub enemy: BattleUnit,
    pub dialog: DialogBox,
    pub current_action: usize,
    pub current_move: usize,
    /// Every line typed so far, oldest first.
    pub log: Vec<String>,
    pacing: Pacing,
    script: VecDeque<Beat>,
    pause: Option<u64>,
    typing: Option<Typing>,
    next_ticket: u64,
    outcome: Option<bool>,
    /// Bumped by every input or timer that was not ignored.
    #[serde(default)]
    revision: u64,
}

impl Battle {
    /// Sets both units up and runs the opening script until it first blocks.
    ///
    /// Tickets are issued from `first_ticket` upward so a caller can keep
    /// them unique across battles.
    pub fn start(
        player: FighterTemplate,
        enemy: FighterTemplate,
        pacing: Pacing,
        first_ticket: u64,
        rng: &mut impl CombatRng,
        strings: &dyn Localizer,
    ) -> (Self, Vec<Cue>) {
        let mut battle = Self {
            phase: BattlePhase::Start,
            player: BattleUnit::new(Side::Player, player),
            enemy: BattleUnit::new(Side::Enemy, enemy),
            dialog: DialogBox::default(),
            current_action: 0,
            current_move: 0,
            log: Vec::new(),
            pacing,
            script: VecDeque::new(),
            pause: None,
            typing: None,
            next_ticket: first_ticket,
            outcome: None,
            revision: 0,
        };
        tracing::info!(
            player = battle.player.fighter.name(),
            enemy = battle.enemy.fighter.name(),
            "battle started"
        );

        let mut cues = Vec::new();
        battle.animate(Side::Player, Animation::Enter, &mut cues);
        battle.animate(Side::Enemy, Animation::Enter, &mut cues);
        battle.refresh_huds();

        battle.dialog.enable_dialog_text(true);
        battle.dialog.enable_action_selector(false);
        battle
            .dialog
            .set_move_names(&battle.player.fighter.moves, strings);

        let enemy_name = battle.enemy.fighter.name().to_string();
        let pause = battle.short_pause();
        battle.script.extend([
            say("BATTLE_ENTRY", &[&enemy_name]),
            pause,
            Beat::Step(Step::ShowSelection),
            Beat::Step(Step::PlayerAction),
        ]);
        cues.extend(battle.run(rng, strings));
        (battle, cues)
    }

    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    /// The first ticket not yet handed out.
    pub fn next_ticket(&self) -> u64 {
        self.next_ticket
    }

    /// Changes whenever an entry point acted instead of ignoring its input.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn pending_beats(&self) -> usize {
        self.script.len()
    }

    pub fn accepts_input(&self) -> bool {
        matches!(
            self.phase,
            BattlePhase::PlayerAction | BattlePhase::PlayerMove
        )
    }

    pub fn unit(&self, side: Side) -> &BattleUnit {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    pub fn unit_mut(&mut self, side: Side) -> &mut BattleUnit {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// Advances unit animations. Purely visual.
    pub fn advance(&mut self, dt: Duration) {
        self.player.advance(dt);
        self.enemy.advance(dt);
    }

    pub fn resume(
        &mut self,
        ticket: u64,
        rng: &mut impl CombatRng,
        strings: &dyn Localizer,
    ) -> Vec<Cue> {
        if self.pause != Some(ticket) {
            tracing::debug!(ticket, "stale wait ticket ignored");
            return Vec::new();
        }
        self.pause = None;
        self.revision += 1;
        self.run(rng, strings)
    }

    pub fn dialog_letter(
        &mut self,
        ticket: u64,
        rng: &mut impl CombatRng,
        strings: &dyn Localizer,
    ) -> Vec<Cue> {
        let Some(typing) = self.typing.filter(|typing| typing.ticket == ticket) else {
            tracing::debug!(ticket, "stale typing ticket ignored");
            return Vec::new();
        };
        self.revision += 1;
        if self.dialog.reveal_next() {
            return vec![Cue::TypeLetter {
                ticket,
                delay: self.pacing.letter_delay(),
            }];
        }
        self.typing = None;
        if typing.blocks_script {
            self.run(rng, strings)
        } else {
            Vec::new()
        }
    }

    pub fn navigate(&mut self, direction: Direction) -> Vec<Cue> {
        match self.phase {
            BattlePhase::PlayerAction => {
                if !direction.is_vertical() {
                    return Vec::new();
                }
                let delta = if direction.is_positive() { -1 } else { 1 };
                self.current_action = (self.current_action as i32 + delta)
                    .clamp(0, ACTION_COUNT as i32 - 1) as usize;
                self.dialog.update_action_selection(self.current_action);
                self.revision += 1;
                vec![Cue::Sound("HandleButton")]
            }
            BattlePhase::PlayerMove => {
                let count = self.player.fighter.moves.len().min(MOVE_SLOTS) as i32;
                let delta = match (direction.is_vertical(), direction.is_positive()) {
                    (true, true) => -2,
                    (true, false) => 2,
                    (false, true) => 1,
                    (false, false) => -1,
                };
                self.current_move =
                    (self.current_move as i32 + delta).clamp(0, (count - 1).max(0)) as usize;
                self.show_move_selection();
                self.revision += 1;
                vec![Cue::Sound("HandleButton")]
            }
            _ => Vec::new(),
        }
    }

    pub fn confirm(&mut self, rng: &mut impl CombatRng, strings: &dyn Localizer) -> Vec<Cue> {
        match self.phase {
            BattlePhase::PlayerAction => {
                self.revision += 1;
                let mut cues = vec![Cue::Sound("AcceptButton")];
                if self.current_action == 0 {
                    self.open_move_selector();
                } else {
                    self.say(&Line::new("BATTLE_RUN_AWAY", &[]), false, strings, &mut cues);
                }
                cues
            }
            BattlePhase::PlayerMove => {
                if self.dialog.is_disabled(self.current_move) {
                    return Vec::new();
                }
                self.revision += 1;
                self.dialog.enable_move_selector(false);
                self.dialog.enable_action_selector(false);
                self.dialog.enable_dialog_text(true);
                self.script.push_back(Beat::Step(Step::PlayerTurn {
                    slot: self.current_move,
                }));
                self.run(rng, strings)
            }
            _ => Vec::new(),
        }
    }

    /// Backs out of the move grid into a fresh action prompt.
    pub fn cancel(&mut self, rng: &mut impl CombatRng, strings: &dyn Localizer) -> Vec<Cue> {
        if self.phase != BattlePhase::PlayerMove {
            return Vec::new();
        }
        self.revision += 1;
        self.dialog.enable_move_selector(false);
        self.dialog.enable_dialog_text(true);
        self.script.push_back(Beat::Step(Step::PlayerAction));
        self.run(rng, strings)
    }

    fn run(&mut self, rng: &mut impl CombatRng, strings: &dyn Localizer) -> Vec<Cue> {
        let mut cues = Vec::new();
        while !self.is_blocked() {
            let Some(beat) = self.script.pop_front() else {
                break;
            };
            self.perform(beat, rng, strings, &mut cues);
        }
        cues
    }

    fn is_blocked(&self) -> bool {
        self.pause.is_some() || self.typing.is_some_and(|typing| typing.blocks_script)
    }

    fn perform(
        &mut self,
        beat: Beat,
        rng: &mut impl CombatRng,
        strings: &dyn Localizer,
        cues: &mut Vec<Cue>,
    ) {
        match beat {
            Beat::Say(line) => self.say(&line, true, strings, cues),
            Beat::Pause { ms } => {
                let ticket = self.issue_ticket();
                self.pause = Some(ticket);
                cues.push(Cue::Wait {
                    ticket,
                    duration: Duration::from_millis(ms),
                });
            }
            Beat::Animate(side, animation) => self.animate(side, animation, cues),
            Beat::Phase(phase) => self.set_phase(phase),
            Beat::RefreshHud => self.refresh_huds(),
            Beat::Step(step) => self.step(step, rng, cues),
        }
    }

    fn step(&mut self, step: Step, rng: &mut impl CombatRng, cues: &mut Vec<Cue>) {
        match step {
            Step::PlayerAction => {
                self.set_phase(BattlePhase::Busy);
                let exhausted: Vec<usize> = self
                    .player
                    .fighter
                    .moves
                    .iter()
                    .enumerate()
                    .filter(|(slot, mv)| *slot < MOVE_SLOTS && mv.is_exhausted())
                    .map(|(slot, _)| slot)
                    .collect();
                for slot in exhausted {
                    self.dialog.disable_move(slot);
                }

                let name = self.player.fighter.name().to_string();
                if self
                    .dialog
                    .all_moves_disabled(self.player.fighter.moves.len())
                {
                    self.push_front(vec![
                        say("NO_MOVEMENTS", &[&name]),
                        Beat::Step(Step::EndBattle { loser: Side::Player }),
                    ]);
                    return;
                }
                let pause = Beat::Pause {
                    ms: self.pacing.action_pause().as_millis() as u64,
                };
                self.push_front(vec![
                    say("BATTLE_ACTION", &[&name]),
                    pause,
                    Beat::Step(Step::OfferActions),
                ]);
            }
            Step::OfferActions => {
                self.set_phase(BattlePhase::PlayerAction);
                self.current_action = 0;
                self.dialog.update_action_selection(0);
                self.dialog.enable_action_selector(true);
                self.dialog.enable_dialog_text(true);
                self.dialog.enable_move_selector(false);
            }
            Step::ShowSelection => {
                self.dialog.update_action_selection(self.current_action);
                self.show_move_selection();
            }
            Step::PlayerTurn { slot } => {
                self.set_phase(BattlePhase::Busy);
                self.queue_turn(Side::Player, slot, Step::AfterPlayerTurn);
            }
            Step::AfterPlayerTurn => {
                let next = if self.enemy.fighter.is_fainted() {
                    Step::EndBattle { loser: Side::Enemy }
                } else if self.player.fighter.is_fainted() {
                    Step::EndBattle { loser: Side::Player }
                } else {
                    Step::EnemyTurn
                };
                self.push_front(vec![Beat::Step(next)]);
            }
            Step::EnemyTurn => {
                self.set_phase(BattlePhase::EnemyMove);
                match self.enemy.fighter.random_move_index(rng) {
                    Some(slot) => self.queue_turn(Side::Enemy, slot, Step::AfterEnemyTurn),
                    None => {
                        tracing::warn!(
                            enemy = self.enemy.fighter.name(),
                            "enemy has no moves, turn skipped"
                        );
                        self.push_front(vec![Beat::Step(Step::AfterEnemyTurn)]);
                    }
                }
            }
            Step::AfterEnemyTurn => {
                let next = if self.player.fighter.is_fainted() {
                    Step::EndBattle { loser: Side::Player }
                } else if self.enemy.fighter.is_fainted() {
                    Step::EndBattle { loser: Side::Enemy }
                } else {
                    Step::PlayerAction
                };
                self.push_front(vec![Beat::Step(next)]);
            }
            Step::Execute { attacker, mv } => {
                if self.unit(attacker).fighter.is_confused() {
                    let name = self.name(attacker);
                    let pause = self.short_pause();
                    self.push_front(vec![
                        Beat::Animate(attacker, Animation::Confusion),
                        say("BATTLE_IS_CONFUSE", &[&name]),
                        pause,
                        Beat::Step(Step::ConfusionRoll { attacker, mv }),
                    ]);
                } else {
                    self.push_front(vec![Beat::Step(Step::Dispatch { attacker, mv })]);
                }
            }
            Step::ConfusionRoll { attacker, mv } => {
                let name = self.name(attacker);
                let hurt_roll = rng.below(CONFUSION_ROLL);
                if hurt_roll >= CONFUSION_THRESHOLD {
                    let mut beats = vec![say("BATTLE_CONFUSION_DAMAGE", &[&name])];
                    beats.extend(self.attack_beats(attacker, attacker, MoveRef::SelfHit));
                    self.push_front(beats);
                    return;
                }
                let release_roll = rng.below(CONFUSION_ROLL);
                let mut beats = Vec::new();
                if release_roll >= CONFUSION_THRESHOLD {
                    self.unit_mut(attacker).fighter.recover();
                    beats.push(say("BATTLE_CONFUSION_END", &[&name]));
                }
                beats.push(Beat::Step(Step::Dispatch { attacker, mv }));
                self.push_front(beats);
            }
            Step::Dispatch { attacker, mv } => {
                let Some(template) = self.move_template(attacker, mv) else {
                    return;
                };
                let beats = match template.category {
                    MoveCategory::Normal | MoveCategory::Psychic => {
                        self.attack_beats(attacker, attacker.opponent(), mv)
                    }
                    MoveCategory::Defense => vec![
                        Beat::Animate(attacker, Animation::Defense),
                        self.short_pause(),
                        Beat::Step(Step::DefenseEffect { attacker, mv }),
                    ],
                    MoveCategory::Health => vec![Beat::Step(Step::Heal { attacker, mv })],
                };
                self.push_front(beats);
            }
            Step::Strike {
                attacker,
                target,
                mv,
            } => {
                let Some(template) = self.move_template(attacker, mv) else {
                    return;
                };
                let striker = self.unit(attacker).fighter.clone();
                let dealt = self
                    .unit_mut(target)
                    .fighter
                    .receive_attack(&template, &striker, rng);
                tracing::debug!(
                    attacker = attacker.label(),
                    target = target.label(),
                    dealt,
                    "attack resolved"
                );

                if template.category == MoveCategory::Psychic
                    && !self.unit(target).fighter.is_confused()
                {
                    let name = self.name(target);
                    self.push_front(vec![
                        self.short_pause(),
                        Beat::Animate(target, Animation::Confusion),
                        self.short_pause(),
                        say("BATTLE_IS_CONFUSE", &[&name]),
                        Beat::Step(Step::Confuse { target }),
                    ]);
                }
            }
            Step::Confuse { target } => self.unit_mut(target).fighter.confuse(),
            Step::DefenseEffect { attacker, mv } => {
                let Some(template) = self.move_template(attacker, mv) else {
                    return;
                };
                if template.power > 0 {
                    let amount = self
                        .unit_mut(attacker)
                        .fighter
                        .boost_defense(&template, rng);
                    tracing::debug!(side = attacker.label(), amount, "defense boosted");
                    let name = self.name(attacker);
                    self.push_front(vec![
                        Beat::Animate(attacker, Animation::BoostDefense),
                        say("BATTLE_BOOST_DEFENSE", &[&name]),
                    ]);
                } else {
                    let target = attacker.opponent();
                    let amount = self
                        .unit_mut(target)
                        .fighter
                        .decrease_defense(&template, rng);
                    tracing::debug!(side = target.label(), amount, "defense decreased");
                    let name = self.name(target);
                    self.push_front(vec![
                        Beat::Animate(target, Animation::Decrease),
                        say("BATTLE_DECREASE_DEFENSE", &[&name]),
                    ]);
                }
            }
            Step::Heal { attacker, mv } => {
                let Some(template) = self.move_template(attacker, mv) else {
                    return;
                };
                let healed = self.unit_mut(attacker).fighter.heal(&template, rng);
                tracing::debug!(side = attacker.label(), healed, "hp recovered");
                let name = self.name(attacker);
                self.push_front(vec![
                    say("BATTLE_RECOVER_HP", &[&name]),
                    Beat::RefreshHud,
                ]);
            }
            Step::SpendPp { side, slot } => {
                if let Some(mv) = self.unit_mut(side).fighter.moves.get_mut(slot) {
                    mv.spend();
                }
            }
            Step::EndBattle { loser } => {
                let name = self.name(loser);
                self.push_front(vec![
                    say("BATTLE_LOST", &[&name]),
                    Beat::Animate(loser, Animation::Faint),
                    Beat::Step(Step::Finish { loser }),
                ]);
            }
            Step::Finish { loser } => {
                self.set_phase(BattlePhase::End);
                let player_won = loser == Side::Enemy;
                self.outcome = Some(player_won);
                tracing::info!(player_won, "battle over");
                cues.push(Cue::BattleOver { player_won });
            }
        }
    }

    /// Announce, execute, pay PP, refresh the HUD, then continue with `after`.
    fn queue_turn(&mut self, side: Side, slot: usize, after: Step) {
        let Some(move_name) = self
            .unit(side)
            .fighter
            .moves
            .get(slot)
            .map(|mv| mv.name().to_string())
        else {
            tracing::warn!(side = side.label(), slot, "move slot missing, turn skipped");
            self.push_front(vec![Beat::Step(after)]);
            return;
        };
        let name = self.name(side);
        self.push_front(vec![
            say("BATTLE_PLAYER_MOVE", &[&name, &move_name]),
            self.short_pause(),
            Beat::Step(Step::Execute {
                attacker: side,
                mv: MoveRef::Slot(slot),
            }),
            Beat::Step(Step::SpendPp { side, slot }),
            Beat::RefreshHud,
            self.short_pause(),
            Beat::Step(after),
        ]);
    }

    fn attack_beats(&self, attacker: Side, target: Side, mv: MoveRef) -> Vec<Beat> {
        vec![
            Beat::Animate(attacker, Animation::Attack),
            self.short_pause(),
            Beat::Animate(target, Animation::Hit),
            Beat::Step(Step::Strike {
                attacker,
                target,
                mv,
            }),
        ]
    }

    fn say(&mut self, line: &Line, blocks_script: bool, strings: &dyn Localizer, cues: &mut Vec<Cue>) {
        if self.dialog.is_writing() {
            tracing::debug!(key = %line.key, "dialog busy, line dropped");
            return;
        }
        let text = line.compose(strings);
        self.log.push(text.clone());
        self.dialog.begin_line(text);
        if self.dialog.is_writing() {
            let ticket = self.issue_ticket();
            self.typing = Some(Typing {
                ticket,
                blocks_script,
            });
            cues.push(Cue::TypeLetter {
                ticket,
                delay: self.pacing.letter_delay(),
            });
        }
    }

    fn animate(&mut self, side: Side, animation: Animation, cues: &mut Vec<Cue>) {
        if let Some(sound) = self.unit_mut(side).play(animation) {
            cues.push(Cue::Sound(sound));
        }
    }

    fn open_move_selector(&mut self) {
        self.set_phase(BattlePhase::PlayerMove);
        self.dialog.enable_action_selector(false);
        self.dialog.enable_dialog_text(false);
        self.dialog.enable_move_selector(true);
        self.show_move_selection();
    }

    fn show_move_selection(&mut self) {
        match self.player.fighter.moves.get(self.current_move) {
            Some(mv) => self.dialog.update_move_selection(self.current_move, mv),
            None => tracing::warn!(slot = self.current_move, "no move to highlight"),
        }
    }

    fn refresh_huds(&mut self) {
        self.player.update_hud();
        self.enemy.update_hud();
    }

    fn set_phase(&mut self, phase: BattlePhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "battle phase");
            self.phase = phase;
        }
    }

    fn move_template(&self, side: Side, mv: MoveRef) -> Option<MoveTemplate> {
        match mv {
            MoveRef::SelfHit => Some(MoveTemplate::self_hit()),
            MoveRef::Slot(slot) => {
                let template = self
                    .unit(side)
                    .fighter
                    .moves
                    .get(slot)
                    .map(|mv| mv.template.clone());
                if template.is_none() {
                    tracing::warn!(side = side.label(), slot, "move slot missing, skipped");
                }
                template
            }
        }
    }

    fn name(&self, side: Side) -> String {
        self.unit(side).fighter.name().to_string()
    }

    fn short_pause(&self) -> Beat {
        Beat::Pause {
            ms: self.pacing.short_pause().as_millis() as u64,
        }
    }

    fn push_front(&mut self, beats: Vec<Beat>) {
        for beat in beats.into_iter().rev() {
            self.script.push_front(beat);
        }
    }

    fn issue_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }
}

fn say(key: &str, values: &[&str]) -> Beat {
    Beat::Say(Line::new(key, values))
}
