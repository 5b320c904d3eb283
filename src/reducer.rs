use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::battle::{Battle, Cue};
use crate::config::TICK_INTERVAL;
use crate::effect::Effect;
use crate::locale::{fill_dialog, Locales};
use crate::rng::SeededRng;
use crate::state::{AppState, GameMode};

pub const HOME_MUSIC: &str = "Home";

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.mode = GameMode::Overworld;
            state.message = Some(state.line("INIT_DIALOG"));
            state.music_paused = false;
            DispatchResult::changed_with(Effect::PlayMusic(HOME_MUSIC))
        }
        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }
        Action::Tick => tick_animation(state),

        Action::LadderSelect(index) => ladder_select(state, index),
        Action::LadderConfirm => ladder_confirm(state),
        Action::LanguageToggle => {
            if state.mode != GameMode::Overworld {
                return DispatchResult::unchanged();
            }
            state.locales.language = state.locales.language.toggle();
            tracing::info!(language = state.locales.language.code(), "language changed");
            state.message = Some(state.line("INIT_DIALOG"));
            DispatchResult::changed()
        }

        Action::BattleNavigate(direction) => {
            drive_battle(state, |battle, _, _| battle.navigate(direction))
        }
        Action::BattleConfirm => {
            drive_battle(state, |battle, rng, strings| battle.confirm(rng, strings))
        }
        Action::BattleCancel => {
            drive_battle(state, |battle, rng, strings| battle.cancel(rng, strings))
        }
        Action::BattleResume { ticket } => drive_battle(state, |battle, rng, strings| {
            battle.resume(ticket, rng, strings)
        }),
        Action::DialogLetter { ticket } => drive_battle(state, |battle, rng, strings| {
            battle.dialog_letter(ticket, rng, strings)
        }),

        Action::Restart => restart(state),
        Action::Quit => DispatchResult::unchanged(),
    }
}

fn tick_animation(state: &mut AppState) -> DispatchResult<Effect> {
    state.tick = state.tick.wrapping_add(1);
    let Some(battle) = state.battle.as_mut() else {
        return DispatchResult::unchanged();
    };
    let animating = battle.player.animation.is_some() || battle.enemy.animation.is_some();
    battle.advance(TICK_INTERVAL);
    if animating {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

fn ladder_select(state: &mut AppState, index: usize) -> DispatchResult<Effect> {
    if state.mode != GameMode::Overworld
        || index >= state.trainers().len()
        || index == state.selected
    {
        return DispatchResult::unchanged();
    }
    state.selected = index;
    DispatchResult::changed_with(Effect::PlaySound("HandleButton"))
}

fn ladder_confirm(state: &mut AppState) -> DispatchResult<Effect> {
    if state.mode != GameMode::Overworld {
        return DispatchResult::unchanged();
    }
    let Some(trainer) = state.selected_trainer().cloned() else {
        tracing::warn!(selected = state.selected, "no trainer at ladder cursor");
        return DispatchResult::unchanged();
    };

    if state.is_defeated(&trainer) {
        state.message = Some(fill_dialog(
            &state.locales,
            &trainer.defeated_key,
            &trainer.name,
        ));
        return DispatchResult::changed();
    }

    tracing::info!(trainer = %trainer.id, "challenging trainer");
    state.message = Some(fill_dialog(&state.locales, &trainer.intro_key, &trainer.name));
    state.music_paused = true;
    let mut effects = vec![
        Effect::PauseMusic(true),
        Effect::PlaySound("ExclamationSound"),
        Effect::PlaySound("StartBattle"),
    ];

    let (battle, cues) = Battle::start(
        state.roster.player.clone(),
        trainer.fighter.clone(),
        state.pacing.clone(),
        state.next_ticket,
        &mut state.rng,
        &state.locales,
    );
    state.next_ticket = battle.next_ticket();
    state.battle = Some(battle);
    state.opponent = Some(state.selected);
    state.mode = GameMode::Battle;

    effects.extend(apply_cues(state, cues));
    DispatchResult::changed_with_many(effects)
}

/// Runs one battle entry point and turns its cues into effects.
fn drive_battle<F>(state: &mut AppState, f: F) -> DispatchResult<Effect>
where
    F: FnOnce(&mut Battle, &mut SeededRng, &Locales) -> Vec<Cue>,
{
    let AppState {
        battle,
        rng,
        locales,
        next_ticket,
        ..
    } = &mut *state;
    let Some(battle) = battle.as_mut() else {
        return DispatchResult::unchanged();
    };
    let before = battle.revision();
    let cues = f(&mut *battle, &mut *rng, &*locales);
    let changed = battle.revision() != before;
    *next_ticket = battle.next_ticket();

    if !changed && cues.is_empty() {
        return DispatchResult::unchanged();
    }
    DispatchResult::changed_with_many(apply_cues(state, cues))
}

fn apply_cues(state: &mut AppState, cues: Vec<Cue>) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(cues.len());
    for cue in cues {
        match cue {
            Cue::Wait { ticket, duration } => effects.push(Effect::Wait { ticket, duration }),
            Cue::TypeLetter { ticket, delay } => effects.push(Effect::TypeLetter { ticket, delay }),
            Cue::Sound(name) => effects.push(Effect::PlaySound(name)),
            Cue::BattleOver { player_won } => effects.extend(battle_over(state, player_won)),
        }
    }
    effects
}

fn battle_over(state: &mut AppState, player_won: bool) -> Vec<Effect> {
    if let Some(battle) = state.battle.take() {
        state.next_ticket = state.next_ticket.max(battle.next_ticket());
    }
    let opponent = state
        .opponent
        .take()
        .and_then(|index| state.roster.trainers.get(index).cloned());

    if !player_won {
        tracing::info!("run lost");
        state.mode = GameMode::GameOver;
        state.message = Some(state.line("GAME_OVER"));
        return Vec::new();
    }

    state.mode = GameMode::Overworld;
    state.music_paused = false;
    match opponent {
        Some(trainer) => {
            state.defeated.insert(trainer.id.clone());
            state.message = Some(if state.ladder_cleared() {
                state.line("LADDER_CLEARED")
            } else {
                fill_dialog(&state.locales, "BATTLE_WON", &trainer.name)
            });
        }
        None => tracing::warn!("battle won without an opponent on record"),
    }
    vec![Effect::PauseMusic(false)]
}

fn restart(state: &mut AppState) -> DispatchResult<Effect> {
    if state.mode != GameMode::GameOver {
        return DispatchResult::unchanged();
    }
    tracing::info!("run restarted");
    state.defeated.clear();
    state.selected = 0;
    state.battle = None;
    state.opponent = None;
    state.mode = GameMode::Overworld;
    state.message = Some(state.line("INIT_DIALOG"));
    state.music_paused = false;
    DispatchResult::changed_with(Effect::PauseMusic(false))
}
