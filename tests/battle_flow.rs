//! End-to-end battle scripts driven with scripted randomness.
//!
//! Every fighter here is level 10 with all base stats at 50, so attack and
//! max defense are 10, max HP is 15 and the level factor is 0.12:
//! a 40-power hit deals 6, the confusion self-hit deals 2, and a 30-power
//! heal or defense move moves its stat by 3.

use std::collections::VecDeque;

use pocketbattle::battle::{Battle, BattlePhase, Cue, Direction};
use pocketbattle::config::Pacing;
use pocketbattle::fighter::{BaseStats, FighterTemplate, LearnableMove, MoveCategory, MoveTemplate};
use pocketbattle::locale::{Language, Locales};
use pocketbattle::rng::ScriptedRng;
use pretty_assertions::assert_eq;

const STEP_LIMIT: usize = 10_000;

fn move_entry(name: &str, category: MoveCategory, power: i32, max_pp: i32) -> LearnableMove {
    LearnableMove {
        template: MoveTemplate {
            name: name.to_string(),
            category,
            power,
            accuracy: 100,
            max_pp,
            description: String::new(),
        },
        level: 1,
    }
}

fn tackle() -> LearnableMove {
    move_entry("tackle", MoveCategory::Normal, 40, 10)
}

fn psybeam() -> LearnableMove {
    move_entry("psybeam", MoveCategory::Psychic, 40, 10)
}

fn harden() -> LearnableMove {
    move_entry("harden", MoveCategory::Defense, 30, 10)
}

fn leer() -> LearnableMove {
    move_entry("leer", MoveCategory::Defense, -20, 10)
}

fn rest() -> LearnableMove {
    move_entry("rest", MoveCategory::Health, 30, 10)
}

fn fighter(name: &str, moves: Vec<LearnableMove>) -> FighterTemplate {
    FighterTemplate {
        name: name.to_string(),
        description: String::new(),
        sprite: name.to_string(),
        stats: BaseStats {
            max_hp: 50,
            attack: 50,
            defense: 50,
            speed: 50,
            sp_attack: 50,
            sp_defense: 50,
        },
        level: 10,
        moves,
    }
}

fn strings() -> Locales {
    Locales::embedded(Language::En).expect("embedded locales")
}

/// Feeds every timer cue straight back into the battle and returns the
/// cues that are not timers.
fn drive(battle: &mut Battle, rng: &mut ScriptedRng, strings: &Locales, cues: Vec<Cue>) -> Vec<Cue> {
    let mut pending: VecDeque<Cue> = cues.into();
    let mut seen = Vec::new();
    let mut steps = 0;
    while let Some(cue) = pending.pop_front() {
        steps += 1;
        assert!(steps < STEP_LIMIT, "battle never settled");
        match cue {
            Cue::Wait { ticket, .. } => pending.extend(battle.resume(ticket, rng, strings)),
            Cue::TypeLetter { ticket, .. } => {
                pending.extend(battle.dialog_letter(ticket, rng, strings))
            }
            other => seen.push(other),
        }
    }
    seen
}

fn begin(
    player: FighterTemplate,
    enemy: FighterTemplate,
    rng: &mut ScriptedRng,
    strings: &Locales,
) -> Battle {
    let (mut battle, cues) = Battle::start(player, enemy, Pacing::default(), 1, rng, strings);
    drive(&mut battle, rng, strings, cues);
    assert_eq!(battle.phase, BattlePhase::PlayerAction);
    battle
}

/// Picks FIGHT, moves the cursor to `slot` and confirms it.
fn use_move(battle: &mut Battle, slot: usize, rng: &mut ScriptedRng, strings: &Locales) -> Vec<Cue> {
    assert_eq!(battle.phase, BattlePhase::PlayerAction);
    let cues = battle.confirm(rng, strings);
    let mut seen = drive(battle, rng, strings, cues);
    assert_eq!(battle.phase, BattlePhase::PlayerMove);
    while battle.current_move < slot {
        battle.navigate(Direction::Right);
    }
    while battle.current_move > slot {
        battle.navigate(Direction::Left);
    }
    let cues = battle.confirm(rng, strings);
    seen.extend(drive(battle, rng, strings, cues));
    seen
}

fn logged(battle: &Battle, line: &str) -> bool {
    battle.log.iter().any(|entry| entry == line)
}

#[test]
fn confusion_can_make_the_attacker_hit_itself() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![harden()]),
        &mut rng,
        &strings,
    );
    battle.player.fighter.confuse();

    // Hurt roll 7, then the enemy's move pick.
    let mut rng = ScriptedRng::new().with_rolls([7, 0]);
    use_move(&mut battle, 0, &mut rng, &strings);

    assert_eq!(battle.player.fighter.hp, 13);
    assert_eq!(battle.enemy.fighter.hp, 15);
    assert_eq!(battle.player.fighter.moves[0].pp, 9);
    assert!(battle.player.fighter.is_confused());
    assert_eq!(battle.enemy.fighter.defense, 13);
    assert!(logged(&battle, "Hero is confused!"));
    assert!(logged(&battle, "Hero hurt itself in its confusion!"));
    assert!(logged(&battle, "Hero used Tackle!"));
    assert_eq!(battle.phase, BattlePhase::PlayerAction);
    assert_eq!(rng.remaining_rolls(), 0);
}

#[test]
fn confusion_can_wear_off_before_the_move() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![harden()]),
        &mut rng,
        &strings,
    );
    battle.player.fighter.confuse();

    // Hurt roll misses, release roll hits, then the enemy's pick.
    let mut rng = ScriptedRng::new().with_rolls([2, 8, 0]);
    use_move(&mut battle, 0, &mut rng, &strings);

    assert!(!battle.player.fighter.is_confused());
    assert_eq!(battle.enemy.fighter.hp, 9);
    assert_eq!(battle.player.fighter.hp, 15);
    assert!(logged(&battle, "Hero snapped out of its confusion!"));
}

#[test]
fn confusion_that_neither_hurts_nor_clears_lets_the_move_through() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![harden()]),
        &mut rng,
        &strings,
    );
    battle.player.fighter.confuse();

    let mut rng = ScriptedRng::new().with_rolls([2, 1, 0]);
    use_move(&mut battle, 0, &mut rng, &strings);

    assert!(battle.player.fighter.is_confused());
    assert_eq!(battle.enemy.fighter.hp, 9);
    assert!(!logged(&battle, "Hero snapped out of its confusion!"));
}

/// One FIGHT turn for a confused hero whose foe only hardens.
fn confused_turn(rolls: &[usize]) -> Battle {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![harden()]),
        &mut rng,
        &strings,
    );
    battle.player.fighter.confuse();

    let mut rng = ScriptedRng::new().with_rolls(rolls.iter().copied());
    use_move(&mut battle, 0, &mut rng, &strings);
    assert_eq!(rng.remaining_rolls(), 0);
    battle
}

#[test]
fn hurt_roll_of_five_is_the_lowest_self_hit() {
    let battle = confused_turn(&[5, 0]);
    assert_eq!(battle.player.fighter.hp, 13);
    assert_eq!(battle.enemy.fighter.hp, 15);
    assert!(logged(&battle, "Hero hurt itself in its confusion!"));

    let battle = confused_turn(&[4, 4, 0]);
    assert_eq!(battle.player.fighter.hp, 15);
    assert_eq!(battle.enemy.fighter.hp, 9);
    assert!(!logged(&battle, "Hero hurt itself in its confusion!"));
}

#[test]
fn release_roll_of_five_is_the_lowest_recovery() {
    let battle = confused_turn(&[4, 5, 0]);
    assert!(!battle.player.fighter.is_confused());
    assert!(logged(&battle, "Hero snapped out of its confusion!"));
    assert_eq!(battle.enemy.fighter.hp, 9);

    let battle = confused_turn(&[4, 4, 0]);
    assert!(battle.player.fighter.is_confused());
    assert!(!logged(&battle, "Hero snapped out of its confusion!"));
    assert_eq!(battle.enemy.fighter.hp, 9);
}

#[test]
fn enemy_keeps_attacking_after_its_pp_runs_out() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![harden()]),
        fighter("foe", vec![move_entry("tackle", MoveCategory::Normal, 40, 1)]),
        &mut rng,
        &strings,
    );

    use_move(&mut battle, 0, &mut rng, &strings);
    assert_eq!(battle.enemy.fighter.moves[0].pp, 0);
    assert_eq!(battle.player.fighter.hp, 9);

    use_move(&mut battle, 0, &mut rng, &strings);
    assert_eq!(battle.enemy.fighter.moves[0].pp, -1);
    assert_eq!(battle.player.fighter.hp, 3);
    let foe_turns = battle
        .log
        .iter()
        .filter(|line| line.as_str() == "Foe used Tackle!")
        .count();
    assert_eq!(foe_turns, 2);
    assert_eq!(battle.phase, BattlePhase::PlayerAction);
}

#[test]
fn psychic_hit_confuses_the_target() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![psybeam()]),
        fighter("foe", vec![tackle()]),
        &mut rng,
        &strings,
    );

    // Enemy pick, then its hurt roll.
    let mut rng = ScriptedRng::new().with_rolls([0, 9]);
    use_move(&mut battle, 0, &mut rng, &strings);

    assert!(battle.enemy.fighter.is_confused());
    assert_eq!(battle.enemy.fighter.hp, 15 - 6 - 2);
    assert_eq!(battle.player.fighter.hp, 15);
    assert_eq!(battle.enemy.fighter.moves[0].pp, 9);
    assert!(logged(&battle, "Foe is confused!"));
    assert!(logged(&battle, "Foe hurt itself in its confusion!"));
}

#[test]
fn psychic_hit_on_a_confused_target_only_damages() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![psybeam()]),
        fighter("foe", vec![harden()]),
        &mut rng,
        &strings,
    );
    battle.enemy.fighter.confuse();

    // Enemy pick, hurt roll misses, release roll misses.
    let mut rng = ScriptedRng::new().with_rolls([0, 0, 0]);
    use_move(&mut battle, 0, &mut rng, &strings);

    let confused_lines = battle
        .log
        .iter()
        .filter(|line| line.as_str() == "Foe is confused!")
        .count();
    // Once at the start of the enemy's own turn, never from the hit.
    assert_eq!(confused_lines, 1);
    assert_eq!(battle.enemy.fighter.hp, 9);
}

#[test]
fn defense_moves_boost_self_or_lower_the_opponent() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![harden(), leer()]),
        fighter("foe", vec![rest()]),
        &mut rng,
        &strings,
    );

    let seen = use_move(&mut battle, 0, &mut rng, &strings);
    assert_eq!(battle.player.fighter.defense, 13);
    assert!(seen.contains(&Cue::Sound("BoingSFX")));
    assert!(seen.contains(&Cue::Sound("BoostDefenseSFX")));
    assert!(logged(&battle, "Hero's defense rose!"));

    // A non-positive power subtracts a non-positive amount.
    let seen = use_move(&mut battle, 1, &mut rng, &strings);
    assert_eq!(battle.enemy.fighter.defense, 13);
    assert!(seen.contains(&Cue::Sound("Hit2SFX")));
    assert!(logged(&battle, "Foe's defense fell!"));
}

#[test]
fn damage_ignores_raised_defense() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![harden()]),
        &mut rng,
        &strings,
    );

    use_move(&mut battle, 0, &mut rng, &strings);
    assert_eq!(battle.enemy.fighter.defense, 13);
    use_move(&mut battle, 0, &mut rng, &strings);
    assert_eq!(battle.enemy.fighter.hp, 15 - 6 - 6);
}

#[test]
fn healing_only_touches_the_user() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![rest()]),
        &mut rng,
        &strings,
    );

    use_move(&mut battle, 0, &mut rng, &strings);

    assert_eq!(battle.enemy.fighter.hp, 9 + 3);
    assert_eq!(battle.player.fighter.hp, 15);
    assert_eq!(battle.enemy.hud.hp, 12);
    assert!(logged(&battle, "Foe recovered health!"));
}

#[test]
fn running_out_of_pp_forfeits() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![move_entry("tackle", MoveCategory::Normal, 40, 1)]),
        fighter("foe", vec![rest()]),
        &mut rng,
        &strings,
    );

    let seen = use_move(&mut battle, 0, &mut rng, &strings);

    assert_eq!(battle.outcome(), Some(false));
    assert_eq!(battle.phase, BattlePhase::End);
    assert_eq!(
        seen.iter()
            .filter(|cue| matches!(cue, Cue::BattleOver { .. }))
            .collect::<Vec<_>>(),
        vec![&Cue::BattleOver { player_won: false }]
    );
    assert!(seen.contains(&Cue::Sound("GameOverSFX")));
    assert!(logged(&battle, "Hero has no moves left!"));
    assert_eq!(battle.log.last().map(String::as_str), Some("Hero fainted!"));
}

#[test]
fn one_exhausted_move_is_disabled_but_not_fatal() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter(
            "hero",
            vec![move_entry("tackle", MoveCategory::Normal, 40, 1), harden()],
        ),
        fighter("foe", vec![rest()]),
        &mut rng,
        &strings,
    );

    use_move(&mut battle, 0, &mut rng, &strings);
    assert_eq!(battle.phase, BattlePhase::PlayerAction);
    assert!(battle.dialog.is_disabled(0));

    battle.confirm(&mut rng, &strings);
    assert_eq!(battle.phase, BattlePhase::PlayerMove);
    assert_eq!(battle.current_move, 0);
    assert!(battle.confirm(&mut rng, &strings).is_empty());
    assert_eq!(battle.phase, BattlePhase::PlayerMove);

    battle.navigate(Direction::Right);
    let cues = battle.confirm(&mut rng, &strings);
    drive(&mut battle, &mut rng, &strings, cues);
    assert_eq!(battle.player.fighter.defense, 13);
    assert_eq!(battle.phase, BattlePhase::PlayerAction);
}

#[test]
fn running_is_refused_without_leaving_the_menu() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![rest()]),
        &mut rng,
        &strings,
    );

    battle.navigate(Direction::Down);
    let cues = battle.confirm(&mut rng, &strings);
    assert_eq!(cues.first(), Some(&Cue::Sound("AcceptButton")));
    assert_eq!(battle.phase, BattlePhase::PlayerAction);

    drive(&mut battle, &mut rng, &strings, cues);
    assert_eq!(battle.phase, BattlePhase::PlayerAction);
    assert_eq!(
        battle.dialog.visible_text(),
        "There is no running from a trainer battle!"
    );
    assert_eq!(battle.pending_beats(), 0);
}

#[test]
fn cancel_returns_to_a_fresh_action_prompt() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle(), harden()]),
        fighter("foe", vec![rest()]),
        &mut rng,
        &strings,
    );

    battle.confirm(&mut rng, &strings);
    assert_eq!(battle.phase, BattlePhase::PlayerMove);
    assert!(battle.dialog.move_selector_visible);

    let cues = battle.cancel(&mut rng, &strings);
    assert_eq!(battle.phase, BattlePhase::Busy);
    drive(&mut battle, &mut rng, &strings, cues);

    assert_eq!(battle.phase, BattlePhase::PlayerAction);
    assert!(!battle.dialog.move_selector_visible);
    assert!(battle.dialog.action_selector_visible);
    assert_eq!(battle.dialog.selected_action, 0);
    assert_eq!(battle.log.last().map(String::as_str), Some("What will Hero do?"));
}

#[test]
fn knocking_out_the_enemy_wins_once() {
    let strings = strings();
    let mut rng = ScriptedRng::new();
    let mut battle = begin(
        fighter("hero", vec![tackle()]),
        fighter("foe", vec![harden()]),
        &mut rng,
        &strings,
    );

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.extend(use_move(&mut battle, 0, &mut rng, &strings));
    }

    assert_eq!(battle.outcome(), Some(true));
    assert_eq!(battle.phase, BattlePhase::End);
    assert!(battle.enemy.fighter.is_fainted());
    assert_eq!(battle.player.fighter.moves[0].pp, 7);
    let overs: Vec<&Cue> = seen
        .iter()
        .filter(|cue| matches!(cue, Cue::BattleOver { .. }))
        .collect();
    assert_eq!(overs, vec![&Cue::BattleOver { player_won: true }]);
    assert_eq!(battle.log.last().map(String::as_str), Some("Foe fainted!"));

    // Nothing reacts once the battle is over.
    assert!(battle.confirm(&mut rng, &strings).is_empty());
    assert!(battle.navigate(Direction::Up).is_empty());
}
