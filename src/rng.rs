//! Randomness used by combat resolution.
//!
//! Every random draw the battle makes goes through [`CombatRng`], so combat
//! math and the confusion protocol can be driven by a fixed script in tests.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const MODIFIER_MIN: f32 = 0.85;
pub const MODIFIER_MAX: f32 = 1.0;

pub trait CombatRng {
    /// Uniform modifier in `[0.85, 1.0]` applied to damage, healing and
    /// defense changes.
    fn modifier(&mut self) -> f32;

    /// Uniform integer in `0..upper`. Returns 0 when `upper` is 0.
    fn below(&mut self, upper: usize) -> usize;
}

impl<R: CombatRng + ?Sized> CombatRng for &mut R {
    fn modifier(&mut self) -> f32 {
        (**self).modifier()
    }

    fn below(&mut self, upper: usize) -> usize {
        (**self).below(upper)
    }
}

/// Process-wide generator backed by ChaCha8.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeededRng {
    inner: ChaCha8Rng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl CombatRng for SeededRng {
    fn modifier(&mut self) -> f32 {
        self.inner.gen_range(MODIFIER_MIN..=MODIFIER_MAX)
    }

    fn below(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.inner.gen_range(0..upper)
    }
}

/// Replays a fixed sequence of draws.
///
/// Once a queue runs dry the generator falls back to a modifier of `1.0`
/// and a roll of `0`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRng {
    modifiers: VecDeque<f32>,
    rolls: VecDeque<usize>,
}

impl ScriptedRng {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = f32>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = usize>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    pub fn remaining_rolls(&self) -> usize {
        self.rolls.len()
    }
}

impl CombatRng for ScriptedRng {
    fn modifier(&mut self) -> f32 {
        self.modifiers
            .pop_front()
            .unwrap_or(MODIFIER_MAX)
            .clamp(MODIFIER_MIN, MODIFIER_MAX)
    }

    fn below(&mut self, upper: usize) -> usize {
        let roll = self.rolls.pop_front().unwrap_or(0);
        roll.min(upper.saturating_sub(1))
    }
}
