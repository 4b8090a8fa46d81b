//! Target-sequence generation.
//!
//! The detected player count fixes how many steps a round has and how many
//! buttons each step demands; the patterns themselves are uniform random
//! samples without replacement from the eight channels. Steps are drawn
//! independently, so the same pattern may recur across steps.

use crate::{ButtonSet, CHANNEL_COUNT};
use rand::Rng;
use std::fmt;

/// Step count and step size derived from the player count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    /// Number of steps in the round
    pub step_count: usize,
    /// Buttons per step
    pub step_size: usize,
}

impl StepPlan {
    /// More than five players get the fixed hard plan of 3×5; otherwise the
    /// round has `8 - player_count` steps of `player_count` buttons each.
    pub fn for_players(player_count: usize) -> Self {
        let player_count = player_count.max(1);
        if player_count > 5 {
            StepPlan {
                step_count: 3,
                step_size: 5,
            }
        } else {
            StepPlan {
                step_count: CHANNEL_COUNT as usize - player_count,
                step_size: player_count,
            }
        }
    }
}

/// The ordered target patterns of one round, immutable once generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    steps: Vec<ButtonSet>,
}

impl Sequence {
    /// Build a sequence from explicit steps, for fixed choreographies
    pub fn from_steps(steps: Vec<ButtonSet>) -> Self {
        Sequence { steps }
    }

    /// The target pattern of each step, in play order
    pub fn steps(&self) -> &[ButtonSet] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (n, step) in self.steps.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", step)?;
        }
        write!(f, "]")
    }
}

/// Generate a fresh sequence for `player_count` players. Deterministic for a
/// seeded `rng`; production seeds from entropy.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, player_count: usize) -> Sequence {
    let plan = StepPlan::for_players(player_count);
    let steps = (0..plan.step_count)
        .map(|_| {
            let picks = rand::seq::index::sample(rng, CHANNEL_COUNT as usize, plan.step_size);
            ButtonSet::from_indices(picks.iter().map(|i| i as u8))
        })
        .collect();
    Sequence { steps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn plan_rule_for_all_player_counts() {
        for player_count in 1..=8usize {
            let plan = StepPlan::for_players(player_count);
            if player_count > 5 {
                assert_eq!(plan, StepPlan { step_count: 3, step_size: 5 });
            } else {
                assert_eq!(
                    plan,
                    StepPlan {
                        step_count: 8 - player_count,
                        step_size: player_count,
                    }
                );
            }
        }
    }

    #[test]
    fn zero_players_treated_as_one() {
        assert_eq!(StepPlan::for_players(0), StepPlan::for_players(1));
    }

    #[test]
    fn steps_have_exactly_step_size_distinct_indices() {
        let mut rng = StdRng::seed_from_u64(7);
        for player_count in 1..=8usize {
            let plan = StepPlan::for_players(player_count);
            let sequence = generate(&mut rng, player_count);
            assert_eq!(sequence.len(), plan.step_count);
            for step in sequence.steps() {
                // A ButtonSet cannot hold duplicates, so cardinality alone
                // proves distinctness.
                assert_eq!(step.len(), plan.step_size);
                assert!(step.indices().all(|i| i < CHANNEL_COUNT));
            }
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate(&mut StdRng::seed_from_u64(42), 3);
        let b = generate(&mut StdRng::seed_from_u64(42), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn three_players_get_five_steps_of_three() {
        let sequence = generate(&mut StdRng::seed_from_u64(1), 3);
        assert_eq!(sequence.len(), 5);
        assert!(sequence.steps().iter().all(|s| s.len() == 3));
    }
}
