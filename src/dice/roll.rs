//! Dice rolling
//!
//! The random source is always passed in, so callers decide between the
//! thread-local generator and a seeded one.

use rand::Rng;
use thiserror::Error;

use super::classify::{classify, SuccessTier};
use super::notation::RollSpec;

/// Errors while resolving a roll
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error("roll total out of range ({sum} + {modifier})")]
    TotalOverflow { sum: u64, modifier: i64 },
}

/// A resolved roll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Individual die results, in roll order
    pub rolls: Vec<u32>,
    /// Sum of the dice before the modifier
    pub sum: u64,
    /// Sum plus modifier
    pub total: i64,
    pub tier: SuccessTier,
}

/// Roll `count` dice with `sides` sides each
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R, count: u32, sides: u32) -> Vec<u32> {
    (0..count).map(|_| rng.random_range(1..=sides)).collect()
}

impl RollSpec {
    /// Roll the dice, add the modifier and classify the result
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RollOutcome, RollError> {
        let rolls = roll_dice(rng, self.count, self.sides);
        resolve(rolls, self.sides, self.modifier)
    }
}

/// Total and classify already-rolled dice
pub fn resolve(rolls: Vec<u32>, sides: u32, modifier: i64) -> Result<RollOutcome, RollError> {
    let sum: u64 = rolls.iter().map(|&r| r as u64).sum();
    let total = i64::try_from(sum)
        .ok()
        .and_then(|s| s.checked_add(modifier))
        .ok_or(RollError::TotalOverflow { sum, modifier })?;

    let tier = classify(total, &rolls, sides);

    Ok(RollOutcome {
        rolls,
        sum,
        total,
        tier,
    })
}
