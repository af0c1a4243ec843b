//! Success tier classification
//!
//! Horror-ruleset judgement of a resolved roll. Rules are checked in order and
//! the first one that matches decides the tier:
//!
//! 1. a single die showing 1 is a critical failure
//! 2. a d20-or-larger roll totalling 20+ is a critical success
//! 3. every die showing its maximum is a critical success
//! 4. otherwise, success when at least half the dice beat the die's midpoint

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete outcome of a roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessTier {
    CriticalSuccess,
    Success,
    Failure,
    CriticalFailure,
}

impl SuccessTier {
    /// Wire name, as sent to the narrator
    pub fn as_str(&self) -> &'static str {
        match self {
            SuccessTier::CriticalSuccess => "critical_success",
            SuccessTier::Success => "success",
            SuccessTier::Failure => "failure",
            SuccessTier::CriticalFailure => "critical_failure",
        }
    }

    /// Label shown to players next to the total
    pub fn label(&self) -> &'static str {
        match self {
            SuccessTier::CriticalSuccess => "🌟 대성공!",
            SuccessTier::Success => "👁️ 성공",
            SuccessTier::Failure => "🌑 실패",
            SuccessTier::CriticalFailure => "💀 대실패...",
        }
    }
}

impl fmt::Display for SuccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a roll. `rolls` must be non-empty and `sides` at least 1.
pub fn classify(total: i64, rolls: &[u32], sides: u32) -> SuccessTier {
    if matches!(rolls, [1]) {
        return SuccessTier::CriticalFailure;
    }

    if sides >= 20 && total >= 20 {
        return SuccessTier::CriticalSuccess;
    }

    if !rolls.is_empty() && rolls.iter().all(|&r| r == sides) {
        return SuccessTier::CriticalSuccess;
    }

    let average = sides as f64 / 2.0;
    let above = rolls.iter().filter(|&&r| r as f64 > average).count();

    if above as f64 >= rolls.len() as f64 / 2.0 {
        SuccessTier::Success
    } else {
        SuccessTier::Failure
    }
}
