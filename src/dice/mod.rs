//! Dice module
//!
//! Implements the horror-ruleset dice core:
//! - Notation parsing with limit validation (e.g., "2d6+3")
//! - Rolling with an injected random source
//! - Success tier classification

mod classify;
mod notation;
mod roll;

pub use classify::{classify, SuccessTier};
pub use notation::{parse, NotationError, ParseOutcome, RollRejection, RollSpec, MAX_DICE, MAX_SIDES};
pub use roll::{resolve, roll_dice, RollError, RollOutcome};
