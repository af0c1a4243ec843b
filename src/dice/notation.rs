//! Dice notation parsing
//!
//! Parses tokens like "2d6", "1d20+5", "[3d8-2]" into a validated
//! [`RollSpec`], a [`RollRejection`] or [`ParseOutcome::NotRecognized`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Maximum number of dice in a single roll
pub const MAX_DICE: u32 = 100;

/// Maximum number of sides per die
pub const MAX_SIDES: u32 = 1000;

static NOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)d([0-9]+)([+-][0-9]+)?$").expect("valid regex"));

/// A validated dice roll specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollSpec {
    /// Number of dice to roll (1..=100)
    pub count: u32,
    /// Number of sides per die (1..=1000)
    pub sides: u32,
    /// Modifier to add/subtract
    pub modifier: i64,
    /// The token exactly as it was handed to the parser
    pub notation: String,
}

impl RollSpec {
    /// Get the minimum possible result
    pub fn min(&self) -> i64 {
        self.count as i64 + self.modifier
    }

    /// Get the maximum possible result
    pub fn max(&self) -> i64 {
        self.count as i64 * self.sides as i64 + self.modifier
    }
}

impl fmt::Display for RollSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier > 0 {
            write!(f, "{}d{}+{}", self.count, self.sides, self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}d{}{}", self.count, self.sides, self.modifier)
        } else {
            write!(f, "{}d{}", self.count, self.sides)
        }
    }
}

/// Why a well-formed notation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollRejection {
    /// Zero dice or zero-sided dice
    Impossible,
    /// More dice than allowed
    TooManyDice { limit: u32 },
    /// Dice with more sides than allowed
    TooLargeSides { limit: u32 },
}

impl RollRejection {
    /// Wire name of the rejection reason
    pub fn reason(&self) -> &'static str {
        match self {
            RollRejection::Impossible => "impossible",
            RollRejection::TooManyDice { .. } => "too_many_dice",
            RollRejection::TooLargeSides { .. } => "too_large_sides",
        }
    }

    /// The limit that was exceeded, if any
    pub fn limit(&self) -> Option<u32> {
        match self {
            RollRejection::Impossible => None,
            RollRejection::TooManyDice { limit } | RollRejection::TooLargeSides { limit } => {
                Some(*limit)
            }
        }
    }
}

/// Result of parsing a single token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Roll(RollSpec),
    Rejected(RollRejection),
    /// Not dice notation at all; callers stay silent
    NotRecognized,
}

/// Errors from strict parsing via [`FromStr`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("not dice notation: {0}")]
    NotRecognized(String),

    #[error("rejected dice notation ({})", .0.reason())]
    Rejected(RollRejection),
}

/// Parse a dice token, with or without surrounding brackets
pub fn parse(token: &str) -> ParseOutcome {
    let notation = token.trim_start_matches('[').trim_end_matches(']');

    let Some(caps) = NOTATION_RE.captures(notation) else {
        return ParseOutcome::NotRecognized;
    };

    // Digit runs too long for u32 are over any limit anyway
    let count = caps[1].parse::<u32>().unwrap_or(u32::MAX);
    let sides = caps[2].parse::<u32>().unwrap_or(u32::MAX);
    let modifier = match caps.get(3) {
        Some(m) => match m.as_str().parse::<i64>() {
            Ok(v) => v,
            Err(_) => return ParseOutcome::NotRecognized,
        },
        None => 0,
    };

    if count == 0 || sides == 0 {
        return ParseOutcome::Rejected(RollRejection::Impossible);
    }
    if count > MAX_DICE {
        return ParseOutcome::Rejected(RollRejection::TooManyDice { limit: MAX_DICE });
    }
    if sides > MAX_SIDES {
        return ParseOutcome::Rejected(RollRejection::TooLargeSides { limit: MAX_SIDES });
    }

    ParseOutcome::Roll(RollSpec {
        count,
        sides,
        modifier,
        notation: token.to_string(),
    })
}

impl FromStr for RollSpec {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse(s) {
            ParseOutcome::Roll(spec) => Ok(spec),
            ParseOutcome::Rejected(rejection) => Err(NotationError::Rejected(rejection)),
            ParseOutcome::NotRecognized => Err(NotationError::NotRecognized(s.to_string())),
        }
    }
}
