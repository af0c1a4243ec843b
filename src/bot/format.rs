//! Reply text formatting

use crate::dice::{RollOutcome, RollSpec};

/// Calculation line body: "sum + m = **total**", or just the total
pub fn calculation(outcome: &RollOutcome, modifier: i64) -> String {
    if modifier > 0 {
        format!("{} + {} = **{}**", outcome.sum, modifier, outcome.total)
    } else if modifier < 0 {
        format!("{} - {} = **{}**", outcome.sum, modifier.unsigned_abs(), outcome.total)
    } else {
        format!("**{}**", outcome.total)
    }
}

/// Full roll reply: narration headline plus a quoted result summary
pub fn roll_reply(display_name: &str, spec: &RollSpec, outcome: &RollOutcome, line: &str) -> String {
    let rolls = outcome
        .rolls
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!(
        "## 🎙️ {}\n> **{}**님의 굴림: `{}`\n",
        line, display_name, spec.notation
    );
    if spec.modifier != 0 {
        text.push_str(&format!("> 📊 합계: {}\n", calculation(outcome, spec.modifier)));
    }
    text.push_str(&format!(
        "> ⚡ 결과: `[{}]` → **{}** ({})",
        rolls,
        outcome.total,
        outcome.tier.label()
    ));

    text
}

/// Reply to an impossible roll
pub fn impossible_reply(line: &str) -> String {
    format!("👻 {}", line)
}

/// Reply when processing a token failed unexpectedly
pub fn malfunction_reply(error: &dyn std::fmt::Display) -> String {
    format!("❌ [시스템 오류] 방송 장비에 문제가 생겼군요: {}", error)
}
