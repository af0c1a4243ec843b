//! Canned lines in Brown's voice
//!
//! Used whenever the completion service can't be reached, and for the limit
//! warnings that never go to the service at all.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::SuccessLevel;

const CRITICAL_SUCCESS: [&str; 3] = [
    "[대단합니다! 정말 대단해요! {username}님, {total}점의 완벽한 성공입니다!]",
    "[놀랍습니다, 놀라워요! {total}점! 이는 정말 이상적인 결과입니다!]",
    "[정답입니다! 만세! {username}님의 {total}점!]",
];

const SUCCESS: [&str; 3] = [
    "[좋습니다, 좋아요! {username}님, {total}점으로 성공하셨습니다!]",
    "[오, {username}님의 선택이 먹혀들었네요! {total}점!]",
    "[성공이군요! {total}점, 훌륭한 결과입니다.]",
];

const FAILURE: [&str; 3] = [
    "[아, 이런... {username}님, {total}점이군요. 아쉽습니다.]",
    "[아니, 아니… 이럴 수가! {total}점이었나요...]",
    "[이런! {username}님... {total}점... 다음 기회를 노려봅시다.]",
];

const CRITICAL_FAILURE: [&str; 3] = [
    "[오, 맙소사! {username}님, {total}점... 끔찍한 결과입니다!]",
    "[아아, 아… 갈등하는군요... {total}점...]",
    "[호. 이건... {total}점... 너무 자책하지 마세요.]",
];

const IMPOSSIBLE: [&str; 3] = [
    "[......이보세요. 존재하지 않는 면을 굴리려 하시다니. 그런 건 '저쪽' 세상에서나 가능한 일입니다.]",
    "[......운명을 시험하지 마시길 바랍니다. 자아... 당신의 장난을 지켜보는 눈이 있습니다.]",
    "[......비어있는 주사위 소리가 들리는군요. 공허를 굴리고 싶으신 게 아니라면, 다시 입력하는 게 좋을 겁니다.]",
];

const TOO_MANY_DICE: [&str; 3] = [
    "[이런, 욕심이 과하시군요. 주사위는 {limit}개까지만 허용됩니다. 그 이상은 스튜디오 바닥이 어지러워지거든요.]",
    "[잠시만요. 그렇게 많은 주사위를 한꺼번에 던지면 방송 사고가 납니다. 적당히 나눠서 굴리시죠? ({limit}개까지입니다.)]",
    "[호. 손은 두 개뿐인데 주사위를 그렇게 많이 쥐시려고요? {limit}개 이하로 줄여주세요.]",
];

const TOO_LARGE_SIDES: [&str; 3] = [
    "[호. {limit}면이 넘는 주사위라니? 그런 건 거의 구에 가깝죠. 굴러가다 영원히 멈추지 않을 겁니다.]",
    "[참가자분, 우리 스튜디오엔 그런 거대한 주사위가 없습니다. {limit}면 이하의 상식적인 주사위를 사용해주세요.]",
    "[저런. 숫자가 너무 크군요. 그 정도 확률은 신의 영역에 맡겨두는 게 좋겠습니다. ({limit}면까지입니다.)]",
];

/// Sample lines for the fortune prompt when no persona data is available
pub const EMERGENCY_SAMPLES: [&str; 3] = [
    "[오늘은 당신의 하루에 어떤 행운이 찾아올까요? 쇼에 함께 할 동반자? 황금의 비? 자, 당신의 운세를 점쳐봅시다!]",
    "[오, 대단한 결과가 나올 것 같군요!]",
    "[관객 여러분! 이 결과를 주목해주세요!]",
];

fn pick<R: Rng + ?Sized>(rng: &mut R, lines: &[&'static str]) -> &'static str {
    // All tables are non-empty constants
    lines.choose(rng).copied().unwrap_or_default()
}

/// A fallback narrative line for a roll
pub fn fallback<R: Rng + ?Sized>(
    rng: &mut R,
    level: SuccessLevel,
    username: &str,
    total: i64,
) -> String {
    let table: &[&str] = match level {
        SuccessLevel::CriticalSuccess => &CRITICAL_SUCCESS,
        SuccessLevel::Success => &SUCCESS,
        SuccessLevel::Failure => &FAILURE,
        SuccessLevel::CriticalFailure => &CRITICAL_FAILURE,
        SuccessLevel::Impossible => &IMPOSSIBLE,
    };

    fill(pick(rng, table), username, total)
}

/// Substitute `{total}` and `{username}` without rescanning inserted text
pub(super) fn fill(template: &str, username: &str, total: i64) -> String {
    template
        .replace("{total}", &total.to_string())
        .replace("{username}", username)
}

/// Warning for a roll with too many dice
pub fn too_many_dice<R: Rng + ?Sized>(rng: &mut R, limit: u32) -> String {
    pick(rng, &TOO_MANY_DICE).replace("{limit}", &limit.to_string())
}

/// Warning for dice with too many sides
pub fn too_large_sides<R: Rng + ?Sized>(rng: &mut R, limit: u32) -> String {
    pick(rng, &TOO_LARGE_SIDES).replace("{limit}", &limit.to_string())
}

/// Shown when a fortune couldn't be generated
pub fn fortune_unavailable(username: &str) -> String {
    format!("[치직... 통신 장애입니다! {} 님, 잠시 후 다시 시도해주세요!]", username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fallback_interpolates() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let line = fallback(&mut rng, SuccessLevel::Success, "노루", 14);
            assert!(line.contains("14"), "{}", line);
            assert!(!line.contains("{total}"));
            assert!(!line.contains("{username}"));
        }
    }

    #[test]
    fn test_fallback_tables_per_level() {
        let mut rng = StdRng::seed_from_u64(5);
        let line = fallback(&mut rng, SuccessLevel::Impossible, "노루", 0);
        assert!(IMPOSSIBLE.contains(&line.as_str()));

        let line = fallback(&mut rng, SuccessLevel::CriticalFailure, "노루", 1);
        let expected: Vec<String> = CRITICAL_FAILURE
            .iter()
            .map(|t| t.replace("{username}", "노루").replace("{total}", "1"))
            .collect();
        assert!(expected.contains(&line));
    }

    #[test]
    fn test_fill_keeps_braces_in_username() {
        assert_eq!(
            fill("[{username}님, {total}점!]", "{total}맨", 7),
            "[{total}맨님, 7점!]"
        );
    }

    #[test]
    fn test_limit_quotes_mention_limit() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            assert!(too_many_dice(&mut rng, 100).contains("100"));
            assert!(too_large_sides(&mut rng, 1000).contains("1000"));
        }
    }

    #[test]
    fn test_fortune_unavailable() {
        assert!(fortune_unavailable("오소리").contains("오소리 님"));
    }
}
