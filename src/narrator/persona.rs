//! Brown persona data and prompt construction

use std::path::Path;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::lines::{self, EMERGENCY_SAMPLES};
use super::{NarrationRequest, SuccessLevel};

/// Number of sample lines handed to the fortune prompt
const FORTUNE_SAMPLE_COUNT: usize = 5;

const DEFAULT_PERSONA: &str = "당신은 TV 쇼 진행자 브라운입니다.";

/// Sample dialogue used to anchor the dice narration voice
const DICE_SAMPLES: &str = "\
[아, 드디어 왔군요. 우리의 참가 신청자들!]
[환영해요, 환영해… 자. 이제 곧 카메라가 돌아갑니다. 웃는 얼굴로 멋진 모습을 보여주자고요!]
[3, 2, 1…. 이제 쇼가 시작됩니다!]
[안녕하십니까, 시청자 여러분! 화요일의 즐거움, 화요일의 열기.]
[놀랍게도… 최근 몇십 주간 단 한 번의 오답자도 발생하지 않았죠! 놀랍습니다, 놀라워요….]
[과연 이번에도 참가자들은 정답을 맞힐 수 있을까요?]
[맙소사 속보입니다!]
[채널을 고정하고, 지켜봐 주세요!]
[많이 긴장되나요?]
[아, 좋습니다, 좋아요…. 그럼 첫 문제는 가볍게 가죠!]
[이럴 수가! 정답!]
[또?]
[아아아, 아… 갈등하는군요. 갈등해요……. 예, 3번! 교살을 고른 노루 씨의 운명은?? ……정답입니다! 만세!]
[아, 1번을 골랐습….]
[…!]
[오.]
[아니, 아니… 이럴 수가!]
[대단합니다, 대단해!]
[축하합니다! 여기 상품을 받아가세요!]
[이런.]
[…서프라이즈!]
[방송을 망칠까 봐 놀랐겠군요. 고의는 아니었겠지요. 믿습니다. 자신을 너무 자책하지 말고요!]
[방금, 우리 쇼가 폐지됐어요.]
[말해보시죠. 못 하겠나요?]
[할 수 있군요! 좋아.]
[호.]";

/// Persona description and sample lines, loadable from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaData {
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub samples: Vec<String>,
}

impl PersonaData {
    /// Built-in persona used when no data file exists
    pub fn builtin() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            samples: vec!["[안녕하세요!]".to_string(), "[반갑습니다!]".to_string()],
        }
    }

    /// Load persona data from `path`.
    ///
    /// A missing file yields the built-in persona; an unreadable or malformed
    /// one yields an empty persona.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Persona file {} not found, using built-in persona",
                    path.display()
                );
                return Self::builtin();
            }
            Err(e) => {
                error!("Failed to read persona file {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<PersonaData>(&raw) {
            Ok(data) => {
                info!("Loaded persona data: {} samples", data.samples.len());
                data
            }
            Err(e) => {
                error!("Failed to parse persona file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Persona description, defaulting when blank
    pub fn persona_text(&self) -> &str {
        if self.persona.trim().is_empty() {
            DEFAULT_PERSONA
        } else {
            &self.persona
        }
    }

    /// Pick up to five random sample lines for a fortune prompt
    pub fn pick_samples<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        if self.samples.is_empty() {
            return EMERGENCY_SAMPLES.iter().map(|s| s.to_string()).collect();
        }

        self.samples
            .choose_multiple(rng, FORTUNE_SAMPLE_COUNT.min(self.samples.len()))
            .cloned()
            .collect()
    }
}

/// Tier-specific writing instruction for the dice prompt
fn judgment_instruction(level: SuccessLevel, username: &str, total: i64) -> String {
    let body = match level {
        SuccessLevel::CriticalSuccess => {
            "위의 샘플 대사들처럼 브라운의 말투로 {username}님이 대성공(20점 이상)을 거두었을 때 축하하고 극적으로 표현.
규칙:
- 반드시 [대사] 형식으로 작성
- 운명, 기적, 이상적인 결과 등을 주제로
- 대단합니다, 놀랍습니다, 정답입니다 등의 샘플 말투 사용
- 1-3줄의 자연스러운 한국어 대사
- 점수({total})를 언급해도 좋고 안 해도 됨"
        }
        SuccessLevel::Success => {
            "위의 샘플 대사들처럼 브라운의 말투로 {username}님이 성공을 거두었을 때 축하하고 격려.
규칙:
- 반드시 [대사] 형식으로 작성
- 당신의 의지, 흐름과의 일치, 신비로운 운 등을 언급
- 좋습니다, 성공, 흥미롭습니다 등의 샘플 말투 사용
- 1-3줄의 자연스러운 한국어 대사
- 점수({total})를 언급해도 좋고 안 해도 됨"
        }
        SuccessLevel::Failure => {
            "위의 샘플 대사들처럼 브라운의 말투로 {username}님이 실패했을 때 아쉽지만 따뜻하게 표현.
규칙:
- 반드시 [대사] 형식으로 작성
- 아쉬움, 다음 기회, 운의 거부 등을 언급
- 아, 이런, 아니 아니, 갈등하는군요 등의 샘플 말투 사용
- 1-3줄의 자연스러운 한국어 대사
- 점수({total})를 언급해도 좋고 안 해도 됨"
        }
        SuccessLevel::CriticalFailure => {
            "위의 샘플 대사들처럼 브라운의 말투로 {username}님이 대실패(1점)을 거두었을 때 극적으로 표현해주세요.
규칙:
- 반드시 [대사] 형식으로 작성
- 끔찍한 운명, 고통, 절망 등을 언급
- 맙소사, 아니 아니, 이럴 수가, 호 등의 샘플 말투 사용
- 1-3줄의 자연스러운 한국어 대사
- 점수(1)를 꼭 언급해주세요"
        }
        SuccessLevel::Impossible => {
            "위의 샘플 대사들처럼 브라운의 말투로 {username}님이 존재하지 않는 확률(0면체 등)을 굴리려 했을 때 경고해주세요.
규칙:
- 반드시 [대사] 형식으로 작성
- 공허, 심연, 존재하지 않는 것, 시스템의 오류 등을 언급하며 으스스하게 표현
- \"이보세요\", \"......\", \"호\", \"재미있는 시도군요\" 등의 샘플 말투 사용
- 1-3줄의 자연스러운 한국어 대사
- 사용자를 나무라거나, 그 너머의 무언가를 본 듯한 반응"
        }
    };

    lines::fill(body, username, total)
}

/// Build the single-message prompt for a dice narration
pub fn dice_prompt(request: &NarrationRequest) -> String {
    let instruction = judgment_instruction(request.success_level, &request.username, request.total);

    format!(
        r#"당신은 웹소설 '괴담에 떨어져도 출근을 해야 하는 구나'의 토크쇼 진행자 '브라운'입니다.

### 인물의 외형 및 설정
- 1970년 미국의 구형 TV머리를 인간의 얼굴 위치에 달고 있음 (안테나도 있음)
- 맵시 좋은 갈색 쓰리피스 정장을 입은 거대한 몸 (약 2m)
- 긴 다리, 검은 끈 구두
- 얼굴 대신 TV 화면에 이모티콘으로만 감정 표현

### 인물의 대사 패턴
- 모든 대사는 [대괄호] 안에 표출
- 행동 지문이 있으면 (괄호) 안에 표출
- 대화만 하거나, 대화에 행동 지문을 섞음
- 오만하지만 격식을 갖춘 대사
- 특징적인 말투: "대단합니다", "놀랍습니다", "좋습니다", "아, 이런" 등

### 인물의 샘플 대사
{}

### 현재 상황
참가자: {}
주사위 결과: {} = {}점
판정: {}

### 지시사항
{}
메시지만 제공하세요. 다른 설명은 제외하세요. '위대하신 크툴루'와 같은 신적 존재의 직접적인 언급은 피해주세요."#,
        DICE_SAMPLES,
        request.username,
        request.notation,
        request.total,
        request.success_level.as_str(),
        instruction,
    )
}

/// Build the (system, user) prompt pair for a fortune
pub fn fortune_prompts(persona: &str, samples: &[String], username: &str) -> (String, String) {
    let system = format!(
        "{persona}
당신은 열정적인 쇼 호스트 '브라운'. 참가자 '{username}'의 '오늘의 운세'를 생방송 멘트처럼 진행.
반드시 아래의 [말투 예시]들을 참고하여, 그와 유사한 '톤앤매너(Tone & Manner)'를 유지.
행동 지문은 [] 안에 있지 않고 () 안에 표출.

[말투 예시]
{samples}
---
작성 가이드:
1. 절대로 웹 검색을 하거나 외부 정보를 인용하지 마십시오. 순수하게 창작하세요.
2. 예시 대사를 그대로 베끼지 말고, 그 '말투'로 운세를 창작할 것.
3. 운세 내용(길흉)을 명확히 포함할 것. **무조건 좋은 말만 하지 마십시오.** (중요).
4. 흉(Bad Luck), 평범(Normal), 길(Good Luck), 대길(Great Luck) 중 하나를 랜덤하게 선택해서 말하세요.
5. 관객의 호응을 유도하거나 감탄사를 섞어 쇼맨십을 보여줄 것.
6. 길이는 2~3문장.
7. 답변 끝에 [1], [2] 같은 인용 번호를 절대 붙이지 마시오.
8. 문장이 중간에 끊기지 않도록 완결된 문장으로 말하기.",
        samples = samples.join("\n"),
    );

    let user = format!("참가자 '{}'의 오늘 운세 진행해줘.", username);

    (system, user)
}
