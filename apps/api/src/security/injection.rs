//! Prompt-injection detection.
//!
//! Layered heuristics over a single model-based classifier: cheap,
//! deterministic, auditable, and failing closed toward rejection. Scoring is
//! a pure function (`collect_signals`) that returns every increment with its
//! source, so tests can assert the full breakdown and not just the clamped
//! total.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use super::sanitize::sanitize_input;
use super::MAX_QUESTION_LENGTH;

/// Known prompt injection phrasings, matched case-insensitively against the
/// lowercased input. Each hit contributes a fixed 0.3 to the risk score.
const INJECTION_PATTERNS: &[&str] = &[
    r"ignore\s+(all\s+)?(previous|above|prior)\s+(instructions?|prompts?|commands?)",
    r"(system|user|assistant):\s*",
    r"<\|.*?\|>",
    r"###?\s*(system|user|assistant|instruction)",
    r"(forget|ignore)\s+(everything|all|that)",
    r"pretend\s+(to\s+be|you\s+are)",
    r"act\s+as\s+(if\s+you\s+are\s+)?a?\s*",
    r"roleplay\s+as",
    r"access\s+(to\s+)?(private|confidential|restricted)",
    r"simulate\s+(being\s+)?a?\s*",
    r"you\s+are\s+now\s+(a\s+)?",
    r"new\s+(role|character|persona)",
    r"\\n\\n(system|user|assistant):",
    r"(\[|\()?system(\]|\))?:",
    r"jailbreak",
    r"developer\s+mode",
    r"godmode",
];

/// Keywords hinting at attempts to manipulate the model itself.
/// Each hit contributes 0.1, uncapped per keyword.
const AI_MANIPULATION_KEYWORDS: &[&str] = &[
    "token",
    "embedding",
    "vector",
    "model",
    "training",
    "dataset",
    "neural",
    "transformer",
    "gpt",
    "llm",
    "prompt",
    "fine-tune",
];

/// Keywords hinting at system-level command injection. Each hit contributes
/// 0.4. `rm ` and `del ` carry a trailing space to avoid matching words like
/// "form" or "delegate".
const SYSTEM_COMMAND_KEYWORDS: &[&str] = &["sudo", "rm ", "del ", "format", "exec", "eval", "import"];

const PATTERN_INCREMENT: f64 = 0.3;
const SPECIAL_CHAR_INCREMENT: f64 = 0.2;
const REPEATED_TEXT_INCREMENT: f64 = 0.1;
const AI_KEYWORD_INCREMENT: f64 = 0.1;
const SYSTEM_KEYWORD_INCREMENT: f64 = 0.4;

const SPECIAL_CHAR_RATIO_THRESHOLD: f64 = 0.4;
const REPEAT_MIN_UNIT: usize = 10;
const REPEAT_MIN_COUNT: usize = 3;
const SAFE_SCORE_THRESHOLD: f64 = 0.5;

fn compiled_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INJECTION_PATTERNS
            .iter()
            .map(|&p| {
                let re = Regex::new(&format!("(?im){p}"))
                    .unwrap_or_else(|e| panic!("invalid injection pattern {p:?}: {e}"));
                (p, re)
            })
            .collect()
    })
}

fn special_char_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("invalid special-char pattern"))
}

/// Where a risk-score increment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    InjectionPattern,
    SpecialCharRatio,
    RepeatedText,
    AiKeyword,
    SystemKeyword,
}

/// One additive contribution to the risk score.
#[derive(Debug, Clone, Serialize)]
pub struct RiskSignal {
    pub kind: SignalKind,
    pub detail: String,
    pub increment: f64,
}

/// Result of analyzing one input. Produced fresh per request, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityVerdict {
    pub is_safe: bool,
    pub cleaned_input: String,
    pub risk_score: f64,
    pub detected_patterns: Vec<String>,
    pub warnings: Vec<String>,
    /// Full additive breakdown behind `risk_score`.
    pub signals: Vec<RiskSignal>,
}

/// Collects every risk signal in the input, in evaluation order. Pure.
pub fn collect_signals(text: &str) -> Vec<RiskSignal> {
    let lower = text.to_lowercase();
    let mut signals = Vec::new();

    for (source, re) in compiled_patterns() {
        if re.is_match(&lower) {
            signals.push(RiskSignal {
                kind: SignalKind::InjectionPattern,
                detail: (*source).to_string(),
                increment: PATTERN_INCREMENT,
            });
        }
    }

    let total_chars = text.chars().count().max(1);
    let special_chars = special_char_regex().find_iter(text).count();
    if special_chars as f64 / total_chars as f64 > SPECIAL_CHAR_RATIO_THRESHOLD {
        signals.push(RiskSignal {
            kind: SignalKind::SpecialCharRatio,
            detail: "High ratio of special characters".to_string(),
            increment: SPECIAL_CHAR_INCREMENT,
        });
    }

    if has_repeated_run(text, REPEAT_MIN_UNIT, REPEAT_MIN_COUNT) {
        signals.push(RiskSignal {
            kind: SignalKind::RepeatedText,
            detail: "Repeated text patterns detected".to_string(),
            increment: REPEATED_TEXT_INCREMENT,
        });
    }

    for keyword in AI_MANIPULATION_KEYWORDS {
        if lower.contains(keyword) {
            signals.push(RiskSignal {
                kind: SignalKind::AiKeyword,
                detail: format!("AI-related keyword detected: {keyword}"),
                increment: AI_KEYWORD_INCREMENT,
            });
        }
    }

    for keyword in SYSTEM_COMMAND_KEYWORDS {
        if lower.contains(keyword) {
            signals.push(RiskSignal {
                kind: SignalKind::SystemKeyword,
                detail: format!("System command keyword detected: {keyword}"),
                increment: SYSTEM_KEYWORD_INCREMENT,
            });
        }
    }

    signals
}

/// True when some substring of at least `min_unit` bytes repeats `min_count`
/// or more times consecutively. The `regex` crate has no backreferences, so
/// this is a direct scan equivalent to `(.{10,})\1{2,}`.
fn has_repeated_run(text: &str, min_unit: usize, min_count: usize) -> bool {
    let bytes = text.as_bytes();
    let n = bytes.len();
    if n < min_unit * min_count {
        return false;
    }
    for unit in min_unit..=n / min_count {
        for start in 0..=n - unit * min_count {
            let first = &bytes[start..start + unit];
            if (1..min_count)
                .all(|r| &bytes[start + r * unit..start + (r + 1) * unit] == first)
            {
                return true;
            }
        }
    }
    false
}

/// Analyzes user input for prompt-injection attempts.
///
/// The additive score flags inputs above 0.5; independently of the score, a
/// hard veto rejects any input containing both "ignore" and "instruction",
/// or a bare `system:` / `user:` / `assistant:` role tag. The veto is
/// intentionally blunt (it can reject legitimate questions that use these
/// words incidentally) and must not be loosened without revisiting the
/// threat model.
pub fn detect_prompt_injection(text: &str) -> SecurityVerdict {
    if text.trim().is_empty() {
        return SecurityVerdict {
            is_safe: true,
            cleaned_input: String::new(),
            risk_score: 0.0,
            detected_patterns: Vec::new(),
            warnings: Vec::new(),
            signals: Vec::new(),
        };
    }

    let signals = collect_signals(text);
    let risk_score = signals
        .iter()
        .map(|s| s.increment)
        .sum::<f64>()
        .min(1.0);

    let detected_patterns: Vec<String> = signals
        .iter()
        .filter(|s| s.kind == SignalKind::InjectionPattern)
        .map(|s| s.detail.clone())
        .collect();
    let warnings: Vec<String> = signals
        .iter()
        .filter(|s| s.kind != SignalKind::InjectionPattern)
        .map(|s| s.detail.clone())
        .collect();

    let cleaned_input = sanitize_input(text, Some(MAX_QUESTION_LENGTH));

    let lower = text.to_lowercase();
    let hard_veto = (lower.contains("ignore") && lower.contains("instruction"))
        || lower.contains("system:")
        || lower.contains("user:")
        || lower.contains("assistant:");

    let is_safe = risk_score <= SAFE_SCORE_THRESHOLD && !hard_veto;

    if !is_safe {
        warn!(
            risk_score,
            patterns = ?detected_patterns,
            "Potential prompt injection detected"
        );
    }

    SecurityVerdict {
        is_safe,
        cleaned_input,
        risk_score,
        detected_patterns,
        warnings,
        signals,
    }
}
