//! crates/caption_genius_core/src/prompt.rs
//!
//! Builds the generation prompt from the request and the caller's active
//! configuration. Each optional clause is a small builder returning `Option<String>`;
//! the prompt is the lead sentence, the present clauses, and the trailing instruction.

use crate::domain::AiConfiguration;

/// The system message sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a creative social media copywriter who specializes in writing engaging captions.";

const TRAILING_INSTRUCTION: &str =
    "Make it authentic, engaging, and suitable for Instagram. Include relevant hashtags.";

type ClauseBuilder = fn(&AiConfiguration) -> Option<String>;

/// Configuration clauses, in the order they appear in the prompt.
const CLAUSES: [ClauseBuilder; 4] = [
    purpose_clause,
    tone_clause,
    preferences_clause,
    additional_traits_clause,
];

fn labeled(label: &str, value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| format!("{}: {}.", label, value))
}

fn purpose_clause(config: &AiConfiguration) -> Option<String> {
    labeled("Purpose", &config.purpose)
}

fn tone_clause(config: &AiConfiguration) -> Option<String> {
    labeled("Tone", &config.tone)
}

fn preferences_clause(config: &AiConfiguration) -> Option<String> {
    labeled("Style and preferences", &config.preferences)
}

fn additional_traits_clause(config: &AiConfiguration) -> Option<String> {
    config
        .additional_traits
        .as_deref()
        .and_then(|traits| labeled("Additional traits", traits))
}

/// Assembles the user prompt. No truncation is applied.
pub fn build_prompt(niche: &str, input: &str, config: Option<&AiConfiguration>) -> String {
    let mut parts = vec![format!(
        "Generate a creative and engaging social media caption for a {} business.\nContext: {}",
        niche, input
    )];

    if let Some(config) = config {
        parts.extend(CLAUSES.iter().filter_map(|clause| clause(config)));
    }

    parts.push(TRAILING_INSTRUCTION.to_string());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn config(tone: &str, traits: Option<&str>) -> AiConfiguration {
        AiConfiguration {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            purpose: "Fill weekend classes".to_string(),
            tone: tone.to_string(),
            preferences: "Short, upbeat sentences".to_string(),
            additional_traits: traits.map(str::to_string),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn defaults_only_prompt_keeps_niche_and_input_verbatim() {
        let prompt = build_prompt("Yoga Studio", "New sunrise flow class on Saturday", None);
        assert!(prompt.contains("Yoga Studio"));
        assert!(prompt.contains("New sunrise flow class on Saturday"));
        assert!(prompt.ends_with(TRAILING_INSTRUCTION));
        assert!(!prompt.contains("Tone:"));
    }

    #[test]
    fn configured_tone_appears_in_prompt() {
        let cfg = config("playful", None);
        let prompt = build_prompt("Yoga Studio", "New sunrise flow class", Some(&cfg));
        assert!(prompt.contains("playful"));
        assert!(!prompt.contains("Additional traits"));
    }

    #[test]
    fn clauses_follow_fixed_order() {
        let cfg = config("warm", Some("uses emojis sparingly"));
        let prompt = build_prompt("Hair Salon", "Summer color specials", Some(&cfg));

        let positions: Vec<usize> = [
            "Context:",
            "Purpose:",
            "Tone:",
            "Style and preferences:",
            "Additional traits:",
            TRAILING_INSTRUCTION,
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn blank_fields_produce_no_clause() {
        let cfg = config("   ", Some(""));
        let prompt = build_prompt("Photography", "Golden hour portrait sessions", Some(&cfg));
        assert!(!prompt.contains("Tone:"));
        assert!(!prompt.contains("Additional traits"));
        assert!(prompt.contains("Purpose: Fill weekend classes."));
    }
}
