//! crates/caption_genius_core/src/validation.rs
//!
//! Pure input checks. Nothing here touches a port.

use crate::domain::{GenerationRequest, NewAiConfiguration, ScheduleRange};

pub const MIN_INPUT_CHARS: usize = 10;
pub const MAX_INPUT_CHARS: usize = 500;

/// Client input was malformed. The message is safe to show to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Checks the shape and bounds of a caption generation request.
pub fn validate_generation_request(request: &GenerationRequest) -> Result<(), ValidationError> {
    if request.caller_id.is_nil() {
        return Err(ValidationError::new("User ID is required"));
    }
    if request.niche.trim().is_empty() {
        return Err(ValidationError::new("Niche is required"));
    }

    let length = request.input.chars().count();
    if length < MIN_INPUT_CHARS {
        return Err(ValidationError(format!(
            "Post description must be at least {} characters",
            MIN_INPUT_CHARS
        )));
    }
    if length > MAX_INPUT_CHARS {
        return Err(ValidationError(format!(
            "Post description cannot exceed {} characters",
            MAX_INPUT_CHARS
        )));
    }
    Ok(())
}

/// Checks a configuration from the customize flow and normalizes blank optional traits to `None`.
pub fn validate_configuration(
    config: NewAiConfiguration,
) -> Result<NewAiConfiguration, ValidationError> {
    for (field, value) in [
        ("Purpose", &config.purpose),
        ("Tone", &config.tone),
        ("Preferences", &config.preferences),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError(format!("{} is required", field)));
        }
    }

    let additional_traits = config
        .additional_traits
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(NewAiConfiguration {
        purpose: config.purpose.trim().to_string(),
        tone: config.tone.trim().to_string(),
        preferences: config.preferences.trim().to_string(),
        additional_traits,
    })
}

pub fn validate_platform(platform: &str) -> Result<(), ValidationError> {
    if platform.trim().is_empty() {
        return Err(ValidationError::new("Platform is required"));
    }
    Ok(())
}

pub fn validate_schedule_range(range: &ScheduleRange) -> Result<(), ValidationError> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from >= to {
            return Err(ValidationError::new("'from' must be earlier than 'to'"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request(niche: &str, input: &str) -> GenerationRequest {
        GenerationRequest {
            niche: niche.to_string(),
            input: input.to_string(),
            caller_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn accepts_input_at_both_bounds() {
        assert!(validate_generation_request(&request("Yoga Studio", &"a".repeat(10))).is_ok());
        assert!(validate_generation_request(&request("Yoga Studio", &"a".repeat(500))).is_ok());
    }

    #[test]
    fn rejects_short_and_long_input() {
        let short = validate_generation_request(&request("Yoga Studio", "too short")).unwrap_err();
        assert_eq!(short.0, "Post description must be at least 10 characters");

        let long = validate_generation_request(&request("Yoga Studio", &"a".repeat(501))).unwrap_err();
        assert_eq!(long.0, "Post description cannot exceed 500 characters");
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Ten multi-byte characters are still ten characters.
        let input = "☕".repeat(10);
        assert!(validate_generation_request(&request("Indie Coffee Shop", &input)).is_ok());
    }

    #[test]
    fn rejects_missing_niche_and_caller() {
        let err = validate_generation_request(&request("   ", "a long enough description")).unwrap_err();
        assert_eq!(err.0, "Niche is required");

        let mut req = request("Yoga Studio", "a long enough description");
        req.caller_id = Uuid::nil();
        assert_eq!(
            validate_generation_request(&req).unwrap_err().0,
            "User ID is required"
        );
    }

    #[test]
    fn configuration_requires_core_fields_and_drops_blank_traits() {
        let config = NewAiConfiguration {
            purpose: " Sell classes ".to_string(),
            tone: "playful".to_string(),
            preferences: "short sentences".to_string(),
            additional_traits: Some("  ".to_string()),
        };
        let normalized = validate_configuration(config.clone()).unwrap();
        assert_eq!(normalized.purpose, "Sell classes");
        assert_eq!(normalized.additional_traits, None);

        let missing_tone = NewAiConfiguration {
            tone: String::new(),
            ..config
        };
        assert_eq!(
            validate_configuration(missing_tone).unwrap_err().0,
            "Tone is required"
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let now = chrono::Utc::now();
        let range = ScheduleRange {
            from: Some(now),
            to: Some(now),
        };
        assert!(validate_schedule_range(&range).is_err());
        assert!(validate_schedule_range(&ScheduleRange::default()).is_ok());
    }
}
