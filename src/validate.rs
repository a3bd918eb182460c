//! Input validation for tool arguments.
//!
//! Limits are business rules for user-entered study material, applied at
//! the MCP boundary before anything touches the store.

use crate::error::Error;

/// Maximum length of an English phrase or its translation.
pub const MAX_PHRASE_LENGTH: usize = 500;
/// Maximum length of a usage context.
pub const MAX_CONTEXT_LENGTH: usize = 1000;
/// Maximum length of correction texts and feedback.
pub const MAX_FEEDBACK_LENGTH: usize = 2000;
/// Maximum length of an error-pattern label.
pub const MAX_ERROR_PATTERN_LENGTH: usize = 100;
/// Maximum length of a search keyword.
pub const MAX_KEYWORD_LENGTH: usize = 200;
/// Upper clamp for query limits.
pub const MAX_QUERY_LIMIT: usize = 100;

fn check_not_blank(value: &str, field: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn check_max_len(value: &str, max: usize, field: &str) -> Result<(), Error> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::Validation(format!(
            "{} is too long (max {} characters, got {})",
            field, max, len
        )));
    }
    Ok(())
}

/// Validate phrase input from the user.
pub fn validate_phrase_input(english: &str, japanese: &str, context: &str) -> Result<(), Error> {
    check_not_blank(english, "English phrase")?;
    check_not_blank(japanese, "Japanese translation")?;
    check_max_len(english, MAX_PHRASE_LENGTH, "English phrase")?;
    check_max_len(japanese, MAX_PHRASE_LENGTH, "Japanese translation")?;
    check_max_len(context, MAX_CONTEXT_LENGTH, "Context")?;
    Ok(())
}

/// Validate correction input from the user.
pub fn validate_correction_input(
    original_text: &str,
    corrected_text: &str,
    feedback: &str,
    error_pattern: &str,
) -> Result<(), Error> {
    check_not_blank(original_text, "Original text")?;
    check_not_blank(corrected_text, "Corrected text")?;
    check_not_blank(feedback, "Feedback")?;
    check_max_len(original_text, MAX_FEEDBACK_LENGTH, "Original text")?;
    check_max_len(corrected_text, MAX_FEEDBACK_LENGTH, "Corrected text")?;
    check_max_len(feedback, MAX_FEEDBACK_LENGTH, "Feedback")?;
    check_max_len(error_pattern, MAX_ERROR_PATTERN_LENGTH, "Error pattern")?;
    Ok(())
}

/// Validate a search keyword.
pub fn validate_search_keyword(keyword: &str) -> Result<(), Error> {
    check_not_blank(keyword, "Search keyword")?;
    check_max_len(keyword, MAX_KEYWORD_LENGTH, "Search keyword")?;
    Ok(())
}

/// Validate a query limit, clamping to the upper bound.
pub fn validate_limit(limit: usize) -> Result<usize, Error> {
    if limit == 0 {
        return Err(Error::Validation("Limit must be at least 1".to_string()));
    }
    Ok(limit.min(MAX_QUERY_LIMIT))
}
