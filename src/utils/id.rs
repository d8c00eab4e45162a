// src/utils/id.rs

use uuid::Uuid;

use crate::error::AppError;

/// Parses a path or body identifier.
///
/// Garbage input yields `InvalidId`, which callers keep distinct from
/// `NotFound` for well-formed ids that match nothing.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidId(format!("Invalid {} ID format", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!("  {id} "), "quiz").unwrap(), id);
    }

    #[test]
    fn malformed_ids_are_invalid_not_missing() {
        match parse_id("not-an-id", "quiz") {
            Err(AppError::InvalidId(msg)) => assert_eq!(msg, "Invalid quiz ID format"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
