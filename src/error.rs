use thiserror::Error;

/// Race card loading errors
#[derive(Debug, Error)]
pub enum CardError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid race card JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Scoring configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Validation functions
pub fn validate_field_size(count: usize) -> Result<(), CardError> {
    if !(1..=18).contains(&count) {
        return Err(CardError::Validation(format!(
            "Field must have between 1 and 18 entrants, got {}",
            count
        )));
    }
    Ok(())
}

pub fn validate_distance(distance: u32) -> Result<(), CardError> {
    if !(800..=4500).contains(&distance) {
        return Err(CardError::Validation(format!(
            "Distance must be between 800m and 4500m, got {}m",
            distance
        )));
    }
    Ok(())
}

pub fn validate_horse_no(horse_no: u8) -> Result<(), CardError> {
    if !(1..=18).contains(&horse_no) {
        return Err(CardError::Validation(format!(
            "Horse number must be between 1 and 18, got {}",
            horse_no
        )));
    }
    Ok(())
}

/// Impost 0.0 means "not announced yet" and is accepted
pub fn validate_impost(impost: f64) -> Result<(), CardError> {
    if impost != 0.0 && !(40.0..=70.0).contains(&impost) {
        return Err(CardError::Validation(format!(
            "Impost must be between 40kg and 70kg, got {}",
            impost
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_field_size() {
        assert!(validate_field_size(1).is_ok());
        assert!(validate_field_size(18).is_ok());
        assert!(validate_field_size(0).is_err());
        assert!(validate_field_size(19).is_err());
    }

    #[test]
    fn test_validate_distance() {
        assert!(validate_distance(1000).is_ok());
        assert!(validate_distance(4250).is_ok());
        assert!(validate_distance(0).is_err());
        assert!(validate_distance(5000).is_err());
    }

    #[test]
    fn test_validate_horse_no() {
        for i in 1..=18 {
            assert!(validate_horse_no(i).is_ok());
        }
        assert!(validate_horse_no(0).is_err());
        assert!(validate_horse_no(19).is_err());
    }

    #[test]
    fn test_validate_impost() {
        assert!(validate_impost(0.0).is_ok());
        assert!(validate_impost(57.5).is_ok());
        assert!(validate_impost(-1.0).is_err());
        assert!(validate_impost(80.0).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = CardError::Validation("test error".to_string());
        assert!(err.to_string().contains("Validation error"));
        let err = ConfigError::Invalid("lookback".to_string());
        assert!(err.to_string().contains("Invalid config"));
    }
}
