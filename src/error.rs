use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypeRushError>;

/// Failures surfaced to the front end. Only misconfiguration can happen while
/// building a session; everything else here comes from the local stores.
#[derive(Debug, Error)]
pub enum TypeRushError {
    #[error("session duration must be a positive number of seconds, got {seconds}")]
    InvalidDuration { seconds: u32 },

    #[error("difficulty profile '{profile}' has an empty word pool")]
    EmptyWordPool { profile: String },

    #[error("difficulty profile '{profile}' has an invalid chunk range {min}..={max}")]
    InvalidChunkRange {
        profile: String,
        min: usize,
        max: usize,
    },

    #[error("difficulty profile '{profile}' has invalid punctuation odds (comma {comma}, period {period})")]
    InvalidPunctuation {
        profile: String,
        comma: f64,
        period: f64,
    },

    #[error("lookahead threshold must be at least one character")]
    InvalidLookahead,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TypeRushError {
    /// True for errors the user can fix by changing settings.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidDuration { .. }
                | Self::EmptyWordPool { .. }
                | Self::InvalidChunkRange { .. }
                | Self::InvalidPunctuation { .. }
                | Self::InvalidLookahead
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_flagged() {
        assert!(TypeRushError::InvalidDuration { seconds: 0 }.is_config());
        assert!(TypeRushError::InvalidLookahead.is_config());
        let io = TypeRushError::from(std::io::Error::other("disk"));
        assert!(!io.is_config());
    }

    #[test]
    fn messages_name_the_profile() {
        let err = TypeRushError::EmptyWordPool {
            profile: "custom".into(),
        };
        assert_eq!(
            err.to_string(),
            "difficulty profile 'custom' has an empty word pool"
        );
    }
}
