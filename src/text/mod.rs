pub mod buffer;
pub mod profile;
pub mod source;

// Re-export the main types for convenience
pub use buffer::{TextBuffer, DEFAULT_LOOKAHEAD_THRESHOLD, DEFAULT_MINIMUM_INITIAL_LENGTH};
pub use profile::{DifficultyProfile, DEFAULT_PROFILE_ID};
pub use source::{generate_chunk, BasicFormatter, PunctuationFormatter, TextFormatter};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_integrated_generation() {
        let profile = DifficultyProfile::resolve("easy").unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let mut buffer = TextBuffer::seeded(&profile, &mut rng, 50, 100);
        let grown = buffer.ensure_lookahead(buffer.char_len(), &profile, &mut rng);

        assert!(grown > 0);
        // easy text is plain lowercase words
        assert!(buffer
            .as_str()
            .chars()
            .all(|c| c == ' ' || c.is_ascii_lowercase()));
    }
}
