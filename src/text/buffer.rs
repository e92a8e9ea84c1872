use rand::RngCore;

use super::{profile::DifficultyProfile, source::generate_chunk};

pub const DEFAULT_LOOKAHEAD_THRESHOLD: usize = 50;
pub const DEFAULT_MINIMUM_INITIAL_LENGTH: usize = 100;

/// Append-only target text that keeps a margin of untyped characters ahead
/// of the typist. Lengths are counted in chars.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBuffer {
    text: String,
    char_len: usize,
    lookahead_threshold: usize,
}

impl TextBuffer {
    /// Generate a fresh buffer of at least `minimum_length` chars.
    pub fn seeded(
        profile: &DifficultyProfile,
        rng: &mut dyn RngCore,
        lookahead_threshold: usize,
        minimum_length: usize,
    ) -> Self {
        let mut buffer = Self {
            text: String::new(),
            char_len: 0,
            lookahead_threshold,
        };

        // at least one chunk, even when the minimum is zero
        loop {
            buffer.append_chunk(profile, rng);
            if buffer.char_len >= minimum_length {
                break;
            }
        }
        buffer
    }

    /// Grow the text until more than `lookahead_threshold` chars remain past
    /// `typed_len`. Returns how many chunks were appended.
    pub fn ensure_lookahead(
        &mut self,
        typed_len: usize,
        profile: &DifficultyProfile,
        rng: &mut dyn RngCore,
    ) -> usize {
        let mut appended = 0;
        while self.remaining_after(typed_len) <= self.lookahead_threshold {
            self.append_chunk(profile, rng);
            appended += 1;
        }

        if appended > 0 {
            tracing::debug!(
                chunks = appended,
                len = self.char_len,
                typed = typed_len,
                "grew target text"
            );
        }
        appended
    }

    /// Untyped chars left after `typed_len` chars of input.
    pub fn remaining_after(&self, typed_len: usize) -> usize {
        self.char_len.saturating_sub(typed_len)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn lookahead_threshold(&self) -> usize {
        self.lookahead_threshold
    }

    fn append_chunk(&mut self, profile: &DifficultyProfile, rng: &mut dyn RngCore) {
        // a chunk that follows a sentence end starts a new sentence
        let capitalize_first = self.text.ends_with('.');
        let chunk = generate_chunk(profile, capitalize_first, rng);
        if !self.text.is_empty() {
            self.text.push(' ');
            self.char_len += 1;
        }
        self.char_len += chunk.chars().count();
        self.text.push_str(&chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn medium() -> DifficultyProfile {
        DifficultyProfile::builtin("medium").unwrap().unwrap()
    }

    #[test]
    fn test_seeded_reaches_minimum_length() {
        let mut rng = StdRng::seed_from_u64(5);
        let buffer = TextBuffer::seeded(&medium(), &mut rng, 50, 100);
        assert!(buffer.char_len() >= 100);
        assert_eq!(buffer.char_len(), buffer.as_str().chars().count());
        assert!(!buffer.as_str().starts_with(' '));
    }

    #[test]
    fn test_seeded_with_zero_minimum_still_has_text() {
        let mut rng = StdRng::seed_from_u64(5);
        let buffer = TextBuffer::seeded(&medium(), &mut rng, 50, 0);
        assert!(buffer.char_len() > 0);
    }

    #[test]
    fn test_no_growth_with_enough_lookahead() {
        let mut rng = StdRng::seed_from_u64(8);
        let profile = medium();
        let mut buffer = TextBuffer::seeded(&profile, &mut rng, 50, 200);
        let before = buffer.clone();

        assert_eq!(buffer.ensure_lookahead(0, &profile, &mut rng), 0);
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_growth_at_threshold_boundary() {
        let mut rng = StdRng::seed_from_u64(8);
        let profile = medium();
        let mut buffer = TextBuffer::seeded(&profile, &mut rng, 50, 100);
        let typed = buffer.char_len() - 50;

        assert!(buffer.ensure_lookahead(typed, &profile, &mut rng) >= 1);
        assert!(buffer.remaining_after(typed) > 50);
    }

    #[test]
    fn test_growth_only_appends() {
        let mut rng = StdRng::seed_from_u64(21);
        let profile = medium();
        let mut buffer = TextBuffer::seeded(&profile, &mut rng, 50, 100);
        let history = buffer.as_str().to_string();

        buffer.ensure_lookahead(buffer.char_len() + 30, &profile, &mut rng);

        assert!(buffer.as_str().starts_with(&history));
        assert_eq!(&buffer.as_str()[history.len()..history.len() + 1], " ");
        assert_eq!(buffer.char_len(), buffer.as_str().chars().count());
    }

    /// Words that follow a period-terminated word, across chunk boundaries
    fn words_after_period(text: &str) -> Vec<&str> {
        text.split(' ')
            .tuple_windows()
            .filter(|(prev, _)| prev.ends_with('.'))
            .map(|(_, word)| word)
            .collect()
    }

    #[test]
    fn test_sentence_start_capitalized_across_chunks() {
        for id in ["medium", "hard"] {
            let profile = DifficultyProfile::builtin(id).unwrap().unwrap();
            for seed in 0..50 {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut buffer = TextBuffer::seeded(&profile, &mut rng, 50, 1000);
                buffer.ensure_lookahead(buffer.char_len(), &profile, &mut rng);

                let after = words_after_period(buffer.as_str());
                assert!(!after.is_empty());
                assert!(
                    after
                        .iter()
                        .all(|w| !w.chars().next().unwrap().is_lowercase()),
                    "{id} seed {seed}: lowercase sentence start in {:?}",
                    buffer.as_str()
                );
            }
        }
    }

    #[test]
    fn test_chunk_after_period_starts_capitalized() {
        let words = ["alpha", "beta"].iter().map(|w| w.to_string()).collect();
        let profile = DifficultyProfile::new("periods", words, 1..=1, 0.0, 1.0)
            .unwrap()
            .with_capitalization(true);
        let mut rng = StdRng::seed_from_u64(2);

        // single-word chunks, so every word after the first sits on a boundary
        let buffer = TextBuffer::seeded(&profile, &mut rng, 5, 40);
        let words: Vec<&str> = buffer.as_str().split(' ').collect();

        assert!(words.len() > 1);
        assert!(words[0].starts_with(|c: char| c.is_lowercase()));
        assert!(words[1..]
            .iter()
            .all(|w| w.starts_with(|c: char| c.is_uppercase())));
    }
}
