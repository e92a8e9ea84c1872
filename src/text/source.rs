use itertools::Itertools;
use rand::{Rng, RngCore};

use super::profile::DifficultyProfile;

/// Trait for turning a run of drawn words into prompt text.
///
/// `capitalize_first` is set when the text this run is appended to ends a
/// sentence.
pub trait TextFormatter {
    fn format(&self, words: Vec<String>, capitalize_first: bool, rng: &mut dyn RngCore)
        -> String;
}

/// Joins words with single spaces
pub struct BasicFormatter;

impl TextFormatter for BasicFormatter {
    fn format(
        &self,
        words: Vec<String>,
        _capitalize_first: bool,
        _rng: &mut dyn RngCore,
    ) -> String {
        words.join(" ")
    }
}

/// Appends a comma or a period to each word independently.
///
/// One roll per word decides between comma, period, or nothing, so the two
/// marks never land on the same word.
pub struct PunctuationFormatter {
    pub comma_probability: f64,
    pub period_probability: f64,
    pub capitalize_after_period: bool,
}

impl TextFormatter for PunctuationFormatter {
    fn format(
        &self,
        words: Vec<String>,
        capitalize_first: bool,
        rng: &mut dyn RngCore,
    ) -> String {
        let mut capitalize_next = capitalize_first && self.capitalize_after_period;

        words
            .into_iter()
            .map(|word| {
                let mut formatted = if capitalize_next {
                    capitalize_first_letter(&word)
                } else {
                    word
                };

                let roll: f64 = rng.gen();
                capitalize_next = false;
                if roll < self.comma_probability {
                    formatted.push(',');
                } else if roll < self.comma_probability + self.period_probability {
                    formatted.push('.');
                    capitalize_next = self.capitalize_after_period;
                }
                formatted
            })
            .join(" ")
    }
}

/// Pick the formatter a profile asks for
pub fn formatter_for(profile: &DifficultyProfile) -> Box<dyn TextFormatter> {
    if profile.has_punctuation() {
        Box::new(PunctuationFormatter {
            comma_probability: profile.comma_probability(),
            period_probability: profile.period_probability(),
            capitalize_after_period: profile.capitalize_after_period(),
        })
    } else {
        Box::new(BasicFormatter)
    }
}

/// Produce one chunk of target text.
///
/// Draw order: the word count (uniform over the profile's chunk range), then
/// every word index (uniform, with replacement), then one punctuation roll
/// per word when the profile punctuates. Capitalization draws nothing, so the
/// result depends only on the profile, `capitalize_first` and the state of
/// `rng`. The result is never empty.
pub fn generate_chunk(
    profile: &DifficultyProfile,
    capitalize_first: bool,
    rng: &mut dyn RngCore,
) -> String {
    let count = rng.gen_range(profile.chunk_words());
    let pool = profile.words();

    let words = (0..count)
        .map(|_| pool[rng.gen_range(0..pool.len())].clone())
        .collect::<Vec<String>>();

    formatter_for(profile).format(words, capitalize_first, rng)
}

fn capitalize_first_letter(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
