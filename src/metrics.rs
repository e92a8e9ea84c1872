use serde::{Deserialize, Serialize};

/// Standard word length used for words-per-minute.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Scores derived from one comparison of typed input against the target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub wpm: u32,
    pub cpm: u32,
    pub accuracy: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            correct_count: 0,
            incorrect_count: 0,
            wpm: 0,
            cpm: 0,
            accuracy: 100,
        }
    }
}

/// Outcome of every typed char, compared index-by-index with `target`.
/// Chars typed past the end of `target` are incorrect.
pub fn outcomes<'a>(target: &'a str, typed: &'a str) -> impl Iterator<Item = Outcome> + 'a {
    let mut expected = target.chars();
    typed.chars().map(move |c| match expected.next() {
        Some(e) if e == c => Outcome::Correct,
        _ => Outcome::Incorrect,
    })
}

/// Compute net speed and accuracy.
///
/// Speed only counts correctly placed chars and is zero until some time has
/// elapsed. Accuracy is 100 for empty input.
pub fn compute(target: &str, typed: &str, elapsed_secs: f64) -> Metrics {
    let (correct_count, incorrect_count) =
        outcomes(target, typed).fold((0, 0), |(ok, bad), o| match o {
            Outcome::Correct => (ok + 1, bad),
            Outcome::Incorrect => (ok, bad + 1),
        });
    let typed_len = correct_count + incorrect_count;

    let accuracy = if typed_len > 0 {
        (100.0 * correct_count as f64 / typed_len as f64).round() as u32
    } else {
        100
    };

    let (wpm, cpm) = if elapsed_secs > 0.0 && elapsed_secs.is_finite() {
        let minutes = elapsed_secs / 60.0;
        let net_chars = (typed_len - incorrect_count) as f64;
        (
            to_rate(net_chars / CHARS_PER_WORD / minutes),
            to_rate(net_chars / minutes),
        )
    } else {
        (0, 0)
    };

    Metrics {
        correct_count,
        incorrect_count,
        wpm,
        cpm,
        accuracy,
    }
}

fn to_rate(value: f64) -> u32 {
    value.round().max(0.0) as u32
}
