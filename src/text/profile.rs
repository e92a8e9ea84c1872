use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::Deserialize;
use std::ops::RangeInclusive;

use crate::error::{Result, TypeRushError};

static PROFILE_DIR: Dir = include_dir!("src/profiles");

/// Profile used when an unknown difficulty id is requested.
pub const DEFAULT_PROFILE_ID: &str = "medium";

/// On-disk shape of a built-in profile
#[derive(Deserialize, Clone, Debug)]
struct ProfileDocument {
    id: String,
    words: Vec<String>,
    min_words: usize,
    max_words: usize,
    #[serde(default)]
    comma_probability: f64,
    #[serde(default)]
    period_probability: f64,
    #[serde(default)]
    capitalize_after_period: bool,
}

/// Named, immutable policy that drives text generation for one session.
#[derive(Clone, Debug, PartialEq)]
pub struct DifficultyProfile {
    id: String,
    words: Vec<String>,
    chunk_words: RangeInclusive<usize>,
    comma_probability: f64,
    period_probability: f64,
    capitalize_after_period: bool,
}

impl DifficultyProfile {
    /// Build a validated profile.
    ///
    /// The word pool must be non-empty and contain no empty words, the chunk
    /// range must start at one word or more, and the comma and period odds
    /// must each lie in `[0, 1]` without exceeding 1 combined.
    pub fn new(
        id: impl Into<String>,
        words: Vec<String>,
        chunk_words: RangeInclusive<usize>,
        comma_probability: f64,
        period_probability: f64,
    ) -> Result<Self> {
        let id = id.into();

        if words.is_empty() || words.iter().any(|w| w.is_empty()) {
            return Err(TypeRushError::EmptyWordPool { profile: id });
        }

        let (min, max) = (*chunk_words.start(), *chunk_words.end());
        if min == 0 || min > max {
            return Err(TypeRushError::InvalidChunkRange {
                profile: id,
                min,
                max,
            });
        }

        let valid_odds = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
        if !valid_odds(comma_probability)
            || !valid_odds(period_probability)
            || comma_probability + period_probability > 1.0
        {
            return Err(TypeRushError::InvalidPunctuation {
                profile: id,
                comma: comma_probability,
                period: period_probability,
            });
        }

        Ok(Self {
            id,
            words,
            chunk_words,
            comma_probability,
            period_probability,
            capitalize_after_period: false,
        })
    }

    /// Capitalize the word that follows a generated period.
    pub fn with_capitalization(mut self, capitalize_after_period: bool) -> Self {
        self.capitalize_after_period = capitalize_after_period;
        self
    }

    /// Look up a built-in profile by id (case-insensitive).
    pub fn builtin(id: &str) -> Result<Option<Self>> {
        let file_name = format!("{}.json", id.trim().to_lowercase());
        let Some(file) = PROFILE_DIR.get_file(&file_name) else {
            return Ok(None);
        };

        let contents = file.contents_utf8().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("profile {file_name} is not valid utf-8"),
            )
        })?;
        let doc: ProfileDocument = serde_json::from_str(contents)?;

        Self::new(
            doc.id,
            doc.words,
            doc.min_words..=doc.max_words,
            doc.comma_probability,
            doc.period_probability,
        )
        .map(|p| Some(p.with_capitalization(doc.capitalize_after_period)))
    }

    /// Resolve a difficulty id, falling back to the default profile for
    /// anything that is not registered.
    pub fn resolve(id: &str) -> Result<Self> {
        if let Some(profile) = Self::builtin(id)? {
            return Ok(profile);
        }

        tracing::warn!(
            requested = id,
            fallback = DEFAULT_PROFILE_ID,
            "unknown difficulty profile"
        );
        Self::builtin(DEFAULT_PROFILE_ID)?.ok_or_else(|| {
            TypeRushError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "default difficulty profile is missing",
            ))
        })
    }

    /// Ids of every built-in profile, easiest first.
    pub fn registered_ids() -> Vec<String> {
        PROFILE_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .filter_map(|s| s.to_str())
            .map(str::to_string)
            .sorted_by_key(|id| match id.as_str() {
                "easy" => 0,
                "medium" => 1,
                "hard" => 2,
                _ => 3,
            })
            .collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn chunk_words(&self) -> RangeInclusive<usize> {
        self.chunk_words.clone()
    }

    pub fn comma_probability(&self) -> f64 {
        self.comma_probability
    }

    pub fn period_probability(&self) -> f64 {
        self.period_probability
    }

    pub fn capitalize_after_period(&self) -> bool {
        self.capitalize_after_period
    }

    pub fn has_punctuation(&self) -> bool {
        self.comma_probability + self.period_probability > 0.0
    }
}
