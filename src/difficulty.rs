/*!
 * Vocabulary-based difficulty classification.
 *
 * Captions and whole scripts are labelled by how many of their distinct words
 * appear in the seeded vocabulary lists. Each vocabulary category carries a
 * level: daily words are beginner material, TOEIC and business words are
 * intermediate, SAT words are advanced. The classifier is a pure function of
 * its lexicon, thresholds and input text.
 */

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::database::models::{VocabularyCategory, VocabularyWordRecord};
use crate::subtitle_processor::{clean_caption_text, Caption};

/// Coarse difficulty label of a caption or script
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    /// Level taught by a vocabulary category
    pub fn for_category(category: VocabularyCategory) -> Self {
        match category {
            VocabularyCategory::Daily => DifficultyLevel::Beginner,
            VocabularyCategory::Toeic | VocabularyCategory::Business => DifficultyLevel::Intermediate,
            VocabularyCategory::Sat => DifficultyLevel::Advanced,
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner => write!(f, "beginner"),
            DifficultyLevel::Intermediate => write!(f, "intermediate"),
            DifficultyLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            _ => Err(anyhow!("Invalid difficulty level: {}", s)),
        }
    }
}

/// Word → level lookup built from vocabulary records
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    levels: HashMap<String, DifficultyLevel>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lexicon from stored vocabulary words
    pub fn from_records(records: &[VocabularyWordRecord]) -> Self {
        let mut lexicon = Self::new();
        for record in records {
            lexicon.insert(&record.word, record.category);
        }
        lexicon
    }

    /// Register a word; a word listed in several categories keeps its highest level
    pub fn insert(&mut self, word: &str, category: VocabularyCategory) {
        let level = DifficultyLevel::for_category(category);
        self.levels
            .entry(word.trim().to_lowercase())
            .and_modify(|existing| *existing = (*existing).max(level))
            .or_insert(level);
    }

    pub fn level_of(&self, word: &str) -> Option<DifficultyLevel> {
        self.levels.get(&word.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Ratios above which a text is promoted to a harder level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyThresholds {
    /// Minimum share of distinct words that are advanced vocabulary
    #[serde(default = "default_advanced_threshold")]
    pub advanced_threshold: f64,

    /// Minimum share of distinct words that are intermediate-or-harder vocabulary
    #[serde(default = "default_intermediate_threshold")]
    pub intermediate_threshold: f64,
}

impl Default for DifficultyThresholds {
    fn default() -> Self {
        Self {
            advanced_threshold: default_advanced_threshold(),
            intermediate_threshold: default_intermediate_threshold(),
        }
    }
}

fn default_advanced_threshold() -> f64 {
    0.03
}

fn default_intermediate_threshold() -> f64 {
    0.08
}

/// Breakdown behind a classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyScore {
    pub distinct_words: usize,
    pub intermediate_hits: usize,
    pub advanced_hits: usize,
    pub level: DifficultyLevel,
}

impl DifficultyScore {
    pub fn advanced_ratio(&self) -> f64 {
        ratio(self.advanced_hits, self.distinct_words)
    }

    /// Share of distinct words at intermediate level or harder
    pub fn intermediate_ratio(&self) -> f64 {
        ratio(self.intermediate_hits + self.advanced_hits, self.distinct_words)
    }
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Deterministic vocabulary-overlap classifier
#[derive(Debug, Clone)]
pub struct DifficultyClassifier {
    lexicon: Lexicon,
    thresholds: DifficultyThresholds,
}

impl DifficultyClassifier {
    pub fn new(lexicon: Lexicon, thresholds: DifficultyThresholds) -> Self {
        Self { lexicon, thresholds }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Score a piece of text
    pub fn score(&self, text: &str) -> DifficultyScore {
        let words = tokenize(&clean_caption_text(text));

        let mut intermediate_hits = 0;
        let mut advanced_hits = 0;
        for word in &words {
            match self.lexicon.level_of(word) {
                Some(DifficultyLevel::Advanced) => advanced_hits += 1,
                Some(DifficultyLevel::Intermediate) => intermediate_hits += 1,
                _ => {}
            }
        }

        let mut score = DifficultyScore {
            distinct_words: words.len(),
            intermediate_hits,
            advanced_hits,
            level: DifficultyLevel::Beginner,
        };

        score.level = if score.distinct_words == 0 {
            DifficultyLevel::Beginner
        } else if score.advanced_ratio() >= self.thresholds.advanced_threshold {
            DifficultyLevel::Advanced
        } else if score.intermediate_ratio() >= self.thresholds.intermediate_threshold {
            DifficultyLevel::Intermediate
        } else {
            DifficultyLevel::Beginner
        };

        score
    }

    pub fn classify(&self, text: &str) -> DifficultyLevel {
        self.score(text).level
    }

    pub fn classify_caption(&self, caption: &Caption) -> DifficultyLevel {
        self.classify(&caption.text)
    }

    /// Classify a whole script from the concatenated caption text
    pub fn classify_script(&self, captions: &[Caption]) -> DifficultyLevel {
        let joined = captions
            .iter()
            .map(|caption| caption.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.classify(&joined)
    }
}

/// Distinct lowercase ASCII words of a text
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect()
}
