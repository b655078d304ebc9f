/*!
 * Vocabulary word list loading.
 *
 * Word lists live in a directory with one subdirectory per category
 * (`toeic/`, `sat/`, `business/`, `daily/`). Every `.txt` file holds one
 * entry per line, either numbered (`12. abandon 버리다`) or bare
 * (`abandon 버리다`). Words already stored for the same category are left
 * untouched.
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::database::models::{NewVocabularyWord, VocabularyCategory};
use crate::database::SeedStore;

static NUMBERED_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\s+([A-Za-z]+)\s+(.+)$").unwrap()
});

static BARE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\s+(.+)$").unwrap()
});

/// Extract `(word, meaning)` from one word list line
pub fn parse_word_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let captures = NUMBERED_LINE_REGEX
        .captures(line)
        .or_else(|| BARE_LINE_REGEX.captures(line))?;

    let word = captures.get(1)?.as_str().to_string();
    let meaning = captures.get(2)?.as_str().trim().to_string();
    Some((word, meaning))
}

/// Entries of one word list file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedWordList {
    pub words: Vec<(String, String)>,
    /// Non-blank lines that did not match either format
    pub rejected: usize,
}

/// Parse the content of a word list, ignoring blank lines
pub fn parse_word_list(content: &str) -> ParsedWordList {
    let mut parsed = ParsedWordList::default();

    for line in content.trim_start_matches('\u{feff}').lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_word_line(line) {
            Some(entry) => parsed.words.push(entry),
            None => {
                debug!("Rejected vocabulary line: {:?}", line);
                parsed.rejected += 1;
            }
        }
    }

    parsed
}

/// A word list file and the category it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListFile {
    pub category: VocabularyCategory,
    pub path: PathBuf,
}

/// Find `.txt` word lists under `<dir>/<category>/`
pub fn discover_word_lists<P: AsRef<Path>>(dir: P) -> Result<Vec<WordListFile>> {
    let dir = dir.as_ref();
    let mut lists = Vec::new();

    for entry in WalkDir::new(dir).min_depth(2).follow_links(true).sort_by_file_name() {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let is_txt = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if !is_txt {
            continue;
        }

        let category_dir = path
            .strip_prefix(dir)
            .ok()
            .and_then(|relative| relative.components().next())
            .map(|component| component.as_os_str().to_string_lossy().to_string());

        match category_dir.as_deref().map(str::parse::<VocabularyCategory>) {
            Some(Ok(category)) => lists.push(WordListFile {
                category,
                path: path.to_path_buf(),
            }),
            _ => warn!("Ignoring word list outside a category directory: {:?}", path),
        }
    }

    Ok(lists)
}

/// Counts of a vocabulary load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VocabularyReport {
    pub files: usize,
    pub inserted: usize,
    pub existing: usize,
    pub rejected: usize,
}

impl VocabularyReport {
    pub fn merge(&mut self, other: VocabularyReport) {
        self.files += other.files;
        self.inserted += other.inserted;
        self.existing += other.existing;
        self.rejected += other.rejected;
    }
}

impl fmt::Display for VocabularyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s): {} inserted, {} already present, {} rejected line(s)",
            self.files, self.inserted, self.existing, self.rejected
        )
    }
}

/// Loads word lists into the store
pub struct VocabularyLoader {
    store: Arc<dyn SeedStore>,
}

impl VocabularyLoader {
    pub fn new(store: Arc<dyn SeedStore>) -> Self {
        Self { store }
    }

    /// Load every word list under a directory
    ///
    /// A missing directory is not an error; it yields an empty report.
    pub async fn load_directory<P: AsRef<Path>>(&self, dir: P) -> Result<VocabularyReport> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            warn!("Vocabulary directory does not exist: {:?}", dir);
            return Ok(VocabularyReport::default());
        }

        let mut report = VocabularyReport::default();
        for list in discover_word_lists(dir)? {
            let file_report = self.load_file(&list.path, list.category).await?;
            info!("Loaded {} words from {:?}: {}", list.category, list.path, file_report);
            report.merge(file_report);
        }

        Ok(report)
    }

    /// Load one word list file
    pub async fn load_file<P: AsRef<Path>>(
        &self,
        path: P,
        category: VocabularyCategory,
    ) -> Result<VocabularyReport> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read word list: {:?}", path))?;
        let content = String::from_utf8_lossy(&bytes);

        let mut report = self.load_words(&content, category).await?;
        report.files = 1;
        Ok(report)
    }

    /// Insert the words of a word list that are not stored yet
    pub async fn load_words(&self, content: &str, category: VocabularyCategory) -> Result<VocabularyReport> {
        let parsed = parse_word_list(content);
        let mut report = VocabularyReport {
            rejected: parsed.rejected,
            ..Default::default()
        };

        for (word, meaning) in parsed.words {
            if self.store.find_vocabulary_word(&word, category).await?.is_some() {
                debug!("Word already present: {} ({})", word, category);
                report.existing += 1;
                continue;
            }

            let new_word = NewVocabularyWord { word, meaning, category };
            if self.store.insert_vocabulary_word_if_absent(&new_word).await?.was_inserted() {
                report.inserted += 1;
            } else {
                report.existing += 1;
            }
        }

        Ok(report)
    }
}
