use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use log::{warn, debug};
use sha2::{Digest, Sha256};

use crate::errors::SubtitleError;

// @module: SRT parsing and caption text handling

// @const: SRT timecode line regex (comma or dot before milliseconds)
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: HTML-style formatting tags such as <i> or <font color="...">
static MARKUP_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?[A-Za-z][^>]*>").unwrap()
});

// @const: ASS override blocks such as {\an8}
static OVERRIDE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\[^}]*\}").unwrap()
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").unwrap()
});

// @struct: Single timed caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    // @field: Sequence number (1-based, assigned after sorting)
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Caption text, lines joined with '\n'
    pub text: String,
}

impl Caption {
    pub fn new(seq_num: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Caption {
            seq_num,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Duration of the caption in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(SubtitleError::InvalidTimestamp(timestamp.to_string()).into());
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        to_millis(hours, minutes, seconds, millis)
            .ok_or_else(|| anyhow!(SubtitleError::InvalidTimestamp(timestamp.to_string())))
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(
            f,
            "{} --> {}",
            Caption::format_timestamp(self.start_ms),
            Caption::format_timestamp(self.end_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Result of parsing one subtitle file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedSubtitles {
    /// Captions ordered by start time and renumbered from 1
    pub captions: Vec<Caption>,

    /// Number of blocks rejected as malformed
    pub skipped_blocks: usize,
}

impl ParsedSubtitles {
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// Caption texts cleaned of markup and joined by a single space
    pub fn plain_text(&self) -> String {
        self.captions
            .iter()
            .map(|caption| clean_caption_text(&caption.text))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// SubRip (.srt) parser
///
/// Blocks are separated by blank lines. Each block carries an optional index
/// line, a timecode line and one or more text lines. Blocks that cannot be
/// interpreted are counted and skipped; they never abort the parse.
pub struct SrtParser;

impl SrtParser {
    /// Parse SRT content, skipping malformed blocks
    pub fn parse(content: &str) -> ParsedSubtitles {
        let normalized = content
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n");

        let mut captions = Vec::new();
        let mut skipped_blocks = 0;

        for (block_index, block) in Self::split_blocks(&normalized).into_iter().enumerate() {
            match Self::parse_block(&block) {
                Some(caption) => captions.push(caption),
                None => {
                    skipped_blocks += 1;
                    debug!("Skipping malformed subtitle block #{}: {:?}", block_index + 1, block.first());
                }
            }
        }

        // Stable sort keeps source order for equal start times
        captions.sort_by_key(|caption| caption.start_ms);

        for (i, caption) in captions.iter_mut().enumerate() {
            caption.seq_num = i + 1;
        }

        if skipped_blocks > 0 {
            warn!("Skipped {} malformed subtitle block(s)", skipped_blocks);
        }

        ParsedSubtitles {
            captions,
            skipped_blocks,
        }
    }

    /// Parse SRT content and fail if no caption survives
    pub fn parse_captions(content: &str) -> std::result::Result<Vec<Caption>, SubtitleError> {
        let parsed = Self::parse(content);
        if parsed.captions.is_empty() {
            return Err(SubtitleError::NoCaptions {
                skipped_blocks: parsed.skipped_blocks,
            });
        }
        Ok(parsed.captions)
    }

    /// Render captions back to SRT text
    pub fn render(captions: &[Caption]) -> String {
        captions.iter().map(|caption| caption.to_string()).collect()
    }

    fn split_blocks(content: &str) -> Vec<Vec<&str>> {
        let mut blocks = Vec::new();
        let mut current = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
            } else {
                current.push(trimmed);
            }
        }

        if !current.is_empty() {
            blocks.push(current);
        }

        blocks
    }

    fn parse_block(lines: &[&str]) -> Option<Caption> {
        let mut rest = lines;

        // The index line is optional when the block opens with a timecode
        if let Some(first) = rest.first() {
            if !TIMESTAMP_REGEX.is_match(first) && first.parse::<usize>().is_ok() {
                rest = &rest[1..];
            }
        }

        let (timecode, text_lines) = rest.split_first()?;
        let (start_ms, end_ms) = Self::parse_timecode_line(timecode)?;

        if end_ms < start_ms || text_lines.is_empty() {
            return None;
        }

        Some(Caption::new(0, start_ms, end_ms, text_lines.join("\n")))
    }

    fn parse_timecode_line(line: &str) -> Option<(u64, u64)> {
        let caps = TIMESTAMP_REGEX.captures(line)?;
        let start = Self::captured_millis(&caps, 1)?;
        let end = Self::captured_millis(&caps, 5)?;
        Some((start, end))
    }

    fn captured_millis(caps: &regex::Captures, start_idx: usize) -> Option<u64> {
        let field = |offset: usize| -> Option<u64> {
            caps.get(start_idx + offset)?.as_str().parse().ok()
        };
        to_millis(field(0)?, field(1)?, field(2)?, field(3)?)
    }
}

fn to_millis(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    if minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return None;
    }
    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

/// Strip formatting markup and collapse whitespace in a caption
pub fn clean_caption_text(text: &str) -> String {
    let without_tags = MARKUP_TAG_REGEX.replace_all(text, " ");
    let without_overrides = OVERRIDE_TAG_REGEX.replace_all(&without_tags, " ");
    WHITESPACE_REGEX
        .replace_all(&without_overrides, " ")
        .trim()
        .to_string()
}

/// Hex SHA-256 digest of downloaded subtitle content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
