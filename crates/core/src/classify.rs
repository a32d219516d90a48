//! Clue classification: one raw line in, one [`ClueForm`] out. No I/O.
//!
//! Forms are recognized by prefix on the trimmed line, in the fixed order of
//! [`RULES`]. The first matching rule wins; a line no rule claims is
//! literal text.

use std::fmt;

/// Seconds of audio kept when a clue gives no duration.
pub const DEFAULT_AUDIO_DURATION: u32 = 40;

/// Prefix that forces the rest of the line to be literal text.
pub const LITERAL_ESCAPE: char = '`';
/// Prefix for raw markup passed through to the front end.
pub const HTML_PREFIX: &str = "__html:";

const YOUTUBE_PREFIX: &str = "https://www.youtube.com/";
const LOCAL_AUDIO_PREFIX: &str = "audio/";
const LOCAL_IMAGE_PREFIX: &str = "images/";

/// Where a media reference points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaSource {
    /// An `http://` or `https://` URL.
    Remote(String),
    /// A path relative to the script's directory.
    Local(String),
}

impl MediaSource {
    pub fn reference(&self) -> &str {
        match self {
            MediaSource::Remote(r) | MediaSource::Local(r) => r,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRequest {
    pub source: MediaSource,
}

/// Audio clip request: keep `[start, start + duration)` seconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioRequest {
    pub source: MediaSource,
    pub start: u32,
    pub duration: u32,
}

/// The recognized shapes of a clue line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClueForm {
    LiteralText(String),
    RawHtml(String),
    Image(ImageRequest),
    Audio(AudioRequest),
}

impl ClueForm {
    pub fn is_audio(&self) -> bool {
        matches!(self, ClueForm::Audio(_))
    }
}

/// A non-integer audio start or duration token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioParamError {
    pub param: &'static str,
    pub token: String,
}

impl fmt::Display for AudioParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "audio {} should be an integer, got '{}'",
            self.param, self.token
        )
    }
}

impl std::error::Error for AudioParamError {}

// ──────────────────────────────────────────────
// Rules
// ──────────────────────────────────────────────

struct Rule {
    matches: fn(&str) -> bool,
    /// Receives the raw line and the trimmed line.
    build: fn(&str, &str) -> Result<ClueForm, AudioParamError>,
}

const RULES: &[Rule] = &[
    Rule {
        matches: |t| t.starts_with(LITERAL_ESCAPE),
        build: |raw, _| Ok(ClueForm::LiteralText(text_clue(raw))),
    },
    Rule {
        matches: |t| t.starts_with(HTML_PREFIX),
        build: |_, t| Ok(ClueForm::RawHtml(t[HTML_PREFIX.len()..].trim().to_owned())),
    },
    Rule {
        matches: |t| t.starts_with(YOUTUBE_PREFIX),
        build: |_, t| audio_request(t, MediaSource::Remote),
    },
    Rule {
        matches: |t| t.starts_with(LOCAL_AUDIO_PREFIX),
        build: |_, t| audio_request(t, MediaSource::Local),
    },
    Rule {
        matches: |t| t.starts_with("https://") || t.starts_with("http://"),
        build: |_, t| {
            Ok(ClueForm::Image(ImageRequest {
                source: MediaSource::Remote(t.to_owned()),
            }))
        },
    },
    Rule {
        matches: |t| t.starts_with(LOCAL_IMAGE_PREFIX),
        build: |_, t| {
            Ok(ClueForm::Image(ImageRequest {
                source: MediaSource::Local(t.to_owned()),
            }))
        },
    },
];

/// Classify one clue line.
pub fn classify(line: &str) -> Result<ClueForm, AudioParamError> {
    let trimmed = line.trim();
    for rule in RULES {
        if (rule.matches)(trimmed) {
            return (rule.build)(line, trimmed);
        }
    }
    Ok(ClueForm::LiteralText(trimmed.to_owned()))
}

/// Text content of a line that is only ever text (vowel entries,
/// captions): the untrimmed remainder after a leading backtick, otherwise
/// the trimmed line.
pub fn text_clue(line: &str) -> String {
    match line.trim_start().strip_prefix(LITERAL_ESCAPE) {
        Some(rest) => rest.to_owned(),
        None => line.trim().to_owned(),
    }
}

fn audio_request(
    trimmed: &str,
    source: fn(String) -> MediaSource,
) -> Result<ClueForm, AudioParamError> {
    let mut tokens = trimmed.split_whitespace();
    let reference = tokens.next().unwrap_or_default().to_owned();
    let start = parse_seconds(tokens.next(), "start offset", 0)?;
    let duration = parse_seconds(tokens.next(), "duration", DEFAULT_AUDIO_DURATION)?;
    Ok(ClueForm::Audio(AudioRequest {
        source: source(reference),
        start,
        duration,
    }))
}

fn parse_seconds(
    token: Option<&str>,
    param: &'static str,
    default: u32,
) -> Result<u32, AudioParamError> {
    match token {
        None => Ok(default),
        Some(tok) => tok.parse().map_err(|_| AudioParamError {
            param,
            token: tok.to_owned(),
        }),
    }
}
