//! Output document model.
//!
//! These types serialize to the exact JSON shape the game front end reads.
//! A [`Document`] only exists once a whole script compiled successfully, so
//! the fixed round sizes below always hold for a returned value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Puzzles in the connections round and in the sequences round.
pub const PUZZLES_PER_ROUND: usize = 6;
/// Groups in the walls round, across both walls.
pub const WALL_GROUPS: usize = 8;
/// Groups in one wall.
pub const GROUPS_PER_WALL: usize = 4;
/// Items in every puzzle, wall group, and vowel category.
pub const CLUES_PER_PUZZLE: usize = 4;

// ──────────────────────────────────────────────
// Round
// ──────────────────────────────────────────────

/// Compile stage. `Start` precedes the first directive; there is no
/// explicit end state, the machine is consumed when input runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    Start,
    Connections,
    Sequences,
    Walls,
    Vowels,
}

impl Round {
    /// The only round allowed to follow this one.
    pub fn next(self) -> Option<Round> {
        match self {
            Round::Start => Some(Round::Connections),
            Round::Connections => Some(Round::Sequences),
            Round::Sequences => Some(Round::Walls),
            Round::Walls => Some(Round::Vowels),
            Round::Vowels => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Round::Start => "start",
            Round::Connections => "connections",
            Round::Sequences => "sequences",
            Round::Walls => "walls",
            Round::Vowels => "vowels",
        }
    }

    /// Number of headings the round must contain, if it is bounded.
    pub fn required_elements(self) -> Option<usize> {
        match self {
            Round::Connections | Round::Sequences => Some(PUZZLES_PER_ROUND),
            Round::Walls => Some(WALL_GROUPS),
            Round::Start | Round::Vowels => None,
        }
    }

    /// What one heading opens in this round, for error messages.
    pub fn element_noun(self) -> &'static str {
        match self {
            Round::Walls => "groups",
            Round::Vowels => "categories",
            _ => "puzzles",
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ──────────────────────────────────────────────
// Clues
// ──────────────────────────────────────────────

/// An inline `data:<mime>;base64,<payload>` artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataUri(String);

impl DataUri {
    /// Build from a mime type and an already base64-encoded payload.
    pub fn from_base64(mime: &str, payload: &str) -> Self {
        DataUri(format!("data:{};base64,{}", mime, payload))
    }

    /// Wrap a string that is already a data URI, e.g. one read back from
    /// the cache. Returns `None` if it does not look like one.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let rest = raw.strip_prefix("data:")?;
        let (meta, _) = rest.split_once(',')?;
        if !meta.ends_with(";base64") {
            return None;
        }
        Some(DataUri(raw))
    }

    pub fn mime(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|r| r.split_once(';'))
            .map(|(m, _)| m)
            .unwrap_or_default()
    }

    /// The base64 payload after the comma.
    pub fn payload(&self) -> &str {
        self.0.split_once(',').map(|(_, p)| p).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One unit of evidence shown to players.
///
/// Media clues in the connections and sequences rounds carry a caption
/// (the answer revealed under the picture or sound); in the walls round
/// and as the life token they stand alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ClueRepr", try_from = "ClueRepr")]
pub enum Clue {
    Text(String),
    Html(String),
    Image {
        data: DataUri,
        caption: Option<String>,
    },
    Audio {
        data: DataUri,
        caption: Option<String>,
    },
}

impl Clue {
    pub fn is_media(&self) -> bool {
        matches!(self, Clue::Image { .. } | Clue::Audio { .. })
    }
}

/// Wire form of a clue: an object holding only the fields that apply.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ClueRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<DataUri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<DataUri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl From<Clue> for ClueRepr {
    fn from(clue: Clue) -> Self {
        match clue {
            Clue::Text(text) => ClueRepr {
                text: Some(text),
                ..Default::default()
            },
            Clue::Html(html) => ClueRepr {
                html: Some(html),
                ..Default::default()
            },
            Clue::Image { data, caption } => ClueRepr {
                image: Some(data),
                text: caption,
                ..Default::default()
            },
            Clue::Audio { data, caption } => ClueRepr {
                audio: Some(data),
                text: caption,
                ..Default::default()
            },
        }
    }
}

impl TryFrom<ClueRepr> for Clue {
    type Error = String;

    fn try_from(repr: ClueRepr) -> Result<Self, Self::Error> {
        match repr {
            ClueRepr {
                image: Some(data),
                audio: None,
                html: None,
                text,
            } => Ok(Clue::Image {
                data,
                caption: text,
            }),
            ClueRepr {
                image: None,
                audio: Some(data),
                html: None,
                text,
            } => Ok(Clue::Audio {
                data,
                caption: text,
            }),
            ClueRepr {
                image: None,
                audio: None,
                html: Some(html),
                text: None,
            } => Ok(Clue::Html(html)),
            ClueRepr {
                image: None,
                audio: None,
                html: None,
                text: Some(text),
            } => Ok(Clue::Text(text)),
            _ => Err("clue must have exactly one of image, audio, html or text".to_owned()),
        }
    }
}

// ──────────────────────────────────────────────
// Rounds
// ──────────────────────────────────────────────

/// A connections or sequences puzzle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub solution: String,
    #[serde(rename = "data")]
    pub clues: Vec<Clue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallGroup {
    pub solution: String,
    #[serde(rename = "data")]
    pub clues: Vec<Clue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WallPuzzle {
    pub groups: Vec<WallGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VowelEntry {
    ClueSolutionPair { clue: String, solution: String },
    SolutionOnly { solution: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelCategory {
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(rename = "data")]
    pub entries: Vec<VowelEntry>,
}

/// Global settings that apply across rounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(
        rename = "wallLifeToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub wall_life_token: Option<Clue>,
}

/// The compiled game.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub meta: Meta,
    pub connections: Vec<Puzzle>,
    pub sequences: Vec<Puzzle>,
    pub walls: Vec<WallPuzzle>,
    pub vowels: Vec<VowelCategory>,
}

impl Document {
    /// Compact JSON, as consumed by the front end.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Every clue in the document, in file order (life token first).
    pub fn clues(&self) -> impl Iterator<Item = &Clue> {
        self.meta
            .wall_life_token
            .iter()
            .chain(self.connections.iter().flat_map(|p| p.clues.iter()))
            .chain(self.sequences.iter().flat_map(|p| p.clues.iter()))
            .chain(
                self.walls
                    .iter()
                    .flat_map(|w| w.groups.iter())
                    .flat_map(|g| g.clues.iter()),
            )
    }
}
