use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a compile failure. Every kind is fatal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Round directive out of turn, or content before `!connections`.
    StructuralOrder,
    /// Wrong number of puzzles, groups, or clues.
    Cardinality,
    /// A media clue or vowel pair left waiting for its second line.
    IncompleteAssembly,
    /// Audio in the walls round or as the life token.
    UnsupportedMedia,
    /// Non-integer audio start or duration.
    ParameterFormat,
    /// Life token set twice.
    DuplicateConfiguration,
    /// The image or audio resolver failed.
    MediaResolution,
    /// Clue line before any heading line in the round.
    NoOpenPuzzle,
    /// The input script itself could not be read.
    Io,
}

/// A compile error. Always carries the 1-based line of the offending input
/// line (0 when the failure is not tied to a line).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, file: &str, line: u32, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn io(file: &str, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Io, file, 0, message)
    }

    pub fn unexpected_round_order(file: &str, line: u32, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::StructuralOrder, file, line, message)
    }

    pub fn premature_end_of_file(file: &str, line: u32, reached: &str) -> Self {
        CompileError::new(
            ErrorKind::StructuralOrder,
            file,
            line,
            format!(
                "file ended in the {} stage, all four stages (connections, sequences, walls, vowels) are required",
                reached
            ),
        )
    }

    pub fn wrong_element_count(
        file: &str,
        line: u32,
        what: &str,
        expected: usize,
        got: usize,
    ) -> Self {
        CompileError::new(
            ErrorKind::Cardinality,
            file,
            line,
            format!("{}, expected {}, got {}", what, expected, got),
        )
    }

    pub fn too_many_elements(file: &str, line: u32, what: &str, limit: usize) -> Self {
        CompileError::new(
            ErrorKind::Cardinality,
            file,
            line,
            format!("{}, expected {}", what, limit),
        )
    }

    pub fn incomplete_clue(file: &str, line: u32, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::IncompleteAssembly, file, line, message)
    }

    pub fn audio_not_supported(file: &str, line: u32, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::UnsupportedMedia, file, line, message)
    }

    pub fn audio_not_supported_in_walls(file: &str, line: u32) -> Self {
        CompileError::audio_not_supported(file, line, "audio not supported in walls")
    }

    pub fn malformed_audio_parameters(file: &str, line: u32, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::ParameterFormat, file, line, message)
    }

    pub fn duplicate_life_token(file: &str, line: u32) -> Self {
        CompileError::new(
            ErrorKind::DuplicateConfiguration,
            file,
            line,
            "custom wall life token already defined",
        )
    }

    pub fn media_resolution_failed(file: &str, line: u32, cause: impl fmt::Display) -> Self {
        CompileError::new(ErrorKind::MediaResolution, file, line, cause.to_string())
    }

    pub fn no_open_puzzle(file: &str, line: u32) -> Self {
        CompileError::new(
            ErrorKind::NoOpenPuzzle,
            file,
            line,
            "puzzle should start with a solution or category (line beginning with a dash)",
        )
    }

    /// Serialize to JSON with every field present.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "file":    self.file,
            "kind":    self.kind,
            "line":    self.line,
            "message": self.message,
        })
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "error in {}: {}", self.file, self.message)
        } else {
            write!(
                f,
                "error at {} line {}: {}",
                self.file, self.line, self.message
            )
        }
    }
}

impl std::error::Error for CompileError {}
