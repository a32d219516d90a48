//! connect-core: quiz script compiler core.
//!
//! Turns a line-oriented quiz script (connections, sequences, walls, and
//! vowels rounds) into a [`Document`] ready to be serialized for the game
//! front end.
//!
//! # Public API
//!
//! - [`compile()`], [`compile_str()`] -- run the whole pipeline
//! - [`classify()`] -- pure classification of a single clue line
//! - [`StageMachine`] -- the line-by-line parser, for per-transition use
//! - [`MediaResolver`] -- the seam media resolvers plug into
//! - [`CompileError`] -- line-numbered compile error
//!
//! Media references are resolved through a [`MediaResolver`]; the core
//! itself performs no network or media I/O.

pub mod builder;
pub mod classify;
pub mod compile;
pub mod error;
pub mod model;
pub mod resolve;
pub mod source;
pub mod stage;

// ── Convenience re-exports: key types ────────────────────────────────

pub use classify::{AudioRequest, ClueForm, ImageRequest, MediaSource};
pub use error::{CompileError, ErrorKind};
pub use model::{
    Clue, DataUri, Document, Meta, Puzzle, Round, VowelCategory, VowelEntry, WallGroup,
    WallPuzzle,
};
pub use resolve::{MediaResolver, OfflineResolver, PartialMediaClue, ResolveError, Resolved};
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
pub use stage::StageMachine;

// ── Convenience re-exports: entry points ─────────────────────────────

pub use classify::classify;
pub use compile::{compile, compile_str, compile_with_provider};
