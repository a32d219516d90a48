//! Compile entry points: script path or text in, [`Document`] out.

use crate::error::CompileError;
use crate::model::Document;
use crate::resolve::MediaResolver;
use crate::source::{FileSystemProvider, SourceProvider};
use crate::stage::StageMachine;
use std::path::Path;

/// Compile the script at `path`, reading it from the filesystem.
pub fn compile(path: &Path, resolver: &dyn MediaResolver) -> Result<Document, CompileError> {
    compile_with_provider(path, &FileSystemProvider, resolver)
}

/// Compile the script at `path` using the given [`SourceProvider`].
pub fn compile_with_provider(
    path: &Path,
    provider: &dyn SourceProvider,
    resolver: &dyn MediaResolver,
) -> Result<Document, CompileError> {
    let file = path.display().to_string();
    let src = provider
        .read_source(path)
        .map_err(|e| CompileError::io(&file, format!("cannot open file: {}", e)))?;
    compile_str(&src, &file, resolver)
}

/// Compile script text. `file` is only used in error messages.
///
/// Lines are processed strictly in order and media is resolved one line at
/// a time; the first error aborts the whole compile.
pub fn compile_str(
    src: &str,
    file: &str,
    resolver: &dyn MediaResolver,
) -> Result<Document, CompileError> {
    let mut machine = StageMachine::new(file, resolver);
    for (index, line) in src.lines().enumerate() {
        machine.feed(index as u32 + 1, line)?;
    }
    let doc = machine.finish()?;
    tracing::info!(
        file,
        connections = doc.connections.len(),
        sequences = doc.sequences.len(),
        walls = doc.walls.len(),
        vowels = doc.vowels.len(),
        "compiled"
    );
    Ok(doc)
}
