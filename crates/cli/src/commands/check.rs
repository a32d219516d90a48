use std::path::Path;

use connect_core::{Document, OfflineResolver};

use crate::commands::fail_compile;
use crate::OutputFormat;

/// Parse the whole script without touching the network or the cache.
pub(crate) fn cmd_check(file: &Path, output: OutputFormat, quiet: bool) {
    let doc = match connect_core::compile(file, &OfflineResolver) {
        Ok(doc) => doc,
        Err(e) => fail_compile(&e, output, quiet),
    };
    if quiet {
        return;
    }
    let summary = Summary::of(&doc);
    match output {
        OutputFormat::Text => println!(
            "ok: {} connections, {} sequences, {} walls, {} vowel categories, {} media clues",
            summary.connections, summary.sequences, summary.walls, summary.vowels, summary.media
        ),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": true,
                "connections": summary.connections,
                "sequences": summary.sequences,
                "walls": summary.walls,
                "vowels": summary.vowels,
                "media": summary.media,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
}

struct Summary {
    connections: usize,
    sequences: usize,
    walls: usize,
    vowels: usize,
    media: usize,
}

impl Summary {
    fn of(doc: &Document) -> Self {
        Summary {
            connections: doc.connections.len(),
            sequences: doc.sequences.len(),
            walls: doc.walls.len(),
            vowels: doc.vowels.len(),
            media: doc.clues().filter(|c| c.is_media()).count(),
        }
    }
}
