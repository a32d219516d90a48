#![allow(dead_code)]

use connect_core::{AudioRequest, DataUri, ImageRequest, MediaResolver, ResolveError};
use std::cell::RefCell;

/// Resolver that records every request and returns a deterministic
/// artifact derived from the reference.
#[derive(Default)]
pub struct RecordingResolver {
    pub calls: RefCell<Vec<String>>,
    pub fail_on: Option<String>,
}

impl RecordingResolver {
    pub fn failing_on(reference: &str) -> Self {
        RecordingResolver {
            fail_on: Some(reference.to_owned()),
            ..Default::default()
        }
    }

    fn record(&self, reference: &str) -> Result<(), ResolveError> {
        self.calls.borrow_mut().push(reference.to_owned());
        if self.fail_on.as_deref() == Some(reference) {
            return Err(format!("failed to download {}", reference).into());
        }
        Ok(())
    }
}

impl MediaResolver for RecordingResolver {
    fn resolve_image(&self, request: &ImageRequest) -> Result<DataUri, ResolveError> {
        let reference = request.source.reference();
        self.record(reference)?;
        Ok(DataUri::from_base64("image/png", &reference.len().to_string()))
    }

    fn resolve_audio(&self, request: &AudioRequest) -> Result<DataUri, ResolveError> {
        let reference = request.source.reference();
        self.record(reference)?;
        Ok(DataUri::from_base64(
            "audio/mpeg",
            &format!("{}-{}", request.start, request.duration),
        ))
    }
}

fn literal_puzzles(out: &mut String, prefix: &str, count: usize) {
    for p in 0..count {
        out.push_str(&format!("- {} {}\n", prefix, p));
        for c in 0..4 {
            out.push_str(&format!("  {} clue {}.{}  \n", prefix, p, c));
        }
    }
}

/// Connections section with six literal puzzles.
pub fn connections() -> String {
    let mut s = String::from("!connections\n");
    literal_puzzles(&mut s, "conn", 6);
    s
}

pub fn sequences_with(count: usize) -> String {
    let mut s = String::from("!sequences\n");
    literal_puzzles(&mut s, "seq", count);
    s
}

pub fn walls() -> String {
    let mut s = String::from("!walls\n");
    literal_puzzles(&mut s, "wall", 8);
    s
}

pub fn vowels() -> String {
    "!vowels\n-Capitals\n=France\nPRS\nLNDN\n=Italy\nRM\nBRLN\n-Rivers\nTHMS\nSNN\nDNB\nRHN\n"
        .to_owned()
}

/// A complete, all-literal script.
pub fn literal_script() -> String {
    format!(
        "# generated quiz\n\n{}{}{}{}",
        connections(),
        sequences_with(6),
        walls(),
        vowels()
    )
}
