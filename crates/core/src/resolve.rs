//! Clue resolution: turns a classified line into a finished [`Clue`] or a
//! media artifact still waiting for its caption.
//!
//! Media work is delegated to a [`MediaResolver`]. The core never fetches,
//! decodes, or caches anything itself.

use crate::classify::{AudioRequest, ClueForm, ImageRequest};
use crate::model::{Clue, DataUri};

/// Boxed failure from a media resolver. The core only reports it.
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Produces embeddable artifacts for media references.
///
/// Calls are made one at a time, in file order. Implementations are
/// expected to consult a content cache keyed by the full request so that
/// resolving the same request twice yields identical bytes.
pub trait MediaResolver {
    fn resolve_image(&self, request: &ImageRequest) -> Result<DataUri, ResolveError>;

    fn resolve_audio(&self, request: &AudioRequest) -> Result<DataUri, ResolveError>;
}

/// A resolved image or audio artifact without its caption yet.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialMediaClue {
    Image(DataUri),
    Audio(DataUri),
}

impl PartialMediaClue {
    /// Complete the clue with its caption line.
    pub fn with_caption(self, caption: Option<String>) -> Clue {
        match self {
            PartialMediaClue::Image(data) => Clue::Image { data, caption },
            PartialMediaClue::Audio(data) => Clue::Audio { data, caption },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Clue(Clue),
    Partial(PartialMediaClue),
}

impl Resolved {
    /// Collapse to a self-contained clue (walls, life token): media stands
    /// alone without a caption.
    pub fn into_standalone(self) -> Clue {
        match self {
            Resolved::Clue(c) => c,
            Resolved::Partial(p) => p.with_caption(None),
        }
    }
}

/// Resolve one classified clue line.
pub fn resolve(form: ClueForm, resolver: &dyn MediaResolver) -> Result<Resolved, ResolveError> {
    match form {
        ClueForm::LiteralText(text) => Ok(Resolved::Clue(Clue::Text(text))),
        ClueForm::RawHtml(html) => Ok(Resolved::Clue(Clue::Html(html))),
        ClueForm::Image(req) => {
            tracing::debug!(reference = req.source.reference(), "resolving image");
            let data = resolver.resolve_image(&req)?;
            Ok(Resolved::Partial(PartialMediaClue::Image(data)))
        }
        ClueForm::Audio(req) => {
            tracing::debug!(
                reference = req.source.reference(),
                start = req.start,
                duration = req.duration,
                "resolving audio"
            );
            let data = resolver.resolve_audio(&req)?;
            Ok(Resolved::Partial(PartialMediaClue::Audio(data)))
        }
    }
}

// ──────────────────────────────────────────────
// OfflineResolver
// ──────────────────────────────────────────────

/// Resolver that performs no I/O and returns an empty artifact of the
/// right type. Used for structure-only checks.
pub struct OfflineResolver;

impl MediaResolver for OfflineResolver {
    fn resolve_image(&self, _request: &ImageRequest) -> Result<DataUri, ResolveError> {
        Ok(DataUri::from_base64("image/png", ""))
    }

    fn resolve_audio(&self, _request: &AudioRequest) -> Result<DataUri, ResolveError> {
        Ok(DataUri::from_base64("audio/mpeg", ""))
    }
}
