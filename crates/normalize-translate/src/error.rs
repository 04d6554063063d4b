use normalize_language_meta::Language;

/// Failures that abort a translation.
///
/// Everything else degrades the output and is reported through
/// [`normalize_surface_syntax::Degradation`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("no generator available for {target}")]
    NoGeneratorAvailable { target: Language },

    /// Kept for callers that match exhaustively; resolution always ends in
    /// a fallback path.
    #[error("no translation path from {from} to {to}")]
    PathResolutionExhausted { from: Language, to: Language },
}
