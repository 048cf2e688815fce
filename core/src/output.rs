//! Transcript output rendering.

use crate::transcribe::Segment;

/// Render segments as a single compact JSON array line.
///
/// Objects keep the field order `start`, `end`, `text` and the encoding
/// adds no whitespace. Non-ASCII text is emitted literally, not escaped.
pub fn render_json(segments: &[Segment]) -> Result<String, serde_json::Error> {
    serde_json::to_string(segments)
}
