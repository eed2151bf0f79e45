use thiserror::Error;

/// Errors surfaced by the fill engine.
///
/// Only `ParseError` and `SaveError` ever escape `render`: a source
/// document that cannot be loaded or serialized aborts the whole pass.
/// The image variants exist for the embed pipeline but are caught inside
/// the render loop and converted into placeholder boxes.
#[derive(Error, Debug)]
pub enum PdfFillError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to embed image: {0}")]
    ImageEmbed(String),
}
