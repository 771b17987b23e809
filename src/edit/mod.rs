//! Editing an image with a natural-language instruction.

pub mod editor;
pub mod model;

#[cfg(test)]
pub(crate) mod fake;

pub use editor::{EditClient, Error, GENERIC_FAILURE_MESSAGE};
pub use model::{extract_inline_image, EditRequest, EditResult, FALLBACK_MEDIA_TYPE};
