//! # agrivision
//!
//! Edit farm photographs with a natural-language instruction using Gemini's
//! image model.
//!
//! A local file becomes an [`EncodedImage`], an [`EditClient`] sends it along
//! with the instruction in a single `generateContent` call, and the first inline
//! image of the reply comes back as an [`EditResult`]. [`Session`] wraps that
//! exchange in the select / submit / reset / download lifecycle of a front end.

mod client;
mod config;
mod edit;
mod encode;
mod models;
mod session;

pub mod prelude;


pub use client::{Error as ClientError, GeminiClient, GenerateContent, DEFAULT_MODEL};
pub use config::{Config, Error as ConfigError};
pub use edit::{
    extract_inline_image, EditClient, EditRequest, EditResult, Error as EditError,
    FALLBACK_MEDIA_TYPE, GENERIC_FAILURE_MESSAGE,
};
pub use encode::{EncodedImage, Error as EncodeError};
pub use models::{
    Blob, Candidate, Content, FinishReason, GenerateContentRequest, GenerationResponse, Part,
    PromptFeedback, Role,
};
pub use session::{
    EditStatus, Error as SessionError, PendingEdit, Session, DOWNLOAD_FILE_NAME, EXAMPLE_PROMPTS,
};
