//! # Prelude for the agrivision crate
//!
//! This module re-exports the most commonly used types for convenience.
//!
//! ```rust,ignore
//! use agrivision::prelude::*;
//! ```

pub use crate::client::{Error as ClientError, GeminiClient, GenerateContent};
pub use crate::config::Config;
pub use crate::edit::{EditClient, EditResult, Error as EditError};
pub use crate::encode::EncodedImage;
pub use crate::session::{EditStatus, Session, EXAMPLE_PROMPTS};
