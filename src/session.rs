//! The edit lifecycle of a single user.
//!
//! A [`Session`] holds the selected image, the instruction being typed, and the
//! outcome of the last submission. It moves through
//! `Idle -> InFlight -> Succeeded | Failed` and back to a blank `Idle` on
//! [`Session::reset`]. Every reset or new image bumps an epoch, and an outcome
//! whose epoch no longer matches is dropped, so a slow response can never
//! overwrite newer state.
//!
//! ```no_run
//! use agrivision::prelude::*;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EditClient::from_config(&Config::from_env()?);
//! let mut session = Session::new();
//! session.load_image(EncodedImage::from_path("field.jpg").await?);
//! session.set_instruction("Add a red tractor in the background");
//!
//! if session.submit(&client).await == EditStatus::Succeeded {
//!     let saved = session.download(".").await?;
//!     println!("saved {}", saved.display());
//! } else if let Some(message) = session.error_message() {
//!     eprintln!("{message}");
//! }
//! # Ok(())
//! # }
//! ```

use snafu::{OptionExt, ResultExt, Snafu};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{
    client::GenerateContent,
    edit::{EditClient, EditRequest, EditResult, Error as EditError},
    encode::{self, EncodedImage},
};

/// File name used when saving the displayed result.
pub const DOWNLOAD_FILE_NAME: &str = "agrivision-edited.png";

/// Ready-made instructions offered next to the prompt box.
pub const EXAMPLE_PROMPTS: [&str; 5] = [
    "Add a red tractor in the background",
    "Show the field with ripe corn ready for harvest",
    "Add a rustic wooden fence around the crop",
    "Simulate a rainy day effect over the farm",
    "Highlight areas that look dry",
];

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("there is no edited image to download"))]
    NoResult,

    #[snafu(display("edited image data is corrupt"))]
    DecodeResult { source: encode::Error },

    #[snafu(display("failed to write edited image to '{}'", path.display()))]
    WriteFile {
        source: std::io::Error,
        path: PathBuf,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EditStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// A submission that has left the session and awaits its outcome.
#[derive(Debug)]
pub struct PendingEdit {
    epoch: u64,
    request: EditRequest,
}

impl PendingEdit {
    pub fn request(&self) -> &EditRequest {
        &self.request
    }
}

#[derive(Debug, Default)]
pub struct Session {
    image: Option<EncodedImage>,
    instruction: String,
    status: EditStatus,
    result: Option<EditResult>,
    error: Option<String>,
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn status(&self) -> EditStatus {
        self.status
    }

    /// The edited image currently on display.
    pub fn result(&self) -> Option<&EditResult> {
        self.result.as_ref()
    }

    /// The inline error from the last failed submission.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Select a new image, discarding any previous result and any pending outcome.
    pub fn load_image(&mut self, image: EncodedImage) {
        debug!(media.type = image.media_type(), "image loaded");
        self.invalidate();
        self.image = Some(image);
    }

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = instruction.into();
    }

    /// Fill the instruction with one of [`EXAMPLE_PROMPTS`].
    pub fn use_example_prompt(&mut self, index: usize) -> Option<&'static str> {
        let prompt = EXAMPLE_PROMPTS.get(index).copied()?;
        self.instruction = prompt.to_string();
        Some(prompt)
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        self.image.is_some()
            && !self.instruction.trim().is_empty()
            && self.status != EditStatus::InFlight
    }

    /// Start a submission. Returns `None`, leaving the session untouched, when
    /// [`can_submit`](Self::can_submit) is false.
    pub fn begin_submit(&mut self) -> Option<PendingEdit> {
        if !self.can_submit() {
            return None;
        }
        let image = self.image.clone()?;
        let request = EditRequest::new(image, &self.instruction).ok()?;

        self.status = EditStatus::InFlight;
        self.error = None;
        Some(PendingEdit {
            epoch: self.epoch,
            request,
        })
    }

    /// Apply the outcome of a submission. Returns `false` when the outcome is
    /// stale (the session was reset or given a new image meanwhile) and was dropped.
    pub fn complete(&mut self, pending: PendingEdit, outcome: Result<EditResult, EditError>) -> bool {
        if pending.epoch != self.epoch {
            debug!(
                pending.epoch = pending.epoch,
                session.epoch = self.epoch,
                "dropping stale edit outcome"
            );
            return false;
        }

        match outcome {
            Ok(result) => {
                info!(media.type = result.media_type(), "edit succeeded");
                self.result = Some(result);
                self.error = None;
                self.status = EditStatus::Succeeded;
            }
            Err(err) => {
                warn!(error = %err, "edit failed");
                self.error = Some(err.user_message());
                self.status = EditStatus::Failed;
            }
        }
        true
    }

    /// Submit the current image and instruction and wait for the outcome.
    ///
    /// Returns the resulting status; when nothing could be submitted the
    /// status is unchanged and no remote call is made.
    pub async fn submit<T: GenerateContent>(&mut self, client: &EditClient<T>) -> EditStatus {
        if let Some(pending) = self.begin_submit() {
            let outcome = client.send(pending.request()).await;
            self.complete(pending, outcome);
        }
        self.status
    }

    /// Return to the pre-upload state.
    pub fn reset(&mut self) {
        self.invalidate();
        self.image = None;
        self.instruction.clear();
    }

    /// The displayed result as a `data:` URL.
    pub fn result_data_url(&self) -> Option<String> {
        self.result.as_ref().map(EditResult::to_data_url)
    }

    /// Save the displayed result into `dir` as [`DOWNLOAD_FILE_NAME`].
    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf, Error> {
        let result = self.result.as_ref().context(NoResultSnafu)?;
        let bytes = result.decode().context(DecodeResultSnafu)?;
        let path = dir.as_ref().join(DOWNLOAD_FILE_NAME);
        tokio::fs::write(&path, &bytes)
            .await
            .context(WriteFileSnafu { path: &path })?;
        info!(path = %path.display(), file.size = bytes.len(), "edited image saved");
        Ok(path)
    }

    fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.result = None;
        self.error = None;
        self.status = EditStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::fake::FakeTransport;
    use std::sync::Arc;

    const PNG_B64: &str = "iVBORw0KGgo=";

    fn field_photo() -> EncodedImage {
        EncodedImage::from_bytes([0xFF, 0xD8, 0xFF, 0xD9], "image/jpeg")
    }

    fn client(transport: &Arc<FakeTransport>) -> EditClient<Arc<FakeTransport>> {
        EditClient::new(transport.clone(), Some("key".to_string()))
    }

    fn ready_session() -> Session {
        let mut session = Session::new();
        session.load_image(field_photo());
        session.set_instruction("Add a red tractor in the background");
        session
    }

    #[test]
    fn new_session_is_pre_upload() {
        let session = Session::new();
        assert_eq!(session.status(), EditStatus::Idle);
        assert!(session.image().is_none());
        assert!(!session.can_submit());
    }

    #[tokio::test]
    async fn blank_instruction_never_submits() {
        let transport = Arc::new(FakeTransport::png(PNG_B64));
        let mut session = Session::new();
        session.load_image(field_photo());

        for blank in ["", "   ", "\n\t"] {
            session.set_instruction(blank);
            assert!(!session.can_submit());
            assert_eq!(session.submit(&client(&transport)).await, EditStatus::Idle);
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn no_image_never_submits() {
        let transport = Arc::new(FakeTransport::png(PNG_B64));
        let mut session = Session::new();
        session.set_instruction("Add a red tractor in the background");
        assert_eq!(session.submit(&client(&transport)).await, EditStatus::Idle);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn success_displays_result() {
        let transport = Arc::new(FakeTransport::png(PNG_B64));
        let mut session = ready_session();

        assert_eq!(session.submit(&client(&transport)).await, EditStatus::Succeeded);
        assert_eq!(session.result(), Some(&EditResult::new("image/png", PNG_B64)));
        assert_eq!(
            session.result_data_url().as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
        assert_eq!(session.error_message(), None);
    }

    #[tokio::test]
    async fn reset_after_success_returns_to_pre_upload() {
        let transport = Arc::new(FakeTransport::png(PNG_B64));
        let mut session = ready_session();
        session.submit(&client(&transport)).await;

        session.reset();
        assert_eq!(session.status(), EditStatus::Idle);
        assert!(session.result().is_none());
        assert!(session.result_data_url().is_none());
        assert!(session.image().is_none());
        assert_eq!(session.instruction(), "");
    }

    #[tokio::test]
    async fn failure_keeps_session_ready_to_retry() {
        let failing = Arc::new(FakeTransport::failing(500, Some("Internal error encountered.")));
        let mut session = ready_session();

        assert_eq!(session.submit(&client(&failing)).await, EditStatus::Failed);
        assert_eq!(session.error_message(), Some("Internal error encountered."));
        assert!(session.can_submit());

        let working = Arc::new(FakeTransport::png(PNG_B64));
        assert_eq!(session.submit(&client(&working)).await, EditStatus::Succeeded);
        assert_eq!(session.error_message(), None);
    }

    #[test]
    fn in_flight_blocks_second_submit() {
        let mut session = ready_session();
        let pending = session.begin_submit().unwrap();
        assert_eq!(session.status(), EditStatus::InFlight);
        assert!(!session.can_submit());
        assert!(session.begin_submit().is_none());
        assert_eq!(
            pending.request().instruction(),
            "Add a red tractor in the background"
        );
    }

    #[test]
    fn stale_outcome_after_reset_is_dropped() {
        let mut session = ready_session();
        let pending = session.begin_submit().unwrap();
        session.reset();

        assert!(!session.complete(pending, Ok(EditResult::new("image/png", PNG_B64))));
        assert_eq!(session.status(), EditStatus::Idle);
        assert!(session.result().is_none());
    }

    #[test]
    fn stale_outcome_after_new_image_is_dropped() {
        let mut session = ready_session();
        let pending = session.begin_submit().unwrap();
        session.load_image(EncodedImage::from_bytes(b"other", "image/png"));

        assert!(!session.complete(pending, Err(EditError::Configuration)));
        assert_eq!(session.status(), EditStatus::Idle);
        assert_eq!(session.error_message(), None);
    }

    #[test]
    fn example_prompts_fill_instruction() {
        let mut session = Session::new();
        assert_eq!(
            session.use_example_prompt(3),
            Some("Simulate a rainy day effect over the farm")
        );
        assert_eq!(session.instruction(), EXAMPLE_PROMPTS[3]);
        assert_eq!(session.use_example_prompt(EXAMPLE_PROMPTS.len()), None);
    }

    #[tokio::test]
    async fn download_writes_decoded_bytes() {
        let transport = Arc::new(FakeTransport::png(PNG_B64));
        let mut session = ready_session();
        session.submit(&client(&transport)).await;

        let dir = tempfile::tempdir().unwrap();
        let path = session.download(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join(DOWNLOAD_FILE_NAME));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
        );
    }

    #[tokio::test]
    async fn download_without_result_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::new().download(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::NoResult));
    }
}
