use async_trait::async_trait;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use crate::{
    client::{Error as ClientError, GenerateContent},
    models::{GenerateContentRequest, GenerationResponse},
};

type Responder = Box<dyn Fn() -> Result<GenerationResponse, ClientError> + Send + Sync>;

/// In-memory stand-in for the HTTP transport.
pub(crate) struct FakeTransport {
    responder: Responder,
    calls: AtomicUsize,
    last: Mutex<Option<(String, String, GenerateContentRequest)>>,
}

impl FakeTransport {
    /// Always answer with this JSON body.
    pub(crate) fn replying(body: Value) -> Self {
        Self::with(move || Ok(serde_json::from_value(body.clone()).unwrap()))
    }

    /// Always fail as if the server returned `code`.
    pub(crate) fn failing(code: u16, description: Option<&str>) -> Self {
        let description = description.map(str::to_string);
        Self::with(move || {
            Err(ClientError::BadResponse {
                code,
                description: description.clone(),
            })
        })
    }

    /// Answer with a single candidate holding a single PNG part.
    pub(crate) fn png(data: &str) -> Self {
        Self::replying(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{"inlineData": {"mimeType": "image/png", "data": data}}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        }))
    }

    fn with(
        responder: impl Fn() -> Result<GenerationResponse, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The `(api key, model, request)` of the most recent call.
    pub(crate) fn last_call(&self) -> Option<(String, String, GenerateContentRequest)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerateContent for FakeTransport {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerationResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((api_key.to_string(), model.to_string(), request.clone()));
        (self.responder)()
    }
}
