use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    error::SubmitError,
    protocol::{CardSubmission, ErrorBody, ImageUpload, DEFAULT_UPLOAD_MIME, FIELD_IMAGE},
};
use tracing::{debug, info, warn};
use url::Url;

pub mod controller;
pub mod settings;

pub use controller::{
    CardDraft, CardResult, Completion, FormController, RequestState, SelectedImage, Settled,
    SubmitStart, Trigger, ViewState,
};
pub use settings::{load_settings, ClientSettings, SettingsError};

/// Seam between the form and whatever turns a submission into a card image.
#[async_trait]
pub trait CardProcessor: Send + Sync {
    async fn process_image(&self, submission: CardSubmission) -> Result<Vec<u8>, SubmitError>;
}

pub struct HttpCardProcessor {
    http: Client,
    endpoint: Url,
}

impl HttpCardProcessor {
    pub fn new(settings: &ClientSettings) -> Result<Self, SettingsError> {
        let endpoint = settings.process_image_url()?;
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|err| SettingsError::HttpClient(err.to_string()))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Reads the selected file for upload, guessing its MIME type from the extension.
pub async fn read_upload(path: &Path, file_name: &str) -> std::io::Result<ImageUpload> {
    let bytes = tokio::fs::read(path).await?;
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(ImageUpload {
        file_name: file_name.to_string(),
        mime_type,
        bytes,
    })
}

fn build_form(submission: CardSubmission) -> Result<Form, SubmitError> {
    let text_parts = submission.text_parts();
    let image = submission.image;
    let mime = image
        .mime_type
        .unwrap_or_else(|| DEFAULT_UPLOAD_MIME.to_string());
    let part = Part::bytes(image.bytes)
        .file_name(image.file_name)
        .mime_str(&mime)
        .map_err(|err| SubmitError::network(format!("invalid upload mime type '{mime}': {err}")))?;

    let mut form = Form::new().part(FIELD_IMAGE, part);
    for (name, value) in text_parts {
        form = form.text(name, value);
    }
    Ok(form)
}

/// Maps a failed response onto the server-reported or generic status error.
fn classify_failure(status: u16, body: &[u8]) -> SubmitError {
    match ErrorBody::parse(body) {
        Some(message) => SubmitError::ServerReported { status, message },
        None => SubmitError::Server { status },
    }
}

fn ensure_image_body(body: &[u8]) -> Result<(), SubmitError> {
    image::guess_format(body)
        .map(|_| ())
        .map_err(|err| SubmitError::network(format!("response is not a readable image: {err}")))
}

#[async_trait]
impl CardProcessor for HttpCardProcessor {
    async fn process_image(&self, submission: CardSubmission) -> Result<Vec<u8>, SubmitError> {
        let upload_bytes = submission.image.bytes.len();
        let form = build_form(submission)?;
        debug!(endpoint = %self.endpoint, upload_bytes, "posting card request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| SubmitError::network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            let err = classify_failure(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "image processing rejected");
            return Err(err);
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| SubmitError::network(err.to_string()))?;
        ensure_image_body(&body)?;
        info!(status = status.as_u16(), size_bytes = body.len(), "card image received");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
