//! Wire contract of the image-processing backend.

use serde::{Deserialize, Serialize};

use crate::domain::{font_size_multiplier, CardFields};

pub const PROCESS_IMAGE_PATH: &str = "process-image";

pub const FIELD_IMAGE: &str = "image";
pub const FIELD_WISHES_TEXT: &str = "wishes_text";
pub const FIELD_NAME_TEXT: &str = "name_text";
pub const FIELD_TEXT_LINES: &str = "text_lines";
pub const FIELD_WISHES_FONT_SIZE_MULTIPLIER: &str = "wishes_font_size_multiplier";
pub const FIELD_NAME_FONT_SIZE_MULTIPLIER: &str = "name_font_size_multiplier";

pub const DEFAULT_UPLOAD_MIME: &str = "application/octet-stream";

/// Optional JSON body of a failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    /// Returns the server message, or `None` when the body is not the expected
    /// JSON or the message is blank.
    pub fn parse(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .map(|parsed| parsed.error)
            .filter(|message| !message.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CardSubmission {
    pub image: ImageUpload,
    pub fields: CardFields,
}

impl CardSubmission {
    /// Text parts of the multipart body, in wire order after `image`.
    pub fn text_parts(&self) -> Vec<(&'static str, String)> {
        vec![
            (FIELD_WISHES_TEXT, self.fields.wishes_text.clone()),
            (FIELD_NAME_TEXT, self.fields.name_text.clone()),
            (FIELD_TEXT_LINES, self.fields.text_lines.clone()),
            (
                FIELD_WISHES_FONT_SIZE_MULTIPLIER,
                font_size_multiplier(self.fields.wishes_font_size).to_string(),
            ),
            (
                FIELD_NAME_FONT_SIZE_MULTIPLIER,
                font_size_multiplier(self.fields.name_font_size).to_string(),
            ),
        ]
    }
}
