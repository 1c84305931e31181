//! Card form controller: selection, field mirroring, and the request lifecycle.
//!
//! The controller is owned by the UI thread. Asynchronous work (reading the
//! preview, the backend call) happens elsewhere and is reported back through
//! [`FormController::preview_loaded`], [`FormController::preview_failed`] and
//! [`FormController::finish_submit`].

use std::{collections::VecDeque, path::PathBuf};

use shared::{
    domain::{CardFields, FontSlider, RequestId, ResultId, SelectionId},
    error::{SubmitError, ValidationError},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Generate,
    Regenerate,
}

/// States a request can come to rest in between user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Idle,
    Success,
    Error(Trigger),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Validating { from: Settled },
    InFlight { request_id: RequestId, trigger: Trigger },
    Success,
    Error { trigger: Trigger },
}

impl From<Settled> for RequestState {
    fn from(value: Settled) -> Self {
        match value {
            Settled::Idle => Self::Idle,
            Settled::Success => Self::Success,
            Settled::Error(trigger) => Self::Error { trigger },
        }
    }
}

/// Visibility and enablement of every widget the request lifecycle touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub preview_visible: bool,
    pub loading_visible: bool,
    pub output_visible: bool,
    pub download_visible: bool,
    pub generate_visible: bool,
    pub regenerate_visible: bool,
    pub triggers_enabled: bool,
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight { .. })
    }

    fn visible_trigger(&self) -> Trigger {
        match self {
            Self::Idle => Trigger::Generate,
            Self::Success => Trigger::Regenerate,
            Self::Validating { from } => RequestState::from(*from).visible_trigger(),
            Self::InFlight { trigger, .. } | Self::Error { trigger } => *trigger,
        }
    }

    /// The show/hide/enable matrix for this state. Preview visibility is
    /// owned by the selection and filled in by [`FormController::view`].
    pub fn view(&self) -> ViewState {
        let trigger = self.visible_trigger();
        let mut view = ViewState {
            preview_visible: false,
            loading_visible: false,
            output_visible: false,
            download_visible: false,
            generate_visible: trigger == Trigger::Generate,
            regenerate_visible: trigger == Trigger::Regenerate,
            triggers_enabled: true,
        };
        match self {
            Self::Idle | Self::Error { .. } => {}
            Self::Success => {
                view.output_visible = true;
                view.download_visible = true;
            }
            Self::Validating { from } => {
                view = RequestState::from(*from).view();
                view.triggers_enabled = false;
            }
            Self::InFlight { .. } => {
                view.loading_visible = true;
                view.triggers_enabled = false;
            }
        }
        view
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub id: SelectionId,
    pub path: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PreviewState {
    #[default]
    Hidden,
    Loading(SelectionId),
    Shown(SelectionId),
}

/// A generated card held until it is superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardResult {
    pub id: ResultId,
    pub bytes: Vec<u8>,
    pub download_name: String,
}

/// Everything the backend needs to run one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub request_id: RequestId,
    pub image: SelectedImage,
    pub fields: CardFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStart {
    Dispatch(CardDraft),
    Rejected(ValidationError),
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The completion did not belong to the request in flight.
    Stale,
    Succeeded(ResultId),
    Failed { alert: String },
}

#[derive(Debug, Default)]
pub struct FormController {
    fields: CardFields,
    selection: Option<SelectedImage>,
    preview: PreviewState,
    state: RequestState,
    result: Option<CardResult>,
    alerts: VecDeque<String>,
    next_selection: SelectionId,
    next_request: RequestId,
    next_result: ResultId,
}

impl FormController {
    pub fn new(fields: CardFields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn fields(&self) -> &CardFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut CardFields {
        &mut self.fields
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn selection(&self) -> Option<&SelectedImage> {
        self.selection.as_ref()
    }

    pub fn result(&self) -> Option<&CardResult> {
        self.result.as_ref()
    }

    pub fn view(&self) -> ViewState {
        let mut view = self.state.view();
        view.preview_visible = matches!(self.preview, PreviewState::Shown(_));
        view
    }

    /// Handles a pick from the upload control. Returns the id the caller must
    /// tag its preview read with, or `None` when the pick was cancelled.
    pub fn select_image(&mut self, path: Option<PathBuf>) -> Option<SelectionId> {
        let Some(path) = path else {
            debug!("image selection cleared");
            self.selection = None;
            self.preview = PreviewState::Hidden;
            return None;
        };

        self.next_selection = self.next_selection.next();
        let id = self.next_selection;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!(selection = id.0, file = %file_name, "image selected");

        self.selection = Some(SelectedImage {
            id,
            path,
            file_name,
        });
        self.preview = PreviewState::Loading(id);
        self.reset_result_view();
        Some(id)
    }

    /// A pick that cannot be used still replaces the previous one: the
    /// selection is cleared, the result view reset and `message` raised.
    pub fn reject_selection(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "image selection rejected");
        self.selection = None;
        self.preview = PreviewState::Hidden;
        self.reset_result_view();
        self.raise_alert(message);
    }

    fn reset_result_view(&mut self) {
        self.release_result();
        self.state = match self.state {
            RequestState::InFlight { request_id, .. } => RequestState::InFlight {
                request_id,
                trigger: Trigger::Generate,
            },
            _ => RequestState::Idle,
        };
    }

    /// Returns `true` when the preview belongs to the current selection and should be shown.
    pub fn preview_loaded(&mut self, id: SelectionId) -> bool {
        if self.preview != PreviewState::Loading(id) {
            debug!(selection = id.0, "dropping stale preview");
            return false;
        }
        self.preview = PreviewState::Shown(id);
        true
    }

    /// An unreadable selection is dropped entirely so it cannot be submitted.
    pub fn preview_failed(&mut self, id: SelectionId, reason: &str) -> bool {
        if self.preview != PreviewState::Loading(id) {
            debug!(selection = id.0, "dropping stale preview failure");
            return false;
        }
        warn!(selection = id.0, %reason, "failed to read selected image");
        self.preview = PreviewState::Hidden;
        self.selection = None;
        self.raise_alert(format!("Could not read the selected image: {reason}"));
        true
    }

    pub fn set_font_size(&mut self, slider: FontSlider, value: u32) {
        *self.fields.font_size_mut(slider) = value;
    }

    /// Literal readout paired with a slider.
    pub fn font_readout(&self, slider: FontSlider) -> String {
        self.fields.font_size(slider).to_string()
    }

    fn validate(&self) -> Result<SelectedImage, ValidationError> {
        let image = self
            .selection
            .clone()
            .ok_or(ValidationError::MissingImage)?;
        if self.fields.wishes_text.trim().is_empty() {
            return Err(ValidationError::MissingWishesText);
        }
        if self.fields.name_text.trim().is_empty() {
            return Err(ValidationError::MissingNameText);
        }
        Ok(image)
    }

    /// Shared by both trigger controls.
    pub fn begin_submit(&mut self) -> SubmitStart {
        let from = match self.state {
            RequestState::InFlight { .. } | RequestState::Validating { .. } => {
                debug!("submit ignored while a request is in flight");
                return SubmitStart::Busy;
            }
            RequestState::Idle => Settled::Idle,
            RequestState::Success => Settled::Success,
            RequestState::Error { trigger } => Settled::Error(trigger),
        };
        self.state = RequestState::Validating { from };

        let image = match self.validate() {
            Ok(image) => image,
            Err(err) => {
                info!(reason = ?err, "submit rejected before dispatch");
                self.state = from.into();
                self.raise_alert(err.to_string());
                return SubmitStart::Rejected(err);
            }
        };

        self.next_request = self.next_request.next();
        let request_id = self.next_request;
        let trigger = self.state.visible_trigger();
        self.release_result();
        self.state = RequestState::InFlight {
            request_id,
            trigger,
        };
        info!(request = request_id.0, file = %image.file_name, "dispatching card request");

        SubmitStart::Dispatch(CardDraft {
            request_id,
            image,
            fields: self.fields.clone(),
        })
    }

    pub fn finish_submit(
        &mut self,
        request_id: RequestId,
        outcome: Result<Vec<u8>, SubmitError>,
    ) -> Completion {
        let trigger = match self.state {
            RequestState::InFlight {
                request_id: current,
                trigger,
            } if current == request_id => trigger,
            _ => {
                warn!(request = request_id.0, "ignoring completion for a request not in flight");
                return Completion::Stale;
            }
        };

        match outcome {
            Ok(bytes) => {
                self.next_result = self.next_result.next();
                let id = self.next_result;
                let download_name = self.fields.download_file_name();
                info!(
                    request = request_id.0,
                    result = id.0,
                    size_bytes = bytes.len(),
                    file = %download_name,
                    "card generated"
                );
                self.result = Some(CardResult {
                    id,
                    bytes,
                    download_name,
                });
                self.state = RequestState::Success;
                Completion::Succeeded(id)
            }
            Err(err) => {
                warn!(request = request_id.0, error = %err, "card request failed");
                let alert = err.alert_message();
                self.state = RequestState::Error { trigger };
                self.raise_alert(alert.clone());
                Completion::Failed { alert }
            }
        }
    }

    fn release_result(&mut self) {
        if let Some(released) = self.result.take() {
            debug!(result = released.id.0, "released previous card");
        }
    }

    pub fn raise_alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
