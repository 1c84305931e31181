//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

use client_core::CardDraft;
use shared::domain::SelectionId;

pub enum BackendCommand {
    LoadPreview {
        selection: SelectionId,
        path: PathBuf,
    },
    ProcessCard {
        draft: CardDraft,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadPreview { .. } => "load_preview",
            BackendCommand::ProcessCard { .. } => "process_card",
        }
    }
}
