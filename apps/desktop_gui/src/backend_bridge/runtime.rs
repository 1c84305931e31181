//! Backend worker: owns the tokio runtime and the card processor, serves UI commands.

use std::{sync::Arc, thread};

use client_core::{CardDraft, CardProcessor, ClientSettings, HttpCardProcessor};
use crossbeam_channel::{Receiver, Sender};
use shared::{error::SubmitError, protocol::CardSubmission};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::media::{self, GeneratedCard};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let processor = match HttpCardProcessor::new(&settings) {
                Ok(processor) => processor,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err}"),
                    )));
                    tracing::error!("failed to build card processor: {err}");
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Ready; cards are generated by {}",
                processor.endpoint()
            )));

            serve_commands(cmd_rx, ui_tx, Arc::new(processor)).await;
        });
    });
}

/// Runs until the UI side drops its command sender. Each command gets its own
/// task so a slow backend call never delays a preview.
pub async fn serve_commands(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    processor: Arc<dyn CardProcessor>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        tracing::debug!(command = cmd.name(), "backend worker received command");
        tokio::spawn(handle_command(cmd, ui_tx.clone(), Arc::clone(&processor)));
    }
    tracing::info!("ui command queue closed; backend worker stopping");
}

async fn handle_command(
    cmd: BackendCommand,
    ui_tx: Sender<UiEvent>,
    processor: Arc<dyn CardProcessor>,
) {
    match cmd {
        BackendCommand::LoadPreview { selection, path } => {
            let event = match media::load_preview(&path).await {
                Ok(image) => UiEvent::PreviewLoaded { selection, image },
                Err(reason) => UiEvent::PreviewFailed { selection, reason },
            };
            emit(&ui_tx, event);
        }
        BackendCommand::ProcessCard { draft } => {
            let request_id = draft.request_id;
            let outcome = process_card(processor.as_ref(), draft).await;
            emit(&ui_tx, UiEvent::CardProcessed { request_id, outcome });
        }
    }
}

pub async fn process_card(
    processor: &dyn CardProcessor,
    draft: CardDraft,
) -> Result<GeneratedCard, SubmitError> {
    let CardDraft { image, fields, .. } = draft;
    let upload = client_core::read_upload(&image.path, &image.file_name)
        .await
        .map_err(|err| SubmitError::network(format!("could not read {}: {err}", image.file_name)))?;
    let bytes = processor
        .process_image(CardSubmission {
            image: upload,
            fields,
        })
        .await?;
    media::decode_card(bytes)
        .await
        .map_err(|err| SubmitError::network(format!("response is not a readable image: {err}")))
}

/// Completions must not be dropped, or the window would stay in flight forever.
fn emit(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if ui_tx.send(event).is_err() {
        tracing::warn!("ui event receiver dropped; discarding backend event");
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, path::PathBuf, time::Duration};

    use async_trait::async_trait;
    use client_core::SelectedImage;
    use crossbeam_channel::bounded;
    use shared::domain::{CardFields, RequestId, SelectionId};

    use super::*;

    struct FixedProcessor {
        outcome: Result<Vec<u8>, SubmitError>,
    }

    #[async_trait]
    impl CardProcessor for FixedProcessor {
        async fn process_image(
            &self,
            submission: CardSubmission,
        ) -> Result<Vec<u8>, SubmitError> {
            assert!(!submission.image.bytes.is_empty());
            self.outcome.clone()
        }
    }

    fn png_bytes() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(8, 6, image::Rgba([10, 200, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    async fn write_temp_png(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "card_studio_runtime_{tag}_{}",
            std::process::id()
        ));
        tokio::fs::create_dir_all(&dir).await.expect("dir");
        let path = dir.join("photo.png");
        tokio::fs::write(&path, png_bytes()).await.expect("write");
        path
    }

    fn draft_for(path: PathBuf) -> CardDraft {
        CardDraft {
            request_id: RequestId(3),
            image: SelectedImage {
                id: SelectionId(1),
                path,
                file_name: "photo.png".to_string(),
            },
            fields: CardFields {
                wishes_text: "Happy Birthday".to_string(),
                name_text: "Jane".to_string(),
                ..CardFields::default()
            },
        }
    }

    #[tokio::test]
    async fn process_card_decodes_backend_image() {
        let path = write_temp_png("ok").await;
        let processor = FixedProcessor {
            outcome: Ok(png_bytes()),
        };

        let card = process_card(&processor, draft_for(path.clone()))
            .await
            .expect("card");
        assert_eq!(card.bytes, png_bytes());
        assert_eq!((card.image.width, card.image.height), (8, 6));

        let _ = tokio::fs::remove_dir_all(path.parent().expect("parent")).await;
    }

    #[tokio::test]
    async fn process_card_reports_unreadable_upload() {
        let processor = FixedProcessor {
            outcome: Ok(png_bytes()),
        };
        let err = process_card(
            &processor,
            draft_for(PathBuf::from("/nonexistent/card_studio/photo.png")),
        )
        .await
        .err()
        .expect("must fail");
        assert!(matches!(err, SubmitError::NetworkOrDecode(_)));
        assert!(err.to_string().contains("photo.png"));
    }

    #[tokio::test]
    async fn process_card_passes_server_errors_through() {
        let path = write_temp_png("server").await;
        let processor = FixedProcessor {
            outcome: Err(SubmitError::Server { status: 500 }),
        };
        let err = process_card(&processor, draft_for(path.clone()))
            .await
            .err()
            .expect("must fail");
        assert_eq!(err, SubmitError::Server { status: 500 });

        let _ = tokio::fs::remove_dir_all(path.parent().expect("parent")).await;
    }

    #[tokio::test]
    async fn process_card_rejects_undecodable_body() {
        let path = write_temp_png("garbage").await;
        let processor = FixedProcessor {
            outcome: Ok(b"definitely not an image".to_vec()),
        };
        let err = process_card(&processor, draft_for(path.clone()))
            .await
            .err()
            .expect("must fail");
        assert!(err.to_string().starts_with("response is not a readable image"));

        let _ = tokio::fs::remove_dir_all(path.parent().expect("parent")).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn serves_commands_until_queue_closes() {
        let path = write_temp_png("serve").await;
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let processor: Arc<dyn CardProcessor> = Arc::new(FixedProcessor {
            outcome: Err(SubmitError::ServerReported {
                status: 400,
                message: "bad image".to_string(),
            }),
        });

        cmd_tx
            .send(BackendCommand::LoadPreview {
                selection: SelectionId(9),
                path: PathBuf::from("/nonexistent/card_studio/missing.png"),
            })
            .expect("queue preview");
        cmd_tx
            .send(BackendCommand::ProcessCard {
                draft: draft_for(path.clone()),
            })
            .expect("queue card");
        drop(cmd_tx);

        serve_commands(cmd_rx, ui_tx, processor).await;

        let mut saw_preview_failure = false;
        let mut saw_card_failure = false;
        for _ in 0..2 {
            match tokio::task::block_in_place(|| ui_rx.recv_timeout(Duration::from_secs(5))) {
                Ok(UiEvent::PreviewFailed { selection, .. }) => {
                    assert_eq!(selection, SelectionId(9));
                    saw_preview_failure = true;
                }
                Ok(UiEvent::CardProcessed {
                    request_id,
                    outcome,
                }) => {
                    assert_eq!(request_id, RequestId(3));
                    assert!(outcome.is_err());
                    saw_card_failure = true;
                }
                Ok(_) => panic!("unexpected ui event"),
                Err(err) => panic!("no ui event: {err}"),
            }
        }
        assert!(saw_preview_failure && saw_card_failure);

        let _ = tokio::fs::remove_dir_all(path.parent().expect("parent")).await;
    }
}
