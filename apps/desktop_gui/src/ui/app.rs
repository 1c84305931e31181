use std::{fs, path::PathBuf};

use client_core::{Completion, FormController, SubmitStart, ViewState};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::{
    domain::{CardFields, FontSlider, ResultId, FONT_SIZE_RANGE, TEXT_LINE_OPTIONS},
    error::SubmitError,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::media::{self, GeneratedCard, PreviewImage};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const PREVIEW_MAX_WIDTH: f32 = 320.0;
const OUTPUT_MAX_WIDTH: f32 = 520.0;

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Configuration",
        UiErrorCategory::Filesystem => "File",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

fn load_texture(ctx: &egui::Context, name: &str, image: &PreviewImage) -> TextureHandle {
    let color_image =
        egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

fn fitted_size(texture: &TextureHandle, max_width: f32) -> egui::Vec2 {
    let size = texture.size_vec2();
    let scale = (max_width / size.x.max(1.0)).min(1.0);
    size * scale
}

struct ResultTexture {
    id: ResultId,
    texture: TextureHandle,
}

pub struct CardStudioApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    controller: FormController,
    status: String,
    status_banner: Option<UiError>,
    preview_texture: Option<TextureHandle>,
    output_texture: Option<ResultTexture>,
    pending_card: Option<(ResultId, PreviewImage)>,
}

impl CardStudioApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            controller: FormController::new(CardFields::default()),
            status: "Starting...".to_string(),
            status_banner: None,
            preview_texture: None,
            output_texture: None,
            pending_card: None,
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status_banner = Some(err);
                }
                UiEvent::PreviewLoaded { selection, image } => {
                    if self.controller.preview_loaded(selection) {
                        self.preview_texture = Some(load_texture(ctx, "original-preview", &image));
                    }
                }
                UiEvent::PreviewFailed { selection, reason } => {
                    self.controller.preview_failed(selection, &reason);
                }
                UiEvent::CardProcessed {
                    request_id,
                    outcome,
                } => match outcome {
                    Ok(GeneratedCard { bytes, image }) => {
                        if let Completion::Succeeded(id) =
                            self.controller.finish_submit(request_id, Ok(bytes))
                        {
                            self.pending_card = Some((id, image));
                        }
                    }
                    Err(err) => {
                        self.controller.finish_submit(request_id, Err(err));
                    }
                },
            }
        }
    }

    /// Keeps textures in step with the controller; a result or preview the
    /// controller no longer holds has its texture dropped here.
    fn sync_textures(&mut self, ctx: &egui::Context) {
        let current = self.controller.result().map(|result| result.id);
        if self.output_texture.as_ref().map(|output| output.id) != current {
            if let Some(released) = self.output_texture.take() {
                tracing::debug!(result = released.id.0, "released card texture");
            }
        }
        if self.pending_card.as_ref().map(|(id, _)| *id) != current {
            self.pending_card = None;
        }
        if self.output_texture.is_none() {
            if let Some((id, image)) = self.pending_card.take() {
                let texture = load_texture(ctx, &format!("card-output:{}", id.0), &image);
                self.output_texture = Some(ResultTexture { id, texture });
            }
        }

        if !self.controller.view().preview_visible {
            self.preview_texture = None;
        }
    }

    fn pick_image(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file();
        self.select_image_path(picked);
    }

    fn select_image_path(&mut self, picked: Option<PathBuf>) {
        if let Some(path) = picked.as_ref() {
            if !media::is_supported_image(path) {
                self.preview_texture = None;
                self.controller.reject_selection(format!(
                    "{} is not a supported image type.",
                    path.display()
                ));
                return;
            }
        }

        self.preview_texture = None;
        let Some(selection) = self.controller.select_image(picked) else {
            return;
        };
        let Some(path) = self.controller.selection().map(|image| image.path.clone()) else {
            return;
        };
        if let Err(err) =
            dispatch_backend_command(&self.cmd_tx, BackendCommand::LoadPreview { selection, path })
        {
            self.controller.preview_failed(selection, err.message());
            self.status_banner = Some(err);
        }
    }

    fn submit(&mut self) {
        let draft = match self.controller.begin_submit() {
            SubmitStart::Dispatch(draft) => draft,
            SubmitStart::Rejected(_) | SubmitStart::Busy => return,
        };
        let request_id = draft.request_id;
        if let Err(err) =
            dispatch_backend_command(&self.cmd_tx, BackendCommand::ProcessCard { draft })
        {
            self.controller
                .finish_submit(request_id, Err(SubmitError::network(err.message())));
            self.status_banner = Some(err);
        }
    }

    fn save_card_as(&mut self) {
        let Some(result) = self.controller.result() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&result.download_name)
            .add_filter("JPEG image", &["jpg", "jpeg"])
            .save_file()
        else {
            return;
        };
        match fs::write(&path, &result.bytes) {
            Ok(()) => {
                self.status = format!("Saved card to {}", path.display());
            }
            Err(err) => {
                self.status_banner = Some(UiError::from_message(
                    UiErrorContext::SaveCard,
                    format!("Failed to save card: {err}"),
                ));
            }
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} error: {}",
                            err_label(banner.category()),
                            banner.message()
                        ))
                        .color(egui::Color32::WHITE),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.status_banner = None;
                        }
                    });
                });
            });
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.current_alert().map(str::to_string) else {
            return;
        };
        let mut acknowledged = false;
        let modal = egui::Modal::new(egui::Id::new("alert_modal")).show(ctx, |ui| {
            ui.set_max_width(360.0);
            ui.label(&message);
            ui.add_space(10.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("OK").clicked() {
                    acknowledged = true;
                }
            });
        });
        if acknowledged || modal.should_close() {
            self.controller.dismiss_alert();
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui, view: ViewState) {
        ui.heading("Your card");
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            if ui.button("Choose image…").clicked() {
                self.pick_image();
            }
            match self.controller.selection() {
                Some(image) => ui.label(&image.file_name),
                None => ui.weak("No image selected"),
            };
        });
        ui.add_space(6.0);

        let fields = self.controller.fields_mut();
        ui.label("Wishes");
        ui.add(
            egui::TextEdit::singleline(&mut fields.wishes_text)
                .hint_text("Happy Birthday")
                .desired_width(f32::INFINITY),
        );
        ui.label("Name");
        ui.add(
            egui::TextEdit::singleline(&mut fields.name_text)
                .hint_text("Who is this card for?")
                .desired_width(f32::INFINITY),
        );
        ui.horizontal(|ui| {
            ui.label("Wishes lines");
            egui::ComboBox::from_id_salt("text_lines")
                .selected_text(fields.text_lines.clone())
                .show_ui(ui, |ui| {
                    for option in TEXT_LINE_OPTIONS {
                        ui.selectable_value(&mut fields.text_lines, option.to_string(), option);
                    }
                });
        });
        ui.add_space(6.0);

        for slider in [FontSlider::Wishes, FontSlider::Name] {
            let mut value = self.controller.fields().font_size(slider);
            ui.horizontal(|ui| {
                ui.label(slider.label());
                let response = ui.add(egui::Slider::new(&mut value, FONT_SIZE_RANGE).show_value(false));
                if response.changed() {
                    self.controller.set_font_size(slider, value);
                }
                ui.monospace(self.controller.font_readout(slider));
                ui.label("%");
            });
        }
        ui.add_space(10.0);

        let mut submit = false;
        ui.horizontal(|ui| {
            if view.generate_visible
                && ui
                    .add_enabled(view.triggers_enabled, egui::Button::new("Generate card"))
                    .clicked()
            {
                submit = true;
            }
            if view.regenerate_visible
                && ui
                    .add_enabled(view.triggers_enabled, egui::Button::new("Regenerate style"))
                    .clicked()
            {
                submit = true;
            }
            if view.loading_visible {
                ui.add(egui::Spinner::new());
                ui.label("Creating your card…");
            }
        });
        if submit {
            self.submit();
        }
    }

    fn show_images(&mut self, ui: &mut egui::Ui, view: ViewState) {
        if view.preview_visible {
            if let Some(texture) = &self.preview_texture {
                ui.label("Original");
                ui.add(egui::Image::new(texture).fit_to_exact_size(fitted_size(texture, PREVIEW_MAX_WIDTH)));
                ui.add_space(10.0);
            }
        }

        if view.output_visible {
            if let Some(output) = &self.output_texture {
                ui.label("Card");
                ui.add(
                    egui::Image::new(&output.texture)
                        .fit_to_exact_size(fitted_size(&output.texture, OUTPUT_MAX_WIDTH)),
                );
            }
        }
        if view.download_visible {
            let label = self
                .controller
                .result()
                .map(|result| format!("Save {}…", result.download_name))
                .unwrap_or_else(|| "Save card…".to_string());
            if ui.button(label).clicked() {
                self.save_card_as();
            }
        }
    }
}

impl eframe::App for CardStudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);
        self.sync_textures(ctx);
        let view = self.controller.view();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.columns(2, |columns| {
                    self.show_form(&mut columns[0], view);
                    self.show_images(&mut columns[1], view);
                });
            });
        });

        self.show_alert(ctx);
        self.sync_textures(ctx);

        if view.loading_visible || self.controller.selection().is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }
}
