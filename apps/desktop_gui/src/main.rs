mod backend_bridge;
mod controller;
mod media;
mod ui;

use anyhow::Context as _;
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::CardStudioApp;

#[derive(Parser, Debug)]
#[command(name = "card-studio", about = "Turn a photo into a greeting card")]
struct Args {
    /// Base url of the image-processing backend; overrides card_studio.toml and the environment.
    #[arg(long)]
    endpoint: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = client_core::load_settings().with_endpoint_override(args.endpoint);
    let endpoint = settings
        .process_image_url()
        .context("card studio cannot start without a valid backend endpoint")?;
    tracing::info!(%endpoint, "starting card studio");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Card Studio")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([760.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Card Studio",
        options,
        Box::new(|_cc| Ok(Box::new(CardStudioApp::new(cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow::anyhow!("card studio window failed: {err}"))
}
