use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{CardProcessor, Completion, FormController, HttpCardProcessor, SubmitStart};
use shared::{
    domain::{CardFields, DEFAULT_FONT_SIZE, TEXT_LINES_SINGLE},
    error::SubmitError,
    protocol::CardSubmission,
};
use tracing_subscriber::EnvFilter;

/// Generate one greeting card from the command line.
#[derive(Parser, Debug)]
#[command(name = "card-cli")]
struct Args {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    wishes: String,
    #[arg(long)]
    name: String,
    /// Passed to the backend verbatim (`single` or `double`).
    #[arg(long, default_value = TEXT_LINES_SINGLE)]
    text_lines: String,
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    wishes_font_size: u32,
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    name_font_size: u32,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Base url of the image-processing backend.
    #[arg(long)]
    endpoint: Option<String>,
}

impl Args {
    fn fields(&self) -> CardFields {
        CardFields {
            wishes_text: self.wishes.clone(),
            name_text: self.name.clone(),
            text_lines: self.text_lines.clone(),
            wishes_font_size: self.wishes_font_size,
            name_font_size: self.name_font_size,
        }
    }
}

/// The derived name comes from free text; keep it a single path component so
/// the card always lands directly in the output directory.
fn card_file_name(download_name: &str) -> String {
    download_name.replace(['/', '\\'], "_")
}

/// Runs a single generate cycle and writes the card into `out_dir`.
async fn generate_card(
    processor: &dyn CardProcessor,
    image: PathBuf,
    fields: CardFields,
    out_dir: &Path,
) -> Result<PathBuf> {
    let mut controller = FormController::new(fields);
    controller.select_image(Some(image));

    let draft = match controller.begin_submit() {
        SubmitStart::Dispatch(draft) => draft,
        SubmitStart::Rejected(err) => bail!(err),
        SubmitStart::Busy => bail!("a card request is already in flight"),
    };

    let outcome = match client_core::read_upload(&draft.image.path, &draft.image.file_name).await {
        Ok(upload) => {
            processor
                .process_image(CardSubmission {
                    image: upload,
                    fields: draft.fields,
                })
                .await
        }
        Err(err) => Err(SubmitError::network(format!(
            "could not read {}: {err}",
            draft.image.file_name
        ))),
    };

    match controller.finish_submit(draft.request_id, outcome) {
        Completion::Succeeded(_) => {}
        Completion::Failed { alert } => bail!(alert),
        Completion::Stale => bail!("card request completed out of order"),
    }

    let result = controller
        .result()
        .ok_or_else(|| anyhow!("generated card went missing"))?;
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create output directory '{}'", out_dir.display()))?;
    let path = out_dir.join(card_file_name(&result.download_name));
    tokio::fs::write(&path, &result.bytes)
        .await
        .with_context(|| format!("failed to write card to '{}'", path.display()))?;
    tracing::info!(path = %path.display(), size_bytes = result.bytes.len(), "card saved");
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = client_core::load_settings().with_endpoint_override(args.endpoint.clone());
    let processor = HttpCardProcessor::new(&settings)?;
    let saved = generate_card(&processor, args.image.clone(), args.fields(), &args.out_dir).await?;
    println!("Saved card to {}", saved.display());

    Ok(())
}
