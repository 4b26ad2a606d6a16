use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use providers::GeminiImageClient;
use services::image_data::{check_renderable, export_to};
use services::{GalleryController, GalleryError, SqliteMockupStore};
use shared::mockup::{Category, GenerationSlot, ImageUpload, SlotStatus};
use shared::settings::StudioSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studio::{suggestion_for, DeleteGates, DeleteRequest, SlotManager};

use crate::config;

#[derive(Debug, Parser)]
#[command(
    name = "mockup-studio",
    about = "Turn one image into photorealistic product mockups",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the mockup categories.
    Categories,

    /// Generate a batch of four mockups from an image.
    Generate(GenerateArgs),

    /// Manage saved mockups.
    #[command(subcommand)]
    Gallery(GalleryCommand),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// PNG, JPG or GIF image to apply
    #[arg(long)]
    pub image: PathBuf,

    /// Category label, e.g. "Caneca"
    #[arg(long, default_value = "Papelaria")]
    pub category: String,

    /// Optional style or scene description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Save this result (1-4) to the gallery
    #[arg(long)]
    pub save: Option<usize>,

    /// Download the finished results into this directory
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum GalleryCommand {
    /// List saved mockups, newest first.
    List,

    /// Delete a saved mockup (asks for confirmation).
    Delete {
        id: String,
        /// Confirm the deletion right away
        #[arg(long)]
        confirm: bool,
    },

    /// Write a saved mockup to a directory.
    Export { id: String, dir: PathBuf },

    /// Open a saved mockup in the system image viewer.
    Open { id: String },

    /// Remove saved mockups whose image no longer renders.
    Heal,
}

pub async fn run(cli: Cli, settings: StudioSettings) -> Result<()> {
    match cli.command {
        Commands::Categories => {
            print_categories();
            Ok(())
        }
        Commands::Generate(args) => run_generate(args, &settings).await,
        Commands::Gallery(cmd) => run_gallery(cmd, &settings).await,
    }
}

fn print_categories() {
    for category in Category::all() {
        println!("{:<20} {}", category.label(), category.prompt_subject());
    }
}

async fn open_gallery(settings: &StudioSettings) -> Result<GalleryController> {
    let dir = config::data_dir(settings);
    let store = SqliteMockupStore::open(&dir)
        .with_context(|| format!("Failed to open mockup store in {:?}", dir))?;
    GalleryController::open(Arc::new(store))
        .await
        .context("Failed to load saved mockups")
}

/// Read an upload from disk, validating its type by extension
fn load_upload(path: &Path) -> Result<ImageUpload> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(ImageUpload::from_bytes(&bytes, mime.essence_str())?)
}

async fn run_generate(args: GenerateArgs, settings: &StudioSettings) -> Result<()> {
    let upload = load_upload(&args.image)?;
    let category = Category::from_label(&args.category).ok_or_else(|| {
        let labels: Vec<&str> = Category::all().iter().map(|c| c.label()).collect();
        anyhow!(
            "Unknown category {:?}. Choose one of: {}",
            args.category,
            labels.join(", ")
        )
    })?;
    let client = GeminiImageClient::from_settings(&settings.model)?;
    tracing::info!(model = client.model(), "Using Gemini image model");

    let manager = SlotManager::new(Arc::new(client));
    manager.load_image(upload);
    manager.set_category(category);
    manager.set_description(args.description);

    let batch = manager
        .start_generation()
        .ok_or_else(|| anyhow!("No image loaded"))?;
    println!("Generating {} mockups of {}...", batch.slot_ids.len(), category);
    batch.wait().await;

    // Results that arrived but do not decode are shown as failures
    for slot in manager.slots() {
        if slot.status() == SlotStatus::Succeeded {
            if let Some(artifact) = slot.artifact() {
                if check_renderable(artifact).is_err() {
                    manager.report_render_failure(slot.id());
                }
            }
        }
    }

    let slots = manager.slots();
    for (i, slot) in slots.iter().enumerate() {
        print_slot(i + 1, slot);
    }

    if let Some(dir) = &args.out {
        for slot in slots.iter().filter(|s| s.status() == SlotStatus::Succeeded) {
            if let Some(artifact) = slot.artifact() {
                let path = export_to(artifact, dir, &slot.download_name())?;
                println!("Saved file {}", path.display());
            }
        }
    }

    if let Some(n) = args.save {
        let slot = slots
            .get(n.wrapping_sub(1))
            .ok_or_else(|| anyhow!("There is no result #{}", n))?;
        let gallery = open_gallery(settings).await?;
        match gallery.save_slot(slot).await {
            Ok(item) => println!(
                "Saved result #{} to the gallery as {} ({}/{})",
                n,
                item.id,
                gallery.count(),
                gallery.capacity()
            ),
            Err(e @ GalleryError::CapacityReached { .. }) => println!("{}", e),
            Err(e) => return Err(e).context("Could not save the mockup"),
        }
    }
    Ok(())
}

fn print_slot(n: usize, slot: &GenerationSlot) {
    match slot.status() {
        SlotStatus::Succeeded => println!("#{} ready ({})", n, slot.id()),
        SlotStatus::Loading => println!("#{} still generating", n),
        SlotStatus::Failed => {
            println!("#{} failed: {}", n, slot.error().unwrap_or_default());
            if let Some(hint) = suggestion_for(slot) {
                println!("   Suggestion: {}", hint);
            }
        }
    }
}

async fn run_gallery(cmd: GalleryCommand, settings: &StudioSettings) -> Result<()> {
    let gallery = open_gallery(settings).await?;
    match cmd {
        GalleryCommand::List => {
            println!("Saved mockups ({}/{})", gallery.count(), gallery.capacity());
            for item in gallery.items() {
                println!("{}  {}", item.id, item.created_at);
            }
        }
        GalleryCommand::Delete { id, confirm } => {
            if !gallery.is_saved(&id).await? {
                bail!("Mockup {} is not in the gallery", id);
            }
            let gates = DeleteGates::new();
            let mut outcome = gates.request_gallery_delete(&gallery, &id).await?;
            if confirm {
                outcome = gates.request_gallery_delete(&gallery, &id).await?;
            }
            match outcome {
                DeleteRequest::Confirmed => println!("Deleted {}", id),
                DeleteRequest::AwaitingConfirmation => {
                    println!("Run again with --confirm to delete {}", id)
                }
            }
        }
        GalleryCommand::Export { id, dir } => {
            let path = gallery.export(&id, &dir).await?;
            println!("Saved file {}", path.display());
        }
        GalleryCommand::Open { id } => {
            let path = gallery.export(&id, &std::env::temp_dir()).await?;
            open::that(&path).with_context(|| format!("Failed to open {:?}", path))?;
        }
        GalleryCommand::Heal => {
            let removed = gallery.heal().await?;
            if removed.is_empty() {
                println!("All saved mockups render correctly");
            } else {
                for id in removed {
                    println!("Removed corrupted mockup {}", id);
                }
            }
        }
    }
    Ok(())
}
