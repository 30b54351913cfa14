use clap::{Parser, Subcommand};
use listing_photos::config::{self, PipelineConfig};
use listing_photos::gallery::Gallery;
use listing_photos::imaging::RustBackend;
use listing_photos::intake::{Intake, collect_files};
use listing_photos::naming::slot_filename;
use listing_photos::output;
use listing_photos::source::ImageSource;
use listing_photos::watermark::{Compositor, LogoAsset, PublishOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        let dirty = if env!("GIT_DIRTY") == "true" { "+dirty" } else { "" };
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}{dirty}").into_boxed_str())
        }
    }
}

/// Shared config flag.
#[derive(clap::Args, Clone)]
struct ConfigArgs {
    /// Config file (default: ./listing-photos.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "listing-photos")]
#[command(about = "Byte-budget photo intake and watermarking for property listings")]
#[command(long_about = "\
Byte-budget photo intake and watermarking for property listings

Photos are re-encoded as JPEG into a fixed size window (100-150 KiB by
default), downscaled first when the longer edge exceeds 2500px. Photos
already under the budget are kept as they are. A gallery holds at most
`capacity` photos; extra photos in a batch are dropped.

The watermark command blends a logo over the center of each photo at 30%
of the photo width and 50% opacity, and writes it under its download name:

  Sheltershub_Property_SH-001_1.jpg

Run 'listing-photos gen-config' to generate a documented listing-photos.toml.
Set RUST_LOG=debug to trace the quality search.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-encode photos into a gallery directory
    Ingest {
        /// Image files or directories (walked recursively, in name order)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory for NNN.jpg slots and gallery.json
        #[arg(long)]
        out: PathBuf,
        /// Override gallery capacity
        #[arg(long)]
        capacity: Option<usize>,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Watermark photos and write them under their download names
    Watermark {
        /// Image paths or data URLs, in display order
        #[arg(required = true)]
        images: Vec<String>,
        /// Output directory
        #[arg(long)]
        out: PathBuf,
        /// Listing number used in download names
        #[arg(long)]
        id: u32,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print a stock listing-photos.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ingest {
            inputs,
            out,
            capacity,
            config,
        } => {
            let (pipeline, _) = load_pipeline_config(&config)?;
            let mut gallery = match capacity {
                Some(n) => Gallery::new(n),
                None => pipeline.new_gallery(),
            };
            let files = collect_files(&inputs);

            let intake = Intake::new(pipeline.encoding_target());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_intake_event(&event);
                }
            });
            let report = intake.ingest(files, &mut gallery, Some(tx));
            printer
                .join()
                .map_err(|_| "output printer thread panicked")?;

            write_gallery(&gallery, &out)?;
            println!();
            output::print_gallery(&gallery);
            if !report.failed.is_empty() {
                println!("{} photo(s) could not be processed", report.failed.len());
            }
        }
        Command::Watermark {
            images,
            out,
            id,
            config,
        } => {
            let (pipeline, base_dir) = load_pipeline_config(&config)?;
            let logo = LogoAsset::new(pipeline.logo_source(&base_dir)?);
            let sources = images
                .iter()
                .map(|reference| ImageSource::from_reference(reference))
                .collect::<Result<Vec<_>, _>>()?;
            let compositor = Compositor::new(
                Arc::new(RustBackend::new()),
                Arc::new(logo),
                pipeline.watermark_settings(),
                sources,
            );

            std::fs::create_dir_all(&out)?;
            for (index, reference) in images.iter().enumerate() {
                let Some(ticket) = compositor.select(index) else {
                    continue;
                };
                let name = display_name(reference);
                let status = match compositor.run(ticket) {
                    PublishOutcome::Published(status) => status,
                    PublishOutcome::Discarded => continue,
                };
                let written = match compositor.download(id) {
                    Some(download) => match download.image.load() {
                        Ok(image) => {
                            std::fs::write(out.join(&download.filename), image.bytes())?;
                            Some(download.filename)
                        }
                        Err(e) => {
                            warn!(image = %name, error = %e, "nothing to download");
                            None
                        }
                    },
                    None => None,
                };
                output::print_composite(index, &name, status, written.as_deref());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the pipeline config and the directory relative paths in it resolve
/// against.
fn load_pipeline_config(
    args: &ConfigArgs,
) -> Result<(PipelineConfig, PathBuf), config::ConfigError> {
    match &args.config {
        Some(path) => {
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config::load_config_file(path)?, base))
        }
        None => Ok((config::load_config(Path::new("."))?, PathBuf::from("."))),
    }
}

/// Write each slot as `NNN.<ext>` plus `gallery.json`.
fn write_gallery(gallery: &Gallery, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(out)?;
    for slot in gallery.slots() {
        let result = slot.result();
        let path = out.join(slot_filename(slot.position, &result.media_type));
        std::fs::write(path, &result.bytes)?;
    }
    let json = serde_json::to_string_pretty(&gallery.manifest())?;
    std::fs::write(out.join("gallery.json"), json)?;
    Ok(())
}

/// Short label for an image reference: the file name for paths.
fn display_name(reference: &str) -> String {
    if reference.starts_with("data:") {
        return "inline".to_string();
    }
    Path::new(reference)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string())
}
