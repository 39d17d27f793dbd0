use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use imgduel::render::{Color, ReportRenderer, ReportSpec, ResultEntry};
use imgduel::{ImageRef, MAX_REFERENCES};

#[derive(Parser)]
#[command(name = "imgduel", about = "Side-by-side image-model battles and raster reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run both models over a prompt and save the results (and a report)
    Battle {
        /// Prompt text (may be empty when references are given)
        #[arg(long, default_value = "")]
        prompt: String,
        /// Reference image files (up to 5, extras are skipped)
        #[arg(long = "reference")]
        references: Vec<PathBuf>,
        /// API key; falls back to the GEMINI_API_KEY environment variable
        #[arg(long)]
        api_key: Option<String>,
        /// Output directory for result images and the report
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Also composite a battle report when both panels succeed
        #[arg(long)]
        report: bool,
    },
    /// Composite a battle report from two already-generated images
    Report {
        #[arg(long, default_value = "")]
        prompt: String,
        #[arg(long = "reference")]
        references: Vec<PathBuf>,
        #[arg(long)]
        left: PathBuf,
        #[arg(long)]
        right: PathBuf,
        #[arg(long, default_value = "NANO")]
        left_label: String,
        #[arg(long, default_value = "PRO")]
        right_label: String,
        #[arg(long, default_value_t = 0)]
        left_latency_ms: u64,
        #[arg(long, default_value_t = 0)]
        right_latency_ms: u64,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Reverse-prompt: describe an image as a reusable generation prompt
    Describe {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Battle {
            prompt,
            references,
            api_key,
            out_dir,
            report,
        } => battle(prompt, references, api_key, out_dir, report).await,
        Command::Report {
            prompt,
            references,
            left,
            right,
            left_label,
            right_label,
            left_latency_ms,
            right_latency_ms,
            out_dir,
        } => {
            let spec = ReportSpec {
                prompt,
                references: load_references(&references)?,
                left: ResultEntry {
                    image: load_image(&left)?,
                    label: left_label,
                    latency_ms: left_latency_ms,
                    accent: Color::ACCENT_RED,
                },
                right: ResultEntry {
                    image: load_image(&right)?,
                    label: right_label,
                    latency_ms: right_latency_ms,
                    accent: Color::ACCENT_BLUE,
                },
            };
            let rendered = ReportRenderer::default().render(&spec).await?;
            let path = out_dir.join(&rendered.filename);
            std::fs::write(&path, &rendered.png_data)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("report: {}", path.display());
            Ok(())
        }
        Command::Describe { image, api_key } => {
            let session = new_session(api_key)?;
            let prompt = session.reverse_prompt(&[load_image(&image)?]).await?;
            println!("{}", prompt);
            Ok(())
        }
    }
}

async fn battle(
    prompt: String,
    references: Vec<PathBuf>,
    api_key: Option<String>,
    out_dir: PathBuf,
    report: bool,
) -> anyhow::Result<()> {
    let references = load_references(&references)?;
    let mut session = new_session(api_key)?;
    let outcome = session.run(&prompt, &references).await?;

    for panel in [&outcome.left, &outcome.right] {
        match &panel.result {
            Ok(image) => {
                let path = out_dir.join(format!("{}.png", panel.model_id));
                std::fs::write(&path, image.decode()?)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("{}: {} ({}ms)", panel.label, path.display(), panel.latency_ms);
            }
            Err(e) => eprintln!("{}: FAILED after {}ms: {}", panel.label, panel.latency_ms, e),
        }
    }
    if !session.credentials_verified() {
        eprintln!("credentials were rejected; re-verify the API key before retrying");
    }

    if report {
        match (outcome.left.to_result_entry(), outcome.right.to_result_entry()) {
            (Some(left), Some(right)) => {
                let spec = ReportSpec {
                    prompt,
                    references,
                    left,
                    right,
                };
                let rendered = ReportRenderer::default().render(&spec).await?;
                let path = out_dir.join(&rendered.filename);
                std::fs::write(&path, &rendered.png_data)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("report: {}", path.display());
            }
            _ => eprintln!("report skipped: both panels must succeed"),
        }
    }
    Ok(())
}

fn new_session(api_key: Option<String>) -> anyhow::Result<imgduel::BattleSession> {
    let key = match api_key.or_else(|| std::env::var("GEMINI_API_KEY").ok()) {
        Some(k) if !k.is_empty() => k,
        _ => bail!("an API key is required (--api-key or GEMINI_API_KEY)"),
    };
    let client = imgduel::genai::GenAiClient::new(imgduel::genai::ClientConfig::new(key))?;
    Ok(imgduel::BattleSession::new(client))
}

fn load_references(paths: &[PathBuf]) -> anyhow::Result<Vec<ImageRef>> {
    if paths.len() > MAX_REFERENCES {
        eprintln!(
            "only the first {} reference images are used ({} given)",
            MAX_REFERENCES,
            paths.len()
        );
    }
    paths
        .iter()
        .take(MAX_REFERENCES)
        .map(|p| load_image(p))
        .collect()
}

fn load_image(path: &Path) -> anyhow::Result<ImageRef> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        other => bail!(
            "unsupported image extension {:?} for {}",
            other,
            path.display()
        ),
    };
    Ok(ImageRef::from_bytes(mime, &bytes))
}
