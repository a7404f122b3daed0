//! Models command - check and fetch OCR model files.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::{Stream, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use propdoc_core::ocr::{DETECTION_MODEL, DICTIONARY, RECOGNITION_MODEL};

use super::load_config;

/// Files every engine directory must hold.
const MODEL_FILES: [(&str, &str); 3] = [
    (DETECTION_MODEL, "text detection"),
    (RECOGNITION_MODEL, "text recognition"),
    (DICTIONARY, "character dictionary"),
];

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Check which engines have their model files
    Status,

    /// Download model files into an engine directory
    Download(DownloadArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Base URL serving det.onnx, latin_rec.onnx and latin_dict.txt
    #[arg(long = "from")]
    base_url: String,

    /// Fill the secondary engine's directory instead of the primary one
    #[arg(long)]
    fallback: bool,

    /// Output directory (overrides the configured one)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Status => check_status(config_path),
        ModelsCommand::Download(download_args) => download_models(download_args, config_path).await,
    }
}

fn check_status(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("{}", style("Model Status").bold());
    println!();

    print_engine("primary", &config.ocr.model_dir);
    match &config.ocr.fallback_model_dir {
        Some(dir) => print_engine("secondary", dir),
        None => println!(
            "{} {}",
            style("secondary").bold(),
            style("(not configured)").dim()
        ),
    }

    Ok(())
}

fn print_engine(label: &str, dir: &Path) {
    let complete = MODEL_FILES.iter().all(|(name, _)| dir.join(name).exists());
    let marker = if complete {
        style("ready").green()
    } else {
        style("incomplete").yellow()
    };
    println!("{} {} ({})", style(label).bold(), marker, dir.display());

    for (name, description) in MODEL_FILES {
        let path = dir.join(name);
        match fs::metadata(&path) {
            Ok(meta) => println!(
                "  {} {} - {} ({})",
                style("✓").green(),
                name,
                description,
                format_size(meta.len())
            ),
            Err(_) => println!("  {} {} - {}", style("✗").red(), name, description),
        }
    }
    println!();
}

async fn download_models(args: DownloadArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let model_dir = match (args.output, args.fallback) {
        (Some(dir), _) => dir,
        (None, true) => config.ocr.fallback_model_dir.ok_or_else(|| {
            anyhow::anyhow!("No secondary model directory configured (ocr.fallback_model_dir)")
        })?,
        (None, false) => config.ocr.model_dir,
    };

    fs::create_dir_all(&model_dir)?;
    println!(
        "{} Downloading models to {}",
        style("ℹ").blue(),
        model_dir.display()
    );

    let client = reqwest::Client::new();
    let multi = MultiProgress::new();
    let bar_style = ProgressStyle::default_bar()
        .template("{msg:20} [{bar:30.cyan/blue}] {bytes}/{total_bytes}")?
        .progress_chars("=> ");

    let base_url = args.base_url.trim_end_matches('/');
    for (name, _) in MODEL_FILES {
        let path = model_dir.join(name);
        if path.exists() && !args.force {
            println!("  {} {} already present", style("✓").green(), name);
            continue;
        }

        let pb = multi.add(ProgressBar::new(0));
        pb.set_style(bar_style.clone());
        pb.set_message(name.to_string());

        let url = format!("{}/{}", base_url, name);
        if let Err(e) = download_file(&client, &url, &path, &pb).await {
            pb.abandon_with_message(format!("{} failed", name));
            anyhow::bail!("Failed to download {}: {}", url, e);
        }
        pb.finish_with_message(format!("{} done", name));
    }

    println!("{} Models ready", style("✓").green());
    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    write_stream(response.bytes_stream(), path, pb).await
}

/// Write `stream` to `path` through a temporary file that is removed on failure.
async fn write_stream<S, B, E>(mut stream: S, path: &Path, pb: &ProgressBar) -> anyhow::Result<()>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    // Partial downloads never replace a good file
    let temp_path = path.with_extension("tmp");

    let result = async {
        let mut file = File::create(&temp_path)?;
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(chunk.as_ref())?;
            downloaded += chunk.as_ref().len() as u64;
            pb.set_position(downloaded);
        }

        file.flush()?;
        drop(file);
        fs::rename(&temp_path, path)?;
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2_000), "2.0KB");
        assert_eq!(format_size(7_500_000), "7.5MB");
        assert_eq!(format_size(1_200_000_000), "1.2GB");
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DETECTION_MODEL);
        let chunks = futures_util::stream::iter(vec![
            Ok(b"onnx".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset")),
        ]);

        let err = write_stream(chunks, &path, &ProgressBar::hidden()).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(!path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_download_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DICTIONARY);
        fs::write(&path, "old").unwrap();
        let chunks = futures_util::stream::iter(vec![
            Ok::<_, std::io::Error>(b"a\n".to_vec()),
            Ok(b"b\n".to_vec()),
        ]);

        write_stream(chunks, &path, &ProgressBar::hidden()).await.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
        assert!(!path.with_extension("tmp").exists());
    }
}
