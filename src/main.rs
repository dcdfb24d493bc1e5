use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};

use report_sftp::config::{Settings, paths};
use report_sftp::{NamedDataset, ReportUploader};

/// Settings file if one exists, overlaid with `SFTP_*` environment variables
fn load_settings() -> Result<Settings> {
    let mut settings = match paths::settings_file() {
        Some(path) if path.exists() => {
            tracing::debug!("Loading settings from {}", path.display());
            Settings::load(&path)?
        }
        _ => Settings::default(),
    };

    settings.apply_env(|name| std::env::var(name).ok());
    settings.validate()?;
    Ok(settings)
}

fn read_dataset(path: &Path) -> Result<NamedDataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
        rows.push(record.iter().map(String::from).collect());
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(NamedDataset::new(name, rows))
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_dir = paths::ensure_log_dir().ok();
    let _guard = report_sftp::logging::init_logging(log_dir);

    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        bail!("usage: report-sftp <CSV_FILE>...");
    }

    let settings = load_settings()?;
    let datasets = files
        .iter()
        .map(|path| read_dataset(path))
        .collect::<Result<Vec<_>>>()?;

    let uploader = ReportUploader::new(&settings)?;
    tracing::info!(
        "Uploading {} report(s) to {} using {} authentication",
        datasets.len(),
        uploader.addr(),
        uploader.auth_kind()
    );

    match settings.deadline_secs {
        Some(secs) => uploader
            .upload_within(&datasets, Duration::from_secs(secs))
            .await?,
        None => uploader.upload(&datasets).await?,
    }

    Ok(())
}
