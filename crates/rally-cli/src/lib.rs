use anyhow::{Context, Result};
use rally_core::LocalFile;
use std::path::Path;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for `path` from its extension, or `application/octet-stream`.
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Read `path` into memory. `content_type` overrides the extension-based guess.
pub async fn read_local_file(path: &Path, content_type: Option<&str>) -> Result<LocalFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let content_type = content_type
        .map(str::to_string)
        .unwrap_or_else(|| guess_content_type(path));

    let mut file = LocalFile::new(bytes, content_type);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        file = file.with_file_name(name);
    }
    Ok(file)
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
