use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rally_api_client::{ApiClient, DirectUploadOptions, RemoteProfileStore, UploadKind};
use rally_core::{ClientConfig, ProfileMediaStore};
use rally_storage::create_profile_store;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rally_cli::{init_tracing, print_json, read_local_file};

#[derive(Parser, Debug)]
#[command(name = "rally")]
#[command(about = "Upload avatars, banners and movement media to the Rally backend")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an avatar or banner through a signed URL and print the outcome
    Upload {
        file: PathBuf,

        /// Upload kind: avatar or banner
        #[arg(long)]
        kind: String,

        /// Size ceiling in bytes (defaults to the kind's limit)
        #[arg(long)]
        max_bytes: Option<u64>,

        /// Transfer timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Content type (guessed from the file extension when omitted)
        #[arg(long)]
        content_type: Option<String>,

        /// Print transfer progress to stderr
        #[arg(long)]
        progress: bool,
    },

    /// Upload an avatar or banner and record it on the profile
    SetMedia {
        file: PathBuf,

        /// avatar or banner
        #[arg(long)]
        kind: String,
    },

    /// Upload movement media as a multipart form
    Media {
        file: PathBuf,

        #[arg(long)]
        content_type: Option<String>,
    },

    /// Print the profile's avatar and banner references
    Profile,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    let client = ApiClient::new(&config).context("Failed to create HTTP client")?;
    tracing::debug!(
        base_url = client.base_url(),
        data_mode = %config.data_mode,
        "Client configured"
    );

    match args.command {
        Command::Upload {
            file,
            kind,
            max_bytes,
            timeout_ms,
            content_type,
            progress,
        } => {
            let local = read_local_file(&file, content_type.as_deref()).await?;

            let mut options = DirectUploadOptions {
                access_token: config.access_token.clone(),
                kind,
                max_bytes,
                timeout: timeout_ms.map(Duration::from_millis),
                ..DirectUploadOptions::default()
            };
            if progress {
                options = options.with_progress(|pct| {
                    eprint!("\rUploading... {:>5.1}%", pct);
                    let _ = std::io::stderr().flush();
                });
            }

            let outcome = client.upload_direct(Some(&local), options).await;
            if progress {
                eprintln!();
            }
            print_json(&outcome?)?;
        }

        Command::SetMedia { file, kind } => {
            let local = read_local_file(&file, None).await?;
            let options = DirectUploadOptions {
                access_token: config.access_token.clone(),
                kind,
                ..DirectUploadOptions::default()
            };

            let outcome = client.upload_direct(Some(&local), options).await?;

            let remote = Arc::new(RemoteProfileStore::new(client.clone()));
            let store = create_profile_store(&config, remote)?;
            let media = store
                .set_profile_media(outcome.kind, outcome.to_media_reference())
                .await
                .with_context(|| format!("Failed to save {} on profile ({})", outcome.kind, store.name()))?;
            print_json(&media)?;
        }

        Command::Media { file, content_type } => {
            let local = read_local_file(&file, content_type.as_deref()).await?;
            let response = client
                .upload_media(&local, UploadKind::MovementMedia)
                .await?;
            print_json(&response)?;
        }

        Command::Profile => {
            let remote = Arc::new(RemoteProfileStore::new(client.clone()));
            let store = create_profile_store(&config, remote)?;
            let media = store.get_profile_media().await?;
            print_json(&media)?;
        }
    }

    Ok(())
}
