//! Publishing CLI for OTA updates.

mod api_client;
mod dist;

use anyhow::{Context, Result};
use api_client::{ApiClient, ManifestCheck, ManifestRequest};
use clap::{Args, Parser, Subcommand};
use dist::DistDirectory;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use ota_core::config::PublishConfig;
use ota_core::{ManifestBuilder, Platform, ProtocolVersion, UploadPath};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "otactl")]
#[command(about = "Publishing CLI for OTA updates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ClientConfigArgs {
    /// Client config file path
    #[arg(long, env = "OTA_CLIENT_CONFIG", default_value = "otactl.toml")]
    client_config: PathBuf,
}

#[derive(Args, Clone)]
struct ApiArgs {
    /// Server URL (overrides client config)
    #[arg(long)]
    server: Option<String>,

    #[command(flatten)]
    client: ClientConfigArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate per-platform manifests for an exported bundle
    GenerateManifests {
        /// Export directory containing metadata.json and expoConfig.json
        #[arg(long, default_value = "dist")]
        dist: PathBuf,

        /// Upload path `<runtime version>/<ota update version>`
        #[arg(long, env = "UPLOAD_PATH")]
        upload_path: String,

        /// Public base URL of uploaded assets (overrides client config)
        #[arg(long, env = "EXPO_UPDATES_ASSETS_URL")]
        assets_url: Option<String>,

        /// Mark the update mandatory (`y` or `Y`)
        #[arg(long, env = "MANDATORY")]
        mandatory: Option<String>,

        #[command(flatten)]
        client: ClientConfigArgs,
    },
    /// Allocate the upload path of the next publish
    UploadPath {
        /// Runtime version to publish for
        #[arg(long, env = "RUNTIME_VERSION")]
        runtime_version: String,

        #[command(flatten)]
        api: ApiArgs,
    },
    /// Record an uploaded publish as the newest update
    Sync {
        /// Upload path `<runtime version>/<ota update version>`
        #[arg(long, env = "UPLOAD_PATH")]
        upload_path: String,

        #[command(flatten)]
        api: ApiArgs,
    },
    /// Request a manifest the way a device does and print the response
    Check {
        #[arg(long)]
        platform: String,

        #[arg(long, env = "RUNTIME_VERSION")]
        runtime_version: String,

        /// Protocol version to negotiate (0 or 1)
        #[arg(long, default_value = "1")]
        protocol: String,

        /// Update id the device already runs
        #[arg(long)]
        current_update_id: Option<String>,

        #[command(flatten)]
        api: ApiArgs,
    },
    /// Check server health and version
    Health {
        #[command(flatten)]
        api: ApiArgs,
    },
}

/// Client settings read from `otactl.toml` and `OTA_` env vars.
#[derive(Debug, Default, Deserialize)]
struct ClientConfig {
    server_url: Option<String>,
    assets_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli { command } = Cli::parse();

    match command {
        Commands::GenerateManifests {
            dist,
            upload_path,
            assets_url,
            mandatory,
            client,
        } => {
            let config = load_client_config(&client.client_config)?;
            let assets_base_url = assets_url
                .or(config.assets_base_url)
                .context("no assets base URL: pass --assets-url or set assets_base_url")?;
            let publish = PublishConfig {
                assets_base_url,
                mandatory: PublishConfig::parse_mandatory_flag(mandatory.as_deref()),
            };
            handle_generate_manifests(&dist, &upload_path, &publish).await
        }
        Commands::UploadPath {
            runtime_version,
            api,
        } => {
            let client = api_client(&api)?;
            let path = client.get_upload_path(&runtime_version).await?;
            println!("{path}");
            Ok(())
        }
        Commands::Sync { upload_path, api } => {
            let upload_path = parse_upload_path(&upload_path)?;
            let client = api_client(&api)?;
            let response = client
                .sync(&upload_path)
                .await
                .with_context(|| format!("failed to sync {upload_path}"))?;
            for update in response.updates {
                println!(
                    "{}\t{}\t{}",
                    update.platform, update.sort_key, update.id
                );
            }
            Ok(())
        }
        Commands::Check {
            platform,
            runtime_version,
            protocol,
            current_update_id,
            api,
        } => {
            let request = ManifestRequest {
                protocol: ProtocolVersion::parse(Some(protocol.as_str()))?,
                platform: platform.parse::<Platform>()?,
                runtime_version,
                current_update_id,
            };
            let client = api_client(&api)?;
            handle_check(&client, &request).await
        }
        Commands::Health { api } => {
            let client = api_client(&api)?;
            let health = client.health().await?;
            println!("{} (v{})", health.status, health.version);
            Ok(())
        }
    }
}

async fn handle_generate_manifests(
    dist: &Path,
    upload_path: &str,
    publish: &PublishConfig,
) -> Result<()> {
    let upload_path = parse_upload_path(upload_path)?;
    let source = DistDirectory::new(dist);
    let builder = ManifestBuilder::new(publish, upload_path);

    let manifests = builder.build_all(&source).await?;
    let written = source
        .write_manifests(&manifests)
        .await
        .with_context(|| format!("failed to write manifests under {}", dist.display()))?;

    for ((platform, manifest), path) in manifests.iter().zip(&written) {
        tracing::info!(%platform, id = %manifest.id, path = %path.display(), "wrote manifest");
        println!("{platform}\t{}\t{}", manifest.id, path.display());
    }
    Ok(())
}

async fn handle_check(client: &ApiClient, request: &ManifestRequest) -> Result<()> {
    match client.check_manifest(request).await? {
        ManifestCheck::Update {
            manifest,
            extensions,
        } => {
            println!("update {}", manifest.id);
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            if !extensions.is_null() {
                println!("{}", serde_json::to_string_pretty(&extensions)?);
            }
        }
        ManifestCheck::Directive(directive) => {
            println!("directive {}", serde_json::to_string(&directive)?);
        }
    }
    Ok(())
}

fn parse_upload_path(value: &str) -> Result<UploadPath> {
    UploadPath::parse(value).with_context(|| format!("invalid upload path: {value}"))
}

fn api_client(api: &ApiArgs) -> Result<ApiClient> {
    let config = load_client_config(&api.client.client_config)?;
    let server = api
        .server
        .clone()
        .or(config.server_url)
        .context("no server URL: pass --server or set server_url")?;
    ApiClient::new(&server)
}

fn load_client_config(path: &Path) -> Result<ClientConfig> {
    let mut figment = Figment::new();

    if path.exists() {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("OTA_").split("__"));

    match figment.extract() {
        Ok(config) => Ok(config),
        Err(_) if !path.exists() => Ok(ClientConfig::default()),
        Err(err) => Err(anyhow::anyhow!(err).context("failed to load client configuration")),
    }
}
