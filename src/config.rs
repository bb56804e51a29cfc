use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, fmt, str::FromStr};

/// Which object store implementation backs the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    S3,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(StoreKind::S3),
            "memory" => Ok(StoreKind::Memory),
            other => bail!("unknown store `{other}`, expected `s3` or `memory`"),
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreKind,
    pub bucket: Option<String>,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Namespace root inside the bucket, already normalized.
    pub base_prefix: String,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Folder-style browser for an S3-compatible bucket")]
pub struct Args {
    /// Host to bind to (overrides BROWSER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BROWSER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store backend (overrides BROWSER_STORE)
    #[arg(long, value_enum)]
    pub store: Option<StoreKind>,

    /// Bucket name (overrides AWS_S3_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint, e.g. MinIO (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Key prefix every operation is scoped to (overrides AWS_S3_PREFIX)
    #[arg(long)]
    pub base_prefix: Option<String>,

    /// Largest accepted upload request in bytes (overrides BROWSER_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("BROWSER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("BROWSER_PORT", 3000u16)?;
        let env_store = parse_env("BROWSER_STORE", StoreKind::S3)?;
        let env_max_upload = parse_env("BROWSER_MAX_UPLOAD_BYTES", 512 * 1024 * 1024usize)?;
        let env_region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into());
        let env_prefix = env::var("AWS_S3_PREFIX").unwrap_or_default();

        // --- Merge ---
        let base_prefix = args.base_prefix.unwrap_or(env_prefix);
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            store: args.store.unwrap_or(env_store),
            bucket: args.bucket.or_else(|| non_empty_env("AWS_S3_BUCKET")),
            region: args.region.unwrap_or(env_region),
            endpoint_url: args
                .endpoint_url
                .or_else(|| non_empty_env("AWS_ENDPOINT_URL")),
            access_key_id: non_empty_env("AWS_ACCESS_KEY_ID"),
            secret_access_key: non_empty_env("AWS_SECRET_ACCESS_KEY"),
            session_token: non_empty_env("AWS_SESSION_TOKEN"),
            base_prefix: crate::services::path::normalize(&base_prefix),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Credentials stay out of the startup log line.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("store", &self.store)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<set>"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<set>"))
            .field("base_prefix", &self.base_prefix)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .with_context(|| format!("parsing {name} value `{value}`")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {name}")),
    }
}
