//! Ydentifi CLI - key packs and API credentials
//!
//! Usage:
//!   ydentifi keypack        - Generate encryption/signing key pairs and an API secret
//!   ydentifi authorize      - Fetch a challenge and issue a server authorization
//!   ydentifi token          - Fetch a challenge and issue an API auth token
//!   ydentifi verify-token   - Check an API auth token the way the service does

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ydentifi_client::config::{DEFAULT_CHALLENGE_PATH, DEFAULT_TIMEOUT_MS};
use ydentifi_client::{verify_api_auth_token, ClientConfig, YdentifiClient};
use ydentifi_crypto::{ApiSecret, CryptoBackend, KeyPack, RsaBackend};

const ENCRYPTION_PRIVATE_FILE: &str = "encryption_private.pem";
const ENCRYPTION_PUBLIC_FILE: &str = "encryption_public.pem";
const SIGNING_PRIVATE_FILE: &str = "signing_private.pem";
const SIGNING_PUBLIC_FILE: &str = "signing_public.pem";
const API_SECRET_FILE: &str = "api_secret.txt";

#[derive(Parser)]
#[command(name = "ydentifi")]
#[command(version)]
#[command(about = "Key packs and credentials for the Ydentifi MFA API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServiceArgs {
    /// App ID issued by the service
    #[arg(long, env = "YDENTIFI_CLIENT_APP_ID")]
    client_app_id: String,

    /// Base URL of the API, e.g. https://ydentifi.example.com
    #[arg(long, env = "YDENTIFI_API_BASE_URL")]
    api_base_url: String,

    /// Challenge endpoint path
    #[arg(long, env = "YDENTIFI_CHALLENGE_PATH", default_value = DEFAULT_CHALLENGE_PATH)]
    challenge_path: String,

    /// Challenge fetch timeout in milliseconds
    #[arg(long, env = "YDENTIFI_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
}

impl ServiceArgs {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.client_app_id, &self.api_base_url)
            .with_challenge_path(&self.challenge_path);
        config.timeout_ms = self.timeout_ms;
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pack
    Keypack {
        /// Write PEM files and the secret into this directory instead of printing JSON
        #[arg(long)]
        out: Option<PathBuf>,

        /// RSA modulus size
        #[arg(long, default_value_t = ydentifi_crypto::keys::DEFAULT_MODULUS_BITS)]
        modulus_bits: usize,
    },

    /// Issue an envelope-encrypted server authorization
    Authorize {
        #[command(flatten)]
        service: ServiceArgs,

        /// PEM file with the signing private key
        #[arg(long, env = "YDENTIFI_SIGNING_KEY_FILE")]
        signing_key: PathBuf,
    },

    /// Issue an API auth token
    Token {
        #[command(flatten)]
        service: ServiceArgs,

        /// PEM file with the signing private key
        #[arg(long, env = "YDENTIFI_SIGNING_KEY_FILE")]
        signing_key: PathBuf,

        /// File holding the base64 API secret
        #[arg(long, env = "YDENTIFI_API_SECRET_FILE")]
        api_secret: PathBuf,
    },

    /// Verify an API auth token offline
    VerifyToken {
        /// Token JSON as issued by `token`
        token: String,

        /// Requestor the token must belong to
        #[arg(long)]
        requestor_id: String,

        /// Challenge the token must answer
        #[arg(long)]
        challenge: String,

        /// PEM file with the requestor's signing public key
        #[arg(long)]
        public_key: PathBuf,

        /// File holding the requestor's base64 API secret
        #[arg(long)]
        api_secret: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keypack { out, modulus_bits } => {
            let backend = RsaBackend::with_modulus_bits(modulus_bits)?;
            let pack = backend.generate_key_pack()?;
            match out {
                Some(dir) => {
                    write_key_pack(&pack, &dir)?;
                    println!("Key pack written to {}", dir.display());
                }
                None => {
                    let json = serde_json::json!({
                        "EncryptionPrivateKey": pack.encryption_private_key(),
                        "EncryptionPublicKey": pack.encryption_public_key(),
                        "SigningPrivateKey": pack.signing_private_key(),
                        "SigningPublicKey": pack.signing_public_key(),
                        "ApiSecret": pack.api_secret.to_text(),
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
            }
        }

        Commands::Authorize {
            service,
            signing_key,
        } => {
            let client = YdentifiClient::http(service.config())?;
            let signing_key = read_trimmed(&signing_key)?;
            let credential = client.server_authorization(&signing_key).await?;
            println!("{credential}");
        }

        Commands::Token {
            service,
            signing_key,
            api_secret,
        } => {
            let client = YdentifiClient::http(service.config())?;
            let signing_key = read_trimmed(&signing_key)?;
            let api_secret = ApiSecret::from_text(&read_trimmed(&api_secret)?)?;
            let token = client.api_auth_token(&signing_key, &api_secret).await?;
            println!("{token}");
        }

        Commands::VerifyToken {
            token,
            requestor_id,
            challenge,
            public_key,
            api_secret,
        } => {
            let public_key = read_trimmed(&public_key)?;
            let api_secret = ApiSecret::from_text(&read_trimmed(&api_secret)?)?;
            verify_api_auth_token(
                &RsaBackend::new(),
                &token,
                &requestor_id,
                &api_secret,
                &public_key,
                &challenge,
            )?;
            println!("Token is valid for {requestor_id}");
        }
    }

    Ok(())
}

fn read_trimmed(path: &Path) -> anyhow::Result<String> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(text.trim().to_string())
}

fn write_key_pack(pack: &KeyPack, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let api_secret = pack.api_secret.to_text();
    let files = [
        (ENCRYPTION_PRIVATE_FILE, pack.encryption_private_key(), true),
        (ENCRYPTION_PUBLIC_FILE, pack.encryption_public_key(), false),
        (SIGNING_PRIVATE_FILE, pack.signing_private_key(), true),
        (SIGNING_PUBLIC_FILE, pack.signing_public_key(), false),
        (API_SECRET_FILE, api_secret.as_str(), true),
    ];
    for (name, contents, private) in files {
        let path = dir.join(name);
        write_file(&path, contents, private)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    info!(dir = %dir.display(), "key pack written");
    Ok(())
}

#[cfg(unix)]
fn write_file(path: &Path, contents: &str, private: bool) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mode = if private { 0o600 } else { 0o644 };
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    // `mode` only applies on create; an existing file keeps its old bits
    file.set_permissions(fs::Permissions::from_mode(mode))?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_file(path: &Path, contents: &str, _private: bool) -> std::io::Result<()> {
    fs::write(path, contents)
}
