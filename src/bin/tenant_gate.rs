use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use rand::rngs::OsRng;
use rand::RngCore;
use std::io::{self, BufRead};
use std::process::ExitCode;

use tenant_gate::auth::{extract_bearer_token, CredentialVerifier, TokenCodec};
use tenant_gate::config::{pepper_from_lookup, AuthConfig, HashingConfig};
use tenant_gate::error::{AuthError, Result};

const GENERATED_SECRET_BYTES: usize = 48;

#[derive(Parser)]
#[command(name = "tenant_gate", version, about = "Tenant Gate credential tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hash a password with the configured Argon2 cost (reads stdin when omitted)
    HashPassword {
        #[arg(long)]
        password: Option<String>,
    },
    /// Generate a random signing secret suitable for TENANT_GATE_JWT_SECRET
    GenSecret,
    /// Decode a session token with the configured secret and print its claims
    InspectToken {
        /// Raw token or "Bearer <token>" (reads stdin when omitted)
        token: Option<String>,
    },
}

fn main() -> ExitCode {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::HashPassword { password } => hash_password(password),
        Command::GenSecret => gen_secret(),
        Command::InspectToken { token } => inspect_token(token),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn hash_password(password: Option<String>) -> Result<String> {
    let password = match password {
        Some(password) => password,
        None => read_stdin_line()?,
    };
    let verifier = CredentialVerifier::new(
        HashingConfig::from_env()?,
        pepper_from_lookup(|key| std::env::var(key).ok()),
    )?;
    verifier.hash(&password)
}

fn gen_secret() -> Result<String> {
    loop {
        let mut bytes = [0u8; GENERATED_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let secret = URL_SAFE_NO_PAD.encode(bytes);
        // Redraw on the rare output that trips the weak-pattern check
        if AuthConfig::validate_secret(&secret).is_ok() {
            return Ok(secret);
        }
    }
}

fn inspect_token(token: Option<String>) -> Result<String> {
    let raw = match token {
        Some(token) => token,
        None => read_stdin_line()?,
    };
    let token = extract_bearer_token(raw.trim()).unwrap_or(raw.trim());

    let config = AuthConfig::from_env()?;
    let codec = TokenCodec::from_config(&config)?;
    let claims = codec.decode(token)?;

    serde_json::to_string_pretty(&claims)
        .map_err(|e| AuthError::TokenMalformed(format!("claims not serializable: {}", e)))
}

fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AuthError::ConfigurationError(format!("failed to read stdin: {}", e)))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
