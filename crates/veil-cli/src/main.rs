//! Veil CLI - run digests, MACs, key generation, signatures and KDFs from
//! the shell.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use veil_config::{Config, Encoding};
use veil_core::CryptoError;
use veil_telemetry::{LogConfig, LogFormat};

mod commands;
mod output;
mod theme;

use commands::{Context, algorithms, digest, kdf, keys, rand};
use theme::Theme;

/// Veil - cryptographic primitives from the command line
#[derive(Parser)]
#[command(name = "veil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file layered over ~/.veil/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Encoding for binary output: hex or base64
    #[arg(long, global = true)]
    encoding: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported algorithm names
    Algorithms,

    /// Hash a file or stdin
    Digest {
        /// Digest name, e.g. SHA256
        algorithm: String,
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Compute an HMAC over a file or stdin
    Mac {
        /// MAC name, e.g. HMAC|SHA256
        algorithm: String,
        /// Key as hex
        #[arg(long)]
        key_hex: String,
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Print random bytes
    Rand {
        /// Number of bytes
        len: usize,
    },

    /// Generate a key pair as public.der and private.der
    Keygen {
        /// Key generator name, e.g. RSA3072 or ECC256
        algorithm: String,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Sign a file or stdin
    Sign {
        /// Signature name, e.g. ECC256|SHA256
        algorithm: String,
        /// PKCS#8 DER private key
        #[arg(short, long)]
        key: PathBuf,
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Verify a signature over a file or stdin
    Verify {
        /// Signature name, e.g. ECC256|SHA256
        algorithm: String,
        /// SubjectPublicKeyInfo DER public key
        #[arg(short, long)]
        key: PathBuf,
        /// Signature in the output encoding
        #[arg(short, long)]
        signature: String,
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Derive a key from a password
    Kdf {
        /// KDF name, e.g. PBKDF2|SHA256, HKDF|SHA256 or SCRYPT
        algorithm: String,
        /// Password (HKDF input key material)
        #[arg(long)]
        password: String,
        /// Salt as hex
        #[arg(long)]
        salt_hex: String,
        /// HKDF info as hex
        #[arg(long)]
        info_hex: Option<String>,
        /// PBKDF2 iteration count (default from config)
        #[arg(long)]
        iterations: Option<u32>,
        /// Output length in bytes (default from config)
        #[arg(long)]
        length: Option<usize>,
    },
}

fn log_config(config: &Config, verbose: bool) -> LogConfig {
    let format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    LogConfig::new(level).with_format(format)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let resolved = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Err(e) = veil_telemetry::setup_logging(&log_config(&resolved.config, cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
    }
    for path in &resolved.loaded_files {
        tracing::debug!(path = %path.display(), "config layer");
    }

    let encoding = match cli.encoding.as_deref() {
        Some(text) => match Encoding::parse(text) {
            Some(encoding) => encoding,
            None => bail!("unknown encoding '{text}' (expected hex or base64)"),
        },
        None => resolved.config.output.encoding,
    };
    let ctx = Context {
        config: resolved.config,
        encoding,
    };

    match cli.command {
        Commands::Algorithms => algorithms::list(),
        Commands::Digest { algorithm, file } => {
            digest::digest(&ctx, &algorithm, file.as_deref())?;
        },
        Commands::Mac {
            algorithm,
            key_hex,
            file,
        } => digest::mac(&ctx, &algorithm, &key_hex, file.as_deref())?,
        Commands::Rand { len } => rand::rand(&ctx, len)?,
        Commands::Keygen { algorithm, out } => keys::keygen(&ctx, &algorithm, &out)?,
        Commands::Sign {
            algorithm,
            key,
            file,
        } => keys::sign(&ctx, &algorithm, &key, file.as_deref())?,
        Commands::Verify {
            algorithm,
            key,
            signature,
            file,
        } => {
            if !keys::verify(&ctx, &algorithm, &key, &signature, file.as_deref())? {
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Kdf {
            algorithm,
            password,
            salt_hex,
            info_hex,
            iterations,
            length,
        } => kdf::derive(
            &ctx,
            &algorithm,
            &kdf::KdfArgs {
                password: &password,
                salt_hex: &salt_hex,
                info_hex: info_hex.as_deref(),
                iterations,
                length,
            },
        )?,
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            if let Some(crypto) = e.chain().find_map(|c| c.downcast_ref::<CryptoError>()) {
                let code = crypto.code();
                eprintln!(
                    "{}",
                    Theme::dimmed(&format!("error code {} ({code})", code.as_i32()))
                );
            }
            ExitCode::FAILURE
        },
    }
}
