//! `veil keygen`, `veil sign` and `veil verify`.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::debug;
use veil_crypto::prelude::*;

use super::{Context, read_file, read_input};
use crate::output;
use crate::theme::Theme;

/// File name of the SubjectPublicKeyInfo DER written by `keygen`.
pub(crate) const PUBLIC_FILE: &str = "public.der";
/// File name of the PKCS#8 DER written by `keygen`.
pub(crate) const PRIVATE_FILE: &str = "private.der";

/// Give a bare `RSA` family the configured modulus size.
fn with_default_rsa_bits(algorithm: &str, bits: u32) -> String {
    match algorithm.split_once('|') {
        Some(("RSA", rest)) => format!("RSA{bits}|{rest}"),
        None if algorithm == "RSA" => format!("RSA{bits}"),
        _ => algorithm.to_owned(),
    }
}

/// Key generator name for a signature algorithm: its leading token.
fn key_algorithm(algorithm: &str) -> &str {
    algorithm.split('|').next().unwrap_or(algorithm)
}

/// Generate a key pair and write both halves as DER under `out`.
pub(crate) fn keygen(ctx: &Context, algorithm: &str, out: &Path) -> Result<()> {
    let algorithm = with_default_rsa_bits(algorithm, ctx.config.keygen.default_rsa_bits);
    let pair = AsyKeyGenerator::create(&algorithm)
        .with_context(|| format!("cannot create key generator {algorithm}"))?
        .generate_key_pair()?;
    let public = pair
        .public_key()
        .context("generator returned no public key")?
        .get_encoded()?;
    let private = pair
        .private_key()
        .context("generator returned no private key")?
        .get_encoded()?;

    std::fs::create_dir_all(out).with_context(|| format!("cannot create {}", out.display()))?;
    let public_path = out.join(PUBLIC_FILE);
    let private_path = out.join(PRIVATE_FILE);
    std::fs::write(&public_path, public.as_slice())
        .with_context(|| format!("cannot write {}", public_path.display()))?;
    write_secret(&private_path, &private)?;
    debug!(algorithm = %algorithm, out = %out.display(), "wrote key pair");

    println!("{}", Theme::success(&format!("Generated {algorithm} key pair")));
    println!("  {}", Theme::kv("Public key", &public_path.display().to_string()));
    println!("  {}", Theme::kv("Private key", &private_path.display().to_string()));
    Ok(())
}

#[cfg(unix)]
fn write_secret(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("cannot write {}", path.display()))
}

#[cfg(not(unix))]
fn write_secret(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("cannot write {}", path.display()))
}

/// Sign `file` (or stdin) with a PKCS#8 private key and print the signature.
///
/// The message is passed in one call since Ed25519 cannot stream.
pub(crate) fn sign(
    ctx: &Context,
    algorithm: &str,
    key: &Path,
    file: Option<&Path>,
) -> Result<()> {
    let algorithm = with_default_rsa_bits(algorithm, ctx.config.keygen.default_rsa_bits);
    let der = read_file(key)?;
    let pair = AsyKeyGenerator::create(key_algorithm(&algorithm))?
        .convert_key(None, Some(der.as_slice()))
        .with_context(|| format!("{} is not a PKCS#8 private key", key.display()))?;
    let private = pair.private_key().context("key file holds no private key")?;

    let mut signer =
        Sign::create(&algorithm).with_context(|| format!("cannot create signer {algorithm}"))?;
    signer.init(private)?;
    let signature = signer.sign(&read_input(file)?)?;
    println!("{}", output::encode(&signature, ctx.encoding));
    Ok(())
}

/// Check `signature` over `file` (or stdin) with an SPKI public key.
///
/// Returns whether the signature is valid.
pub(crate) fn verify(
    ctx: &Context,
    algorithm: &str,
    key: &Path,
    signature: &str,
    file: Option<&Path>,
) -> Result<bool> {
    let algorithm = with_default_rsa_bits(algorithm, ctx.config.keygen.default_rsa_bits);
    let signature = output::decode(signature, ctx.encoding).context("bad --signature")?;
    let der = read_file(key)?;
    let pair = AsyKeyGenerator::create(key_algorithm(&algorithm))?
        .convert_key(Some(der.as_slice()), None)
        .with_context(|| format!("{} is not a SubjectPublicKeyInfo key", key.display()))?;
    let public = pair.public_key().context("key file holds no public key")?;

    let mut verifier =
        Verify::create(&algorithm).with_context(|| format!("cannot create verifier {algorithm}"))?;
    verifier.init(public)?;
    let valid = verifier.verify(&read_input(file)?, &signature)?;
    println!("{}", Theme::verdict(valid));
    Ok(valid)
}
