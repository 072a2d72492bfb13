//! `veil digest` and `veil mac`.

use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::debug;
use veil_crypto::prelude::*;

use super::{Context, stream_input};
use crate::output;

/// Hash `file` (or stdin) and print the digest.
pub(crate) fn digest(ctx: &Context, algorithm: &str, file: Option<&Path>) -> Result<()> {
    let mut md =
        Md::create(algorithm).with_context(|| format!("cannot create digest {algorithm}"))?;
    stream_input(file, |chunk| md.update(chunk))?;
    let value = md.do_final()?;
    debug!(algorithm, len = value.len(), "digest computed");
    println!("{}", output::encode(&value, ctx.encoding));
    Ok(())
}

/// MAC `file` (or stdin) under a hex key and print the tag.
pub(crate) fn mac(
    ctx: &Context,
    algorithm: &str,
    key_hex: &str,
    file: Option<&Path>,
) -> Result<()> {
    let key_bytes = hex::decode(key_hex.trim()).context("--key-hex is not valid hex")?;
    let mut mac =
        Mac::create(algorithm).with_context(|| format!("cannot create MAC {algorithm}"))?;
    let key = SymKeyGenerator::create("HMAC")?.convert_sym_key(&key_bytes)?;
    mac.init(&key)?;
    stream_input(file, |chunk| mac.update(chunk))?;
    let tag = mac.do_final()?;
    println!("{}", output::encode(&tag, ctx.encoding));
    Ok(())
}
