//! `veil rand`.

use anyhow::Result;
use veil_crypto::prelude::*;

use super::Context;
use crate::output;

/// Print `len` random bytes.
pub(crate) fn rand(ctx: &Context, len: usize) -> Result<()> {
    let bytes = Rand::create()?.generate_random(len)?;
    println!("{}", output::encode(&bytes, ctx.encoding));
    Ok(())
}
