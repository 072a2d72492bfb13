//! `veil kdf`.

use anyhow::{Context as _, Result, bail};
use veil_config::KdfSection;
use veil_crypto::prelude::*;

use super::Context;
use crate::output;

/// Inputs taken from the command line.
pub(crate) struct KdfArgs<'a> {
    pub(crate) password: &'a str,
    pub(crate) salt_hex: &'a str,
    pub(crate) info_hex: Option<&'a str>,
    pub(crate) iterations: Option<u32>,
    pub(crate) length: Option<usize>,
}

/// Derive a key and print it.
pub(crate) fn derive(ctx: &Context, algorithm: &str, args: &KdfArgs<'_>) -> Result<()> {
    let params = build_params(&ctx.config.kdf, algorithm, args)?;
    let mut kdf =
        Kdf::create(algorithm).with_context(|| format!("cannot create KDF {algorithm}"))?;
    let key = kdf.generate_secret(&params)?;
    println!("{}", output::encode(&key, ctx.encoding));
    Ok(())
}

/// Fill the parameter set for `algorithm`, taking costs from `defaults`
/// unless given on the command line.
fn build_params(
    defaults: &KdfSection,
    algorithm: &str,
    args: &KdfArgs<'_>,
) -> Result<KdfParamsSpec> {
    let salt = hex::decode(args.salt_hex.trim()).context("--salt-hex is not valid hex")?;
    let secret = args.password.as_bytes().to_vec();
    let output_len = args.length.unwrap_or(defaults.output_len);
    let family = algorithm.split('|').next().unwrap_or(algorithm);

    if args.iterations.is_some() && family != "PBKDF2" {
        bail!("--iterations only applies to PBKDF2");
    }
    if args.info_hex.is_some() && family != "HKDF" {
        bail!("--info-hex only applies to HKDF");
    }

    let params = match family {
        "HKDF" => {
            let info = match args.info_hex {
                Some(text) => hex::decode(text.trim()).context("--info-hex is not valid hex")?,
                None => Vec::new(),
            };
            KdfParamsSpec::Hkdf(HkdfParams {
                key: secret,
                salt,
                info,
                output_len,
            })
        },
        "PBKDF2" => KdfParamsSpec::Pbkdf2(Pbkdf2Params {
            password: secret,
            salt,
            iterations: args.iterations.unwrap_or(defaults.pbkdf2_iterations),
            output_len,
        }),
        "SCRYPT" => KdfParamsSpec::Scrypt(ScryptParams {
            passphrase: secret,
            salt,
            n: defaults.scrypt_n,
            r: defaults.scrypt_r,
            p: defaults.scrypt_p,
            max_mem: defaults
                .scrypt_memory()
                .context("scrypt parameters overflow")?,
            output_len,
        }),
        other => bail!("unknown KDF family '{other}' (expected HKDF, PBKDF2 or SCRYPT)"),
    };
    Ok(params)
}
