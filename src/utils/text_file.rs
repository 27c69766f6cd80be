use std::fs;
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("env pattern is valid"));

/// Read a text file that may be UTF-8 (with or without BOM) or GBK.
/// Config and vocabulary files are often saved by Chinese-locale editors.
pub fn load_text_file_with_guess_encoding(path: &Path) -> io::Result<String> {
    let mut bytes = fs::read(path)?;
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(0..UTF8_BOM.len());
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            let (text, _, had_errors) = encoding_rs::GBK.decode(&bytes);
            if had_errors {
                tracing::warn!("{} is neither UTF-8 nor GBK, decoded lossily", path.display());
            }
            Ok(text.into_owned())
        }
    }
}

/// Replace `${VAR_NAME}` with the environment value; unknown variables are
/// left as written.
pub fn substitute_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
