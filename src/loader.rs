//! File and stream shell around the parser and generator.
//!
//! This is the only module that performs I/O. Text is decoded completely
//! before parsing starts and encoded only after generation has finished.

use std::fs;
use std::io::Read;
use std::str::FromStr;

use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::document::Document;
use crate::error::{AuthzError, Result};
use crate::generator::{GeneratorOptions, generate_with_options};
use crate::parser::parse_str;

/// Character encodings accepted for authz files. Names match case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Encoding {
    #[strum(to_string = "UTF-8", serialize = "utf8")]
    Utf8,
    #[strum(to_string = "US-ASCII", serialize = "ascii")]
    UsAscii,
    #[strum(to_string = "ISO-8859-1", serialize = "latin1")]
    Latin1,
}

impl Encoding {
    /// Resolve an encoding name supplied by the caller.
    pub fn from_name(name: &str) -> Result<Self> {
        Encoding::from_str(name.trim())
            .map_err(|_| AuthzError::Io(format!("unsupported encoding '{name}'")))
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        let text = match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| AuthzError::Io(format!("input is not valid UTF-8: {e}")))?,
            Encoding::UsAscii => {
                if !bytes.is_ascii() {
                    return Err(AuthzError::Io("input is not valid US-ASCII".to_string()));
                }
                bytes.iter().map(|b| char::from(*b)).collect()
            }
            Encoding::Latin1 => bytes.iter().map(|b| char::from(*b)).collect(),
        };
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::UsAscii => {
                if !text.is_ascii() {
                    return Err(AuthzError::Io(
                        "text cannot be encoded as US-ASCII".to_string(),
                    ));
                }
                Ok(text.as_bytes().to_vec())
            }
            Encoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        AuthzError::Io(format!("character '{c}' cannot be encoded as ISO-8859-1"))
                    })
                })
                .collect(),
        }
    }
}

/// Read a whole stream in the named encoding and parse it.
pub fn parse_reader<R: Read>(mut reader: R, encoding: &str) -> Result<Document> {
    let encoding = Encoding::from_name(encoding)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_str(&encoding.decode(&bytes)?)
}

pub fn parse_file(
    path: impl AsRef<std::path::Path>,
    encoding: &str,
) -> Result<Document> {
    let path = path.as_ref();
    let encoding = Encoding::from_name(encoding)?;
    let bytes = fs::read(path)
        .map_err(|e| AuthzError::Io(format!("failed to read {}: {e}", path.display())))?;
    debug!(
        event = "Load",
        phase = "Read",
        file = %path.display(),
        bytes = bytes.len(),
        encoding = %encoding
    );
    parse_str(&encoding.decode(&bytes)?)
}

pub fn save_file(
    path: impl AsRef<std::path::Path>,
    doc: &Document,
    options: &GeneratorOptions,
    encoding: &str,
) -> Result<()> {
    let path = path.as_ref();
    let encoding = Encoding::from_name(encoding)?;
    let bytes = encoding.encode(&generate_with_options(doc, options))?;
    fs::write(path, &bytes)
        .map_err(|e| AuthzError::Io(format!("failed to write {}: {e}", path.display())))?;
    debug!(
        event = "Save",
        phase = "Written",
        file = %path.display(),
        bytes = bytes.len(),
        encoding = %encoding
    );
    Ok(())
}
