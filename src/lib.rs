// src/lib.rs
pub use document::Document;
pub use error::{AuthzError, Field, Result};
pub use generator::{
    DEFAULT_HEADER, GeneratorOptions, PREVIEW_WRAP_WIDTH, generate, generate_with_options,
};
pub use loader::{Encoding, parse_file, parse_reader, save_file};
pub use parser::{parse_lines, parse_str};
pub use types::*;

mod arena;
mod document;
mod error;
mod generator;
mod loader;
mod parser;
mod types;
pub mod validate;

#[cfg(test)]
mod tests;
