// Translator configuration
//
// Optional TOML file; every key falls back to the conventional Hack platform value.
//
//   stack_base = 256
//   entry_function = "Sys.init"
//   bootstrap_function = "OS"
//   first_unit = "Sys"
//   emit_comments = true
//   halt_loop = true

use crate::vm_translator::error::TranslatorError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    /// Initial stack pointer set by the bootstrap
    pub stack_base: u16,
    /// Function the bootstrap calls
    pub entry_function: String,
    /// Synthetic wrapper function that owns the bootstrap call frame
    pub bootstrap_function: String,
    /// Unit moved to the front when translating a directory
    pub first_unit: String,
    /// Echo each VM command as a comment before its instructions
    pub emit_comments: bool,
    /// Park the CPU in a loop if the entry function ever returns
    pub halt_loop: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            stack_base: 256,
            entry_function: "Sys.init".to_string(),
            bootstrap_function: "OS".to_string(),
            first_unit: "Sys".to_string(),
            emit_comments: true,
            halt_loop: true,
        }
    }
}

impl TranslatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, TranslatorError> {
        toml::from_str(text).map_err(|err| TranslatorError::Config(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, TranslatorError> {
        let text = fs::read_to_string(path).map_err(|err| {
            TranslatorError::Config(format!("cannot read '{}': {}", path.display(), err))
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }
}
