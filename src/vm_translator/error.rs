// Translator Error Handling

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TranslatorError {
    // Command recognition
    UnrecognizedCommand(String),
    MalformedOperand(String),

    // Addressing
    UnknownSegment(String),

    // Wraps any of the above with the unit and 1-based line it came from
    InUnit {
        unit: String,
        line: usize,
        error: Box<TranslatorError>,
    },

    // Outer layers
    Io(String),
    Config(String),
}

impl TranslatorError {
    /// Attach a source location, unless one is already present
    pub fn in_unit(self, unit: &str, line: usize) -> Self {
        match self {
            located @ TranslatorError::InUnit { .. } => located,
            error => TranslatorError::InUnit {
                unit: unit.to_string(),
                line,
                error: Box::new(error),
            },
        }
    }
}

impl fmt::Display for TranslatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TranslatorError::UnrecognizedCommand(mnemonic) => {
                write!(f, "Unrecognized command '{}'", mnemonic)
            }
            TranslatorError::MalformedOperand(msg) => {
                write!(f, "Malformed operand: {}", msg)
            }
            TranslatorError::UnknownSegment(segment) => {
                write!(f, "Unknown memory segment '{}'", segment)
            }
            TranslatorError::InUnit { unit, line, error } => {
                write!(f, "{}.vm:{}: {}", unit, line, error)
            }
            TranslatorError::Io(msg) => {
                write!(f, "IO error: {}", msg)
            }
            TranslatorError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
        }
    }
}

impl std::error::Error for TranslatorError {}

impl From<std::io::Error> for TranslatorError {
    fn from(err: std::io::Error) -> Self {
        TranslatorError::Io(err.to_string())
    }
}
