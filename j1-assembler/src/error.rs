use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsmError {
    #[error("line {line}: invalid label: {label}")]
    InvalidLabel { line: usize, label: String },

    #[error("line {line}: duplicate label: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: unknown mnemonic: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: missing argument for {mnemonic}")]
    MissingArgument { line: usize, mnemonic: String },

    #[error("line {line}: {mnemonic} takes no argument, found: {argument}")]
    UnexpectedArgument {
        line: usize,
        mnemonic: String,
        argument: String,
    },

    #[error("line {line}: invalid argument: {argument}")]
    InvalidArgument { line: usize, argument: String },

    #[error("line {line}: undefined label: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("line {line}: LIT value {value} out of range (0..32767)")]
    LiteralOutOfRange { line: usize, value: i64 },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AsmError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Source line the error was raised at, if it came from assembly text.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::InvalidLabel { line, .. }
            | AsmError::DuplicateLabel { line, .. }
            | AsmError::UnknownMnemonic { line, .. }
            | AsmError::MissingArgument { line, .. }
            | AsmError::UnexpectedArgument { line, .. }
            | AsmError::InvalidArgument { line, .. }
            | AsmError::UndefinedLabel { line, .. }
            | AsmError::LiteralOutOfRange { line, .. } => Some(*line),
            AsmError::Io { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AsmError>;
