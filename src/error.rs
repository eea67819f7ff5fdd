//! Error types for VM translation.
//!
//! Every source-level error names the unit and line it came from. There is no
//! recoverable class: the first error aborts the run.

use thiserror::Error;

/// Translation error with source location.
#[derive(Error, Debug)]
pub enum TranslateError {
    // Classification errors
    #[error("{file}:{line}: invalid command: {command}")]
    InvalidCommand {
        line: usize,
        file: String,
        command: String,
    },

    #[error("{file}:{line}: invalid segment: {segment}")]
    InvalidSegment {
        line: usize,
        file: String,
        segment: String,
    },

    #[error("{file}:{line}: invalid number: {value}")]
    InvalidNumber {
        line: usize,
        file: String,
        value: String,
    },

    #[error("{file}:{line}: index {index} out of range for segment {segment}")]
    IndexOutOfRange {
        line: usize,
        file: String,
        index: u16,
        segment: String,
    },

    #[error("{file}:{line}: cannot pop to constant segment")]
    PopToConstant { line: usize, file: String },

    #[error("{file}:{line}: invalid pointer index {index} (must be 0 or 1)")]
    InvalidPointerIndex {
        line: usize,
        file: String,
        index: u16,
    },

    #[error("{file}:{line}: invalid temp index {index} (must be 0-7)")]
    InvalidTempIndex {
        line: usize,
        file: String,
        index: u16,
    },

    #[error("{file}:{line}: too many arguments: {count}")]
    TooManyArguments {
        line: usize,
        file: String,
        count: u16,
    },

    // Symbol validation
    #[error("{file}:{line}: invalid label name: {name}")]
    InvalidLabelName {
        line: usize,
        file: String,
        name: String,
    },

    #[error("{file}:{line}: invalid function name: {name}")]
    InvalidFunctionName {
        line: usize,
        file: String,
        name: String,
    },

    #[error("invalid entry function name: {name:?}")]
    InvalidEntryName { name: String },

    // Driver errors
    #[error("no source units to translate")]
    NoSourceUnits,

    #[error("no .vm files found in directory: {path}")]
    NoVmFiles { path: String },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("path is not a .vm file or directory: {path}")]
    InvalidPath { path: String },
}

impl TranslateError {
    /// Source location of the error, if it has one.
    pub fn location(&self) -> Option<(&str, usize)> {
        match self {
            Self::InvalidCommand { file, line, .. }
            | Self::InvalidSegment { file, line, .. }
            | Self::InvalidNumber { file, line, .. }
            | Self::IndexOutOfRange { file, line, .. }
            | Self::PopToConstant { file, line }
            | Self::InvalidPointerIndex { file, line, .. }
            | Self::InvalidTempIndex { file, line, .. }
            | Self::TooManyArguments { file, line, .. }
            | Self::InvalidLabelName { file, line, .. }
            | Self::InvalidFunctionName { file, line, .. } => Some((file.as_str(), *line)),
            _ => None,
        }
    }
}

/// Result type alias for translation.
pub type Result<T> = std::result::Result<T, TranslateError>;
