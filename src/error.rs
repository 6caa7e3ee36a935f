//! Error types for the wire-chamber field solver.
//!
//! This module provides a unified error type [`FieldError`] covering rejected
//! geometry input, fatal cell conditions, numerical failures of the charge and
//! signal solves, and parsing of cell description files.

use thiserror::Error;

/// Result type alias using [`FieldError`].
pub type Result<T> = std::result::Result<T, FieldError>;

/// Unified error type for all field solver operations.
#[derive(Error, Debug)]
pub enum FieldError {
    // ============ Configuration Errors ============
    /// A mutator received an out-of-range parameter
    #[error("Invalid {element} parameter: {message}")]
    InvalidParameter { element: String, message: String },

    /// Both planes on an axis are already in use
    #[error("Cannot add another plane at constant {axis}: both slots are in use")]
    PlaneSlotsFull { axis: char },

    /// Strip or pixel requested on an axis without planes
    #[error("There are no planes at constant {axis} defined")]
    NoPlaneOnAxis { axis: char },

    /// Strip direction incompatible with the plane orientation
    #[error("Invalid strip direction '{direction}' for a plane at constant {axis}")]
    InvalidDirection { axis: char, direction: char },

    /// Accessor index outside the populated range
    #[error("No {what} with index {index}")]
    IndexOutOfRange { what: &'static str, index: usize },

    // ============ Cell Errors ============
    /// Fewer than two conductors survived the cell check
    #[error("Cell has only {count} usable element(s); at least 2 are required")]
    TooFewElements { count: usize },

    /// All conductors are at the same potential
    #[error("All conductors are at the same potential ({voltage} V)")]
    NoVoltageRange { voltage: f64 },

    /// The geometry does not match any analytic topology
    #[error("Unsupported cell configuration: {message}")]
    UnsupportedCell { message: String },

    /// A strip or pixel has no usable anode-cathode gap
    #[error("Cannot determine the gap of a {element} on plane {plane}")]
    MissingGap { element: &'static str, plane: usize },

    /// The cell failed to prepare earlier and has not been modified since
    #[error("Cell preparation failed; modify the geometry before retrying")]
    CellUnusable,

    // ============ Numerical Errors ============
    /// Matrix is singular and cannot be inverted
    #[error("Singular matrix - conductor configuration has no unique solution")]
    SingularMatrix,

    /// Fourier mode count is not usable by the transform
    #[error("Invalid Fourier mode count {count}: must be 0 or a power of two")]
    InvalidFourierCount { count: usize },

    // ============ Signal Errors ============
    /// Weighting fields requested without any readout group
    #[error("No readout groups defined; weighting fields are not available")]
    NoReadoutGroups,

    /// No signal kernel exists for this cell type and Fourier setting
    #[error("Weighting fields are not available for cell type {cell_type}")]
    UnsupportedSignalCell { cell_type: String },

    // ============ Cell File Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Unknown element keyword
    #[error("Unknown element '{keyword}' at line {line}")]
    UnknownElement { keyword: String, line: usize },

    // ============ I/O Errors ============
    /// Error reading a cell file
    #[error("Failed to read cell file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl FieldError {
    /// Create an invalid parameter error
    pub fn invalid(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported cell error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedCell {
            message: message.into(),
        }
    }

    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }
}
