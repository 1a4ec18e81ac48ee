//! Parsing options for document assembly.

/// Default limit for seal documents nested inside seal documents.
pub const DEFAULT_MAX_SEAL_DEPTH: usize = 4;

/// Options for controlling document parsing behavior.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// How to handle failures in optional parts.
    pub error_mode: ErrorMode,

    /// Whether page parts are parsed in parallel.
    pub parallel: bool,

    /// Whether vector-document seals are parsed into nested documents.
    pub decode_seal_documents: bool,

    /// Maximum nesting of seal documents (0 disables nested parsing).
    pub max_seal_depth: usize,

    /// Whether embedded font files are read and handed to the font loader.
    pub load_fonts: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            decode_seal_documents: true,
            max_seal_depth: DEFAULT_MAX_SEAL_DEPTH,
            load_fonts: true,
        }
    }
}

impl ParseOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets lenient error handling (skip broken optional parts).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Sets strict error handling (fail on any broken part).
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Disables parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Keeps vector-document seals as raw bytes.
    pub fn without_seal_documents(mut self) -> Self {
        self.decode_seal_documents = false;
        self
    }

    /// Sets the maximum seal document nesting.
    pub fn with_max_seal_depth(mut self, depth: usize) -> Self {
        self.max_seal_depth = depth;
        self
    }

    /// Skips reading embedded font files.
    pub fn without_fonts(mut self) -> Self {
        self.load_fonts = false;
        self
    }

    /// Returns true if errors should be ignored where possible.
    pub fn is_lenient(&self) -> bool {
        matches!(self.error_mode, ErrorMode::Lenient)
    }
}

/// How to handle parsing errors in optional parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error, including optional parts.
    Strict,
    /// Log and skip problematic optional parts.
    #[default]
    Lenient,
}
