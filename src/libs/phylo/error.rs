use std::fmt;

pub type Result<T> = std::result::Result<T, MulRfError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MulRfError {
    /// Malformed NEWICK or constraint text
    ParseError {
        /// A human-readable message explaining the error
        message: String,
        /// The line number (1-based)
        line: usize,
        /// The column number (1-based)
        column: usize,
        /// The snippet of input where the error occurred
        snippet: String,
    },
    /// Inputs that are well formed but unusable together
    /// (bad weights, clade lists, starting trees)
    Config(String),
    /// A broken internal invariant, e.g. incremental and full scores disagree
    Internal(String),
}

impl MulRfError {
    pub fn config(msg: impl Into<String>) -> Self {
        MulRfError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        MulRfError::Internal(msg.into())
    }
}

impl fmt::Display for MulRfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MulRfError::ParseError {
                message,
                line,
                column,
                snippet,
            } => {
                write!(
                    f,
                    "Parse error at line {}, column {}:\n{}\nSnippet: \"{}\"",
                    line, column, message, snippet
                )
            }
            MulRfError::Config(msg) => write!(f, "{}", msg),
            MulRfError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for MulRfError {}
