//! Error display for the command line.
//!
//! Collects an error and its `source()` chain into indented
//! "caused by:" lines.

use std::fmt;

#[derive(Debug, Clone)]
pub struct ErrorChain {
    pub primary: String,
    /// Outermost first.
    pub causes: Vec<String>,
}

impl ErrorChain {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            causes: Vec::new(),
        }
    }

    pub fn caused_by(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// ```text
    /// error: <primary message>
    ///   caused by: <cause 1>
    /// ```
    pub fn format_for_display(&self) -> String {
        let mut out = format!("error: {}", self.primary);
        for cause in &self.causes {
            out.push_str(&format!("\n  caused by: {}", cause));
        }
        out
    }
}

impl fmt::Display for ErrorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorChain {}

/// Walk `err.source()` and collect every message.
pub fn chain_from_error(err: &dyn std::error::Error) -> ErrorChain {
    let mut chain = ErrorChain::new(err.to_string());
    let mut source = err.source();
    while let Some(cause) = source {
        chain = chain.caused_by(cause.to_string());
        source = cause.source();
    }
    chain
}
