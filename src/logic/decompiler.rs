//! Invocation of the external decompiler.

use std::panic;

use tracing::{event, Level};

use crate::config;

/// The decompiler. Everything it needs to know (input, selected ranges,
/// output format) travels in the config. Returns the textual output, which
/// for [config::OutputFormat::Json] is the token stream.
pub trait Decompiler {
    fn decompile(&self, config: &config::Config) -> Result<String, DecompileError>;
}

impl<F> Decompiler for F where F: Fn(&config::Config) -> Result<String, DecompileError> {
    fn decompile(&self, config: &config::Config) -> Result<String, DecompileError> {
        self(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecompileError {
    #[error("decompilation error code = {code}: {diagnostic}")]
    Failed {
        code: i32,
        diagnostic: String,
    },

    #[error("decompilation exception: {0}")]
    Panicked(String),
}

/// Calls the decompiler, turning a panic inside it into an error so that a
/// misbehaving decompiler never takes the host down with it. Blocks until the
/// decompiler returns.
pub fn run_decompilation(decompiler: &dyn Decompiler, config: &config::Config) -> Result<String, DecompileError> {
    event!(Level::DEBUG, format = ?config.output_format, ranges = ?config.selected_ranges, "decompiling");

    let result = match panic::catch_unwind(panic::AssertUnwindSafe(|| decompiler.decompile(config))) {
        Ok(result) => result,
        Err(payload) => Err(DecompileError::Panicked(
            payload.downcast_ref::<&str>().map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown".to_string()))),
    };

    if let Err(e) = &result {
        event!(Level::WARN, "{}", e);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;

    #[test]
    fn passes_output_through() {
        let decompiler = |_: &config::Config| -> Result<String, DecompileError> { Ok("{}".to_string()) };
        assert_eq!(run_decompilation(&decompiler, &config::Config::default()), Ok("{}".to_string()));
    }

    #[test]
    fn error_codes_are_reported() {
        let decompiler = |_: &config::Config| -> Result<String, DecompileError> {
            Err(DecompileError::Failed { code: 3, diagnostic: "bad input".to_string() })
        };
        let result = run_decompilation(&decompiler, &config::Config::default());

        assert_matches!(&result, Err(DecompileError::Failed { code: 3, .. }));
        assert_eq!(result.unwrap_err().to_string(), "decompilation error code = 3: bad input");
    }

    #[test]
    fn panics_are_caught() {
        let decompiler = |_: &config::Config| -> Result<String, DecompileError> { panic!("llvm exploded") };

        assert_eq!(run_decompilation(&decompiler, &config::Config::default()),
                   Err(DecompileError::Panicked("llvm exploded".to_string())));
    }
}
