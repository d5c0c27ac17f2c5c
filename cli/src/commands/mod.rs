pub mod config;
pub mod simulate;
pub mod validate;

pub use config::ConfigArgs;
pub use simulate::SimulateArgs;
pub use validate::ValidateArgs;

use crate::error::{CliError, Result};

/// Fail with [`CliError::BelowThreshold`] when `required` is set and `score` misses it
pub(crate) fn ensure_score(score: f64, required: Option<f64>) -> Result<()> {
    match required {
        Some(required) if score < required => Err(CliError::BelowThreshold { score, required }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_score() {
        assert!(ensure_score(80.0, None).is_ok());
        assert!(ensure_score(80.0, Some(80.0)).is_ok());
        assert!(matches!(
            ensure_score(79.9, Some(80.0)),
            Err(CliError::BelowThreshold { .. })
        ));
    }
}
