//! Compilation configuration.

use serde::{Deserialize, Serialize};

use qreg_ir::{BitWidth, MIN_INTEGER_BIT_WIDTH};

use crate::error::{CompileError, CompileResult};

/// Settings for compiling one function.
///
/// # Example
///
/// ```
/// use qreg_compile::CompileConfig;
///
/// let config = CompileConfig::from_json(r#"{ "bit_width": 6 }"#).unwrap();
/// assert_eq!(config.bit_width.bits(), 6);
/// assert!(config.enforce);
///
/// assert!(CompileConfig::from_json(r#"{ "bit_width": 40 }"#).is_err());
/// // one bit is reserved for predicates
/// assert!(CompileConfig::from_json(r#"{ "bit_width": 1 }"#).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileConfig {
    /// Register width for every integer variable.
    pub bit_width: BitWidth,
    /// Run the constraint enforcement pass after translation.
    #[serde(default = "default_true")]
    pub enforce: bool,
    /// Verify the constraints after all passes.
    #[serde(default = "default_true")]
    pub verify: bool,
}

fn default_true() -> bool {
    true
}

impl CompileConfig {
    /// Configuration with the given width and every pass enabled.
    pub fn new(bit_width: BitWidth) -> Self {
        Self {
            bit_width,
            enforce: true,
            verify: true,
        }
    }

    /// Configuration from a raw bit count.
    pub fn with_bits(bits: u32) -> CompileResult<Self> {
        let config = Self::new(BitWidth::new(bits)?);
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> CompileResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject widths that cannot hold a signed integer distinct from a predicate.
    pub fn validate(&self) -> CompileResult<()> {
        check_integer_width(self.bit_width)
    }

    /// Skip the enforcement pass.
    #[must_use]
    pub fn without_enforcement(mut self) -> Self {
        self.enforce = false;
        self
    }

    /// Skip the final verification.
    #[must_use]
    pub fn without_verification(mut self) -> Self {
        self.verify = false;
        self
    }
}

pub(crate) fn check_integer_width(width: BitWidth) -> CompileResult<()> {
    if width.is_integer_width() {
        Ok(())
    } else {
        Err(CompileError::InvalidConfig(format!(
            "integer registers need at least {MIN_INTEGER_BIT_WIDTH} bits, got {}",
            width.bits()
        )))
    }
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self::new(BitWidth::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompileConfig::from_json(r#"{ "bit_width": 4, "verify": false }"#).unwrap();
        assert_eq!(config.bit_width.bits(), 4);
        assert!(config.enforce);
        assert!(!config.verify);
    }

    #[test]
    fn test_rejects_bad_width() {
        assert!(matches!(
            CompileConfig::with_bits(0),
            Err(CompileError::InvalidConfig(_))
        ));
        assert!(matches!(
            CompileConfig::from_json(r#"{ "bit_width": 0 }"#),
            Err(CompileError::ConfigParse(_))
        ));
        assert!(CompileConfig::from_json(r#"{ "bit_width": 4, "extra": 1 }"#).is_err());
    }

    #[test]
    fn test_rejects_predicate_width() {
        assert!(matches!(
            CompileConfig::with_bits(1),
            Err(CompileError::InvalidConfig(_))
        ));
        assert!(matches!(
            CompileConfig::from_json(r#"{ "bit_width": 1 }"#),
            Err(CompileError::InvalidConfig(_))
        ));
        assert!(CompileConfig::new(BitWidth::BOOL).validate().is_err());
        assert!(CompileConfig::with_bits(2).is_ok());
    }
}
