//! Gamma correction lookup table.

use crate::{Error, Result};

/// Gamma exponent used when the caller does not specify one.
pub const DEFAULT_GAMMA: f64 = 2.5;

/// Precomputed gamma correction table for the 8-bit channel values.
///
/// Every entry is `round(255 * (i / 255) ^ gamma)`, so the table always maps `0` to `0`
/// and `255` to `255` and never decreases in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaTable([u8; 256]);

impl GammaTable {
    /// Builds a table for the given exponent.
    ///
    /// The exponent must be a positive finite number.
    pub fn new(gamma: f64) -> Result<Self> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(Error::InvalidGamma);
        }
        Ok(Self::compute(gamma))
    }

    fn compute(gamma: f64) -> Self {
        let mut table = [0_u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let value = (255.0 * (i as f64 / 255.0).powf(gamma)).round();
            *entry = value.clamp(0.0, 255.0) as u8;
        }
        Self(table)
    }

    /// Returns a corrected value of the given channel value.
    #[inline]
    #[must_use]
    pub fn correct(&self, value: u8) -> u8 {
        self.0[usize::from(value)]
    }

    /// Returns the table entries.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::compute(DEFAULT_GAMMA)
    }
}
