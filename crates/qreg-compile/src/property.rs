//! Property set for sharing data between passes.

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};

use qreg_ir::BitWidth;

use crate::config::CompileConfig;

/// Properties shared between compilation passes.
///
/// The register width has a dedicated field. Analysis passes publish their
/// results (for example the register timeline or the verification report)
/// as typed custom properties; each type can have at most one value stored.
///
/// # Examples
///
/// ```
/// use qreg_compile::{CompileConfig, PropertySet};
///
/// let props = PropertySet::from_config(&CompileConfig::with_bits(6).unwrap());
/// assert_eq!(props.bit_width.map(|w| w.bits()), Some(6));
/// ```
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Register width of the function being compiled.
    pub bit_width: Option<BitWidth>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Property set seeded from a configuration.
    pub fn from_config(config: &CompileConfig) -> Self {
        Self {
            bit_width: Some(config.bit_width),
            custom: FxHashMap::default(),
        }
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}
