//! Category registry: wire category name to shape.

use crate::catalog::{STANDARD_ALIASES, STANDARD_SHAPES};
use crate::error::{CoreError, CoreResult};
use crate::shape::Shape;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Prefix tried by the last resolution tier.
pub const FALLBACK_PREFIX: &str = "Reg";

/// Which resolution tier matched a category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// Matched through the alias table.
    Alias,
    /// A shape carries the category name itself.
    Direct,
    /// A shape named [`FALLBACK_PREFIX`] + category name.
    Fallback,
}

/// A resolved shape and the tier that produced it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedShape {
    /// The shape records of the category conform to.
    pub shape: &'static Shape,
    /// Tier that matched.
    pub tier: ResolutionTier,
}

/// Immutable map of shapes and historical aliases.
///
/// The standard registry is built once per process and shared. Resolution
/// never mutates the registry, so one instance serves every sync task.
#[derive(Debug)]
pub struct CategoryRegistry {
    shapes: HashMap<&'static str, &'static Shape>,
    aliases: HashMap<&'static str, &'static str>,
}

impl CategoryRegistry {
    /// Returns the process-wide standard registry.
    pub fn standard() -> Arc<CategoryRegistry> {
        static STANDARD: OnceLock<Arc<CategoryRegistry>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                let mut builder = Self::builder();
                for shape in STANDARD_SHAPES {
                    builder = builder.shape(shape);
                }
                for (alias, target) in STANDARD_ALIASES {
                    builder = builder.alias(alias, target);
                }
                Arc::new(builder.build())
            })
            .clone()
    }

    /// Starts an empty registry builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Resolves a wire category name to a shape.
    ///
    /// Tiers are tried in order: alias, direct, `"Reg"` fallback. An alias
    /// whose target is not registered does not stop the search.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownCategory`] if every tier misses.
    pub fn resolve_shape(&self, name: &str) -> CoreResult<ResolvedShape> {
        if let Some(shape) = self
            .aliases
            .get(name)
            .and_then(|target| self.shapes.get(target).copied())
        {
            return Ok(ResolvedShape {
                shape,
                tier: ResolutionTier::Alias,
            });
        }

        if let Some(shape) = self.shape(name) {
            return Ok(ResolvedShape {
                shape,
                tier: ResolutionTier::Direct,
            });
        }

        let prefixed = format!("{FALLBACK_PREFIX}{name}");
        if let Some(shape) = self.shape(&prefixed) {
            return Ok(ResolvedShape {
                shape,
                tier: ResolutionTier::Fallback,
            });
        }

        Err(CoreError::unknown_category(name))
    }

    /// Looks up a shape by its own name, ignoring aliases.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&'static Shape> {
        self.shapes.get(name).copied()
    }

    /// Number of registered shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns true if no shape is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Builder for [`CategoryRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    shapes: HashMap<&'static str, &'static Shape>,
    aliases: HashMap<&'static str, &'static str>,
}

impl RegistryBuilder {
    /// Registers a shape under its own name. A later shape with the same
    /// name replaces the earlier one.
    #[must_use]
    pub fn shape(mut self, shape: &'static Shape) -> Self {
        self.shapes.insert(shape.name, shape);
        self
    }

    /// Maps a historical wire name to a shape name.
    #[must_use]
    pub fn alias(mut self, alias: &'static str, target: &'static str) -> Self {
        self.aliases.insert(alias, target);
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> CategoryRegistry {
        CategoryRegistry {
            shapes: self.shapes,
            aliases: self.aliases,
        }
    }
}
