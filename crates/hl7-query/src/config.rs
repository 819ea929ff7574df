//! Configuration types for the query engine.

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

/// How the engine resolves a location.
///
/// Both strategies return the same nodes for the same tree state; they
/// differ only in cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// Scan the structure index, rebuilding it first if the tree is dirty.
    #[default]
    Indexed,
    /// Walk the tree on every call, with no index upkeep.
    DirectWalk,
}

/// A boolean policy toggle, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    /// Failed singular lookups return the empty sentinel instead of `None`.
    NeverReturnNull,
    /// Component 1 of a base field resolves to the field itself.
    RollUpDotOne,
}

impl Setting {
    /// Every setting, in declaration order.
    pub const ALL: [Setting; 2] = [Setting::NeverReturnNull, Setting::RollUpDotOne];

    /// Returns the canonical identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Setting::NeverReturnNull => "never_return_null",
            Setting::RollUpDotOne => "roll_up_dot_one",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Setting {
    type Err = QueryError;

    /// Accepts the canonical identifier in any case, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Setting::ALL
            .into_iter()
            .find(|setting| setting.name() == normalized)
            .ok_or_else(|| QueryError::InvalidSetting {
                name: s.to_string(),
                reason: "unknown setting".to_string(),
            })
    }
}

/// Configuration for the query engine.
///
/// Both policies are on by default and the index strategy is used.
///
/// # Example
///
/// ```rust
/// use hl7_query::{CacheConfig, QueryConfig, Strategy};
///
/// let config = QueryConfig::builder()
///     .with_never_return_null(false)
///     .with_strategy(Strategy::DirectWalk)
///     .with_descriptor_cache(CacheConfig::default())
///     .build();
///
/// assert!(!config.never_return_null);
/// assert!(config.roll_up_dot_one);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Failed singular lookups return the empty sentinel instead of `None`.
    pub never_return_null: bool,
    /// Component 1 of a base field resolves to the field itself.
    pub roll_up_dot_one: bool,
    /// Resolution strategy.
    pub strategy: Strategy,
    /// Descriptor cache configuration (None = every descriptor is parsed).
    pub descriptor_cache: Option<CacheConfig>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            never_return_null: true,
            roll_up_dot_one: true,
            strategy: Strategy::default(),
            descriptor_cache: None,
        }
    }
}

impl QueryConfig {
    /// Creates a new builder for QueryConfig.
    pub fn builder() -> QueryConfigBuilder {
        QueryConfigBuilder::default()
    }

    /// Returns the value of a policy toggle.
    pub fn get(&self, setting: Setting) -> bool {
        match setting {
            Setting::NeverReturnNull => self.never_return_null,
            Setting::RollUpDotOne => self.roll_up_dot_one,
        }
    }

    /// Sets a policy toggle.
    pub fn set(&mut self, setting: Setting, value: bool) {
        match setting {
            Setting::NeverReturnNull => self.never_return_null = value,
            Setting::RollUpDotOne => self.roll_up_dot_one = value,
        }
    }

    /// Sets a policy toggle from text, e.g. `("roll-up-dot-one", "false")`.
    ///
    /// Fails with [`QueryError::InvalidSetting`] for an unknown identifier
    /// or a value that is not `true` or `false`. The configuration is left
    /// untouched on failure.
    pub fn set_by_name(&mut self, name: &str, value: &str) -> QueryResult<()> {
        let setting: Setting = name.parse()?;
        let value = match value.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => {
                return Err(QueryError::InvalidSetting {
                    name: name.to_string(),
                    reason: format!("expected a boolean, got '{}'", value),
                })
            }
        };
        self.set(setting, value);
        Ok(())
    }
}

/// Builder for QueryConfig.
#[derive(Debug, Clone)]
pub struct QueryConfigBuilder {
    config: QueryConfig,
}

impl Default for QueryConfigBuilder {
    fn default() -> Self {
        Self {
            config: QueryConfig::default(),
        }
    }
}

impl QueryConfigBuilder {
    /// Enables or disables the never-return-null policy.
    pub fn with_never_return_null(mut self, enabled: bool) -> Self {
        self.config.never_return_null = enabled;
        self
    }

    /// Enables or disables the roll-up-dot-one policy.
    pub fn with_roll_up_dot_one(mut self, enabled: bool) -> Self {
        self.config.roll_up_dot_one = enabled;
        self
    }

    /// Sets the resolution strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Enables the descriptor cache with the given configuration.
    pub fn with_descriptor_cache(mut self, cache: CacheConfig) -> Self {
        self.config.descriptor_cache = Some(cache);
        self
    }

    /// Builds the QueryConfig.
    pub fn build(self) -> QueryConfig {
        self.config
    }
}

/// Configuration for the descriptor cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of parsed descriptors kept.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1024 }
    }
}
