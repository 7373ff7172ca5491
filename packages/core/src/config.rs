//! Hierarchy configuration

use crate::models::ValidationError;
use serde::{Deserialize, Serialize};

/// Tunables for `HierarchyService`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HierarchyConfig {
    /// Depth used by `get_tree` when the caller gives none
    pub default_tree_depth: usize,

    /// Upper bound for any requested tree depth; larger requests are clamped
    pub max_tree_depth: usize,

    /// Ceiling for one upward walk (cycle guard, breadcrumbs)
    pub max_ancestor_steps: usize,

    /// Buffered events per subscriber before slow subscribers start lagging
    pub event_channel_capacity: usize,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            default_tree_depth: 5,
            max_tree_depth: 32,
            max_ancestor_steps: 1000,
            event_channel_capacity: 128,
        }
    }
}

impl HierarchyConfig {
    /// Resolve a requested tree depth against the default and the ceiling
    pub fn tree_depth(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_tree_depth)
            .min(self.max_tree_depth)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_ancestor_steps == 0 {
            return Err(ValidationError::InvalidConfig(
                "max_ancestor_steps must be at least 1".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(ValidationError::InvalidConfig(
                "event_channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.default_tree_depth > self.max_tree_depth {
            return Err(ValidationError::InvalidConfig(format!(
                "default_tree_depth ({}) exceeds max_tree_depth ({})",
                self.default_tree_depth, self.max_tree_depth
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HierarchyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tree_depth(None), 5);
    }

    #[test]
    fn test_requested_depth_is_clamped() {
        let config = HierarchyConfig::default();
        assert_eq!(config.tree_depth(Some(0)), 0);
        assert_eq!(config.tree_depth(Some(3)), 3);
        assert_eq!(config.tree_depth(Some(10_000)), 32);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let zero_steps = HierarchyConfig {
            max_ancestor_steps: 0,
            ..Default::default()
        };
        assert!(zero_steps.validate().is_err());

        let inverted = HierarchyConfig {
            default_tree_depth: 40,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ValidationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: HierarchyConfig = serde_json::from_str(r#"{"maxTreeDepth": 8}"#).unwrap();
        assert_eq!(config.max_tree_depth, 8);
        assert_eq!(config.default_tree_depth, 5);
    }
}
