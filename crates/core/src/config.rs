//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Safety caps on the run pass fixpoint. They turn runaway self-registration
/// into a reported failure instead of a hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of sweeps over all roots.
    pub max_root_sweeps: usize,
    /// Maximum number of worklist rounds within one definition set.
    pub max_set_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_root_sweeps: 100,
            max_set_iterations: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"max_set_iterations": 7}"#).unwrap();
        assert_eq!(cfg.max_set_iterations, 7);
        assert_eq!(cfg.max_root_sweeps, 100);
    }
}
