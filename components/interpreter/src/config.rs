//! Engine configuration

use serde::Deserialize;

/// Limits and checks applied by an [`Engine`](crate::Engine)
///
/// Missing fields take their default when loaded from JSON.
///
/// # Examples
///
/// ```
/// use interpreter::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "max_call_depth": 64 }"#).unwrap();
/// assert_eq!(config.max_call_depth, 64);
/// assert_eq!(config.instruction_limit, None);
/// assert!(config.verify_fragments);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of active script call frames
    pub max_call_depth: usize,
    /// Maximum instructions per top-level call, unlimited when `None`
    pub instruction_limit: Option<u64>,
    /// Run the verifier over fragments before loading them
    pub verify_fragments: bool,
}

impl EngineConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum call depth
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the per-call instruction budget
    pub fn with_instruction_limit(mut self, limit: u64) -> Self {
        self.instruction_limit = Some(limit);
        self
    }

    /// Enable or disable fragment verification
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_fragments = verify;
        self
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 1024,
            instruction_limit: None,
            verify_fragments: true,
        }
    }
}
