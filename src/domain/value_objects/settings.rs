//! Workflow settings value object
//!
//! Settings are snapshotted into each editing session when it opens, so a
//! change made through the settings API only affects sessions opened later.
//! They carry serde derives because they are stored as key/value pairs and
//! exchanged over the REST API.

use serde::{Deserialize, Serialize};

/// Whether step 8 requires every solution to carry at least one offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferPolicy {
    Required,
    Optional,
}

impl std::str::FromStr for OfferPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(OfferPolicy::Required),
            "optional" => Ok(OfferPolicy::Optional),
            other => Err(format!("unknown offer policy: {}", other)),
        }
    }
}

impl std::fmt::Display for OfferPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferPolicy::Required => write!(f, "required"),
            OfferPolicy::Optional => write!(f, "optional"),
        }
    }
}

/// Session-scoped workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSettings {
    /// Number of problems a circle must have, and the most it may hold
    pub max_problems: usize,
    /// Step 8 offer requirement
    pub offer_policy: OfferPolicy,
    /// Upper bound for a single content generation request
    pub generation_timeout_secs: u64,
    /// How many title suggestions to keep per scope
    pub max_suggestions: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_problems: 5,
            offer_policy: OfferPolicy::Required,
            generation_timeout_secs: 120,
            max_suggestions: 10,
        }
    }
}

impl WorkflowSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_problems: env_or("JOURNEY_MAX_PROBLEMS", defaults.max_problems),
            offer_policy: env_or("JOURNEY_OFFER_POLICY", defaults.offer_policy),
            generation_timeout_secs: env_or(
                "JOURNEY_GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout_secs,
            ),
            max_suggestions: env_or("JOURNEY_MAX_SUGGESTIONS", defaults.max_suggestions),
        }
    }

    pub fn generation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.generation_timeout_secs)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
