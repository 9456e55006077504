//! Complexity router
//!
//! Classifies a query into a [`Complexity`] tier by keyword scoring and maps
//! the tier to the backend (on-device small model vs. cloud-scale model) that
//! should service it.
//!
//! # Scoring
//!
//! | Condition | Tier |
//! |-----------|------|
//! | complex matches > simple matches | `Complex` |
//! | otherwise, any simple match | `Simple` |
//! | no matches | `Medium` |

use std::collections::HashMap;
use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::config::{BackendTable, RouterConfig};
use crate::context::ConversationContext;

/// Confidence reported with every decision
pub const ROUTING_CONFIDENCE: f32 = 0.85;

/// Expected reasoning depth of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Device-control command, serviceable on device
    Simple,
    /// General query, default tier
    Medium,
    /// Multi-step reasoning or planning
    Complex,
}

impl Complexity {
    /// Fixed human-readable explanation for the tier
    #[must_use]
    pub const fn rationale(&self) -> &'static str {
        match self {
            Self::Simple => "simple device-control command, can be handled on device",
            Self::Medium => "general query, handled by the cloud",
            Self::Complex => "complex reasoning task, needs a large cloud model",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of routing one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub complexity: Complexity,
    /// Backend id from the tier table (e.g. "cloud-large")
    pub backend: String,
    pub rationale: String,
    /// Always within `[0, 1]`
    pub confidence: f32,
}

/// Where a backend is reachable
#[derive(Debug)]
pub struct BackendEndpoint {
    pub url: String,
    pub api_key: Option<SecretString>,
}

/// Keyword-scored complexity classifier
#[derive(Debug)]
pub struct ComplexityRouter {
    simple_keywords: Vec<String>,
    complex_keywords: Vec<String>,
    backends: BackendTable,
    endpoints: HashMap<String, BackendEndpoint>,
}

impl Default for ComplexityRouter {
    fn default() -> Self {
        Self::new(&RouterConfig::default())
    }
}

impl ComplexityRouter {
    /// Create a router from configuration
    ///
    /// Keywords are lowercased once here so matching is case-insensitive.
    #[must_use]
    pub fn new(config: &RouterConfig) -> Self {
        let normalize = |words: &[String]| -> Vec<String> {
            words.iter().map(|w| w.trim().to_lowercase()).collect()
        };

        let router = Self {
            simple_keywords: normalize(&config.simple_keywords),
            complex_keywords: normalize(&config.complex_keywords),
            backends: config.backends.clone(),
            endpoints: HashMap::new(),
        };

        tracing::debug!(
            simple = router.simple_keywords.len(),
            complex = router.complex_keywords.len(),
            "complexity router initialized"
        );

        router
    }

    /// Classify `query` and pick its backend
    ///
    /// The context is accepted for interface stability; the current scoring
    /// only looks at the query text.
    #[must_use]
    pub fn route(&self, query: &str, _context: &ConversationContext) -> RoutingDecision {
        let complexity = self.classify(query);
        let decision = RoutingDecision {
            complexity,
            backend: self.backend_for(complexity).to_string(),
            rationale: complexity.rationale().to_string(),
            confidence: ROUTING_CONFIDENCE,
        };

        tracing::debug!(
            complexity = %decision.complexity,
            backend = %decision.backend,
            "query routed"
        );

        decision
    }

    /// Score the query against both keyword sets
    #[must_use]
    pub fn classify(&self, query: &str) -> Complexity {
        let query = query.to_lowercase();
        let simple_score = count_matches(&query, &self.simple_keywords);
        let complex_score = count_matches(&query, &self.complex_keywords);

        tracing::trace!(simple_score, complex_score, "complexity scores");

        if complex_score > simple_score {
            Complexity::Complex
        } else if simple_score > 0 {
            Complexity::Simple
        } else {
            Complexity::Medium
        }
    }

    /// Backend id configured for a tier
    #[must_use]
    pub fn backend_for(&self, complexity: Complexity) -> &str {
        match complexity {
            Complexity::Simple => &self.backends.simple,
            Complexity::Medium => &self.backends.medium,
            Complexity::Complex => &self.backends.complex,
        }
    }

    /// Record where a backend is reachable
    ///
    /// Re-registering a backend id replaces the earlier endpoint.
    pub fn register_backend(&mut self, backend: impl Into<String>, endpoint: BackendEndpoint) {
        let backend = backend.into();
        tracing::info!(backend = %backend, url = %endpoint.url, "backend registered");
        self.endpoints.insert(backend, endpoint);
    }

    /// Endpoint of the backend recommended by `decision`, if registered
    #[must_use]
    pub fn endpoint_for(&self, decision: &RoutingDecision) -> Option<&BackendEndpoint> {
        self.endpoints.get(&decision.backend)
    }
}

fn count_matches(query: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|kw| query.contains(kw.as_str())).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ConversationTurn, Role};

    fn route(query: &str) -> RoutingDecision {
        ComplexityRouter::default().route(query, &ConversationContext::default())
    }

    #[test]
    fn device_command_is_simple() {
        let decision = route("打开客厅灯");
        assert_eq!(decision.complexity, Complexity::Simple);
        assert_eq!(decision.backend, "on-device-small");
    }

    #[test]
    fn planning_request_is_complex() {
        let decision = route("周末去露营，帮我规划一下");
        assert_eq!(decision.complexity, Complexity::Complex);
        assert_eq!(decision.backend, "cloud-large");
    }

    #[test]
    fn no_matches_defaults_to_medium() {
        let router = ComplexityRouter::default();
        let context = ConversationContext::default();
        for _ in 0..3 {
            let decision = router.route("what is the capital of France", &context);
            assert_eq!(decision.complexity, Complexity::Medium);
            assert_eq!(decision.backend, "cloud-medium");
        }
        assert_eq!(route("").complexity, Complexity::Medium);
    }

    #[test]
    fn tie_prefers_simple() {
        // One simple ("打开") and one complex ("帮我") keyword
        assert_eq!(route("帮我打开灯").complexity, Complexity::Simple);
    }

    #[test]
    fn complex_wins_regardless_of_context() {
        let router = ComplexityRouter::default();
        let context = ConversationContext::from_turns(vec![
            ConversationTurn::new(Role::User, "打开灯"),
            ConversationTurn::new(Role::Assistant, "好的"),
        ]);
        let decision = router.route("分析一下，比较这两个方案", &context);
        assert_eq!(decision.complexity, Complexity::Complex);
        assert_eq!(decision.backend, "cloud-large");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let config = RouterConfig {
            simple_keywords: vec!["Turn On".to_string()],
            complex_keywords: vec!["PLAN".to_string()],
            backends: BackendTable::default(),
        };
        let router = ComplexityRouter::new(&config);
        assert_eq!(router.classify("TURN ON the lights"), Complexity::Simple);
        assert_eq!(router.classify("plan my trip"), Complexity::Complex);
    }

    #[test]
    fn decision_carries_rationale_and_confidence() {
        let decision = route("打开客厅灯");
        assert_eq!(decision.rationale, Complexity::Simple.rationale());
        assert!((0.0..=1.0).contains(&decision.confidence));
    }

    #[test]
    fn custom_backend_table() {
        let config = RouterConfig {
            backends: BackendTable {
                simple: "qwen-1.5b-int4".to_string(),
                medium: "doubao-pro".to_string(),
                complex: "deepseek-v3".to_string(),
            },
            ..RouterConfig::default()
        };
        let router = ComplexityRouter::new(&config);
        let decision = router.route("周末旅行推荐", &ConversationContext::default());
        assert_eq!(decision.backend, "deepseek-v3");
    }

    #[test]
    fn endpoint_lookup() {
        let mut router = ComplexityRouter::default();
        router.register_backend(
            "cloud-large",
            BackendEndpoint {
                url: "https://llm.example.com/v1".to_string(),
                api_key: Some(SecretString::new("sk-test".into())),
            },
        );

        let complex = router.route("帮我安排周末", &ConversationContext::default());
        assert_eq!(
            router.endpoint_for(&complex).map(|e| e.url.as_str()),
            Some("https://llm.example.com/v1")
        );

        let simple = router.route("打开灯", &ConversationContext::default());
        assert!(router.endpoint_for(&simple).is_none());
    }
}
