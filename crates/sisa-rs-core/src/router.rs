//! Keyword router.
//!
//! Classifies an inbound message into one of the four agent tags by
//! testing lower-cased substring membership against ordered keyword
//! sets. The ordering is a total tie-break: a message matching both the
//! research and support vocabularies always classifies as research.

use sisa_rs_config::RouterConfig;
use sisa_rs_protocol::AgentKind;

/// Outcome of a routing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// Selected agent tag.
    pub agent: AgentKind,
    /// The keyword that matched, absent when the decision fell through
    /// to the default or the active agent.
    pub matched_keyword: Option<String>,
}

/// Ordered keyword router built from configuration.
pub struct Router {
    rules: Vec<(AgentKind, Vec<String>)>,
    default_agent: AgentKind,
}

impl Router {
    /// Build a router, ordering rules by ascending priority.
    pub fn new(config: &RouterConfig) -> Self {
        let mut ranked: Vec<_> = config.rules.iter().collect();
        ranked.sort_by_key(|rule| rule.priority);
        let rules = ranked
            .into_iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|keyword| keyword.to_lowercase())
                    .collect();
                (rule.agent, keywords)
            })
            .collect();
        Self {
            rules,
            default_agent: config.default_agent,
        }
    }

    /// Classify a message. Never fails; absence of signal falls back to
    /// `fallback` when given, else the configured default agent.
    pub fn classify(&self, message: &str, fallback: Option<AgentKind>) -> RouteDecision {
        let lowered = message.to_lowercase();
        for (agent, keywords) in &self.rules {
            if let Some(keyword) = keywords.iter().find(|keyword| lowered.contains(keyword.as_str()))
            {
                log::debug!("routing matched keyword (agent={agent}, keyword={keyword})");
                return RouteDecision {
                    agent: *agent,
                    matched_keyword: Some(keyword.clone()),
                };
            }
        }
        RouteDecision {
            agent: fallback.unwrap_or(self.default_agent),
            matched_keyword: None,
        }
    }
}
