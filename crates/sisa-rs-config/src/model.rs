//! Configuration schema for the Sisa routing engine.
//!
//! Keyword tables, destination lists, and the daily-cost table are all
//! configuration with shipped defaults; deployments override them through
//! JSON5 files rather than code changes.

use serde::{Deserialize, Serialize};
use sisa_rs_protocol::AgentKind;
use std::collections::HashMap;

/// Root config for the Sisa engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SisaConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub recommendations: RecommendationsConfig,
    #[serde(default)]
    pub support: SupportConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl SisaConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> SisaConfigBuilder {
        SisaConfigBuilder::new()
    }
}

/// Builder for assembling a `SisaConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct SisaConfigBuilder {
    config: SisaConfig,
}

impl SisaConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: SisaConfig::default(),
        }
    }

    /// Replace the router configuration.
    pub fn router(mut self, router: RouterConfig) -> Self {
        self.config.router = router;
        self
    }

    /// Replace the planner configuration.
    pub fn planner(mut self, planner: PlannerConfig) -> Self {
        self.config.planner = planner;
        self
    }

    /// Replace the recommendations configuration.
    pub fn recommendations(mut self, recommendations: RecommendationsConfig) -> Self {
        self.config.recommendations = recommendations;
        self
    }

    /// Replace the support configuration.
    pub fn support(mut self, support: SupportConfig) -> Self {
        self.config.support = support;
        self
    }

    /// Replace the completion-endpoint configuration.
    pub fn completion(mut self, completion: CompletionConfig) -> Self {
        self.config.completion = completion;
        self
    }

    /// Replace the knowledge configuration.
    pub fn knowledge(mut self, knowledge: KnowledgeConfig) -> Self {
        self.config.knowledge = knowledge;
        self
    }

    /// Replace the storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Finalize and return the built `SisaConfig`.
    pub fn build(self) -> SisaConfig {
        self.config
    }
}

/// One ranked classification rule.
///
/// Lower `priority` values are tested first; the first rule with any
/// keyword contained in the lower-cased message wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRule {
    pub agent: AgentKind,
    pub keywords: Vec<String>,
    pub priority: u32,
}

/// Router classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_route_rules")]
    pub rules: Vec<RouteRule>,
    #[serde(default = "default_agent")]
    pub default_agent: AgentKind,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            rules: default_route_rules(),
            default_agent: default_agent(),
        }
    }
}

fn default_agent() -> AgentKind {
    AgentKind::Research
}

fn default_route_rules() -> Vec<RouteRule> {
    fn rule(agent: AgentKind, priority: u32, keywords: &[&str]) -> RouteRule {
        RouteRule {
            agent,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            priority,
        }
    }
    vec![
        rule(
            AgentKind::Research,
            1,
            &[
                "buscar",
                "busca",
                "destino",
                "destinos",
                "información",
                "informacion",
                "dónde",
                "donde",
                "search",
                "find",
                "explorar",
            ],
        ),
        rule(
            AgentKind::Planner,
            2,
            &[
                "itinerario",
                "planificar",
                "plan",
                "días",
                "dias",
                "semana",
                "schedule",
                "organize",
                "organizar",
            ],
        ),
        rule(
            AgentKind::Recommendations,
            3,
            &[
                "recomienda",
                "recomiendame",
                "sugiere",
                "sugerencia",
                "hotel",
                "restaurante",
                "recommend",
                "suggest",
            ],
        ),
        rule(
            AgentKind::CustomerService,
            4,
            &[
                "ayuda",
                "problema",
                "cancelar",
                "cambiar",
                "queja",
                "help",
                "support",
            ],
        ),
    ]
}

/// Per-person daily cost components for one destination, in USD.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyCost {
    pub accommodation: f64,
    pub food: f64,
    pub activities: f64,
    pub local_transport: f64,
}

impl DailyCost {
    /// Total daily cost per person.
    pub fn total(&self) -> f64 {
        self.accommodation + self.food + self.activities + self.local_transport
    }
}

/// Itinerary planning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Per-destination daily costs keyed by lower-cased destination name.
    #[serde(default = "default_daily_costs")]
    pub daily_costs: HashMap<String, DailyCost>,
    /// Fallback row for destinations absent from the table.
    #[serde(default = "default_daily_cost")]
    pub default_daily_cost: DailyCost,
    /// Destinations recognized during parameter extraction.
    #[serde(default = "default_known_destinations")]
    pub known_destinations: Vec<String>,
    /// How many prior turns are scanned for carried-over parameters.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            daily_costs: default_daily_costs(),
            default_daily_cost: default_daily_cost(),
            known_destinations: default_known_destinations(),
            history_window: default_history_window(),
        }
    }
}

fn default_history_window() -> usize {
    10
}

fn default_daily_cost() -> DailyCost {
    DailyCost {
        accommodation: 40.0,
        food: 20.0,
        activities: 20.0,
        local_transport: 10.0,
    }
}

fn default_daily_costs() -> HashMap<String, DailyCost> {
    fn cost(accommodation: f64, food: f64, activities: f64, local_transport: f64) -> DailyCost {
        DailyCost {
            accommodation,
            food,
            activities,
            local_transport,
        }
    }
    HashMap::from([
        ("quito".to_string(), cost(35.0, 20.0, 15.0, 10.0)),
        ("guayaquil".to_string(), cost(40.0, 20.0, 15.0, 10.0)),
        ("cuenca".to_string(), cost(30.0, 15.0, 15.0, 5.0)),
        ("baños".to_string(), cost(25.0, 15.0, 20.0, 5.0)),
        ("montañita".to_string(), cost(20.0, 15.0, 25.0, 5.0)),
        ("galápagos".to_string(), cost(80.0, 40.0, 60.0, 20.0)),
        ("otavalo".to_string(), cost(25.0, 12.0, 10.0, 5.0)),
        ("mindo".to_string(), cost(30.0, 15.0, 25.0, 5.0)),
        ("salinas".to_string(), cost(35.0, 18.0, 20.0, 8.0)),
    ])
}

fn default_known_destinations() -> Vec<String> {
    [
        "Quito",
        "Guayaquil",
        "Cuenca",
        "Baños",
        "Montañita",
        "Galápagos",
        "Otavalo",
        "Mindo",
        "Salinas",
        "Loja",
        "Tena",
        "Puyo",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

/// Recommendation filtering and ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsConfig {
    /// Hard cap on returned suggestions.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Numeric budgets below this are "low" tier.
    #[serde(default = "default_low_budget_ceiling")]
    pub low_budget_ceiling: f64,
    /// Numeric budgets below this (and at or above the low ceiling) are "medium" tier.
    #[serde(default = "default_medium_budget_ceiling")]
    pub medium_budget_ceiling: f64,
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            low_budget_ceiling: default_low_budget_ceiling(),
            medium_budget_ceiling: default_medium_budget_ceiling(),
        }
    }
}

fn default_max_results() -> usize {
    10
}

fn default_low_budget_ceiling() -> f64 {
    1000.0
}

fn default_medium_budget_ceiling() -> f64 {
    3000.0
}

/// One support category with its ordered keyword vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupportCategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Customer-service classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    /// Ordered category vocabularies; first category with a match wins.
    #[serde(default = "default_support_categories")]
    pub categories: Vec<SupportCategoryRule>,
    /// Keywords that raise urgency to high.
    #[serde(default = "default_urgency_keywords")]
    pub urgency_keywords: Vec<String>,
    /// Base classification confidence before keyword matches.
    #[serde(default = "default_confidence_base")]
    pub confidence_base: f64,
    /// Confidence added per matched keyword.
    #[serde(default = "default_confidence_step")]
    pub confidence_step: f64,
    /// Upper bound on classification confidence.
    #[serde(default = "default_confidence_cap")]
    pub confidence_cap: f64,
    /// Minimum confidence for automatic resolution.
    #[serde(default = "default_resolve_threshold")]
    pub resolve_threshold: f64,
    /// Prior turns included in the reply prompt.
    #[serde(default = "default_support_history_window")]
    pub history_window: usize,
}

impl Default for SupportConfig {
    fn default() -> Self {
        Self {
            categories: default_support_categories(),
            urgency_keywords: default_urgency_keywords(),
            confidence_base: default_confidence_base(),
            confidence_step: default_confidence_step(),
            confidence_cap: default_confidence_cap(),
            resolve_threshold: default_resolve_threshold(),
            history_window: default_support_history_window(),
        }
    }
}

fn default_support_categories() -> Vec<SupportCategoryRule> {
    fn category(category: &str, keywords: &[&str]) -> SupportCategoryRule {
        SupportCategoryRule {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
    vec![
        category(
            "booking",
            &[
                "reserva", "booking", "cancelar", "cancel", "cambiar", "change", "voucher",
            ],
        ),
        category(
            "technical",
            &["error", "fallo", "bug", "no funciona", "not working", "crash"],
        ),
        category(
            "information",
            &["información", "informacion", "horario", "requisito", "visa", "how"],
        ),
        category(
            "complaint",
            &["queja", "reclamo", "complaint", "molesto", "terrible", "refund"],
        ),
        category("general", &[]),
    ]
}

fn default_urgency_keywords() -> Vec<String> {
    ["urgent", "urgente", "emergency", "emergencia", "help", "ayuda"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_confidence_base() -> f64 {
    0.5
}

fn default_confidence_step() -> f64 {
    0.2
}

fn default_confidence_cap() -> f64 {
    0.9
}

fn default_resolve_threshold() -> f64 {
    0.7
}

fn default_support_history_window() -> usize {
    5
}

/// Chat-completion endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_completion_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_completion_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1500
}

/// Similarity-search collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// When false the static fallback index answers every query.
    #[serde(default)]
    pub remote_enabled: bool,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            remote_enabled: false,
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

/// Conversation persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Root directory for rollout files; defaults to a per-user data dir.
    #[serde(default)]
    pub path: Option<String>,
}
