//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use sisa_rs_protocol::AgentKind;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = SisaConfig::load_from_str("{}").expect("config");
    assert_eq!(config.router.default_agent, AgentKind::Research);
    assert_eq!(config.recommendations.max_results, 10);
    assert!(config.planner.daily_costs.contains_key("baños"));
}

/// Router rules keep their configured priority order.
#[test]
fn default_rules_are_ranked_research_first() {
    let config = SisaConfig::load_from_str("{}").expect("config");
    let agents: Vec<AgentKind> = config.router.rules.iter().map(|rule| rule.agent).collect();
    assert_eq!(
        agents,
        vec![
            AgentKind::Research,
            AgentKind::Planner,
            AgentKind::Recommendations,
            AgentKind::CustomerService,
        ]
    );
    assert!(
        config
            .router
            .rules
            .windows(2)
            .all(|pair| pair[0].priority < pair[1].priority)
    );
}

/// Reject router rules without keywords.
#[test]
fn rejects_empty_router_rule() {
    let json5 = r#"{ router: { rules: [{ agent: "planner", keywords: [], priority: 1 }] } }"#;
    let err = SisaConfig::load_from_str(json5).unwrap_err();
    assert!(format!("{err}").contains("no keywords"));
}

/// Reject a support vocabulary with no catch-all category.
#[test]
fn rejects_support_config_without_catch_all() {
    let json5 = r#"{ support: { categories: [{ category: "booking", keywords: ["reserva"] }] } }"#;
    let err = SisaConfig::load_from_str(json5).unwrap_err();
    assert!(format!("{err}").contains("catch-all"));
}

/// Reject inverted budget-tier ceilings.
#[test]
fn rejects_inverted_budget_ceilings() {
    let json5 = r#"{ recommendations: { low_budget_ceiling: 5000, medium_budget_ceiling: 3000 } }"#;
    let err = SisaConfig::load_from_str(json5).unwrap_err();
    assert!(format!("{err}").contains("ceilings"));
}

/// Ensure runtime overrides take precedence over the cwd layer.
#[test]
fn layered_config_prefers_runtime_over_cwd() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path().join("workdir");
    fs::create_dir_all(&cwd).expect("cwd");

    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ completion: { model: "cwd-model" }, knowledge: { top_k: 7 } }"#,
    );

    let runtime_config = temp.path().join("override.json5");
    write_json5(
        &runtime_config,
        r#"{ completion: { model: "runtime-model" } }"#,
    );

    let options = LayeredConfigOptions {
        cwd: cwd.clone(),
        user_config_path: None,
        runtime_paths: vec![runtime_config],
    };
    let layered = SisaConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.config.completion.model, "runtime-model");
    assert_eq!(layered.config.knowledge.top_k, 7);
    assert_eq!(layered.layers.len(), 2);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Cwd);
    assert_eq!(layered.layers[1].source, ConfigLayerSource::Runtime);
}

/// Overriding the daily-cost table replaces rows wholesale.
#[test]
fn daily_cost_override_replaces_row() {
    let json5 = r#"{
        planner: {
            daily_costs: {
                "baños": { accommodation: 30, food: 20, activities: 25, local_transport: 5 },
            },
        },
    }"#;
    let config = SisaConfig::load_from_str(json5).expect("config");
    let row = config.planner.daily_costs.get("baños").expect("row");
    assert_eq!(row.total(), 80.0);
}
