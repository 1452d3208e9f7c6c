//! Itinerary planner handler.
//!
//! The estimated budget is a deterministic lookup against the
//! per-destination daily-cost table, never a model call; the completion
//! service only narrates the itinerary around that number.

use super::{AgentHandler, TurnInput};
use crate::completion::{parse_json_completion, CompletionClient, ResponseMode};
use crate::context::MissingField;
use crate::error::SisaCoreError;
use crate::extract::fold_diacritics;
use crate::prompt;
use crate::types::{AgentResponse, TravelSearchDraft};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sisa_rs_config::PlannerConfig;
use sisa_rs_protocol::{AgentKind, Handoff};
use std::fmt::Write as _;
use std::sync::Arc;

/// Structured itinerary output requested from the completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryResult {
    /// Day-by-day plan.
    pub itinerary: Vec<ItineraryDay>,
    /// Narrated total cost.
    #[serde(default)]
    pub total_cost: Option<String>,
    /// Practical tips.
    #[serde(default)]
    pub tips: Vec<String>,
}

/// Activities for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    /// Day number, 1-based.
    pub day: u32,
    /// Ordered activities.
    pub activities: Vec<ItineraryActivity>,
}

/// One scheduled activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryActivity {
    /// Time slot text.
    pub time: String,
    /// Activity name.
    pub activity: String,
    /// Where it happens.
    #[serde(default)]
    pub location: Option<String>,
    /// Cost text.
    #[serde(default)]
    pub cost: Option<String>,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Compute the deterministic trip budget from the daily-cost table.
///
/// Unknown destinations fall back to the default daily cost. Lookup is
/// case- and diacritic-insensitive so "banos" resolves the "baños" row.
pub fn estimate_budget(
    config: &PlannerConfig,
    destination: &str,
    duration_days: u32,
    group_size: u32,
) -> f64 {
    let key = destination.to_lowercase();
    let daily = config
        .daily_costs
        .get(&key)
        .or_else(|| {
            let folded = fold_diacritics(&key);
            config
                .daily_costs
                .iter()
                .find(|(name, _)| fold_diacritics(name) == folded)
                .map(|(_, cost)| cost)
        })
        .unwrap_or(&config.default_daily_cost);
    daily.total() * f64::from(duration_days) * f64::from(group_size)
}

/// Handler that plans itineraries and hands off to recommendations.
pub struct PlannerAgent {
    completion: Arc<dyn CompletionClient>,
    config: PlannerConfig,
}

impl PlannerAgent {
    /// Build a planner handler.
    pub fn new(completion: Arc<dyn CompletionClient>, config: PlannerConfig) -> Self {
        Self { completion, config }
    }

    fn clarifying_question(missing: &[MissingField]) -> String {
        let labels: Vec<&str> = missing.iter().map(MissingField::label).collect();
        let listed = match labels.as_slice() {
            [only] => (*only).to_string(),
            [rest @ .., last] => format!("{} y {}", rest.join(", "), last),
            [] => String::new(),
        };
        format!(
            "Para crear tu itinerario necesito algunos datos más: {listed}. \
             ¿Me los puedes indicar?"
        )
    }
}

#[async_trait]
impl AgentHandler for PlannerAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Planner
    }

    async fn handle(&self, turn: TurnInput<'_>) -> Result<AgentResponse, SisaCoreError> {
        let missing = turn.travel.missing_for_planning();
        if !missing.is_empty() {
            log::debug!(
                "planner missing required fields (conversation_id={}, missing={})",
                turn.conversation_id,
                missing.len()
            );
            return Ok(AgentResponse::reply(
                Self::clarifying_question(&missing),
                Handoff::Continue,
            ));
        }

        // All three are present once missing_for_planning is empty.
        let (Some(destination), Some(duration_days), Some(group_size)) = (
            turn.travel.destination_name(),
            turn.travel.duration_days_value(),
            turn.travel.group_size_value(),
        ) else {
            return Err(SisaCoreError::State(
                "travel context lost required planning fields".to_string(),
            ));
        };

        let estimated_budget =
            estimate_budget(&self.config, destination, duration_days, group_size);
        log::info!(
            "planning itinerary (conversation_id={}, destination={}, days={}, group={}, budget={})",
            turn.conversation_id,
            destination,
            duration_days,
            group_size,
            estimated_budget
        );

        let system = prompt::planner_system();
        let user = prompt::planner_user(
            turn.message,
            destination,
            duration_days,
            group_size,
            estimated_budget,
            turn.travel,
        );
        let raw = self
            .completion
            .complete(&system, &user, ResponseMode::Json)
            .await
            .map_err(SisaCoreError::Completion)?;
        let result: ItineraryResult =
            parse_json_completion(&raw).map_err(SisaCoreError::Completion)?;

        let metadata = json!({
            "destination": destination,
            "duration": duration_days,
            "estimatedBudget": estimated_budget,
            "groupSize": group_size,
        });
        let search = TravelSearchDraft {
            query: turn.message.to_string(),
            destination: Some(destination.to_string()),
            budget: Some(estimated_budget),
            duration_days: Some(duration_days),
            preferences: json!(turn.travel.interests),
            results: serde_json::to_value(&result)
                .map_err(|err| SisaCoreError::Parse(err.to_string()))?,
        };

        Ok(AgentResponse {
            content: format_itinerary(destination, duration_days, estimated_budget, &result),
            handoff: Handoff::Suggest(AgentKind::Recommendations),
            metadata: Some(metadata),
            search: Some(search),
        })
    }
}

fn format_itinerary(
    destination: &str,
    duration_days: u32,
    estimated_budget: f64,
    result: &ItineraryResult,
) -> String {
    let mut out = format!("## Itinerario para {destination} ({duration_days} días)\n\n");
    let _ = writeln!(out, "**Presupuesto estimado:** ${estimated_budget:.0} USD\n");
    for day in &result.itinerary {
        let _ = writeln!(out, "### Día {}", day.day);
        for activity in &day.activities {
            let mut line = format!("- **{}** {}", activity.time, activity.activity);
            if let Some(location) = &activity.location {
                let _ = write!(line, " ({location})");
            }
            if let Some(cost) = &activity.cost {
                let _ = write!(line, " — {cost}");
            }
            let _ = writeln!(out, "{line}");
            if let Some(description) = &activity.description {
                let _ = writeln!(out, "  {description}");
            }
        }
        out.push('\n');
    }
    if !result.tips.is_empty() {
        out.push_str("**Consejos:**\n");
        for tip in &result.tips {
            let _ = writeln!(out, "- {tip}");
        }
        out.push('\n');
    }
    out.push_str("¿Quieres recomendaciones de hoteles y restaurantes para este viaje?");
    out
}
