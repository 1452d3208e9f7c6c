//! Personalized recommendations handler.

use super::{AgentHandler, TurnInput};
use crate::completion::{parse_json_completion, CompletionClient, ResponseMode};
use crate::context::BudgetTier;
use crate::error::SisaCoreError;
use crate::prompt;
use crate::types::AgentResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sisa_rs_config::RecommendationsConfig;
use sisa_rs_protocol::{AgentKind, Handoff};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

const CATEGORY_MARKERS: &[(&str, &str)] = &[
    ("hotel", "hotel"),
    ("hostal", "hotel"),
    ("alojamiento", "hotel"),
    ("restaurante", "restaurant"),
    ("restaurant", "restaurant"),
    ("comer", "restaurant"),
    ("actividad", "activity"),
    ("activity", "activity"),
    ("tour", "activity"),
    ("transporte", "transport"),
    ("transport", "transport"),
];

/// Structured recommendations output requested from the completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    /// Candidate recommendations before local filtering.
    pub recommendations: Vec<Recommendation>,
    /// Factors the model claims to have personalized on.
    #[serde(default)]
    pub personalization_factors: Vec<String>,
}

/// One recommendation entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Category: hotel, restaurant, activity or transport.
    #[serde(rename = "type")]
    pub kind: String,
    /// Place name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Rating from 1.0 to 5.0.
    #[serde(default)]
    pub rating: f64,
    /// Price tier expressed as dollar signs.
    #[serde(default)]
    pub price_range: String,
    /// Where it is.
    #[serde(default)]
    pub location: Option<String>,
}

/// Handler that recommends places and hands off to customer service.
pub struct RecommendationsAgent {
    completion: Arc<dyn CompletionClient>,
    config: RecommendationsConfig,
}

impl RecommendationsAgent {
    /// Build a recommendations handler.
    pub fn new(completion: Arc<dyn CompletionClient>, config: RecommendationsConfig) -> Self {
        Self { completion, config }
    }

    /// Effective budget tier: explicit wording wins, else an explicit
    /// dollar amount is bucketed by the configured ceilings.
    fn effective_tier(&self, travel: &crate::context::TravelContext) -> Option<BudgetTier> {
        if let Some(tier) = travel.budget_tier_value() {
            return Some(tier);
        }
        let budget = travel.budget_value()?;
        Some(if budget < self.config.low_budget_ceiling {
            BudgetTier::Low
        } else if budget < self.config.medium_budget_ceiling {
            BudgetTier::Medium
        } else {
            BudgetTier::High
        })
    }
}

#[async_trait]
impl AgentHandler for RecommendationsAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Recommendations
    }

    async fn handle(&self, turn: TurnInput<'_>) -> Result<AgentResponse, SisaCoreError> {
        let Some(destination) = turn.travel.destination_name() else {
            return Ok(AgentResponse::reply(
                "¿Para qué destino quieres recomendaciones? Dime la ciudad o región.",
                Handoff::Continue,
            ));
        };

        let system = prompt::recommendations_system();
        let user = prompt::recommendations_user(turn.message, destination, turn.travel);
        let raw = self
            .completion
            .complete(&system, &user, ResponseMode::Json)
            .await
            .map_err(SisaCoreError::Completion)?;
        let result: RecommendationResult =
            parse_json_completion(&raw).map_err(SisaCoreError::Completion)?;

        let category = category_from_message(turn.message);
        let selected = filter_and_rank(
            result.recommendations,
            category.as_deref(),
            self.effective_tier(turn.travel),
            &turn.travel.interests,
            self.config.max_results,
        );
        log::debug!(
            "recommendations filtered (conversation_id={}, selected={})",
            turn.conversation_id,
            selected.len()
        );

        let metadata = serde_json::json!({
            "recommendations": selected,
            "personalizationFactors": result.personalization_factors,
        });
        Ok(AgentResponse {
            content: format_recommendations(destination, &selected),
            handoff: Handoff::Suggest(AgentKind::CustomerService),
            metadata: Some(metadata),
            search: None,
        })
    }
}

fn category_from_message(message: &str) -> Option<String> {
    let lowered = message.to_lowercase();
    CATEGORY_MARKERS
        .iter()
        .find(|(marker, _)| lowered.contains(marker))
        .map(|(_, category)| (*category).to_string())
}

/// Price-range heuristic: count the dollar signs.
fn within_budget(tier: BudgetTier, price_range: &str) -> bool {
    let dollars = price_range.chars().filter(|ch| *ch == '$').count();
    match tier {
        BudgetTier::Low => dollars <= 2,
        BudgetTier::Medium => dollars <= 3,
        BudgetTier::High => true,
    }
}

fn preference_score(recommendation: &Recommendation, interests: &[String]) -> f64 {
    let haystack = format!(
        "{} {}",
        recommendation.name.to_lowercase(),
        recommendation.description.to_lowercase()
    );
    let matches = interests
        .iter()
        .filter(|interest| haystack.contains(interest.to_lowercase().as_str()))
        .count();
    matches as f64
}

/// Apply category, budget-tier and preference filters, then a stable
/// sort by descending `rating + relevance`, truncated to `max_results`.
fn filter_and_rank(
    recommendations: Vec<Recommendation>,
    category: Option<&str>,
    budget_tier: Option<BudgetTier>,
    interests: &[String],
    max_results: usize,
) -> Vec<Recommendation> {
    let mut candidates: Vec<Recommendation> = recommendations
        .into_iter()
        .filter(|rec| category.is_none_or(|wanted| rec.kind.eq_ignore_ascii_case(wanted)))
        .filter(|rec| {
            budget_tier.is_none_or(|tier| within_budget(tier, &rec.price_range))
        })
        .collect();

    // Preference matching is best-effort: only narrow when something
    // survives, never empty the list over a missing keyword.
    if !interests.is_empty() {
        let preferred: Vec<Recommendation> = candidates
            .iter()
            .filter(|rec| preference_score(rec, interests) > 0.0)
            .cloned()
            .collect();
        if !preferred.is_empty() {
            candidates = preferred;
        }
    }

    candidates.sort_by(|a, b| {
        let score_a = a.rating + preference_score(a, interests);
        let score_b = b.rating + preference_score(b, interests);
        score_b.total_cmp(&score_a)
    });
    candidates.truncate(max_results);
    candidates
}

fn format_recommendations(destination: &str, recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return format!(
            "No encontré recomendaciones que encajen con tus filtros en {destination}. \
             ¿Quieres ampliar la búsqueda?"
        );
    }
    let mut grouped: BTreeMap<&str, Vec<&Recommendation>> = BTreeMap::new();
    for recommendation in recommendations {
        grouped
            .entry(recommendation.kind.as_str())
            .or_default()
            .push(recommendation);
    }

    let mut out = format!("## Recomendaciones para {destination}\n\n");
    for (kind, entries) in grouped {
        let _ = writeln!(out, "### {}", category_title(kind));
        for entry in entries {
            let mut line = format!("- **{}** ({:.1}★, {})", entry.name, entry.rating, entry.price_range);
            if let Some(location) = &entry.location {
                let _ = write!(line, " — {location}");
            }
            let _ = writeln!(out, "{line}");
            let _ = writeln!(out, "  {}", entry.description);
        }
        out.push('\n');
    }
    out.push_str("¿Necesitas ayuda con reservas o tienes alguna otra consulta?");
    out
}

fn category_title(kind: &str) -> &str {
    match kind {
        "hotel" => "Hoteles",
        "restaurant" => "Restaurantes",
        "activity" => "Actividades",
        "transport" => "Transporte",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{TravelContext, TurnExtraction};
    use pretty_assertions::assert_eq;
    use crate::testing::FixedCompletion;
    use uuid::Uuid;

    fn rec(kind: &str, name: &str, rating: f64, price_range: &str) -> Recommendation {
        Recommendation {
            kind: kind.to_string(),
            name: name.to_string(),
            description: String::new(),
            rating,
            price_range: price_range.to_string(),
            location: None,
        }
    }

    #[test]
    fn low_budget_tier_drops_expensive_entries() {
        let selected = filter_and_rank(
            vec![
                rec("hotel", "Hostal Sol", 4.2, "$"),
                rec("hotel", "Gran Plaza", 4.9, "$$$$"),
            ],
            None,
            Some(BudgetTier::Low),
            &[],
            10,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Hostal Sol");
    }

    #[test]
    fn category_filter_keeps_only_the_requested_kind() {
        let selected = filter_and_rank(
            vec![
                rec("hotel", "Hostal Sol", 4.2, "$"),
                rec("restaurant", "El Fogón", 4.7, "$$"),
            ],
            Some("restaurant"),
            None,
            &[],
            10,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "El Fogón");
    }

    #[test]
    fn ranking_is_descending_by_rating_plus_relevance() {
        let mut surf = rec("activity", "Clases de surf", 4.0, "$$");
        surf.description = "Surf en la playa principal.".to_string();
        let museum = rec("activity", "Museo local", 4.5, "$");
        let interests = vec!["playa".to_string()];
        let selected = filter_and_rank(vec![museum, surf], None, None, &interests, 10);
        // Preference narrowing keeps only entries matching an interest.
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Clases de surf");
    }

    #[test]
    fn results_never_exceed_the_configured_maximum() {
        let many: Vec<Recommendation> = (0..25)
            .map(|index| rec("hotel", &format!("Hotel {index}"), 4.0, "$$"))
            .collect();
        let selected = filter_and_rank(many, None, None, &[], 10);
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn explicit_budgets_bucket_into_tiers_by_the_configured_ceilings() {
        let agent = RecommendationsAgent::new(
            Arc::new(FixedCompletion::new("{}")),
            RecommendationsConfig::default(),
        );
        for (budget, expected) in [
            (500.0, BudgetTier::Low),
            // Ceilings are exclusive: exactly 1000 is already medium.
            (1000.0, BudgetTier::Medium),
            (2000.0, BudgetTier::Medium),
            (3000.0, BudgetTier::High),
            (5000.0, BudgetTier::High),
        ] {
            let mut travel = TravelContext::default();
            travel.absorb(TurnExtraction {
                budget: Some(budget),
                ..TurnExtraction::default()
            });
            assert_eq!(agent.effective_tier(&travel), Some(expected));
        }
    }

    #[tokio::test]
    async fn missing_destination_asks_instead_of_calling_the_model() {
        let agent = RecommendationsAgent::new(
            Arc::new(FixedCompletion::new("{}")),
            RecommendationsConfig::default(),
        );
        let travel = TravelContext::default();
        let response = agent
            .handle(TurnInput {
                conversation_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                profile: None,
                message: "recomienda hoteles",
                travel: &travel,
                history: &[],
            })
            .await
            .expect("handle");
        assert_eq!(response.handoff, Handoff::Continue);
        assert!(response.content.contains("qué destino"));
    }

    #[tokio::test]
    async fn groups_output_by_category_and_suggests_support() {
        let canned = serde_json::json!({
            "recommendations": [
                {
                    "type": "hotel",
                    "name": "Hostal Sol",
                    "description": "Céntrico y tranquilo.",
                    "rating": 4.2,
                    "priceRange": "$",
                    "location": "Centro"
                },
                {
                    "type": "restaurant",
                    "name": "El Fogón",
                    "description": "Cocina tradicional.",
                    "rating": 4.7,
                    "priceRange": "$$",
                    "location": "Malecón"
                }
            ],
            "personalizationFactors": ["presupuesto bajo"]
        });
        let agent = RecommendationsAgent::new(
            Arc::new(FixedCompletion::new(canned.to_string())),
            RecommendationsConfig::default(),
        );
        let mut travel = TravelContext::default();
        travel.absorb(TurnExtraction {
            destination: Some("Montañita".to_string()),
            ..TurnExtraction::default()
        });
        let response = agent
            .handle(TurnInput {
                conversation_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                profile: None,
                message: "sugiere lugares imperdibles en Montañita",
                travel: &travel,
                history: &[],
            })
            .await
            .expect("handle");

        assert_eq!(response.handoff, Handoff::Suggest(AgentKind::CustomerService));
        assert!(response.content.contains("### Hoteles"));
        assert!(response.content.contains("### Restaurantes"));
        assert!(response.content.contains("Hostal Sol"));
    }
}
