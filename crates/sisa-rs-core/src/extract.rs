//! Extraction of travel parameters from free-text messages.
//!
//! Everything here is regex and keyword matching; no model calls. The
//! destination list and daily-cost table come from configuration.

use crate::context::{BudgetTier, TurnExtraction};
use regex::Regex;
use sisa_rs_config::PlannerConfig;

const INTEREST_KEYWORDS: &[(&str, &str)] = &[
    ("playa", "playa"),
    ("beach", "playa"),
    ("surf", "playa"),
    ("aventura", "aventura"),
    ("adventure", "aventura"),
    ("senderismo", "aventura"),
    ("hiking", "aventura"),
    ("cultura", "cultura"),
    ("culture", "cultura"),
    ("museo", "cultura"),
    ("historia", "cultura"),
    ("gastronom", "gastronomía"),
    ("comida", "gastronomía"),
    ("food", "gastronomía"),
    ("naturaleza", "naturaleza"),
    ("nature", "naturaleza"),
    ("montaña", "naturaleza"),
    ("relax", "relax"),
    ("descanso", "relax"),
    ("spa", "relax"),
];

const LOW_TIER_MARKERS: &[&str] = &[
    "presupuesto bajo",
    "barato",
    "económico",
    "economico",
    "cheap",
    "low budget",
];

const HIGH_TIER_MARKERS: &[&str] = &["lujo", "luxury", "premium", "alta gama"];

/// Regex-based extractor configured with the known-destination list.
///
/// The patterns are fixed literals; if one ever fails to compile the
/// corresponding field simply stops being extracted.
pub struct Extractor {
    known_destinations: Vec<String>,
    duration: Option<Regex>,
    budget: Option<Regex>,
    group: Option<Regex>,
}

impl Extractor {
    /// Build an extractor from planner configuration.
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            known_destinations: config.known_destinations.clone(),
            duration: Regex::new(r"(?i)(\d+)\s*(semanas?|weeks?|d[ií]as?|days?)").ok(),
            budget: Regex::new(
                r"(?i)(?:\$\s*(\d{1,3}(?:,\d{3})*(?:\.\d+)?|\d+(?:\.\d+)?))|(?:(?:presupuesto|budget)\s+(?:de\s+)?(\d{1,3}(?:,\d{3})*(?:\.\d+)?|\d+(?:\.\d+)?))",
            )
            .ok(),
            group: Regex::new(r"(?i)(\d+)\s*(personas?|people|persons?|viajeros?|travelers?|adultos?)")
                .ok(),
        }
    }

    /// Extract every recognizable field from one message.
    pub fn extract(&self, message: &str) -> TurnExtraction {
        let lowered = message.to_lowercase();
        TurnExtraction {
            destination: self.extract_destination(&lowered),
            duration_days: self.extract_duration(message),
            budget: self.extract_budget(message),
            budget_tier: extract_budget_tier(&lowered),
            group_size: self.extract_group_size(message),
            interests: extract_interests(&lowered),
        }
    }

    fn extract_destination(&self, lowered: &str) -> Option<String> {
        let folded_message = fold_diacritics(lowered);
        self.known_destinations
            .iter()
            .find(|destination| {
                folded_message.contains(&fold_diacritics(&destination.to_lowercase()))
            })
            .cloned()
    }

    fn extract_duration(&self, message: &str) -> Option<u32> {
        let captures = self.duration.as_ref()?.captures(message)?;
        let amount: u32 = captures.get(1)?.as_str().parse().ok()?;
        let unit = captures.get(2)?.as_str().to_lowercase();
        if unit.starts_with("semana") || unit.starts_with("week") {
            Some(amount.saturating_mul(7))
        } else {
            Some(amount)
        }
    }

    fn extract_budget(&self, message: &str) -> Option<f64> {
        let captures = self.budget.as_ref()?.captures(message)?;
        let raw = captures.get(1).or_else(|| captures.get(2))?;
        raw.as_str().replace(',', "").parse().ok()
    }

    fn extract_group_size(&self, message: &str) -> Option<u32> {
        let captures = self.group.as_ref()?.captures(message)?;
        captures.get(1)?.as_str().parse().ok()
    }
}

fn extract_budget_tier(lowered: &str) -> Option<BudgetTier> {
    if LOW_TIER_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Some(BudgetTier::Low);
    }
    if HIGH_TIER_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return Some(BudgetTier::High);
    }
    None
}

fn extract_interests(lowered: &str) -> Vec<String> {
    let mut interests = Vec::new();
    for (marker, interest) in INTEREST_KEYWORDS {
        if lowered.contains(marker) && !interests.iter().any(|existing| existing == interest) {
            interests.push((*interest).to_string());
        }
    }
    interests
}

/// Fold the Spanish diacritics that appear in destination names so
/// "banos" still matches "Baños".
pub fn fold_diacritics(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sisa_rs_config::PlannerConfig;

    fn extractor() -> Extractor {
        Extractor::new(&PlannerConfig::default())
    }

    #[test]
    fn extracts_days_duration() {
        let extraction = extractor().extract("Baños, 3 días, 2 personas");
        assert_eq!(extraction.destination.as_deref(), Some("Baños"));
        assert_eq!(extraction.duration_days, Some(3));
        assert_eq!(extraction.group_size, Some(2));
    }

    #[test]
    fn week_tokens_multiply_by_seven() {
        let extraction = extractor().extract("quiero viajar 2 semanas a Quito");
        assert_eq!(extraction.duration_days, Some(14));
        assert_eq!(extraction.destination.as_deref(), Some("Quito"));
    }

    #[test]
    fn destination_match_ignores_diacritics_and_case() {
        let extraction = extractor().extract("quiero ir a banos con mi familia");
        assert_eq!(extraction.destination.as_deref(), Some("Baños"));
    }

    #[test]
    fn dollar_amounts_become_budget() {
        let extraction = extractor().extract("tengo $500 para el viaje");
        assert_eq!(extraction.budget, Some(500.0));
    }

    #[test]
    fn comma_grouped_amounts_keep_their_magnitude() {
        let extraction = extractor().extract("tengo $1,200 para el viaje");
        assert_eq!(extraction.budget, Some(1200.0));

        let extraction = extractor().extract("budget de 12,500.50");
        assert_eq!(extraction.budget, Some(12500.5));
    }

    #[test]
    fn budget_keyword_amounts_are_recognized() {
        let extraction = extractor().extract("con un presupuesto de 1200 dólares");
        assert_eq!(extraction.budget, Some(1200.0));
    }

    #[test]
    fn low_budget_wording_sets_the_tier() {
        let extraction = extractor().extract("busca destinos de playa con presupuesto bajo");
        assert_eq!(extraction.budget_tier, Some(BudgetTier::Low));
        assert_eq!(extraction.interests, vec!["playa".to_string()]);
    }

    #[test]
    fn luxury_wording_sets_the_high_tier() {
        let extraction = extractor().extract("hoteles de lujo en Guayaquil");
        assert_eq!(extraction.budget_tier, Some(BudgetTier::High));
        assert_eq!(extraction.destination.as_deref(), Some("Guayaquil"));
    }
}
