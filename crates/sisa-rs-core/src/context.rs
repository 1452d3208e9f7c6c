//! Accumulated travel context.
//!
//! Fields extracted on earlier turns are carried forward; each field
//! remembers whether it was extracted from the current message or
//! carried over, so handlers can phrase clarifying questions correctly.

use serde::{Deserialize, Serialize};

/// Where a context field's current value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Extracted from the message being processed.
    ExtractedThisTurn,
    /// Carried over from an earlier turn.
    CarriedOver,
}

/// A context field together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelField<T> {
    /// Current value.
    pub value: T,
    /// How the value arrived.
    pub provenance: Provenance,
}

impl<T> TravelField<T> {
    fn fresh(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::ExtractedThisTurn,
        }
    }
}

/// Coarse budget level derived from wording rather than amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    /// Low-cost wording ("barato", "presupuesto bajo").
    Low,
    /// No tier signal.
    Medium,
    /// Luxury wording.
    High,
}

impl BudgetTier {
    /// Spanish display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetTier::Low => "bajo",
            BudgetTier::Medium => "medio",
            BudgetTier::High => "alto",
        }
    }
}

/// Required planner field that could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    /// No destination known.
    Destination,
    /// No trip duration known.
    DurationDays,
    /// No group size known.
    GroupSize,
}

impl MissingField {
    /// Spanish label used in clarifying questions.
    pub fn label(&self) -> &'static str {
        match self {
            MissingField::Destination => "el destino",
            MissingField::DurationDays => "cuántos días durará el viaje",
            MissingField::GroupSize => "cuántas personas viajan",
        }
    }
}

/// Values extracted from a single message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnExtraction {
    /// Destination matched against the known-destination list.
    pub destination: Option<String>,
    /// Duration in days (week tokens already multiplied by 7).
    pub duration_days: Option<u32>,
    /// Explicit monetary budget.
    pub budget: Option<f64>,
    /// Budget tier from wording.
    pub budget_tier: Option<BudgetTier>,
    /// Number of travelers.
    pub group_size: Option<u32>,
    /// Interest keywords found in the message.
    pub interests: Vec<String>,
}

/// Travel parameters accumulated across the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelContext {
    /// Destination of interest.
    pub destination: Option<TravelField<String>>,
    /// Trip duration in days.
    pub duration_days: Option<TravelField<u32>>,
    /// Explicit monetary budget.
    pub budget: Option<TravelField<f64>>,
    /// Budget tier from wording.
    pub budget_tier: Option<TravelField<BudgetTier>>,
    /// Number of travelers.
    pub group_size: Option<TravelField<u32>>,
    /// Accumulated interest keywords, deduplicated, insertion order.
    pub interests: Vec<String>,
}

impl TravelContext {
    /// Mark every held field as carried over. Called before absorbing a
    /// new turn's extraction.
    pub fn begin_turn(&mut self) {
        if let Some(field) = &mut self.destination {
            field.provenance = Provenance::CarriedOver;
        }
        if let Some(field) = &mut self.duration_days {
            field.provenance = Provenance::CarriedOver;
        }
        if let Some(field) = &mut self.budget {
            field.provenance = Provenance::CarriedOver;
        }
        if let Some(field) = &mut self.budget_tier {
            field.provenance = Provenance::CarriedOver;
        }
        if let Some(field) = &mut self.group_size {
            field.provenance = Provenance::CarriedOver;
        }
    }

    /// Merge freshly extracted values; a fresh value replaces a carried
    /// one, and silent fields keep their previous value.
    pub fn absorb(&mut self, extraction: TurnExtraction) {
        if let Some(destination) = extraction.destination {
            self.destination = Some(TravelField::fresh(destination));
        }
        if let Some(days) = extraction.duration_days {
            self.duration_days = Some(TravelField::fresh(days));
        }
        if let Some(budget) = extraction.budget {
            self.budget = Some(TravelField::fresh(budget));
        }
        if let Some(tier) = extraction.budget_tier {
            self.budget_tier = Some(TravelField::fresh(tier));
        }
        if let Some(group) = extraction.group_size {
            self.group_size = Some(TravelField::fresh(group));
        }
        for interest in extraction.interests {
            if !self.interests.contains(&interest) {
                self.interests.push(interest);
            }
        }
    }

    /// Planner preconditions that are still unresolved.
    pub fn missing_for_planning(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.destination.is_none() {
            missing.push(MissingField::Destination);
        }
        if self.duration_days.is_none() {
            missing.push(MissingField::DurationDays);
        }
        if self.group_size.is_none() {
            missing.push(MissingField::GroupSize);
        }
        missing
    }

    /// Destination value, if known.
    pub fn destination_name(&self) -> Option<&str> {
        self.destination.as_ref().map(|field| field.value.as_str())
    }

    /// Duration in days, if known.
    pub fn duration_days_value(&self) -> Option<u32> {
        self.duration_days.as_ref().map(|field| field.value)
    }

    /// Explicit budget, if known.
    pub fn budget_value(&self) -> Option<f64> {
        self.budget.as_ref().map(|field| field.value)
    }

    /// Budget tier, if known.
    pub fn budget_tier_value(&self) -> Option<BudgetTier> {
        self.budget_tier.as_ref().map(|field| field.value)
    }

    /// Group size, if known.
    pub fn group_size_value(&self) -> Option<u32> {
        self.group_size.as_ref().map(|field| field.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn absorb_overwrites_carried_fields_and_keeps_silent_ones() {
        let mut travel = TravelContext::default();
        travel.absorb(TurnExtraction {
            destination: Some("Quito".to_string()),
            duration_days: Some(3),
            ..TurnExtraction::default()
        });
        travel.begin_turn();
        travel.absorb(TurnExtraction {
            destination: Some("Baños".to_string()),
            group_size: Some(2),
            ..TurnExtraction::default()
        });

        assert_eq!(travel.destination_name(), Some("Baños"));
        assert_eq!(
            travel.destination.as_ref().map(|f| f.provenance),
            Some(Provenance::ExtractedThisTurn)
        );
        assert_eq!(travel.duration_days_value(), Some(3));
        assert_eq!(
            travel.duration_days.as_ref().map(|f| f.provenance),
            Some(Provenance::CarriedOver)
        );
        assert_eq!(travel.group_size_value(), Some(2));
    }

    #[test]
    fn missing_for_planning_lists_unresolved_fields_in_order() {
        let mut travel = TravelContext::default();
        travel.absorb(TurnExtraction {
            duration_days: Some(5),
            ..TurnExtraction::default()
        });
        assert_eq!(
            travel.missing_for_planning(),
            vec![MissingField::Destination, MissingField::GroupSize]
        );
    }

    #[test]
    fn interests_accumulate_without_duplicates() {
        let mut travel = TravelContext::default();
        travel.absorb(TurnExtraction {
            interests: vec!["playa".to_string(), "aventura".to_string()],
            ..TurnExtraction::default()
        });
        travel.absorb(TurnExtraction {
            interests: vec!["playa".to_string(), "gastronomía".to_string()],
            ..TurnExtraction::default()
        });
        assert_eq!(travel.interests, vec!["playa", "aventura", "gastronomía"]);
    }
}
