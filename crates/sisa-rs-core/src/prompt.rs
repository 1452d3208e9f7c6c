//! Prompt builders for each agent handler.
//!
//! All user-facing text is Spanish; the JSON shape instructions are
//! embedded in the system prompt so JSON mode can be enforced.

use crate::context::TravelContext;
use sisa_rs_knowledge::Snippet;
use sisa_rs_protocol::HistoryEntry;
use std::fmt::Write as _;

/// System prompt for the destination-research handler.
pub fn research_system() -> String {
    "Eres un agente de investigación de viajes especializado en destinos. \
     Analiza la consulta del usuario y responde únicamente con un objeto JSON \
     con esta forma exacta: {\"destinations\": [{\"name\": string, \
     \"description\": string, \"highlights\": [string], \"bestTime\": string, \
     \"estimatedCost\": string}], \"insights\": [string], \"sources\": [string]}. \
     Incluye entre 2 y 4 destinos relevantes."
        .to_string()
}

/// User prompt for the research handler.
pub fn research_user(query: &str, travel: &TravelContext, snippets: &[Snippet]) -> String {
    let mut prompt = format!("Consulta del usuario: {query}\n");
    write_travel_context(&mut prompt, travel);
    if !snippets.is_empty() {
        prompt.push_str("\nInformación de contexto relevante:\n");
        for snippet in snippets {
            let _ = writeln!(prompt, "- {}", snippet.content);
        }
    }
    prompt
}

/// System prompt for the itinerary planner.
pub fn planner_system() -> String {
    "Eres un agente planificador de viajes. Crea un itinerario día por día y \
     responde únicamente con un objeto JSON con esta forma exacta: \
     {\"itinerary\": [{\"day\": number, \"activities\": [{\"time\": string, \
     \"activity\": string, \"location\": string, \"cost\": string, \
     \"description\": string}]}], \"totalCost\": string, \"tips\": [string]}."
        .to_string()
}

/// User prompt for the planner, seeded with the precomputed budget hint.
pub fn planner_user(
    query: &str,
    destination: &str,
    duration_days: u32,
    group_size: u32,
    estimated_budget: f64,
    travel: &TravelContext,
) -> String {
    let mut prompt = format!(
        "Planifica un viaje a {destination} de {duration_days} días para \
         {group_size} persona(s). Presupuesto estimado: ${estimated_budget:.0} USD \
         en total (usa este monto como referencia, no lo recalcules).\n"
    );
    if !travel.interests.is_empty() {
        let _ = writeln!(prompt, "Intereses del viajero: {}.", travel.interests.join(", "));
    }
    let _ = writeln!(prompt, "Mensaje original: {query}");
    prompt
}

/// System prompt for the recommendations handler.
pub fn recommendations_system() -> String {
    "Eres un agente de recomendaciones de viaje. Sugiere lugares concretos y \
     responde únicamente con un objeto JSON con esta forma exacta: \
     {\"recommendations\": [{\"type\": string, \"name\": string, \
     \"description\": string, \"rating\": number, \"priceRange\": string, \
     \"location\": string}], \"personalizationFactors\": [string]}. \
     El campo type debe ser hotel, restaurant, activity o transport; rating va \
     de 1.0 a 5.0; priceRange usa signos de dólar ($ a $$$$)."
        .to_string()
}

/// User prompt for the recommendations handler.
pub fn recommendations_user(query: &str, destination: &str, travel: &TravelContext) -> String {
    let mut prompt = format!("Recomienda opciones en {destination} para: {query}\n");
    write_travel_context(&mut prompt, travel);
    prompt
}

/// System prompt for the customer-service handler; the classification is
/// included so the model answers inside the resolved category.
pub fn support_system(category: &str, urgency: &str, snippets: &[Snippet]) -> String {
    let mut prompt = format!(
        "Eres un agente de atención al cliente de una plataforma de viajes. \
         Responde en español, de forma empática y concreta. Categoría de la \
         consulta: {category}. Urgencia: {urgency}."
    );
    if !snippets.is_empty() {
        prompt.push_str(" Información de apoyo:");
        for snippet in snippets {
            let _ = write!(prompt, " {}", snippet.content);
        }
    }
    prompt
}

/// User prompt for the customer-service handler with a short history window.
pub fn support_user(query: &str, history: &[HistoryEntry]) -> String {
    let mut prompt = String::new();
    if !history.is_empty() {
        prompt.push_str("Conversación reciente:\n");
        for entry in history {
            let _ = writeln!(prompt, "{}: {}", entry.role.as_str(), entry.content);
        }
        prompt.push('\n');
    }
    let _ = write!(prompt, "Consulta actual: {query}");
    prompt
}

fn write_travel_context(prompt: &mut String, travel: &TravelContext) {
    if let Some(destination) = travel.destination_name() {
        let _ = writeln!(prompt, "Destino de interés: {destination}.");
    }
    if let Some(days) = travel.duration_days_value() {
        let _ = writeln!(prompt, "Duración del viaje: {days} días.");
    }
    if let Some(budget) = travel.budget_value() {
        let _ = writeln!(prompt, "Presupuesto: ${budget:.0} USD.");
    }
    if let Some(tier) = travel.budget_tier_value() {
        let _ = writeln!(prompt, "Nivel de presupuesto: {}.", tier.as_str());
    }
    if let Some(group) = travel.group_size_value() {
        let _ = writeln!(prompt, "Número de personas: {group}.");
    }
    if !travel.interests.is_empty() {
        let _ = writeln!(prompt, "Intereses: {}.", travel.interests.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TravelContext;

    #[test]
    fn planner_prompt_carries_the_budget_hint() {
        let travel = TravelContext::default();
        let prompt = planner_user("quiero ir a Baños", "Baños", 3, 2, 390.0, &travel);
        assert!(prompt.contains("Baños"));
        assert!(prompt.contains("3 días"));
        assert!(prompt.contains("$390 USD"));
    }

    #[test]
    fn research_prompt_includes_snippets() {
        let travel = TravelContext::default();
        let snippets = vec![Snippet {
            id: "dest-beach".to_string(),
            content: "Montañita es popular entre surfistas.".to_string(),
            score: 0.9,
            metadata: serde_json::Value::Null,
        }];
        let prompt = research_user("playa", &travel, &snippets);
        assert!(prompt.contains("Montañita es popular"));
    }
}
