//! End-to-end turn-engine tests with mock collaborators.

use pretty_assertions::assert_eq;
use sisa_rs_config::SisaConfig;
use sisa_rs_core::{ConversationStore, Engine};
use sisa_rs_knowledge::StaticKnowledge;
use sisa_rs_protocol::{AgentKind, ChatRequest};
use sisa_rs_test_utils::{FailingCompletion, FixedCompletion, RecordingCompletion};
use std::sync::Arc;
use uuid::Uuid;

fn engine_with(completion: Arc<dyn sisa_rs_core::CompletionClient>) -> Engine {
    Engine::new(
        SisaConfig::default(),
        completion,
        Arc::new(StaticKnowledge::new()),
        ConversationStore::new(),
    )
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        conversation_id: None,
        agent_type: None,
    }
}

fn research_json() -> String {
    serde_json::json!({
        "destinations": [{
            "name": "Montañita",
            "description": "Pueblo costero con ambiente surfista.",
            "highlights": ["Surf"],
            "bestTime": "Diciembre a mayo",
            "estimatedCost": "$65 por día"
        }],
        "insights": [],
        "sources": []
    })
    .to_string()
}

fn itinerary_json() -> String {
    serde_json::json!({
        "itinerary": [{
            "day": 1,
            "activities": [{
                "time": "09:00",
                "activity": "Ruta de las cascadas",
                "location": "Baños",
                "cost": "$10",
                "description": "Recorrido en bicicleta."
            }]
        }],
        "totalCost": "$390",
        "tips": []
    })
    .to_string()
}

#[tokio::test]
async fn research_keywords_route_to_research_and_suggest_the_planner() {
    let engine = engine_with(Arc::new(FixedCompletion::new(research_json())));
    let user_id = Uuid::new_v4();

    let response = engine
        .process_turn(user_id, &request("busca destinos de playa con presupuesto bajo"))
        .await
        .expect("turn");

    assert_eq!(response.agent_type, AgentKind::Research);
    assert_eq!(response.next_agent, Some(AgentKind::Planner));
    assert!(!response.should_end);
    assert!(response.response.contains("Montañita"));
}

#[tokio::test]
async fn hand_off_carries_keywordless_follow_ups_to_the_planner() {
    let completion = Arc::new(RecordingCompletion::new(research_json()));
    let engine = engine_with(completion.clone());
    let user_id = Uuid::new_v4();

    let first = engine
        .process_turn(user_id, &request("busca destinos de aventura"))
        .await
        .expect("first turn");
    assert_eq!(first.agent_type, AgentKind::Research);
    assert_eq!(first.next_agent, Some(AgentKind::Planner));

    // No router keyword here; the conversation sits on the planner after
    // the research hand-off, and the planner asks for the missing fields
    // without another completion call.
    let second = engine
        .process_turn(
            user_id,
            &ChatRequest {
                message: "quiero ir a Baños".to_string(),
                conversation_id: Some(first.conversation_id),
                agent_type: None,
            },
        )
        .await
        .expect("second turn");

    assert_eq!(second.agent_type, AgentKind::Planner);
    assert_eq!(second.next_agent, None);
    assert!(second.response.contains("cuántos días"));
    assert!(second.response.contains("cuántas personas"));
    assert_eq!(completion.prompts().len(), 1);
}

#[tokio::test]
async fn planner_computes_the_deterministic_budget() {
    let engine = engine_with(Arc::new(FixedCompletion::new(itinerary_json())));
    let user_id = Uuid::new_v4();

    let response = engine
        .process_turn(user_id, &request("Baños, 3 días, 2 personas"))
        .await
        .expect("turn");

    assert_eq!(response.agent_type, AgentKind::Planner);
    assert_eq!(response.next_agent, Some(AgentKind::Recommendations));
    let metadata = response.metadata.expect("metadata");
    // dailyCost(Baños)=65, 3 days, 2 people.
    assert_eq!(metadata["estimatedBudget"], 390.0);
    assert_eq!(metadata["destination"], "Baños");
    assert!(response.response.contains("$390 USD"));
}

#[tokio::test]
async fn support_queries_classify_without_a_hand_off() {
    let engine = engine_with(Arc::new(FixedCompletion::new(
        "Puedo ayudarte con tu reserva.",
    )));
    let user_id = Uuid::new_v4();

    let response = engine
        .process_turn(user_id, &request("necesito cancelar mi reserva"))
        .await
        .expect("turn");

    assert_eq!(response.agent_type, AgentKind::CustomerService);
    assert_eq!(response.next_agent, None);
    assert!(!response.should_end);
    let metadata = response.metadata.expect("metadata");
    assert_eq!(metadata["classification"]["category"], "booking");
    assert_eq!(metadata["classification"]["urgency"], "medium");
    assert_eq!(
        metadata["suggestedActions"],
        serde_json::json!(["check_booking", "contact_support"])
    );
}

#[tokio::test]
async fn handler_failures_become_an_apology_and_end_the_chain() {
    let engine = engine_with(Arc::new(FailingCompletion));
    let user_id = Uuid::new_v4();

    let response = engine
        .process_turn(user_id, &request("busca destinos de playa"))
        .await
        .expect("turn must not error");

    assert_eq!(response.agent_type, AgentKind::Research);
    assert!(response.should_end);
    assert_eq!(response.next_agent, None);
    assert!(response.response.contains("Lo siento"));
}

#[tokio::test]
async fn explicit_agent_type_overrides_keyword_routing() {
    let engine = engine_with(Arc::new(FixedCompletion::new(
        "Claro, te ayudo con tu consulta.",
    )));
    let user_id = Uuid::new_v4();

    let response = engine
        .process_turn(
            user_id,
            &ChatRequest {
                message: "busca mi reserva".to_string(),
                conversation_id: None,
                agent_type: Some("customer-service".to_string()),
            },
        )
        .await
        .expect("turn");

    assert_eq!(response.agent_type, AgentKind::CustomerService);
}

#[tokio::test]
async fn unknown_agent_tags_are_rejected() {
    let engine = engine_with(Arc::new(FixedCompletion::new("{}")));
    let err = engine
        .process_turn(
            Uuid::new_v4(),
            &ChatRequest {
                message: "hola".to_string(),
                conversation_id: None,
                agent_type: Some("concierge".to_string()),
            },
        )
        .await
        .expect_err("must fail");
    assert!(matches!(err, sisa_rs_core::SisaCoreError::UnknownAgent(tag) if tag == "concierge"));
}

#[tokio::test]
async fn turns_accumulate_travel_context_across_agents() {
    let completion = Arc::new(RecordingCompletion::new(itinerary_json()));
    let engine = engine_with(completion.clone());
    let user_id = Uuid::new_v4();

    let first = engine
        .process_turn(user_id, &request("planificar un viaje a Cuenca de 4 días"))
        .await
        .expect("first turn");
    assert_eq!(first.agent_type, AgentKind::Planner);
    // Destination and duration are known, group size is not.
    assert!(first.response.contains("cuántas personas"));

    let second = engine
        .process_turn(
            user_id,
            &ChatRequest {
                message: "somos 2 personas".to_string(),
                conversation_id: Some(first.conversation_id),
                agent_type: None,
            },
        )
        .await
        .expect("second turn");

    assert_eq!(second.agent_type, AgentKind::Planner);
    let metadata = second.metadata.expect("metadata");
    assert_eq!(metadata["destination"], "Cuenca");
    assert_eq!(metadata["duration"], 4);
    // dailyCost(Cuenca)=65, 4 days, 2 people.
    assert_eq!(metadata["estimatedBudget"], 520.0);
}
