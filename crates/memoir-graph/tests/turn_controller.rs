mod common;

use common::{tool_call, FlakyTranscripts, Harness, ScriptedModel};
use memoir_graph::{
    ControllerConfig, InboundMessage, MessageHandler, SubgraphConfig, TurnOutcome,
};
use memoir_llm::{ChatResponse, MessageRole};
use memoir_memory::{CoreFactStore, InMemoryStore, TranscriptStore, TurnRole, UserId, UserStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_core_fact_reaches_next_turn_prompt() {
    let harness = Harness::new(ScriptedModel::new(vec![
        tool_call("call_1", "store_core_memory", json!({"memory": "My name is Alex"})),
        ChatResponse::text("Nice to meet you, Alex!"),
        ChatResponse::text("Your name is Alex."),
    ]));
    let user = UserId(1);

    let first = harness.controller.handle_turn(user, "My name is Alex").await;
    assert_eq!(first.outcome, TurnOutcome::Answered);
    assert_eq!(first.answer, "Nice to meet you, Alex!");
    assert_eq!(
        harness.store.core_facts(user).await.unwrap(),
        vec!["My name is Alex".to_string()]
    );

    let second = harness.controller.handle_turn(user, "What is my name?").await;
    assert_eq!(second.answer, "Your name is Alex.");

    let requests = harness.model.requests();
    assert_eq!(requests.len(), 3);

    // Second call of turn one sees the tool observation
    let observation = requests[1].last().unwrap();
    assert_eq!(observation.role, MessageRole::Tool);
    assert_eq!(observation.content, "Core memory stored successfully");

    // Turn two: system prompt carries the fact, window carries turn one
    let turn_two = &requests[2];
    assert_eq!(turn_two[0].role, MessageRole::System);
    assert!(turn_two[0].content.contains("Core - My name is Alex\n"));
    let window: Vec<_> = turn_two[1..]
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        window,
        vec![
            (MessageRole::User, "My name is Alex"),
            (MessageRole::Assistant, "Nice to meet you, Alex!"),
            (MessageRole::User, "What is my name?"),
        ]
    );
}

#[tokio::test]
async fn test_unknown_tool_gets_correction_and_turn_completes() {
    let harness = Harness::new(ScriptedModel::new(vec![
        tool_call("call_1", "delete_everything", json!({})),
        ChatResponse::text("I can't do that, but I can remember things for you."),
    ]));

    let reply = harness.controller.handle_turn(UserId(1), "Forget me").await;
    assert_eq!(reply.outcome, TurnOutcome::Answered);

    let requests = harness.model.requests();
    let correction = requests[1].last().unwrap();
    assert_eq!(correction.tool_call_id.as_deref(), Some("call_1"));
    assert!(correction.content.contains("is not a valid tool"));
    for name in ["save_recall_memory", "search_memory", "store_core_memory"] {
        assert!(correction.content.contains(name));
    }
}

#[tokio::test]
async fn test_transcript_has_two_entries_per_turn() {
    let harness = Harness::new(ScriptedModel::from_fn(|n| {
        Ok(ChatResponse::text(format!("answer {n}")))
    }));
    let user = UserId(7);

    for i in 0..4 {
        let reply = harness.controller.handle_turn(user, &format!("question {i}")).await;
        assert!(reply.persisted);
    }

    let transcript = harness.store.transcript(user).await.unwrap();
    assert_eq!(transcript.len(), 8);
    for (i, pair) in transcript.chunks(2).enumerate() {
        assert_eq!(pair[0].role, TurnRole::Human);
        assert_eq!(pair[0].content, format!("question {i}"));
        assert_eq!(pair[1].role, TurnRole::Assistant);
        assert_eq!(pair[1].content, format!("answer {i}"));
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }

    // The window holds the last six entries plus the new query
    let last_request = harness.model.requests().pop().unwrap();
    assert_eq!(last_request.len(), 1 + 6 + 1);
    assert_eq!(last_request[1].content, "question 0");
}

#[tokio::test]
async fn test_model_failure_returns_apology_and_persists_nothing() {
    let harness = Harness::new(ScriptedModel::failing());
    let user = UserId(1);

    let reply = harness.controller.handle_turn(user, "hello").await;

    assert_eq!(reply.outcome, TurnOutcome::Failed);
    assert_eq!(reply.answer, ControllerConfig::default().failure_message);
    assert!(!reply.persisted);
    assert!(harness.store.transcript(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_load_failure_degrades_to_empty_window() {
    let harness = Harness::build(
        ScriptedModel::new(vec![ChatResponse::text("Hi!")]),
        Some(Arc::new(FlakyTranscripts::failing_reads())),
        ControllerConfig::default(),
        SubgraphConfig::default(),
    );

    let reply = harness.controller.handle_turn(UserId(1), "hello").await;
    assert_eq!(reply.outcome, TurnOutcome::Answered);
    assert_eq!(reply.answer, "Hi!");

    let request = &harness.model.requests()[0];
    assert_eq!(request.len(), 2);
    assert_eq!(request[1].content, "hello");
}

#[tokio::test]
async fn test_persist_failure_keeps_the_answer() {
    let harness = Harness::build(
        ScriptedModel::new(vec![ChatResponse::text("Hi!")]),
        Some(Arc::new(FlakyTranscripts::failing_writes())),
        ControllerConfig::default(),
        SubgraphConfig::default(),
    );

    let reply = harness.controller.handle_turn(UserId(1), "hello").await;
    assert_eq!(reply.answer, "Hi!");
    assert_eq!(reply.outcome, TurnOutcome::Answered);
    assert!(!reply.persisted);
}

#[tokio::test]
async fn test_timeout_answers_and_lets_tool_writes_finish() {
    let model = ScriptedModel::new(vec![
        tool_call("call_1", "store_core_memory", json!({"memory": "works nights"})),
        ChatResponse::text("too late"),
    ])
    .with_delay_from(1, Duration::from_millis(500));

    let harness = Harness::build(
        model,
        None,
        ControllerConfig::default().with_turn_timeout(Duration::from_millis(100)),
        SubgraphConfig::default(),
    );
    let user = UserId(1);

    let reply = harness.controller.handle_turn(user, "I work nights").await;

    assert_eq!(reply.outcome, TurnOutcome::TimedOut);
    assert_eq!(reply.answer, ControllerConfig::default().timeout_message);
    assert!(reply.persisted);
    assert_eq!(
        harness.store.core_facts(user).await.unwrap(),
        vec!["works nights".to_string()]
    );

    let transcript = harness.store.transcript(user).await.unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].content, reply.answer);
}

#[tokio::test]
async fn test_empty_model_answer_is_replaced() {
    let harness = Harness::new(ScriptedModel::new(vec![ChatResponse::text("   ")]));

    let reply = harness.controller.handle_turn(UserId(1), "hello").await;
    assert_eq!(reply.answer, ControllerConfig::default().empty_answer_message);
}

#[tokio::test]
async fn test_concurrent_turns_of_one_user_do_not_interleave() {
    let model = ScriptedModel::from_fn(|n| Ok(ChatResponse::text(format!("answer {n}"))))
        .with_delay_from(0, Duration::from_millis(30));
    let harness = Harness::new(model);
    let user = UserId(3);

    let turns = (0..3).map(|i| {
        let controller = harness.controller.clone();
        tokio::spawn(async move { controller.handle_turn(user, &format!("q{i}")).await })
    });
    for turn in turns.collect::<Vec<_>>() {
        assert!(turn.await.unwrap().persisted);
    }

    let transcript = harness.store.transcript(user).await.unwrap();
    assert_eq!(transcript.len(), 6);
    for pair in transcript.chunks(2) {
        assert_eq!(pair[0].role, TurnRole::Human);
        assert_eq!(pair[1].role, TurnRole::Assistant);
    }

    // Each later turn saw the earlier turns in its window
    let requests = harness.model.requests();
    assert_eq!(requests[0].len(), 2);
    assert_eq!(requests[1].len(), 4);
    assert_eq!(requests[2].len(), 6);
}

#[tokio::test]
async fn test_handler_resolves_users_by_platform_id() {
    let harness = Harness::new(ScriptedModel::from_fn(|_| Ok(ChatResponse::text("ok"))));
    let users = Arc::new(InMemoryStore::new());
    let handler = MessageHandler::new(users.clone(), harness.controller.clone());

    handler
        .handle(InboundMessage::new(555, Some("alex".into()), "hi"))
        .await;
    let answer = handler.handle(InboundMessage::new(555, None, "again")).await;
    handler.handle(InboundMessage::new(777, None, "hello")).await;

    assert_eq!(answer, "ok");
    assert_eq!(users.user_count(), 2);

    let alex = users.get_or_create_user(555, None).await.unwrap();
    assert_eq!(harness.store.transcript(alex.id).await.unwrap().len(), 4);
}
