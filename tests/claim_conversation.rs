//! Integration tests for the claim conversation state machine

use async_trait::async_trait;
use lostfound_claims::api::{AiAnalysis, ClaimOutcome, MockBackend, ProofImage};
use lostfound_claims::claim::{ClaimConversation, ClaimState, ConversationSettings};
use lostfound_claims::core::error::{ClaimError, Result};
use lostfound_claims::core::types::{ConfidenceBand, Item, ItemStatus, ItemType, MessageRole};
use lostfound_claims::questions::{ItemContext, QuestionGenerator, QuestionSource};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const LAPTOP_ANSWERS: [&str; 3] = [
    "It's a black Dell laptop",
    "has a scratch and red sticker on lid",
    "lost near the library entrance yesterday",
];

fn laptop() -> Item {
    Item {
        id: "item-42".into(),
        item_type: ItemType::Found,
        item_keyword: "laptop".into(),
        description: "Black Dell laptop with a sticker".into(),
        location: "Library".into(),
        secret_message: "has a deep scratch on the lid and a red sticker".into(),
        status: ItemStatus::Active,
        student_id: None,
        is_owner: false,
    }
}

fn settings() -> ConversationSettings {
    ConversationSettings {
        display_delay: Duration::ZERO,
        ..ConversationSettings::default()
    }
}

/// Counts how often questions were requested; always fails
struct CountingSource {
    calls: AtomicU32,
}

#[async_trait]
impl QuestionSource for CountingSource {
    async fn fetch_questions(&self, _item: &ItemContext) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClaimError::Api {
            status: 500,
            message: "generator down".into(),
        })
    }
}

fn conversation(backend: Arc<MockBackend>, item_id: &str) -> ClaimConversation {
    ClaimConversation::new(item_id, backend, QuestionGenerator::offline(), settings())
}

async fn answer_all(conversation: &mut ClaimConversation) -> Result<()> {
    for answer in LAPTOP_ANSWERS {
        conversation.submit_answer(answer).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_open_poses_fallback_questions() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend, "item-42");

    chat.open().await.unwrap();
    assert_eq!(chat.state(), &ClaimState::Asking { index: 0 });

    let questions = chat.questions().unwrap();
    assert!(questions.get(0).unwrap().contains("Black Dell laptop with a"));
    assert!(questions.get(1).unwrap().contains("scratches"));
    assert!(questions.get(2).unwrap().contains("Library"));

    // Greeting plus the first question
    assert_eq!(chat.transcript().len(), 2);
    assert_eq!(chat.current_question(), questions.get(0));
}

#[tokio::test]
async fn test_full_claim_is_scored_and_submitted() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend.clone(), "item-42");
    chat.open().await.unwrap();

    answer_all(&mut chat).await.unwrap();

    let ClaimState::Submitted(result) = chat.state() else {
        panic!("expected submitted, got {:?}", chat.state());
    };
    assert!(result.match_percentage >= 40);
    assert_eq!(
        result.band,
        ConfidenceBand::from_percentage(result.match_percentage)
    );

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    let sent = &submissions[0];
    assert_eq!(sent.item_id, "item-42");
    assert_eq!(sent.product_type, "laptop");
    assert_eq!(sent.description, LAPTOP_ANSWERS[0]);
    assert_eq!(sent.identification_marks, LAPTOP_ANSWERS[1]);
    assert_eq!(sent.lost_location, LAPTOP_ANSWERS[2]);
    assert_eq!(sent.qa_data.len(), 3);
    assert_eq!(sent.qa_data[1].question, chat.questions().unwrap().get(1).unwrap());
    assert_eq!(sent.match_percentage, result.match_percentage);

    let last = chat.transcript().last().unwrap();
    assert!(last.is_success());
}

#[tokio::test]
async fn test_server_band_supersedes_local_band() {
    let outcome = ClaimOutcome {
        claim_id: Some("c-9".into()),
        message: None,
        ai_analysis: Some(AiAnalysis {
            confidence_band: Some("INSUFFICIENT".into()),
            ..AiAnalysis::default()
        }),
    };
    let backend = Arc::new(MockBackend::new(vec![laptop()]).with_outcome(outcome));
    let mut chat = conversation(backend, "item-42");
    chat.open().await.unwrap();
    answer_all(&mut chat).await.unwrap();

    let ClaimState::Submitted(result) = chat.state() else {
        panic!("expected submitted");
    };
    assert_eq!(result.band, ConfidenceBand::Insufficient);
    assert_eq!(result.outcome.claim_id.as_deref(), Some("c-9"));
}

#[tokio::test]
async fn test_claimed_item_errors_before_questions() {
    let mut item = laptop();
    item.status = ItemStatus::Claimed;
    let source = Arc::new(CountingSource {
        calls: AtomicU32::new(0),
    });
    let generator = QuestionGenerator::new(source.clone(), Duration::from_secs(1));
    let backend = Arc::new(MockBackend::new(vec![item]));
    let mut chat = ClaimConversation::new("item-42", backend, generator, settings());

    chat.open().await.unwrap();

    let reason = chat.state().error_reason().unwrap();
    assert!(reason.contains("already been claimed"));
    assert!(chat.questions().is_none());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_own_item_errors_with_ownership_message() {
    let mut item = laptop();
    item.is_owner = true;
    let backend = Arc::new(MockBackend::new(vec![item]));
    let mut chat = conversation(backend, "item-42");

    chat.open().await.unwrap();

    let reason = chat.state().error_reason().unwrap();
    assert!(reason.contains("reported yourself"));
    assert!(chat.transcript().last().unwrap().is_error());
}

#[tokio::test]
async fn test_lost_item_and_missing_item() {
    let mut lost = laptop();
    lost.item_type = ItemType::Lost;
    let backend = Arc::new(MockBackend::new(vec![lost]));
    let mut chat = conversation(backend, "item-42");
    chat.open().await.unwrap();
    assert!(chat.state().error_reason().unwrap().contains("found items"));

    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend, "nope");
    chat.open().await.unwrap();
    assert!(chat.state().error_reason().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_unavailable_item_list_is_an_error_state() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]).with_items_available(false));
    let mut chat = conversation(backend, "item-42");
    chat.open().await.unwrap();
    assert!(chat
        .state()
        .error_reason()
        .unwrap()
        .starts_with("Could not load item details"));
}

#[tokio::test]
async fn test_missing_item_id_is_validation_error() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend.clone(), "  ");

    let err = chat.open().await.unwrap_err();
    assert!(matches!(err, ClaimError::MissingItemId));
    assert!(err.is_validation());
    assert_eq!(chat.state(), &ClaimState::Loading);
    assert_eq!(backend.item_calls(), 0);
}

#[tokio::test]
async fn test_answer_length_boundary() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend, "item-42");
    chat.open().await.unwrap();
    let before = chat.transcript().len();

    let err = chat.submit_answer("abcd").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(chat.state(), &ClaimState::Asking { index: 0 });
    assert_eq!(chat.transcript().len(), before);
    assert!(chat.answers().is_empty());

    // Surrounding whitespace does not count
    assert!(chat.submit_answer("   abcd   ").await.is_err());
    assert!(chat.submit_answer("").await.is_err());

    chat.submit_answer("abcde").await.unwrap();
    assert_eq!(chat.state(), &ClaimState::Asking { index: 1 });
    assert_eq!(chat.answers()[0].answer, "abcde");

    let roles: Vec<MessageRole> = chat.transcript()[before..].iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![MessageRole::User, MessageRole::Bot]);
}

#[tokio::test]
async fn test_answers_rejected_outside_asking() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend, "item-42");

    let err = chat.submit_answer("a perfectly fine answer").await.unwrap_err();
    assert!(matches!(err, ClaimError::NotAcceptingAnswers));

    chat.open().await.unwrap();
    answer_all(&mut chat).await.unwrap();
    let err = chat.submit_answer("one more answer").await.unwrap_err();
    assert!(matches!(err, ClaimError::NotAcceptingAnswers));
}

#[tokio::test]
async fn test_failed_submission_can_be_retried() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]).with_failing_submissions(1));
    let mut chat = conversation(backend.clone(), "item-42");
    chat.open().await.unwrap();

    let err = answer_all(&mut chat).await.unwrap_err();
    assert!(matches!(err, ClaimError::Api { status: 400, .. }));
    assert_eq!(chat.state(), &ClaimState::Submitting);
    assert_eq!(chat.answers().len(), 3);

    let last = chat.transcript().last().unwrap();
    assert!(last.is_error());
    assert!(last.text.contains("pending claim"));

    // No more answers while stuck in submitting
    assert!(chat.submit_answer("extra answer").await.is_err());

    chat.retry_submission().await.unwrap();
    assert!(matches!(chat.state(), ClaimState::Submitted(_)));

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].qa_data, submissions[1].qa_data);
}

#[tokio::test]
async fn test_retry_requires_submitting_state() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend, "item-42");
    chat.open().await.unwrap();
    assert!(matches!(
        chat.retry_submission().await,
        Err(ClaimError::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn test_open_twice_is_rejected() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend, "item-42");
    chat.open().await.unwrap();
    assert!(matches!(
        chat.open().await,
        Err(ClaimError::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn test_proof_image_travels_with_submission() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let small = ConversationSettings {
        max_proof_image_bytes: 8,
        ..settings()
    };
    let mut chat = ClaimConversation::new(
        "item-42",
        backend.clone(),
        QuestionGenerator::offline(),
        small,
    );
    chat.open().await.unwrap();

    let too_big = ProofImage::new("proof.png", "image/png", vec![0; 9]);
    assert!(matches!(
        chat.attach_proof(too_big),
        Err(ClaimError::ProofTooLarge { size: 9, limit: 8 })
    ));

    chat.attach_proof(ProofImage::new("proof.png", "image/png", vec![0; 8]))
        .unwrap();
    answer_all(&mut chat).await.unwrap();

    let sent = backend.submissions();
    assert_eq!(sent[0].proof_image.as_ref().unwrap().file_name, "proof.png");
}

#[tokio::test]
async fn test_abandon_has_no_side_effects() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut chat = conversation(backend.clone(), "item-42");
    chat.open().await.unwrap();
    chat.submit_answer("It's a black Dell laptop").await.unwrap();

    chat.abandon();
    assert!(backend.submissions().is_empty());
}

#[tokio::test]
async fn test_attempts_are_isolated() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let mut first = conversation(backend.clone(), "item-42");
    let mut second = conversation(backend, "item-42");
    assert_ne!(first.attempt_id(), second.attempt_id());

    first.open().await.unwrap();
    second.open().await.unwrap();
    first.submit_answer("first attempt answer").await.unwrap();

    assert_eq!(first.answers().len(), 1);
    assert!(second.answers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_next_question_waits_for_display_delay() {
    let backend = Arc::new(MockBackend::new(vec![laptop()]));
    let delay = Duration::from_millis(500);
    let settings = ConversationSettings {
        display_delay: delay,
        ..ConversationSettings::default()
    };
    let mut chat =
        ClaimConversation::new("item-42", backend.clone(), QuestionGenerator::offline(), settings);
    chat.open().await.unwrap();
    let opening_len = chat.transcript().len();

    // Still inside the delay: nothing is recorded yet
    let early = tokio::time::timeout(
        delay - Duration::from_millis(1),
        chat.submit_answer(LAPTOP_ANSWERS[0]),
    )
    .await;
    assert!(early.is_err());
    assert_eq!(chat.state(), &ClaimState::Asking { index: 0 });
    assert!(chat.answers().is_empty());
    assert_eq!(chat.transcript().len(), opening_len);

    let started = tokio::time::Instant::now();
    chat.submit_answer(LAPTOP_ANSWERS[0]).await.unwrap();
    assert!(started.elapsed() >= delay);
    assert_eq!(chat.state(), &ClaimState::Asking { index: 1 });
    assert_eq!(chat.answers().len(), 1);
    assert_eq!(
        chat.transcript().last().map(|m| m.text.as_str()),
        chat.current_question()
    );

    chat.submit_answer(LAPTOP_ANSWERS[1]).await.unwrap();
    chat.submit_answer(LAPTOP_ANSWERS[2]).await.unwrap();

    assert!(matches!(chat.state(), ClaimState::Submitted(_)));
    let sent = backend.submissions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].qa_data.len(), 3);
    assert_eq!(sent[0].description, LAPTOP_ANSWERS[0]);
    assert_eq!(sent[0].lost_location, LAPTOP_ANSWERS[2]);
}
