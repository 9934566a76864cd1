//! Turn-based claim chat
//!
//! A conversation validates the target item once, asks three verification
//! questions one at a time, then scores the answers and submits the claim.
//! All state is owned by the conversation; dropping it (or a pending call)
//! abandons the attempt without side effects.

use crate::api::{ClaimOutcome, ClaimSubmission, ClaimsBackend, ProofImage};
use crate::claim::state::{ClaimResult, ClaimState};
use crate::core::config::{PortalConfig, QUESTION_COUNT};
use crate::core::error::{ClaimError, Result};
use crate::core::types::{Answer, ConfidenceBand, ConversationMessage, Item};
use crate::matching::similarity;
use crate::questions::{ItemContext, QuestionGenerator, VerificationQuestions};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Per-conversation knobs, usually taken from [`PortalConfig`]
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub display_delay: Duration,
    pub min_answer_len: usize,
    pub max_proof_image_bytes: usize,
    /// The claimant, for ownership checks
    pub student_id: Option<String>,
}

impl From<&PortalConfig> for ConversationSettings {
    fn from(config: &PortalConfig) -> Self {
        Self {
            display_delay: config.display_delay(),
            min_answer_len: config.min_answer_len,
            max_proof_image_bytes: config.max_proof_image_bytes,
            student_id: config.student_id.clone(),
        }
    }
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self::from(&PortalConfig::default())
    }
}

/// One claim attempt for one found item
pub struct ClaimConversation {
    attempt_id: Uuid,
    item_id: String,
    backend: Arc<dyn ClaimsBackend>,
    generator: QuestionGenerator,
    settings: ConversationSettings,
    state: ClaimState,
    item: Option<Item>,
    questions: Option<VerificationQuestions>,
    answers: Vec<Answer>,
    transcript: Vec<ConversationMessage>,
    proof_image: Option<ProofImage>,
}

impl ClaimConversation {
    pub fn new(
        item_id: impl Into<String>,
        backend: Arc<dyn ClaimsBackend>,
        generator: QuestionGenerator,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            item_id: item_id.into(),
            backend,
            generator,
            settings,
            state: ClaimState::Loading,
            item: None,
            questions: None,
            answers: Vec::with_capacity(QUESTION_COUNT),
            transcript: Vec::new(),
            proof_image: None,
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn state(&self) -> &ClaimState {
        &self.state
    }

    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    pub fn questions(&self) -> Option<&VerificationQuestions> {
        self.questions.as_ref()
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn transcript(&self) -> &[ConversationMessage] {
        &self.transcript
    }

    /// The question awaiting an answer, if any
    pub fn current_question(&self) -> Option<&str> {
        match self.state {
            ClaimState::Asking { index } => self.questions.as_ref()?.get(index),
            _ => None,
        }
    }

    /// Validate the item and, if it is claimable, pose the first question
    ///
    /// Ineligible or unloadable items move the conversation to
    /// [`ClaimState::Error`]; this still returns `Ok`. A missing item id is a
    /// validation error and leaves the state untouched.
    pub async fn open(&mut self) -> Result<()> {
        if !matches!(self.state, ClaimState::Loading) {
            return Err(ClaimError::InvalidTransition(format!(
                "cannot open a conversation in state {}",
                self.state.name()
            )));
        }
        if self.item_id.trim().is_empty() {
            return Err(ClaimError::MissingItemId);
        }

        tracing::debug!(attempt = %self.attempt_id, item_id = %self.item_id, "Opening claim");

        let items = match self.backend.public_items().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(attempt = %self.attempt_id, "Failed to load items: {}", e);
                self.fail(format!("Could not load item details: {}", e));
                return Ok(());
            }
        };

        let Some(item) = items.into_iter().find(|i| i.id == self.item_id) else {
            self.fail(ClaimError::ItemNotFound(self.item_id.clone()).to_string());
            return Ok(());
        };

        if let Err(reason) = item.claimability(self.settings.student_id.as_deref()) {
            let error = ClaimError::from(reason);
            tracing::debug!(attempt = %self.attempt_id, "Item is not claimable: {}", error);
            self.item = Some(item);
            self.fail(error.to_string());
            return Ok(());
        }

        let questions = self.generator.generate(&ItemContext::from(&item)).await;
        let greeting = format!(
            "Hi! I'll ask you {} quick questions to confirm that this {} is yours.",
            QUESTION_COUNT,
            display_keyword(&item)
        );
        self.transcript.push(ConversationMessage::bot(greeting));
        if let Some(first) = questions.get(0) {
            self.transcript.push(ConversationMessage::bot(first));
        }

        self.item = Some(item);
        self.questions = Some(questions);
        self.state = ClaimState::Asking { index: 0 };
        tracing::debug!(attempt = %self.attempt_id, "Asking question 1");
        Ok(())
    }

    /// Check an answer without touching the conversation
    pub fn validate_answer(&self, text: &str) -> Result<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClaimError::InvalidAnswer("Please type an answer first".into()));
        }
        if trimmed.chars().count() < self.settings.min_answer_len {
            return Err(ClaimError::InvalidAnswer(format!(
                "Please give a more detailed answer (at least {} characters)",
                self.settings.min_answer_len
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Record an answer to the current question
    ///
    /// The third valid answer triggers submission. If submission fails the
    /// error is appended to the transcript, returned, and the conversation
    /// stays in [`ClaimState::Submitting`] until [`retry_submission`].
    ///
    /// [`retry_submission`]: ClaimConversation::retry_submission
    pub async fn submit_answer(&mut self, text: &str) -> Result<()> {
        let ClaimState::Asking { index } = self.state else {
            return Err(ClaimError::NotAcceptingAnswers);
        };
        let answer = self.validate_answer(text)?;

        // Nothing is recorded until the pacing delay has elapsed
        let next = index + 1;
        if next < QUESTION_COUNT && !self.settings.display_delay.is_zero() {
            tokio::time::sleep(self.settings.display_delay).await;
        }

        let question = self
            .questions
            .as_ref()
            .and_then(|q| q.get(index))
            .unwrap_or_default()
            .to_string();
        self.transcript.push(ConversationMessage::user(answer.clone()));
        self.answers.push(Answer { question, answer });

        if next < QUESTION_COUNT {
            if let Some(question) = self.questions.as_ref().and_then(|q| q.get(next)) {
                self.transcript.push(ConversationMessage::bot(question));
            }
            self.state = ClaimState::Asking { index: next };
            tracing::debug!(attempt = %self.attempt_id, "Asking question {}", next + 1);
            return Ok(());
        }

        self.state = ClaimState::Submitting;
        self.transcript.push(ConversationMessage::bot(
            "Thanks! Checking your answers and submitting your claim...",
        ));
        self.submit().await
    }

    /// Submit again after a failed submission, reusing the same answers
    pub async fn retry_submission(&mut self) -> Result<()> {
        if !matches!(self.state, ClaimState::Submitting) {
            return Err(ClaimError::InvalidTransition(format!(
                "nothing to retry in state {}",
                self.state.name()
            )));
        }
        tracing::debug!(attempt = %self.attempt_id, "Retrying submission");
        self.submit().await
    }

    /// Attach a proof-of-ownership image before the claim is submitted
    pub fn attach_proof(&mut self, image: ProofImage) -> Result<()> {
        if matches!(
            self.state,
            ClaimState::Submitting | ClaimState::Submitted(_) | ClaimState::Error(_)
        ) {
            return Err(ClaimError::InvalidTransition(
                "proof can only be attached while the claim is open".into(),
            ));
        }
        if image.size() > self.settings.max_proof_image_bytes {
            return Err(ClaimError::ProofTooLarge {
                size: image.size(),
                limit: self.settings.max_proof_image_bytes,
            });
        }
        self.proof_image = Some(image);
        Ok(())
    }

    /// Score the answers and package them for the claims endpoint
    pub fn build_submission(&self) -> Result<ClaimSubmission> {
        let item = self
            .item
            .as_ref()
            .ok_or_else(|| ClaimError::InvalidTransition("no item loaded".into()))?;
        if self.answers.len() != QUESTION_COUNT {
            return Err(ClaimError::InvalidTransition(format!(
                "{} of {} questions answered",
                self.answers.len(),
                QUESTION_COUNT
            )));
        }

        let match_percentage = similarity::score_answers(
            self.answers.iter().map(|a| a.answer.as_str()),
            &item.secret_message,
            &item.description,
        );
        let answer = |i: usize| self.answers[i].answer.clone();

        Ok(ClaimSubmission {
            item_id: item.id.clone(),
            product_type: item.item_keyword.clone(),
            description: answer(0),
            identification_marks: answer(1),
            lost_location: answer(2),
            approximate_date: answer(2),
            match_percentage,
            qa_data: self.answers.clone(),
            proof_image: self.proof_image.clone(),
        })
    }

    /// Give up on this attempt; nothing is sent
    pub fn abandon(self) {
        tracing::debug!(
            attempt = %self.attempt_id,
            "Claim abandoned in state {}",
            self.state.name()
        );
    }

    async fn submit(&mut self) -> Result<()> {
        let submission = match self.build_submission() {
            Ok(submission) => submission,
            Err(e) => return Err(self.submission_failed(e)),
        };
        let percentage = submission.match_percentage;

        match self.backend.submit_claim(&submission).await {
            Ok(outcome) => {
                self.complete(outcome, percentage);
                Ok(())
            }
            Err(e) => Err(self.submission_failed(e)),
        }
    }

    fn complete(&mut self, outcome: ClaimOutcome, match_percentage: u8) {
        let local_band = ConfidenceBand::from_percentage(match_percentage);
        let band = outcome.server_band().unwrap_or(local_band);
        tracing::info!(
            attempt = %self.attempt_id,
            match_percentage,
            band = %band,
            "Claim accepted by backend"
        );
        self.transcript.push(ConversationMessage::success(format!(
            "Your claim has been submitted. Match confidence: {}% ({}). An admin will review it and let you know.",
            match_percentage, band
        )));
        self.state = ClaimState::Submitted(ClaimResult {
            match_percentage,
            band,
            outcome,
        });
    }

    fn submission_failed(&mut self, error: ClaimError) -> ClaimError {
        tracing::warn!(attempt = %self.attempt_id, "Claim submission failed: {}", error);
        let message = match &error {
            ClaimError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        self.transcript.push(ConversationMessage::error(format!(
            "Failed to submit claim: {}",
            message
        )));
        error
    }

    fn fail(&mut self, reason: String) {
        self.transcript.push(ConversationMessage::error(reason.clone()));
        self.state = ClaimState::Error(reason);
    }
}

fn display_keyword(item: &Item) -> &str {
    let keyword = item.item_keyword.trim();
    if keyword.is_empty() {
        "item"
    } else {
        keyword
    }
}
