//! Relay coordinator
//!
//! Handles one inbound event at a time per conversation:
//! 1. Classify the sender (operator reply, bare operator, guest)
//! 2. Operator replies: resolve the origin and forward, or run an admin command
//! 3. Guests: block check, then verification, then abuse check, then relay
//! 4. Selections: decode the payload and drive the verification transition
//!
//! Outbound failures are logged and swallowed. Only store failures are
//! returned, so the caller can ask the platform to redeliver. Store calls
//! are synchronous and run on the handling task.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use relaygate_core::{
    AdminCommand, ChoiceKeyboard, ConversationId, InboundEvent, MessageEvent, MessageId, Route,
    SelectionEvent, SelectionPayload, DEFAULT_CHALLENGE_TTL,
};
use relaygate_store::TtlStore;

use crate::{
    texts, AbuseList, AnswerOutcome, BlockRegistry, ChallengeSource, ConversationLocks,
    IdentityMap, MathChallenges, Messenger, RelayError, Result, VerificationState, Verifier,
};

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The operator's conversation id
    pub operator: ConversationId,
    /// Reply to `/start`
    pub greeting: String,
    /// Lifetime of an unanswered challenge, `None` to keep it forever
    pub challenge_ttl: Option<Duration>,
}

impl RelayConfig {
    pub fn new(operator: ConversationId) -> Self {
        Self {
            operator,
            greeting: texts::GREETING.to_string(),
            challenge_ttl: Some(DEFAULT_CHALLENGE_TTL),
        }
    }
}

pub struct RelayCoordinator {
    config: RelayConfig,
    verifier: Verifier,
    identities: IdentityMap,
    blocks: BlockRegistry,
    messenger: Arc<dyn Messenger>,
    abuse: Arc<dyn AbuseList>,
    challenges: Arc<dyn ChallengeSource>,
    locks: ConversationLocks,
}

impl RelayCoordinator {
    pub fn new(
        config: RelayConfig,
        store: Arc<TtlStore>,
        messenger: Arc<dyn Messenger>,
        abuse: Arc<dyn AbuseList>,
    ) -> Self {
        Self {
            verifier: Verifier::new(store.clone(), config.challenge_ttl),
            identities: IdentityMap::new(store.clone()),
            blocks: BlockRegistry::new(store, config.operator.clone()),
            config,
            messenger,
            abuse,
            challenges: Arc::new(MathChallenges),
            locks: ConversationLocks::new(),
        }
    }

    /// Replace the challenge generator
    pub fn with_challenges(mut self, challenges: Arc<dyn ChallengeSource>) -> Self {
        self.challenges = challenges;
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn identities(&self) -> &IdentityMap {
        &self.identities
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Message(message) => self.handle_message(message).await,
            InboundEvent::Selection(selection) => self.handle_selection(selection).await,
        }
    }

    pub async fn handle_message(&self, message: MessageEvent) -> Result<()> {
        if message.is_start() {
            self.send(&message.conversation_id, &self.config.greeting, None).await;
            return Ok(());
        }

        match message.route(&self.config.operator) {
            Route::OperatorReply { replied_to } => self.handle_operator_reply(&message, replied_to).await,
            Route::OperatorBare => {
                self.send(&self.config.operator, texts::OPERATOR_USAGE, None).await;
                Ok(())
            }
            Route::Guest => self.handle_guest(&message).await,
        }
    }

    async fn handle_operator_reply(&self, message: &MessageEvent, replied_to: MessageId) -> Result<()> {
        if let Some(command) = AdminCommand::parse(&message.text) {
            return self.handle_admin(command, replied_to).await;
        }

        let Some(origin) = self.identities.resolve_origin(replied_to) else {
            debug!("No origin for relayed message {}", replied_to);
            self.send(&self.config.operator, texts::CANNOT_RESOLVE, None).await;
            return Ok(());
        };

        if let Err(e) = self
            .messenger
            .copy_message(&origin, &message.conversation_id, message.message_id)
            .await
        {
            warn!("Failed to deliver operator reply to {}: {}", origin, e);
        }
        Ok(())
    }

    async fn handle_admin(&self, command: AdminCommand, replied_to: MessageId) -> Result<()> {
        let operator = &self.config.operator;
        let Some(origin) = self.identities.resolve_origin(replied_to) else {
            self.send(operator, texts::CANNOT_RESOLVE, None).await;
            return Ok(());
        };

        let _guard = self.locks.lock(&origin).await;
        let reply = match command {
            AdminCommand::Block => match self.blocks.set_blocked(&origin, true) {
                Ok(()) => texts::blocked_confirmation(&origin),
                Err(RelayError::SelfBlock) => texts::CANNOT_BLOCK_SELF.to_string(),
                Err(e) => return Err(e),
            },
            AdminCommand::Unblock => {
                self.blocks.set_blocked(&origin, false)?;
                texts::unblocked_confirmation(&origin)
            }
            AdminCommand::CheckBlock => texts::block_status(&origin, self.blocks.is_blocked(&origin)),
        };
        self.send(operator, &reply, None).await;
        Ok(())
    }

    async fn handle_guest(&self, message: &MessageEvent) -> Result<()> {
        let guest = &message.conversation_id;
        let _guard = self.locks.lock(guest).await;

        if self.blocks.is_blocked(guest) {
            debug!("Dropping message from blocked {}", guest);
            self.send(guest, texts::BLOCKED, None).await;
            return Ok(());
        }

        match self.verifier.state(guest) {
            VerificationState::Unverified => {
                let challenge = self.challenges.generate();
                self.verifier.issue(guest, &challenge.answer)?;
                self.send(guest, &challenge.prompt(), Some(&challenge.keyboard())).await;
                return Ok(());
            }
            VerificationState::Challenged { .. } => {
                self.send(guest, texts::CHALLENGE_REMINDER, None).await;
                return Ok(());
            }
            VerificationState::Verified => {}
        }

        match self.abuse.is_flagged(guest).await {
            Ok(true) => {
                warn!("{} is on the abuse list, not relaying", guest);
                self.send(&self.config.operator, &texts::abuse_warning(guest), None).await;
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => warn!("Abuse list check failed for {}, relaying anyway: {}", guest, e),
        }

        match self
            .messenger
            .relay_message(&self.config.operator, guest, message.message_id)
            .await
        {
            Ok(relayed) => {
                self.identities.record_relay(relayed, guest)?;
                debug!("Relayed {} from {} as {}", message.message_id, guest, relayed);
            }
            Err(e) => warn!("Failed to relay message from {}: {}", guest, e),
        }
        Ok(())
    }

    pub async fn handle_selection(&self, selection: SelectionEvent) -> Result<()> {
        let payload = match SelectionPayload::parse(&selection.payload) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Ignoring selection from {}: {}", selection.sender_id, e);
                return Ok(());
            }
        };

        let user = &selection.sender_id;
        let _guard = self.locks.lock(user).await;

        match self.verifier.resolve(user, &payload)? {
            AnswerOutcome::Accepted => {
                info!("{} verified", user);
                let result = match selection.message_id {
                    Some(message_id) => self.messenger.edit_text(user, message_id, texts::VERIFIED).await,
                    None => self.messenger.send_text(user, texts::VERIFIED, None).await,
                };
                if let Err(e) = result {
                    warn!("Failed to confirm verification to {}: {}", user, e);
                }
            }
            AnswerOutcome::Rejected => {
                self.acknowledge(&selection.selection_id, texts::WRONG_ANSWER, true).await;
            }
            AnswerOutcome::AlreadyVerified => {
                self.acknowledge(&selection.selection_id, texts::ALREADY_VERIFIED, false).await;
            }
            AnswerOutcome::Expired => {
                self.acknowledge(&selection.selection_id, texts::CHALLENGE_EXPIRED, true).await;
            }
        }
        Ok(())
    }

    async fn send(&self, to: &ConversationId, text: &str, keyboard: Option<&ChoiceKeyboard>) {
        if let Err(e) = self.messenger.send_text(to, text, keyboard).await {
            warn!("Failed to send message to {}: {}", to, e);
        }
    }

    async fn acknowledge(&self, selection_id: &str, text: &str, emphasize: bool) {
        if let Err(e) = self.messenger.acknowledge_selection(selection_id, text, emphasize).await {
            warn!("Failed to acknowledge selection {}: {}", selection_id, e);
        }
    }
}
