use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::session::SessionId;
use crate::flows::TransitionOutcome;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditCategory {
    Navigation,
    Pricing,
    Purchase,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub session_id: SessionId,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(
        session_id: SessionId,
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self { session_id, correlation_id: correlation_id.into(), actor: actor.into() }
    }

    /// An event stamped with this context's session, correlation id and actor.
    pub fn event(
        &self,
        event_type: impl Into<String>,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        AuditEvent::new(
            self.session_id,
            self.correlation_id.clone(),
            event_type,
            category,
            self.actor.clone(),
            outcome,
        )
    }

    pub fn transition_applied(&self, outcome: &TransitionOutcome) -> AuditEvent {
        self.event("wizard.transition_applied", AuditCategory::Navigation, AuditOutcome::Success)
            .with_metadata("from", outcome.from.as_str())
            .with_metadata("to", outcome.to.as_str())
            .with_metadata("event", outcome.event.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub session_id: SessionId,
    pub correlation_id: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        session_id: SessionId,
        correlation_id: impl Into<String>,
        event_type: impl Into<String>,
        category: AuditCategory,
        actor: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            session_id,
            correlation_id: correlation_id.into(),
            event_type: event_type.into(),
            category,
            actor: actor.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Event types in emission order, e.g. for a compact audit trail.
    pub fn event_types(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.event_type).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{
            AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
        },
        domain::session::SessionId,
        flows::{TransitionOutcome, WizardEvent, WizardStep},
    };

    #[test]
    fn in_memory_sink_records_events_with_correlation_fields() {
        let sink = InMemoryAuditSink::default();
        let session_id = SessionId::generate();
        sink.emit(
            AuditEvent::new(
                session_id,
                "req-123",
                "wizard.transition_applied",
                AuditCategory::Navigation,
                "wizard",
                AuditOutcome::Success,
            )
            .with_metadata("from", "intro")
            .with_metadata("to", "details"),
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].correlation_id, "req-123");
        assert_eq!(events[0].session_id, session_id);
        assert!(events[0].metadata.contains_key("from"));
    }

    #[test]
    fn cloned_sinks_share_one_event_log() {
        let sink = InMemoryAuditSink::default();
        let clone = sink.clone();
        clone.emit(AuditEvent::new(
            SessionId::generate(),
            "req-9",
            "wizard.purchase_confirmed",
            AuditCategory::Purchase,
            "wizard",
            AuditOutcome::Success,
        ));

        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn transition_events_carry_context_and_steps() {
        let sink = InMemoryAuditSink::default();
        let session_id = SessionId::generate();
        let context = AuditContext::new(session_id, "req-7", "quote-session");

        sink.emit(context.transition_applied(&TransitionOutcome {
            from: WizardStep::Summary,
            to: WizardStep::Intro,
            event: WizardEvent::Buy,
            actions: Vec::new(),
        }));
        sink.emit(context.event("wizard.quote_priced", AuditCategory::Pricing, AuditOutcome::Success));

        let events = sink.events();
        assert_eq!(sink.event_types(), ["wizard.transition_applied", "wizard.quote_priced"]);
        assert_eq!(events[0].actor, "quote-session");
        assert_eq!(events[0].session_id, session_id);
        assert_eq!(events[0].metadata.get("from").map(String::as_str), Some("summary"));
        assert_eq!(events[0].metadata.get("event").map(String::as_str), Some("buy"));
        assert_eq!(events[1].category, AuditCategory::Pricing);
    }
}
