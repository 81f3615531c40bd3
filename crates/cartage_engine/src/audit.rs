//! Audit trail of every state-changing operation.
//!
//! Events are emitted after the owning transaction commits; a sink failure is
//! logged and swallowed so auditing can never undo committed work.

use std::fmt;

use jiff::Timestamp;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    TripCreated,
    DriverAssigned,
    DriverUnassigned,
    TripStarted,
    StopCompleted,
    TripCompleted,
    TripCancelled,
    TripChargeCalculated,
    PricingRuleCreated,
    SettlementApproved,
    SettlementPaid,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::TripCreated => "TRIP_CREATED",
            AuditAction::DriverAssigned => "DRIVER_ASSIGNED",
            AuditAction::DriverUnassigned => "DRIVER_UNASSIGNED",
            AuditAction::TripStarted => "TRIP_STARTED",
            AuditAction::StopCompleted => "STOP_COMPLETED",
            AuditAction::TripCompleted => "TRIP_COMPLETED",
            AuditAction::TripCancelled => "TRIP_CANCELLED",
            AuditAction::TripChargeCalculated => "TRIP_CHARGE_CALCULATED",
            AuditAction::PricingRuleCreated => "PRICING_RULE_CREATED",
            AuditAction::SettlementApproved => "SETTLEMENT_APPROVED",
            AuditAction::SettlementPaid => "SETTLEMENT_PAID",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub actor: String,
    pub metadata: Value,
    pub recorded_at: Timestamp,
}

impl AuditEvent {
    pub fn new(action: AuditAction, actor: impl Into<String>, metadata: Value) -> Self {
        Self {
            action,
            actor: actor.into(),
            metadata,
            recorded_at: Timestamp::now(),
        }
    }
}

/// Where audit events go. The orchestrator is generic over this so tests can
/// capture events in memory.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> anyhow::Result<()>;
}

/// Default sink: one structured log line per event.
#[derive(Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        tracing::info!(
            action = %event.action,
            actor = %event.actor,
            metadata = %event.metadata,
            "audit"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Collects events for assertions.
    #[derive(Default)]
    pub struct MemoryAuditSink {
        pub events: Mutex<Vec<AuditEvent>>,
    }

    impl AuditSink for MemoryAuditSink {
        fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    /// Always fails, for verifying that audit failures never poison commits.
    pub struct FailingAuditSink;

    impl AuditSink for FailingAuditSink {
        fn record(&self, _event: AuditEvent) -> anyhow::Result<()> {
            anyhow::bail!("audit sink unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_render_in_screaming_snake_case() {
        assert_eq!(AuditAction::TripStarted.to_string(), "TRIP_STARTED");
        assert_eq!(
            AuditAction::SettlementApproved.to_string(),
            "SETTLEMENT_APPROVED"
        );
    }

    #[test]
    fn memory_sink_captures_events_in_order() {
        let sink = testing::MemoryAuditSink::default();
        sink.record(AuditEvent::new(
            AuditAction::TripCreated,
            "fleet owner",
            serde_json::json!({}),
        ))
        .unwrap();
        sink.record(AuditEvent::new(
            AuditAction::TripStarted,
            "driver",
            serde_json::json!({}),
        ))
        .unwrap();

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, AuditAction::TripCreated);
        assert_eq!(events[1].action, AuditAction::TripStarted);
    }
}
