//! Audit event model
//!
//! A closed set of events, tagged by `eventType` on the wire. Events are
//! shaped and validated here; persisting them is the caller's job.
//!
//! Every event is validated before it is accepted into an [`AuditTrail`],
//! and the engine only returns events that went through a trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::decision::{
    AccessDeniedReason, EligibilityStatus, GovernanceStatus, Restriction, ReviewLevel,
    ViolationReason,
};

/// Recorded in place of an identifier missing from a rejected context
pub const UNKNOWN_ID: &str = "UNKNOWN";

pub(crate) fn id_or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        UNKNOWN_ID.to_string()
    } else {
        value.to_string()
    }
}

/// Audit validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("{event_type}: required field `{field}` is missing or empty")]
    MissingField {
        event_type: &'static str,
        field: &'static str,
    },

    #[error("{event_type}: {detail}")]
    Inconsistent {
        event_type: &'static str,
        detail: String,
    },

    #[error("unknown audit event type: {0}")]
    UnknownEventType(String),

    #[error("audit event does not match its shape: {0}")]
    Malformed(String),
}

/// Who produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditActorType {
    Human,
    System,
    Admin,
}

/// Identity stamped on engine-produced events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    pub id: String,
    #[serde(rename = "type")]
    pub actor_type: AuditActorType,
}

impl AuditActor {
    pub fn system(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actor_type: AuditActorType::System,
        }
    }
}

/// Fields shared by every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditHeader {
    pub event_id: Uuid,
    pub actor_id: String,
    pub actor_type: AuditActorType,
    pub timestamp: DateTime<Utc>,
}

impl AuditHeader {
    /// Fresh header with a random event id
    pub fn new(actor: &AuditActor, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            actor_id: actor.id.clone(),
            actor_type: actor.actor_type,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceEvaluated {
    #[serde(flatten)]
    pub header: AuditHeader,
    pub usage_context_id: String,
    pub user_id: String,
    pub domain: String,
    pub status: GovernanceStatus,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceFlagged {
    #[serde(flatten)]
    pub header: AuditHeader,
    pub usage_context_id: String,
    pub user_id: String,
    pub domain: String,
    pub review_level: ReviewLevel,
    /// Human-readable reason for the flag
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceViolation {
    #[serde(flatten)]
    pub header: AuditHeader,
    pub usage_context_id: String,
    pub user_id: String,
    pub domain: String,
    pub violation_reason: ViolationReason,
    pub restriction: Restriction,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAccessEvaluated {
    #[serde(flatten)]
    pub header: AuditHeader,
    pub user_id: String,
    pub snapshot_balance: u64,
    pub decision: EligibilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<AccessDeniedReason>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAccessDenied {
    #[serde(flatten)]
    pub header: AuditHeader,
    pub user_id: String,
    pub denial_reason: AccessDeniedReason,
    pub attempt_timestamp: DateTime<Utc>,
}

/// Audit event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEvent {
    GovernanceEvaluated(GovernanceEvaluated),
    GovernanceFlagged(GovernanceFlagged),
    GovernanceViolation(GovernanceViolation),
    StoreAccessEvaluated(StoreAccessEvaluated),
    StoreAccessDenied(StoreAccessDenied),
}

impl AuditEvent {
    pub const EVENT_TYPES: [&'static str; 5] = [
        "GOVERNANCE_EVALUATED",
        "GOVERNANCE_FLAGGED",
        "GOVERNANCE_VIOLATION",
        "STORE_ACCESS_EVALUATED",
        "STORE_ACCESS_DENIED",
    ];

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GovernanceEvaluated(_) => "GOVERNANCE_EVALUATED",
            Self::GovernanceFlagged(_) => "GOVERNANCE_FLAGGED",
            Self::GovernanceViolation(_) => "GOVERNANCE_VIOLATION",
            Self::StoreAccessEvaluated(_) => "STORE_ACCESS_EVALUATED",
            Self::StoreAccessDenied(_) => "STORE_ACCESS_DENIED",
        }
    }

    pub fn header(&self) -> &AuditHeader {
        match self {
            Self::GovernanceEvaluated(e) => &e.header,
            Self::GovernanceFlagged(e) => &e.header,
            Self::GovernanceViolation(e) => &e.header,
            Self::StoreAccessEvaluated(e) => &e.header,
            Self::StoreAccessDenied(e) => &e.header,
        }
    }

    /// Payload fields that must be present for `event_type`, in wire names
    pub fn required_fields(event_type: &str) -> Option<&'static [&'static str]> {
        let fields: &'static [&'static str] = match event_type {
            "GOVERNANCE_EVALUATED" => &[
                "usageContextId",
                "userId",
                "domain",
                "status",
                "evaluatedAt",
            ],
            "GOVERNANCE_FLAGGED" => &[
                "usageContextId",
                "userId",
                "domain",
                "reviewLevel",
                "reason",
                "flaggedAt",
            ],
            "GOVERNANCE_VIOLATION" => &[
                "usageContextId",
                "userId",
                "domain",
                "violationReason",
                "restriction",
                "detectedAt",
            ],
            "STORE_ACCESS_EVALUATED" => &["userId", "snapshotBalance", "decision", "evaluatedAt"],
            "STORE_ACCESS_DENIED" => &["userId", "denialReason", "attemptTimestamp"],
            _ => return None,
        };
        Some(fields)
    }

    /// Check the event against its type's required-field set
    pub fn validate(&self) -> Result<(), AuditError> {
        let event_type = self.event_type();
        let header = self.header();
        if header.event_id.is_nil() {
            return Err(AuditError::MissingField {
                event_type,
                field: "eventId",
            });
        }
        require(event_type, "actorId", &header.actor_id)?;

        match self {
            Self::GovernanceEvaluated(e) => {
                require_governance_ids(event_type, &e.usage_context_id, &e.user_id, &e.domain)
            }
            Self::GovernanceFlagged(e) => {
                require_governance_ids(event_type, &e.usage_context_id, &e.user_id, &e.domain)?;
                require(event_type, "reason", &e.reason)
            }
            Self::GovernanceViolation(e) => {
                require_governance_ids(event_type, &e.usage_context_id, &e.user_id, &e.domain)
            }
            Self::StoreAccessEvaluated(e) => {
                require(event_type, "userId", &e.user_id)?;
                let eligible = e.decision == EligibilityStatus::Eligible;
                if eligible != (e.snapshot_balance > 0) {
                    return Err(AuditError::Inconsistent {
                        event_type,
                        detail: format!(
                            "decision {:?} does not match snapshot balance {}",
                            e.decision, e.snapshot_balance
                        ),
                    });
                }
                if eligible == e.denial_reason.is_some() {
                    return Err(AuditError::Inconsistent {
                        event_type,
                        detail: "denial reason must be present exactly when ineligible".into(),
                    });
                }
                Ok(())
            }
            Self::StoreAccessDenied(e) => require(event_type, "userId", &e.user_id),
        }
    }

    /// Accept an event from its JSON form.
    ///
    /// Checks the tag and required fields before deserializing, then runs
    /// [`validate`](Self::validate).
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AuditError> {
        let object = value
            .as_object()
            .ok_or_else(|| AuditError::Malformed("event is not a JSON object".into()))?;
        let event_type = object
            .get("eventType")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AuditError::Malformed("eventType is missing".into()))?;
        let tag = Self::EVENT_TYPES
            .into_iter()
            .find(|t| *t == event_type)
            .ok_or_else(|| AuditError::UnknownEventType(event_type.to_string()))?;
        let required = Self::required_fields(tag)
            .ok_or_else(|| AuditError::UnknownEventType(event_type.to_string()))?;

        for field in required.iter().copied() {
            if object.get(field).map_or(true, serde_json::Value::is_null) {
                return Err(AuditError::MissingField {
                    event_type: tag,
                    field,
                });
            }
        }

        let event: AuditEvent = serde_json::from_value(value.clone())
            .map_err(|e| AuditError::Malformed(e.to_string()))?;
        event.validate()?;
        Ok(event)
    }
}

fn require(event_type: &'static str, field: &'static str, value: &str) -> Result<(), AuditError> {
    if value.trim().is_empty() {
        Err(AuditError::MissingField { event_type, field })
    } else {
        Ok(())
    }
}

fn require_governance_ids(
    event_type: &'static str,
    usage_context_id: &str,
    user_id: &str,
    domain: &str,
) -> Result<(), AuditError> {
    require(event_type, "usageContextId", usage_context_id)?;
    require(event_type, "userId", user_id)?;
    require(event_type, "domain", domain)
}

/// Append-only list of validated events
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append
    pub fn push(&mut self, event: AuditEvent) -> Result<(), AuditError> {
        event.validate()?;
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<AuditEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> AuditHeader {
        AuditHeader::new(&AuditActor::system("economy-governance"), Utc::now())
    }

    fn evaluated(user_id: &str) -> AuditEvent {
        AuditEvent::GovernanceEvaluated(GovernanceEvaluated {
            header: header(),
            usage_context_id: "uc-1".into(),
            user_id: user_id.into(),
            domain: "STORE".into(),
            status: GovernanceStatus::Allowed,
            evaluated_at: Utc::now(),
        })
    }

    #[test]
    fn serializes_with_event_type_tag() {
        let json = serde_json::to_value(evaluated("user-1")).unwrap();
        assert_eq!(json["eventType"], "GOVERNANCE_EVALUATED");
        assert_eq!(json["usageContextId"], "uc-1");
        assert_eq!(json["actorType"], "SYSTEM");
        assert!(json["eventId"].is_string());
    }

    #[test]
    fn json_roundtrip_through_from_json() {
        let event = evaluated("user-1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(AuditEvent::from_json(&json).unwrap(), event);
    }

    #[test]
    fn empty_user_id_fails_validation() {
        let err = evaluated("").validate().unwrap_err();
        assert_eq!(
            err,
            AuditError::MissingField {
                event_type: "GOVERNANCE_EVALUATED",
                field: "userId"
            }
        );
    }

    #[test]
    fn nil_event_id_fails_validation() {
        let mut event = evaluated("user-1");
        if let AuditEvent::GovernanceEvaluated(e) = &mut event {
            e.header.event_id = Uuid::nil();
        }
        assert!(matches!(
            event.validate(),
            Err(AuditError::MissingField { field: "eventId", .. })
        ));
    }

    #[test]
    fn from_json_reports_missing_required_field() {
        let mut json = serde_json::to_value(evaluated("user-1")).unwrap();
        json.as_object_mut().unwrap().remove("domain");
        assert_eq!(
            AuditEvent::from_json(&json).unwrap_err(),
            AuditError::MissingField {
                event_type: "GOVERNANCE_EVALUATED",
                field: "domain"
            }
        );
    }

    #[test]
    fn from_json_rejects_unknown_tag() {
        let json = serde_json::json!({ "eventType": "GOVERNANCE_IGNORED" });
        assert!(matches!(
            AuditEvent::from_json(&json),
            Err(AuditError::UnknownEventType(t)) if t == "GOVERNANCE_IGNORED"
        ));
    }

    #[test]
    fn every_tag_has_a_required_field_set() {
        for tag in AuditEvent::EVENT_TYPES {
            assert!(AuditEvent::required_fields(tag).is_some(), "{tag}");
        }
    }

    #[test]
    fn store_evaluated_must_match_balance() {
        let event = AuditEvent::StoreAccessEvaluated(StoreAccessEvaluated {
            header: header(),
            user_id: "user-1".into(),
            snapshot_balance: 0,
            decision: EligibilityStatus::Eligible,
            denial_reason: None,
            evaluated_at: Utc::now(),
        });
        assert!(matches!(
            event.validate(),
            Err(AuditError::Inconsistent { .. })
        ));

        let event = AuditEvent::StoreAccessEvaluated(StoreAccessEvaluated {
            header: header(),
            user_id: "user-1".into(),
            snapshot_balance: 0,
            decision: EligibilityStatus::Ineligible,
            denial_reason: Some(AccessDeniedReason::NoActiveMc),
            evaluated_at: Utc::now(),
        });
        assert!(event.validate().is_ok());
    }

    #[test]
    fn trail_rejects_invalid_events() {
        let mut trail = AuditTrail::new();
        trail.push(evaluated("user-1")).unwrap();
        assert!(trail.push(evaluated("  ")).is_err());
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.into_events()[0].event_type(), "GOVERNANCE_EVALUATED");
    }
}
