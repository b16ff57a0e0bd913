//! Device status rules: the transition applied when an inspection is
//! recorded, and the narrower set of statuses an operator may set by hand.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_INSPECTION_FAILED: &str = "Inspection Failed";
pub const STATUS_INSPECTION_DUE: &str = "Inspection Due";
pub const STATUS_EXPIRED: &str = "Expired";
pub const STATUS_INACTIVE: &str = "Inactive";

/// Statuses accepted by the manual override.
pub const OVERRIDE_STATUSES: [&str; 2] = [STATUS_INSPECTION_DUE, STATUS_EXPIRED];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum InspectionOutcome {
    Passed,
    Failed,
}

impl InspectionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionOutcome::Passed => "Passed",
            InspectionOutcome::Failed => "Failed",
        }
    }
}

impl std::str::FromStr for InspectionOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Passed" => Ok(InspectionOutcome::Passed),
            "Failed" => Ok(InspectionOutcome::Failed),
            other => Err(format!("Invalid inspection outcome: {}", other)),
        }
    }
}

/// Status implied by a recorded outcome. Unrecognised outcomes imply no
/// change.
pub fn status_for_outcome(outcome: &str) -> Option<&'static str> {
    match outcome {
        "Failed" => Some(STATUS_INSPECTION_FAILED),
        "Passed" => Some(STATUS_ACTIVE),
        _ => None,
    }
}

/// What recording an inspection does to its device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    /// The inspection is the newest on record: move the last-inspection date
    /// forward and, when the outcome implies one, replace the status.
    Apply {
        last_inspection_date: NaiveDate,
        status: Option<String>,
    },
    /// The inspection is not newer than the stored date. Nothing changes.
    Stale,
}

/// Decides the effect of an inspection dated `inspection_date` with
/// `outcome` on a device whose stored last-inspection date is `current_last`.
pub fn decide_transition(
    current_last: Option<NaiveDate>,
    inspection_date: NaiveDate,
    outcome: &str,
) -> StatusTransition {
    let newer = match current_last {
        None => true,
        Some(last) => inspection_date > last,
    };

    if !newer {
        return StatusTransition::Stale;
    }

    StatusTransition::Apply {
        last_inspection_date: inspection_date,
        status: status_for_outcome(outcome).map(str::to_string),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusOverrideError {
    #[error("Status is required")]
    StatusRequired,
    #[error("Invalid status")]
    InvalidStatus,
    #[error("Device not found")]
    DeviceNotFound,
}

/// Checks a manually requested status. Only the statuses that the
/// inspection rule never produces may be set this way.
pub fn validate_status_override(status: &str) -> Result<&'static str, StatusOverrideError> {
    if status.is_empty() {
        return Err(StatusOverrideError::StatusRequired);
    }
    OVERRIDE_STATUSES
        .iter()
        .find(|allowed| **allowed == status)
        .copied()
        .ok_or(StatusOverrideError::InvalidStatus)
}

/// Status an overdue device should carry on `today`, if any. Expiry wins over
/// a missed inspection.
pub fn overdue_status(
    expiry: Option<NaiveDate>,
    next_inspection: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<&'static str> {
    if expiry.is_some_and(|date| date <= today) {
        Some(STATUS_EXPIRED)
    } else if next_inspection.is_some_and(|date| date <= today) {
        Some(STATUS_INSPECTION_DUE)
    } else {
        None
    }
}
