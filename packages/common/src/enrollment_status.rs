#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a student's request to join a course.
///
/// `Pending` is the only state a request is created in. `Approved` and
/// `Declined` are terminal.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")
)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "approved"))]
    Approved,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "declined"))]
    Declined,
}

/// A resolution a teacher or admin can apply to a pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrollmentDecision {
    Approve,
    Decline,
}

impl EnrollmentDecision {
    pub fn target(self) -> EnrollmentStatus {
        match self {
            Self::Approve => EnrollmentStatus::Approved,
            Self::Decline => EnrollmentStatus::Declined,
        }
    }
}

/// Rejected transition out of a resolved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Enrollment has already been {current}")]
pub struct TransitionError {
    pub current: EnrollmentStatus,
}

impl EnrollmentStatus {
    pub const ALL: &'static [EnrollmentStatus] = &[Self::Pending, Self::Approved, Self::Declined];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Returns true once the request has been answered.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Apply a decision, returning the new status.
    pub fn apply(self, decision: EnrollmentDecision) -> Result<EnrollmentStatus, TransitionError> {
        match self {
            Self::Pending => Ok(decision.target()),
            Self::Approved | Self::Declined => Err(TransitionError { current: self }),
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid enrollment status '{invalid}'. Valid values: pending, approved, declined")]
pub struct ParseEnrollmentStatusError {
    invalid: String,
}

impl FromStr for EnrollmentStatus {
    type Err = ParseEnrollmentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "declined" => Ok(Self::Declined),
            _ => Err(ParseEnrollmentStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}

/// Why a student may not open a new enrollment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRefusal {
    NotPaid,
    AlreadyRequested(EnrollmentStatus),
    CourseFull,
}

/// Facts gathered about a (student, course) pair before creating a request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub has_paid: bool,
    pub existing: Option<EnrollmentStatus>,
    pub approved_count: u64,
    pub max_students: u64,
}

impl RequestContext {
    /// Checks run in order: payment, existing record, capacity.
    pub fn check(&self) -> Result<(), RequestRefusal> {
        if !self.has_paid {
            return Err(RequestRefusal::NotPaid);
        }
        if let Some(status) = self.existing {
            return Err(RequestRefusal::AlreadyRequested(status));
        }
        if self.approved_count >= self.max_students {
            return Err(RequestRefusal::CourseFull);
        }
        Ok(())
    }
}
