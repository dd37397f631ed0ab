//! Project sign-off and data protection.
//!
//! A member asks for a project to be signed off, which locks the project
//! against deletes. An owner or admin then approves or rejects the request.
//! This module holds the transition rules; [`store`] applies them to the
//! database under a row lock, [`gate`] enforces the lock on deletes and
//! [`status`] exposes the read side.

pub mod gate;
pub mod status;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Role;

/// The sign-off columns of a project row that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignoffFlags {
    pub requested: bool,
    pub approved: bool,
    pub protected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignoffState {
    /// No open request. Also the state after a rejection.
    Unprotected,
    /// Waiting for review; deletes are blocked.
    Requested,
    Approved,
}

impl SignoffFlags {
    pub fn state(&self) -> SignoffState {
        match (self.requested, self.approved) {
            (true, false) => SignoffState::Requested,
            (true, true) => SignoffState::Approved,
            _ => SignoffState::Unprotected,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == SignoffState::Requested
    }
}

/// Outcome chosen by the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Approve { unprotect_data: bool },
    Reject,
}

impl Review {
    pub fn from_request(approved: bool, unprotect_data: bool) -> Self {
        if approved {
            Review::Approve { unprotect_data }
        } else {
            Review::Reject
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignoffError {
    NotAuthorized(&'static str),
    NoPendingRequest,
    AlreadyPending,
}

impl std::fmt::Display for SignoffError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignoffError::NotAuthorized(msg) => f.write_str(msg),
            SignoffError::NoPendingRequest => {
                f.write_str("No pending sign-off request for this project")
            }
            SignoffError::AlreadyPending => {
                f.write_str("A sign-off request is already pending for this project")
            }
        }
    }
}

impl From<SignoffError> for AppError {
    fn from(err: SignoffError) -> Self {
        match err {
            SignoffError::NotAuthorized(_) => AppError::NotAuthorized(err.to_string()),
            SignoffError::NoPendingRequest => AppError::NotFound(err.to_string()),
            SignoffError::AlreadyPending => AppError::Conflict(err.to_string()),
        }
    }
}

/// Flags after `role` requests sign-off on a project currently in `current`.
///
/// Approved and rejected projects may be requested again; that starts a new
/// review cycle.
pub fn plan_request(current: SignoffFlags, role: Role) -> Result<SignoffFlags, SignoffError> {
    if !role.can_edit() {
        return Err(SignoffError::NotAuthorized(
            "Viewers cannot request sign-off",
        ));
    }
    if current.is_pending() {
        return Err(SignoffError::AlreadyPending);
    }
    Ok(SignoffFlags {
        requested: true,
        approved: false,
        protected: true,
    })
}

/// Flags after `role` reviews the pending request on a project in `current`.
pub fn plan_review(
    current: SignoffFlags,
    role: Role,
    review: Review,
) -> Result<SignoffFlags, SignoffError> {
    if !role.is_privileged() {
        return Err(SignoffError::NotAuthorized(
            "Only owners and admins can review sign-off requests",
        ));
    }
    if !current.is_pending() {
        return Err(SignoffError::NoPendingRequest);
    }
    Ok(match review {
        Review::Approve { unprotect_data } => SignoffFlags {
            requested: true,
            approved: true,
            protected: !unprotect_data,
        },
        Review::Reject => SignoffFlags::default(),
    })
}
