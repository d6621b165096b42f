//! Error types for the Phonebook directory engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Form field name used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// User-correctable reasons an operation was refused.
///
/// The `Display` text of each variant is the message shown next to the
/// offending form field.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("This field is required.")]
    FieldRequired,

    #[error("This name already exists.")]
    NameTaken,

    #[error("This username is not allowed, please choose another.")]
    UsernameBlacklisted,

    #[error("This field cannot be restricted to private visibility.")]
    PrivateNotAllowed,

    #[error("You are not allowed to vouch for other profiles.")]
    VoucherCannotVouch,

    #[error("This profile has reached the maximum number of vouches.")]
    VouchLimitReached,

    #[error("You have already vouched for this profile.")]
    AlreadyVouched,

    #[error("You cannot vouch for yourself.")]
    SelfVouch,

    #[error("The group must have at least one curator.")]
    EmptyCuratorSet,

    #[error("You need to be a curator of this group in order to edit its curators.")]
    NotCuratorForCurators,

    #[error("You need to be the curator of this group before inviting someone to join.")]
    NotCuratorForInvites,

    #[error("You need to be the curator of this group in order to edit the invitation email.")]
    NotCuratorForInviteEmail,

    #[error("You need to be the administrator of this group in order to edit this section.")]
    NotAdministrator,

    #[error("Group must be of type Reviewed or Closed for Access Groups.")]
    OpenAccessGroup,

    #[error("You do not have the permissions to provision an access group.")]
    ProvisioningDenied,

    #[error("The maximum expiration date for a group cannot exceed two years.")]
    InvalidationTooLong,

    #[error("Curators cannot be removed from their group.")]
    CannotRemoveCurator,

    #[error("Curators cannot leave their group.")]
    CuratorCannotLeave,

    #[error("Members cannot leave this group.")]
    GroupNotLeavable,

    #[error("This group is not accepting new members.")]
    GroupClosed,

    #[error("There is no pending invitation for this group.")]
    NoPendingInvite,

    #[error("There is no pending membership request for this profile.")]
    NoPendingRequest,

    #[error("You cannot delete the identity you are logged in with.")]
    CannotDetachPrimaryIdentity,

    #[error("This record was changed by someone else. Please try again.")]
    ConcurrentModification,
}

/// The shared error type of the directory engine.
///
/// `Validation` and `PermissionDenied` are expected outcomes that callers
/// surface to users; `Conflict` is raised by storage on uniqueness races and
/// is translated into `Validation` by the application layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    /// User-correctable rejection tied to a form field (or `__all__`)
    #[error("{field}: {rejection}")]
    Validation {
        field: String,
        rejection: Rejection,
    },

    /// Actor lacks the role required for the attempted transition
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Uniqueness constraint or optimistic-write race
    #[error("Conflict: {entity_type} '{key}' already exists or was modified concurrently")]
    Conflict {
        entity_type: &'static str,
        key: String,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DirectoryError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error for the given form field
    pub fn validation(field: impl Into<String>, rejection: Rejection) -> Self {
        Self::Validation {
            field: field.into(),
            rejection,
        }
    }

    /// Creates a Validation error that is not tied to a single field
    pub fn non_field(rejection: Rejection) -> Self {
        Self::validation(NON_FIELD_ERRORS, rejection)
    }

    /// Creates a PermissionDenied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Creates a Conflict error
    pub fn conflict(entity_type: &'static str, key: impl Into<String>) -> Self {
        Self::Conflict {
            entity_type,
            key: key.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the rejection reason if this is a validation error.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Validation { rejection, .. } => Some(*rejection),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for DirectoryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DirectoryError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, DirectoryError>`.
pub type Result<T> = std::result::Result<T, DirectoryError>;
