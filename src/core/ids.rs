//! Strongly typed identifiers.
//!
//! Sessions, activities and users are keyed by random UUIDs. Each kind gets
//! its own newtype so a session id can never be passed where a user id is
//! expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Borrow the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = TrackerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| TrackerError::validation($label, format!("'{s}' is not a valid id: {e}")))
            }
        }
    };
}

define_id!(
    /// Identifier of a study session.
    SessionId,
    "session_id"
);
define_id!(
    /// Identifier of a recorded activity sample.
    ActivityId,
    "activity_id"
);
define_id!(
    /// Identifier of a session owner.
    UserId,
    "user_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_parse_round_trip() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<SessionId>().unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Validation {
                field: "session_id",
                ..
            }
        ));
    }
}
