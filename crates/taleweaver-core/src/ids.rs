//! Integer identifiers for persisted records.
//!
//! Every row this engine touches is keyed by a database-assigned `BIGINT`.
//! The newtypes keep a campaign id from being passed where a character id is
//! expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(
    /// Identifies a campaign.
    CampaignId
);
define_id!(
    /// Identifies a persisted session row.
    SessionId
);
define_id!(
    /// Identifies a character.
    CharacterId
);
define_id!(
    /// Identifies an entry in the shared item catalog.
    ItemId
);
define_id!(
    /// Identifies a user account (owned by the authentication subsystem).
    UserId
);
