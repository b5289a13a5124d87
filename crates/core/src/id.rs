//! Opaque identifiers used across the domain.
//!
//! Identifiers are strings rather than UUIDs: backups produced by older
//! clients carry short random ids (e.g. `"k3j9x2a"`), and those must survive an
//! import unchanged. Freshly generated ids are prefixed UUIDv7 strings.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a member account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// Identifier of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Generate a fresh identifier of the form `<prefix>-<uuidv7>`.
            ///
            /// Prefer passing IDs explicitly in tests for determinism.
            pub fn generate(prefix: &str) -> Self {
                Self(format!("{}-{}", prefix, Uuid::now_v7().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl PartialEq<str> for $t {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_id!(UserId, "UserId");
impl_string_id!(TransactionId, "TransactionId");

impl UserId {
    /// Reserved sender id for system-originated balance adjustments.
    pub const SYSTEM: &'static str = "SYSTEM";

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_string())
    }

    pub fn is_system(&self) -> bool {
        self.0 == Self::SYSTEM
    }
}
