//! Parcel entity and status lifecycle.
//!
//! # Responsibility
//! - Define the canonical parcel record and its insert payload.
//! - Provide the single forward-only status transition function.
//!
//! # Invariants
//! - `number` is assigned by the store and never reused.
//! - Status only moves `registered -> sent -> delivered`.
//! - `created_at` is fixed at creation in RFC 3339 UTC form.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned tracking number.
pub type ParcelNumber = i64;

/// Identifier of the client owning a parcel.
pub type ClientId = i64;

/// Lifecycle state of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted for shipping. Address change and deletion are allowed.
    Registered,
    /// Handed to the carrier.
    Sent,
    /// Terminal state.
    Delivered,
}

impl ParcelStatus {
    /// Returns the persisted text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Parses the persisted text form. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Self::Registered),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Returns the status one step further along the lifecycle.
    ///
    /// `Delivered` maps to itself.
    pub fn next(self) -> Self {
        match self {
            Self::Registered => Self::Sent,
            Self::Sent => Self::Delivered,
            Self::Delivered => Self::Delivered,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Delivered
    }

    /// Whether address change and deletion are permitted in this state.
    pub fn is_mutable(self) -> bool {
        self == Self::Registered
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insert payload for a parcel that has no tracking number yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParcel {
    pub client: ClientId,
    pub status: ParcelStatus,
    pub address: String,
    pub created_at: String,
}

impl NewParcel {
    /// Builds a freshly registered parcel stamped with the current UTC time.
    pub fn registered(client: ClientId, address: impl Into<String>) -> Self {
        Self {
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: now_timestamp(),
        }
    }

    /// Attaches the store-assigned tracking number.
    pub fn into_parcel(self, number: ParcelNumber) -> Parcel {
        Parcel {
            number,
            client: self.client,
            status: self.status,
            address: self.address,
            created_at: self.created_at,
        }
    }
}

/// Canonical parcel record as persisted in the `parcel` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Tracking number, the table's auto-increment primary key.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    /// Free-text delivery address.
    pub address: String,
    /// RFC 3339 UTC timestamp, e.g. `2023-12-15T07:51:36Z`.
    pub created_at: String,
}

/// Current UTC time in the layout stored in `parcel.created_at`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
