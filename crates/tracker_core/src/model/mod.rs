//! Parcel domain model.
//!
//! # Responsibility
//! - Define the data structures shared by store and service layers.
//! - Own the status state machine.
//!
//! # Invariants
//! - Every persisted parcel is identified by a store-assigned `ParcelNumber`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod parcel;
