//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into parcel lifecycle actions.
//! - Keep the CLI decoupled from storage details.

pub mod parcel_service;
