//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate store writes and scheduler reconciliation.
//! - Keep the CLI and other front ends decoupled from storage details.

pub mod reminder_service;
