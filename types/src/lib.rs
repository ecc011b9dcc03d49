//! Core domain types for Verity.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

pub mod codec;
pub mod field;
mod fields;
mod ids;
mod meta;
mod session;

pub use fields::FieldSet;
pub use ids::RequestId;
pub use meta::{Meta, Other};
pub use session::Session;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Entity Kinds
// ============================================================================

/// The validated domain object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Address,
    Person,
    Phone,
    Email,
}

#[derive(Debug, Error)]
#[error("unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

impl EntityKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Address => "address",
            EntityKind::Person => "person",
            EntityKind::Phone => "phone",
            EntityKind::Email => "email",
        }
    }

    /// Status-code and message namespace owned by this entity.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        self.as_str()
    }

    /// Parse an entity kind from string.
    pub fn parse(s: &str) -> Result<Self, UnknownEntityKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "address" => Ok(EntityKind::Address),
            "person" | "name" => Ok(EntityKind::Person),
            "phone" => Ok(EntityKind::Phone),
            "email" => Ok(EntityKind::Email),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }

    #[must_use]
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Address,
            EntityKind::Person,
            EntityKind::Phone,
            EntityKind::Email,
        ]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Intent, Street Mode, Status Kind
// ============================================================================

/// What the user is currently doing with a form region.
///
/// Modal-driven corrections only run while reviewing; plain editing only
/// triggers silent validation and automatic fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Edit,
    Review,
}

impl Intent {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Edit => "edit",
            Intent::Review => "review",
        }
    }
}

/// How the street is entered in an address region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreetMode {
    /// One field holding street name and building number together.
    Full,
    /// Separate street name and building number fields.
    #[default]
    Split,
}

/// Classification of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Error,
    Success,
}

/// Why the user dismissed a correction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclineReason {
    /// User wants to go back and edit the fields.
    Edit,
    /// User closed the prompt without a choice.
    Close,
}

impl DeclineReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclineReason::Edit => "edit",
            DeclineReason::Close => "close",
        }
    }
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
