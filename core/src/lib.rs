//! Core domain logic for Verity.
//!
//! Everything here is independent of transport and of the form binding:
//! content signatures, the status dependency graph, message lookup, street
//! composition rules, and the generic rule/action fixed-point engine.

pub mod messages;
pub mod rules;
pub mod signature;
pub mod status;
pub mod street;

pub use messages::{MessageCatalog, MessageLookup, message_key};
pub use rules::{
    Action, ActionError, ActionFut, BoxError, EngineError, RegistrationError, Rule,
    RuleActionEngine, RunReport, Tier,
};
pub use status::{StatusDefinition, StatusGraph, StatusGraphError, StatusId, StatusMessages};
pub use street::StreetOrder;
