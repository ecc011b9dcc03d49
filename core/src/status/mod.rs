//! Status dependency graph.
//!
//! Every status code belongs to one namespace, is either an error or a
//! success, names the fields it is about, and may refine one or more parent
//! statuses. A parent must be defined before its children, which keeps the
//! graph acyclic.
//!
//! A status is *present* when its code was reported and a message exists for
//! `namespace.code`. Display works on present statuses only: a present parent
//! is hidden by any present child, roots are the visible statuses without a
//! present parent, leaves are the rest.

mod catalog;
pub mod codes;

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use verity_types::{FieldSet, StatusKind};

use crate::messages::{MessageLookup, message_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDefinition {
    pub id: StatusId,
    pub code: String,
    pub namespace: String,
    pub kind: StatusKind,
    pub relevant_fields: Vec<String>,
    pub parents: Vec<StatusId>,
}

impl StatusDefinition {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }

    #[must_use]
    pub fn concerns(&self, field: &str) -> bool {
        self.relevant_fields.iter().any(|f| f == field)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusGraphError {
    #[error("status {namespace}.{code} defined twice")]
    DuplicateCode { namespace: String, code: String },
    #[error("status {namespace}.{code} refers to undefined parent {parent}")]
    UnknownParent {
        namespace: String,
        code: String,
        parent: String,
    },
}

/// Error messages selected for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessages {
    pub has_errors: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct StatusGraph {
    definitions: Vec<StatusDefinition>,
    by_code: HashMap<(String, String), StatusId>,
}

impl StatusGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with every status the service reports for the four entity kinds.
    pub fn standard() -> Result<Self, StatusGraphError> {
        let mut graph = Self::new();
        catalog::register(&mut graph)?;
        Ok(graph)
    }

    /// Define a status. Parents are codes of the same namespace.
    pub fn define(
        &mut self,
        namespace: &str,
        kind: StatusKind,
        code: &str,
        relevant_fields: &[&str],
        parent_codes: &[&str],
    ) -> Result<StatusId, StatusGraphError> {
        let key = (namespace.to_string(), code.to_string());
        if self.by_code.contains_key(&key) {
            return Err(StatusGraphError::DuplicateCode {
                namespace: key.0,
                code: key.1,
            });
        }

        let mut parents = Vec::with_capacity(parent_codes.len());
        for parent in parent_codes {
            let id = self.lookup(namespace, parent).ok_or_else(|| {
                StatusGraphError::UnknownParent {
                    namespace: namespace.to_string(),
                    code: code.to_string(),
                    parent: (*parent).to_string(),
                }
            })?;
            parents.push(id);
        }

        let id = StatusId(self.definitions.len());
        self.definitions.push(StatusDefinition {
            id,
            code: code.to_string(),
            namespace: namespace.to_string(),
            kind,
            relevant_fields: relevant_fields.iter().map(ToString::to_string).collect(),
            parents,
        });
        self.by_code.insert(key, id);
        Ok(id)
    }

    #[must_use]
    pub fn lookup(&self, namespace: &str, code: &str) -> Option<StatusId> {
        self.by_code
            .get(&(namespace.to_string(), code.to_string()))
            .copied()
    }

    #[must_use]
    pub fn definition(&self, id: StatusId) -> Option<&StatusDefinition> {
        self.definitions.get(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn is_present(
        &self,
        definition: &StatusDefinition,
        codes: &[String],
        namespace: &str,
        messages: &dyn MessageLookup,
    ) -> bool {
        codes.iter().any(|c| *c == definition.code)
            && messages
                .get(&message_key(namespace, &definition.code))
                .is_some()
    }

    /// Present statuses, optionally restricted to `field`, minus every status
    /// that is the parent of another present one.
    pub fn get_all(
        &self,
        codes: &[String],
        namespace: &str,
        field: Option<&str>,
        messages: &dyn MessageLookup,
    ) -> Vec<StatusId> {
        let present = self.present(codes, namespace, field, messages);
        let parents: HashSet<StatusId> = present
            .iter()
            .filter_map(|id| self.definition(*id))
            .flat_map(|def| def.parents.iter().copied())
            .collect();
        present
            .into_iter()
            .filter(|id| !parents.contains(id))
            .collect()
    }

    /// Visible statuses without a present parent.
    pub fn get_roots(
        &self,
        codes: &[String],
        namespace: &str,
        field: Option<&str>,
        messages: &dyn MessageLookup,
    ) -> Vec<StatusId> {
        let present: HashSet<StatusId> = self
            .present(codes, namespace, field, messages)
            .into_iter()
            .collect();
        self.get_all(codes, namespace, field, messages)
            .into_iter()
            .filter(|id| {
                self.definition(*id)
                    .is_none_or(|def| !def.parents.iter().any(|p| present.contains(p)))
            })
            .collect()
    }

    pub fn get_leaves(
        &self,
        codes: &[String],
        namespace: &str,
        field: Option<&str>,
        messages: &dyn MessageLookup,
    ) -> Vec<StatusId> {
        let roots: HashSet<StatusId> = self
            .get_roots(codes, namespace, field, messages)
            .into_iter()
            .collect();
        self.get_all(codes, namespace, field, messages)
            .into_iter()
            .filter(|id| !roots.contains(id))
            .collect()
    }

    pub fn root_error_messages(
        &self,
        codes: &[String],
        namespace: &str,
        field: Option<&str>,
        messages: &dyn MessageLookup,
    ) -> StatusMessages {
        let roots = self.get_roots(codes, namespace, field, messages);
        self.error_messages(&roots, namespace, messages)
    }

    pub fn leaf_error_messages(
        &self,
        codes: &[String],
        namespace: &str,
        field: Option<&str>,
        messages: &dyn MessageLookup,
    ) -> StatusMessages {
        let leaves = self.get_leaves(codes, namespace, field, messages);
        self.error_messages(&leaves, namespace, messages)
    }

    /// Success codes of `namespace` that concern at least one field of `data`.
    #[must_use]
    pub fn synthesize_success_codes(&self, data: &FieldSet, namespace: &str) -> Vec<String> {
        self.definitions
            .iter()
            .filter(|def| def.namespace == namespace && def.kind == StatusKind::Success)
            .filter(|def| data.intersects(&def.relevant_fields))
            .map(|def| def.code.clone())
            .collect()
    }

    fn present(
        &self,
        codes: &[String],
        namespace: &str,
        field: Option<&str>,
        messages: &dyn MessageLookup,
    ) -> Vec<StatusId> {
        self.definitions
            .iter()
            .filter(|def| def.namespace == namespace)
            .filter(|def| field.is_none_or(|f| def.concerns(f)))
            .filter(|def| self.is_present(def, codes, namespace, messages))
            .map(|def| def.id)
            .collect()
    }

    fn error_messages(
        &self,
        ids: &[StatusId],
        namespace: &str,
        messages: &dyn MessageLookup,
    ) -> StatusMessages {
        let errors: Vec<String> = ids
            .iter()
            .filter_map(|id| self.definition(*id))
            .filter(|def| def.is_error())
            .filter_map(|def| messages.get(&message_key(namespace, &def.code)))
            .collect();
        StatusMessages {
            has_errors: !errors.is_empty(),
            errors,
        }
    }
}
