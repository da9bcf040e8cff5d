//! Adapter between the compaction cache and a request-handling framework.
//!
//! A [`CompactMiddleware`] is built once with the list of groups a page needs. Each
//! [`run`](CompactMiddleware::run) compacts every group and hands back [`CompactedAssets`], the
//! ordered references plus a ready-to-embed HTML rendering. The `service` feature wires this
//! into axum; other frameworks call `run` from their own per-request hook.

use crate::{compact::Compact, error::CompactError, group::Group};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};

/// Output references for one adapter invocation, in group order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactedAssets {
    references: Vec<String>,
}

impl CompactedAssets {
    pub fn new(references: Vec<String>) -> Self {
        CompactedAssets { references }
    }

    pub fn js(&self) -> &[String] {
        &self.references
    }

    /// One `<script>` tag per reference.
    pub fn js_html(&self) -> String {
        self.references
            .iter()
            .map(|reference| format!("<script src=\"{}\"></script>", escape_attr(reference)))
            .collect::<Vec<String>>()
            .join("")
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn into_references(self) -> Vec<String> {
        self.references
    }
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone)]
pub struct CompactMiddleware {
    compact: Arc<Compact>,
    groups: Vec<Group>,
}

impl CompactMiddleware {
    /// Fails with [`CompactError::NoGroups`] when `groups` is empty. An empty group inside the
    /// list is allowed and contributes no references.
    pub fn new(compact: Arc<Compact>, groups: Vec<Group>) -> Result<Self, CompactError> {
        if groups.is_empty() {
            return Err(CompactError::NoGroups);
        }
        Ok(CompactMiddleware { compact, groups })
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn compact(&self) -> &Arc<Compact> {
        &self.compact
    }

    /// Compact every group and collect their references.
    ///
    /// All namespaces of all groups are checked before any work starts. A group repeated within
    /// this call is compacted once, and a reference produced by several groups is listed once,
    /// at its first position. In debug mode a namespace shared by several groups is copied once
    /// per call. Production groups compact concurrently; results keep group order.
    pub async fn run(&self) -> Result<CompactedAssets, CompactError> {
        let mut seen_keys = HashSet::new();
        let unique = self
            .groups
            .iter()
            .filter(|group| seen_keys.insert(group.key()))
            .collect::<Vec<&Group>>();

        let references = self.compact.compact_groups(&unique).await?;
        tracing::debug!(
            "[CompactMiddleware] {} group(s) -> {} reference(s)",
            self.groups.len(),
            references.len()
        );
        Ok(CompactedAssets::new(references))
    }
}
