// ============================
// backend-lib/src/gateway/route_table.rs
// ============================
//! Declarative mapping of external paths and methods onto internal operations.
use axum::http::Method;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Internal call a route is translated into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetUser,
    GetClientParams,
    SetClientParams,
    CreateRoom,
    SearchRooms,
    GetRoom,
    DeleteRoom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{name}`: captures one path segment
    Param(String),
}

/// One external path/method pair and the operation behind it
#[derive(Debug, Clone)]
pub struct RouteEntry {
    prefix: String,
    pattern: String,
    segments: Vec<Segment>,
    method: Method,
    operation: Operation,
}

impl RouteEntry {
    /// `pattern` is relative to `prefix`, e.g. `rooms/{id}`
    pub fn new(prefix: &str, pattern: &str, method: Method, operation: Operation) -> Self {
        let segments = split(pattern)
            .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            prefix: prefix.to_string(),
            pattern: pattern.to_string(),
            segments,
            method,
            operation,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Number of literal segments; more literal means more specific
    fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Captured parameters if `residual` matches the pattern
    fn capture(&self, residual: &[&str]) -> Option<Map<String, Value>> {
        if residual.len() != self.segments.len() {
            return None;
        }

        let mut params = Map::new();
        for (segment, part) in self.segments.iter().zip(residual) {
            match segment {
                Segment::Literal(literal) if literal == part => {},
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), Value::String((*part).to_string()));
                },
            }
        }
        Some(params)
    }
}

/// Result of a successful [`RouteTable::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub operation: Operation,
    /// Path parameters, merged into the decoded input
    pub params: Map<String, Value>,
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Immutable route table, built once at startup
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Distinct prefixes served by this table
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.entries.iter().map(|e| e.prefix.as_str()).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        prefixes
    }

    /// Match a full request path and method.
    ///
    /// Unknown paths are `RouteNotFound`; known paths with an unregistered
    /// method are `MethodNotAllowed`. There is no fallback route.
    pub fn resolve(&self, path: &str, method: &Method) -> Result<RouteMatch, AppError> {
        let mut candidates: Vec<(&RouteEntry, Map<String, Value>)> = Vec::new();

        for entry in &self.entries {
            let Some(residual) = path.strip_prefix(entry.prefix.as_str()) else {
                continue;
            };
            let residual: Vec<&str> = split(residual).collect();
            if let Some(params) = entry.capture(&residual) {
                candidates.push((entry, params));
            }
        }

        // Literal segments win over captures: `rooms/search` is never `rooms/{id}`
        let Some(best) = candidates.iter().map(|(entry, _)| entry.specificity()).max() else {
            return Err(AppError::RouteNotFound(path.to_string()));
        };
        candidates.retain(|(entry, _)| entry.specificity() == best);

        candidates
            .into_iter()
            .find(|(entry, _)| entry.method == *method)
            .map(|(entry, params)| RouteMatch {
                operation: entry.operation,
                params,
            })
            .ok_or_else(|| AppError::MethodNotAllowed {
                method: method.to_string(),
                path: path.to_string(),
            })
    }
}
