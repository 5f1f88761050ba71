//! Duplicate route detection.
//!
//! Two rows conflict when their paths have the same shape and their verbs
//! overlap (`all` overlaps every verb). Shape is the path with parameter and
//! wildcard names erased, so `/u/:id` and `/u/:name` collide; literal
//! segments still compare byte for byte. Two spellings of one shape cannot
//! share a router slot, so they conflict whatever their verbs. Rows are
//! compared in a fixed order so the reported pair does not depend on the
//! order files were discovered in.

use std::cmp::Ordering;

use crate::error::SetupError;
use crate::routing::definition::RouteDefinition;

pub struct ConflictValidator;

impl ConflictValidator {
    /// Fail on the first conflicting pair, in (shape, verb, path, file,
    /// handler) order.
    pub fn validate(routes: &[RouteDefinition]) -> Result<(), SetupError> {
        let mut ordered: Vec<(String, &RouteDefinition)> = routes
            .iter()
            .map(|route| (path_shape(route.route_path()), route))
            .collect();
        ordered.sort_by(|a, b| compare(a, b));

        // Rows sharing a shape are contiguous; `all` sorts first within a
        // shape, and a shape spelled two ways has two differing neighbours,
        // so comparing neighbours is enough.
        for pair in ordered.windows(2) {
            let ((first_shape, first), (second_shape, second)) = (&pair[0], &pair[1]);
            if first_shape != second_shape {
                continue;
            }
            if first.route_path() != second.route_path() || first.verb().overlaps(&second.verb()) {
                return Err(conflict(first, second));
            }
        }

        tracing::debug!(routes = routes.len(), "No route conflicts");
        Ok(())
    }
}

/// `path` with every `:name` segment reduced to `:` and every `*name`
/// segment reduced to `*`.
pub fn path_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.chars().next() {
            Some(':') => ":",
            Some('*') => "*",
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn compare(
    (a_shape, a): &(String, &RouteDefinition),
    (b_shape, b): &(String, &RouteDefinition),
) -> Ordering {
    a_shape
        .as_bytes()
        .cmp(b_shape.as_bytes())
        .then_with(|| a.verb().cmp(&b.verb()))
        .then_with(|| a.route_path().as_bytes().cmp(b.route_path().as_bytes()))
        .then_with(|| a.source_file().cmp(b.source_file()))
        .then_with(|| a.handler_name().cmp(b.handler_name()))
}

fn conflict(first: &RouteDefinition, second: &RouteDefinition) -> SetupError {
    let verb = if first.verb() == second.verb() {
        first.verb().to_string()
    } else {
        format!("{}/{}", first.verb(), second.verb())
    };
    let path = if first.route_path() == second.route_path() {
        first.route_path().to_string()
    } else {
        format!("{} and {}", first.route_path(), second.route_path())
    };
    SetupError::RouteConflict {
        path,
        verb,
        first: first.source_file().to_path_buf(),
        first_handler: first.handler_name().to_string(),
        second: second.source_file().to_path_buf(),
        second_handler: second.handler_name().to_string(),
    }
}
