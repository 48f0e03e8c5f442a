//! Predecessor resolution
//!
//! Runs once all tasks exist. References to unknown ids are dropped; cycles
//! are kept as written.

use schedview_core::{Task, TaskId};
use std::collections::HashMap;
use tracing::debug;

/// Suffix marking a finish-to-start link in Project exports ("3TI")
const LINK_SUFFIX: &str = "TI";

/// Split raw predecessor text into referenced ids.
///
/// `"3TI; 5TI,7"` becomes `["3", "5", "7"]`. Empty tokens and the `-`
/// placeholder written by table exports are discarded.
pub fn parse_dependency_tokens(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(|token| {
            let token = token.trim();
            token.strip_suffix(LINK_SUFFIX).unwrap_or(token).trim()
        })
        .filter(|token| !token.is_empty() && *token != "-")
        .map(str::to_string)
        .collect()
}

/// Fill `dependencies` and `dependents` for every task.
///
/// With duplicated ids the last task carrying the id receives the link.
pub fn link_dependencies(tasks: &mut [Task]) {
    let index: HashMap<TaskId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    let mut links = 0usize;
    for i in 0..tasks.len() {
        if tasks[i].depends_on_raw.trim().is_empty() {
            continue;
        }
        for token in parse_dependency_tokens(&tasks[i].depends_on_raw) {
            let Some(&target) = index.get(&token) else {
                debug!(task = %tasks[i].id, reference = %token, "unresolved dependency dropped");
                continue;
            };
            let from = tasks[i].id.clone();
            tasks[i].dependencies.push(token);
            tasks[target].dependents.push(from);
            links += 1;
        }
    }

    debug!(links, "dependency graph built");
}
