//! Outline numbering ("1", "1.2", "1.2.3") to display nesting

use regex::Regex;
use std::sync::OnceLock;

use schedview_core::hierarchy_level;

/// Hierarchy stored when the sheet has no usable outline number
pub const DEFAULT_HIERARCHY: &str = "1";

fn well_formed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("valid regex"))
}

/// Normalise an outline cell and derive its level
pub fn resolve(cell: Option<&str>) -> (String, u8) {
    let hierarchy = cell
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_HIERARCHY)
        .to_string();
    let level = hierarchy_level(&hierarchy);
    (hierarchy, level)
}

/// Digits separated by single dots, nothing else
pub fn is_well_formed(hierarchy: &str) -> bool {
    well_formed().is_match(hierarchy)
}
