//! Classification of raw affiliation text into automatically earned roles.

use super::entities::CREATOR_ROLE;
use std::collections::BTreeSet;

/// Every role name that can ever be granted from affiliation.
///
/// Roles outside this set are manual and survive reconciliation untouched.
pub const ALL_AUTOMATIC_ROLES: &[&str] = &[CREATOR_ROLE];

/// Affiliation markers that earn the creator role, matched case-insensitively
const CREATOR_AFFILIATIONS: &[&str] = &["staff", "faculty"];

/// Roles earned automatically by the given affiliation text.
///
/// The text is free-form (typically a bracketed list such as
/// `"[member, employee, staff]"`). Matching is by substring after lowercasing,
/// so absent, empty or unparseable input simply earns nothing.
pub fn automatic_roles(affiliation: Option<&str>) -> BTreeSet<String> {
    let Some(affiliation) = affiliation else {
        return BTreeSet::new();
    };

    let folded = affiliation.to_lowercase();
    let mut roles = BTreeSet::new();
    if CREATOR_AFFILIATIONS
        .iter()
        .any(|marker| folded.contains(marker))
    {
        roles.insert(CREATOR_ROLE.to_string());
    }
    roles
}

/// Whether `name` belongs to the automatic universe
pub fn is_automatic(name: &str) -> bool {
    ALL_AUTOMATIC_ROLES.contains(&name)
}
