//! Role reconciliation between a user's stored roles and this login's
//! affiliation-derived roles.

use super::affiliation::ALL_AUTOMATIC_ROLES;
use super::entities::{RoleCatalog, RoleSet};
use super::errors::DomainResult;
use std::collections::BTreeSet;

/// Role set produced for one login together with the applied difference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReconciliation {
    pub roles: RoleSet,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl RoleReconciliation {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Reconcile `current` against the roles earned automatically this login.
///
/// Automatic-capable roles not earned this login are dropped, earned roles the
/// user lacks are materialized from `catalog`, and every other role is kept.
/// A manually granted role whose name is in the automatic universe cannot be
/// told apart from an earned one and is dropped as well.
pub fn reconcile_roles(
    current: &RoleSet,
    automatic: &BTreeSet<String>,
    catalog: &RoleCatalog,
) -> DomainResult<RoleReconciliation> {
    let roles_to_remove: BTreeSet<&str> = ALL_AUTOMATIC_ROLES
        .iter()
        .copied()
        .filter(|name| !automatic.contains(*name))
        .collect();

    let mut roles = RoleSet::new();
    let mut removed = BTreeSet::new();
    for role in current.iter() {
        if roles_to_remove.contains(role.name.as_str()) {
            removed.insert(role.name.clone());
        } else {
            roles.insert(role.clone());
        }
    }

    let existing_names = current.names();
    let mut added = BTreeSet::new();
    for name in automatic.iter().filter(|name| !existing_names.contains(*name)) {
        roles.insert(catalog.materialize(name)?);
        added.insert(name.clone());
    }

    Ok(RoleReconciliation {
        roles,
        added,
        removed,
    })
}
