use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Role granted to every account from creation onward
pub const BASELINE_ROLE: &str = "User";

/// Role earned automatically from a staff or faculty affiliation
pub const CREATOR_ROLE: &str = "Creator";

/// A named role carrying a set of access-right tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub access_rights: BTreeSet<String>,
}

impl Role {
    /// Create a role without access rights
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        Self::validate_role_name(&name)?;

        Ok(Self {
            name,
            access_rights: BTreeSet::new(),
        })
    }

    pub fn with_access_rights<I, S>(mut self, rights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_rights
            .extend(rights.into_iter().map(Into::into));
        self
    }

    /// Validate role name according to business rules
    pub fn validate_role_name(name: &str) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("role.name", "Role name cannot be empty"));
        }

        if name.len() > 255 {
            return Err(DomainError::invalid_input(
                "role.name",
                "Role name cannot exceed 255 characters",
            ));
        }

        Ok(())
    }
}

/// Roles held by a user, keyed by role name so a name can occur at most once.
///
/// Deserializing a list that repeats a name keeps the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet {
    roles: BTreeMap<String, Role>,
}

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a role, replacing any role with the same name
    pub fn insert(&mut self, role: Role) -> Option<Role> {
        self.roles.insert(role.name.clone(), role)
    }

    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Role names in lexical order
    pub fn names(&self) -> BTreeSet<String> {
        self.roles.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// Union of the access rights of every held role
    pub fn access_rights(&self) -> BTreeSet<String> {
        self.roles
            .values()
            .flat_map(|role| role.access_rights.iter().cloned())
            .collect()
    }
}

impl From<Vec<Role>> for RoleSet {
    fn from(roles: Vec<Role>) -> Self {
        roles.into_iter().collect()
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.roles.into_values().collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl IntoIterator for RoleSet {
    type Item = Role;
    type IntoIter = std::collections::btree_map::IntoValues<String, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.into_values()
    }
}

/// Known role definitions used to materialize roles granted by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalog {
    definitions: BTreeMap<String, BTreeSet<String>>,
}

impl RoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role<I, S>(mut self, name: impl Into<String>, access_rights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definitions.insert(
            name.into(),
            access_rights.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Build the role named `name`; unknown names carry no access rights
    pub fn materialize(&self, name: &str) -> DomainResult<Role> {
        let role = Role::new(name)?;
        Ok(match self.definitions.get(name) {
            Some(rights) => role.with_access_rights(rights.iter().cloned()),
            None => role,
        })
    }
}
