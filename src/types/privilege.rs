// Privilege - Fixed table of privilege types a contract can register for
// Principle: Closed set, built once at startup, shared by handle

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One kind of system callback or restricted capability.
///
/// `tag` is the stable one-byte discriminator used in store keys, `name` the
/// canonical lowercase form used on the wire and in genesis files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrivilegeType {
    pub tag: u8,
    pub name: &'static str,
    pub singleton: bool,
}

impl fmt::Display for PrivilegeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const BEGIN_BLOCKER: PrivilegeType = PrivilegeType {
    tag: 1,
    name: "begin_blocker",
    singleton: false,
};

pub const END_BLOCKER: PrivilegeType = PrivilegeType {
    tag: 2,
    name: "end_blocker",
    singleton: false,
};

/// Only one contract may compute the validator set
pub const VALIDATOR_SET_UPDATER: PrivilegeType = PrivilegeType {
    tag: 3,
    name: "validator_set_updater",
    singleton: true,
};

pub const GOV_PROPOSAL_EXECUTOR: PrivilegeType = PrivilegeType {
    tag: 4,
    name: "gov_proposal_executor",
    singleton: false,
};

pub const TOKEN_MINTER: PrivilegeType = PrivilegeType {
    tag: 5,
    name: "token_minter",
    singleton: false,
};

/// The privilege types every KratOs node ships with
pub const STANDARD_PRIVILEGES: [PrivilegeType; 5] = [
    BEGIN_BLOCKER,
    END_BLOCKER,
    VALIDATOR_SET_UPDATER,
    GOV_PROPOSAL_EXECUTOR,
    TOKEN_MINTER,
];

/// Immutable lookup table of the privilege types known to this node
#[derive(Debug, Clone)]
pub struct PrivilegeTypeTable {
    entries: Vec<PrivilegeType>,
}

impl PrivilegeTypeTable {
    /// Build a table, rejecting duplicate tags or names
    pub fn new(entries: Vec<PrivilegeType>) -> Result<Self, PrivilegeTableError> {
        let mut tags = HashSet::new();
        let mut names = HashSet::new();
        for entry in &entries {
            if entry.tag == 0 {
                return Err(PrivilegeTableError::ReservedTag(entry.name));
            }
            if !tags.insert(entry.tag) {
                return Err(PrivilegeTableError::DuplicateTag(entry.tag));
            }
            if !names.insert(entry.name) {
                return Err(PrivilegeTableError::DuplicateName(entry.name));
            }
        }
        let mut entries = entries;
        entries.sort_by_key(|p| p.tag);
        Ok(Self { entries })
    }

    pub fn standard() -> Self {
        Self {
            entries: STANDARD_PRIVILEGES.to_vec(),
        }
    }

    pub fn by_name(&self, name: &str) -> Option<PrivilegeType> {
        self.entries.iter().copied().find(|p| p.name == name)
    }

    pub fn by_tag(&self, tag: u8) -> Option<PrivilegeType> {
        self.entries.iter().copied().find(|p| p.tag == tag)
    }

    /// Entries in ascending tag order
    pub fn iter(&self) -> impl Iterator<Item = PrivilegeType> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PrivilegeTypeTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrivilegeTableError {
    #[error("duplicate privilege type tag: {0}")]
    DuplicateTag(u8),

    #[error("duplicate privilege type name: {0}")]
    DuplicateName(&'static str),

    #[error("privilege type {0} uses reserved tag 0")]
    ReservedTag(&'static str),
}

/// One `(type, position)` slot held by a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeSlot {
    pub privilege_type: String,
    pub position: u8,
}

/// Contract-side mirror of the registry, stored in the contract metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPrivilegeDetails {
    #[serde(default)]
    pub privileges: Vec<PrivilegeSlot>,
}

impl ContractPrivilegeDetails {
    pub fn has_privilege(&self, privilege: PrivilegeType) -> bool {
        self.privileges.iter().any(|p| p.privilege_type == privilege.name)
    }

    pub fn add_privilege(&mut self, privilege: PrivilegeType, position: u8) {
        self.privileges.push(PrivilegeSlot {
            privilege_type: privilege.name.to_string(),
            position,
        });
    }

    /// Drop every slot of `privilege`, returning the positions removed
    pub fn remove_privilege(&mut self, privilege: PrivilegeType) -> Vec<u8> {
        let mut removed = Vec::new();
        self.privileges.retain(|p| {
            if p.privilege_type == privilege.name {
                removed.push(p.position);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.privileges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_lookup() {
        let table = PrivilegeTypeTable::standard();
        assert_eq!(table.len(), 5);
        assert_eq!(table.by_name("begin_blocker"), Some(BEGIN_BLOCKER));
        assert_eq!(table.by_tag(3), Some(VALIDATOR_SET_UPDATER));
        assert!(table.by_name("BEGIN_BLOCKER").is_none());
        assert!(table.by_tag(42).is_none());
        assert!(VALIDATOR_SET_UPDATER.singleton);
        assert!(!BEGIN_BLOCKER.singleton);
    }

    #[test]
    fn test_table_rejects_collisions() {
        let dup_tag = PrivilegeType { tag: 1, name: "other", singleton: false };
        assert_eq!(
            PrivilegeTypeTable::new(vec![BEGIN_BLOCKER, dup_tag]).unwrap_err(),
            PrivilegeTableError::DuplicateTag(1)
        );

        let dup_name = PrivilegeType { tag: 9, name: "end_blocker", singleton: false };
        assert_eq!(
            PrivilegeTypeTable::new(vec![END_BLOCKER, dup_name]).unwrap_err(),
            PrivilegeTableError::DuplicateName("end_blocker")
        );

        let zero = PrivilegeType { tag: 0, name: "zero", singleton: false };
        assert!(PrivilegeTypeTable::new(vec![zero]).is_err());
    }

    #[test]
    fn test_custom_table_is_sorted_by_tag() {
        let table = PrivilegeTypeTable::new(vec![TOKEN_MINTER, BEGIN_BLOCKER]).unwrap();
        let tags: Vec<u8> = table.iter().map(|p| p.tag).collect();
        assert_eq!(tags, vec![1, 5]);
    }

    #[test]
    fn test_details_add_remove() {
        let mut details = ContractPrivilegeDetails::default();
        details.add_privilege(BEGIN_BLOCKER, 1);
        details.add_privilege(TOKEN_MINTER, 3);
        assert!(details.has_privilege(BEGIN_BLOCKER));
        assert!(!details.has_privilege(END_BLOCKER));

        assert_eq!(details.remove_privilege(BEGIN_BLOCKER), vec![1]);
        assert!(!details.has_privilege(BEGIN_BLOCKER));
        assert!(details.remove_privilege(BEGIN_BLOCKER).is_empty());
        assert_eq!(details.privileges.len(), 1);
    }
}
