//! Department roster management: the flat, non-tree instance of the same
//! create/rename/delete pattern the form editor uses, minus branching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::Id;

/// Longest accepted department name.
pub const DEPART_NAME_MAX: usize = 16;

/// A department of an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Depart {
    pub id: Id,
    pub name: String,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("部门 {0} 不存在")]
    DepartNotFound(Id),
    #[error("部门名重复")]
    DuplicateName(String),
    #[error("部门名不能为空")]
    EmptyName,
    #[error("部门名最长 16 个字符")]
    NameTooLong,
    #[error("默认部门不可删除")]
    DefaultDepartProtected,
}

/// Client-side working copy of an organization's department list. Every
/// organization has one default department whose bound data is shared
/// organization-wide; it cannot be deleted and its default status never
/// moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartRoster {
    pub children: Vec<Depart>,
    pub default_depart: Id,
}

impl DepartRoster {
    pub fn get(&self, id: Id) -> Option<&Depart> {
        self.children.iter().find(|d| d.id == id)
    }

    pub fn is_default(&self, id: Id) -> bool {
        self.default_depart == id
    }

    fn check_name(&self, name: &str) -> Result<(), RosterError> {
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        if name.chars().count() > DEPART_NAME_MAX {
            return Err(RosterError::NameTooLong);
        }
        if self.children.iter().any(|d| d.name == name) {
            return Err(RosterError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Stage a new department with the next free id.
    pub fn add(&self, name: impl Into<String>) -> Result<DepartRoster, RosterError> {
        let name = name.into();
        self.check_name(&name)?;
        let mut next = self.clone();
        let id = next.children.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        next.children.push(Depart { id, name, created_at: Some(Utc::now()) });
        Ok(next)
    }

    /// Rename a department. Renaming the default department's label is
    /// allowed; only its default status is immutable.
    pub fn rename(&self, id: Id, name: impl Into<String>) -> Result<DepartRoster, RosterError> {
        let name = name.into();
        if self.get(id).is_none() {
            return Err(RosterError::DepartNotFound(id));
        }
        self.check_name(&name)?;
        let mut next = self.clone();
        next.children.iter_mut().find(|d| d.id == id).expect("checked above").name = name;
        Ok(next)
    }

    /// Remove a department. The default department is protected.
    pub fn remove(&self, id: Id) -> Result<DepartRoster, RosterError> {
        if self.is_default(id) {
            return Err(RosterError::DefaultDepartProtected);
        }
        if self.get(id).is_none() {
            return Err(RosterError::DepartNotFound(id));
        }
        let mut next = self.clone();
        next.children.retain(|d| d.id != id);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> DepartRoster {
        DepartRoster {
            children: vec![
                Depart { id: 1, name: "默认部门".into(), created_at: None },
                Depart { id: 2, name: "技术部".into(), created_at: None },
            ],
            default_depart: 1,
        }
    }

    #[test]
    fn default_depart_cannot_be_removed() {
        assert_eq!(roster().remove(1).unwrap_err(), RosterError::DefaultDepartProtected);
        let next = roster().remove(2).unwrap();
        assert_eq!(next.children.len(), 1);
    }

    #[test]
    fn default_depart_can_be_renamed() {
        let next = roster().rename(1, "综合部").unwrap();
        assert_eq!(next.get(1).unwrap().name, "综合部");
        assert!(next.is_default(1));
    }

    #[test]
    fn names_are_unique_and_bounded() {
        assert_eq!(roster().add("技术部").unwrap_err(), RosterError::DuplicateName("技术部".into()));
        assert_eq!(roster().add("").unwrap_err(), RosterError::EmptyName);
        assert_eq!(roster().add("名".repeat(17)).unwrap_err(), RosterError::NameTooLong);
        assert!(roster().add("名".repeat(16)).is_ok());
    }

    #[test]
    fn add_assigns_next_id() {
        let next = roster().add("宣传部").unwrap();
        assert_eq!(next.children.last().unwrap().id, 3);
    }
}
