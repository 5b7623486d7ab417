//! Wire models for list/detail payloads consumed by the console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::form::Id;
use crate::org::{Depart, DepartRoster};

/// One row of an organization's form catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: Id,
    pub name: String,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub create_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_at: Option<DateTime<Utc>>,
}

/// Organization detail: name plus its department list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    pub id: Id,
    pub name: String,
    pub default_depart: Id,
    #[serde(default)]
    pub children: Vec<Depart>,
}

impl Org {
    /// Editable working copy of the department list.
    pub fn roster(&self) -> DepartRoster {
        DepartRoster { children: self.children.clone(), default_depart: self.default_depart }
    }
}
