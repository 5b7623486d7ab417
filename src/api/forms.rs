//! Form endpoints: catalog listing, detail fetch, creation, deletion,
//! and the partial-update call used for every edit.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::client::RopClient;
use super::models::FormSummary;
use crate::form::{Form, Id, QuestionGroup};

/// Partial update of a form: only the changed top-level fields are
/// serialized. The backend expects the group tree as a JSON *string*
/// inside the JSON body, not as a nested array.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<String>,
    /// `Some(None)` clears the bound (serialized as null).
    #[serde(skip_serializing_if = "Option::is_none")]
    start_at: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_at: Option<Option<i64>>,
}

impl FormPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }

    pub fn desc(desc: impl Into<String>) -> Self {
        Self { desc: Some(desc.into()), ..Self::default() }
    }

    pub fn children(groups: &[QuestionGroup]) -> Result<Self> {
        Ok(Self { children: Some(serde_json::to_string(groups)?), ..Self::default() })
    }

    /// Replace both open-window bounds; a `None` bound means unbounded.
    pub fn open_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start_at: Some(start.map(|t| t.timestamp())),
            end_at: Some(end.map(|t| t.timestamp())),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct EditFormRequest<'a> {
    id: Id,
    #[serde(flatten)]
    patch: &'a FormPatch,
}

#[derive(Deserialize)]
struct CreatedForm {
    id: Id,
}

impl RopClient {
    /// List the organization's forms.
    pub async fn list_forms(&self, org: Id) -> Result<Vec<FormSummary>> {
        self.get_json("/form/list", &[("org", org.to_string())]).await
    }

    /// Fetch one form with its whole group/question tree.
    pub async fn get_form(&self, id: Id) -> Result<Form> {
        self.get_json("/form/detail", &[("id", id.to_string())]).await
    }

    /// Persist a partial update of a form.
    pub async fn edit_form(&self, id: Id, patch: &FormPatch) -> Result<()> {
        self.post("/form/edit", &EditFormRequest { id, patch }).await
    }

    /// Create an empty form and return its id.
    pub async fn create_form(&self, org: Id, name: &str) -> Result<Id> {
        let created: CreatedForm =
            self.post_json("/form/create", &serde_json::json!({ "org": org, "name": name })).await?;
        Ok(created.id)
    }

    /// Delete a form. The backend cascades to its candidates and
    /// interviews; the console only issues the call.
    pub async fn delete_form(&self, id: Id) -> Result<()> {
        self.post("/form/delete", &serde_json::json!({ "id": id })).await
    }
}
