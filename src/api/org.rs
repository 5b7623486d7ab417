//! Organization and department endpoints.

use anyhow::Result;
use serde_json::json;

use super::client::RopClient;
use super::models::Org;
use crate::form::Id;

impl RopClient {
    /// Fetch an organization with its department list.
    pub async fn get_org(&self, id: Id) -> Result<Org> {
        self.get_json("/org/detail", &[("id", id.to_string())]).await
    }

    pub async fn add_depart(&self, org: Id, name: &str) -> Result<()> {
        self.post("/org/depart/add", &json!({ "org": org, "name": name })).await
    }

    pub async fn rename_depart(&self, org: Id, depart: Id, name: &str) -> Result<()> {
        self.post("/org/depart/rename", &json!({ "org": org, "id": depart, "name": name })).await
    }

    pub async fn delete_depart(&self, org: Id, depart: Id) -> Result<()> {
        self.post("/org/depart/delete", &json!({ "org": org, "id": depart })).await
    }
}
