use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{RecordStore, StoreError};
use crate::geometry::Shape;
use crate::model::{Gender, Group, GroupId, SubjectKey};

/// One row per group. `position` keeps authoring order, which decides
/// hit-test priority, stable across the round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GroupRow {
    id: GroupId,
    subject: SubjectKey,
    gender: Option<Gender>,
    position: usize,
    name: String,
    price: f64,
    shapes: Vec<Shape>,
}

impl GroupRow {
    fn from_group(subject: &SubjectKey, gender: Option<Gender>, position: usize, g: &Group) -> Self {
        GroupRow {
            id: g.id,
            subject: subject.clone(),
            gender,
            position,
            name: g.name.clone(),
            price: g.price,
            shapes: g.shapes.clone(),
        }
    }

    fn into_group(self) -> Group {
        Group {
            id: self.id,
            name: self.name,
            price: self.price,
            shapes: self.shapes,
        }
    }
}

/// PostgREST-style HTTP backend.
pub struct RestStore {
    base: Url,
    api_key: String,
    table: String,
    client: reqwest::blocking::Client,
}

impl RestStore {
    pub fn new(url: &str, api_key: &str, table: &str) -> Result<Self, StoreError> {
        let base = Url::parse(url)
            .map_err(|e| StoreError::Backend(format!("invalid store URL {:?}: {}", url, e)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Backend(format!("store URL {:?} cannot be a base", url)));
        }
        if table.trim().is_empty() {
            return Err(StoreError::Backend("store table name is empty".to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(RestStore {
            base,
            api_key: api_key.to_string(),
            table: table.to_string(),
            client,
        })
    }

    fn partition_url(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
    ) -> Result<Url, StoreError> {
        let mut url = self
            .base
            .join(&format!("rest/v1/{}", self.table))
            .map_err(|e| StoreError::Backend(format!("failed to build store URL: {}", e)))?;

        {
            let mut q = url.query_pairs_mut();
            q.append_pair("subject", &format!("eq.{}", subject.0));
            match gender {
                Some(g) => q.append_pair("gender", &format!("eq.{}", g.as_str())),
                None => q.append_pair("gender", "is.null"),
            };
        }

        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::blocking::RequestBuilder {
        let mut req = self.client.request(method, url);
        if !self.api_key.is_empty() {
            req = req
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key);
        }
        req
    }

    fn check(res: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, StoreError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl RecordStore for RestStore {
    fn load_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
    ) -> Result<Vec<Group>, StoreError> {
        let mut url = self.partition_url(subject, gender)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "position.asc");

        debug!("GET {}", url);
        let res = Self::check(self.request(reqwest::Method::GET, url).send()?)?;
        let mut rows: Vec<GroupRow> = serde_json::from_str(&res.text()?)?;
        rows.sort_by_key(|r| r.position);

        Ok(rows.into_iter().map(GroupRow::into_group).collect())
    }

    /// DELETE then POST. Not atomic: a failed insert leaves the partition
    /// empty on the server, the caller still holds the groups in memory.
    fn replace_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
        groups: &[Group],
    ) -> Result<(), StoreError> {
        let url = self.partition_url(subject, gender)?;
        debug!("DELETE {}", url);
        Self::check(self.request(reqwest::Method::DELETE, url).send()?)?;

        if groups.is_empty() {
            return Ok(());
        }

        let rows: Vec<GroupRow> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| GroupRow::from_group(subject, gender, i, g))
            .collect();

        let url = self
            .base
            .join(&format!("rest/v1/{}", self.table))
            .map_err(|e| StoreError::Backend(format!("failed to build store URL: {}", e)))?;

        debug!("POST {} ({} rows)", url, rows.len());
        Self::check(
            self.request(reqwest::Method::POST, url)
                .header("Prefer", "return=minimal")
                .json(&rows)
                .send()?,
        )?;

        info!("replaced {}/{:?} with {} group(s)", subject, gender, rows.len());
        Ok(())
    }
}
