//! Route handlers, one module per resource

pub mod campaigns;
pub mod dashboard;
pub mod imds;
pub mod info;
pub mod pcf;
pub mod portal;
pub mod suppliers;
pub mod users;

use serde::Deserialize;

/// `?id=` selector shared by the query-addressed resources
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdQuery {
    pub id: Option<i64>,
}

impl IdQuery {
    pub fn require(&self) -> super::error::ApiResult<i64> {
        self.id
            .ok_or_else(|| super::error::ApiError::bad_request("id is required"))
    }
}
