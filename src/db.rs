use log::debug;
use serde::Serialize;

use crate::error::PipelineError;

/// One stored track. Created once per successful request, never updated here.
#[derive(Debug, Clone, Serialize)]
pub struct TrackRecord {
    pub file_id: u64,
    pub img_id: u64,
    pub name: String,
    pub artist: String,
    pub language: String,
    pub tags: Vec<String>,
    pub views: u64,
    pub likes: u64,
}

/// Client for the Supabase REST table API.
#[derive(Debug, Clone)]
pub struct TableStore {
    base_url: String,
    api_key: String,
    table: String,
}

impl TableStore {
    pub fn new(base_url: String, api_key: String, table: String) -> Self {
        TableStore {
            base_url,
            api_key,
            table,
        }
    }

    /// Insert one row. No dedup; resubmitting the same video inserts again.
    pub async fn insert(
        &self,
        client: &reqwest::Client,
        record: &TrackRecord,
    ) -> Result<(), PipelineError> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        debug!("Inserting track {:?} into {}", record.name, self.table);

        let resp = client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                "database",
                format!("status {status}: {body}"),
            ));
        }

        Ok(())
    }
}
