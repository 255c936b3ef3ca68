use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::{BuyerRecord, MatchRecord, MatchUpdate, NewMatch, PropertyRecord};
use crate::services::schema;
use crate::services::store::{MatchStore, StoreError};

/// Hard per-request record limit on the store's write endpoints.
pub const MAX_BATCH_RECORDS: usize = 10;

const PAGE_SIZE: usize = 100;

/// Table names within the base
#[derive(Debug, Clone)]
pub struct AirtableTables {
    pub buyers: String,
    pub properties: String,
    pub matches: String,
}

/// Airtable REST client
///
/// Handles all communication with the CRM's backing base:
/// - Paginated listing of buyer, property and match rows
/// - Batched create/update/delete of match rows
pub struct AirtableClient {
    base_url: String,
    api_key: String,
    base_id: String,
    client: Client,
    tables: AirtableTables,
}

impl AirtableClient {
    pub fn new(base_url: String, api_key: String, base_id: String, tables: AirtableTables) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            base_id,
            client,
            tables,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.base_id,
            urlencoding::encode(table)
        )
    }

    fn check_status(table: &str, status: StatusCode) -> Result<(), StoreError> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::Unauthorized);
        }
        if !status.is_success() {
            return Err(StoreError::ApiError(format!(
                "{} request failed: {}",
                table, status
            )));
        }
        Ok(())
    }

    /// List every row in a table, following the offset cursor until the
    /// store stops returning one.
    async fn list_records(&self, table: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut url = format!("{}?pageSize={}", self.table_url(table), PAGE_SIZE);
            if let Some(ref cursor) = offset {
                url.push_str("&offset=");
                url.push_str(&urlencoding::encode(cursor));
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;

            Self::check_status(table, response.status())?;

            let body: Value = response.json().await?;
            let page = body
                .get("records")
                .and_then(|r| r.as_array())
                .ok_or_else(|| StoreError::InvalidResponse("missing records array".into()))?;

            for record in page {
                let id = record
                    .get("id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| StoreError::InvalidResponse("record without id".into()))?
                    .to_string();
                let fields = record.get("fields").cloned().unwrap_or_else(|| json!({}));
                records.push((id, fields));
            }

            offset = body.get("offset").and_then(|v| v.as_str()).map(str::to_string);
            if offset.is_none() {
                break;
            }
        }

        tracing::debug!("Listed {} rows from {}", records.len(), table);

        Ok(records)
    }

    fn ensure_batch_size(len: usize) -> Result<(), StoreError> {
        if len > MAX_BATCH_RECORDS {
            return Err(StoreError::InvalidInput(format!(
                "batch of {} exceeds the {}-record limit",
                len, MAX_BATCH_RECORDS
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MatchStore for AirtableClient {
    async fn fetch_buyers(&self) -> Result<Vec<BuyerRecord>, StoreError> {
        let rows = self.list_records(&self.tables.buyers).await?;
        Ok(rows
            .iter()
            .map(|(id, fields)| schema::buyer_from_record(id, fields))
            .collect())
    }

    async fn fetch_properties(&self) -> Result<Vec<PropertyRecord>, StoreError> {
        let rows = self.list_records(&self.tables.properties).await?;
        Ok(rows
            .iter()
            .map(|(id, fields)| schema::property_from_record(id, fields))
            .collect())
    }

    async fn fetch_matches(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let rows = self.list_records(&self.tables.matches).await?;
        // Rows without both linked ids can't participate in dedup; skip them
        Ok(rows
            .iter()
            .filter_map(|(id, fields)| schema::match_from_record(id, fields))
            .collect())
    }

    async fn create_matches(&self, batch: &[NewMatch]) -> Result<usize, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }
        Self::ensure_batch_size(batch.len())?;

        let payload = json!({
            "records": batch
                .iter()
                .map(|m| json!({"fields": schema::new_match_fields(m)}))
                .collect::<Vec<_>>(),
            "typecast": true,
        });

        let response = self
            .client
            .post(self.table_url(&self.tables.matches))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        Self::check_status(&self.tables.matches, response.status())?;

        let body: Value = response.json().await?;
        let created = body
            .get("records")
            .and_then(|r| r.as_array())
            .map(|r| r.len())
            .ok_or_else(|| StoreError::InvalidResponse("missing records array".into()))?;

        Ok(created)
    }

    async fn update_matches(&self, batch: &[MatchUpdate]) -> Result<usize, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }
        Self::ensure_batch_size(batch.len())?;

        let payload = json!({
            "records": batch
                .iter()
                .map(|m| json!({"id": m.id, "fields": schema::match_update_fields(m)}))
                .collect::<Vec<_>>(),
            "typecast": true,
        });

        let response = self
            .client
            .patch(self.table_url(&self.tables.matches))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        Self::check_status(&self.tables.matches, response.status())?;

        let body: Value = response.json().await?;
        let updated = body
            .get("records")
            .and_then(|r| r.as_array())
            .map(|r| r.len())
            .ok_or_else(|| StoreError::InvalidResponse("missing records array".into()))?;

        Ok(updated)
    }

    async fn delete_matches(&self, ids: &[String]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        Self::ensure_batch_size(ids.len())?;

        let query = ids
            .iter()
            .map(|id| format!("records%5B%5D={}", urlencoding::encode(id)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}?{}", self.table_url(&self.tables.matches), query);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::check_status(&self.tables.matches, response.status())?;

        let body: Value = response.json().await?;
        let deleted = body
            .get("records")
            .and_then(|r| r.as_array())
            .map(|r| r.len())
            .ok_or_else(|| StoreError::InvalidResponse("missing records array".into()))?;

        Ok(deleted)
    }
}
