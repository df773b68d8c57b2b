use crate::adapters::session::{read_message, MessageBody, Session};
use crate::domain::model::{FundingRecord, RecordId};
use crate::domain::ports::RecordStore;
use crate::utils::error::{FundingError, Result};
use crate::utils::validation::{validate_new_record, validate_patch};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

const FUNDINGS_PATH: &str = "fundings";

/// [`RecordStore`] over the REST API at `{base}/fundings`.
pub struct RestRecordStore {
    client: Client,
    session: Session,
}

impl RestRecordStore {
    pub fn new(session: Session, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, session })
    }

    fn collection_url(&self) -> Result<Url> {
        self.session.endpoint(FUNDINGS_PATH)
    }

    fn record_url(&self, id: &RecordId) -> Result<Url> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| FundingError::ConfigValidation {
                field: "api.base_url".to_string(),
                message: format!("{} cannot be used as a base URL", self.session.base_url()),
            })?
            .push(id.as_str());
        Ok(url)
    }

    /// Maps non-success statuses onto the error taxonomy.
    async fn check(response: Response, id: Option<&RecordId>) -> Result<Response> {
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let message = read_message(response).await;
        let id = id.map(|id| id.to_string()).unwrap_or_default();

        Err(match status {
            StatusCode::NOT_FOUND => FundingError::NotFound { id },
            StatusCode::BAD_REQUEST if !id.is_empty() => FundingError::InvalidIdentifier { id },
            StatusCode::BAD_REQUEST => FundingError::Validation { message },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FundingError::Unauthorized { message },
            _ => FundingError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn list(&self) -> Result<Vec<FundingRecord>> {
        let url = self.collection_url()?;
        tracing::debug!("Making API request to: {}", url);

        let response = Self::check(self.client.get(url).send().await?, None).await?;
        let json_data: serde_json::Value = response.json().await?;

        match json_data {
            serde_json::Value::Array(items) => Ok(items.into_iter().map(FundingRecord::from).collect()),
            other => Err(FundingError::Api {
                status: StatusCode::OK.as_u16(),
                message: format!("Expected an array of funding entries, got {}", json_kind(&other)),
            }),
        }
    }

    async fn get(&self, id: &RecordId) -> Result<FundingRecord> {
        let url = self.record_url(id)?;
        tracing::debug!("Making API request to: {}", url);

        let response = Self::check(self.client.get(url).send().await?, Some(id)).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, record: &FundingRecord) -> Result<FundingRecord> {
        // 送出前先在本地驗證，缺欄位時不發任何請求
        validate_new_record(record)?;

        let url = self.collection_url()?;
        tracing::debug!("Creating funding entry at: {}", url);

        let request = self.session.authorize(self.client.post(url).json(record));
        let response = Self::check(request.send().await?, None).await?;
        let created: FundingRecord = response.json().await?;

        tracing::info!(
            "➕ Created funding entry {}",
            created.id().map(|id| id.to_string()).unwrap_or_default()
        );
        Ok(created)
    }

    async fn update(&self, id: &RecordId, patch: &FundingRecord) -> Result<FundingRecord> {
        validate_patch(patch)?;

        let url = self.record_url(id)?;
        tracing::debug!("Updating funding entry at: {}", url);

        let request = self.session.authorize(self.client.put(url).json(patch));
        let response = Self::check(request.send().await?, Some(id)).await?;
        let updated: FundingRecord = response.json().await?;

        tracing::info!("✏️ Updated funding entry {}", id);
        Ok(updated)
    }

    async fn delete(&self, id: &RecordId) -> Result<String> {
        let url = self.record_url(id)?;
        tracing::debug!("Deleting funding entry at: {}", url);

        let request = self.session.authorize(self.client.delete(url));
        let response = Self::check(request.send().await?, Some(id)).await?;
        let body: MessageBody = response.json().await?;

        tracing::info!("🗑️ Deleted funding entry {}", id);
        Ok(body
            .message
            .unwrap_or_else(|| "Funding entry deleted successfully".to_string()))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
