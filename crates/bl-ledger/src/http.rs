use async_trait::async_trait;
use bl_types::{CommittedTransaction, CommittedTransactionResponse};
use reqwest::{Client, StatusCode};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::reader::LedgerReader;

const TRANSACTION_PATH: &str = "/unibrightio/baseledger/baseledger/BaseledgerTransaction";

/// Ledger reader backed by the chain node's REST query API. No retries;
/// redelivery of the transaction result is the retry mechanism.
pub struct HttpLedgerReader {
    client: Client,
    base_url: String,
}

impl HttpLedgerReader {
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn transaction_url(&self, id: Uuid) -> String {
        format!("{}{}/{}", self.base_url, TRANSACTION_PATH, id)
    }
}

#[async_trait]
impl LedgerReader for HttpLedgerReader {
    async fn fetch_committed_transaction(&self, id: Uuid) -> LedgerResult<CommittedTransaction> {
        let url = self.transaction_url(id);
        tracing::debug!(%url, "fetching committed transaction");
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound(id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!("{status}: {body}")));
        }

        let body = response.bytes().await?;
        let parsed: CommittedTransactionResponse = serde_json::from_slice(&body)
            .map_err(|e| LedgerError::Deserialization(e.to_string()))?;
        Ok(parsed.baseledger_transaction)
    }
}
