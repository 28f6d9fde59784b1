//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client. Every batch is sent as one `_bulk` request
//! and the per-item results are folded into a `BatchOperationSummary`.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkOperation, BulkOperations, BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::index_body;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use search_sync_shared::IndexDocument;

/// Kind of bulk action, used to label errors and read response items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkAction {
    Index,
    Update,
    Delete,
}

impl BulkAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn error(&self, msg: impl Into<String>) -> SearchIndexError {
        match self {
            Self::Index => SearchIndexError::index(msg),
            Self::Update => SearchIndexError::update(msg),
            Self::Delete => SearchIndexError::delete(msg),
        }
    }
}

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// let provider = OpenSearchProvider::new("http://localhost:9200").await?;
/// provider.ensure_index_exists("article", &json!({})).await?;
/// provider.add_documents("article", &documents).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Check if the cluster is reachable and healthy (`green` or `yellow`).
    pub async fn health_check(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(matches!(body["status"].as_str(), Some("green") | Some("yellow")))
    }

    /// Send a bulk request and summarize the per-item results.
    async fn send_bulk(
        &self,
        index: &str,
        action: BulkAction,
        ops: BulkOperations,
        count: usize,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(vec![ops])
            .send()
            .await
            .map_err(|e| action.error(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %index, "Bulk request failed");
            return Err(action.error(format!(
                "Bulk {} failed with status {}: {}",
                action.as_str(),
                status,
                error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = parse_bulk_response(&body, action)?;
        debug!(
            index = %index,
            action = action.as_str(),
            requested = count,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }
}

/// Fold a `_bulk` response body into a summary.
///
/// A `delete` answered with 404 counts as success: the document is gone either way.
fn parse_bulk_response(
    body: &Value,
    action: BulkAction,
) -> Result<BatchOperationSummary, SearchIndexError> {
    let items = body["items"]
        .as_array()
        .ok_or_else(|| SearchIndexError::parse("Bulk response has no items"))?;

    let results = items
        .iter()
        .map(|item| {
            let result = &item[action.as_str()];
            let document_id = result["_id"].as_str().unwrap_or_default().to_string();
            let status = result["status"].as_u64().unwrap_or(0);

            let ok = (200..300).contains(&status)
                || (action == BulkAction::Delete && status == 404);
            if ok {
                BatchOperationResult::succeeded(document_id)
            } else {
                let reason = result["error"]["reason"]
                    .as_str()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| format!("status {}", status));
                BatchOperationResult::failed(document_id, action.error(reason))
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Create the index with the type's settings unless it already exists.
    #[instrument(skip(self, settings))]
    async fn ensure_index_exists(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(index = %index, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(index_body(settings))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another writer may have created it in the meantime.
            if error_body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Creating index {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Created search index");
        Ok(())
    }

    async fn add_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut ops = BulkOperations::new();
        for document in documents {
            ops.push(BulkOperation::index(document.source()).id(document.id.as_str()))
                .map_err(|e| SearchIndexError::index(e.to_string()))?;
        }
        self.send_bulk(index, BulkAction::Index, ops, documents.len())
            .await
    }

    /// Upsert documents: existing documents get the new fields merged in, missing
    /// documents are created.
    // API reference: https://docs.opensearch.org/latest/api-reference/document-apis/update-document/#using-the-upsert-operation
    async fn update_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut ops = BulkOperations::new();
        for document in documents {
            let body = json!({
                "doc": document.source(),
                "doc_as_upsert": true
            });
            ops.push(BulkOperation::update(document.id.as_str(), body))
                .map_err(|e| SearchIndexError::update(e.to_string()))?;
        }
        self.send_bulk(index, BulkAction::Update, ops, documents.len())
            .await
    }

    async fn delete_documents(
        &self,
        index: &str,
        document_ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut ops = BulkOperations::new();
        for id in document_ids {
            ops.push(BulkOperation::<Value>::delete(id.as_str()))
                .map_err(|e| SearchIndexError::delete(e.to_string()))?;
        }
        self.send_bulk(index, BulkAction::Delete, ops, document_ids.len())
            .await
    }
}
