//! Chroma v2 REST client

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};

use crate::config::ChromaConfig;
use crate::error::ChromaError;
use crate::models::{
    AddRequest, ChromaHit, CollectionResource, CreateCollectionRequest, QueryRequest,
    QueryResponse,
};

/// HTTP client for a single Chroma collection
///
/// The collection is addressed by name in the config and resolved to a
/// server-side id on first use; the id is cached for the lifetime of the
/// client.
#[derive(Debug)]
pub struct ChromaClient {
    client: Client,
    config: ChromaConfig,
    collection_id: Mutex<Option<String>>,
}

impl ChromaClient {
    /// Create a new client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ChromaConfig) -> Result<Self, ChromaError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ChromaError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            collection_id: Mutex::new(None),
        })
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.config.base_url, self.config.tenant, self.config.database
        )
    }

    /// Query the collection for the nearest neighbors of an embedding
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable, the collection cannot
    /// be resolved, or the response cannot be parsed.
    #[instrument(skip(self, embedding), fields(n_results = n_results))]
    pub async fn query(
        &self,
        embedding: Vec<f32>,
        n_results: usize,
    ) -> Result<Vec<ChromaHit>, ChromaError> {
        let collection_id = self.resolve_collection().await?;
        let url = format!("{}/{collection_id}/query", self.collections_url());

        let request = QueryRequest {
            query_embeddings: vec![embedding],
            n_results,
            include: vec!["documents".to_string(), "distances".to_string()],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChromaError::from_reqwest(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChromaError::ServerError(format!("Status {status}: {body}")));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| ChromaError::InvalidResponse(e.to_string()))?;

        let hits = convert_hits(parsed);
        debug!(hits = hits.len(), "Chroma query returned");
        Ok(hits)
    }

    /// Add documents with precomputed embeddings to the collection
    ///
    /// All three slices are parallel: one id, one document, and one
    /// embedding per chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices are mismatched or the server rejects
    /// the request.
    #[instrument(skip(self, documents, embeddings), fields(count = ids.len()))]
    pub async fn add(
        &self,
        ids: Vec<String>,
        documents: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(), ChromaError> {
        if ids.len() != documents.len() || ids.len() != embeddings.len() {
            return Err(ChromaError::RequestFailed(format!(
                "mismatched lengths: {} ids, {} documents, {} embeddings",
                ids.len(),
                documents.len(),
                embeddings.len()
            )));
        }

        let collection_id = self.resolve_collection().await?;
        let url = format!("{}/{collection_id}/add", self.collections_url());

        let count = ids.len();
        let request = AddRequest {
            ids,
            documents,
            embeddings,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChromaError::from_reqwest(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChromaError::ServerError(format!("Status {status}: {body}")));
        }

        info!(count, collection = %self.config.collection, "Added documents to Chroma");
        Ok(())
    }

    /// Check whether the Chroma server is reachable
    ///
    /// # Errors
    ///
    /// Only returns an error for client construction problems; an
    /// unreachable server yields `Ok(false)`.
    pub async fn health_check(&self) -> Result<bool, ChromaError> {
        let url = format!("{}/api/v2/heartbeat", self.config.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(ChromaError::RequestFailed(e.to_string())),
        }
    }

    /// Resolve the configured collection name to its id, creating the
    /// collection if it does not exist yet
    async fn resolve_collection(&self) -> Result<String, ChromaError> {
        if let Some(id) = self.collection_id.lock().clone() {
            return Ok(id);
        }

        let request = CreateCollectionRequest {
            name: self.config.collection.clone(),
            get_or_create: true,
        };

        let response = self
            .client
            .post(self.collections_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| ChromaError::from_reqwest(&e, self.config.timeout_ms))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ChromaError::ServerError(format!(
                "Status {status}: check tenant and database configuration"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChromaError::ServerError(format!("Status {status}: {body}")));
        }

        let resource: CollectionResource = response
            .json()
            .await
            .map_err(|e| ChromaError::InvalidResponse(e.to_string()))?;

        debug!(
            collection = %self.config.collection,
            id = %resource.id,
            "Resolved Chroma collection"
        );
        *self.collection_id.lock() = Some(resource.id.clone());
        Ok(resource.id)
    }
}

fn convert_hits(response: QueryResponse) -> Vec<ChromaHit> {
    let Some(ids) = response.ids.into_iter().next() else {
        return Vec::new();
    };
    let documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    let distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();

    ids.into_iter()
        .enumerate()
        .map(|(i, id)| ChromaHit {
            id,
            document: documents
                .get(i)
                .cloned()
                .flatten()
                .unwrap_or_default(),
            distance: distances.get(i).copied().unwrap_or(0.0),
        })
        .collect()
}
