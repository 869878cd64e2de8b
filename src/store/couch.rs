//! CouchDB client and its connector.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::pool::{Connector, ConnectorError};
use crate::store::{Document, DocumentStore, StoreError};

/// Body written by [`DocumentStore::create_with_generated_id`].
#[derive(Debug, Serialize)]
struct SeedDocument<'a> {
    name: &'a str,
}

/// One CouchDB database on one backend instance, reached over HTTP.
pub struct CouchStore {
    client: reqwest::Client,
    db_url: Url,
}

impl CouchStore {
    pub fn new(client: reqwest::Client, db_url: Url) -> Self {
        Self { client, db_url }
    }

    pub fn database_url(&self) -> &Url {
        &self.db_url
    }

    fn document_url(&self, id: &str) -> Url {
        let mut url = self.db_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }
}

#[async_trait]
impl DocumentStore for CouchStore {
    async fn fetch(&self, id: &str) -> Result<Document, StoreError> {
        let response = self.client.get(self.document_url(id)).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<Document>().await?)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(StoreError::NotFound { id: id.to_string() })
        } else {
            Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
            })
        }
    }

    async fn create_with_generated_id(&self) -> Result<bool, StoreError> {
        let id = Uuid::new_v4().to_string();
        let response = self
            .client
            .put(self.document_url(&id))
            .json(&SeedDocument { name: "hello" })
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else {
            Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
            })
        }
    }
}

/// Builds one [`CouchStore`] per discovered address.
///
/// The HTTP client is built once and shared; per-address state is only the
/// database URL.
pub struct CouchConnector {
    client: reqwest::Client,
    database: String,
}

impl CouchConnector {
    pub fn new(config: &DatabaseConfig) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            database: config.name.clone(),
        })
    }
}

impl Connector for CouchConnector {
    type Conn = CouchStore;

    fn connect(&self, address: &str) -> Result<CouchStore, ConnectorError> {
        let mut db_url = normalize_address(address)?;
        if let Ok(mut segments) = db_url.path_segments_mut() {
            segments.push(&self.database);
        }
        Ok(CouchStore::new(self.client.clone(), db_url))
    }
}

/// Accepts bare `host:port` or a full URL; the scheme defaults to http.
fn normalize_address(address: &str) -> Result<Url, ConnectorError> {
    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    Url::parse(&candidate).map_err(|source| ConnectorError::InvalidAddress {
        address: address.to_string(),
        source,
    })
}
