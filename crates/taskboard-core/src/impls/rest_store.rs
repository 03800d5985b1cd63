//! RestTaskStore - PostgREST 互換 REST API のクライアント
//!
//! `{url}/rest/v1/{table}` に対して list / insert / update / delete を発行します。
//! 単一行を返す呼び出しは `Accept: application/vnd.pgrst.object+json` を付け、
//! 0 行だった場合（PGRST116）は `StoreError::NotFound` にします。

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::StoreConfig;
use crate::domain::{StoreError, Task, TaskDraft, TaskId};
use crate::ports::TaskStore;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";
/// PostgREST: single-object request matched zero (or many) rows.
const NO_ROWS_CODE: &str = "PGRST116";

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

pub struct RestTaskStore {
    client: Client,
    config: StoreConfig,
}

impl RestTaskStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    fn table_url(&self, query: &[(&str, String)]) -> Result<Url, StoreError> {
        let mut url = self
            .config
            .endpoint(&format!("rest/v1/{}", self.config.table))
            .map_err(|e| StoreError::Config(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.config.anon_key.expose_secret();
        self.client
            .request(method, url)
            .header("apikey", key)
            .header(AUTHORIZATION, format!("Bearer {key}"))
    }

    fn single_row(builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Prefer", RETURN_REPRESENTATION)
            .header(ACCEPT, SINGLE_OBJECT)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let res = builder
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if res.status().is_success() {
            Ok(res)
        } else {
            Err(error_from_response(res).await)
        }
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, StoreError> {
    res.json::<T>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

async fn error_from_response(res: Response) -> StoreError {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<PostgrestError>(&body).ok();
    let code = parsed.as_ref().and_then(|p| p.code.clone());

    if status == StatusCode::NOT_FOUND || code.as_deref() == Some(NO_ROWS_CODE) {
        return StoreError::NotFound;
    }

    let message = match parsed.and_then(|p| p.message) {
        Some(message) => message,
        None if body.is_empty() => status.to_string(),
        None => body,
    };
    StoreError::Rejected {
        status: status.as_u16(),
        code,
        message,
    }
}

fn id_filter(id: TaskId) -> (&'static str, String) {
    ("id", format!("eq.{id}"))
}

#[async_trait]
impl TaskStore for RestTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let url = self.table_url(&[
            ("select", "*".to_string()),
            ("order", "created_at.asc".to_string()),
        ])?;
        debug!(%url, "listing tasks");

        let res = self.send(self.request(Method::GET, url)).await?;
        decode(res).await
    }

    async fn insert(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        let url = self.table_url(&[("select", "*".to_string())])?;
        debug!(%url, "inserting task");

        // PostgREST の bulk insert 形式（配列）で 1 件だけ送る
        let builder = Self::single_row(self.request(Method::POST, url)).json(&[draft]);
        let res = self.send(builder).await?;
        decode(res).await
    }

    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, StoreError> {
        let url = self.table_url(&[id_filter(id), ("select", "*".to_string())])?;
        debug!(%url, %id, "updating task");

        let builder = Self::single_row(self.request(Method::PATCH, url)).json(draft);
        let res = self.send(builder).await?;
        decode(res).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        let url = self.table_url(&[id_filter(id)])?;
        debug!(%url, %id, "deleting task");

        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
