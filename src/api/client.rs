//! HTTP backend for the search service.
//!
//! [`SearchBackend`] is the seam the session dispatcher talks to;
//! [`HttpBackend`] implements it with reqwest against the real API. Every
//! call makes exactly one attempt.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::ApiError;
use crate::credentials::CredentialStore;
use crate::model::types::{
    Ack, Collection, CollectionItems, ErrorBody, ExecutedSearch, HistoryEntry, LoginToken,
    NewAccount, NewCollection, SaveSearchRecord, SavedSearch, SearchResponse, SuggestResponse,
    Suggestion,
};
use crate::search::query::SearchRequest;

/// Operations the session controller needs from the backend.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;

    async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>, ApiError>;

    async fn save_search(&self, record: &SaveSearchRecord) -> Result<Ack, ApiError>;

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;

    async fn create_collection(&self, body: &NewCollection) -> Result<Collection, ApiError>;

    async fn add_collection_items(
        &self,
        collection_id: i64,
        body: &CollectionItems,
    ) -> Result<(), ApiError>;

    async fn search_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    /// Promote a history entry to a saved search.
    async fn save_history_entry(&self, id: i64) -> Result<Ack, ApiError>;

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, ApiError>;

    async fn execute_saved_search(&self, id: i64) -> Result<ExecutedSearch, ApiError>;

    async fn delete_saved_search(&self, id: i64) -> Result<Ack, ApiError>;
}

/// Whether a call must carry the bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Fail locally with [`ApiError::MissingCredential`] when absent.
    Required,
    /// Attach when present.
    Optional,
    None,
}

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    credentials: CredentialStore,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        credentials: CredentialStore,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("studyscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(format!("building http client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Url(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, url: Url, auth: Auth) -> Result<RequestBuilder, ApiError> {
        let mut builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        match (auth, self.credentials.token()) {
            (Auth::None, _) => {}
            (_, Some(token)) => builder = builder.header(AUTHORIZATION, format!("Bearer {token}")),
            (Auth::Required, None) => return Err(ApiError::MissingCredential),
            (Auth::Optional, None) => {}
        }
        Ok(builder)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let response = Self::send(self.request(Method::GET, url, auth)?).await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, auth: Auth) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let response = Self::send(self.request(Method::POST, url, auth)?.json(body)).await?;
        decode(response).await
    }

    /// Exchange email + password for a bearer token (`POST /api/auth/login`).
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginToken, ApiError> {
        let url = self.url("api/auth/login")?;
        let form = format!(
            "username={}&password={}",
            urlencoding::encode(email),
            urlencoding::encode(password)
        );
        let builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form);
        Self::send_credentials(builder).await
    }

    /// Create an account and receive its first token (`POST /api/auth/register`).
    pub async fn register(&self, account: &NewAccount) -> Result<LoginToken, ApiError> {
        let url = self.url("api/auth/register")?;
        info!(email = %account.email, "register");
        let builder = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(account);
        Self::send_credentials(builder).await
    }

    /// Login and registration answer 401/400 for rejected credentials, which
    /// is a plain failure with a server detail, not an expired session.
    async fn send_credentials(builder: RequestBuilder) -> Result<LoginToken, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        decode(response).await
    }

    /// `GET /api/health`; any 2xx is healthy.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let url = self.url("api/health")?;
        match self.request(Method::GET, url, Auth::None)?.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                debug!("health check failed: {e}");
                Ok(false)
            }
        }
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.status() == StatusCode::UNAUTHORIZED {
        warn!(url = %response.url(), "backend rejected credential");
        return Err(ApiError::Unauthorized);
    }
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }
    Ok(response)
}

/// A non-success response as [`ApiError::Status`], keeping a string `detail`.
async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message());
    warn!(status = status.as_u16(), detail = ?detail, "backend request failed");
    ApiError::Status {
        status: status.as_u16(),
        detail,
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!("malformed backend response: {e}");
        ApiError::Decode(e.to_string())
    })
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        let mut url = self.url("api/search")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        info!(
            query = %request.query,
            page = request.page,
            category = %request.category,
            filters = request.filters.len(),
            "search_start"
        );
        let response = Self::send(self.request(Method::GET, url, Auth::None)?).await?;
        decode(response).await
    }

    async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>, ApiError> {
        let mut url = self.url("api/suggest")?;
        url.query_pairs_mut().append_pair("q", text);
        debug!(text, "suggest_start");
        let response = Self::send(self.request(Method::GET, url, Auth::Optional)?).await?;
        let body: SuggestResponse = decode(response).await?;
        Ok(body.suggestions)
    }

    async fn save_search(&self, record: &SaveSearchRecord) -> Result<Ack, ApiError> {
        self.post_json("api/search-history", record, Auth::Required)
            .await
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        self.get_json("api/collections", Auth::Required).await
    }

    async fn create_collection(&self, body: &NewCollection) -> Result<Collection, ApiError> {
        info!(title = %body.title, "create_collection");
        self.post_json("api/collections", body, Auth::Required)
            .await
    }

    async fn add_collection_items(
        &self,
        collection_id: i64,
        body: &CollectionItems,
    ) -> Result<(), ApiError> {
        info!(
            collection_id,
            items = body.data_product_ids.len(),
            "add_collection_items"
        );
        let path = format!("api/collections/{collection_id}/items");
        let url = self.url(&path)?;
        Self::send(self.request(Method::POST, url, Auth::Required)?.json(body)).await?;
        Ok(())
    }

    async fn search_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get_json("api/search-history", Auth::Required).await
    }

    async fn save_history_entry(&self, id: i64) -> Result<Ack, ApiError> {
        let path = format!("api/search-history/{id}/save");
        self.post_json(&path, &serde_json::json!({}), Auth::Required)
            .await
    }

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, ApiError> {
        self.get_json("api/saved-searches", Auth::Required).await
    }

    async fn execute_saved_search(&self, id: i64) -> Result<ExecutedSearch, ApiError> {
        let path = format!("api/saved-searches/{id}/execute");
        self.post_json(&path, &serde_json::json!({}), Auth::Required)
            .await
    }

    async fn delete_saved_search(&self, id: i64) -> Result<Ack, ApiError> {
        let url = self.url(&format!("api/saved-searches/{id}"))?;
        let response = Self::send(self.request(Method::DELETE, url, Auth::Required)?).await?;
        decode(response).await
    }
}
