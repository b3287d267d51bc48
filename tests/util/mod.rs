use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use studyscope::api::{ApiError, SearchBackend};
use studyscope::model::types::{
    Ack, Collection, CollectionItems, ExecutedSearch, HistoryEntry, NewCollection,
    SaveSearchRecord, SavedSearch, SearchResponse, Suggestion,
};
use studyscope::search::query::SearchRequest;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }
}

struct TestWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    prev: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    pub fn set(key: &str, val: impl AsRef<str>) -> Self {
        let prev = std::env::var(key).ok();
        unsafe { std::env::set_var(key, val.as_ref()) };
        Self {
            key: key.to_string(),
            prev,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => unsafe { std::env::set_var(&self.key, v) },
            None => unsafe { std::env::remove_var(&self.key) },
        }
    }
}

/// Data dir with an optional stored token.
#[allow(dead_code)]
pub struct TempDataDir {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TempDataDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn signed_in(token: &str) -> Self {
        let d = Self::new();
        std::fs::write(
            d.dir.path().join("credentials.json"),
            json!({ "auth_token": token }).to_string(),
        )
        .expect("write credentials");
        d
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

// =============================================================================
// JSON fixtures
// =============================================================================

#[allow(dead_code)]
pub fn product_json(id: i64, title: &str) -> Value {
    json!({ "id": id, "title": title, "type": "dataset" })
}

#[allow(dead_code)]
pub fn study_json(title: &str, products: Vec<Value>) -> Value {
    json!({
        "title": title,
        "type": "study",
        "phase": "III",
        "status": "Completed",
        "description": format!("{title} description"),
        "data_products": products,
    })
}

#[allow(dead_code)]
pub fn search_json(total: u64, results: Vec<Value>) -> Value {
    json!({ "results": results, "total": total })
}

// =============================================================================
// In-memory backend
// =============================================================================

/// Scripted [`SearchBackend`] that records every call.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingBackend {
    pub searches: Mutex<Vec<SearchRequest>>,
    pub search_replies: Mutex<VecDeque<Result<SearchResponse, ApiError>>>,
    pub suggest_queries: Mutex<Vec<String>>,
    pub suggestions: Mutex<Vec<Suggestion>>,
    pub collections: Mutex<Vec<Collection>>,
    pub added: Mutex<Vec<(i64, Vec<i64>)>>,
    pub saved: Mutex<Vec<SaveSearchRecord>>,
    /// Returned by every call when set.
    pub fail_with: Mutex<Option<ApiError>>,
    /// Makes `search` panic instead of answering.
    pub panic_on_search: AtomicBool,
}

#[allow(dead_code)]
impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_search(&self, reply: Result<SearchResponse, ApiError>) {
        self.search_replies.lock().unwrap().push_back(reply);
    }

    pub fn fail_all(&self, err: ApiError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    pub fn suggest_calls(&self) -> Vec<String> {
        self.suggest_queries.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<SearchRequest> {
        self.searches.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), ApiError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SearchBackend for RecordingBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.searches.lock().unwrap().push(request.clone());
        if self.panic_on_search.load(Ordering::SeqCst) {
            panic!("search handler crashed");
        }
        self.check()?;
        self.search_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SearchResponse::default()))
    }

    async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>, ApiError> {
        self.suggest_queries.lock().unwrap().push(text.to_string());
        self.check()?;
        Ok(self.suggestions.lock().unwrap().clone())
    }

    async fn save_search(&self, record: &SaveSearchRecord) -> Result<Ack, ApiError> {
        self.check()?;
        self.saved.lock().unwrap().push(record.clone());
        Ok(Ack {
            success: true,
            message: None,
        })
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        self.check()?;
        Ok(self.collections.lock().unwrap().clone())
    }

    async fn create_collection(&self, body: &NewCollection) -> Result<Collection, ApiError> {
        self.check()?;
        let mut collections = self.collections.lock().unwrap();
        let created = Collection {
            id: collections.len() as i64 + 1,
            title: body.title.clone(),
            description: body.description.clone(),
        };
        collections.push(created.clone());
        Ok(created)
    }

    async fn add_collection_items(
        &self,
        collection_id: i64,
        body: &CollectionItems,
    ) -> Result<(), ApiError> {
        self.check()?;
        self.added
            .lock()
            .unwrap()
            .push((collection_id, body.data_product_ids.clone()));
        Ok(())
    }

    async fn search_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn save_history_entry(&self, _id: i64) -> Result<Ack, ApiError> {
        self.check()?;
        Ok(Ack {
            success: true,
            message: None,
        })
    }

    async fn saved_searches(&self) -> Result<Vec<SavedSearch>, ApiError> {
        self.check()?;
        Ok(Vec::new())
    }

    async fn execute_saved_search(&self, _id: i64) -> Result<ExecutedSearch, ApiError> {
        self.check()?;
        Err(ApiError::Status {
            status: 404,
            detail: Some("Saved search not found".into()),
        })
    }

    async fn delete_saved_search(&self, _id: i64) -> Result<Ack, ApiError> {
        self.check()?;
        Ok(Ack::default())
    }
}
