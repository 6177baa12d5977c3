//! Shared test doubles: a scripted HTTP client and a fake time source whose
//! sleeper advances the clock, so throttle behavior is observable without
//! real delays.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use core_import::{
    BackfillSummary, CatalogConfig, CoverBackfill, CoverService, DiscogsClient, DiscogsImporter,
    ImportOptions, ImportSummary, RecordService,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vault_traits::error::{BridgeError, Result as BridgeResult};
use vault_traits::http::{HttpClient, HttpRequest, HttpResponse};
use vault_traits::store::{Frontmatter, MemoryNoteStore, NoteStore};
use vault_traits::time::{Clock, Sleeper};

/// HTTP client answering from a fixed response queue, recording every
/// request it sees. An exhausted queue makes the request fail loudly.
pub struct ScriptedHttp {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    pub fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BridgeError::OperationFailed(format!("unscripted request to {url}")))
    }
}

pub fn json_response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

pub fn json_response_with_header(status: u16, body: &str, name: &str, value: &str) -> HttpResponse {
    let mut response = json_response(status, body);
    response.headers.insert(name.to_string(), value.to_string());
    response
}

pub fn image_response(content_type: &str, bytes: &[u8]) -> HttpResponse {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), content_type.to_string());
    HttpResponse {
        status: 200,
        headers,
        body: Bytes::copy_from_slice(bytes),
    }
}

pub fn release_json(image_url: &str) -> String {
    format!(r#"{{"images":[{{"uri":"{image_url}","uri150":""}}]}}"#)
}

/// NoteStore decorator that fails note creation for paths containing a
/// marker, delegating everything else. Models a write failure on one
/// specific note.
pub struct FaultyStore {
    inner: Arc<MemoryNoteStore>,
    marker: String,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryNoteStore>, marker: &str) -> Self {
        Self {
            inner,
            marker: marker.to_string(),
        }
    }
}

#[async_trait]
impl NoteStore for FaultyStore {
    async fn list_notes(&self, prefix: &str) -> BridgeResult<Vec<String>> {
        self.inner.list_notes(prefix).await
    }

    async fn read_frontmatter(&self, path: &str) -> BridgeResult<Frontmatter> {
        self.inner.read_frontmatter(path).await
    }

    async fn write_frontmatter(&self, path: &str, frontmatter: &Frontmatter) -> BridgeResult<()> {
        self.inner.write_frontmatter(path, frontmatter).await
    }

    async fn create_note(&self, path: &str, content: &str) -> BridgeResult<()> {
        if path.contains(&self.marker) {
            return Err(BridgeError::OperationFailed(format!(
                "write failed: {path}"
            )));
        }
        self.inner.create_note(path, content).await
    }

    async fn write_binary(&self, path: &str, data: Bytes) -> BridgeResult<()> {
        self.inner.write_binary(path, data).await
    }

    async fn exists(&self, path: &str) -> BridgeResult<bool> {
        self.inner.exists(path).await
    }

    async fn ensure_folder(&self, path: &str) -> BridgeResult<()> {
        self.inner.ensure_folder(path).await
    }
}

/// Clock backed by a shared millisecond counter.
pub struct FakeClock(Arc<AtomicI64>);

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0.load(Ordering::SeqCst))
            .single()
            .unwrap()
    }
}

/// Sleeper that advances the shared counter instead of waiting, and keeps a
/// log of requested durations.
pub struct AdvancingSleeper {
    ticks: Arc<AtomicI64>,
    slept: Mutex<Vec<u64>>,
}

impl AdvancingSleeper {
    pub fn slept_ms(&self) -> Vec<u64> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for AdvancingSleeper {
    async fn sleep(&self, duration: Duration) {
        let ms = duration.as_millis() as u64;
        self.ticks.fetch_add(ms as i64, Ordering::SeqCst);
        self.slept.lock().unwrap().push(ms);
    }
}

/// Fully wired engine over an in-memory vault and scripted HTTP.
pub struct Harness {
    pub store: Arc<MemoryNoteStore>,
    pub http: Arc<ScriptedHttp>,
    pub sleeper: Arc<AdvancingSleeper>,
    pub importer: DiscogsImporter,
    pub backfill: CoverBackfill,
    pub records: RecordService,
    pub covers: CoverService,
    pub config: CatalogConfig,
}

impl Harness {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        let store = Arc::new(MemoryNoteStore::new());
        let http = ScriptedHttp::new(responses);
        let ticks = Arc::new(AtomicI64::new(1_700_000_000_000));
        let config = CatalogConfig::default();

        let note_store: Arc<dyn NoteStore> = store.clone();
        let discogs = |http: &Arc<ScriptedHttp>| {
            DiscogsClient::with_parts(
                http.clone(),
                Arc::new(FakeClock(ticks.clone())),
                Arc::new(AdvancingSleeper {
                    ticks: ticks.clone(),
                    slept: Mutex::new(Vec::new()),
                }),
            )
        };

        let sleeper = Arc::new(AdvancingSleeper {
            ticks: ticks.clone(),
            slept: Mutex::new(Vec::new()),
        });
        let client = DiscogsClient::with_parts(
            http.clone(),
            Arc::new(FakeClock(ticks.clone())),
            sleeper.clone(),
        );
        let importer = DiscogsImporter::new(
            note_store.clone(),
            config.clone(),
            RecordService::new(note_store.clone(), config.clone()),
            CoverService::new(note_store.clone(), client, config.clone()),
        );
        let backfill = CoverBackfill::new(
            note_store.clone(),
            config.clone(),
            CoverService::new(note_store.clone(), discogs(&http), config.clone()),
        );
        let records = RecordService::new(note_store.clone(), config.clone());
        let covers = CoverService::new(note_store.clone(), discogs(&http), config.clone());

        Self {
            store,
            http,
            sleeper,
            importer,
            backfill,
            records,
            covers,
            config,
        }
    }

    pub async fn import(&self, csv: &str, options: ImportOptions<'_>) -> ImportSummary {
        self.importer.import_csv(csv, options).await.unwrap()
    }

    pub async fn run_backfill(&self) -> BackfillSummary {
        self.backfill.run(Default::default()).await.unwrap()
    }

    /// Seed a catalog note under the artists folder.
    pub fn seed_note(&self, path: &str, entries: &[(&str, &str)]) {
        let mut fm = Frontmatter::new();
        for (key, value) in entries {
            fm.set_text(key, *value);
        }
        self.store.insert_note(path, fm, "");
    }

    pub async fn frontmatter(&self, path: &str) -> Frontmatter {
        self.store.read_frontmatter(path).await.unwrap()
    }
}

/// Two-record CSV in the Discogs export column layout.
pub fn csv_two_rows() -> &'static str {
    "Catalog#,Artist,Title,Label,Format,Rating,Released,release_id,CollectionFolder,Date Added,Collection Media Condition,Collection Sleeve Condition,Collection Notes\n\
     CAT-1,Tool,Lateralus,Volcano,2xLP,5,2001,12345,Uncategorized,2024-01-01,NM,VG+,first pressing\n\
     CAT-2,Opeth,Damnation,MFN,LP,4,2003,67890,Uncategorized,2024-01-02,VG+,VG,\n"
}
