#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tower::Layer;

use snaplink::application::rate_limit::{
    DistributedRateLimiter, RateLimitTable, RateLimiter, StandaloneRateLimiter,
};
use snaplink::domain::click_event::{ClickDispatcher, ClickEvent};
use snaplink::domain::entities::{DedupEntry, UrlRecord};
use snaplink::domain::repositories::UrlRepository;
use snaplink::error::AppError;
use snaplink::infrastructure::cache::{
    CacheError, CacheHandle, CacheResult, CacheService, CacheSettings, VolatileCache,
};
use snaplink::state::AppState;

pub const BASE_URL: &str = "http://sho.rt";

/// Durable store kept in process memory.
#[derive(Default)]
pub struct InMemoryUrlRepository {
    urls: Mutex<HashMap<String, UrlRecord>>,
    dedup: Mutex<HashMap<String, String>>,
    clicks: Mutex<HashMap<String, i64>>,
    down: AtomicBool,
    pub insert_calls: AtomicUsize,
}

impl InMemoryUrlRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn url_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn record(&self, code: &str) -> Option<UrlRecord> {
        self.urls.lock().unwrap().get(code).cloned()
    }

    pub fn put(&self, record: UrlRecord) {
        self.urls
            .lock()
            .unwrap()
            .insert(record.short_code.clone(), record);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.down.load(Ordering::SeqCst) {
            Err(AppError::backend("store down"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn insert_url(&self, record: &UrlRecord) -> Result<bool, AppError> {
        self.check()?;
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        let mut urls = self.urls.lock().unwrap();
        if urls.contains_key(&record.short_code) {
            return Ok(false);
        }
        urls.insert(record.short_code.clone(), record.clone());
        Ok(true)
    }

    async fn insert_dedup(&self, entry: &DedupEntry) -> Result<(), AppError> {
        self.check()?;
        self.dedup
            .lock()
            .unwrap()
            .entry(entry.url_hash.clone())
            .or_insert_with(|| entry.short_code.clone());
        Ok(())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        self.check()?;
        Ok(self.record(short_code))
    }

    async fn find_dedup(&self, url_hash: &str) -> Result<Option<String>, AppError> {
        self.check()?;
        Ok(self.dedup.lock().unwrap().get(url_hash).cloned())
    }

    async fn increment_clicks(&self, short_code: &str) -> Result<(), AppError> {
        self.check()?;
        *self
            .clicks
            .lock()
            .unwrap()
            .entry(short_code.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn get_clicks(&self, short_code: &str) -> Result<i64, AppError> {
        self.check()?;
        Ok(self
            .clicks
            .lock()
            .unwrap()
            .get(short_code)
            .copied()
            .unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check()
    }
}

/// Cache backend kept in process memory that can be switched off.
#[derive(Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, (String, u64)>>,
    windows: Mutex<HashMap<String, Vec<(i64, String)>>>,
    down: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).map(|(v, _)| v.clone())
    }

    pub fn ttl(&self, key: &str) -> Option<u64> {
        self.values.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub fn evict(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }

    fn check(&self) -> CacheResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(CacheError::ConnectionError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check()?;
        Ok(self.value(key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()> {
        self.check()?;
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl_seconds));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check()?;
        self.evict(key);
        Ok(())
    }

    async fn get_many(&self, keys: &[String]) -> CacheResult<Vec<Option<String>>> {
        self.check()?;
        Ok(keys.iter().map(|k| self.value(k)).collect())
    }

    async fn window_record(
        &self,
        key: &str,
        member: &str,
        score_ms: i64,
        window_start_ms: i64,
        _ttl_seconds: u64,
    ) -> CacheResult<u64> {
        self.check()?;
        let mut windows = self.windows.lock().unwrap();
        let set = windows.entry(key.to_string()).or_default();
        set.retain(|(score, _)| *score > window_start_ms);
        set.push((score_ms, member.to_string()));
        Ok(set.len() as u64)
    }

    async fn window_remove(&self, key: &str, member: &str) -> CacheResult<()> {
        self.check()?;
        if let Some(set) = self.windows.lock().unwrap().get_mut(key) {
            set.retain(|(_, m)| m != member);
        }
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        self.check()
    }
}

/// Everything a test needs to drive and inspect the service.
pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<InMemoryUrlRepository>,
    pub cache_backend: Option<Arc<MemoryCache>>,
    pub clicks_rx: mpsc::Receiver<ClickEvent>,
}

impl TestContext {
    /// Service wired to an in-memory store and an in-memory cache.
    pub fn with_cache() -> Self {
        Self::build(Some(MemoryCache::new()), RateLimitTable::default())
    }

    /// Service wired to an in-memory store with no cache configured.
    pub fn without_cache() -> Self {
        Self::build(None, RateLimitTable::default())
    }

    pub fn build(cache_backend: Option<Arc<MemoryCache>>, limits: RateLimitTable) -> Self {
        let repo = InMemoryUrlRepository::new();
        let settings = CacheSettings::default();

        let cache = match &cache_backend {
            Some(backend) => VolatileCache::new(
                CacheHandle::Available(backend.clone() as Arc<dyn CacheService>),
                settings,
            ),
            None => VolatileCache::unavailable(settings),
        };
        let cache = Arc::new(cache);

        let rate_limiter: Arc<dyn RateLimiter> = match cache.backend() {
            Some(backend) => Arc::new(DistributedRateLimiter::new(backend, settings.op_timeout)),
            None => Arc::new(StandaloneRateLimiter::new()),
        };

        let (clicks, clicks_rx) = ClickDispatcher::channel(1000);

        let state = AppState::new(
            repo.clone(),
            cache,
            rate_limiter,
            limits,
            clicks,
            BASE_URL,
            1095,
            false,
        );

        Self {
            state,
            repo,
            cache_backend,
            clicks_rx,
        }
    }

    pub fn cache(&self) -> &MemoryCache {
        self.cache_backend.as_deref().expect("test context has no cache")
    }

    /// Drains queued click events into the store, as the worker would.
    pub async fn apply_clicks(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.clicks_rx.try_recv() {
            self.repo.increment_clicks(&event.short_code).await.unwrap();
            applied += 1;
        }
        applied
    }
}

/// Inserts a fixed peer address, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}
