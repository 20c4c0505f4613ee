//! Batched HTTP ingest client.
//!
//! Observations are queued and delivered to the server as one JSON
//! array per debounce window. The first successful `POST /hello`
//! establishes a session token; every authenticated POST carries it as
//! a bearer credential. Failed POSTs are retried with linearly growing,
//! jittered backoff, and a batch that exhausts its retries is dropped
//! with a single user-visible error line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use paissa_core::types::PlayerIdentity;

use crate::config::ClientConfig;
use crate::observer::UserSink;
use crate::schema::{DistrictDetail, HelloRequest, HelloResponse, IngestRecord};

/// Trailing debounce window: every `submit` within it extends the timer.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(1200);

/// Maximum POST attempts before a batch is dropped.
pub const MAX_ATTEMPTS: u32 = 5;

/// HTTP request timeout for a single attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff before retrying attempt `attempt + 1` (zero-indexed):
/// `2000·(attempt+1) ms` plus 500–1500 ms of jitter.
pub fn retry_delay(attempt: u32) -> Duration {
    let base = 2000 * (attempt as u64 + 1);
    let jitter = rand::rng().random_range(500..=1500u64);
    Duration::from_millis(base + jitter)
}

/// Errors from the ingest HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("server returned HTTP {0}")]
    Status(u16),

    /// An authenticated call was attempted without a session token.
    #[error("no session token held")]
    MissingToken,

    /// The server rejected the session token (HTTP 401).
    #[error("session token rejected")]
    Unauthorized,

    /// The client was disposed while a retry was pending.
    #[error("ingest client disposed")]
    Disposed,
}

/// Debounced, batched, authenticated delivery to the ingest server.
///
/// Created once per session via [`IngestClient::new`]; the returned
/// `Arc` is cheap to clone into the coordinator and background tasks.
pub struct IngestClient {
    http: reqwest::Client,
    api_base: String,
    queue: Mutex<Vec<IngestRecord>>,
    /// Cancel-and-reschedule cell for the trailing debounce timer.
    debounce: Mutex<Option<CancellationToken>>,
    /// At most one drain runs at a time.
    drain_lock: tokio::sync::Mutex<()>,
    /// The only shared mutable state between coordinator and client.
    session_token: tokio::sync::RwLock<Option<String>>,
    needs_hello: AtomicBool,
    hello_in_flight: AtomicBool,
    sink: Arc<dyn UserSink>,
    cancel: CancellationToken,
}

impl IngestClient {
    pub fn new(config: &ClientConfig, sink: Arc<dyn UserSink>) -> Arc<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");

        Arc::new(Self {
            http,
            api_base: config.api_base.clone(),
            queue: Mutex::new(Vec::new()),
            debounce: Mutex::new(None),
            drain_lock: tokio::sync::Mutex::new(()),
            session_token: tokio::sync::RwLock::new(None),
            needs_hello: AtomicBool::new(true),
            hello_in_flight: AtomicBool::new(false),
            sink,
            cancel: CancellationToken::new(),
        })
    }

    /// Whether a HELLO is still required before authenticated ingest.
    pub fn needs_hello(&self) -> bool {
        self.needs_hello.load(Ordering::SeqCst)
    }

    /// Arm the HELLO latch (login state changed, token rejected, ...).
    pub fn mark_needs_hello(&self) {
        self.needs_hello.store(true, Ordering::SeqCst);
    }

    /// Number of records waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.queue.lock().expect("ingest queue lock poisoned").len()
    }

    /// Register the character and store the returned session token.
    ///
    /// Retried with the standard backoff; until it succeeds the HELLO
    /// latch stays armed and authenticated ingest is deferred.
    pub async fn hello(&self, player: &PlayerIdentity) -> Result<(), IngestError> {
        let body = serde_json::to_value(HelloRequest {
            cid: player.content_id,
            name: player.name.clone(),
            world: player.home_world.clone(),
            world_id: player.home_world_id,
        })
        .expect("HelloRequest is always serialisable");

        let response = self.post_with_retry("/hello", &body, false).await?;
        let parsed: HelloResponse = response.json().await?;

        *self.session_token.write().await = Some(parsed.session_token);
        self.needs_hello.store(false, Ordering::SeqCst);
        tracing::info!(world = %player.home_world, "Session established with ingest server");
        Ok(())
    }

    /// Run [`hello`](Self::hello) on a background task, unless one is
    /// already in flight. Failures are logged; the latch stays armed so
    /// a later tick tries again.
    pub fn spawn_hello(self: &Arc<Self>, player: PlayerIdentity) {
        if self.hello_in_flight.swap(true, Ordering::SeqCst) {
            return;
        }
        let client = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = client.hello(&player).await {
                tracing::warn!(error = %e, "HELLO failed; will retry on a later tick");
            }
            client.hello_in_flight.store(false, Ordering::SeqCst);
        });
    }

    /// Queue a record and (re)arm the trailing debounce timer.
    ///
    /// Non-blocking; the actual POST happens on a background task once
    /// the window elapses without further submissions.
    pub fn submit(self: &Arc<Self>, record: IngestRecord) {
        self.queue
            .lock()
            .expect("ingest queue lock poisoned")
            .push(record);
        self.arm_debounce();
    }

    /// Cancel any pending timer and schedule a fresh one.
    fn arm_debounce(self: &Arc<Self>) {
        let token = self.cancel.child_token();
        {
            let mut cell = self.debounce.lock().expect("debounce cell lock poisoned");
            if let Some(prev) = cell.take() {
                prev.cancel();
            }
            *cell = Some(token.clone());
        }

        let client = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(DEBOUNCE_WINDOW) => client.drain().await,
            }
        });
    }

    /// Swap out the queue and deliver it as one batch.
    async fn drain(self: Arc<Self>) {
        // A timer firing while a drain is in flight waits here, so the
        // queue refilled meanwhile goes out as the next batch.
        let _guard = self.drain_lock.lock().await;

        let batch: Vec<IngestRecord> = {
            let mut queue = self.queue.lock().expect("ingest queue lock poisoned");
            std::mem::take(&mut *queue)
        };
        if batch.is_empty() {
            return;
        }

        tracing::debug!(records = batch.len(), "Draining ingest batch");
        let body = serde_json::to_value(&batch).expect("IngestRecords are always serialisable");

        match self.post_with_retry("/ingest", &body, true).await {
            Ok(_) => tracing::debug!(records = batch.len(), "Ingest batch delivered"),
            Err(IngestError::Disposed) => {}
            Err(e) => {
                tracing::error!(
                    records = batch.len(),
                    error = %e,
                    "Dropping ingest batch after all retries failed",
                );
                self.sink
                    .print_error("There was an error connecting to PaissaDB.");
            }
        }
    }

    /// Fetch the open-plot detail for one district. No retries; errors
    /// propagate to the caller.
    pub async fn get_district(
        &self,
        world_id: u16,
        district_id: u16,
    ) -> Result<DistrictDetail, IngestError> {
        let url = format!("{}/worlds/{}/{}", self.api_base, world_id, district_id);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Fire the pending batch immediately, then stop all timers.
    pub async fn shutdown(self: &Arc<Self>) {
        if let Some(timer) = self
            .debounce
            .lock()
            .expect("debounce cell lock poisoned")
            .take()
        {
            timer.cancel();
        }
        Arc::clone(self).drain().await;
        self.cancel.cancel();
    }

    /// Abort pending timers and any in-flight retry loop.
    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    // ---- private helpers ----

    async fn post_with_retry(
        &self,
        route: &str,
        body: &serde_json::Value,
        authed: bool,
    ) -> Result<reqwest::Response, IngestError> {
        let url = format!("{}{}", self.api_base, route);
        let mut last_err: Option<IngestError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            match self.try_post(&url, body, authed).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %url,
                        error = %e,
                        "POST attempt failed",
                    );
                    last_err = Some(e);
                }
            }

            if attempt + 1 < MAX_ATTEMPTS {
                let delay = retry_delay(attempt);
                tracing::debug!(delay_ms = delay.as_millis() as u64, "Waiting before retry");
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(IngestError::Disposed),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(last_err.unwrap_or(IngestError::MissingToken))
    }

    async fn try_post(
        &self,
        url: &str,
        body: &serde_json::Value,
        authed: bool,
    ) -> Result<reqwest::Response, IngestError> {
        let mut request = self.http.post(url).json(body);
        if authed {
            match self.session_token.read().await.clone() {
                Some(token) => request = request.bearer_auth(token),
                None => {
                    self.needs_hello.store(true, Ordering::SeqCst);
                    return Err(IngestError::MissingToken);
                }
            }
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            // The session expired server-side; force a fresh HELLO
            // before the next authenticated call.
            *self.session_token.write().await = None;
            self.needs_hello.store(true, Ordering::SeqCst);
            return Err(IngestError::Unauthorized);
        }
        if !status.is_success() {
            return Err(IngestError::Status(status.as_u16()));
        }
        Ok(response)
    }

    #[cfg(test)]
    pub(crate) async fn set_session_token(&self, token: Option<String>) {
        *self.session_token.write().await = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct NullSink;

    impl UserSink for NullSink {
        fn print(&self, _channel: &str, _message: &str) {}
        fn print_error(&self, _message: &str) {}
    }

    fn test_client() -> Arc<IngestClient> {
        let config = ClientConfig {
            // Port 9 (discard) -- nothing listens there in tests.
            api_base: "http://127.0.0.1:9".to_string(),
            ws_url: "ws://127.0.0.1:9/ws".to_string(),
            ws_secret: None,
        };
        IngestClient::new(&config, Arc::new(NullSink))
    }

    #[test]
    fn retry_delay_stays_within_policy_bounds() {
        for attempt in 0..MAX_ATTEMPTS {
            for _ in 0..50 {
                let delay = retry_delay(attempt).as_millis() as u64;
                let base = 2000 * (attempt as u64 + 1);
                assert!(
                    (base + 500..=base + 1500).contains(&delay),
                    "attempt {attempt}: delay {delay} out of bounds",
                );
            }
        }
    }

    #[tokio::test]
    async fn authed_post_without_token_arms_hello_latch() {
        let client = test_client();
        client.needs_hello.store(false, Ordering::SeqCst);

        let body = serde_json::json!([]);
        let err = client
            .try_post("http://127.0.0.1:9/ingest", &body, true)
            .await
            .unwrap_err();

        assert_matches!(err, IngestError::MissingToken);
        assert!(client.needs_hello());
    }

    #[tokio::test]
    async fn submit_queues_in_order() {
        let client = test_client();
        for ward in 0..3i16 {
            client.submit(IngestRecord::WardInfo(crate::schema::WardInfoRecord {
                client_timestamp: 0,
                server_timestamp: 0,
                land_ident: paissa_core::types::LandIdent {
                    land_id: -1,
                    ward_number: ward,
                    territory_type_id: 339,
                    world_id: 73,
                },
                house_info_entries: Vec::new(),
                purchase_type: None,
                tenant_type: None,
            }));
        }

        assert_eq!(client.pending(), 3);
        let queue = client.queue.lock().unwrap();
        for (i, record) in queue.iter().enumerate() {
            match record {
                IngestRecord::WardInfo(ward) => {
                    assert_eq!(ward.land_ident.ward_number, i as i16)
                }
                other => panic!("unexpected record {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn spawn_hello_is_single_flight() {
        let client = test_client();
        let player = paissa_core::types::PlayerIdentity {
            content_id: 1,
            name: "Test Character".to_string(),
            home_world: "Siren".to_string(),
            home_world_id: 73,
        };
        client.spawn_hello(player.clone());
        // Second spawn while the first is in flight is a no-op.
        client.spawn_hello(player);
        assert!(client.hello_in_flight.load(Ordering::SeqCst));
        client.dispose();
    }

    #[tokio::test]
    async fn dispose_aborts_retry_sleep() {
        let client = test_client();
        client.set_session_token(Some("token".to_string())).await;

        let inner = Arc::clone(&client);
        let handle = tokio::spawn(async move {
            let body = serde_json::json!([]);
            inner.post_with_retry("/ingest", &body, true).await
        });

        // Let the first attempt fail and enter its backoff sleep.
        tokio::time::sleep(Duration::from_millis(200)).await;
        client.dispose();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("retry loop should exit promptly after dispose")
            .unwrap();
        assert_matches!(result, Err(IngestError::Disposed));
    }
}
