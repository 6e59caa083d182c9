//! Shared fixtures for the api integration tests: in-memory adapters, a clock
//! the tests can move, and fast password hashing.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use api_lib::adapters::{Argon2Hasher, JwtCredentials, MemoryCodeStore, MemoryDocumentStore};
use api_lib::web::{Adapters, AppState};
use argon2::Params;
use chrono::{DateTime, Duration, TimeZone, Utc};
use learning_core::ports::{Clock, CredentialService, DocumentStoreService};
use learning_core::workflows::OneTimeCodePolicy;

pub const FIXED_CODE: &str = "123456";
pub const JWT_SECRET: &str = "integration-test-secret";
pub const MAX_ATTEMPTS: u32 = 5;

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Collects formatted log output so a test can inspect what was written.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's logs at every level into a fresh [`LogCapture`] until
/// the guard drops.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(capture.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

/// Everything a test may want to reach behind the workflows.
pub struct TestStack {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryDocumentStore>,
    pub clock: Arc<ManualClock>,
    pub credentials: Arc<JwtCredentials>,
}

pub fn fast_hasher() -> Argon2Hasher {
    Argon2Hasher::with_params(Params::new(1024, 1, 1, None).unwrap())
}

pub fn policy() -> OneTimeCodePolicy {
    OneTimeCodePolicy {
        ttl: Duration::minutes(5),
        fixed_code: Some(FIXED_CODE.to_string()),
        max_attempts: MAX_ATTEMPTS,
    }
}

/// Builds the full application state over in-memory adapters.
pub fn stack() -> TestStack {
    let store = Arc::new(MemoryDocumentStore::with_app_indexes());
    stack_with_store(store.clone(), store)
}

/// Same as [`stack`], but the workflows talk to `documents`, which may wrap `store`.
pub fn stack_with_store(
    store: Arc<MemoryDocumentStore>,
    documents: Arc<dyn DocumentStoreService>,
) -> TestStack {
    let clock = Arc::new(ManualClock::new());
    let credentials = Arc::new(JwtCredentials::new(JWT_SECRET, Duration::days(7)));

    let adapters = Adapters {
        store: documents,
        clock: clock.clone(),
        passwords: Arc::new(fast_hasher()),
        credentials: credentials.clone() as Arc<dyn CredentialService>,
        codes: Arc::new(MemoryCodeStore::new(clock.clone())),
    };

    TestStack {
        state: Arc::new(AppState::new(adapters, policy())),
        store,
        clock,
        credentials,
    }
}
