//! services/api/src/adapters/codes.rs
//!
//! Process-local storage for one-time codes. Codes are not shared between
//! instances and do not survive a restart; a multi-instance deployment needs an
//! external implementation of `OneTimeCodeService`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use learning_core::domain::OneTimeCode;
use learning_core::ports::{Clock, OneTimeCodeService, PortResult};
use tokio::sync::RwLock;

struct Entry {
    code: OneTimeCode,
    failures: u32,
}

pub struct MemoryCodeStore {
    codes: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCodeStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl OneTimeCodeService for MemoryCodeStore {
    async fn store(&self, mobile: &str, code: OneTimeCode) -> PortResult<()> {
        let now = self.clock.now();
        let mut codes = self.codes.write().await;
        // Sweep codes nobody came back for.
        codes.retain(|_, entry| !entry.code.is_expired(now));
        codes.insert(mobile.to_string(), Entry { code, failures: 0 });
        Ok(())
    }

    async fn fetch(&self, mobile: &str) -> PortResult<Option<OneTimeCode>> {
        Ok(self.codes.read().await.get(mobile).map(|entry| entry.code.clone()))
    }

    async fn discard(&self, mobile: &str) -> PortResult<()> {
        self.codes.write().await.remove(mobile);
        Ok(())
    }

    async fn record_failure(&self, mobile: &str) -> PortResult<u32> {
        let mut codes = self.codes.write().await;
        Ok(codes.get_mut(mobile).map_or(0, |entry| {
            entry.failures += 1;
            entry.failures
        }))
    }
}
