//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use learning_core::entities::DocumentAdapter;
use learning_core::ports::{
    Clock, CredentialService, DocumentStoreService, OneTimeCodeService, PasswordHashingService,
};
use learning_core::workflows::{IdentityWorkflow, OneTimeCodePolicy, ProgressWorkflow};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityWorkflow,
    pub progress: ProgressWorkflow,
    pub credentials: Arc<dyn CredentialService>,
}

/// The concrete adapters the workflows are wired to.
pub struct Adapters {
    pub store: Arc<dyn DocumentStoreService>,
    pub clock: Arc<dyn Clock>,
    pub passwords: Arc<dyn PasswordHashingService>,
    pub credentials: Arc<dyn CredentialService>,
    pub codes: Arc<dyn OneTimeCodeService>,
}

impl AppState {
    pub fn new(adapters: Adapters, policy: OneTimeCodePolicy) -> Self {
        let Adapters {
            store,
            clock,
            passwords,
            credentials,
            codes,
        } = adapters;

        let identity = IdentityWorkflow::new(
            DocumentAdapter::new(store.clone(), clock.clone()),
            passwords,
            credentials.clone(),
            codes,
            clock.clone(),
            policy,
        );
        let progress = ProgressWorkflow::new(DocumentAdapter::new(store, clock.clone()), clock);

        Self {
            identity,
            progress,
            credentials,
        }
    }
}
