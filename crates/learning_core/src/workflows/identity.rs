//! crates/learning_core/src/workflows/identity.rs
//!
//! Sign-up, password login, one-time-code login and profile operations.

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use tracing::{info, instrument, warn};

use super::{Authenticated, WorkflowError, WorkflowResult};
use crate::domain::{OneTimeCode, PreferencesPatch, PublicUser, User, DEFAULT_DISPLAY_NAME};
use crate::entities::{
    DocumentAdapter, ReadOptions, UpdateOptions, UpsertOutcome, UserDraft, UserFilter, UserInsert,
    UserPatch, UserSet,
};
use crate::ports::{
    Clock, CredentialService, OneTimeCodeService, PasswordHashingService, WriteOutcome,
};

const CODE_DIGITS: usize = 6;

/// How one-time codes are minted.
#[derive(Debug, Clone)]
pub struct OneTimeCodePolicy {
    pub ttl: Duration,
    /// Hands out this code instead of a random one. Development only.
    pub fixed_code: Option<String>,
    /// Wrong guesses allowed before the code is thrown away.
    pub max_attempts: u32,
}

impl Default for OneTimeCodePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            fixed_code: None,
            max_attempts: 5,
        }
    }
}

impl OneTimeCodePolicy {
    fn mint(&self) -> String {
        match &self.fixed_code {
            Some(code) => code.clone(),
            None => {
                let mut rng = rand::thread_rng();
                (0..CODE_DIGITS)
                    .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                    .collect()
            }
        }
    }
}

#[derive(Clone)]
pub struct IdentityWorkflow {
    users: DocumentAdapter<User>,
    passwords: Arc<dyn PasswordHashingService>,
    credentials: Arc<dyn CredentialService>,
    codes: Arc<dyn OneTimeCodeService>,
    clock: Arc<dyn Clock>,
    policy: OneTimeCodePolicy,
}

impl IdentityWorkflow {
    pub fn new(
        users: DocumentAdapter<User>,
        passwords: Arc<dyn PasswordHashingService>,
        credentials: Arc<dyn CredentialService>,
        codes: Arc<dyn OneTimeCodeService>,
        clock: Arc<dyn Clock>,
        policy: OneTimeCodePolicy,
    ) -> Self {
        Self {
            users,
            passwords,
            credentials,
            codes,
            clock,
            policy,
        }
    }

    /// Creates a password account. The email must not be registered yet.
    #[instrument(skip_all)]
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> WorkflowResult<Authenticated> {
        let filter = UserFilter::Email(email.to_string());
        if self.users.find_one(&filter, ReadOptions::default()).await?.is_some() {
            warn!("Signup rejected: email already registered");
            return Err(WorkflowError::Conflict);
        }

        let password_hash = self.passwords.hash(password).await?;
        let draft = UserDraft {
            email: Some(email.to_string()),
            password_hash: Some(password_hash),
            name_english: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            ..Default::default()
        };

        match self.users.create(draft).await? {
            WriteOutcome::Written(user) => {
                info!(user_id = %user.id, "User signed up");
                self.authenticated(user)
            }
            WriteOutcome::AlreadyExists => {
                warn!("Signup rejected: email registered concurrently");
                Err(WorkflowError::Conflict)
            }
        }
    }

    /// Password login. An unknown email and a wrong password fail the same way.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> WorkflowResult<Authenticated> {
        let filter = UserFilter::Email(email.to_string());
        let Some(user) = self.users.find_one(&filter, ReadOptions::with_secret()).await? else {
            warn!("Login failed");
            return Err(WorkflowError::InvalidCredentials);
        };

        let verified = match user.password_hash.as_deref() {
            Some(hash) => self.passwords.verify(password, hash).await?,
            None => false,
        };
        if !verified {
            warn!("Login failed");
            return Err(WorkflowError::InvalidCredentials);
        }

        let now = self.clock.now();
        let user = self
            .users
            .find_by_id_and_update(&user.id, &UserPatch::last_login(now), true)
            .await?
            .ok_or_else(|| {
                WorkflowError::Server(format!("user {} vanished during login", user.id))
            })?;

        info!(user_id = %user.id, "User logged in");
        self.authenticated(user)
    }

    /// Mints a one-time code for `mobile`, replacing any earlier one.
    #[instrument(skip(self))]
    pub async fn request_code(&self, mobile: &str) -> WorkflowResult<()> {
        let code = OneTimeCode {
            code: self.policy.mint(),
            expires_at: self.clock.now() + self.policy.ttl,
        };
        self.codes.store(mobile, code).await?;
        info!("One-time code issued");
        Ok(())
    }

    /// Verifies a one-time code and logs the learner in, creating the account on
    /// first use.
    ///
    /// Two first-time verifications for the same number can both miss the lookup
    /// and race to insert. The loser sees `AlreadyExists` and adopts the winner's
    /// document with a single re-read.
    #[instrument(skip(self, code))]
    pub async fn verify_code(&self, mobile: &str, code: &str) -> WorkflowResult<Authenticated> {
        let now = self.clock.now();
        match self.codes.fetch(mobile).await? {
            Some(stored) if stored.is_expired(now) => {
                self.codes.discard(mobile).await?;
                warn!("Expired one-time code");
                return Err(WorkflowError::InvalidOrExpiredCode);
            }
            Some(stored) if stored.code == code => {}
            Some(_) => {
                let failures = self.codes.record_failure(mobile).await?;
                if failures >= self.policy.max_attempts {
                    self.codes.discard(mobile).await?;
                    warn!(failures, "One-time code discarded after repeated wrong guesses");
                } else {
                    warn!(failures, "Invalid one-time code");
                }
                return Err(WorkflowError::InvalidOrExpiredCode);
            }
            None => {
                warn!("No one-time code outstanding");
                return Err(WorkflowError::InvalidOrExpiredCode);
            }
        }

        let filter = UserFilter::Mobile(mobile.to_string());
        let patch = UserPatch {
            set: UserSet {
                last_login: Some(now),
                ..Default::default()
            },
            set_on_insert: UserInsert {
                name_english: Some(DEFAULT_DISPLAY_NAME.to_string()),
                join_date: Some(now),
            },
        };
        let options = UpdateOptions {
            upsert: true,
            return_updated: true,
            ..Default::default()
        };

        let user = match self.users.find_one_and_update(&filter, &patch, options).await? {
            UpsertOutcome::Updated(user) => user,
            UpsertOutcome::Inserted(user) => {
                info!(user_id = %user.id, "User created by one-time code");
                user
            }
            UpsertOutcome::AlreadyExists => {
                warn!("Concurrent first login detected, re-reading user");
                self.users
                    .find_one(&filter, ReadOptions::default())
                    .await?
                    .ok_or_else(|| {
                        WorkflowError::Server("user missing after duplicate insert".to_string())
                    })?
            }
            UpsertOutcome::NotFound => {
                return Err(WorkflowError::Server("upsert returned no document".to_string()))
            }
        };

        self.codes.discard(mobile).await?;
        self.authenticated(user)
    }

    pub async fn get_by_id(&self, user_id: &str) -> WorkflowResult<PublicUser> {
        self.users
            .find_by_id(user_id, ReadOptions::default())
            .await?
            .map(PublicUser::from)
            .ok_or(WorkflowError::NotFound)
    }

    /// Applies the allow-listed preference fields present in `patch`.
    #[instrument(skip(self, patch))]
    pub async fn patch_preferences(
        &self,
        user_id: &str,
        patch: PreferencesPatch,
    ) -> WorkflowResult<PublicUser> {
        self.users
            .find_by_id_and_update(user_id, &UserPatch::preferences(patch), true)
            .await?
            .map(PublicUser::from)
            .ok_or(WorkflowError::NotFound)
    }

    fn authenticated(&self, user: User) -> WorkflowResult<Authenticated> {
        let token = self.credentials.issue(&user.id)?;
        Ok(Authenticated {
            token,
            user: user.into(),
        })
    }
}
