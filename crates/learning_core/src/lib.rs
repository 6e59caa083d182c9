pub mod document;
pub mod domain;
pub mod entities;
pub mod ports;
pub mod scoring;
pub mod workflows;

pub use domain::{
    Language, LessonProgress, LessonSubmission, OneTimeCode, Preferences, PreferencesPatch,
    Progress, ProgressView, PublicUser, Stats, User,
};
pub use entities::{DocumentAdapter, Entity, ReadOptions, UpdateOptions, UpsertOutcome};
pub use ports::{
    Clock, CredentialService, Document, DocumentStoreService, OneTimeCodeService,
    PasswordHashingService, PortError, PortResult, StoredDocument, WriteOutcome,
};
pub use workflows::{
    Authenticated, IdentityWorkflow, OneTimeCodePolicy, ProgressWorkflow, WorkflowError,
    WorkflowResult,
};
