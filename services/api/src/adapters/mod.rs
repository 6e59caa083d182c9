pub mod clock;
pub mod codes;
pub mod db;
pub mod jwt;
pub mod memory;
pub mod password;

pub use clock::SystemClock;
pub use codes::MemoryCodeStore;
pub use db::PgDocumentStore;
pub use jwt::JwtCredentials;
pub use memory::MemoryDocumentStore;
pub use password::Argon2Hasher;
