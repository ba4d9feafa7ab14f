//! User identity records and the credential lifecycle.
//!
//! The [`CredentialStore`] owns user records exclusively: it validates input,
//! hashes passwords with Argon2id and hands out [`Profile`] projections that
//! carry no secret fields. Storage goes through the [`UserRepository`] seam,
//! backed by PostgreSQL in production and by an in-memory map otherwise.

mod error;
mod memory;
mod model;
mod password;
mod postgres;
mod repo;
mod store;
mod validate;

pub use error::{AuthError, RepoError};
pub use memory::MemoryUserRepository;
pub use model::{Profile, UserId, UserRecord, UserSummary};
pub use password::Argon2Hasher;
pub use postgres::PgUserRepository;
pub use repo::UserRepository;
pub use store::CredentialStore;
pub use validate::{normalize_email, valid_email, MIN_PASSWORD_LEN, MIN_USERNAME_LEN};

pub(crate) use validate::check_password;
