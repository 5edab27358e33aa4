//! Identity module — bearer token verification and actor resolution
//!
//! Tokens are HS256 JWTs; the subject is looked up in a file-backed user
//! directory under `<base_dir>/users/`. Handlers receive the resolved actor
//! through the [`CurrentActor`] extractor.

pub mod handler;
pub mod resolver;
pub mod store;
pub mod token;
pub mod types;

pub use handler::{identity_router, IdentityState};
pub use resolver::{CurrentActor, IdentityResolver};
pub use store::{UserDirectory, UserStore};
pub use token::{JwtService, TokenVerifier};
pub use types::{Actor, Claims, Role, UserRecord};
