//! # LoginUser Core
//!
//! Everything behind the login-user extractor that does not touch the
//! network.
//!
//! A handler asks for "the user of this request". Answering takes three
//! collaborators, all defined here:
//! - [`SessionStore`]: where live sessions are kept.
//! - [`Resolver`]: maps a presented [`Credential`] to a [`Principal`].
//! - [`FailurePolicy`]: decides whether a bad credential means "anonymous"
//!   or "refuse the request".
//!
//! ```
//! use loginuser_core::{
//!     Credential, MemoryStore, Principal, Resolver, SessionPolicy, SessionUser, Timestamp,
//! };
//! use std::sync::Arc;
//!
//! let resolver = Resolver::new(Arc::new(MemoryStore::default()), SessionPolicy::default());
//! let user = SessionUser::new("Alice", "alice@example.com");
//! let record = resolver.issue(user.clone(), Timestamp(0)).expect("memory store");
//!
//! let credential = Credential::Cookie(record.id.to_string());
//! let principal = resolver.resolve(Some(&credential), Timestamp(1));
//! assert_eq!(principal, Ok(Principal::Authenticated(user)));
//! ```

pub mod error;
pub mod principal;
pub mod resolve;
pub mod seed;
pub mod session;
pub mod store;

pub use error::{ResolveError, SeedError, SessionIdError, StoreError, UserError};
pub use principal::{Principal, Role, SessionUser};
pub use resolve::{Credential, CredentialSource, FailurePolicy, Resolver, SessionPolicy};
pub use seed::{SeedFile, SeedSession, parse_seeds};
pub use session::{DEFAULT_TTL_SECS, SESSION_ID_LEN, SessionId, SessionRecord, Timestamp};
pub use store::{DEFAULT_MAX_SESSIONS, MemoryStore, SessionStore, StoreStats};
