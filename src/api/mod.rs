//! Rop backend API module.
//!
//! A typed client over the platform's REST surface: session-token auth
//! with server-pushed refresh, and endpoint wrappers for forms,
//! organizations and departments. The backend owns all submission and
//! branch-evaluation logic; this module only consumes its payloads.

pub mod auth;
pub mod client;
pub mod forms;
pub mod models;
pub mod org;
pub mod session;

pub use auth::AuthClient;
pub use client::{RopClient, DEFAULT_API_BASE, REFRESH_TOKEN_HEADER, TOKEN_HEADER};
pub use forms::FormPatch;
pub use models::{FormSummary, Org};
pub use session::{empty_handle, Claims, Session, SessionHandle};
