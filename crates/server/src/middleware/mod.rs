//! HTTP middleware stack for the ratings API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. CORS (configured origins only)
//! 4. Request ID (propagate or generate `x-request-id`)
//! 5. Security headers
//! 6. Rate limiting on login and signup (governor)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireAuth`] and [`Authorized`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{Authorized, Guard, RequireAuth};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
