//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt from the retry orchestrator:
//!     → client.rs (join URL, default headers, request ID)
//!     → hooks.rs (inject bearer token)
//!     → transport.rs (send over reqwest, classify network failures)
//!     → response.rs (status check, JSON decode, error message extraction)
//!     → On 401: hooks.rs (clear session, run teardown)
//! ```
//!
//! # Design Decisions
//! - The network sits behind the `Transport` trait so the core is testable without sockets
//! - Authentication concerns are hooks; the core never navigates or renders

pub mod client;
pub mod hooks;
pub mod request;
pub mod response;
pub mod transport;

pub use client::HttpClient;
pub use hooks::{NoHooks, RequestHooks, Session};
pub use request::{TransportRequest, X_REQUEST_ID};
pub use response::TransportResponse;
pub use transport::{ReqwestTransport, Transport};
