//! Fluent, blocking HTTP requests.
//!
//! # Overview
//! Chain the configuration of a request (method, URL, query, headers and
//! one body encoding), `send()` it, then decode the response once:
//!
//! ```no_run
//! use requests_core::Values;
//!
//! let text = requests_core::get("http://127.0.0.1:8080/ping")
//!     .params(Values::from([("param1", "value1"), ("param2", "123")]))
//!     .send()
//!     .check_status_2xx()
//!     .text()?;
//! # Ok::<(), requests_core::Error>(())
//! ```
//!
//! # Design
//! - `RequestBuilder` accumulates configuration and parks the first error
//!   instead of failing mid-chain.
//! - Body encodings (URL-encoded form, JSON, multipart) are stored side by
//!   side; the one on the wire is picked at finalize time.
//! - All I/O goes through a `Transport` (a ureq agent plus interceptors).
//!   Requests without an explicit transport use the process-wide default.
//! - `Response` carries either the transport response or the first error
//!   and is consumed by exactly one decoder.

pub mod builder;
pub mod error;
pub mod http;
pub mod multipart;
pub mod response;
pub mod transport;
pub mod values;

pub use builder::{delete, get, post, put, request, BodyKind, RequestBuilder};
pub use error::{BoxError, Error, Result};
pub use http::HttpMethod;
pub use multipart::{MultipartForm, MultipartWriter};
pub use response::Response;
pub use transport::{add_request_interceptor, Interceptor, Transport, TransportConfig};
pub use values::Values;
