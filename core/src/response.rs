//! Response wrapper with single-use body decoders.
//!
//! # Design
//! `Response` holds either the transport response or the first error hit
//! while building or sending the request. Status checks consume and return
//! the wrapper so they chain; the decoders (`bytes`, `text`, `json`,
//! `save`) consume it for good, so the body stream is read exactly once
//! and a second decode is rejected by the compiler:
//!
//! ```compile_fail
//! let response = requests_core::get("http://127.0.0.1:1/").send();
//! let first = response.bytes();
//! let second = response.bytes();
//! ```
//!
//! Every decoder returns a recorded error unchanged without touching the
//! network or the filesystem.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use ureq::http::{self, HeaderMap, StatusCode};
use ureq::Body;

use crate::error::Error;

/// Outcome of sending a request.
pub struct Response {
    inner: Result<http::Response<Body>, Error>,
}

impl Response {
    /// The recorded error, if any stage failed.
    pub fn error(&self) -> Option<&Error> {
        self.inner.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.inner.is_ok()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.inner.as_ref().ok().map(http::Response::status)
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.inner.as_ref().ok().map(http::Response::headers)
    }

    /// Fail unless the status is exactly `200 OK`.
    pub fn check_status_ok(self) -> Self {
        self.check_status(|status| status == StatusCode::OK, "200")
    }

    /// Fail unless the status is in `[200, 300)`.
    pub fn check_status_2xx(self) -> Self {
        self.check_status(|status| status.is_success(), "2xx")
    }

    fn check_status(self, accept: fn(StatusCode) -> bool, expected: &'static str) -> Self {
        let inner = match self.inner {
            Ok(response) if !accept(response.status()) => {
                let status = response.status().as_u16();
                debug!(status, expected, "status check failed");
                Err(Error::Status { status, expected })
            }
            other => other,
        };
        Self { inner }
    }

    /// Read the whole body into memory.
    pub fn bytes(self) -> Result<Vec<u8>, Error> {
        let response = self.inner?;
        let mut buf = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut buf)
            .map_err(Error::Read)?;
        trace!(len = buf.len(), "read response body");
        Ok(buf)
    }

    /// Read the whole body as UTF-8 text.
    pub fn text(self) -> Result<String, Error> {
        Ok(String::from_utf8(self.bytes()?)?)
    }

    /// Read the whole body and deserialize it as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        let bytes = self.bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Stream the body into `path`, creating or truncating the file.
    pub fn save(self, path: impl AsRef<Path>) -> Result<(), Error> {
        let response = self.inner?;
        let path = path.as_ref();
        let wrap = |source| Error::Save {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(wrap)?;
        let mut reader = response.into_body().into_reader();
        let written = io::copy(&mut reader, &mut file).map_err(wrap)?;
        debug!(path = %path.display(), written, "saved response body");
        Ok(())
    }

    /// The raw transport response, for callers that read the body themselves.
    pub fn into_inner(self) -> Result<http::Response<Body>, Error> {
        self.inner
    }
}

impl From<Result<http::Response<Body>, Error>> for Response {
    fn from(inner: Result<http::Response<Body>, Error>) -> Self {
        Self { inner }
    }
}

impl From<Error> for Response {
    fn from(err: Error) -> Self {
        Self { inner: Err(err) }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Ok(response) => f
                .debug_struct("Response")
                .field("status", &response.status())
                .field("headers", response.headers())
                .finish_non_exhaustive(),
            Err(err) => f.debug_struct("Response").field("error", err).finish(),
        }
    }
}
