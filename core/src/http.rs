//! HTTP method selection.
//!
//! # Design
//! The four methods the builder has named constructors for get their own
//! variants; everything else (`HEAD`, `PATCH`, `OPTIONS`, extension methods)
//! travels as `Custom` and is validated only when the request is built, so
//! a bad token surfaces through the same short-circuit as every other
//! construction error.

use std::fmt;

use ureq::http::Method;

use crate::error::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Custom(String),
}

impl HttpMethod {
    /// Wire name of the method.
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Custom(name) => name,
        }
    }

    pub(crate) fn to_method(&self) -> Result<Method, Error> {
        match self {
            HttpMethod::Get => Ok(Method::GET),
            HttpMethod::Post => Ok(Method::POST),
            HttpMethod::Put => Ok(Method::PUT),
            HttpMethod::Delete => Ok(Method::DELETE),
            HttpMethod::Custom(name) => Method::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidMethod(name.clone())),
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(name: &str) -> Self {
        match name {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            other => HttpMethod::Custom(other.to_string()),
        }
    }
}

impl From<String> for HttpMethod {
    fn from(name: String) -> Self {
        HttpMethod::from(name.as_str())
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
