//! Chainable request configuration.
//!
//! # Design
//! `RequestBuilder` is an owned value threaded through each call, so it is
//! naturally single-owner. Configuration errors (bad header, unserializable
//! JSON) do not panic or break the chain: the first one is parked in the
//! builder and returned when the request is finalized.
//!
//! Body encodings are stored side by side and the one that goes on the wire
//! is chosen at finalize time: multipart if a multipart form was set,
//! otherwise whatever the `Content-Type` header names.

use serde::Serialize;
use tracing::trace;
use ureq::http::header::CONTENT_TYPE;
use ureq::http::{HeaderMap, HeaderName, HeaderValue, Request};

use crate::error::Error;
use crate::http::HttpMethod;
use crate::multipart::MultipartForm;
use crate::response::Response;
use crate::transport::Transport;
use crate::values::Values;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Start a `GET` request.
pub fn get(url: impl Into<String>) -> RequestBuilder {
    RequestBuilder::get(url)
}

/// Start a `POST` request.
pub fn post(url: impl Into<String>) -> RequestBuilder {
    RequestBuilder::post(url)
}

/// Start a `PUT` request.
pub fn put(url: impl Into<String>) -> RequestBuilder {
    RequestBuilder::put(url)
}

/// Start a `DELETE` request.
pub fn delete(url: impl Into<String>) -> RequestBuilder {
    RequestBuilder::delete(url)
}

/// Start a request with any method, optionally on a caller-supplied transport.
pub fn request(
    url: impl Into<String>,
    method: impl Into<HttpMethod>,
    transport: Option<Transport>,
) -> RequestBuilder {
    RequestBuilder::request(url, method, transport)
}

/// Which encoding ends up on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Multipart,
    Json,
    Form,
    Empty,
}

impl BodyKind {
    fn select(headers: &HeaderMap, has_multipart: bool) -> Self {
        if has_multipart {
            return BodyKind::Multipart;
        }
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if content_type.starts_with(CONTENT_TYPE_JSON) {
            BodyKind::Json
        } else if content_type.starts_with(CONTENT_TYPE_FORM) {
            BodyKind::Form
        } else {
            BodyKind::Empty
        }
    }
}

/// Accumulates method, URL, query, headers and body for one request.
#[derive(Debug)]
pub struct RequestBuilder {
    transport: Option<Transport>,
    method: HttpMethod,
    url: String,
    headers: HeaderMap,
    params: Values,
    form: Option<Values>,
    json: Option<serde_json::Value>,
    multipart: Option<MultipartForm>,
    error: Option<Error>,
}

impl RequestBuilder {
    pub fn new(method: impl Into<HttpMethod>, url: impl Into<String>) -> Self {
        Self {
            transport: None,
            method: method.into(),
            url: url.into(),
            headers: HeaderMap::new(),
            params: Values::new(),
            form: None,
            json: None,
            multipart: None,
            error: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Any method, e.g. `HEAD` or `OPTIONS`. `None` uses the default transport.
    pub fn request(
        url: impl Into<String>,
        method: impl Into<HttpMethod>,
        transport: Option<Transport>,
    ) -> Self {
        let mut builder = Self::new(method, url);
        builder.transport = transport;
        builder
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Merge query parameters; keys already present are replaced.
    pub fn params(mut self, params: Values) -> Self {
        self.params.merge(params);
        self
    }

    /// Set a single query parameter, replacing earlier values of `key`.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Set a header, replacing earlier values of the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match parse_header(name.as_ref(), value.as_ref()) {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(err) => self.record(err),
        }
        self
    }

    /// Copy every header in `headers`; names already present are replaced
    /// with all values from `headers`.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for name in headers.keys() {
            self.headers.remove(name);
        }
        for (name, value) in headers.iter() {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    /// URL-encoded form body. Sets `Content-Type: application/x-www-form-urlencoded`.
    pub fn form(mut self, form: Values) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_FORM));
        self.form = Some(form);
        self
    }

    /// JSON body. Sets `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        match serde_json::to_value(value) {
            Ok(value) => self.json = Some(value),
            Err(err) => self.record(Error::Json(err)),
        }
        self
    }

    /// Multipart body. Its `Content-Type`, boundary included, is set at
    /// finalize time and overrides any configured one.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.multipart = Some(form);
        self
    }

    pub fn body_kind(&self) -> BodyKind {
        BodyKind::select(&self.headers, self.multipart.is_some())
    }

    /// Assemble the request without sending it. Attachments are read here.
    pub fn build(self) -> Result<Request<Vec<u8>>, Error> {
        let RequestBuilder {
            method,
            url,
            mut headers,
            params,
            form,
            json,
            multipart,
            error,
            ..
        } = self;

        if let Some(err) = error {
            return Err(err);
        }
        let method = method.to_method()?;
        let url = append_query(url, &params);

        let kind = BodyKind::select(&headers, multipart.is_some());
        trace!(?kind, %url, "encoding request body");
        let body = match (kind, multipart) {
            (BodyKind::Multipart, Some(multipart)) => {
                let (body, content_type) = multipart.encode()?;
                let value = HeaderValue::from_str(&content_type).map_err(|e| Error::InvalidHeader {
                    name: CONTENT_TYPE.to_string(),
                    reason: e.to_string(),
                })?;
                headers.insert(CONTENT_TYPE, value);
                body
            }
            (BodyKind::Json, _) => {
                serde_json::to_vec(&json.unwrap_or(serde_json::Value::Null))?
            }
            (BodyKind::Form, _) => form.map(|f| f.encode().into_bytes()).unwrap_or_default(),
            _ => Vec::new(),
        };

        let mut request = Request::builder().method(method).uri(url).body(body)?;
        *request.headers_mut() = headers;
        Ok(request)
    }

    /// Finalize: build, run interceptors and execute on the transport.
    pub fn send(mut self) -> Response {
        let transport = self.transport.take().unwrap_or_else(Transport::global);
        let result = self
            .build()
            .and_then(|request| transport.execute(request));
        Response::from(result)
    }

    fn record(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let invalid = |reason: String| Error::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
    Ok((header_name, header_value))
}

/// Append the encoded query, joining with `&` when `url` already has one.
fn append_query(mut url: String, params: &Values) -> String {
    if params.is_empty() {
        return url;
    }
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&params.encode());
    url
}
