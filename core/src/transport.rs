//! Transport context: the blocking HTTP agent plus request interceptors.
//!
//! # Design
//! Every request executes through a `Transport`. Callers that need a custom
//! timeout or their own interceptors build one and hand it to the request
//! builder; everyone else gets a clone of the process-wide default, which
//! is created lazily from `TransportConfig::from_env()` and can be extended
//! with `add_request_interceptor`.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, warn};
use ureq::http::{Method, Request, Response};
use ureq::{Agent, Body};

use crate::error::{BoxError, Error};

/// Callback run against every outgoing request right before it is sent.
/// Returning `Err` aborts the send.
pub type Interceptor = Arc<dyn Fn(&mut Request<Vec<u8>>) -> Result<(), BoxError> + Send + Sync>;

/// Settings for the agent behind a `Transport`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound for a whole request, connect through body. `None` waits forever.
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl TransportConfig {
    pub const TIMEOUT_ENV: &'static str = "REQUESTS_TIMEOUT_SECS";
    pub const USER_AGENT_ENV: &'static str = "REQUESTS_USER_AGENT";

    /// Read `REQUESTS_TIMEOUT_SECS` and `REQUESTS_USER_AGENT`. Unset or
    /// unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout = lookup(Self::TIMEOUT_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let user_agent = lookup(Self::USER_AGENT_ENV).filter(|ua| !ua.trim().is_empty());
        Self {
            timeout,
            user_agent,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// HTTP agent plus the interceptors that run before each send.
#[derive(Clone)]
pub struct Transport {
    agent: Agent,
    interceptors: Vec<Interceptor>,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Self {
        let mut builder = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        Self::with_agent(builder.build().new_agent())
    }

    /// Wrap an agent the caller configured. The agent should be built with
    /// `http_status_as_error(false)` so that 4xx/5xx responses reach the
    /// status checks instead of failing as transport errors.
    pub fn with_agent(agent: Agent) -> Self {
        Self {
            agent,
            interceptors: Vec::new(),
        }
    }

    /// Clone of the process-wide default transport.
    pub fn global() -> Transport {
        default_transport().read().clone()
    }

    /// Replace the process-wide default transport.
    pub fn set_global(transport: Transport) {
        *default_transport().write() = transport;
    }

    pub fn add_interceptor<F>(&mut self, interceptor: F)
    where
        F: Fn(&mut Request<Vec<u8>>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
    }

    pub fn with_interceptor<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(&mut Request<Vec<u8>>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.add_interceptor(interceptor);
        self
    }

    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// Run the interceptors in registration order, then execute the request.
    /// An empty body on `GET`, `HEAD`, `DELETE`, `OPTIONS`, `TRACE` or
    /// `CONNECT` goes out as no body at all; other methods send
    /// `Content-Length: 0`.
    pub fn execute(&self, mut request: Request<Vec<u8>>) -> Result<Response<Body>, Error> {
        for interceptor in &self.interceptors {
            if let Err(err) = interceptor(&mut request) {
                warn!(path = request.uri().path(), error = %err, "interceptor rejected request");
                return Err(Error::Interceptor(err));
            }
        }

        let method = request.method().clone();
        let path = request.uri().path().to_string();
        debug!(%method, %path, body_len = request.body().len(), "sending request");

        let result = if request.body().is_empty() && forbids_body(&method) {
            self.agent.run(request.map(|_| ()))
        } else {
            self.agent.run(request)
        };

        match result {
            Ok(response) => {
                debug!(%method, %path, status = response.status().as_u16(), "received response");
                Ok(response)
            }
            Err(err) => {
                warn!(%method, %path, error = %err, "transport error");
                Err(Error::Transport(err))
            }
        }
    }
}

fn forbids_body(method: &Method) -> bool {
    [
        Method::GET,
        Method::HEAD,
        Method::DELETE,
        Method::OPTIONS,
        Method::TRACE,
        Method::CONNECT,
    ]
    .contains(method)
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

fn default_transport() -> &'static RwLock<Transport> {
    static DEFAULT: OnceLock<RwLock<Transport>> = OnceLock::new();
    DEFAULT.get_or_init(|| RwLock::new(Transport::new(&TransportConfig::from_env())))
}

/// Register an interceptor on the process-wide default transport. It runs
/// for every later request that does not bring its own `Transport`.
pub fn add_request_interceptor<F>(interceptor: F)
where
    F: Fn(&mut Request<Vec<u8>>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    default_transport().write().add_interceptor(interceptor);
}
