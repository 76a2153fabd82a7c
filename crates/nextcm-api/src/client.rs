// Central Manager HTTP client
//
// Wraps reqwest::Client with allow-list path validation, bearer-token
// session state, and a single refresh-and-retry pass on 401. Endpoint
// facades (devices.rs) are built on the public load/create/update/
// patch/delete methods.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::Error;
use crate::object::RestObject;
use crate::spec::{self, DEFAULT_SPEC_PATH};
use crate::transport::{TlsMode, TransportConfig};

// ── Configuration ───────────────────────────────────────────────────

/// Connection settings for [`Client::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Device name or address. A bare host is reached over HTTPS; an
    /// explicit `http://` or `https://` scheme is kept as given.
    pub device: String,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Artifact file that receives raw response bodies on API errors.
    pub debug: Option<String>,
    /// Override for the specification document location.
    pub spec_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Settings for `device` with the default transport options.
    pub fn new(
        device: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            device: device.into(),
            username: username.into(),
            password,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            debug: None,
            spec_path: None,
        }
    }
}

// ── Methods ─────────────────────────────────────────────────────────

/// HTTP verbs accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Parses the verbs the API supports; anything else is rejected
    /// before a request is built.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(Error::InvalidMethod(other.to_owned())),
        }
    }
}

// ── Session state ───────────────────────────────────────────────────

/// Immutable bearer-token snapshot.
///
/// Refreshing builds a new snapshot and swaps it in whole; tokens are
/// never mutated in place, so a reader always sees a consistent pair.
#[derive(Debug)]
struct Session {
    access_token: SecretString,
    refresh_token: SecretString,
    refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct LoginGrant {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct RefreshGrant {
    access_token: String,
}

// ── Client ──────────────────────────────────────────────────────────

/// Authenticated client for the Central Manager REST API.
///
/// Owns the HTTP session and the bearer-token pair. Every call is
/// validated against the allow-list loaded from the specification
/// document before a request is built, and a 401 response triggers
/// exactly one token refresh and one retry.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    valid_api_paths: Vec<Option<String>>,
    session: ArcSwap<Session>,
    debug: Option<String>,
}

impl Client {
    /// Connect to a device: load the spec allow-list, build the HTTP
    /// session, and log in.
    ///
    /// The credentials are consumed here and dropped once the token
    /// pair is issued; the client does not retain them.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        let ClientConfig {
            device,
            username,
            password,
            tls,
            timeout,
            debug,
            spec_path,
        } = config;

        let spec_path = spec_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SPEC_PATH));
        let valid_api_paths = spec::load_valid_paths(&spec_path)?;

        let transport = TransportConfig { tls, timeout };
        let http = transport.build_client()?;
        let base_url = device_base_url(&device)?;

        let session = login(&http, &base_url, &username, &password, debug.as_deref()).await?;

        Ok(Self {
            http,
            base_url,
            valid_api_paths,
            session: ArcSwap::from_pointee(session),
            debug,
        })
    }

    // ── Public API ──────────────────────────────────────────────────

    /// Dispatch by verb name.
    ///
    /// Unknown verbs fail with [`Error::InvalidMethod`] before any
    /// request is built.
    pub async fn call(&self, method: &str, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        let method = method.parse::<Method>()?;
        self.dispatch(method, path, body).await
    }

    /// Load one object or a collection of objects from the device.
    ///
    /// `GET <path>` -- the caller interprets the shape of the result
    /// (a single object's fields, or a collection wrapper).
    pub async fn load(&self, path: &str) -> Result<Value, Error> {
        self.dispatch(Method::Get, path, None).await
    }

    /// Load a single object and wrap it for structured access.
    ///
    /// Like [`load`](Self::load), but guarantees the mapping shape by
    /// returning a [`RestObject`].
    pub async fn load_object(&self, path: &str) -> Result<RestObject, Error> {
        let value = self.dispatch(Method::Get, path, None).await?;
        RestObject::new(value)
    }

    /// Create an object on the device. `POST <path>`
    pub async fn create(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.dispatch(Method::Post, path, Some(body)).await
    }

    /// Replace an object on the device. `PUT <path>`
    pub async fn update(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.dispatch(Method::Put, path, Some(body)).await
    }

    /// Partially modify an object on the device. `PATCH <path>`
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, Error> {
        self.dispatch(Method::Patch, path, Some(body)).await
    }

    /// Delete an object from the device. `DELETE <path>`
    pub async fn delete(&self, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        self.dispatch(Method::Delete, path, body).await
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The paths permitted by the loaded specification document, in
    /// document order. Entries without a public path stay as `None`.
    pub fn valid_api_paths(&self) -> &[Option<String>] {
        &self.valid_api_paths
    }

    /// When the access token was last refreshed. `None` until the
    /// first 401-triggered refresh.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.session.load().refreshed_at
    }

    /// The current access token.
    pub fn access_token(&self) -> SecretString {
        self.session.load().access_token.clone()
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Validate and issue a call, refreshing the access token once on
    /// a 401 response.
    async fn dispatch(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        if !self
            .valid_api_paths
            .iter()
            .any(|p| p.as_deref() == Some(path))
        {
            return Err(Error::InvalidPath(path.to_owned()));
        }

        let url = join_url(&self.base_url, path);

        let resp = self.send(method, &url, body).await?;
        let resp = if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            // One refresh, one retry. The retry goes out without the
            // original body, matching the established API behavior.
            debug!("401 from {url}, refreshing token and retrying");
            self.refresh_token().await?;
            self.send(method, &url, None).await?
        } else {
            resp
        };

        let status = resp.status();
        let text = resp.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(api_error(status, text, self.debug.as_deref()));
        }

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text.clone(),
        })
    }

    /// Build and send a single request with the current bearer token.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, Error> {
        debug!("{} {url}", method.as_str());

        let session = self.session.load();
        let mut req = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Patch => self.http.patch(url),
            Method::Delete => self.http.delete(url),
        };
        req = req.bearer_auth(session.access_token.expose_secret());
        if let Some(body) = body {
            req = req.json(body);
        }

        req.send().await.map_err(Error::Transport)
    }

    /// `POST /api/token-refresh` -- mint a new access token from the
    /// stored refresh token. The refresh token itself is not rotated.
    async fn refresh_token(&self) -> Result<(), Error> {
        let url = format!("{}/api/token-refresh", self.base_url);
        debug!("refreshing access token at {url}");

        let current = self.session.load_full();
        let body = json!({ "refresh_token": current.refresh_token.expose_secret() });

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(api_error(status, text, self.debug.as_deref()));
        }

        let grant: RefreshGrant =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        self.session.store(Arc::new(Session {
            access_token: SecretString::from(grant.access_token),
            refresh_token: current.refresh_token.clone(),
            refreshed_at: Some(Utc::now()),
        }));

        debug!("access token refreshed");
        Ok(())
    }
}

// ── Free helpers ────────────────────────────────────────────────────

/// `POST /api/login` -- exchange credentials for the bearer pair.
async fn login(
    http: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &SecretString,
    debug_artifact: Option<&str>,
) -> Result<Session, Error> {
    let url = format!("{base_url}/api/login");
    debug!("logging in at {url}");

    let body = json!({
        "username": username,
        "password": password.expose_secret(),
    });

    let resp = http.post(&url).json(&body).send().await?;
    let status = resp.status();
    let text = resp.text().await?;
    if status != reqwest::StatusCode::OK {
        return Err(api_error(status, text, debug_artifact));
    }

    let grant: LoginGrant = serde_json::from_str(&text).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: text.clone(),
    })?;

    debug!("login successful");
    Ok(Session {
        access_token: SecretString::from(grant.access_token),
        refresh_token: SecretString::from(grant.refresh_token),
        refreshed_at: None,
    })
}

/// Wrap a non-200 response, writing the raw body to the debug artifact
/// when one is configured.
fn api_error(status: reqwest::StatusCode, body: String, debug_artifact: Option<&str>) -> Error {
    if let Some(name) = debug_artifact {
        if let Err(e) = std::fs::write(name, &body) {
            warn!("failed to write debug artifact {name}: {e}");
        }
    }

    Error::Api {
        status: status.as_u16(),
        body,
        debug: debug_artifact.map(str::to_owned),
    }
}

/// Normalize the device argument into an origin base URL.
///
/// A bare host or address gets the HTTPS scheme; an explicit scheme is
/// honored (useful against plain-HTTP test servers).
fn device_base_url(device: &str) -> Result<String, Error> {
    let base = if device.contains("://") {
        device.trim_end_matches('/').to_owned()
    } else {
        format!("https://{device}")
    };
    url::Url::parse(&base)?;
    Ok(base)
}

/// Exactly one trailing slash is stripped; the API treats `/foo` and
/// `/foo/` as the same resource.
fn join_url(base: &str, path: &str) -> String {
    let path = path.strip_suffix('/').unwrap_or(path);
    format!("{base}{path}")
}
