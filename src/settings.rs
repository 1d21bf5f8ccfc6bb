//! Connection settings for a remote contents server
//!
//! One mutable record shared by all operations of a drive. The owning layer
//! may rewrite `base_url` or the stored query parameters at any time, e.g.
//! when the user points the drive at a different server; operations that have
//! not yet started pick up the new values.

use reqwest::Client;

/// Default REST path prefix for the contents API
pub const DEFAULT_API_ENDPOINT: &str = "api/contents";

/// Path prefix the server exposes raw file downloads under
pub const FILES_ENDPOINT: &str = "files";

/// Cookie the server sets its anti-forgery token in
pub const XSRF_COOKIE: &str = "_xsrf";

/// Environment variable names for [`ConnectionSettings::from_env`]
pub const ENV_BASE_URL: &str = "JUPYTER_BASE_URL";
pub const ENV_TOKEN: &str = "JUPYTER_TOKEN";

/// Where and how to reach the remote server
///
/// `query_params` are appended to every request the drive makes; this is the
/// mechanism by which the remote server's access token travels when it is
/// not sent as a header. `cookies` hold cookies the surrounding layer has
/// received from the server, consulted for the anti-forgery token when
/// building download URLs.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Base URL of the remote server. Operations fail with
    /// [`DriveError::MissingBaseUrl`](crate::DriveError::MissingBaseUrl)
    /// while this is empty.
    pub base_url: String,

    /// Access token, sent as an `Authorization: token ...` header
    pub token: Option<String>,

    /// Extra query parameters appended to every request
    pub query_params: Vec<(String, String)>,

    /// Cookies known for the remote server
    pub cookies: Vec<(String, String)>,

    /// HTTP client used for all requests of this drive
    pub client: Client,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            query_params: Vec::new(),
            cookies: Vec::new(),
            client: Client::new(),
        }
    }
}

impl ConnectionSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read settings from `JUPYTER_BASE_URL` / `JUPYTER_TOKEN`
    ///
    /// Unset variables leave the corresponding field at its default; a
    /// missing base URL surfaces at call time, not here.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            settings.base_url = base_url;
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            settings.token = Some(token);
        }
        settings
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_query_param(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Look up a cookie by name
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(cookie_name, _)| cookie_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether a usable base URL is configured
    pub fn has_base_url(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}
