//! App Store Connect API client
//!
//! Every resource call funnels through [`Client::request`]: sign a token,
//! build the URL, send, parse, classify.

use std::sync::Arc;
use std::time::Duration;

use appconnect_core::config::{session_file, validate_config, ENV_APP_ID, ENV_BUNDLE_ID};
use appconnect_core::{ConfigError, ConnectConfig};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::classify::classify;
use crate::error::{ApiError, Result};
use crate::jsonapi::{Document, Resource};
use crate::session::Session;
use crate::token::{TokenCache, TokenGenerator};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// App Store Connect API client
pub struct Client {
    config: ConnectConfig,
    transport: Arc<dyn Transport>,
    tokens: TokenCache,
    session: Option<Session>,
    api_base: Url,
    web_base: Url,
}

impl Client {
    /// Build a client over HTTPS.
    ///
    /// Validates the configuration and loads the signing key first, so a
    /// bad credential bundle fails here rather than on the first request.
    /// When the config carries no session, the cached session file is used.
    pub fn new(mut config: ConnectConfig) -> Result<Self> {
        validate_config(&config)?;

        if config.session.is_none() {
            if let Some(path) = session_file() {
                if let Some(session) = Session::from_file(&path)? {
                    debug!(path = %path.display(), "using cached web session");
                    config.session = Some(session.cookie_header());
                }
            }
        }

        let transport = ReqwestTransport::new(
            config.tls,
            config.timeout_secs.map(Duration::from_secs),
        )?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a client over a custom transport
    pub fn with_transport(config: ConnectConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        validate_config(&config)?;
        let generator = TokenGenerator::from_credentials(&config.credentials)?;

        let api_base = parse_base(&config.api_base_url, "api_base_url")?;
        let web_base = parse_base(&config.web_base_url, "web_base_url")?;
        let session = config.session.as_deref().and_then(Session::parse);

        Ok(Self {
            config,
            transport,
            tokens: TokenCache::new(generator),
            session,
            api_base,
            web_base,
        })
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Configured app ID
    pub fn app_id(&self) -> Result<&str> {
        self.config
            .credentials
            .app_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField(ENV_APP_ID.to_string()).into())
    }

    /// Configured bundle identifier
    pub fn bundle_id(&self) -> Result<&str> {
        self.config
            .credentials
            .bundle_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField(ENV_BUNDLE_ID.to_string()).into())
    }

    /// Current bearer token
    pub fn bearer_token(&self) -> Result<String> {
        self.tokens.bearer()
    }

    /// Absolute URL for an API path.
    ///
    /// Paths are relative to the v1 base; a path starting with `/v2/` is
    /// resolved against the v2 API instead.
    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = self.api_base.as_str().trim_end_matches('/');
        let full = match path.strip_prefix("/v2/") {
            Some(rest) => format!("{}/v2/{}", base.trim_end_matches("/v1"), rest),
            None => format!("{}{}", base, path),
        };

        let mut url = Url::parse(&full)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Issue an API request and return the parsed body.
    ///
    /// Fails with a classified [`ApiError`] when the status is 400 or above
    /// or the body carries JSON:API errors. An empty body parses as `null`.
    #[instrument(skip(self, method, params, body), fields(method = %method))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path, params)?;
        self.send_api(method, url, path, body).await
    }

    async fn send_api(&self, method: Method, url: Url, path: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.tokens.bearer()?;

        let mut request = HttpRequest::new(method, url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = self.transport.execute(request).await?;
        parse_response(path, response)
    }

    /// GET one page of a collection
    pub async fn get<A>(&self, path: &str, params: &[(&str, &str)]) -> Result<Document<Vec<Resource<A>>>>
    where
        A: DeserializeOwned + Default,
    {
        let value = self.request(Method::GET, path, params, None).await?;
        Document::from_value(value)
    }

    /// GET every page of a collection, following `links.next`
    pub async fn get_all<A>(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Resource<A>>>
    where
        A: DeserializeOwned + Default,
    {
        let mut page: Document<Vec<Resource<A>>> = self.get(path, params).await?;
        let mut resources = std::mem::take(&mut page.data);

        while let Some(next) = page.next_page() {
            let url = Url::parse(next)?;
            debug!(url = %url, "fetching next page");
            let value = self.send_api(Method::GET, url, path, None).await?;
            page = Document::from_value(value)?;
            resources.append(&mut page.data);
        }

        Ok(resources)
    }

    /// GET a single resource
    pub async fn get_one<A>(&self, path: &str, params: &[(&str, &str)]) -> Result<Resource<A>>
    where
        A: DeserializeOwned + Default,
    {
        let value = self.request(Method::GET, path, params, None).await?;
        Ok(Document::<Resource<A>>::from_value(value)?.data)
    }

    /// GET a to-one relationship whose `data` may be `null`
    pub async fn get_optional<A>(&self, path: &str, params: &[(&str, &str)]) -> Result<Option<Resource<A>>>
    where
        A: DeserializeOwned + Default,
    {
        let value = self.request(Method::GET, path, params, None).await?;
        Ok(Document::<Option<Resource<A>>>::from_value(value)?.data)
    }

    /// POST a body and decode the created resource
    pub async fn post<A>(&self, path: &str, body: &Value) -> Result<Resource<A>>
    where
        A: DeserializeOwned + Default,
    {
        let value = self.request(Method::POST, path, &[], Some(body)).await?;
        Ok(Document::<Resource<A>>::from_value(value)?.data)
    }

    /// PATCH a body and decode the updated resource
    pub async fn patch<A>(&self, path: &str, body: &Value) -> Result<Resource<A>>
    where
        A: DeserializeOwned + Default,
    {
        let value = self.request(Method::PATCH, path, &[], Some(body)).await?;
        Ok(Document::<Resource<A>>::from_value(value)?.data)
    }

    /// Send a request whose response body is ignored (relationship edits)
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<()> {
        self.request(method, path, &[], body).await.map(|_| ())
    }

    /// DELETE a resource
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await
    }

    /// Request against the website API.
    ///
    /// Uses the web session when one is configured and the bearer token
    /// otherwise. A 401/403 becomes [`ApiError::SessionRequired`].
    #[instrument(skip(self, params))]
    pub async fn web_request(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let base = self.web_base.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}{}", base, path))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let request = HttpRequest::new(Method::GET, url).header("Accept", "application/json");
        let request = match &self.session {
            Some(session) => request.header("Cookie", session.cookie_header()),
            None => {
                debug!("no web session, falling back to bearer token");
                request.header("Authorization", format!("Bearer {}", self.tokens.bearer()?))
            }
        };

        let response = self.transport.execute(request).await?;
        if matches!(response.status, 401 | 403) {
            warn!(status = response.status, "web session request rejected");
            return Err(session_error(response.status, self.has_session()).into());
        }

        parse_response(path, response)
    }
}

fn parse_base(value: &str, field: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| ConfigError::invalid(field, e.to_string()).into())
}

fn parse_response(path: &str, response: HttpResponse) -> Result<Value> {
    let body = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&response.body).into_owned()))
    };

    if let Some(err) = classify(response.status, path, &body, response.retry_after()) {
        warn!(status = response.status, path, error = %err, "request failed");
        return Err(err.into());
    }

    if let Value::String(_) = body {
        return Err(crate::Error::UnexpectedResponse(format!(
            "non-JSON body from {} (HTTP {})",
            path, response.status
        )));
    }

    Ok(body)
}

fn session_error(status: u16, had_session: bool) -> ApiError {
    let message = if had_session {
        "App Store Connect rejected the web session; it has probably expired. \
         Generate a new one with `fastlane spaceauth` and export it as FASTLANE_SESSION"
    } else {
        "This endpoint is only available to the App Store Connect website and \
         rejects API keys. Generate a web session with `fastlane spaceauth` and \
         export it as FASTLANE_SESSION (or APP_STORE_CONNECT_SESSION)"
    };
    ApiError::SessionRequired {
        status,
        message: message.to_string(),
    }
}
