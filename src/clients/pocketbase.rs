use reqwest::{header::AUTHORIZATION, Client, Method, Response, Url};
use serde_json::{json, Value};

use crate::core::error::ToolError;
use crate::core::tool::JsonObject;
use crate::domain::{PocketBaseAuth, PocketBaseParams};
use crate::infra::http::headers::add_standard_headers;

const SUPERUSER_AUTH_PATH: [&str; 4] = ["api", "collections", "_superusers", "auth-with-password"];

/// HTTP client for one PocketBase instance, scoped to a single inbound request.
#[derive(Clone)]
pub struct PocketBaseClient {
    base: Url,
    http: Client,
    token: Option<String>,
}

impl PocketBaseClient {
    pub fn new(base: &str, http: Client) -> Result<Self, ToolError> {
        let url = Url::parse(base.trim())
            .map_err(|e| ToolError::Validation(format!("Invalid PocketBase url '{base}': {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ToolError::Validation(format!("Invalid PocketBase url '{base}'")));
        }
        Ok(Self { base: url, http, token: None })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the client and resolve its token: given directly, or via one superuser login.
    pub async fn connect(params: &PocketBaseParams, http: Client) -> Result<Self, ToolError> {
        let client = Self::new(&params.url, http)?;
        match &params.auth {
            PocketBaseAuth::Token(token) => Ok(client.with_token(token.clone())),
            PocketBaseAuth::Credentials { email, password } => {
                let token = client.authenticate(email, password).await?;
                Ok(client.with_token(token))
            }
            PocketBaseAuth::Anonymous => Ok(client),
        }
    }

    /// Percent-encodes each segment and appends it to the base path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ToolError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ToolError::Validation(format!("Invalid PocketBase url '{}'", self.base))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Exchange superuser credentials for a token. Never sends an auth header.
    pub async fn authenticate(&self, identity: &str, password: &str) -> Result<String, ToolError> {
        let url = self.endpoint(&SUPERUSER_AUTH_PATH)?;
        let (builder, rid) = add_standard_headers(self.http.post(url), None);
        tracing::debug!(request_id = %rid, "pocketbase superuser auth");
        let resp = builder
            .json(&json!({ "identity": identity, "password": password }))
            .send()
            .await
            .map_err(|e| ToolError::Auth(ToolError::from(e).to_string()))?;
        let body = read_body(resp).await.map_err(|e| ToolError::Auth(e.to_string()))?;
        body.get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ToolError::Auth("response did not contain a token".into()))
    }

    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ToolError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, path = url.path(), query = ?query, "pocketbase request");
        let (mut builder, rid) = add_standard_headers(self.http.request(method, url), None);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        tracing::trace!(request_id = %rid, status = %resp.status(), "pocketbase response");
        read_body(resp).await
    }

    pub async fn get(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<Value, ToolError> {
        self.request(Method::GET, segments, query, None).await
    }

    pub async fn post(
        &self,
        segments: &[&str],
        query: &[(String, String)],
        body: &Value,
    ) -> Result<Value, ToolError> {
        self.request(Method::POST, segments, query, Some(body)).await
    }

    pub async fn patch(
        &self,
        segments: &[&str],
        query: &[(String, String)],
        body: &Value,
    ) -> Result<Value, ToolError> {
        self.request(Method::PATCH, segments, query, Some(body)).await
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<Value, ToolError> {
        self.request(Method::DELETE, segments, &[], None).await
    }
}

/// Status >= 400 fails with the backend's `message`; an empty 2xx body reads as success.
async fn read_body(resp: Response) -> Result<Value, ToolError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    let blank = bytes.iter().all(u8::is_ascii_whitespace);
    let parsed: Option<Value> = if blank { None } else { serde_json::from_slice(&bytes).ok() };

    if status.as_u16() >= 400 {
        let message = parsed
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
        return Err(ToolError::Backend(message));
    }

    match parsed {
        Some(v) => Ok(v),
        None if blank => Ok(json!({ "success": true })),
        None => Err(ToolError::Backend("Invalid JSON response from PocketBase".into())),
    }
}

/// Keep only the listed keys that are present and non-empty, stringified for the query string.
pub fn forward_query(args: &JsonObject, keys: &[&str]) -> Vec<(String, String)> {
    keys.iter()
        .filter_map(|key| {
            let value = match args.get(*key)? {
                Value::String(s) if !s.is_empty() => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.to_string(), value))
        })
        .collect()
}
