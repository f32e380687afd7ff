use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::content::JSON_MIME;
use crate::core::error::GatewayError;
use crate::infra::config::MySqlDefaults;

/// A browsable backend entity exposed through `resources/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

impl Resource {
    pub fn json(uri: String, name: impl Into<String>, description: String) -> Self {
        Self { uri, name: name.into(), description, mime_type: JSON_MIME.to_string() }
    }
}

fn non_empty<'a>(q: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    q.get(key).map(String::as_str).filter(|s| !s.trim().is_empty())
}

#[derive(Clone, PartialEq, Eq)]
pub enum PocketBaseAuth {
    Token(String),
    Credentials { email: String, password: String },
    Anonymous,
}

impl std::fmt::Debug for PocketBaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PocketBaseAuth::Token(_) => f.debug_struct("Token").finish_non_exhaustive(),
            PocketBaseAuth::Credentials { email, .. } => {
                f.debug_struct("Credentials").field("email", email).finish_non_exhaustive()
            }
            PocketBaseAuth::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Connection parameters of the PocketBase endpoint, taken from the URL query.
#[derive(Clone, PartialEq, Eq)]
pub struct PocketBaseParams {
    pub url: String,
    pub auth: PocketBaseAuth,
}

impl std::fmt::Debug for PocketBaseParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketBaseParams")
            .field("url", &self.url)
            .field("auth", &self.auth)
            .finish()
    }
}

impl PocketBaseParams {
    pub fn from_query(q: &HashMap<String, String>) -> Result<Self, GatewayError> {
        let url = non_empty(q, "url").ok_or(GatewayError::MissingParam("url"))?.to_string();
        let auth = if let Some(token) = non_empty(q, "token") {
            PocketBaseAuth::Token(token.to_string())
        } else if let (Some(email), Some(password)) = (non_empty(q, "email"), q.get("password")) {
            PocketBaseAuth::Credentials { email: email.to_string(), password: password.clone() }
        } else {
            PocketBaseAuth::Anonymous
        };
        Ok(Self { url, auth })
    }
}

/// Connection parameters of the MySQL endpoint; absent keys fall back to the configured defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct MySqlParams {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for MySqlParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl MySqlParams {
    pub fn from_query(
        q: &HashMap<String, String>,
        defaults: &MySqlDefaults,
    ) -> Result<Self, GatewayError> {
        let port = match non_empty(q, "port") {
            Some(p) => p.trim().parse::<u16>().map_err(|_| {
                GatewayError::InvalidParam(format!("port must be a number, got '{p}'"))
            })?,
            None => defaults.port,
        };
        let pick = |key: &str, default: &str| non_empty(q, key).unwrap_or(default).to_string();
        Ok(Self {
            host: pick("host", &defaults.host),
            port,
            dbname: pick("dbname", &defaults.dbname),
            user: pick("user", &defaults.user),
            pass: q.get("pass").cloned().unwrap_or_else(|| defaults.pass.clone()),
        })
    }
}
