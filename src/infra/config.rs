use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub mysql: MySqlDefaults,
    pub http: HttpSettings,
}

/// Connection constants used when the MySQL endpoint's query string omits a key.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MySqlDefaults {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub pass: String,
}

/// Outbound HTTP limits for PocketBase calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self { port: 8080, mysql: MySqlDefaults::default(), http: HttpSettings::default() }
    }
}

impl Default for MySqlDefaults {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3306,
            dbname: "test".into(),
            user: "root".into(),
            pass: String::new(),
        }
    }
}

impl std::fmt::Debug for MySqlDefaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDefaults")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { connect_timeout_ms: 5_000, timeout_ms: 30_000 }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl Config {
    /// Defaults, then the TOML file named by `GATEWAY_CONFIG` (if set), then environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("GATEWAY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self) {
        if let Some(port) = env_parse("PORT") {
            self.port = port;
        }
        if let Some(host) = env_string("MYSQL_HOST") {
            self.mysql.host = host;
        }
        if let Some(port) = env_parse("MYSQL_PORT") {
            self.mysql.port = port;
        }
        if let Some(db) = env_string("MYSQL_DATABASE") {
            self.mysql.dbname = db;
        }
        if let Some(user) = env_string("MYSQL_USER") {
            self.mysql.user = user;
        }
        if let Some(pass) = env_string("MYSQL_PASSWORD") {
            self.mysql.pass = pass;
        }
        if let Some(ms) = env_parse("HTTP_CONNECT_TIMEOUT_MS") {
            self.http.connect_timeout_ms = ms;
        }
        if let Some(ms) = env_parse("HTTP_TIMEOUT_MS") {
            self.http.timeout_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT cannot be 0".into());
        }
        if self.mysql.host.trim().is_empty() {
            return Err("MySQL default host cannot be empty".into());
        }
        if self.mysql.port == 0 {
            return Err("MySQL default port cannot be 0".into());
        }
        if self.http.connect_timeout_ms == 0 || self.http.timeout_ms == 0 {
            return Err("HTTP timeouts must be greater than 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "PORT",
        "MYSQL_HOST",
        "MYSQL_PORT",
        "MYSQL_DATABASE",
        "MYSQL_USER",
        "MYSQL_PASSWORD",
        "HTTP_CONNECT_TIMEOUT_MS",
        "HTTP_TIMEOUT_MS",
        "GATEWAY_CONFIG",
    ];

    fn clear_env() {
        for v in VARS {
            std::env::remove_var(v);
        }
    }

    #[test]
    #[serial]
    fn defaults_to_8080_and_local_mysql() {
        clear_env();
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.mysql.host, "localhost");
        assert_eq!(cfg.mysql.port, 3306);
        assert_eq!(cfg.http.timeout_ms, 30_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    #[serial]
    fn parses_env_overrides() {
        clear_env();
        std::env::set_var("PORT", "9090");
        std::env::set_var("MYSQL_HOST", "db.internal");
        std::env::set_var("MYSQL_PORT", "3307");
        std::env::set_var("HTTP_TIMEOUT_MS", "1500");
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.mysql.host, "db.internal");
        assert_eq!(cfg.mysql.port, 3307);
        assert_eq!(cfg.http.timeout_ms, 1500);
        clear_env();
    }

    #[test]
    #[serial]
    fn ignores_unparseable_numbers() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.port, 8080);
        clear_env();
    }

    #[test]
    fn reads_partial_toml() {
        let cfg = Config::from_toml_str(
            r#"
            port = 7000

            [mysql]
            dbname = "shop"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.port, 7000);
        assert_eq!(cfg.mysql.dbname, "shop");
        assert_eq!(cfg.mysql.user, "root");
        assert_eq!(cfg.http.connect_timeout_ms, 5_000);
    }

    #[test]
    fn rejects_zero_port() {
        let cfg = Config::from_toml_str("port = 0").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    #[serial]
    fn load_overlays_env_on_toml_file() {
        clear_env();
        let path = std::env::temp_dir().join("mcp-db-gateway-load-test.toml");
        std::fs::write(&path, "port = 7000\n[mysql]\nhost = \"from-file\"\n").unwrap();
        std::env::set_var("GATEWAY_CONFIG", &path);
        std::env::set_var("MYSQL_HOST", "from-env");
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.port, 7000);
        assert_eq!(cfg.mysql.host, "from-env");
        clear_env();
        let _ = std::fs::remove_file(path);
    }

    #[test]
    #[serial]
    fn load_reports_missing_file() {
        clear_env();
        std::env::set_var("GATEWAY_CONFIG", "/nonexistent/gateway.toml");
        let err = Config::load().unwrap_err();
        assert!(err.to_string().contains("reading config file"));
        clear_env();
    }
}
