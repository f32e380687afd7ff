use std::time::Duration;

use crate::infra::config::HttpSettings;

/// Build a reqwest client with the configured timeouts. Redirects are not followed.
pub fn make_http_client(settings: &HttpSettings) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
        .timeout(Duration::from_millis(settings.timeout_ms))
        .redirect(reqwest::redirect::Policy::none())
        .build()
}
