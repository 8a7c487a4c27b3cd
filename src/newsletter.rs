use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::http_client::{api_url, http_client};

#[derive(Debug, Serialize)]
struct SubscribeRequest<'a> {
    email: &'a str,
    location: &'a str,
    terms: bool,
}

#[derive(Debug, Deserialize)]
struct SubscribeResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Posts a newsletter subscription. On success returns the server's
/// confirmation message; on rejection the error carries the server-supplied
/// `detail` when present, otherwise a generic message.
pub fn subscribe(email: &str, location: &str, terms: bool) -> Result<String> {
    let client = http_client()?;
    let url = api_url("/api/newsletter/subscribe");
    let resp = client
        .post(&url)
        .json(&SubscribeRequest {
            email,
            location,
            terms,
        })
        .send()
        .map_err(|_| anyhow!("Could not reach the newsletter service"))?;

    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    let parsed = serde_json::from_str::<SubscribeResponse>(&body).unwrap_or(SubscribeResponse {
        message: None,
        detail: None,
    });

    if status.is_success() {
        Ok(parsed
            .message
            .unwrap_or_else(|| "Successfully subscribed to newsletter".to_string()))
    } else {
        Err(anyhow!(
            parsed
                .detail
                .unwrap_or_else(|| format!("Subscription failed (http {status})"))
        ))
    }
}
