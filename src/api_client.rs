use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const JSON: &str = "application/json";

/// バックエンド通信のエラー
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected code {code}: {message}")]
    Status { code: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// GET/POST/PUT/DELETEを同期で発行する薄いHTTPクライアント
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// ベースURLにパスセグメントを連結する。各セグメントはエンコードされる
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn get(&self, url: Url) -> Result<String, ApiError> {
        let response = self.send(Method::GET, url, None)?;
        read_body(response)
    }

    pub fn post(&self, url: Url, json: String) -> Result<String, ApiError> {
        let response = self.send(Method::POST, url, Some(json))?;
        read_body(response)
    }

    /// ステータスコードをそのまま返す
    pub fn put(&self, url: Url, json: String) -> Result<u16, ApiError> {
        let response = self.send(Method::PUT, url, Some(json))?;
        Ok(response.status().as_u16())
    }

    pub fn delete(&self, url: Url) -> Result<u16, ApiError> {
        let response = self.send(Method::DELETE, url, None)?;
        Ok(response.status().as_u16())
    }

    fn send(&self, method: Method, url: Url, body: Option<String>) -> Result<Response, ApiError> {
        debug!(%method, %url, "sending request");
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, JSON);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, JSON).body(body);
        }
        let response = request.send().map_err(|e| {
            warn!(%method, %url, error = %e, "request failed");
            ApiError::Transport(e)
        })?;
        debug!(%method, %url, status = response.status().as_u16(), "response received");
        Ok(response)
    }
}

fn read_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let url = response.url().clone();
    let text = response.text()?;
    if !status.is_success() {
        let message = error_message(status, &text);
        warn!(%url, code = status.as_u16(), %message, "unexpected status");
        return Err(ApiError::Status {
            code: status.as_u16(),
            message,
        });
    }
    Ok(text)
}

/// エラー応答の本文から表示用メッセージを取り出す
fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.canonical_reason().unwrap_or("Unknown").to_string();
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        // ProblemDetails形式 {"title": ...}
        Ok(serde_json::Value::Object(map)) => {
            for key in ["message", "title", "detail"] {
                if let Some(serde_json::Value::String(s)) = map.get(key) {
                    return s.clone();
                }
            }
        }
        Ok(serde_json::Value::String(s)) => return s,
        _ => {}
    }
    body.chars().take(200).collect()
}
