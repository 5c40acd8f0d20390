//! # Pix Client SDK
//!
//! A typed Rust client for the Pix API.

use pix_types::{
    CreateUserRequest, PayPixRequest, PaymentResponse, PixKeyResponse, RequestPixRequest,
    SignupResponse, TransactionEntry, UserResponse,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pix API client.
pub struct PixClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl PixClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http: Client::new(),
        }
    }

    /// Sets the API key sent as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Signs up a user. Keep the returned API key; the server never shows it again.
    pub async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        wallet: i64,
    ) -> Result<SignupResponse, ClientError> {
        let req = CreateUserRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            wallet,
        };
        self.post("/api/users", &req).await
    }

    /// Profile and wallet of the authenticated user.
    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        self.get("/api/users/me").await
    }

    /// Requests a pix of `value` and returns the key to hand to the payer.
    pub async fn request_pix(&self, value: i64) -> Result<String, ClientError> {
        let resp: PixKeyResponse = self
            .post("/api/pix/request", &RequestPixRequest { value })
            .await?;
        Ok(resp.key)
    }

    /// Pays the pix identified by `key`.
    pub async fn pay_pix(&self, key: &str) -> Result<PaymentResponse, ClientError> {
        let req = PayPixRequest {
            key: key.to_string(),
        };
        self.post("/api/pix/pay", &req).await
    }

    /// Settled pix received or paid by the authenticated user, newest first.
    pub async fn transactions(&self) -> Result<Vec<TransactionEntry>, ClientError> {
        self.get("/api/pix/transactions").await
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let req = self.authorize(self.http.get(format!("{}{}", self.base_url, path)));
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let req = self.authorize(
            self.http
                .post(format!("{}{}", self.base_url, path))
                .json(body),
        );
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(body),
            })
        }
    }
}

/// Pulls the `error` field out of an error body, falling back to the raw text.
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PixClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = PixClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_api_key() {
        let client = PixClient::new("http://localhost:3000").with_api_key("sk_test");
        assert_eq!(client.api_key.as_deref(), Some("sk_test"));
    }

    #[test]
    fn test_error_message_from_json() {
        let body = r#"{"error":"Invalid key for payment","code":401}"#.to_string();
        assert_eq!(error_message(body), "Invalid key for payment");
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("bad gateway".into()), "bad gateway");
    }
}
