//! Resource-oriented HTTP client.
//!
//! [`ApiClient`] owns the connection pool and the auth store; the
//! `user()` / `contract()` / `analytics()` accessors hand out thin borrowed
//! clients scoped to `/v1/user`, `/v1/contract` and `/v1/analytics`.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::stream::{decode_utf8, ChunkStream};
use crate::core::model::{
    Analytics, Contract, ContractWithReview, ExplainClauseRequest, LoginRequest, LoginResponse,
    RegisterRequest, ReviewRequest, User,
};
use crate::store::AuthStore;

/// Pagination for the contract list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    auth: AuthStore,
}

impl ApiClient {
    /// `endpoint` is the service root, e.g. `http://localhost:9095`.
    pub fn new(endpoint: &str, auth: AuthStore) -> Result<Self, ApiError> {
        let trimmed = endpoint.trim().trim_end_matches('/');
        let url = reqwest::Url::parse(trimmed)
            .map_err(|_| ApiError::InvalidEndpoint(endpoint.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(endpoint.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base: format!("{trimmed}/v1"),
            auth,
        })
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn user(&self) -> UserClient<'_> {
        UserClient { api: self }
    }

    pub fn contract(&self) -> ContractClient<'_> {
        ContractClient { api: self }
    }

    pub fn analytics(&self) -> AnalyticsClient<'_> {
        AnalyticsClient { api: self }
    }

    /// Build a request; the bearer token is read from the store *now*, so a
    /// login or logout takes effect on the very next call.
    fn request(&self, method: Method, prefix: &str, path: &str) -> RequestBuilder {
        let url = format!("{}{prefix}{path}", self.base);
        tracing::debug!(%method, %url, "api request");
        let req = self.http.request(method, url);
        match self.auth.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("unauthorized, please log in");
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        Ok(self.send(req).await?.json::<T>().await?)
    }
}

// ───────────────────────────────────────── user ──────────────

pub struct UserClient<'a> {
    api: &'a ApiClient,
}

impl UserClient<'_> {
    const PREFIX: &'static str = "/user";

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api
            .json(self.api.request(Method::POST, Self::PREFIX, "/login").json(&body))
            .await
    }

    /// Log in and store the session in the auth store.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let resp = self.login(email, password).await?;
        self.api.auth.set_session(resp.access_token, resp.user.clone())?;
        tracing::info!(email = %resp.user.email, "signed in");
        Ok(resp.user)
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<User, ApiError> {
        self.api
            .json(self.api.request(Method::POST, Self::PREFIX, "/register").json(payload))
            .await
    }

    pub async fn current(&self) -> Result<User, ApiError> {
        self.api
            .json(self.api.request(Method::GET, Self::PREFIX, "/current"))
            .await
    }
}

// ───────────────────────────────────────── contract ──────────

pub struct ContractClient<'a> {
    api: &'a ApiClient,
}

impl ContractClient<'_> {
    const PREFIX: &'static str = "/contract";

    /// Upload a PDF as multipart `file` + `title`.
    pub async fn upload(&self, path: &Path, title: &str) -> Result<Contract, ApiError> {
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(ApiError::InvalidUpload(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contract.pdf".into());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .text("title", title.to_string())
            .part("file", part);

        self.api
            .json(self.api.request(Method::POST, Self::PREFIX, "/upload").multipart(form))
            .await
    }

    pub async fn list(&self, page: Option<Page>) -> Result<Vec<Contract>, ApiError> {
        let mut req = self.api.request(Method::GET, Self::PREFIX, "/all");
        if let Some(p) = page {
            req = req.query(&[("page", p.page), ("limit", p.limit)]);
        }
        self.api.json(req).await
    }

    pub async fn get(&self, contract_id: &str) -> Result<Contract, ApiError> {
        self.api
            .json(self.api.request(Method::GET, Self::PREFIX, &format!("/{contract_id}")))
            .await
    }

    /// Run the AI review.  This blocks until the service has finished.
    pub async fn review(
        &self,
        contract_id: &str,
        payload: &ReviewRequest,
    ) -> Result<ContractWithReview, ApiError> {
        let path = format!("/{contract_id}/review");
        self.api
            .json(self.api.request(Method::POST, Self::PREFIX, &path).json(payload))
            .await
    }

    pub async fn get_review(&self, contract_id: &str) -> Result<ContractWithReview, ApiError> {
        let path = format!("/{contract_id}/review");
        self.api
            .json(self.api.request(Method::GET, Self::PREFIX, &path))
            .await
    }

    /// Explanation as text chunks, in the order the service streams them.
    pub async fn explain_clause_stream(
        &self,
        contract_id: &str,
        clause: &str,
    ) -> Result<ChunkStream, ApiError> {
        let path = format!("/{contract_id}/explain-clause");
        let body = ExplainClauseRequest {
            clause: clause.to_string(),
        };
        let resp = self
            .api
            .send(self.api.request(Method::POST, Self::PREFIX, &path).json(&body))
            .await?;
        Ok(decode_utf8(resp.bytes_stream()).boxed())
    }

    /// Whole explanation, buffered until the stream ends.
    pub async fn explain_clause(&self, contract_id: &str, clause: &str) -> Result<String, ApiError> {
        let mut chunks = self.explain_clause_stream(contract_id, clause).await?;
        let mut text = String::new();
        while let Some(chunk) = chunks.next().await {
            text.push_str(&chunk?);
        }
        Ok(text)
    }
}

// ───────────────────────────────────────── analytics ─────────

pub struct AnalyticsClient<'a> {
    api: &'a ApiClient,
}

impl AnalyticsClient<'_> {
    pub async fn overview(&self) -> Result<Analytics, ApiError> {
        self.api
            .json(self.api.request(Method::GET, "/analytics", "/overview"))
            .await
    }
}
