//! HTTP adapter for the hosted entity/auth backend.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::model::{NewShelter, Route, RouteFilter, RouteInput, RouteUpdate, Shelter, User};
use crate::traits::{RouteStore, Session, ShelterStore};

const SHELTER_ENTITY: &str = "Shelter";
const ROUTE_ENTITY: &str = "Route";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub app_id: String,
    /// Bearer token for the signed-in user, if any.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            app_id: "shelter-route".to_string(),
            token: None,
            timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    /// Defaults overridden by `SHELTER_ROUTE_BASE_URL`, `SHELTER_ROUTE_APP_ID`,
    /// `SHELTER_ROUTE_TOKEN` and `SHELTER_ROUTE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(base_url) = lookup("SHELTER_ROUTE_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(app_id) = lookup("SHELTER_ROUTE_APP_ID") {
            config.app_id = app_id;
        }
        config.token = lookup("SHELTER_ROUTE_TOKEN").filter(|token| !token.is_empty());
        if let Some(raw) = lookup("SHELTER_ROUTE_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => warn!(value = %raw, "ignoring invalid SHELTER_ROUTE_TIMEOUT_SECS"),
            }
        }
        config
    }
}

/// Blocking client for the backend's entity and auth endpoints.
#[derive(Debug)]
pub struct BackendClient {
    config: BackendConfig,
    client: Client,
    token: RwLock<Option<String>>,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let token = RwLock::new(config.token.clone());

        Ok(Self {
            config,
            client,
            token,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Where to send a user to sign in; they come back to `return_to`.
    pub fn login_url(&self, return_to: &str) -> Result<Url, BackendError> {
        let base = format!("{}/login", self.base());
        Url::parse_with_params(
            &base,
            &[("app_id", self.config.app_id.as_str()), ("from_url", return_to)],
        )
        .map_err(|err| BackendError::Unavailable(format!("invalid login URL {}: {}", base, err)))
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn app_url(&self, path: &str) -> String {
        format!("{}/api/apps/{}/{}", self.base(), self.config.app_id, path)
    }

    fn entity_url(&self, entity: &str) -> String {
        self.app_url(&format!("entities/{}", entity))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.token.read().unwrap_or_else(PoisonError::into_inner).as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let response = check_status(builder.send()?)?;
        Ok(response.json()?)
    }

    fn send_empty(&self, builder: RequestBuilder) -> Result<(), BackendError> {
        check_status(builder.send()?)?;
        Ok(())
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, BackendError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BackendError::Unauthenticated);
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

impl ShelterStore for BackendClient {
    fn list(&self, sort: Option<&str>) -> Result<Vec<Shelter>, BackendError> {
        let mut builder = self.request(Method::GET, &self.entity_url(SHELTER_ENTITY));
        if let Some(sort) = sort {
            builder = builder.query(&[("sort", sort)]);
        }
        let shelters: Vec<Shelter> = self.send_json(builder)?;
        debug!(count = shelters.len(), "fetched shelters");
        Ok(shelters)
    }

    fn bulk_create(&self, shelters: &[NewShelter]) -> Result<(), BackendError> {
        let url = format!("{}/bulk", self.entity_url(SHELTER_ENTITY));
        self.send_empty(self.request(Method::POST, &url).json(shelters))
    }
}

impl RouteStore for BackendClient {
    fn create(&self, input: &RouteInput) -> Result<Route, BackendError> {
        let builder = self.request(Method::POST, &self.entity_url(ROUTE_ENTITY)).json(input);
        self.send_json(builder)
    }

    fn update(&self, id: &str, update: &RouteUpdate) -> Result<Route, BackendError> {
        let url = format!("{}/{}", self.entity_url(ROUTE_ENTITY), id);
        self.send_json(self.request(Method::PUT, &url).json(update))
    }

    fn filter(
        &self,
        filter: &RouteFilter,
        sort: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Route>, BackendError> {
        let q = serde_json::to_string(filter)?;
        let mut builder = self
            .request(Method::GET, &self.entity_url(ROUTE_ENTITY))
            .query(&[("q", q.as_str()), ("sort", sort)]);
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        self.send_json(builder)
    }
}

impl Session for BackendClient {
    fn me(&self) -> Result<User, BackendError> {
        if !self.is_signed_in() {
            return Err(BackendError::Unauthenticated);
        }
        self.send_json(self.request(Method::GET, &self.entity_url("User/me")))
    }

    fn logout(&self) -> Result<(), BackendError> {
        let result = if self.is_signed_in() {
            self.send_empty(self.request(Method::POST, &self.app_url("auth/logout")))
        } else {
            Ok(())
        };
        self.set_token(None);
        result
    }
}
