use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::core::{PageSource, SessionContext, SourceError};
use crate::models::{Category, ChatEntry, Profile, TravelDetailsForm, TripListing};

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

/// HTTP client for the matching backend
///
/// Every call takes the caller's [`SessionContext`]; a missing token sends an
/// unauthenticated request and leaves rejection to the backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn authorize(&self, request: RequestBuilder, ctx: &SessionContext) -> RequestBuilder {
        match ctx.bearer() {
            Some(bearer) => request.header(reqwest::header::AUTHORIZATION, bearer),
            None => {
                tracing::debug!("Sending unauthenticated request");
                request
            }
        }
    }

    /// Profiles for the discovery feed
    pub async fn fetch_profiles(&self, ctx: &SessionContext) -> Result<Vec<Profile>, SourceError> {
        let request = self.client.get(self.url("profiles"));
        let response = self.authorize(request, ctx).send().await?;

        read_items(response, "profiles").await
    }

    pub async fn fetch_trips(
        &self,
        ctx: &SessionContext,
        category: Category,
        page: u32,
    ) -> Result<Vec<TripListing>, SourceError> {
        if !category.is_trip() {
            return Err(SourceError::UnsupportedCategory(category));
        }

        let page = page.to_string();
        let request = self
            .client
            .get(self.url("trips"))
            .query(&[("category", category.as_str()), ("page", page.as_str())]);
        let response = self.authorize(request, ctx).send().await?;

        let trips: Vec<TripListing> = read_items(response, "trips").await?;
        tracing::debug!("Fetched {} {} trips from page {}", trips.len(), category, page);

        Ok(trips)
    }

    pub async fn fetch_chats(
        &self,
        ctx: &SessionContext,
        category: Category,
        page: u32,
    ) -> Result<Vec<ChatEntry>, SourceError> {
        if category.is_trip() {
            return Err(SourceError::UnsupportedCategory(category));
        }

        let page = page.to_string();
        let request = self
            .client
            .get(self.url("chats"))
            .query(&[("type", category.as_str()), ("page", page.as_str())]);
        let response = self.authorize(request, ctx).send().await?;

        read_items(response, "chats").await
    }

    /// Post a validated travel-details form
    pub async fn publish_trip(
        &self,
        ctx: &SessionContext,
        form: &TravelDetailsForm,
    ) -> Result<TripListing, SourceError> {
        let request = self.client.post(self.url("trips")).json(form);
        let response = self.authorize(request, ctx).send().await?;
        let json = ensure_success(response, "trip publish").await?.json::<Value>().await?;

        let data = json.get("data").cloned().unwrap_or(json);
        serde_json::from_value(data).map_err(|e| {
            tracing::warn!("Unexpected trip publish response: {}", e);
            SourceError::Network(format!("invalid trip response: {}", e))
        })
    }
}

#[async_trait]
impl PageSource for BackendClient {
    type Item = TripListing;

    async fn fetch_page(
        &self,
        ctx: &SessionContext,
        category: Category,
        page: u32,
    ) -> Result<Vec<TripListing>, SourceError> {
        self.fetch_trips(ctx, category, page).await
    }
}

pub(crate) async fn ensure_success(response: Response, what: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::warn!("Backend rejected {} request: {}", what, status);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Unauthorized),
        other => Err(SourceError::Status(other.as_u16())),
    }
}

/// Read a successful list response; a body that is not JSON is an empty page
pub(crate) async fn read_items<T: DeserializeOwned>(response: Response, what: &str) -> Result<Vec<T>, SourceError> {
    let body = ensure_success(response, what).await?.text().await?;
    match serde_json::from_str::<Value>(&body) {
        Ok(json) => Ok(decode_items(json, what)),
        Err(e) => {
            tracing::warn!("Malformed {} response: {}", what, e);
            Ok(Vec::new())
        }
    }
}

/// Extract a list from `{"data": [...]}` or a bare array
///
/// Anything else is logged and treated as an empty page, as are individual
/// entries that fail to parse.
pub(crate) fn decode_items<T: DeserializeOwned>(json: Value, what: &str) -> Vec<T> {
    let entries = match json {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => {
                tracing::warn!("Malformed {} response: missing data array", what);
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!("Malformed {} response: expected a list", what);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping malformed {} entry: {}", what, e);
                None
            }
        })
        .collect()
}
