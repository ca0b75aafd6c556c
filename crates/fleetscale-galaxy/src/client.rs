//! HTTP transport for the Galaxy GraphQL endpoint.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tracing::{debug, info};

use fleetscale_core::{Application, FleetApi, PortFuture};

use crate::error::{GalaxyError, GalaxyResult};
use crate::query::{GET_APP, KILL_CONTAINER, SET_CONTAINER_COUNT};
use crate::wire::{parse_app, GraphQlResponse};

const API_KEY_HEADER: &str = "galaxy-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Galaxy API client authenticated with an account API key.
#[derive(Debug, Clone)]
pub struct GalaxyClient {
    http: reqwest::Client,
    url: String,
}

impl GalaxyClient {
    pub fn new(url: impl Into<String>, api_key: &str) -> GalaxyResult<Self> {
        let mut key = HeaderValue::from_str(api_key).map_err(|_| GalaxyError::InvalidApiKey)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Post one GraphQL document and return its `data` member.
    pub async fn request(&self, query: &str, variables: Value) -> GalaxyResult<Value> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GalaxyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQlResponse = response.json().await?;
        envelope.into_data()
    }

    /// Fetch an application snapshot. One sample more than `limit` is
    /// requested since Galaxy sometimes returns one short.
    pub async fn app(&self, hostname: &str, series_name: &str, limit: usize) -> GalaxyResult<Application> {
        debug!(hostname, series_name, limit, "reading stored metrics");
        let data = self
            .request(
                GET_APP,
                json!({
                    "hostname": hostname,
                    "seriesName": series_name,
                    "limit": limit + 1,
                }),
            )
            .await?;
        parse_app(data, hostname, limit)
    }

    pub async fn set_container_count(&self, app_id: &str, container_count: u32) -> GalaxyResult<()> {
        info!(app_id, container_count, "setting container count");
        let data = self
            .request(
                SET_CONTAINER_COUNT,
                json!({ "appId": app_id, "containerCount": container_count }),
            )
            .await?;
        debug!(status = %data["setContainerCountForApp"]["status"], "container count accepted");
        Ok(())
    }

    pub async fn kill_container(&self, app_id: &str, container_id: &str) -> GalaxyResult<()> {
        info!(app_id, container_id, "killing container");
        self.request(
            KILL_CONTAINER,
            json!({ "appId": app_id, "containerId": container_id }),
        )
        .await?;
        Ok(())
    }
}

impl FleetApi for GalaxyClient {
    fn fetch_application<'a>(
        &'a self,
        hostname: &'a str,
        series_name: &'a str,
        limit: usize,
    ) -> PortFuture<'a, Application> {
        Box::pin(async move { Ok(self.app(hostname, series_name, limit).await?) })
    }

    fn set_container_count<'a>(&'a self, app_id: &'a str, container_count: u32) -> PortFuture<'a, ()> {
        Box::pin(async move { Ok(GalaxyClient::set_container_count(self, app_id, container_count).await?) })
    }

    fn kill_container<'a>(&'a self, app_id: &'a str, container_id: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move { Ok(GalaxyClient::kill_container(self, app_id, container_id).await?) })
    }
}
