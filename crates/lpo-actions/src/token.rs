//! Contracts service token client.
//!
//! Fetching a resource token is a two-step exchange: the contract token
//! buys a machine token, the machine token buys the resource token for
//! the on-prem patch resource. Transport or decode failures of either
//! call collapse to `None`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lpo_relations::ProxySettings;

use crate::error::ActionResult;

const RESOURCE_NAME: &str = "livepatch-onprem";
const MACHINE_ID: &str = "livepatch-onprem";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Issues machine and resource tokens.
#[async_trait]
pub trait TokenService: Send + Sync {
    async fn machine_token(&self, contract_token: &str) -> Option<String>;

    async fn resource_token(&self, machine_token: &str) -> Option<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MachineTokenRequest<'a> {
    architecture: &'a str,
    host_type: &'a str,
    machine_id: &'a str,
    os: OsInfo<'a>,
}

#[derive(Debug, Serialize)]
struct OsInfo<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MachineTokenResponse {
    #[serde(default)]
    machine_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceTokenResponse {
    #[serde(default)]
    resource_token: String,
}

/// reqwest-backed [`TokenService`].
pub struct ContractsClient {
    http: reqwest::Client,
    base_url: String,
}

impl ContractsClient {
    /// Build a client for `base_url`.
    ///
    /// `ca_pem` is added as an extra trusted root. Proxy URLs that fail to
    /// parse are an error.
    pub fn new(
        base_url: &str,
        proxy: Option<&ProxySettings>,
        ca_pem: Option<&[u8]>,
    ) -> ActionResult<Self> {
        let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);

        if let Some(pem) = ca_pem {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
        }

        if let Some(proxy) = proxy {
            let no_proxy = reqwest::NoProxy::from_string(&proxy.no_proxy);
            if !proxy.http_proxy.is_empty() {
                let http = reqwest::Proxy::http(&proxy.http_proxy)?;
                builder = builder.proxy(http.no_proxy(no_proxy.clone()));
            }
            if !proxy.https_proxy.is_empty() {
                let https = reqwest::Proxy::https(&proxy.https_proxy)?;
                builder = builder.proxy(https.no_proxy(no_proxy));
            }
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_machine_token(
        &self,
        contract_token: &str,
    ) -> reqwest::Result<MachineTokenResponse> {
        let body = MachineTokenRequest {
            architecture: std::env::consts::ARCH,
            host_type: "container",
            machine_id: MACHINE_ID,
            os: OsInfo { kind: "Linux" },
        };
        self.http
            .post(format!("{}/v1/context/machines/token", self.base_url))
            .bearer_auth(contract_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn fetch_resource_token(
        &self,
        machine_token: &str,
    ) -> reqwest::Result<ResourceTokenResponse> {
        self.http
            .get(format!(
                "{}/v1/resources/{RESOURCE_NAME}/context/machines/{MACHINE_ID}",
                self.base_url
            ))
            .bearer_auth(machine_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl TokenService for ContractsClient {
    async fn machine_token(&self, contract_token: &str) -> Option<String> {
        match self.fetch_machine_token(contract_token).await {
            Ok(resp) => non_empty(resp.machine_token),
            Err(e) => {
                warn!(error = %e, "machine token request failed");
                None
            }
        }
    }

    async fn resource_token(&self, machine_token: &str) -> Option<String> {
        match self.fetch_resource_token(machine_token).await {
            Ok(resp) => non_empty(resp.resource_token),
            Err(e) => {
                warn!(error = %e, "resource token request failed");
                None
            }
        }
    }
}

fn non_empty(token: String) -> Option<String> {
    if token.is_empty() {
        debug!("token service returned an empty token");
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_token_payload_shape() {
        let body = MachineTokenRequest {
            architecture: "x86_64",
            host_type: "container",
            machine_id: MACHINE_ID,
            os: OsInfo { kind: "Linux" },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "architecture": "x86_64",
                "hostType": "container",
                "machineId": "livepatch-onprem",
                "os": {"type": "Linux"},
            })
        );
    }

    #[test]
    fn responses_tolerate_missing_fields() {
        let resp: MachineTokenResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(non_empty(resp.machine_token), None);

        let resp: ResourceTokenResponse =
            serde_json::from_str(r#"{"resourceToken": "some-resource-token"}"#).unwrap();
        assert_eq!(non_empty(resp.resource_token).as_deref(), Some("some-resource-token"));
    }

    #[test]
    fn client_builds_with_proxy_and_trims_base() {
        let proxy = ProxySettings {
            http_proxy: "http://proxy:3128".into(),
            https_proxy: "http://proxy:3128".into(),
            no_proxy: "localhost".into(),
        };
        let client =
            ContractsClient::new("https://contracts.example/", Some(&proxy), None).unwrap();
        assert_eq!(client.base_url, "https://contracts.example");
    }

    #[tokio::test]
    async fn unreachable_service_yields_none() {
        let client = ContractsClient::new("http://127.0.0.1:9", None, None).unwrap();
        assert_eq!(client.machine_token("contract").await, None);
        assert_eq!(client.resource_token("machine").await, None);
    }
}
