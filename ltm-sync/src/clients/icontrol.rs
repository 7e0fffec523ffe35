//! Client for the iControl REST API.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClientError, Fastl4, Node, NodeAddress, PoolMember, RemoteClient, Result};
use crate::config::ConnectionConfig;

const LTM_ROOT: &str = "/mgmt/tm/ltm";

/// Node as serialized by iControl REST.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeDto {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fqdn: Option<FqdnDto>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FqdnDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tm_name: Option<String>,
}

impl From<NodeDto> for Node {
    fn from(dto: NodeDto) -> Self {
        // FQDN nodes also carry a placeholder address ("any6"); the hostname wins.
        let hostname = dto
            .fqdn
            .and_then(|f| f.tm_name)
            .filter(|h| !h.is_empty());
        let address = match hostname {
            Some(hostname) => NodeAddress::Fqdn(hostname),
            None => NodeAddress::Address(dto.address.unwrap_or_default()),
        };
        Node {
            name: dto.name,
            address,
        }
    }
}

impl From<&Node> for NodeDto {
    fn from(node: &Node) -> Self {
        match &node.address {
            NodeAddress::Address(ip) => NodeDto {
                name: node.name.clone(),
                address: Some(ip.clone()),
                ..Default::default()
            },
            NodeAddress::Fqdn(hostname) => NodeDto {
                name: node.name.clone(),
                fqdn: Some(FqdnDto {
                    tm_name: Some(hostname.clone()),
                }),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Object names travel in URL paths with `/` folded to `~`.
fn path_name(name: &str) -> String {
    name.replace('/', "~")
}

/// Bare hosts default to HTTPS.
fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Build an API error from a non-success response body.
fn api_error(status: StatusCode, body: &str) -> ClientError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => body.to_string(),
    };
    ClientError::api(status.as_u16(), message)
}

/// Client for a BIG-IP appliance over iControl REST.
#[derive(Clone)]
pub struct IControlClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl IControlClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url(&config.host),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, LTM_ROOT, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.url(path);
        debug!("GET {}", url);
        match self.send(self.http.get(&url)).await {
            Ok(response) => {
                let body = response.text().await?;
                serde_json::from_str(&body)
                    .map(Some)
                    .map_err(|e| ClientError::Decode(format!("{}: {}", url, e)))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        debug!("POST {}", url);
        self.send(self.http.post(&url).json(body)).await?;
        Ok(())
    }

    async fn put_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        debug!("PUT {}", url);
        self.send(self.http.put(&url).json(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!("DELETE {}", url);
        self.send(self.http.delete(&url)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteClient for IControlClient {
    async fn create_node(&self, name: &str, address: &str) -> Result<()> {
        let node = Node {
            name: name.to_string(),
            address: NodeAddress::Address(address.to_string()),
        };
        self.post_json("/node", &NodeDto::from(&node)).await
    }

    async fn create_fqdn_node(&self, name: &str, hostname: &str) -> Result<()> {
        let node = Node {
            name: name.to_string(),
            address: NodeAddress::Fqdn(hostname.to_string()),
        };
        self.post_json("/node", &NodeDto::from(&node)).await
    }

    async fn get_node(&self, name: &str) -> Result<Option<Node>> {
        let dto: Option<NodeDto> = self
            .get_json(&format!("/node/{}", path_name(name)))
            .await?;
        Ok(dto.map(Node::from))
    }

    async fn modify_node(&self, name: &str, node: &Node) -> Result<()> {
        self.put_json(&format!("/node/{}", path_name(name)), &NodeDto::from(node))
            .await
    }

    async fn delete_node(&self, name: &str) -> Result<()> {
        self.delete(&format!("/node/{}", path_name(name))).await
    }

    async fn pool_members(&self, pool: &str) -> Result<Vec<PoolMember>> {
        let members: Option<Collection<PoolMember>> = self
            .get_json(&format!("/pool/{}/members", path_name(pool)))
            .await?;
        Ok(members.map(|c| c.items).unwrap_or_default())
    }

    async fn delete_pool_member(&self, pool: &str, member: &str) -> Result<()> {
        self.delete(&format!(
            "/pool/{}/members/{}",
            path_name(pool),
            path_name(member)
        ))
        .await
    }

    async fn create_fastl4(&self, profile: &Fastl4) -> Result<()> {
        self.post_json("/profile/fastl4", profile).await
    }

    async fn get_fastl4(&self, name: &str) -> Result<Option<Fastl4>> {
        self.get_json(&format!("/profile/fastl4/{}", path_name(name)))
            .await
    }

    async fn modify_fastl4(&self, name: &str, profile: &Fastl4) -> Result<()> {
        self.put_json(&format!("/profile/fastl4/{}", path_name(name)), profile)
            .await
    }

    async fn delete_fastl4(&self, name: &str) -> Result<()> {
        self.delete(&format!("/profile/fastl4/{}", path_name(name)))
            .await
    }
}
