//! network subgraph helpers
//!
//! lookups against the graph's own network subgraph: deployment metadata and
//! subgraph discovery by name or indexed chain. the network subgraph is
//! queried through the same gateway and key as any other subgraph.

use crate::client::Client;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::graphql::{GraphQlResponse, QueryRequest, Variables};
use crate::operation::Operation;
use reqwest::header::HeaderValue;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use url::Url;

/// metadata for one deployment, looked up by its `Qm...` ipfs hash
///
/// deployment entities are keyed by the hex form of the hash, so the lookup
/// filters on `ipfsHash` instead of fetching by id.
pub struct DeploymentInfo;

impl Operation for DeploymentInfo {
    const QUERY: &'static str = r#"query DeploymentInfo($ipfsHash: String!) {
  subgraphDeployments(first: 1, where: { ipfsHash: $ipfsHash }) {
    id
    ipfsHash
    createdAt
    network
    schemaIpfsHash
    subgraphCount
    versions {
      subgraph {
        displayName
        description
        website
      }
    }
  }
}"#;
    type Response = DeploymentInfoData;
}

/// `data` of a [`DeploymentInfo`] response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInfoData {
    /// matching deployments; empty when the hash is unknown
    #[serde(rename = "subgraphDeployments")]
    pub subgraph_deployments: Vec<SubgraphDeployment>,
}

/// a deployment as recorded by the network subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphDeployment {
    /// entity id, the hex form of the ipfs hash
    pub id: String,
    /// `Qm...` deployment hash
    pub ipfs_hash: String,
    /// creation time, unix seconds
    #[serde(default)]
    pub created_at: Option<i64>,
    /// chain the deployment indexes
    #[serde(default)]
    pub network: Option<String>,
    /// ipfs hash of the graphql schema file
    #[serde(default)]
    pub schema_ipfs_hash: Option<String>,
    /// number of subgraphs publishing this deployment
    #[serde(default)]
    pub subgraph_count: Option<i64>,
    /// subgraph versions that point at this deployment
    #[serde(default)]
    pub versions: Vec<DeploymentVersion>,
}

/// one subgraph version publishing a deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentVersion {
    /// the subgraph owning the version
    pub subgraph: SubgraphMetadata,
}

/// display metadata of a subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphMetadata {
    /// name shown in the explorer
    #[serde(default)]
    pub display_name: Option<String>,
    /// free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// project website
    #[serde(default)]
    pub website: Option<String>,
}

/// active subgraphs whose display name contains a search term
pub struct SearchSubgraphs;

impl Operation for SearchSubgraphs {
    const QUERY: &'static str = r#"query SearchSubgraphs($searchText: String!, $limit: Int!) {
  subgraphs(
    where: { displayName_contains_nocase: $searchText, active: true }
    first: $limit
    orderBy: signalledTokens
    orderDirection: desc
  ) {
    id
    displayName
    description
    website
    signalledTokens
    createdAt
    currentVersion {
      id
      subgraphDeployment {
        id
        ipfsHash
        network
      }
    }
  }
}"#;
    type Response = SubgraphList;
}

/// active subgraphs whose current deployment indexes a given chain
pub struct SubgraphsForNetwork;

impl Operation for SubgraphsForNetwork {
    const QUERY: &'static str = r#"query SubgraphsForNetwork($network: String!, $limit: Int!) {
  subgraphs(
    where: {
      currentVersion_: { subgraphDeployment_: { network: $network } }
      active: true
    }
    first: $limit
    orderBy: signalledTokens
    orderDirection: desc
  ) {
    id
    displayName
    description
    website
    signalledTokens
    createdAt
    currentVersion {
      id
      subgraphDeployment {
        id
        ipfsHash
        network
      }
    }
  }
}"#;
    type Response = SubgraphList;
}

/// `data` of a subgraph listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphList {
    /// matching subgraphs, highest signal first
    pub subgraphs: Vec<SubgraphSummary>,
}

/// subgraph registry entry as listed by the network subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphSummary {
    /// subgraph id, usable with [`Client::query_by_subgraph_id`]
    pub id: String,
    /// name shown in the explorer
    #[serde(default)]
    pub display_name: Option<String>,
    /// free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// project website
    #[serde(default)]
    pub website: Option<String>,
    /// curation signal in wei, as a decimal string
    #[serde(default)]
    pub signalled_tokens: Option<String>,
    /// creation time, unix seconds
    #[serde(default)]
    pub created_at: Option<i64>,
    /// latest published version; `None` before the first publish
    #[serde(default)]
    pub current_version: Option<SubgraphVersion>,
}

impl SubgraphSummary {
    /// deployment hash of the current version, if published
    pub fn deployment_hash(&self) -> Option<&str> {
        self.current_version
            .as_ref()
            .and_then(|version| version.subgraph_deployment.as_ref())
            .map(|deployment| deployment.ipfs_hash.as_str())
    }
}

/// a published version of a subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphVersion {
    /// version entity id
    pub id: String,
    /// the deployment this version points at
    #[serde(default)]
    pub subgraph_deployment: Option<DeploymentRef>,
}

/// short reference to a deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRef {
    /// entity id, hex form
    pub id: String,
    /// `Qm...` deployment hash
    pub ipfs_hash: String,
    /// chain the deployment indexes
    #[serde(default)]
    pub network: Option<String>,
}

impl Client {
    fn network_endpoint(&self) -> Endpoint {
        Endpoint::classify(self.config().network_subgraph_id.clone())
    }

    /// look up a deployment in the network subgraph by its `Qm...` hash
    ///
    /// returns `None` when the network subgraph does not know the hash.
    pub async fn deployment_info(&self, ipfs_hash: &str) -> Result<Option<SubgraphDeployment>> {
        self.deployment_info_with(ipfs_hash, |url, auth, body| self.post(url, auth, body))
            .await
    }

    /// search active subgraphs by display name, highest signal first
    pub async fn search_subgraphs(&self, text: &str, limit: u32) -> Result<Vec<SubgraphSummary>> {
        self.search_subgraphs_with(text, limit, |url, auth, body| self.post(url, auth, body))
            .await
    }

    /// active subgraphs indexing `network` (e.g. "mainnet", "arbitrum-one")
    pub async fn subgraphs_for_network(
        &self,
        network: &str,
        limit: u32,
    ) -> Result<Vec<SubgraphSummary>> {
        self.subgraphs_for_network_with(network, limit, |url, auth, body| {
            self.post(url, auth, body)
        })
        .await
    }

    pub(crate) async fn deployment_info_with<F, Fut>(
        &self,
        ipfs_hash: &str,
        send: F,
    ) -> Result<Option<SubgraphDeployment>>
    where
        F: FnOnce(Url, Option<HeaderValue>, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let request = DeploymentInfo::request(Variables::new()).variable("ipfsHash", ipfs_hash);
        let response: GraphQlResponse<DeploymentInfoData> = self
            .query_with(&self.network_endpoint(), &request, send)
            .await?;
        let data = response
            .data
            .ok_or_else(|| Error::MissingData("subgraphDeployments".to_string()))?;
        Ok(data.subgraph_deployments.into_iter().next())
    }

    pub(crate) async fn search_subgraphs_with<F, Fut>(
        &self,
        text: &str,
        limit: u32,
        send: F,
    ) -> Result<Vec<SubgraphSummary>>
    where
        F: FnOnce(Url, Option<HeaderValue>, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let request = SearchSubgraphs::request(Variables::new())
            .variable("searchText", text)
            .variable("limit", limit);
        self.list_subgraphs_with(&request, send).await
    }

    pub(crate) async fn subgraphs_for_network_with<F, Fut>(
        &self,
        network: &str,
        limit: u32,
        send: F,
    ) -> Result<Vec<SubgraphSummary>>
    where
        F: FnOnce(Url, Option<HeaderValue>, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let request = SubgraphsForNetwork::request(Variables::new())
            .variable("network", network)
            .variable("limit", limit);
        self.list_subgraphs_with(&request, send).await
    }

    async fn list_subgraphs_with<F, Fut>(
        &self,
        request: &QueryRequest,
        send: F,
    ) -> Result<Vec<SubgraphSummary>>
    where
        F: FnOnce(Url, Option<HeaderValue>, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let response: GraphQlResponse<SubgraphList> = self
            .query_with(&self.network_endpoint(), request, send)
            .await?;
        let data = response
            .data
            .ok_or_else(|| Error::MissingData("subgraphs".to_string()))?;
        Ok(data.subgraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, DEFAULT_NETWORK_SUBGRAPH_ID};

    const DEPLOYMENT_HASH: &str = "QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh";

    #[test]
    fn test_network_queries_parse() {
        for query in [
            DeploymentInfo::QUERY,
            SearchSubgraphs::QUERY,
            SubgraphsForNetwork::QUERY,
        ] {
            graphql_parser::parse_query::<String>(query).unwrap();
        }
    }

    #[test]
    fn test_subgraph_summary_decode() {
        let list: SubgraphList = serde_json::from_value(serde_json::json!({
            "subgraphs": [
                {
                    "id": "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYZ22YwKx9QqPWVTH7CZ",
                    "displayName": "Uniswap V3",
                    "signalledTokens": "123450000000000000000",
                    "createdAt": 1700000000,
                    "currentVersion": {
                        "id": "0xabc-0",
                        "subgraphDeployment": {
                            "id": "0xdef",
                            "ipfsHash": "QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh",
                            "network": "mainnet"
                        }
                    }
                },
                {"id": "unpublished", "currentVersion": null}
            ]
        }))
        .unwrap();

        assert_eq!(list.subgraphs.len(), 2);
        let uniswap = &list.subgraphs[0];
        assert_eq!(uniswap.display_name.as_deref(), Some("Uniswap V3"));
        assert_eq!(
            uniswap.deployment_hash(),
            Some("QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh")
        );
        assert_eq!(list.subgraphs[1].deployment_hash(), None);
    }

    #[test]
    fn test_deployment_info_decode() {
        let data: DeploymentInfoData = serde_json::from_value(serde_json::json!({
            "subgraphDeployments": [{
                "id": "0xdef",
                "ipfsHash": "QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh",
                "createdAt": 1700000000,
                "subgraphCount": 2,
                "versions": [{"subgraph": {"displayName": "Uniswap V3"}}]
            }]
        }))
        .unwrap();
        let deployment = &data.subgraph_deployments[0];
        assert_eq!(deployment.subgraph_count, Some(2));
        assert_eq!(deployment.network, None);
        assert_eq!(
            deployment.versions[0].subgraph.display_name.as_deref(),
            Some("Uniswap V3")
        );
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_deployment_info_filters_by_ipfs_hash() {
        let client = Client::new(ClientConfig::new("k")).unwrap();
        let deployment = client
            .deployment_info_with(DEPLOYMENT_HASH, |url, auth, body| async move {
                assert_eq!(
                    url.as_str(),
                    format!("https://gateway.thegraph.com/api/k/subgraphs/id/{DEFAULT_NETWORK_SUBGRAPH_ID}")
                );
                assert!(auth.is_none());
                assert_eq!(body["variables"], serde_json::json!({"ipfsHash": DEPLOYMENT_HASH}));
                assert!(body["query"]
                    .as_str()
                    .unwrap()
                    .contains("where: { ipfsHash: $ipfsHash }"));
                Ok((
                    StatusCode::OK,
                    format!(r#"{{"data":{{"subgraphDeployments":[{{"id":"0xdef","ipfsHash":"{DEPLOYMENT_HASH}","network":"mainnet"}}]}}}}"#),
                ))
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deployment.id, "0xdef");
        assert_eq!(deployment.network.as_deref(), Some("mainnet"));
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_deployment_info_unknown_hash() {
        let client = Client::new(ClientConfig::new("k")).unwrap();
        let deployment = client
            .deployment_info_with(DEPLOYMENT_HASH, |_url, _auth, _body| async move {
                Ok((StatusCode::OK, r#"{"data":{"subgraphDeployments":[]}}"#.to_string()))
            })
            .await
            .unwrap();
        assert!(deployment.is_none());
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_search_subgraphs_sends_text_and_limit() {
        let client = Client::new(ClientConfig::new("k").with_network_subgraph("custom-id")).unwrap();
        let subgraphs = client
            .search_subgraphs_with("uniswap", 5, |url, auth, body| async move {
                assert_eq!(url.path(), "/api/k/subgraphs/id/custom-id");
                assert!(auth.is_none());
                assert_eq!(
                    body["variables"],
                    serde_json::json!({"searchText": "uniswap", "limit": 5})
                );
                Ok((
                    StatusCode::OK,
                    r#"{"data":{"subgraphs":[{"id":"a","displayName":"Uniswap V3"},{"id":"b"}]}}"#
                        .to_string(),
                ))
            })
            .await
            .unwrap();
        let ids: Vec<_> = subgraphs.iter().map(|subgraph| subgraph.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_subgraphs_for_network_sends_chain() {
        let client = Client::new(ClientConfig::new("k")).unwrap();
        let subgraphs = client
            .subgraphs_for_network_with("arbitrum-one", 10, |_url, _auth, body| async move {
                assert_eq!(
                    body["variables"],
                    serde_json::json!({"network": "arbitrum-one", "limit": 10})
                );
                Ok((StatusCode::OK, r#"{"data":{"subgraphs":[]}}"#.to_string()))
            })
            .await
            .unwrap();
        assert!(subgraphs.is_empty());
    }

    #[cfg_attr(miri, ignore)]
    #[tokio::test]
    async fn test_network_lookups_without_data() {
        let client = Client::new(ClientConfig::new("k")).unwrap();
        let err = client
            .search_subgraphs_with("uniswap", 5, |_url, _auth, _body| async move {
                Ok((StatusCode::OK, r#"{"data":null}"#.to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingData(ref what) if what == "subgraphs"));

        let err = client
            .deployment_info_with(DEPLOYMENT_HASH, |_url, _auth, _body| async move {
                Ok((StatusCode::OK, "{}".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingData(ref what) if what == "subgraphDeployments"));
    }

    #[test]
    fn test_network_endpoint_uses_configured_id() {
        let client = Client::new(ClientConfig::new("k").with_network_subgraph("custom-id")).unwrap();
        assert_eq!(
            client.network_endpoint(),
            Endpoint::Subgraph("custom-id".to_string())
        );
    }
}
