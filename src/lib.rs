//! the graph gateway client
//!
//! this crate provides a small async client for querying subgraphs through
//! the graph's hosted gateway. start with [`Client`] and [`ClientConfig`],
//! then use `query_auto` for ad-hoc queries or `execute` with an
//! [`Operation`] for typed responses.
//!
//! subgraph ids are queried with the api key in the url path; deployment
//! hashes (`Qm...`) use a fixed path and a bearer token. `query_auto` picks
//! the scheme from the shape of the id.
//!
//! ## quick start
//!
//! ```no_run
//! use graph_gateway::{Client, ClientConfig, QueryRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new("api-key"))?;
//! let request = QueryRequest::new("query Pools($first: Int!) { pools(first: $first) { id } }")
//!     .variable("first", 3);
//! let response = client
//!     .query_auto("5zvR82QoaXYFyDEKLZ9t6v9adgnptxYZ22YwKx9QqPWVTH7CZ", &request)
//!     .await?;
//! println!("{:?}", response.data);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod endpoint;
mod error;
mod graphql;
mod network;
mod operation;
mod pagination;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_GATEWAY_URL, DEFAULT_NETWORK_SUBGRAPH_ID};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use graphql::{
    GraphQlError, GraphQlLocation, GraphQlResponse, QueryRequest, QueryResponse, Variables,
};
pub use network::{
    DeploymentInfo, DeploymentInfoData, DeploymentRef, DeploymentVersion, SearchSubgraphs,
    SubgraphDeployment, SubgraphList, SubgraphMetadata, SubgraphSummary, SubgraphVersion,
    SubgraphsForNetwork,
};
pub use operation::{
    EntityType, EntityTypeList, EntityTypes, EntityTypesData, FullIntrospection, NamedType,
    Operation, QueryTypeSchema, SchemaQueryType, SchemaQueryTypeData,
};
pub use pagination::{EdgePage, Paginator};
