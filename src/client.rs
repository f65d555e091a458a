//! main client
//!
//! one request/response exchange per call against the gateway, plus the
//! introspection and pagination helpers built on top of it.

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::graphql::{GraphQlResponse, QueryRequest, QueryResponse, Variables};
use crate::operation::{
    EntityType, EntityTypes, EntityTypesData, FullIntrospection, Operation, SchemaQueryType,
};
use crate::pagination::{EdgePage, Paginator};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// largest `first:` argument the gateway accepts
const MAX_PAGE_SIZE: u32 = 1000;

/// graphql client for the graph gateway
///
/// cheap to clone; clones share configuration and the connection pool.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    bearer: HeaderValue,
}

impl Client {
    /// create a new client
    ///
    /// fails with [`Error::Config`] before any request if the api key is
    /// missing or unusable, or the base url is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let bearer = bearer_header(&config.api_key)?;

        let http = match &config.http_client {
            Some(http) => http.clone(),
            None => {
                let mut builder = reqwest::Client::builder()
                    .default_headers(config.extra_headers.clone())
                    .user_agent(config.user_agent.clone())
                    .danger_accept_invalid_certs(!config.verify_ssl);
                if let Some(timeout) = config.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(customize) = &config.http_client_builder {
                    builder = customize(builder);
                }
                builder.build()?
            }
        };

        Ok(Self {
            config: Arc::new(config),
            http,
            bearer,
        })
    }

    /// access the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// query a subgraph by registry id; the api key travels in the url path
    pub async fn query_by_subgraph_id(
        &self,
        id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        self.query(&Endpoint::Subgraph(id.to_string()), request)
            .await
    }

    /// query a deployment by hash; the api key travels as a bearer token
    pub async fn query_by_deployment_id(
        &self,
        id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        self.query(&Endpoint::Deployment(id.to_string()), request)
            .await
    }

    /// classify `id` (see [`Endpoint::classify`]) and query it
    pub async fn query_auto(&self, id: &str, request: &QueryRequest) -> Result<QueryResponse> {
        self.query_auto_with(id, request, |url, auth, body| self.post(url, auth, body))
            .await
    }

    /// query an already classified endpoint
    pub async fn query(&self, endpoint: &Endpoint, request: &QueryRequest) -> Result<QueryResponse> {
        self.query_as(endpoint, request).await
    }

    /// query an endpoint and deserialize `data` into `T`
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        request: &QueryRequest,
    ) -> Result<GraphQlResponse<T>> {
        self.query_with(endpoint, request, |url, auth, body| self.post(url, auth, body))
            .await
    }

    /// run a typed operation against an auto-classified id
    pub async fn execute<O: Operation>(
        &self,
        id: &str,
        variables: Variables,
    ) -> Result<GraphQlResponse<O::Response>> {
        self.query_as(&Endpoint::classify(id), &O::request(variables))
            .await
    }

    /// cheap introspection round trip: `{ __schema { queryType { name } } }`
    pub async fn test_connection(&self, id: &str) -> Result<QueryResponse> {
        self.query_auto(id, &SchemaQueryType::request(Variables::new()))
            .await
    }

    /// list the entity (object) types of a subgraph, in schema order
    pub async fn list_entity_types(&self, id: &str) -> Result<Vec<EntityType>> {
        self.list_entity_types_with(id, |url, auth, body| self.post(url, auth, body))
            .await
    }

    /// run the full introspection query
    pub async fn introspect_schema(&self, id: &str) -> Result<QueryResponse> {
        self.query_auto(id, &FullIntrospection::request(Variables::new()))
            .await
    }

    /// fetch every entity of `collection`, walking pages ordered by `id`
    ///
    /// `fields` is a graphql selection added next to `id`, e.g.
    /// `"symbol name decimals"`. page size is clamped to 1..=1000.
    pub async fn paginate_entities(
        &self,
        id: &str,
        collection: &str,
        fields: &str,
        page_size: u32,
    ) -> Result<Vec<serde_json::Value>> {
        self.paginate_entities_with(id, collection, fields, page_size, |url, auth, body| {
            self.post(url, auth, body)
        })
        .await
    }

    pub(crate) async fn post(
        &self,
        url: Url,
        authorization: Option<HeaderValue>,
        body: serde_json::Value,
    ) -> Result<(StatusCode, String)> {
        let mut request = self.http.post(url).json(&body);
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        // subgraph urls carry the api key; keep it out of error messages
        let response = request.send().await.map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let text = response.text().await.map_err(reqwest::Error::without_url)?;
        Ok((status, text))
    }
}

fn bearer_header(api_key: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|err| Error::Config(format!("invalid api key header value: {err}")))?;
    value.set_sensitive(true);
    Ok(value)
}

fn parse_graphql_response<T: DeserializeOwned>(
    status: StatusCode,
    text: String,
) -> Result<GraphQlResponse<T>> {
    if !status.is_success() {
        let body = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(body) => body,
            Err(_) => serde_json::Value::String(text),
        };
        return Err(Error::Transport {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: QueryResponse = serde_json::from_str(&text)?;
    if parsed.has_errors() {
        let message = parsed
            .errors
            .first()
            .map(|err| err.message.clone())
            .unwrap_or_else(|| "graphql error".to_string());
        return Err(Error::GraphQl {
            status: status.as_u16(),
            errors: parsed.errors,
            data: parsed.data,
            message,
        });
    }

    let data = parsed.data.map(serde_json::from_value).transpose()?;
    Ok(GraphQlResponse {
        data,
        errors: Vec::new(),
        extensions: parsed.extensions,
    })
}

fn entity_page_query(collection: &str, fields: &str, cursor: &str) -> Result<String> {
    // inlined so the literal coerces to whatever scalar backs `id`
    let cursor = serde_json::to_string(cursor)?;
    Ok(format!(
        "query EntityPage($first: Int!) {{ {collection}(first: $first, orderBy: id, orderDirection: asc, where: {{ id_gt: {cursor} }}) {{ id {fields} }} }}"
    ))
}

impl Client {
    pub(crate) async fn query_with<T, F, Fut>(
        &self,
        endpoint: &Endpoint,
        request: &QueryRequest,
        send: F,
    ) -> Result<GraphQlResponse<T>>
    where
        T: DeserializeOwned,
        F: FnOnce(Url, Option<HeaderValue>, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let url = self.config.endpoint_url(endpoint)?;
        let authorization = endpoint.uses_bearer_auth().then(|| self.bearer.clone());
        let body = serde_json::to_value(request)?;

        tracing::debug!(kind = endpoint.kind(), id = endpoint.id(), "sending gateway query");
        let (status, text) = match send(url, authorization, body).await {
            Ok(exchange) => exchange,
            Err(err) => {
                tracing::warn!(kind = endpoint.kind(), id = endpoint.id(), error = %err, "gateway request failed");
                return Err(err);
            }
        };
        tracing::debug!(
            kind = endpoint.kind(),
            id = endpoint.id(),
            status = status.as_u16(),
            bytes = text.len(),
            "gateway responded"
        );

        parse_graphql_response(status, text)
    }

    pub(crate) async fn query_auto_with<F, Fut>(
        &self,
        id: &str,
        request: &QueryRequest,
        send: F,
    ) -> Result<QueryResponse>
    where
        F: FnOnce(Url, Option<HeaderValue>, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        self.query_with(&Endpoint::classify(id), request, send)
            .await
    }

    pub(crate) async fn list_entity_types_with<F, Fut>(
        &self,
        id: &str,
        send: F,
    ) -> Result<Vec<EntityType>>
    where
        F: FnOnce(Url, Option<HeaderValue>, serde_json::Value) -> Fut,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let response: GraphQlResponse<EntityTypesData> = self
            .query_with(
                &Endpoint::classify(id),
                &EntityTypes::request(Variables::new()),
                send,
            )
            .await?;
        let data = response
            .data
            .ok_or_else(|| Error::MissingData("__schema".to_string()))?;
        Ok(data.schema.types)
    }

    pub(crate) async fn paginate_entities_with<F, Fut>(
        &self,
        id: &str,
        collection: &str,
        fields: &str,
        page_size: u32,
        send: F,
    ) -> Result<Vec<serde_json::Value>>
    where
        F: Fn(Url, Option<HeaderValue>, serde_json::Value) -> Fut + Clone,
        Fut: Future<Output = Result<(StatusCode, String)>>,
    {
        let endpoint = &Endpoint::classify(id);
        let send = &send;
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let fetch = move |cursor: Option<String>| {
            let send = send.clone();
            async move {
                let query = entity_page_query(collection, fields, cursor.as_deref().unwrap_or(""))?;
                let request = QueryRequest::new(query).variable("first", page_size);
                self.query_with::<serde_json::Value, _, _>(endpoint, &request, send)
                    .await
            }
        };

        let extract = move |response: QueryResponse| -> Result<EdgePage<serde_json::Value, String>> {
            let nodes = response
                .data
                .as_ref()
                .and_then(|data| data.get(collection))
                .and_then(serde_json::Value::as_array)
                .cloned()
                .ok_or_else(|| Error::MissingData(collection.to_string()))?;
            let next_cursor = if nodes.len() == page_size as usize {
                nodes
                    .last()
                    .and_then(|node| node.get("id"))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            } else {
                None
            };
            Ok(EdgePage { nodes, next_cursor })
        };

        Paginator::new(fetch, extract).collect_all().await
    }
}
