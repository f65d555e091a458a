use graph_gateway::{Client, ClientConfig, QueryRequest};
use std::env;

// uniswap v3 on mainnet
const SUBGRAPH_ID: &str = "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYZ22YwKx9QqPWVTH7CZ";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let id = env::var("GRAPH_ID").unwrap_or_else(|_| SUBGRAPH_ID.to_string());
    let client = Client::new(ClientConfig::from_optional(env::var("GATEWAY_API_KEY").ok()))?;

    let connection = client.test_connection(&id).await?;
    println!("schema: {}", connection.data.unwrap_or_default());

    let request = QueryRequest::new(
        "query TopPools($first: Int!) {
            pools(first: $first, orderBy: totalValueLockedUSD, orderDirection: desc) {
                id
                token0 { symbol }
                token1 { symbol }
                totalValueLockedUSD
            }
        }",
    )
    .variable("first", 3);

    let response = client.query_auto(&id, &request).await?;
    println!("data: {}", response.data.unwrap_or_default());

    for entity in client.list_entity_types(&id).await?.iter().take(5) {
        println!("entity: {}", entity.name);
    }

    Ok(())
}
