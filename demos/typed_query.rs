use graph_gateway::{Client, ClientConfig, Operation, Variables};
use serde::Deserialize;
use std::env;

// uniswap v3 on mainnet, by deployment hash
const DEPLOYMENT_ID: &str = "QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh";

struct Factories;

impl Operation for Factories {
    const QUERY: &'static str = "query Factories($first: Int!) { factories(first: $first) { id poolCount totalValueLockedUSD } }";
    type Response = Data;
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Data {
    factories: Vec<Factory>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
#[serde(rename_all = "camelCase")]
struct Factory {
    id: String,
    pool_count: String,
    #[serde(rename = "totalValueLockedUSD")]
    total_value_locked_usd: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new(ClientConfig::from_optional(env::var("GATEWAY_API_KEY").ok()))?;

    let mut variables = Variables::new();
    variables.insert("first".to_string(), 2.into());

    let response = client.execute::<Factories>(DEPLOYMENT_ID, variables).await?;
    println!("response: {response:?}");

    if let Some(deployment) = client.deployment_info(DEPLOYMENT_ID).await? {
        println!("network subgraph entry: {deployment:?}");
    }

    Ok(())
}
