//! query subgraphs through the graph gateway from the command line
//!
//! the api key comes from `--api-key` or `GATEWAY_API_KEY`. query documents
//! are parsed locally before anything is sent, so syntax errors and
//! ambiguous multi-operation documents fail without a round trip.
//!
//! command help reference (kept in sync with `graph-gateway --help`):
#[doc = concat!("```text\n", include_str!("graph-gateway-help.txt"), "\n```")]
pub const CLI_HELP: &str = include_str!("graph-gateway-help.txt");

use graph_gateway::{Client, ClientConfig, Endpoint, Error, QueryRequest, SubgraphSummary, Variables};
use graphql_parser::query::{Definition, OperationDefinition};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LIMIT: u32 = 10;
const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug)]
struct Args {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    command: Command,
}

#[derive(Debug)]
enum Command {
    Query {
        id: String,
        source: QuerySource,
        variables: Variables,
        operation: Option<String>,
    },
    Test {
        id: String,
    },
    Types {
        id: String,
    },
    Schema {
        id: String,
    },
    Entities {
        id: String,
        collection: String,
        fields: String,
        page_size: u32,
    },
    Deployment {
        hash: String,
    },
    Search {
        text: String,
        limit: u32,
    },
    Network {
        chain: String,
        limit: u32,
    },
}

#[derive(Debug)]
enum QuerySource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug)]
enum ParseArgsError {
    Help,
    Message(String),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args = match parse_args(std::env::args().collect()) {
        Ok(args) => args,
        Err(ParseArgsError::Help) => {
            print!("{CLI_HELP}");
            return;
        }
        Err(ParseArgsError::Message(err)) => {
            eprintln!("{err}\n\n{CLI_HELP}");
            std::process::exit(1);
        }
    };

    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("GATEWAY_API_KEY").ok());
    let mut config = ClientConfig::from_optional(api_key);
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(timeout);
    }

    let client = match Client::new(config) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&client, args.command).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run(client: &Client, command: Command) -> Result<(), String> {
    match command {
        Command::Query {
            id,
            source,
            variables,
            operation,
        } => {
            let query = load_query(&source)?;
            check_query(&query, operation.as_deref())?;
            let mut request = QueryRequest::new(query).with_variables(variables);
            if let Some(operation) = operation {
                request = request.with_operation_name(operation);
            }
            let response = client.query_auto(&id, &request).await.map_err(describe)?;
            print_json(&response.data)
        }
        Command::Test { id } => {
            let response = client.test_connection(&id).await.map_err(describe)?;
            let query_type = response
                .data
                .as_ref()
                .and_then(|data| data.pointer("/__schema/queryType/name"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<unknown>");
            println!("ok: {} (query type {query_type})", Endpoint::classify(id));
            Ok(())
        }
        Command::Types { id } => {
            let types = client.list_entity_types(&id).await.map_err(describe)?;
            for entity in types {
                match entity.description {
                    Some(description) if !description.is_empty() => {
                        println!("{}\t{}", entity.name, description)
                    }
                    _ => println!("{}", entity.name),
                }
            }
            Ok(())
        }
        Command::Schema { id } => {
            let response = client.introspect_schema(&id).await.map_err(describe)?;
            print_json(&response.data)
        }
        Command::Entities {
            id,
            collection,
            fields,
            page_size,
        } => {
            let entities = client
                .paginate_entities(&id, &collection, &fields, page_size)
                .await
                .map_err(describe)?;
            print_json(&entities)?;
            eprintln!("{} {collection}", entities.len());
            Ok(())
        }
        Command::Deployment { hash } => match client.deployment_info(&hash).await.map_err(describe)? {
            Some(deployment) => print_json(&deployment),
            None => Err(format!("deployment {hash} not found in the network subgraph")),
        },
        Command::Search { text, limit } => {
            let subgraphs = client
                .search_subgraphs(&text, limit)
                .await
                .map_err(describe)?;
            print_subgraphs(&subgraphs);
            Ok(())
        }
        Command::Network { chain, limit } => {
            let subgraphs = client
                .subgraphs_for_network(&chain, limit)
                .await
                .map_err(describe)?;
            print_subgraphs(&subgraphs);
            Ok(())
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Args, ParseArgsError> {
    let mut api_key = None;
    let mut base_url = None;
    let mut timeout = None;
    let mut query_text = None;
    let mut query_file = None;
    let mut variables = Variables::new();
    let mut operation = None;
    let mut fields = String::new();
    let mut page_size = DEFAULT_PAGE_SIZE;
    let mut limit = DEFAULT_LIMIT;
    let mut positionals = Vec::new();

    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--api-key" => api_key = Some(flag_value(&mut iter, "--api-key")?),
            "--base-url" => base_url = Some(flag_value(&mut iter, "--base-url")?),
            "--timeout" => {
                let secs = parse_number(&flag_value(&mut iter, "--timeout")?, "--timeout")?;
                timeout = Some(Duration::from_secs(u64::from(secs)));
            }
            "--query" => query_text = Some(flag_value(&mut iter, "--query")?),
            "--query-file" => query_file = Some(PathBuf::from(flag_value(&mut iter, "--query-file")?)),
            "--var" => {
                let (name, value) = parse_var(&flag_value(&mut iter, "--var")?)?;
                variables.insert(name, value);
            }
            "--operation" => operation = Some(flag_value(&mut iter, "--operation")?),
            "--fields" => fields = flag_value(&mut iter, "--fields")?,
            "--page-size" => {
                page_size = parse_number(&flag_value(&mut iter, "--page-size")?, "--page-size")?
            }
            "--limit" => limit = parse_number(&flag_value(&mut iter, "--limit")?, "--limit")?,
            "--help" | "-h" => return Err(ParseArgsError::Help),
            other if other.starts_with("--") => {
                return Err(ParseArgsError::Message(format!("unknown argument: {other}")))
            }
            _ => positionals.push(arg),
        }
    }

    let command = match positionals.first().map(String::as_str) {
        None => return Err(ParseArgsError::Message("a command is required".to_string())),
        Some("query") => {
            expect_arity(&positionals, 1)?;
            let source = match (query_text, query_file) {
                (Some(text), None) => QuerySource::Inline(text),
                (None, Some(path)) => QuerySource::File(path),
                _ => {
                    return Err(ParseArgsError::Message(
                        "query requires exactly one of --query or --query-file".to_string(),
                    ))
                }
            };
            Command::Query {
                id: positionals[1].clone(),
                source,
                variables,
                operation,
            }
        }
        Some("test") => {
            expect_arity(&positionals, 1)?;
            Command::Test {
                id: positionals[1].clone(),
            }
        }
        Some("types") => {
            expect_arity(&positionals, 1)?;
            Command::Types {
                id: positionals[1].clone(),
            }
        }
        Some("schema") => {
            expect_arity(&positionals, 1)?;
            Command::Schema {
                id: positionals[1].clone(),
            }
        }
        Some("entities") => {
            expect_arity(&positionals, 2)?;
            Command::Entities {
                id: positionals[1].clone(),
                collection: positionals[2].clone(),
                fields,
                page_size,
            }
        }
        Some("deployment") => {
            expect_arity(&positionals, 1)?;
            Command::Deployment {
                hash: positionals[1].clone(),
            }
        }
        Some("search") => {
            expect_arity(&positionals, 1)?;
            Command::Search {
                text: positionals[1].clone(),
                limit,
            }
        }
        Some("network") => {
            expect_arity(&positionals, 1)?;
            Command::Network {
                chain: positionals[1].clone(),
                limit,
            }
        }
        Some(other) => {
            return Err(ParseArgsError::Message(format!("unknown command: {other}")))
        }
    };

    Ok(Args {
        api_key,
        base_url,
        timeout,
        command,
    })
}

fn flag_value(
    iter: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<String, ParseArgsError> {
    iter.next()
        .ok_or_else(|| ParseArgsError::Message(format!("{flag} requires a value")))
}

fn parse_number(value: &str, flag: &str) -> Result<u32, ParseArgsError> {
    value
        .parse()
        .map_err(|_| ParseArgsError::Message(format!("{flag} expects a number, got {value}")))
}

fn expect_arity(positionals: &[String], expected: usize) -> Result<(), ParseArgsError> {
    if positionals.len() != expected + 1 {
        return Err(ParseArgsError::Message(format!(
            "{} expects {expected} argument(s), got {}",
            positionals[0],
            positionals.len() - 1
        )));
    }
    Ok(())
}

/// `name=<json>`; values that are not valid json are sent as strings
fn parse_var(raw: &str) -> Result<(String, serde_json::Value), ParseArgsError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| ParseArgsError::Message(format!("--var expects name=value, got {raw}")))?;
    if name.is_empty() {
        return Err(ParseArgsError::Message(format!("--var has an empty name: {raw}")));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn load_query(source: &QuerySource) -> Result<String, String> {
    match source {
        QuerySource::Inline(text) => Ok(text.clone()),
        QuerySource::File(path) => fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {err}", path.display())),
    }
}

/// reject documents the gateway would refuse or could not disambiguate
fn check_query(query: &str, operation: Option<&str>) -> Result<(), String> {
    let document = graphql_parser::parse_query::<String>(query)
        .map_err(|err| format!("invalid graphql document: {err}"))?;

    let mut names = Vec::new();
    for definition in &document.definitions {
        let Definition::Operation(op) = definition else {
            continue;
        };
        let name = match op {
            OperationDefinition::SelectionSet(_) => None,
            OperationDefinition::Query(query) => query.name.clone(),
            OperationDefinition::Mutation(_) | OperationDefinition::Subscription(_) => {
                return Err("the gateway only serves queries".to_string())
            }
        };
        names.push(name);
    }

    match (operation, names.len()) {
        (_, 0) => Err("document contains no operation".to_string()),
        (Some(wanted), _) => {
            if names.iter().any(|name| name.as_deref() == Some(wanted)) {
                Ok(())
            } else {
                Err(format!("operation {wanted} not found in document"))
            }
        }
        (None, 1) => Ok(()),
        (None, count) => Err(format!(
            "document holds {count} operations; pick one with --operation"
        )),
    }
}

fn describe(err: Error) -> String {
    let mut message = err.to_string();
    match &err {
        Error::Transport { body, .. } => {
            if let Ok(body) = serde_json::to_string_pretty(body) {
                message.push('\n');
                message.push_str(&body);
            }
        }
        Error::GraphQl { errors, .. } => {
            for error in errors.iter().skip(1) {
                message.push_str(&format!("\n  also: {error}"));
            }
        }
        _ => {}
    }
    if err.is_auth_error() {
        message.push_str("\ncheck the api key; get one from https://thegraph.com/studio/");
    }
    message
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

fn print_subgraphs(subgraphs: &[SubgraphSummary]) {
    if subgraphs.is_empty() {
        println!("no subgraphs found");
        return;
    }
    for (index, subgraph) in subgraphs.iter().enumerate() {
        println!(
            "{}. {}",
            index + 1,
            subgraph.display_name.as_deref().unwrap_or("<unnamed>")
        );
        println!("   id: {}", subgraph.id);
        if let Some(deployment) = subgraph
            .current_version
            .as_ref()
            .and_then(|version| version.subgraph_deployment.as_ref())
        {
            println!("   deployment: {}", deployment.ipfs_hash);
            println!(
                "   network: {}",
                deployment.network.as_deref().unwrap_or("unknown")
            );
        }
        if let Some(signal) = &subgraph.signalled_tokens {
            println!("   signal: {}", format_signal(signal));
        }
    }
}

/// curation signal is reported in wei
fn format_signal(wei: &str) -> String {
    match wei.parse::<f64>() {
        Ok(wei) => format!("{:.2} GRT", wei / 1e18),
        Err(_) => format!("{wei} wei"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("graph-gateway")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_parse_query_command() {
        let parsed = parse_args(args(&[
            "--api-key",
            "k",
            "query",
            "QmeB7YfNvLbM9AnSVeh5JvsfUwm1KVCtUDwaDLh5oxupGh",
            "--query",
            "{ pools { id } }",
            "--var",
            "first=5",
            "--var",
            "token=0xabc",
        ]))
        .unwrap();
        assert_eq!(parsed.api_key.as_deref(), Some("k"));
        match parsed.command {
            Command::Query {
                id,
                source: QuerySource::Inline(text),
                variables,
                operation: None,
            } => {
                assert!(id.starts_with("Qm"));
                assert_eq!(text, "{ pools { id } }");
                assert_eq!(variables["first"], 5);
                assert_eq!(variables["token"], "0xabc");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_requires_single_query_source() {
        let err = parse_args(args(&["query", "id"])).unwrap_err();
        assert!(matches!(err, ParseArgsError::Message(_)));

        let err = parse_args(args(&["query", "id", "--query", "{ a }", "--query-file", "q.graphql"]))
            .unwrap_err();
        assert!(matches!(err, ParseArgsError::Message(_)));
    }

    #[test]
    fn test_parse_defaults_and_errors() {
        let parsed = parse_args(args(&["search", "uniswap"])).unwrap();
        assert!(matches!(parsed.command, Command::Search { ref text, limit: 10 } if text == "uniswap"));

        let parsed = parse_args(args(&["entities", "id", "tokens", "--page-size", "50"])).unwrap();
        assert!(matches!(parsed.command, Command::Entities { page_size: 50, .. }));

        assert!(matches!(parse_args(args(&["--help"])), Err(ParseArgsError::Help)));
        assert!(matches!(parse_args(args(&[])), Err(ParseArgsError::Message(_))));
        assert!(matches!(parse_args(args(&["frobnicate"])), Err(ParseArgsError::Message(_))));
        assert!(matches!(parse_args(args(&["test"])), Err(ParseArgsError::Message(_))));
        assert!(matches!(
            parse_args(args(&["search", "x", "--limit", "many"])),
            Err(ParseArgsError::Message(_))
        ));
    }

    #[test]
    fn test_check_query() {
        assert!(check_query("{ pools { id } }", None).is_ok());
        assert!(check_query("{ pools { id }", None).is_err());
        assert!(check_query("mutation { x }", None).is_err());
        assert!(check_query("fragment F on Pool { id }", None).is_err());

        let two = "query A { a } query B { b }";
        assert!(check_query(two, None).is_err());
        assert!(check_query(two, Some("B")).is_ok());
        assert!(check_query(two, Some("C")).is_err());
    }

    #[test]
    fn test_parse_var() {
        let (name, value) = parse_var("where={\"id\":\"0x1\"}").unwrap();
        assert_eq!(name, "where");
        assert_eq!(value["id"], "0x1");
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=1").is_err());
    }

    #[test]
    fn test_format_signal() {
        assert_eq!(format_signal("1500000000000000000"), "1.50 GRT");
        assert_eq!(format_signal("n/a"), "n/a wei");
    }
}
