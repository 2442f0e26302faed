//! Fetch a raw OMDb search or detail response and print its keys next to the
//! normalized record.
//! Usage:
//!   cargo run --bin omdb_props -- search <query>
//!   cargo run --bin omdb_props -- detail <imdb_id>
//! Requires OMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use popcorn::config::Config;
use popcorn::omdb::{CatalogApi, OmdbClient};
use reqwest::Client;
use serde_json::Value;
use std::env;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lookup {
    Search,
    Detail,
}

impl Lookup {
    fn param(&self) -> &'static str {
        match self {
            Lookup::Search => "s",
            Lookup::Detail => "i",
        }
    }
}

impl FromStr for Lookup {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "search" => Ok(Lookup::Search),
            "detail" => Ok(Lookup::Detail),
            _ => Err(anyhow::anyhow!("lookup must be 'search' or 'detail'")),
        }
    }
}

fn print_keys(label: &str, value: &Value) {
    match value.as_object() {
        Some(obj) => {
            println!("{label}:");
            for (key, v) in obj {
                let kind = match v {
                    Value::Null => "null",
                    Value::Bool(_) => "bool",
                    Value::Number(_) => "number",
                    Value::String(_) => "string",
                    Value::Array(_) => "array",
                    Value::Object(_) => "object",
                };
                println!("  {key}: {kind}");
            }
        }
        None => println!("{label}: not an object ({value})"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let mut args = env::args().skip(1);
    let lookup: Lookup = args
        .next()
        .context("usage: omdb_props <search|detail> <value>")?
        .parse()?;
    let value = args.next().context("missing query or id")?;

    let config = Config::from_env()?;
    let url = format!(
        "{}?apikey={}&{}={}",
        config.omdb_base_url,
        urlencoding::encode(&config.omdb_api_key),
        lookup.param(),
        urlencoding::encode(&value)
    );
    let raw: Value = Client::new()
        .get(&url)
        .send()
        .await
        .context("Failed to call OMDb")?
        .error_for_status()
        .context("OMDb returned an error status")?
        .json()
        .await
        .context("Failed to parse OMDb response")?;

    print_keys("envelope", &raw);
    if let Some(first) = raw.get("Search").and_then(|s| s.as_array()).and_then(|a| a.first()) {
        print_keys("first search entry", first);
    }

    let client = OmdbClient::from_config(&config)?;
    let cancel = CancellationToken::new();
    match lookup {
        Lookup::Search => match client.search(&value, &cancel).await {
            Ok(results) => println!("normalized: {}", serde_json::to_string_pretty(&results)?),
            Err(e) => println!("normalized: error: {e}"),
        },
        Lookup::Detail => match client.fetch_detail(&value, &cancel).await {
            Ok(detail) => println!("normalized: {}", serde_json::to_string_pretty(&detail)?),
            Err(e) => println!("normalized: error: {e}"),
        },
    }

    Ok(())
}
