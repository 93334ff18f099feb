//! Document and Graph Round Trip Example
//!
//! Creates, reads and deletes an XML document and a Turtle graph on a live
//! MarkLogic server. Connection settings come from `MARKLOGIC_URL`,
//! `MARKLOGIC_USERNAME` and `MARKLOGIC_PASSWORD`, read from the environment
//! or a `.env` file in the working directory.
//!
//! Run with: cargo run -p marklogic-rs --example round_trip
//! Set `LOG_JSON=1` for JSON log lines.

use marklogic_core::telemetry;
use marklogic_rs::{Client, ClientConfig};

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<item sku="A-100"><name>Widget</name><costPerItem>3.50</costPerItem></item>"#;

const TRIPLES: &str = r#"@prefix ex: <http://example.org/inventory#> .
ex:widget ex:name "Widget" ;
    ex:costPerItem 3.50 ."#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_telemetry(std::env::var("LOG_JSON").is_ok())?;

    let config = ClientConfig::from_env()?;
    let client = Client::from_config(&config)?;
    println!(
        "Connected to {} (API {}) as {}\n",
        client.base_url(),
        client.api_version(),
        client.username()
    );

    // Document round trip
    let uri = format!("examples/{}.xml", uuid::Uuid::new_v4());
    let response = client.create_xml(&uri, DOCUMENT).await?;
    println!("📝 PUT {} -> {}", uri, response.status());

    let response = client.get_document(&uri).await?;
    println!("   GET -> {}", response.status());
    println!("   {}\n", response.text());

    let response = client.delete_document(&uri).await?;
    println!("🗑  DELETE -> {}", response.status());
    let response = client.get_document(&uri).await?;
    println!("   GET after delete -> {}\n", response.status());

    // Graph round trip
    let graph_uri = format!("{}_example_graph", uuid::Uuid::new_v4());
    let response = client.create_triples_ttl(TRIPLES, Some(graph_uri.as_str())).await?;
    println!("🔗 POST graph {} -> {}", graph_uri, response.status());

    let response = client.get_graph(&graph_uri).await?;
    println!("   GET -> {}", response.status());
    println!("   {}\n", response.text());

    let response = client.delete_graph(&graph_uri).await?;
    println!("🗑  DELETE graph -> {}", response.status());

    Ok(())
}
