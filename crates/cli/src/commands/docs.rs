//! `baton docs`: document store commands.

use baton_config::BatonConfig;
use baton_core::{Document, DocumentQuery};

fn collection_or_default(config: &BatonConfig, collection: Option<String>) -> String {
    collection.unwrap_or_else(|| config.documents.collection.clone())
}

pub async fn add(
    config: &BatonConfig,
    contents: Vec<String>,
    collection: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::build_store(config);
    let collection = collection_or_default(config, collection);

    let documents: Vec<Document> = contents.into_iter().map(Document::new).collect();
    for document in &documents {
        println!("{}", document.id);
    }
    store.extend(&collection, documents).await?;

    if config.documents.is_in_memory() {
        eprintln!("note: documents.path is \":memory:\"; nothing was persisted");
    }
    Ok(())
}

pub async fn query(
    config: &BatonConfig,
    text: &str,
    count: Option<usize>,
    collection: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::build_store(config);
    let query = DocumentQuery::text(text)
        .with_result_count(count.unwrap_or(config.documents.result_count))
        .in_collection(collection_or_default(config, collection));

    let results = store.query(query).await?;
    if results.is_empty() {
        println!("No documents found.");
    }
    for (i, document) in results.iter().enumerate() {
        println!("{:>2}. [{}] {}", i + 1, document.id, document.content);
    }
    Ok(())
}

pub async fn count(
    config: &BatonConfig,
    collection: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::build_store(config);
    let collection = collection_or_default(config, collection);
    println!("{}", store.count(&collection).await?);
    Ok(())
}
