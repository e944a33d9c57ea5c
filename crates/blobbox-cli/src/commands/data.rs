use anyhow::{Context, Result, bail};
use blobbox_storage::{BlobStore, SaveOutcome};
use serde_json::Value;

use crate::cli::DataCommands;

pub async fn handle(cmd: DataCommands, store: &BlobStore) -> Result<()> {
    match cmd {
        DataCommands::Set { name, json } => set(store, name, json).await,
        DataCommands::Get { name } => get(store, name).await,
        DataCommands::List => list(store).await,
        DataCommands::Reset { yes } => reset(store, yes).await,
        DataCommands::Stats => stats(store).await,
    }
}

async fn set(store: &BlobStore, name: String, json: String) -> Result<()> {
    let value = parse_document(&json)?;

    match store.save(&name, &value).await? {
        SaveOutcome::Saved => {
            println!("✓ Saved: {}", name);
            Ok(())
        }
        SaveOutcome::QuotaExceeded {
            used,
            incoming,
            capacity,
        } => bail!(
            "capacity exceeded: {} bytes used + {} incoming > {} allowed",
            used,
            incoming,
            capacity
        ),
        SaveOutcome::Unserializable => bail!("value could not be serialized"),
    }
}

async fn get(store: &BlobStore, name: String) -> Result<()> {
    match store.load(&name).await? {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => bail!("no data for name: {}", name),
    }
}

async fn list(store: &BlobStore) -> Result<()> {
    let entries = store.entries().await?;

    if entries.is_empty() {
        println!("No documents stored.");
        return Ok(());
    }

    println!("Documents:");
    for entry in entries {
        println!("  {} ({} bytes)", entry.name, entry.size_bytes);
    }

    Ok(())
}

async fn reset(store: &BlobStore, yes: bool) -> Result<()> {
    if !yes {
        print!("Delete every stored document? [y/N] ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = store.reset().await?;
    println!("✓ Removed {} document(s)", removed);

    Ok(())
}

async fn stats(store: &BlobStore) -> Result<()> {
    let stats = store.stats().await?;

    println!("Documents: {}", stats.documents);
    println!("Used:      {} bytes", stats.used_bytes);
    println!("Capacity:  {} bytes", stats.capacity_bytes);
    println!("Remaining: {} bytes", stats.remaining_bytes());

    Ok(())
}

fn parse_document(json: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(json).context("document is not valid JSON")?;
    if value.is_null() {
        bail!("document must not be null");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobbox_storage::{Storage, StoreLimits};
    use serde_json::json;

    async fn create_test_store(capacity_bytes: u64) -> BlobStore {
        let storage = Storage::in_memory().await.unwrap();
        let limits = StoreLimits {
            capacity_bytes,
            ..Default::default()
        };
        BlobStore::new(storage, limits)
    }

    #[test]
    fn test_parse_document() {
        assert_eq!(parse_document(r#"{"a": [1]}"#).unwrap(), json!({"a": [1]}));
        assert_eq!(parse_document("0").unwrap(), json!(0));
        assert!(parse_document("null").is_err());
        assert!(parse_document("{not json").is_err());
    }

    #[tokio::test]
    async fn test_set_and_reset() {
        let store = create_test_store(1024).await;

        set(&store, "memo".into(), r#"["a","b"]"#.into()).await.unwrap();
        assert_eq!(store.load("memo").await.unwrap(), Some(json!(["a", "b"])));
        get(&store, "memo".into()).await.unwrap();

        reset(&store, true).await.unwrap();
        assert!(store.names().await.unwrap().is_empty());
        assert!(get(&store, "memo".into()).await.is_err());
    }

    #[tokio::test]
    async fn test_set_over_capacity() {
        let store = create_test_store(4).await;

        let err = set(&store, "big".into(), r#""too long""#.into())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("capacity exceeded"));
        assert_eq!(store.load("big").await.unwrap(), None);
    }
}
