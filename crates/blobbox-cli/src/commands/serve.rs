use anyhow::Result;
use blobbox_config::Config;
use blobbox_rpc::RpcServer;
use blobbox_storage::BlobStore;

pub async fn handle(
    store: BlobStore,
    host: Option<String>,
    port: Option<u16>,
    config: &Config,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let limits = store.limits();

    println!("Starting blobbox on {}:{}", host, port);
    println!(
        "  Capacity: {} bytes ({:?} quota)",
        limits.capacity_bytes, limits.policy
    );

    RpcServer::serve(store, &host, port).await?;

    Ok(())
}
