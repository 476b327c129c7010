//! `hubcache keys` and `hubcache entries`: inspect the cache store.

use hubcache_core::Error;
use serde::Serialize;

use super::Context;

/// Output from the entries command.
#[derive(Debug, Clone, Serialize)]
pub struct EntriesOutput {
    pub cache_name: String,
    /// Request URLs in insertion order.
    pub entries: Vec<String>,
}

/// Implementation of the keys command.
pub async fn keys_impl(ctx: &Context) -> Result<Vec<String>, Error> {
    ctx.storage.keys().await
}

/// Implementation of the entries command. Defaults to the configured
/// generation when `name` is absent.
pub async fn entries_impl(ctx: &Context, name: Option<&str>) -> Result<EntriesOutput, Error> {
    let cache_name = match name {
        Some(name) => name.to_string(),
        None => ctx.config.cache_version().map_err(|e| Error::InvalidInput(e.to_string()))?.cache_name().to_string(),
    };
    let entries = ctx.storage.entries(&cache_name).await?;
    Ok(EntriesOutput { cache_name, entries })
}
