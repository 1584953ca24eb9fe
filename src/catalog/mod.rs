//! Remote catalog client.
//!
//! Three catalogs (skills, agents, MCP servers) are published as JSON files
//! under one base URL. Each kind is cached independently for [`CACHE_TTL`].
//! When a refresh fails, the last snapshot of that kind is served no matter
//! how old it is; only a kind that was never fetched surfaces the error.

pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::error::{ManagerError, Result};
use crate::util::join_url;

pub use types::*;

/// Default public catalog host.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/opencode-manager/catalog/main";

pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

struct CacheSlot<E> {
    catalog: Arc<Catalog<E>>,
    fetched_at: Instant,
}

/// Cache slot and fetch logic for one catalog kind.
struct CachedCatalog<K: CatalogKind> {
    slot: RwLock<Option<CacheSlot<K::Entry>>>,
}

impl<K: CatalogKind> CachedCatalog<K> {
    fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    async fn fresh(&self, ttl: Duration) -> Option<Arc<Catalog<K::Entry>>> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|slot| slot.fetched_at.elapsed() < ttl)
            .map(|slot| Arc::clone(&slot.catalog))
    }

    async fn stale(&self) -> Option<Arc<Catalog<K::Entry>>> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|slot| Arc::clone(&slot.catalog))
    }

    async fn store(&self, catalog: Catalog<K::Entry>) -> Arc<Catalog<K::Entry>> {
        let catalog = Arc::new(catalog);
        *self.slot.write().await = Some(CacheSlot {
            catalog: Arc::clone(&catalog),
            fetched_at: Instant::now(),
        });
        catalog
    }

    async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

/// Client for the remote resource catalogs.
pub struct CatalogClient {
    base_url: String,
    http: reqwest::Client,
    ttl: Duration,
    skills: CachedCatalog<SkillCatalog>,
    agents: CachedCatalog<AgentCatalog>,
    mcp_servers: CachedCatalog<McpCatalog>,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            ttl: CACHE_TTL,
            skills: CachedCatalog::new(),
            agents: CachedCatalog::new(),
            mcp_servers: CachedCatalog::new(),
        }
    }

    /// Override the cache lifetime (tests use a zero TTL to force refetches).
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_skills(&self, force_refresh: bool) -> Result<Vec<SkillEntry>> {
        let catalog = self.cached(&self.skills, force_refresh).await?;
        Ok(catalog.entries.clone())
    }

    pub async fn fetch_agents(&self, force_refresh: bool) -> Result<Vec<AgentEntry>> {
        let catalog = self.cached(&self.agents, force_refresh).await?;
        Ok(catalog.entries.clone())
    }

    pub async fn fetch_mcp_servers(&self, force_refresh: bool) -> Result<Vec<McpEntry>> {
        let catalog = self.cached(&self.mcp_servers, force_refresh).await?;
        Ok(catalog.entries.clone())
    }

    pub async fn fetch_skill_content(&self, id: &str) -> Result<String> {
        self.fetch_content(&self.skills, id).await
    }

    pub async fn fetch_agent_content(&self, id: &str) -> Result<String> {
        self.fetch_content(&self.agents, id).await
    }

    /// Look up a single MCP server entry by id.
    pub async fn find_mcp_server(&self, id: &str) -> Result<McpEntry> {
        self.find_entry(&self.mcp_servers, id).await
    }

    /// Drop every cached snapshot.
    pub async fn clear_cache(&self) {
        self.skills.clear().await;
        self.agents.clear().await;
        self.mcp_servers.clear().await;
        tracing::debug!("Catalog cache cleared");
    }

    async fn cached<K: CatalogKind>(
        &self,
        cache: &CachedCatalog<K>,
        force_refresh: bool,
    ) -> Result<Arc<Catalog<K::Entry>>> {
        if !force_refresh {
            if let Some(catalog) = cache.fresh(self.ttl).await {
                tracing::debug!(catalog = K::FILE, "Serving catalog from cache");
                return Ok(catalog);
            }
        }

        match self.download::<K>().await {
            Ok(catalog) => {
                tracing::debug!(
                    catalog = K::FILE,
                    entries = catalog.entries.len(),
                    version = %catalog.version,
                    "Fetched catalog"
                );
                Ok(cache.store(catalog).await)
            }
            Err(err) => match cache.stale().await {
                Some(catalog) => {
                    tracing::warn!(
                        catalog = K::FILE,
                        error = %err,
                        "Catalog refresh failed, serving cached snapshot"
                    );
                    Ok(catalog)
                }
                None => Err(err),
            },
        }
    }

    async fn download<K: CatalogKind>(&self) -> Result<Catalog<K::Entry>> {
        let raw = self.get_text(K::FILE).await?;
        K::decode(&raw).map_err(|e| ManagerError::RemoteFetch {
            message: format!("Invalid catalog {}: {}", K::FILE, e),
            status: None,
            body: None,
        })
    }

    async fn find_entry<K: CatalogKind>(
        &self,
        cache: &CachedCatalog<K>,
        id: &str,
    ) -> Result<K::Entry> {
        let catalog = self.cached(cache, false).await?;
        catalog
            .entries
            .iter()
            .find(|entry| K::entry_id(entry) == id)
            .cloned()
            .ok_or_else(|| ManagerError::not_found(K::KIND, id))
    }

    async fn fetch_content<K: CatalogKind>(
        &self,
        cache: &CachedCatalog<K>,
        id: &str,
    ) -> Result<String> {
        let entry = self.find_entry(cache, id).await?;
        let path = K::content_path(&entry)
            .ok_or_else(|| ManagerError::not_found(K::KIND, id))?
            .to_string();
        self.get_text(&path).await
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = join_url(&self.base_url, path);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ManagerError::RemoteFetch {
                message: format!("Failed to fetch {} (HTTP {})", path, status.as_u16()),
                status: Some(status.as_u16()),
                body: Some(body),
            });
        }
        Ok(response.text().await?)
    }
}
