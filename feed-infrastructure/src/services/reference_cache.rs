// Caching reference resolver
// Memoizes upstream reference data for the process lifetime, deduplicates
// concurrent fetches of the same key class, and flushes each table to its
// JSON snapshot after every new resolution.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use feed_domain::{ReferenceResolver, ReferenceSource, SolarSystem};

use crate::utils::{load_json_or_default, write_json_atomic};

pub struct ReferenceCache {
    source: Arc<dyn ReferenceSource>,
    // Read paths take a scoped std read lock, never held across an await.
    systems: RwLock<HashMap<u32, SolarSystem>>,
    groups: RwLock<HashMap<u32, u32>>,
    names: RwLock<HashMap<u64, String>>,
    // One outstanding upstream fetch per table: a miss holds the table's
    // fetch lock across the network call, so concurrent misses on the same
    // key collapse into a single fetch.
    systems_fetch: Mutex<()>,
    groups_fetch: Mutex<()>,
    names_fetch: Mutex<()>,
    systems_path: PathBuf,
    groups_path: PathBuf,
    names_path: PathBuf,
}

impl ReferenceCache {
    pub async fn load(
        source: Arc<dyn ReferenceSource>,
        systems_path: impl Into<PathBuf>,
        groups_path: impl Into<PathBuf>,
        names_path: impl Into<PathBuf>,
    ) -> Self {
        let systems_path = systems_path.into();
        let groups_path = groups_path.into();
        let names_path = names_path.into();

        let systems: HashMap<u32, SolarSystem> = load_json_or_default(&systems_path).await;
        let groups: HashMap<u32, u32> = load_json_or_default(&groups_path).await;
        let names: HashMap<u64, String> = load_json_or_default(&names_path).await;

        ReferenceCache {
            source,
            systems: RwLock::new(systems),
            groups: RwLock::new(groups),
            names: RwLock::new(names),
            systems_fetch: Mutex::new(()),
            groups_fetch: Mutex::new(()),
            names_fetch: Mutex::new(()),
            systems_path,
            groups_path,
            names_path,
        }
    }

    async fn persist_systems(&self) {
        let snapshot = self.systems.read().unwrap().clone();
        if let Err(err) = write_json_atomic(&self.systems_path, &snapshot).await {
            warn!("failed to persist system table: {}", err);
        }
    }

    async fn persist_groups(&self) {
        let snapshot = self.groups.read().unwrap().clone();
        if let Err(err) = write_json_atomic(&self.groups_path, &snapshot).await {
            warn!("failed to persist group table: {}", err);
        }
    }

    async fn persist_names(&self) {
        let snapshot = self.names.read().unwrap().clone();
        if let Err(err) = write_json_atomic(&self.names_path, &snapshot).await {
            warn!("failed to persist name table: {}", err);
        }
    }
}

#[async_trait]
impl ReferenceResolver for ReferenceCache {
    async fn resolve_system(&self, system_id: u32) -> anyhow::Result<SolarSystem> {
        {
            let systems = self.systems.read().unwrap();
            if let Some(system) = systems.get(&system_id) {
                return Ok(system.clone());
            }
        }

        let _guard = self.systems_fetch.lock().await;
        // Another task may have resolved the id while we waited.
        {
            let systems = self.systems.read().unwrap();
            if let Some(system) = systems.get(&system_id) {
                return Ok(system.clone());
            }
        }

        // A failed fetch caches nothing, so a later event retries naturally.
        let system = self.source.fetch_system(system_id).await?;
        self.systems
            .write()
            .unwrap()
            .insert(system_id, system.clone());
        self.persist_systems().await;
        Ok(system)
    }

    async fn resolve_group(&self, type_id: u32) -> anyhow::Result<u32> {
        {
            let groups = self.groups.read().unwrap();
            if let Some(group_id) = groups.get(&type_id) {
                return Ok(*group_id);
            }
        }

        let _guard = self.groups_fetch.lock().await;
        {
            let groups = self.groups.read().unwrap();
            if let Some(group_id) = groups.get(&type_id) {
                return Ok(*group_id);
            }
        }

        let group_id = self.source.fetch_group(type_id).await?;
        self.groups.write().unwrap().insert(type_id, group_id);
        self.persist_groups().await;
        Ok(group_id)
    }

    async fn resolve_name(&self, id: u64) -> anyhow::Result<String> {
        {
            let names = self.names.read().unwrap();
            if let Some(name) = names.get(&id) {
                return Ok(name.clone());
            }
        }

        let _guard = self.names_fetch.lock().await;
        {
            let names = self.names.read().unwrap();
            if let Some(name) = names.get(&id) {
                return Ok(name.clone());
            }
        }

        let name = self.source.fetch_name(id).await?;
        self.names.write().unwrap().insert(id, name.clone());
        self.persist_names().await;
        Ok(name)
    }
}
