// ESI reference-data client
// Raw upstream lookups; every call carries the configured request timeout.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use feed_domain::{ReferenceSource, SolarSystem};

pub struct EsiClient {
    client: Client,
    base_url: String,
}

impl EsiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(EsiClient {
            client,
            base_url: base_url.to_string(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "reference API returned status {} for {}",
                response.status(),
                path
            ));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ReferenceSource for EsiClient {
    async fn fetch_system(&self, system_id: u32) -> Result<SolarSystem> {
        #[derive(Deserialize)]
        struct EsiSystem {
            name: String,
            security_status: f64,
            constellation_id: u32,
            position: EsiPosition,
        }
        #[derive(Deserialize)]
        struct EsiPosition {
            x: f64,
            y: f64,
            z: f64,
        }
        #[derive(Deserialize)]
        struct EsiConstellation {
            region_id: u32,
        }
        #[derive(Deserialize)]
        struct EsiRegion {
            name: String,
        }

        let system: EsiSystem = self
            .fetch(&format!("universe/systems/{}/", system_id))
            .await?;
        let constellation: EsiConstellation = self
            .fetch(&format!(
                "universe/constellations/{}/",
                system.constellation_id
            ))
            .await?;
        let region: EsiRegion = self
            .fetch(&format!("universe/regions/{}/", constellation.region_id))
            .await?;

        Ok(SolarSystem {
            system_id,
            name: system.name,
            security_status: system.security_status,
            constellation_id: system.constellation_id,
            region_id: constellation.region_id,
            region_name: region.name,
            x: system.position.x,
            y: system.position.y,
            z: system.position.z,
        })
    }

    async fn fetch_group(&self, type_id: u32) -> Result<u32> {
        #[derive(Deserialize)]
        struct EsiType {
            group_id: u32,
        }
        let type_info: EsiType = self.fetch(&format!("universe/types/{}/", type_id)).await?;
        Ok(type_info.group_id)
    }

    async fn fetch_name(&self, id: u64) -> Result<String> {
        #[derive(Deserialize)]
        struct EsiName {
            name: String,
        }
        let url = format!("{}universe/names/", self.base_url);
        let names: Vec<EsiName> = self
            .client
            .post(&url)
            .json(&[id])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        names
            .into_iter()
            .next()
            .map(|entry| entry.name)
            .ok_or_else(|| anyhow!("no name found for id {}", id))
    }
}
