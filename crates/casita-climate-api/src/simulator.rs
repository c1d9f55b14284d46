//! Simulated thermostats backed by in-memory channels

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{broadcast, Mutex};
use zigbee_climate::persistence;
use zigbee_climate::{
    ClimateError, ClimateState, FanChannel, MemoryFan, MemoryThermostat, QuirkRegistry, QuirkRule,
    Thermostat,
    ThermostatAttribute, ThermostatAttributes,
};
use zigbee_core::ZigbeeDevice;

/// A device fixture from `thermostats.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedThermostat {
    pub device: ZigbeeDevice,
    #[serde(default)]
    pub attributes: ThermostatAttributes,
}

/// An entity and the channel it reads from
pub struct ClimateEntity {
    pub thermostat: Mutex<Thermostat>,
    pub channel: Arc<MemoryThermostat>,
}

/// All simulated climate entities, keyed by unique ID
pub struct ClimateHub {
    entities: DashMap<String, Arc<ClimateEntity>>,
    registry: RwLock<QuirkRegistry>,
    /// Where registered quirk rules are saved
    quirks_path: Option<PathBuf>,
    event_tx: broadcast::Sender<ClimateState>,
}

impl ClimateHub {
    pub fn new(registry: QuirkRegistry) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            entities: DashMap::new(),
            registry: RwLock::new(registry),
            quirks_path: None,
            event_tx,
        }
    }

    /// Load quirk rules and device fixtures from the data directory
    pub async fn load(data_dir: &Path) -> Self {
        let quirks_path = data_dir.join("quirks.json");
        let registry = QuirkRegistry::load(&quirks_path).await;
        let mut hub = Self::new(registry);
        hub.quirks_path = Some(quirks_path);

        let fixtures = persistence::load_list::<SimulatedThermostat>(
            &data_dir.join("thermostats.json"),
            "simulated thermostats",
        )
        .await;
        for fixture in fixtures {
            if let Err(e) = hub.add(fixture) {
                tracing::warn!("Skipping fixture: {}", e);
            }
        }

        hub
    }

    /// Create the entity for a fixture and forward its state flushes
    pub fn add(&self, fixture: SimulatedThermostat) -> Result<String, ClimateError> {
        let channel = Arc::new(MemoryThermostat::new(fixture.attributes));
        let fan = fixture
            .device
            .has_fan()
            .then(|| Arc::new(MemoryFan::default()) as Arc<dyn FanChannel>);
        let thermostat = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            Thermostat::for_device(&fixture.device, &registry, channel.clone(), fan)?
        };
        let id = thermostat.unique_id().to_string();

        let mut state_rx = thermostat.subscribe();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            loop {
                match state_rx.recv().await {
                    Ok(state) => {
                        let _ = event_tx.send(state);
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        tracing::info!("Added simulated thermostat {}", id);
        self.entities.insert(
            id.clone(),
            Arc::new(ClimateEntity {
                thermostat: Mutex::new(thermostat),
                channel,
            }),
        );
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Arc<ClimateEntity>, ClimateError> {
        self.entities
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ClimateError::EntityNotFound(id.to_string()))
    }

    /// Current state of every entity, ordered by ID
    pub async fn states(&self) -> Vec<ClimateState> {
        let entities: Vec<_> = self.entities.iter().map(|e| e.value().clone()).collect();
        let mut states = Vec::with_capacity(entities.len());
        for entity in entities {
            states.push(entity.thermostat.lock().await.state());
        }
        states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        states
    }

    /// Change a simulated attribute and notify the entity
    pub async fn report_attribute(
        &self,
        id: &str,
        attr: ThermostatAttribute,
        value: Option<i64>,
    ) -> Result<ClimateState, ClimateError> {
        let entity = self.get(id)?;
        entity.channel.update(attr, value);
        let mut thermostat = entity.thermostat.lock().await;
        thermostat.attribute_updated(attr, value).await;
        Ok(thermostat.state())
    }

    /// Register a quirk rule for devices added from now on and save the
    /// user rules
    pub async fn add_quirk_rule(&self, rule: QuirkRule) -> Result<(), ClimateError> {
        let registry = {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            registry.register(rule);
            registry.clone()
        };
        if let Some(path) = &self.quirks_path {
            registry.save(path).await?;
        }
        Ok(())
    }

    pub fn quirk_rules(&self) -> Vec<QuirkRule> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user_rules()
            .to_vec()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClimateState> {
        self.event_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}
