//! Contract between a configuration entry and the application hosting it

use parking_lot::Mutex;
use plex_state::{PlexPlayer, SessionsSensor};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Entity platforms an entry forwards to its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    MediaPlayer,
    Sensor,
}

impl Platform {
    /// Every platform an entry sets up, in setup order
    pub const ALL: [Platform; 2] = [Platform::Sensor, Platform::MediaPlayer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MediaPlayer => "media_player",
            Platform::Sensor => "sensor",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity handed to the host
#[derive(Debug, Clone)]
pub enum Entity {
    Player(Arc<PlexPlayer>),
    Sensor(Arc<SessionsSensor>),
}

impl Entity {
    pub fn unique_id(&self) -> String {
        match self {
            Entity::Player(player) => player.unique_id(),
            Entity::Sensor(sensor) => sensor.unique_id(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Entity::Player(player) => player.name().to_string(),
            Entity::Sensor(sensor) => sensor.name(),
        }
    }

    pub fn available(&self) -> bool {
        match self {
            Entity::Player(player) => player.available(),
            Entity::Sensor(sensor) => sensor.available(),
        }
    }
}

/// Receives the entities an entry creates
pub trait EntityHost: Send + Sync {
    /// Register new entities on a platform
    fn add_entities(&self, platform: Platform, entities: Vec<Entity>);

    /// Drop entities that an evicting registry removed
    fn remove_entities(&self, _platform: Platform, _unique_ids: &[String]) {}

    /// Tear down a platform; returns whether it unloaded cleanly
    fn unload_platform(&self, platform: Platform) -> bool;
}

/// Host that keeps entities in memory, grouped by platform
#[derive(Debug, Default)]
pub struct MemoryHost {
    entities: Mutex<HashMap<Platform, Vec<Entity>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self, platform: Platform) -> Vec<Entity> {
        self.entities
            .lock()
            .get(&platform)
            .cloned()
            .unwrap_or_default()
    }

    pub fn players(&self) -> Vec<Arc<PlexPlayer>> {
        self.entities(Platform::MediaPlayer)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Player(player) => Some(player),
                Entity::Sensor(_) => None,
            })
            .collect()
    }

    pub fn sensors(&self) -> Vec<Arc<SessionsSensor>> {
        self.entities(Platform::Sensor)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Sensor(sensor) => Some(sensor),
                Entity::Player(_) => None,
            })
            .collect()
    }

    pub fn unique_ids(&self, platform: Platform) -> Vec<String> {
        self.entities(platform).iter().map(Entity::unique_id).collect()
    }
}

impl EntityHost for MemoryHost {
    fn add_entities(&self, platform: Platform, entities: Vec<Entity>) {
        self.entities
            .lock()
            .entry(platform)
            .or_default()
            .extend(entities);
    }

    fn remove_entities(&self, platform: Platform, unique_ids: &[String]) {
        if let Some(entities) = self.entities.lock().get_mut(&platform) {
            entities.retain(|e| !unique_ids.contains(&e.unique_id()));
        }
    }

    fn unload_platform(&self, platform: Platform) -> bool {
        self.entities.lock().remove(&platform);
        true
    }
}
