//! Authoritative player registry for the arena server
//!
//! This module owns every live player record along with the process-wide
//! match state:
//! - The active level and the catalog it is drawn from
//! - The join counter used for default names and palette rotation
//! - Name assignment, renames and uniqueness enforcement
//! - Scoreboard projection
//!
//! Other components look players up here and mutate them through these
//! functions; nothing else keeps a player record around between events.

use crate::error::Rejection;
use crate::levels::LevelCatalog;
use crate::names;
use crate::spawn;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{ClientId, NameRejection, PlayerRecord, ScoreEntry, TextureStyle, Vec3, EYE_HEIGHT};
use std::collections::HashMap;

/// Every connected player plus the shared match state.
pub struct PlayerRegistry {
    /// Live players indexed by connection id
    players: HashMap<ClientId, PlayerRecord>,
    /// Monotonic join counter; never decremented
    player_count: u32,
    /// Level id all spawns are drawn from
    current_map: String,
    catalog: Box<dyn LevelCatalog>,
    rng: StdRng,
}

impl PlayerRegistry {
    /// Creates an empty registry playing `start_map`.
    ///
    /// Fails if the catalog has no level with that id.
    pub fn new(catalog: Box<dyn LevelCatalog>, start_map: &str) -> Result<Self, Rejection> {
        Self::with_rng(catalog, start_map, StdRng::from_entropy())
    }

    /// Same as [`PlayerRegistry::new`] with a caller-provided random source.
    pub fn with_rng(
        catalog: Box<dyn LevelCatalog>,
        start_map: &str,
        rng: StdRng,
    ) -> Result<Self, Rejection> {
        if !catalog.contains(start_map) {
            return Err(Rejection::UnknownMap {
                requested: start_map.to_string(),
                available: catalog.level_names().join(", "),
            });
        }

        Ok(Self {
            players: HashMap::new(),
            player_count: 0,
            current_map: start_map.to_string(),
            catalog,
            rng,
        })
    }

    /// Registers a new player for `id`.
    ///
    /// The requested name is used when it is valid and free; otherwise the
    /// player becomes `Player<N>` for the first counter value whose name is
    /// not already live. The player starts at full health on a fresh spawn
    /// point of the current map.
    pub fn create_player(&mut self, id: ClientId, requested_name: Option<&str>) -> PlayerRecord {
        self.player_count += 1;
        let join_order = self.player_count;

        let name = match names::validate(requested_name) {
            Some(name) if !names::is_taken(self.players.values(), &name, None) => name,
            _ => {
                let mut fallback = format!("Player{}", self.player_count);
                while names::is_taken(self.players.values(), &fallback, None) {
                    self.player_count += 1;
                    fallback = format!("Player{}", self.player_count);
                }
                fallback
            }
        };

        let position = self.spawn_point();
        let record = PlayerRecord::new(id, name, position, spawn::color_scheme(join_order));

        info!(
            "Player {} '{}' joined at ({:.1}, {:.1})",
            id, record.name, position.x, position.z
        );
        self.players.insert(id, record.clone());
        record
    }

    /// Stores the client-reported pose. Unknown ids are ignored.
    pub fn update_position(&mut self, id: ClientId, position: Vec3, rotation: Vec3) {
        if let Some(player) = self.players.get_mut(&id) {
            player.position = position;
            player.rotation = rotation;
        }
    }

    /// Renames a player, returning the stored (trimmed) name.
    ///
    /// A player may rename to a different casing of their own name.
    pub fn update_name(&mut self, id: ClientId, new_name: &str) -> Result<String, NameRejection> {
        let name = names::validate(Some(new_name)).ok_or(NameRejection::Invalid)?;

        if !self.players.contains_key(&id) {
            return Err(NameRejection::NotFound);
        }
        if names::is_taken(self.players.values(), &name, Some(id)) {
            return Err(NameRejection::Taken);
        }

        let player = self.players.get_mut(&id).ok_or(NameRejection::NotFound)?;
        info!("Player {} renamed '{}' -> '{}'", id, player.name, name);
        player.name = name.clone();
        Ok(name)
    }

    /// Sets a player's skin. Returns false for unknown ids.
    pub fn set_texture_style(&mut self, id: ClientId, style: TextureStyle) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.texture_style = style;
                true
            }
            None => false,
        }
    }

    /// Removes a player. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: ClientId) -> Option<PlayerRecord> {
        let removed = self.players.remove(&id);
        if let Some(player) = &removed {
            info!("Player {} '{}' left", id, player.name);
        }
        removed
    }

    /// Players ranked by kills (descending), then deaths (ascending).
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        let mut scores: Vec<ScoreEntry> = self
            .players
            .values()
            .map(|player| ScoreEntry {
                id: player.id,
                name: player.name.clone(),
                kills: player.kills,
                deaths: player.deaths,
            })
            .collect();

        scores.sort_by(|a, b| {
            b.kills
                .cmp(&a.kills)
                .then(a.deaths.cmp(&b.deaths))
                .then(a.id.cmp(&b.id))
        });
        scores
    }

    /// Switches the active level and revives every player on it.
    ///
    /// Returns each player's new position so they can be told individually.
    pub fn change_map(&mut self, map_name: &str) -> Result<Vec<(ClientId, Vec3)>, Rejection> {
        if !self.catalog.contains(map_name) {
            return Err(Rejection::UnknownMap {
                requested: map_name.to_string(),
                available: self.catalog.level_names().join(", "),
            });
        }

        self.current_map = map_name.to_string();
        info!("Map changed to '{}'", map_name);

        let ids: Vec<ClientId> = self.players.keys().copied().collect();
        let mut placements = Vec::with_capacity(ids.len());
        for id in ids {
            let position = self.spawn_point();
            if let Some(player) = self.players.get_mut(&id) {
                player.revive(position);
                placements.push((id, position));
            }
        }

        Ok(placements)
    }

    /// Fresh spawn point on the current map.
    pub fn spawn_point(&mut self) -> Vec3 {
        match self.catalog.geometry_for(&self.current_map) {
            Some(geometry) => spawn::spawn_position(geometry, &mut self.rng),
            None => Vec3::new(0.0, EYE_HEIGHT, 0.0),
        }
    }

    pub fn get(&self, id: ClientId) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut PlayerRecord> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.players.contains_key(&id)
    }

    /// Copy of every live record, keyed by id, for session bootstrap.
    pub fn snapshot(&self) -> HashMap<ClientId, PlayerRecord> {
        self.players.clone()
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.players.keys().copied().collect()
    }

    pub fn current_map(&self) -> &str {
        &self.current_map
    }

    pub fn player_count(&self) -> u32 {
        self.player_count
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
