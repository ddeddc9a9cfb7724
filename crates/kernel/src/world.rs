use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use worldenv_common::{SimDuration, SimTime, WorldId};

use crate::descriptor::WorldEnvDescriptor;
use crate::environment::WorldEnvironment;
use crate::error::{KernelError, Result};

/// A simulated world: identity, clock origin, place in the world tree, and
/// environment descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub id: WorldId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// World-local time origin on the global clock.
    #[serde(default)]
    pub epoch: SimTime,
    /// The world this one is positioned in. `None` for a root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<WorldId>,
    pub environment: WorldEnvDescriptor,
}

impl World {
    /// A root world with no description and its clock at the global origin.
    pub fn new(id: WorldId, name: impl Into<String>, environment: WorldEnvDescriptor) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            epoch: SimTime::ZERO,
            parent: None,
            environment,
        }
    }

    /// Attach under `parent`.
    pub fn with_parent(mut self, parent: WorldId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Global instant at which the local clock reads zero.
    pub fn with_epoch(mut self, epoch: SimTime) -> Self {
        self.epoch = epoch;
        self
    }

    /// Time elapsed on this world's clock at a global instant.
    pub fn local_time(&self, global: SimTime) -> SimDuration {
        global - self.epoch
    }

    /// Build the sampling environment for this world's descriptor.
    pub fn build_environment(&self) -> WorldEnvironment {
        WorldEnvironment::from_descriptor(&self.environment)
    }
}

/// An event record produced by every registry mutation.
///
/// Each event carries enough to reconstruct the mutation during replay and the
/// previous value for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Registered {
        world: Box<World>,
    },
    Removed {
        world: Box<World>,
    },
    EpochSet {
        id: WorldId,
        old: SimTime,
        new: SimTime,
    },
    Renamed {
        id: WorldId,
        old: String,
        new: String,
    },
    DescriptionSet {
        id: WorldId,
        old: Option<String>,
        new: Option<String>,
    },
    EnvironmentReplaced {
        id: WorldId,
        old: Box<WorldEnvDescriptor>,
        new: Box<WorldEnvDescriptor>,
    },
    Reparented {
        id: WorldId,
        old: Option<WorldId>,
        new: Option<WorldId>,
    },
}

/// The authoritative set of worlds.
///
/// Uses BTreeMap for deterministic iteration order. Every stored descriptor is
/// valid and the parent relation is acyclic.
#[derive(Debug, Clone, Default)]
pub struct WorldRegistry {
    worlds: BTreeMap<WorldId, World>,
    /// Append-only log of all mutations.
    event_log: Vec<WorldEvent>,
}

impl WorldRegistry {
    /// An empty registry with an empty event log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered worlds.
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Look up a world by id.
    pub fn get(&self, id: WorldId) -> Option<&World> {
        self.worlds.get(&id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: WorldId) -> bool {
        self.worlds.contains_key(&id)
    }

    /// Read-only access to all worlds, ordered by id.
    pub fn worlds(&self) -> &BTreeMap<WorldId, World> {
        &self.worlds
    }

    fn world(&self, id: WorldId) -> Result<&World> {
        self.worlds.get(&id).ok_or(KernelError::WorldNotFound(id))
    }

    fn world_mut(&mut self, id: WorldId) -> Result<&mut World> {
        self.worlds.get_mut(&id).ok_or(KernelError::WorldNotFound(id))
    }

    /// Add a world. Its parent, if any, must already be registered.
    pub fn register(&mut self, world: World) -> Result<()> {
        world.environment.validate()?;
        if self.worlds.contains_key(&world.id) {
            return Err(KernelError::DuplicateWorld(world.id));
        }
        if let Some(parent) = world.parent {
            if parent == world.id {
                return Err(KernelError::ParentCycle {
                    world: world.id,
                    parent,
                });
            }
            if !self.worlds.contains_key(&parent) {
                return Err(KernelError::UnknownParent {
                    world: world.id,
                    parent,
                });
            }
        }

        tracing::debug!(id = %world.id, name = %world.name, "registered world");
        self.event_log.push(WorldEvent::Registered {
            world: Box::new(world.clone()),
        });
        self.worlds.insert(world.id, world);
        Ok(())
    }

    /// Remove a leaf world.
    pub fn remove(&mut self, id: WorldId) -> Result<World> {
        let children = self.children(id).len();
        if children > 0 {
            return Err(KernelError::HasChildren {
                world: id,
                children,
            });
        }
        let world = self.worlds.remove(&id).ok_or(KernelError::WorldNotFound(id))?;
        tracing::debug!(%id, "removed world");
        self.event_log.push(WorldEvent::Removed {
            world: Box::new(world.clone()),
        });
        Ok(world)
    }

    /// Move a world's clock origin. Logs the previous epoch.
    pub fn set_epoch(&mut self, id: WorldId, epoch: SimTime) -> Result<()> {
        let world = self.world_mut(id)?;
        let old = std::mem::replace(&mut world.epoch, epoch);
        self.event_log.push(WorldEvent::EpochSet { id, old, new: epoch });
        Ok(())
    }

    /// Change a world's display name. Logs the previous name.
    pub fn rename(&mut self, id: WorldId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let world = self.world_mut(id)?;
        let old = std::mem::replace(&mut world.name, name.clone());
        self.event_log.push(WorldEvent::Renamed { id, old, new: name });
        Ok(())
    }

    /// Set or clear a world's description.
    pub fn set_description(&mut self, id: WorldId, description: Option<String>) -> Result<()> {
        let world = self.world_mut(id)?;
        let old = std::mem::replace(&mut world.description, description.clone());
        self.event_log.push(WorldEvent::DescriptionSet {
            id,
            old,
            new: description,
        });
        Ok(())
    }

    /// Replace a world's descriptor after validating it.
    pub fn set_environment(&mut self, id: WorldId, environment: WorldEnvDescriptor) -> Result<()> {
        environment.validate()?;
        let world = self.world_mut(id)?;
        let old = std::mem::replace(&mut world.environment, environment.clone());
        tracing::debug!(%id, "replaced world environment");
        self.event_log.push(WorldEvent::EnvironmentReplaced {
            id,
            old: Box::new(old),
            new: Box::new(environment),
        });
        Ok(())
    }

    /// Move a world under a new parent, or make it a root.
    pub fn reparent(&mut self, id: WorldId, parent: Option<WorldId>) -> Result<()> {
        self.world(id)?;
        if let Some(p) = parent {
            if !self.worlds.contains_key(&p) {
                return Err(KernelError::UnknownParent {
                    world: id,
                    parent: p,
                });
            }
            if p == id || self.ancestors(p)?.contains(&id) {
                return Err(KernelError::ParentCycle {
                    world: id,
                    parent: p,
                });
            }
        }
        let world = self.world_mut(id)?;
        let old = std::mem::replace(&mut world.parent, parent);
        tracing::debug!(%id, ?old, new = ?parent, "reparented world");
        self.event_log.push(WorldEvent::Reparented {
            id,
            old,
            new: parent,
        });
        Ok(())
    }

    /// Direct children of a world, ordered by id.
    pub fn children(&self, id: WorldId) -> Vec<WorldId> {
        self.worlds
            .values()
            .filter(|w| w.parent == Some(id))
            .map(|w| w.id)
            .collect()
    }

    /// Parent chain of a world, nearest first.
    pub fn ancestors(&self, id: WorldId) -> Result<Vec<WorldId>> {
        let mut chain = Vec::new();
        let mut current = self.world(id)?.parent;
        while let Some(parent) = current {
            if chain.len() > self.worlds.len() {
                return Err(KernelError::ParentCycle { world: id, parent });
            }
            chain.push(parent);
            current = self.world(parent)?.parent;
        }
        Ok(chain)
    }

    /// Topmost ancestor, or `id` itself for a root.
    pub fn root_of(&self, id: WorldId) -> Result<WorldId> {
        Ok(self.ancestors(id)?.last().copied().unwrap_or(id))
    }

    /// Number of ancestors; roots are at depth 0.
    pub fn depth(&self, id: WorldId) -> Result<usize> {
        Ok(self.ancestors(id)?.len())
    }

    /// All world ids with every parent before its children.
    pub fn topological_order(&self) -> Vec<WorldId> {
        let mut order = Vec::with_capacity(self.worlds.len());
        let mut queue: VecDeque<WorldId> = self
            .worlds
            .values()
            .filter(|w| w.parent.is_none())
            .map(|w| w.id)
            .collect();
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.children(id));
        }
        order
    }

    /// Sampling environment for a registered world.
    pub fn environment(&self, id: WorldId) -> Result<WorldEnvironment> {
        Ok(self.world(id)?.build_environment())
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Events logged since the last drain, oldest first.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Reconstruct a registry from a sequence of events.
    ///
    /// Every event is re-applied through the validating operations, so a
    /// tampered log fails instead of producing an inconsistent registry.
    pub fn replay(events: &[WorldEvent]) -> Result<Self> {
        let mut registry = Self::new();
        for event in events {
            match event {
                WorldEvent::Registered { world } => registry.register(world.as_ref().clone())?,
                WorldEvent::Removed { world } => {
                    registry.remove(world.id)?;
                }
                WorldEvent::EpochSet { id, new, .. } => registry.set_epoch(*id, *new)?,
                WorldEvent::Renamed { id, new, .. } => registry.rename(*id, new.clone())?,
                WorldEvent::DescriptionSet { id, new, .. } => {
                    registry.set_description(*id, new.clone())?
                }
                WorldEvent::EnvironmentReplaced { id, new, .. } => {
                    registry.set_environment(*id, new.as_ref().clone())?
                }
                WorldEvent::Reparented { id, new, .. } => registry.reparent(*id, *new)?,
            }
        }
        registry.event_log.clear();
        Ok(registry)
    }

    /// Deterministic FNV-1a hash of the registry contents in id order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        for (id, world) in &self.worlds {
            mix(&mut h, &id.0.to_le_bytes());
            mix(&mut h, &(world.name.len() as u64).to_le_bytes());
            mix(&mut h, world.name.as_bytes());
            match &world.description {
                Some(text) => {
                    mix(&mut h, &(text.len() as u64).to_le_bytes());
                    mix(&mut h, text.as_bytes());
                }
                None => mix(&mut h, &u64::MAX.to_le_bytes()),
            }
            mix(&mut h, &world.epoch.0.to_le_bytes());
            mix(&mut h, &world.parent.map_or(u64::MAX, |p| p.0).to_le_bytes());
            let env = serde_json::to_vec(&world.environment).unwrap_or_default();
            mix(&mut h, &env);
        }
        h
    }

    /// Counts for status output.
    pub fn summary(&self) -> WorldSummary {
        let depths: Vec<usize> = self
            .worlds
            .keys()
            .filter_map(|id| self.depth(*id).ok())
            .collect();
        WorldSummary {
            world_count: self.worlds.len(),
            root_count: self.worlds.values().filter(|w| w.parent.is_none()).count(),
            max_depth: depths.into_iter().max().unwrap_or(0),
            pending_events: self.event_log.len(),
        }
    }
}

/// Summary of registry state for listings and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSummary {
    pub world_count: usize,
    pub root_count: usize,
    pub max_depth: usize,
    pub pending_events: usize,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registry: worlds={} roots={} max_depth={} pending_events={}",
            self.world_count, self.root_count, self.max_depth, self.pending_events
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{self, EARTH, MOON, SUN};

    fn world(id: u64) -> World {
        World::new(WorldId(id), format!("w{id}"), presets::moon_v0())
    }

    #[test]
    fn registry_starts_empty() {
        let r = WorldRegistry::new();
        assert!(r.is_empty());
        assert!(r.events().is_empty());
    }

    #[test]
    fn register_and_remove() {
        let mut r = WorldRegistry::new();
        r.register(world(1)).unwrap();
        assert_eq!(r.len(), 1);
        assert!(r.get(WorldId(1)).is_some());

        let removed = r.remove(WorldId(1)).unwrap();
        assert_eq!(removed.id, WorldId(1));
        assert!(r.is_empty());
        assert_eq!(r.events().len(), 2);
    }

    #[test]
    fn rejects_duplicates_and_unknown_parents() {
        let mut r = WorldRegistry::new();
        r.register(world(1)).unwrap();
        assert_eq!(
            r.register(world(1)),
            Err(KernelError::DuplicateWorld(WorldId(1)))
        );
        assert_eq!(
            r.register(world(2).with_parent(WorldId(9))),
            Err(KernelError::UnknownParent {
                world: WorldId(2),
                parent: WorldId(9)
            })
        );
        assert!(r.register(world(3).with_parent(WorldId(3))).is_err());
    }

    #[test]
    fn rejects_invalid_descriptor() {
        let mut r = WorldRegistry::new();
        let mut w = world(1);
        w.environment.space.surface_radius_m = -1.0;
        assert!(matches!(
            r.register(w),
            Err(KernelError::InvalidDescriptor { .. })
        ));
        assert!(r.is_empty());
        assert!(r.events().is_empty());
    }

    #[test]
    fn parent_with_children_cannot_be_removed() {
        let mut r = presets::solar_system().unwrap();
        assert_eq!(
            r.remove(EARTH),
            Err(KernelError::HasChildren {
                world: EARTH,
                children: 1
            })
        );
        r.remove(MOON).unwrap();
        r.remove(EARTH).unwrap();
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn ancestors_and_roots() {
        let r = presets::solar_system().unwrap();
        assert_eq!(r.ancestors(MOON).unwrap(), vec![EARTH, SUN]);
        assert_eq!(r.root_of(SUN).unwrap(), SUN);
        assert_eq!(r.depth(SUN).unwrap(), 0);
        assert_eq!(r.ancestors(WorldId(42)), Err(KernelError::WorldNotFound(WorldId(42))));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut r = presets::solar_system().unwrap();
        assert_eq!(
            r.reparent(SUN, Some(MOON)),
            Err(KernelError::ParentCycle {
                world: SUN,
                parent: MOON
            })
        );
        r.reparent(MOON, Some(SUN)).unwrap();
        assert_eq!(r.children(SUN), vec![EARTH, MOON]);
        r.reparent(MOON, None).unwrap();
        assert_eq!(r.root_of(MOON).unwrap(), MOON);
    }

    #[test]
    fn topological_order_puts_parents_first() {
        let mut r = WorldRegistry::new();
        r.register(world(5)).unwrap();
        r.register(world(1).with_parent(WorldId(5))).unwrap();
        r.register(world(3).with_parent(WorldId(1))).unwrap();
        r.register(world(2)).unwrap();
        let order = r.topological_order();
        assert_eq!(order.len(), 4);
        let pos = |id: u64| order.iter().position(|w| *w == WorldId(id)).unwrap();
        assert!(pos(5) < pos(1));
        assert!(pos(1) < pos(3));
    }

    #[test]
    fn mutations_log_events() {
        let mut r = presets::solar_system().unwrap();
        r.drain_events();
        r.set_epoch(EARTH, SimTime::from_ns(500)).unwrap();
        r.rename(EARTH, "Terra").unwrap();
        r.set_description(MOON, Some("Luna".into())).unwrap();
        assert_eq!(r.events().len(), 3);
        assert_eq!(
            r.events()[0],
            WorldEvent::EpochSet {
                id: EARTH,
                old: SimTime::ZERO,
                new: SimTime::from_ns(500)
            }
        );
        assert_eq!(r.get(EARTH).unwrap().name, "Terra");
    }

    #[test]
    fn set_environment_validates() {
        let mut r = presets::solar_system().unwrap();
        let mut bad = presets::earth_v0();
        bad.gravity.strength = f64::INFINITY;
        assert!(r.set_environment(EARTH, bad).is_err());
        r.set_environment(EARTH, presets::habitat_v0()).unwrap();
        assert_eq!(r.get(EARTH).unwrap().environment, presets::habitat_v0());
    }

    #[test]
    fn local_time_counts_from_epoch() {
        let w = world(1).with_epoch(SimTime::from_ns(1_000));
        assert_eq!(w.local_time(SimTime::from_ns(4_000)), SimDuration::from_ns(3_000));
    }

    #[test]
    fn replay_reconstructs_state() {
        let mut r = presets::solar_system().unwrap();
        r.set_epoch(MOON, SimTime::from_ns(77)).unwrap();
        r.rename(EARTH, "Terra").unwrap();
        r.reparent(MOON, Some(SUN)).unwrap();
        r.register(world(9).with_parent(MOON)).unwrap();
        r.remove(WorldId(9)).unwrap();

        let replayed = WorldRegistry::replay(r.events()).unwrap();
        assert_eq!(replayed.state_hash(), r.state_hash());
        assert_eq!(replayed.len(), r.len());
        assert!(replayed.events().is_empty());
    }

    #[test]
    fn replay_fails_on_inconsistent_log() {
        let events = vec![WorldEvent::Renamed {
            id: WorldId(1),
            old: "a".into(),
            new: "b".into(),
        }];
        assert_eq!(
            WorldRegistry::replay(&events).unwrap_err(),
            KernelError::WorldNotFound(WorldId(1))
        );
    }

    #[test]
    fn state_hash_tracks_content() {
        let a = presets::solar_system().unwrap();
        let mut b = presets::solar_system().unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        b.set_epoch(SUN, SimTime::from_ns(1)).unwrap();
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn state_hash_separates_name_and_description() {
        let hash = |name: &str, description: Option<&str>| {
            let mut r = WorldRegistry::new();
            let mut w = world(1);
            w.name = name.to_string();
            w.description = description.map(str::to_string);
            r.register(w).unwrap();
            r.state_hash()
        };
        assert_ne!(hash("ab", None), hash("a", Some("b")));
        assert_ne!(hash("ab", None), hash("ab", Some("")));
        assert_eq!(hash("ab", Some("c")), hash("ab", Some("c")));
    }

    #[test]
    fn summary_display() {
        let r = presets::solar_system().unwrap();
        let s = r.summary();
        assert_eq!(s.world_count, 3);
        assert_eq!(s.root_count, 1);
        assert_eq!(s.max_depth, 2);
        assert_eq!(
            s.to_string(),
            "Registry: worlds=3 roots=1 max_depth=2 pending_events=3"
        );
    }

    #[test]
    fn world_json_omits_empty_optionals() {
        let json = serde_json::to_value(world(4)).unwrap();
        assert!(json.get("parent").is_none());
        assert!(json.get("description").is_none());
        let back: World = serde_json::from_value(json).unwrap();
        assert_eq!(back, world(4));
    }
}
