//! Transient arena entities: projectiles, blasts, indicators and effects.
//!
//! Each [`EntityKind`] has its own collection inside [`EntityStore`], so
//! "destroy every boss-owned entity" is a walk over a fixed set of vectors.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::tween::{Easing, Tween};

/// Closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    BossProjectile,
    CurveMissile,
    MeleeBlast,
    Explosion,
    FloorBlastIndicator,
    AirBlastIndicator,
    SlashEffect,
    CutEffect,
}

impl EntityKind {
    pub const COUNT: usize = 8;

    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::BossProjectile,
        EntityKind::CurveMissile,
        EntityKind::MeleeBlast,
        EntityKind::Explosion,
        EntityKind::FloorBlastIndicator,
        EntityKind::AirBlastIndicator,
        EntityKind::SlashEffect,
        EntityKind::CutEffect,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Hit profile for kinds that damage the player on contact
    pub fn collision(self) -> Option<CollisionProfile> {
        match self {
            EntityKind::BossProjectile => Some(CollisionProfile {
                range: 16.0,
                max_elevation: 16.0,
            }),
            EntityKind::CurveMissile | EntityKind::MeleeBlast => Some(CollisionProfile {
                range: 56.0,
                max_elevation: 16.0,
            }),
            _ => None,
        }
    }

    /// Entities destroyed by `stop_everything`
    pub fn is_boss_owned(self) -> bool {
        !matches!(self, EntityKind::SlashEffect | EntityKind::CutEffect)
    }

    /// Kinds replaced by an explosion when their flight ends
    pub fn explodes_on_arrival(self) -> bool {
        matches!(self, EntityKind::BossProjectile | EntityKind::CurveMissile)
    }
}

/// Distance and elevation below which an entity touches the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionProfile {
    pub range: f32,
    pub max_elevation: f32,
}

impl CollisionProfile {
    pub fn hits(&self, entity_pos: Vec2, elevation: f32, player_pos: Vec2) -> bool {
        elevation < self.max_elevation && entity_pos.distance(player_pos) < self.range
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone)]
struct Motion {
    position: Tween<Vec2>,
    elevation: Option<Tween<f32>>,
}

#[derive(Debug, Clone)]
pub struct ArenaEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub elevation: f32,
    motion: Option<Motion>,
    expires_at: Option<Duration>,
}

/// What happened to the store during one [`EntityStore::advance`].
#[derive(Debug, Default)]
pub struct AdvanceReport {
    /// Entities whose flight ended; already removed from the store
    pub arrived: Vec<ArenaEntity>,
    /// Entities removed because their lifetime ran out
    pub expired: Vec<(EntityId, EntityKind)>,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    collections: [Vec<ArenaEntity>; EntityKind::COUNT],
    next_id: u32,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self {
            collections: std::array::from_fn(|_| Vec::new()),
            next_id: 1,
        }
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: EntityKind, position: Vec2, elevation: f32) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.collections[kind.index()].push(ArenaEntity {
            id,
            kind,
            position,
            elevation,
            motion: None,
            expires_at: None,
        });
        id
    }

    /// Spawn an entity that flies from `from` to `to` over `duration`,
    /// descending from `elevation` to the ground on the same curve.
    pub fn spawn_flying(
        &mut self,
        kind: EntityKind,
        from: Vec2,
        to: Vec2,
        elevation: f32,
        duration: Duration,
        easing: Easing,
    ) -> EntityId {
        let id = self.spawn(kind, from, elevation);
        if let Some(entity) = self.get_mut(id) {
            entity.motion = Some(Motion {
                position: Tween::new(from, to, duration, easing),
                elevation: Some(Tween::new(elevation, 0.0, duration, easing)),
            });
        }
        id
    }

    /// Destroy `id` once the encounter clock reaches `at`.
    pub fn set_expiry(&mut self, id: EntityId, at: Duration) {
        if let Some(entity) = self.get_mut(id) {
            entity.expires_at = Some(at);
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&ArenaEntity> {
        self.collections.iter().flatten().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut ArenaEntity> {
        self.collections.iter_mut().flatten().find(|e| e.id == id)
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<ArenaEntity> {
        for collection in self.collections.iter_mut() {
            if let Some(idx) = collection.iter().position(|e| e.id == id) {
                return Some(collection.remove(idx));
            }
        }
        None
    }

    /// Remove every boss-owned entity, returning `(id, kind)` pairs.
    pub fn despawn_boss_owned(&mut self) -> Vec<(EntityId, EntityKind)> {
        EntityKind::ALL
            .into_iter()
            .filter(|k| k.is_boss_owned())
            .flat_map(|kind| {
                self.collections[kind.index()]
                    .drain(..)
                    .map(move |e| (e.id, kind))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn of_kind(&self, kind: EntityKind) -> &[ArenaEntity] {
        &self.collections[kind.index()]
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.collections[kind.index()].len()
    }

    pub fn total(&self) -> usize {
        self.collections.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArenaEntity> {
        self.collections.iter().flatten()
    }

    pub fn clear(&mut self) {
        for collection in self.collections.iter_mut() {
            collection.clear();
        }
    }

    /// Advance motions by `dt` and drop entities expired at `now`.
    pub fn advance(&mut self, dt: Duration, now: Duration) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        for collection in self.collections.iter_mut() {
            let mut i = 0;
            while i < collection.len() {
                let entity = &mut collection[i];

                let mut arrived = false;
                if let Some(motion) = entity.motion.as_mut() {
                    entity.position = motion.position.advance(dt);
                    if let Some(elev) = motion.elevation.as_mut() {
                        entity.elevation = elev.advance(dt);
                    }
                    if motion.position.is_finished() {
                        entity.motion = None;
                        arrived = entity.kind.explodes_on_arrival();
                    }
                }

                if arrived {
                    report.arrived.push(collection.remove(i));
                } else if entity.expires_at.is_some_and(|at| at <= now) {
                    let gone = collection.remove(i);
                    report.expired.push((gone.id, gone.kind));
                } else {
                    i += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_spawn_and_despawn() {
        let mut store = EntityStore::new();
        let a = store.spawn(EntityKind::Explosion, Vec2::ZERO, 0.0);
        let b = store.spawn(EntityKind::SlashEffect, Vec2::ONE, 0.0);
        assert_ne!(a, b);
        assert_eq!(store.total(), 2);
        assert_eq!(store.despawn(a).map(|e| e.kind), Some(EntityKind::Explosion));
        assert!(store.despawn(a).is_none());
        assert_eq!(store.count(EntityKind::SlashEffect), 1);
    }

    #[test]
    fn test_despawn_boss_owned_keeps_player_effects() {
        let mut store = EntityStore::new();
        store.spawn(EntityKind::BossProjectile, Vec2::ZERO, 24.0);
        store.spawn(EntityKind::FloorBlastIndicator, Vec2::ZERO, 0.0);
        store.spawn(EntityKind::CutEffect, Vec2::ZERO, 0.0);
        let removed = store.despawn_boss_owned();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.total(), 1);
        assert_eq!(store.count(EntityKind::CutEffect), 1);
    }

    #[test]
    fn test_projectile_arrives_and_is_removed() {
        let mut store = EntityStore::new();
        let id = store.spawn_flying(
            EntityKind::BossProjectile,
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            24.0,
            ms(200),
            Easing::InSine,
        );
        let report = store.advance(ms(100), ms(100));
        assert!(report.arrived.is_empty());
        assert!(store.get(id).is_some_and(|e| e.elevation < 24.0));

        let report = store.advance(ms(100), ms(200));
        assert_eq!(report.arrived.len(), 1);
        assert!((report.arrived[0].position.x - 100.0).abs() < 1e-3);
        assert!(report.arrived[0].elevation.abs() < 1e-3);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_lifetime_expiry() {
        let mut store = EntityStore::new();
        let id = store.spawn(EntityKind::Explosion, Vec2::ZERO, 0.0);
        store.set_expiry(id, ms(500));
        assert!(store.advance(ms(400), ms(400)).expired.is_empty());
        let report = store.advance(ms(100), ms(500));
        assert_eq!(report.expired, vec![(id, EntityKind::Explosion)]);
        assert_eq!(store.total(), 0);
    }

    #[test]
    fn test_collision_profiles() {
        let projectile = EntityKind::BossProjectile.collision().unwrap();
        assert!(projectile.hits(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0)));
        assert!(!projectile.hits(Vec2::ZERO, 20.0, Vec2::new(15.0, 0.0)));
        assert!(!projectile.hits(Vec2::ZERO, 0.0, Vec2::new(16.0, 0.0)));

        let blast = EntityKind::MeleeBlast.collision().unwrap();
        assert!(blast.hits(Vec2::ZERO, 0.0, Vec2::new(55.0, 0.0)));
        assert!(EntityKind::Explosion.collision().is_none());
    }
}
