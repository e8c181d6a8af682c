//! Registry of manipulator hit-test bounds.
//!
//! Views hold a [`BoundId`] into the registry, never the bound itself. Ids are
//! generational, so an id that has been deleted stays invalid even after its
//! slot is reused by another view.

use bevy::log::debug;
use bevy::math::Ray3d;
use bevy::prelude::*;
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::bounds::BoundShape;
use crate::types::{ManipulatorId, ManipulatorManagerId};

new_key_type! {
    /// Key of a registered bound.
    pub struct BoundId;
}

/// Errors reported by [`ManipulatorBoundRegistry`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoundError {
    /// The caller asked a registry owned by a different manager.
    #[error("registry belongs to {expected}, not {requested}")]
    ManagerMismatch {
        /// Manager owning the registry.
        expected: ManipulatorManagerId,
        /// Manager named by the caller.
        requested: ManipulatorManagerId,
    },

    /// The bound was deleted.
    #[error("bound {0:?} is no longer registered")]
    StaleBound(BoundId),

    /// The bound belongs to another manipulator.
    #[error("bound {bound:?} belongs to {owner}, not {requested}")]
    WrongOwner {
        /// The bound in question.
        bound: BoundId,
        /// Manipulator that registered it.
        owner: ManipulatorId,
        /// Manipulator that tried to update it.
        requested: ManipulatorId,
    },
}

/// Nearest bound hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundHit {
    /// Manipulator owning the bound.
    pub manipulator_id: ManipulatorId,
    /// The bound that was hit.
    pub bound_id: BoundId,
    /// Distance along the ray.
    pub distance: f32,
}

#[derive(Debug, Clone)]
struct RegisteredBound {
    manipulator_id: ManipulatorId,
    shape: BoundShape,
    dirty: bool,
}

/// Hit-test bounds for every manipulator of one manager.
#[derive(Resource, Debug)]
pub struct ManipulatorBoundRegistry {
    manager_id: ManipulatorManagerId,
    bounds: SlotMap<BoundId, RegisteredBound>,
}

impl Default for ManipulatorBoundRegistry {
    fn default() -> Self {
        Self::new(ManipulatorManagerId::MAIN)
    }
}

impl ManipulatorBoundRegistry {
    /// Empty registry owned by `manager_id`.
    pub fn new(manager_id: ManipulatorManagerId) -> Self {
        Self {
            manager_id,
            bounds: SlotMap::with_key(),
        }
    }

    /// Manager owning this registry.
    pub fn manager_id(&self) -> ManipulatorManagerId {
        self.manager_id
    }

    /// Register a new bound (`bound_id` is `None`) or replace the geometry of
    /// an existing one in place. The entry is no longer dirty afterwards.
    pub fn update_bound(
        &mut self,
        manager_id: ManipulatorManagerId,
        manipulator_id: ManipulatorId,
        bound_id: Option<BoundId>,
        shape: BoundShape,
    ) -> Result<BoundId, BoundError> {
        if manager_id != self.manager_id {
            return Err(BoundError::ManagerMismatch {
                expected: self.manager_id,
                requested: manager_id,
            });
        }

        let Some(bound_id) = bound_id else {
            let id = self.bounds.insert(RegisteredBound {
                manipulator_id,
                shape,
                dirty: false,
            });
            debug!("registered bound {id:?} for {manipulator_id}");
            return Ok(id);
        };

        let entry = self
            .bounds
            .get_mut(bound_id)
            .ok_or(BoundError::StaleBound(bound_id))?;
        if entry.manipulator_id != manipulator_id {
            return Err(BoundError::WrongOwner {
                bound: bound_id,
                owner: entry.manipulator_id,
                requested: manipulator_id,
            });
        }
        entry.shape = shape;
        entry.dirty = false;
        Ok(bound_id)
    }

    /// Flag a bound as out of date. Dirty bounds are skipped by [`Self::raycast`].
    pub fn set_bound_dirty(&mut self, bound_id: BoundId) -> Result<(), BoundError> {
        let entry = self
            .bounds
            .get_mut(bound_id)
            .ok_or(BoundError::StaleBound(bound_id))?;
        entry.dirty = true;
        Ok(())
    }

    /// Remove a bound. Returns whether it was registered.
    pub fn delete_bound(&mut self, bound_id: BoundId) -> bool {
        let removed = self.bounds.remove(bound_id).is_some();
        if removed {
            debug!("deleted bound {bound_id:?}");
        }
        removed
    }

    /// Remove every bound registered by `manipulator_id`. Returns how many
    /// were removed.
    pub fn delete_manipulator_bounds(&mut self, manipulator_id: ManipulatorId) -> usize {
        let before = self.bounds.len();
        self.bounds.retain(|_, bound| bound.manipulator_id != manipulator_id);
        before - self.bounds.len()
    }

    /// Keep only bounds whose manipulator satisfies `keep`.
    pub fn retain_manipulators(&mut self, mut keep: impl FnMut(ManipulatorId) -> bool) -> usize {
        let before = self.bounds.len();
        self.bounds.retain(|_, bound| keep(bound.manipulator_id));
        before - self.bounds.len()
    }

    /// Geometry of a registered bound.
    pub fn bound(&self, bound_id: BoundId) -> Option<&BoundShape> {
        self.bounds.get(bound_id).map(|bound| &bound.shape)
    }

    /// Manipulator that registered `bound_id`.
    pub fn owner(&self, bound_id: BoundId) -> Option<ManipulatorId> {
        self.bounds.get(bound_id).map(|bound| bound.manipulator_id)
    }

    /// Whether `bound_id` is registered and dirty.
    pub fn is_dirty(&self, bound_id: BoundId) -> bool {
        self.bounds.get(bound_id).is_some_and(|bound| bound.dirty)
    }

    /// Whether `bound_id` is currently registered.
    pub fn contains(&self, bound_id: BoundId) -> bool {
        self.bounds.contains_key(bound_id)
    }

    /// Number of registered bounds.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether no bounds are registered.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Closest clean bound hit by `ray`.
    pub fn raycast(&self, ray: &Ray3d) -> Option<BoundHit> {
        self.bounds
            .iter()
            .filter(|(_, bound)| !bound.dirty)
            .filter_map(|(bound_id, bound)| {
                bound.shape.intersect_ray(ray).map(|distance| BoundHit {
                    manipulator_id: bound.manipulator_id,
                    bound_id,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundShapeSphere;
    use approx::assert_relative_eq;

    fn sphere(center: Vec3, radius: f32) -> BoundShape {
        BoundShape::Sphere(BoundShapeSphere { center, radius })
    }

    const MANAGER: ManipulatorManagerId = ManipulatorManagerId::MAIN;
    const A: ManipulatorId = ManipulatorId(1);
    const B: ManipulatorId = ManipulatorId(2);

    #[test]
    fn insert_then_update_in_place() {
        let mut registry = ManipulatorBoundRegistry::default();
        let id = registry.update_bound(MANAGER, A, None, sphere(Vec3::ZERO, 1.0)).unwrap();
        let again = registry
            .update_bound(MANAGER, A, Some(id), sphere(Vec3::X, 2.0))
            .unwrap();
        assert_eq!(id, again);
        assert_eq!(registry.len(), 1);
        match registry.bound(id) {
            Some(BoundShape::Sphere(s)) => assert_relative_eq!(s.radius, 2.0),
            other => panic!("unexpected bound {other:?}"),
        }
    }

    #[test]
    fn deleted_ids_stay_invalid() {
        let mut registry = ManipulatorBoundRegistry::default();
        let id = registry.update_bound(MANAGER, A, None, sphere(Vec3::ZERO, 1.0)).unwrap();
        assert!(registry.delete_bound(id));
        assert!(registry.bound(id).is_none());
        assert!(!registry.delete_bound(id));

        // The freed slot is reused without reviving the old id.
        let reused = registry.update_bound(MANAGER, B, None, sphere(Vec3::ZERO, 1.0)).unwrap();
        assert_ne!(id, reused);
        assert!(registry.bound(id).is_none());
        assert_eq!(
            registry.update_bound(MANAGER, A, Some(id), sphere(Vec3::ZERO, 1.0)),
            Err(BoundError::StaleBound(id))
        );
        assert_eq!(registry.set_bound_dirty(id), Err(BoundError::StaleBound(id)));
    }

    #[test]
    fn rejects_foreign_manager_and_owner() {
        let mut registry = ManipulatorBoundRegistry::new(ManipulatorManagerId(7));
        assert_eq!(
            registry.update_bound(MANAGER, A, None, sphere(Vec3::ZERO, 1.0)),
            Err(BoundError::ManagerMismatch {
                expected: ManipulatorManagerId(7),
                requested: MANAGER,
            })
        );

        let id = registry
            .update_bound(ManipulatorManagerId(7), A, None, sphere(Vec3::ZERO, 1.0))
            .unwrap();
        assert!(matches!(
            registry.update_bound(ManipulatorManagerId(7), B, Some(id), sphere(Vec3::ZERO, 1.0)),
            Err(BoundError::WrongOwner { owner: A, requested: B, .. })
        ));
    }

    #[test]
    fn raycast_returns_nearest_clean_bound() {
        let mut registry = ManipulatorBoundRegistry::default();
        let far = registry
            .update_bound(MANAGER, A, None, sphere(Vec3::new(0.0, 0.0, -10.0), 1.0))
            .unwrap();
        let near = registry
            .update_bound(MANAGER, B, None, sphere(Vec3::new(0.0, 0.0, -2.0), 1.0))
            .unwrap();
        let ray = Ray3d {
            origin: Vec3::ZERO,
            direction: Dir3::NEG_Z,
        };

        let hit = registry.raycast(&ray).unwrap();
        assert_eq!(hit.bound_id, near);
        assert_eq!(hit.manipulator_id, B);
        assert_relative_eq!(hit.distance, 1.0, epsilon = 1e-5);

        registry.set_bound_dirty(near).unwrap();
        assert!(registry.is_dirty(near));
        let hit = registry.raycast(&ray).unwrap();
        assert_eq!(hit.bound_id, far);
        assert_relative_eq!(hit.distance, 9.0, epsilon = 1e-5);

        // Refreshing clears the dirty flag.
        registry
            .update_bound(MANAGER, B, Some(near), sphere(Vec3::new(0.0, 0.0, -2.0), 1.0))
            .unwrap();
        assert_eq!(registry.raycast(&ray).unwrap().bound_id, near);
    }

    #[test]
    fn prunes_by_manipulator() {
        let mut registry = ManipulatorBoundRegistry::default();
        for _ in 0..3 {
            registry.update_bound(MANAGER, A, None, sphere(Vec3::ZERO, 1.0)).unwrap();
        }
        let kept = registry.update_bound(MANAGER, B, None, sphere(Vec3::ZERO, 1.0)).unwrap();

        assert_eq!(registry.delete_manipulator_bounds(A), 3);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.retain_manipulators(|id| id != B), 1);
        assert!(!registry.contains(kept));
        assert!(registry.is_empty());
    }
}
