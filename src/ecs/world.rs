//! World wrapper around hecs

use hecs::Entity;

use super::components::{AudioListener, Transform};

/// Game world containing all entities and components
pub struct World {
    /// Name of the loaded world, if any
    name: Option<String>,
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            name: None,
            inner: hecs::World::new(),
        }
    }

    /// Name of the currently loaded world
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the name of the currently loaded world
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Copy out an entity's transform
    ///
    /// Returns `None` if the entity no longer exists or has no transform.
    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.get::<Transform>(entity).ok().map(|t| *t)
    }

    /// Find the first entity tagged with [`AudioListener`] that has a transform
    pub fn find_listener(&self) -> Option<Entity> {
        self.inner
            .query::<(&AudioListener, &Transform)>()
            .iter()
            .map(|(entity, _)| entity)
            .next()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Clear all entities and forget the world name
    pub fn clear(&mut self) {
        self.inner.clear();
        self.name = None;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
