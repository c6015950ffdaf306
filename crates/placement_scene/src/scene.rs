//! Flat object store addressed by generational handles

use crate::object::SceneObject;
use placement_session::ObjectHandle;

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    object: Option<SceneObject>,
}

/// Objects of one editor scene.
///
/// Freed slots are reused with a bumped generation, so a handle to a
/// deleted object never resolves to its successor.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Scene name
    pub name: String,
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Insert an object and return its handle
    pub fn spawn(&mut self, object: SceneObject) -> ObjectHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectHandle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectHandle::new(index, 0)
    }

    /// Remove an object, returning it if the handle was live
    pub fn despawn(&mut self, handle: ObjectHandle) -> Option<SceneObject> {
        let slot = self.slot_mut(handle)?;
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.len -= 1;
        Some(object)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.object.as_ref()
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        self.slot_mut(handle)?.object.as_mut()
    }

    fn slot_mut(&mut self, handle: ObjectHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
    }

    /// Live objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectHandle, &SceneObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object
                .as_ref()
                .map(|object| (ObjectHandle::new(index as u32, slot.generation), object))
        })
    }

    pub fn handles(&self) -> Vec<ObjectHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// First object with the given name
    pub fn find(&self, name: &str) -> Option<ObjectHandle> {
        self.iter().find(|(_, o)| o.name == name).map(|(h, _)| h)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MeshShape;

    #[test]
    fn test_spawn_and_lookup() {
        let mut scene = Scene::new("test");
        let a = scene.spawn(SceneObject::new("a", MeshShape::Cube));
        let b = scene.spawn(SceneObject::new("b", MeshShape::Sphere));

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get(a).unwrap().name, "a");
        assert_eq!(scene.find("b"), Some(b));
        assert_eq!(scene.handles(), vec![a, b]);
    }

    #[test]
    fn test_reused_slot_does_not_alias() {
        let mut scene = Scene::new("test");
        let old = scene.spawn(SceneObject::new("old", MeshShape::Cube));
        assert!(scene.despawn(old).is_some());

        let new = scene.spawn(SceneObject::new("new", MeshShape::Cube));

        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(!scene.contains(old));
        assert!(scene.despawn(old).is_none());
        assert_eq!(scene.get(new).unwrap().name, "new");
        assert_eq!(scene.len(), 1);
    }
}
