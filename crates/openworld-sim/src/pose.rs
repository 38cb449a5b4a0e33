//! Arena of named local transforms for articulated entities.
//!
//! Body parts and wheel pivots never outlive the entity that owns them, so
//! each entity keeps its own [`Pose`] and refers to parts by [`PartId`]
//! index instead of holding references.

use glam::{Affine3A, EulerRot, Quat, Vec3};

/// Index of a part within its [`Pose`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartId(u16);

impl PartId {
    /// Position of the part in the arena.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Local transform of one part, relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartTransform {
    /// Offset from the parent origin.
    pub translation: Vec3,
    /// XYZ Euler angles (radians).
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for PartTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl PartTransform {
    /// Transform at an offset with no rotation.
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Same transform with a rotation.
    #[must_use]
    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Affine matrix for this local transform.
    pub fn to_affine(&self) -> Affine3A {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Affine3A::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

#[derive(Clone, Debug)]
struct Node {
    name: &'static str,
    parent: Option<PartId>,
    rest: PartTransform,
    local: PartTransform,
}

/// Owned tree of part transforms.
#[derive(Clone, Debug, Default)]
pub struct Pose {
    nodes: Vec<Node>,
}

impl Pose {
    /// Empty pose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. Parents must be added before their children.
    pub fn add(&mut self, name: &'static str, parent: Option<PartId>, rest: PartTransform) -> PartId {
        debug_assert!(parent.is_none_or(|p| p.index() < self.nodes.len()));
        let id = PartId(u16::try_from(self.nodes.len()).unwrap_or(u16::MAX));
        self.nodes.push(Node {
            name,
            parent,
            rest,
            local: rest,
        });
        id
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pose has no parts.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a part by name.
    pub fn find(&self, name: &str) -> Option<PartId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .and_then(|i| u16::try_from(i).ok())
            .map(PartId)
    }

    /// Name of a part.
    pub fn name(&self, id: PartId) -> &'static str {
        self.nodes[id.index()].name
    }

    /// Current local transform.
    pub fn local(&self, id: PartId) -> &PartTransform {
        &self.nodes[id.index()].local
    }

    /// Mutable local transform.
    pub fn local_mut(&mut self, id: PartId) -> &mut PartTransform {
        &mut self.nodes[id.index()].local
    }

    /// Rest transform the part was created with.
    pub fn rest(&self, id: PartId) -> &PartTransform {
        &self.nodes[id.index()].rest
    }

    /// Return every part to its rest transform.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.local = node.rest;
        }
    }

    /// Transform of a part relative to the pose root.
    pub fn model_transform(&self, id: PartId) -> Affine3A {
        let mut transform = self.local(id).to_affine();
        let mut parent = self.nodes[id.index()].parent;
        while let Some(p) = parent {
            transform = self.local(p).to_affine() * transform;
            parent = self.nodes[p.index()].parent;
        }
        transform
    }

    /// Iterate over `(id, name, local transform)`.
    pub fn iter(&self) -> impl Iterator<Item = (PartId, &'static str, &PartTransform)> {
        self.nodes.iter().enumerate().map(|(i, n)| {
            let id = PartId(u16::try_from(i).unwrap_or(u16::MAX));
            (id, n.name, &n.local)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn test_find_and_rest() {
        let mut pose = Pose::new();
        let body = pose.add("body", None, PartTransform::at(Vec3::new(0.0, 0.9, 0.0)));
        let head = pose.add("head", Some(body), PartTransform::at(Vec3::new(0.0, 0.85, 0.0)));
        assert_eq!(pose.find("head"), Some(head));
        assert_eq!(pose.find("tail"), None);
        assert_eq!(pose.name(body), "body");

        pose.local_mut(head).translation.y = 2.0;
        pose.reset();
        assert!((pose.local(head).translation.y - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_model_transform_composes_parents() {
        let mut pose = Pose::new();
        let pivot = pose.add(
            "pivot",
            None,
            PartTransform::at(Vec3::new(1.0, 0.0, 0.0)).rotated(Vec3::new(0.0, FRAC_PI_2, 0.0)),
        );
        let tip = pose.add("tip", Some(pivot), PartTransform::at(Vec3::new(0.0, 0.0, 1.0)));

        // Yawing +90 degrees maps local +Z onto +X.
        let world = pose.model_transform(tip).transform_point3(Vec3::ZERO);
        assert!((world - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_iter_visits_all_parts() {
        let mut pose = Pose::new();
        pose.add("a", None, PartTransform::default());
        pose.add("b", None, PartTransform::default());
        let names: Vec<_> = pose.iter().map(|(_, name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(pose.len(), 2);
    }
}
