//! Raycastable proxies for camera obstruction tests.
//!
//! The camera is the only consumer. World geometry is supplied as simple
//! shapes (building boxes, pole cylinders, spheres) rather than meshes.

use glam::{Vec2, Vec3};

/// A half-line with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction. Returns `None` for a zero direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Anything a ray can hit.
pub trait RayCast {
    /// Distance to the first hit within `max_distance`, if any.
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<f32>;
}

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box from a center and full size.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

impl RayCast for Aabb {
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        // Slab method.
        let inv = |d: f32| if d.abs() > 1e-6 { 1.0 / d } else { f32::MAX };
        let inv_dir = Vec3::new(inv(ray.direction.x), inv(ray.direction.y), inv(ray.direction.z));

        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;
        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();

        if tmax < 0.0 || tmin > tmax {
            return None;
        }
        let t = if tmin >= 0.0 { tmin } else { tmax };
        (t <= max_distance).then_some(t)
    }
}

/// Sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl RayCast for Sphere {
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        let to_origin = ray.origin - self.center;
        let b = to_origin.dot(ray.direction);
        let c = to_origin.length_squared() - self.radius * self.radius;
        if c > 0.0 && b > 0.0 {
            return None;
        }
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let t = (-b - disc.sqrt()).max(0.0);
        (t <= max_distance).then_some(t)
    }
}

/// Upright cylinder standing on `base`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cylinder {
    /// Center of the bottom cap.
    pub base: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl Cylinder {
    fn contains_height(&self, y: f32) -> bool {
        y >= self.base.y && y <= self.base.y + self.height
    }
}

impl RayCast for Cylinder {
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        let origin = Vec2::new(ray.origin.x - self.base.x, ray.origin.z - self.base.z);
        let dir = Vec2::new(ray.direction.x, ray.direction.z);
        let r2 = self.radius * self.radius;

        let mut best: Option<f32> = None;
        let mut consider = |t: f32| {
            if t >= 0.0 && t <= max_distance {
                best = Some(best.map_or(t, |b: f32| b.min(t)));
            }
        };

        // Side wall.
        let a = dir.length_squared();
        if a > 1e-9 {
            let b = origin.dot(dir);
            let c = origin.length_squared() - r2;
            let disc = b * b - a * c;
            if disc >= 0.0 {
                let sq = disc.sqrt();
                for t in [(-b - sq) / a, (-b + sq) / a] {
                    if self.contains_height(ray.at(t).y) {
                        consider(t);
                    }
                }
            }
        }

        // Caps.
        if ray.direction.y.abs() > 1e-6 {
            for cap_y in [self.base.y, self.base.y + self.height] {
                let t = (cap_y - ray.origin.y) / ray.direction.y;
                let p = ray.at(t);
                let offset = Vec2::new(p.x - self.base.x, p.z - self.base.z);
                if offset.length_squared() <= r2 {
                    consider(t);
                }
            }
        }

        // Starting inside.
        if origin.length_squared() <= r2 && self.contains_height(ray.origin.y) {
            consider(0.0);
        }

        best
    }
}

/// A camera-blocking proxy shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collider {
    Box(Aabb),
    Sphere(Sphere),
    Cylinder(Cylinder),
}

impl RayCast for Collider {
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        match self {
            Collider::Box(shape) => shape.cast(ray, max_distance),
            Collider::Sphere(shape) => shape.cast(ray, max_distance),
            Collider::Cylinder(shape) => shape.cast(ray, max_distance),
        }
    }
}

/// The set of proxies the camera tests against.
#[derive(Clone, Debug, Default)]
pub struct CollisionSet {
    colliders: Vec<Collider>,
}

impl CollisionSet {
    /// Create a set from colliders.
    pub fn new(colliders: Vec<Collider>) -> Self {
        Self { colliders }
    }

    /// Replace all colliders.
    pub fn set(&mut self, colliders: Vec<Collider>) {
        self.colliders = colliders;
    }

    /// Add a collider.
    pub fn push(&mut self, collider: Collider) {
        self.colliders.push(collider);
    }

    /// No colliders registered.
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Number of colliders.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }
}

impl RayCast for CollisionSet {
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        self.colliders
            .iter()
            .filter_map(|c| c.cast(ray, max_distance))
            .min_by(f32::total_cmp)
    }
}
