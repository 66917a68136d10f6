use glam::{Mat4, Vec3};

/// Local-space axis-aligned bounds of a pickable node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl NodeBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn unit() -> Self {
        Self { min: Vec3::splat(-0.5), max: Vec3::splat(0.5) }
    }
}

pub fn ray_sphere_intersection(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let mut t = -b - sqrt_d;
    if t < 0.0 {
        t = -b + sqrt_d;
    }
    if t < 0.0 {
        return None;
    }
    Some(t)
}

/// Tests a world-space ray against local bounds carried through an
/// arbitrary world transform, returning the world-space hit distance.
pub fn ray_hit_world_obb(origin: Vec3, dir: Vec3, world: &Mat4, bounds: &NodeBounds) -> Option<f32> {
    if !matrix_is_finite(world) {
        return None;
    }
    let inv = world.inverse();
    if !matrix_is_finite(&inv) {
        return None;
    }
    let origin_local = inv.transform_point3(origin);
    let dir_local = inv.transform_vector3(dir);
    if dir_local.length_squared() <= f32::EPSILON {
        return None;
    }
    let dir_local = dir_local.normalize();
    let (t_local, hit_local) = ray_aabb_intersection(origin_local, dir_local, bounds.min, bounds.max)?;
    if t_local < 0.0 {
        return None;
    }
    let hit_world = world.transform_point3(hit_local);
    Some((hit_world - origin).length())
}

pub fn matrix_is_finite(mat: &Mat4) -> bool {
    mat.to_cols_array().iter().all(|v| v.is_finite())
}

pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    // Entry solutions may be negative when the origin sits inside the
    // bounds; the final selection below still reports the exit face.
    let mut t_min: f32 = f32::NEG_INFINITY;
    let mut t_max: f32 = f32::INFINITY;
    let origin_arr = origin.to_array();
    let dir_arr = dir.to_array();
    let min_arr = min.to_array();
    let max_arr = max.to_array();
    for i in 0..3 {
        let o = origin_arr[i];
        let d = dir_arr[i];
        let min_axis = min_arr[i];
        let max_axis = max_arr[i];
        if d.abs() < 1e-6 {
            if o < min_axis || o > max_axis {
                return None;
            }
        } else {
            let inv_d = 1.0 / d;
            let mut t1 = (min_axis - o) * inv_d;
            let mut t2 = (max_axis - o) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    if t_max < 0.0 {
        return None;
    }
    let t_hit = if t_min >= 0.0 { t_min } else { t_max };
    let hit = origin + dir * t_hit;
    Some((t_hit, hit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn sphere_hit_in_front_of_origin() {
        let t = ray_sphere_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z, Vec3::ZERO, 1.0);
        assert!((t.unwrap() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_behind_ray_misses() {
        let t = ray_sphere_intersection(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, Vec3::ZERO, 1.0);
        assert!(t.is_none());
    }

    #[test]
    fn obb_hit_respects_rotation_and_scale() {
        let world = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 1.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
            Vec3::new(0.0, 0.0, -5.0),
        );
        let hit = ray_hit_world_obb(Vec3::ZERO, Vec3::NEG_Z, &world, &NodeBounds::unit());
        let distance = hit.expect("rotated box should be on the ray");
        assert!(distance > 3.0 && distance < 5.0, "distance {distance}");
    }

    #[test]
    fn degenerate_world_matrix_rejected() {
        let world = Mat4::from_scale(Vec3::ZERO);
        assert!(ray_hit_world_obb(Vec3::Z, Vec3::NEG_Z, &world, &NodeBounds::unit()).is_none());
    }

    #[test]
    fn obb_enclosing_the_origin_reports_the_exit_face() {
        let world = Mat4::from_scale(Vec3::splat(4.0));
        let hit = ray_hit_world_obb(Vec3::ZERO, Vec3::NEG_Z, &world, &NodeBounds::unit());
        let distance = hit.expect("exit face should be hit");
        assert!((distance - 2.0).abs() < 1e-4, "distance {distance}");
    }

    #[test]
    fn aabb_ray_starting_inside_hits_exit_face() {
        let (t, hit) =
            ray_aabb_intersection(Vec3::ZERO, Vec3::X, Vec3::splat(-1.0), Vec3::splat(1.0)).unwrap();
        assert!((t - 1.0).abs() < 1e-5);
        assert!((hit.x - 1.0).abs() < 1e-5);
    }
}
