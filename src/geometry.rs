use nalgebra_glm as glm;

/// Distance along `direction` (normalized internally) at which the ray
/// from `origin` crosses the parallelogram spanned by `across` and
/// `upward` out of `corner`, or `None` if it misses or runs parallel to
/// the plane. The distance may be negative; callers that only want hits
/// in front of the origin filter for `t >= 0`.
pub fn ray_parallelogram_intersect(
    origin: glm::Vec3,
    direction: glm::Vec3,
    corner: glm::Vec3,
    across: glm::Vec3,
    upward: glm::Vec3,
) -> Option<f32> {
    let d = glm::normalize(&direction);
    let normal = glm::normalize(&glm::cross(&across, &upward));

    let denom = glm::dot(&d, &normal);
    if denom.abs() < 1e-6 {
        return None;
    }

    let t = glm::dot(&(corner - origin), &normal) / denom;
    let hit = origin + d * t;
    let offset = hit - corner;

    let u = glm::dot(&offset, &across) / glm::dot(&across, &across);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let v = glm::dot(&offset, &upward) / glm::dot(&upward, &upward);
    if !(0.0..=1.0).contains(&v) {
        return None;
    }

    Some(t)
}

#[cfg(test)]
mod tests {
    use super::ray_parallelogram_intersect;
    use nalgebra_glm as glm;

    fn unit_quad_at_origin() -> (glm::Vec3, glm::Vec3, glm::Vec3) {
        (
            glm::vec3(-0.5, -0.5, 0.0),
            glm::vec3(1.0, 0.0, 0.0),
            glm::vec3(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn ray_through_center_hits_at_distance() {
        let (corner, across, up) = unit_quad_at_origin();
        let t = ray_parallelogram_intersect(
            glm::vec3(0.0, 0.0, 5.0),
            glm::vec3(0.0, 0.0, -1.0),
            corner,
            across,
            up,
        );
        assert!((t.unwrap() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn ray_outside_the_edges_misses() {
        let (corner, across, up) = unit_quad_at_origin();
        let t = ray_parallelogram_intersect(
            glm::vec3(0.7, 0.0, 5.0),
            glm::vec3(0.0, 0.0, -1.0),
            corner,
            across,
            up,
        );
        assert!(t.is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let (corner, across, up) = unit_quad_at_origin();
        let t = ray_parallelogram_intersect(
            glm::vec3(0.0, 0.0, 5.0),
            glm::vec3(1.0, 0.0, 0.0),
            corner,
            across,
            up,
        );
        assert!(t.is_none());
    }

    #[test]
    fn hit_behind_the_origin_reports_negative_distance() {
        let (corner, across, up) = unit_quad_at_origin();
        let t = ray_parallelogram_intersect(
            glm::vec3(0.0, 0.0, -3.0),
            glm::vec3(0.0, 0.0, -1.0),
            corner,
            across,
            up,
        );
        assert!((t.unwrap() + 3.0).abs() < 1e-5);
    }

    #[test]
    fn unnormalized_direction_still_measures_in_world_units() {
        let (corner, across, up) = unit_quad_at_origin();
        let t = ray_parallelogram_intersect(
            glm::vec3(0.0, 0.0, 5.0),
            glm::vec3(0.0, 0.0, -10.0),
            corner,
            across,
            up,
        );
        assert!((t.unwrap() - 5.0).abs() < 1e-5);
    }
}
