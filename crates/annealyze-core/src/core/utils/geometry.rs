use nalgebra::{Point3, Rotation3, Unit, Vector3};

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_degrees.to_radians())
}

/// Rotates `point` about the line through `axis_start` and `axis_end`.
///
/// Returns `None` when the two axis points coincide.
pub fn rotate_about_axis(
    point: &Point3<f64>,
    axis_start: &Point3<f64>,
    axis_end: &Point3<f64>,
    angle_degrees: f64,
) -> Option<Point3<f64>> {
    let axis = axis_end - axis_start;
    if axis.norm_squared() <= f64::EPSILON {
        return None;
    }
    let rotation = rotation_from_axis_angle(&axis, angle_degrees);
    Some(axis_start + rotation * (point - axis_start))
}

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

/// Sum of Euclidean distances over every pair drawn from the two point sets.
pub fn sum_of_cross_distances(group_a: &[Point3<f64>], group_b: &[Point3<f64>]) -> f64 {
    group_a
        .iter()
        .map(|a| group_b.iter().map(|b| distance(a, b)).sum::<f64>())
        .sum()
}
