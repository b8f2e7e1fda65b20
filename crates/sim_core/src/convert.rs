//! Boundary conversions between the plain contract types and nalgebra.

use contracts::{Pose, Quaternion, Vector3};
use nalgebra as na;

/// Contract vector → nalgebra vector
pub fn vec3(v: &Vector3) -> na::Vector3<f64> {
    na::Vector3::new(v.x, v.y, v.z)
}

/// Contract vector → nalgebra point
pub fn point3(v: &Vector3) -> na::Point3<f64> {
    na::Point3::new(v.x, v.y, v.z)
}

/// nalgebra vector → contract vector
pub fn to_vec3(v: &na::Vector3<f64>) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// Contract quaternion → nalgebra unit quaternion (renormalizes)
pub fn unit_quat(q: &Quaternion) -> na::UnitQuaternion<f64> {
    na::UnitQuaternion::from_quaternion(na::Quaternion::new(q.w, q.x, q.y, q.z))
}

/// nalgebra unit quaternion → contract quaternion
pub fn to_quat(q: &na::UnitQuaternion<f64>) -> Quaternion {
    Quaternion::new(q.w, q.i, q.j, q.k)
}

/// Contract pose → nalgebra isometry
pub fn isometry(p: &Pose) -> na::Isometry3<f64> {
    na::Isometry3::from_parts(na::Translation3::new(
        p.translation.x,
        p.translation.y,
        p.translation.z,
    ), unit_quat(&p.rotation))
}
