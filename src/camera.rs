//! Camera poses and pinhole projection.
//!
//! The world is Z-up and object-centred. A [`Viewpoint`] places the camera at
//! `distance` from the origin at the given azimuth (in the XY plane, from +X
//! towards +Y) and elevation (towards +Z). The camera looks along its local
//! -Z axis with local +Y up, the renderer's convention.
//!
//! The orientation is `roll * look_at`: first face the origin with world +Z
//! as up, then roll about the viewing axis by `-tilt` degrees. The negated
//! tilt matches the annotation convention of the datasets the labels feed.

use nalgebra::{Point2, Point3, Unit, UnitQuaternion, Vector3};

use crate::config::{CameraSettings, ImageOrigin};
use crate::error::{Error, Result};
use crate::view::Viewpoint;

/// Camera position and orientation in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Eye position.
    pub position: Point3<f64>,
    /// Rotation from camera space to world space.
    pub orientation: UnitQuaternion<f64>,
}

impl CameraPose {
    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vector3<f64> {
        self.orientation * -Vector3::z()
    }

    /// Unit vector pointing up in the image.
    pub fn up(&self) -> Vector3<f64> {
        self.orientation * Vector3::y()
    }

    /// Transform a world point into camera space.
    #[inline]
    pub fn world_to_camera(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.orientation.inverse_transform_vector(&(p - self.position))
    }
}

/// Position on a sphere around the origin, angles in degrees.
///
/// Used for cameras and for the lights of a [`LightRig`](crate::render::LightRig).
pub fn object_centered_position(distance: f64, azimuth_deg: f64, elevation_deg: f64) -> Point3<f64> {
    let phi = elevation_deg.to_radians();
    let theta = azimuth_deg.to_radians();
    Point3::new(
        distance * theta.cos() * phi.cos(),
        distance * theta.sin() * phi.cos(),
        distance * phi.sin(),
    )
}

/// Rotation that makes a camera at `position` face the origin with world +Z up.
///
/// Straight above or below the origin world +Z is parallel to the view axis;
/// there the image "up" is the horizontal direction away from `azimuth_deg`,
/// which is the limit of the general case.
fn look_at_origin(position: &Point3<f64>, azimuth_deg: f64) -> UnitQuaternion<f64> {
    let back = position.coords;
    let horizontal = (back.x * back.x + back.y * back.y).sqrt();

    let up = if horizontal > 1e-12 * back.norm() {
        Vector3::z()
    } else {
        let theta = azimuth_deg.to_radians();
        let away = Vector3::new(theta.cos(), theta.sin(), 0.0);
        if back.z > 0.0 {
            -away
        } else {
            away
        }
    };

    UnitQuaternion::face_towards(&back, &up)
}

/// Solve the camera pose for a viewpoint.
///
/// Deterministic: identical input yields a bit-identical pose. Fails with
/// [`Error::DegenerateGeometry`] for a zero, negative or non-finite distance,
/// and with [`Error::InvalidParameter`] for non-finite angles.
pub fn pose(view: &Viewpoint) -> Result<CameraPose> {
    if !(view.distance.is_finite() && view.distance > 0.0) {
        return Err(Error::DegenerateGeometry(format!(
            "camera distance must be positive, got {}",
            view.distance
        )));
    }
    for (name, value) in [
        ("azimuth", view.azimuth),
        ("elevation", view.elevation),
        ("tilt", view.tilt),
    ] {
        if !value.is_finite() {
            return Err(Error::invalid_param(name, value, "must be finite"));
        }
    }

    let position = object_centered_position(view.distance, view.azimuth, view.elevation);
    let look_at = look_at_origin(&position, view.azimuth);

    let axis = Unit::new_normalize(position.coords);
    let roll = UnitQuaternion::from_axis_angle(&axis, (-view.tilt).to_radians());

    Ok(CameraPose {
        position,
        orientation: roll * look_at,
    })
}

/// A posed pinhole camera with the renderer's intrinsics.
#[derive(Debug, Clone)]
pub struct Camera {
    pose: CameraPose,
    width: f64,
    height: f64,
    focal: f64,
    origin: ImageOrigin,
}

impl Camera {
    /// Combine a pose with camera settings.
    pub fn new(pose: CameraPose, settings: &CameraSettings) -> Self {
        Self {
            pose,
            width: settings.width as f64,
            height: settings.height as f64,
            focal: settings.focal_length_px(),
            origin: settings.origin,
        }
    }

    /// The camera pose.
    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// Eye position.
    pub fn eye(&self) -> &Point3<f64> {
        &self.pose.position
    }

    /// Sub-pixel image position of a world point.
    ///
    /// `None` when the point lies on or behind the camera plane. The result may
    /// lie outside the frame.
    pub fn project(&self, p: &Point3<f64>) -> Option<Point2<f64>> {
        let c = self.pose.world_to_camera(p);
        let depth = -c.z;
        if depth <= 1e-12 {
            return None;
        }

        let x = 0.5 * self.width + self.focal * c.x / depth;
        let dy = self.focal * c.y / depth;
        let y = match self.origin {
            ImageOrigin::BottomLeft => 0.5 * self.height + dy,
            ImageOrigin::TopLeft => 0.5 * self.height - dy,
        };
        Some(Point2::new(x, y))
    }

    /// Rounded pixel inside `[0, width) x [0, height)`, or `None`.
    ///
    /// Coordinates round half away from zero before the frame test.
    pub fn pixel(&self, p: &Point3<f64>) -> Option<(i64, i64)> {
        let q = self.project(p)?;
        let (x, y) = (q.x.round(), q.y.round());
        if x >= 0.0 && x < self.width && y >= 0.0 && y < self.height {
            Some((x as i64, y as i64))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_position_on_sphere() {
        let p = object_centered_position(2.0, 90.0, 0.0);
        assert!((p - Point3::new(0.0, 2.0, 0.0)).norm() < EPS);

        let p = object_centered_position(3.0, 0.0, 90.0);
        assert!((p - Point3::new(0.0, 0.0, 3.0)).norm() < EPS);

        let p = object_centered_position(1.5, 37.0, -20.0);
        assert!((p.coords.norm() - 1.5).abs() < EPS);
    }

    #[test]
    fn test_pose_faces_origin() {
        for &(az, el, tilt) in &[(0.0, 0.0, 0.0), (45.0, 20.0, 10.0), (300.0, -60.0, -30.0), (10.0, 90.0, 0.0), (10.0, -90.0, 5.0)] {
            let pose = pose(&Viewpoint::new(az, el, tilt, 2.0)).unwrap();
            let to_origin = -pose.position.coords.normalize();
            assert!(
                (pose.forward() - to_origin).norm() < 1e-9,
                "view ({}, {}, {}) does not face the origin",
                az,
                el,
                tilt
            );
            assert!((pose.orientation.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_untilted_up_is_world_up() {
        let pose = pose(&Viewpoint::new(30.0, 0.0, 0.0, 2.0)).unwrap();
        assert!((pose.up() - Vector3::z()).norm() < 1e-9);
    }

    #[test]
    fn test_pole_is_limit_of_near_pole() {
        let at_pole = pose(&Viewpoint::new(30.0, 90.0, 0.0, 2.0)).unwrap();
        let near_pole = pose(&Viewpoint::new(30.0, 89.9999, 0.0, 2.0)).unwrap();
        assert!((at_pole.up() - near_pole.up()).norm() < 1e-4);
    }

    #[test]
    fn test_pose_is_deterministic() {
        let view = Viewpoint::new(123.456, 12.5, -7.25, 2.75);
        let a = pose(&view).unwrap();
        let b = pose(&view).unwrap();
        assert_eq!(a.position, b.position);
        assert_eq!(a.orientation, b.orientation);
    }

    #[test]
    fn test_tilt_rolls_about_view_axis() {
        let base = pose(&Viewpoint::new(60.0, 15.0, 0.0, 2.0)).unwrap();
        let tilted = pose(&Viewpoint::new(60.0, 15.0, 25.0, 2.0)).unwrap();

        assert_eq!(base.position, tilted.position);
        assert!((base.forward() - tilted.forward()).norm() < 1e-9);
        let angle = base.up().angle(&tilted.up());
        assert!((angle - 25.0_f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_distance() {
        assert!(matches!(
            pose(&Viewpoint::new(0.0, 0.0, 0.0, 0.0)),
            Err(Error::DegenerateGeometry(_))
        ));
        assert!(pose(&Viewpoint::new(0.0, 0.0, 0.0, f64::NAN)).is_err());
        assert!(matches!(
            pose(&Viewpoint::new(f64::INFINITY, 0.0, 0.0, 1.0)),
            Err(Error::InvalidParameter { name: "azimuth", .. })
        ));
    }

    #[test]
    fn test_origin_projects_to_center() {
        let settings = CameraSettings::default().with_resolution(640, 480);
        let camera = Camera::new(pose(&Viewpoint::new(77.0, 33.0, 12.0, 3.0)).unwrap(), &settings);
        let q = camera.project(&Point3::origin()).unwrap();
        assert!((q.x - 320.0).abs() < 1e-9);
        assert!((q.y - 240.0).abs() < 1e-9);
        assert_eq!(camera.pixel(&Point3::origin()), Some((320, 240)));
    }

    #[test]
    fn test_up_is_up_in_image() {
        // camera on +X looking at the origin; +Z is image up
        let view = Viewpoint::new(0.0, 0.0, 0.0, 5.0);
        let p = Point3::new(0.0, 0.0, 0.5);

        let bottom_left = Camera::new(pose(&view).unwrap(), &CameraSettings::default().with_resolution(640, 480));
        assert!(bottom_left.project(&p).unwrap().y > 240.0);

        let settings = CameraSettings::default()
            .with_resolution(640, 480)
            .with_origin(ImageOrigin::TopLeft);
        let top_left = Camera::new(pose(&view).unwrap(), &settings);
        assert!(top_left.project(&p).unwrap().y < 240.0);

        // +Y is to the right when looking down -X
        let right = bottom_left.project(&Point3::new(0.0, 0.5, 0.0)).unwrap();
        assert!(right.x > 320.0);
    }

    #[test]
    fn test_behind_camera_is_unprojectable() {
        let settings = CameraSettings::default();
        let camera = Camera::new(pose(&Viewpoint::new(0.0, 0.0, 0.0, 2.0)).unwrap(), &settings);
        assert!(camera.project(&Point3::new(3.0, 0.0, 0.0)).is_none());
        assert!(camera.project(&Point3::new(2.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_pixel_frame_is_half_open() {
        let settings = CameraSettings::default().with_resolution(100, 100).with_fov_degrees(90.0);
        let camera = Camera::new(pose(&Viewpoint::new(0.0, 0.0, 0.0, 1.0)).unwrap(), &settings);
        // focal = 50 px; a point at lateral offset s on the plane x = 0 lands at 50 + 50 s
        assert_eq!(camera.pixel(&Point3::new(0.0, 0.98, 0.0)), Some((99, 50)));
        assert_eq!(camera.pixel(&Point3::new(0.0, 0.995, 0.0)), None);
        assert_eq!(camera.pixel(&Point3::new(0.0, -1.0, 0.0)), Some((0, 50)));
        assert_eq!(camera.pixel(&Point3::new(0.0, -1.02, 0.0)), None);
    }
}
