use glam::Vec3;

/// Pinhole camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view, in degrees
    pub fov_y: f32,
    pub aspect_ratio: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, 17.5),
            look_at: Vec3::new(0.0, 5.0, 0.0),
            up: Vec3::Y,
            fov_y: 45.0,
            aspect_ratio: 1.0,
        }
    }
}

/// Ray generation basis: a primary ray through the normalized screen coordinate `d` in [-1, 1]²
/// has direction `d.x * u + d.y * v + w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub eye: Vec3,
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
}

impl Camera {
    pub fn direction(&self) -> Vec3 {
        (self.look_at - self.eye).normalize()
    }

    /// `w` points to the look at point, `u` and `v` span the image plane at that distance.
    pub fn frame(&self) -> CameraFrame {
        let w = self.look_at - self.eye;
        let w_len = w.length();
        let u = w.cross(self.up).normalize();
        let v = u.cross(w).normalize();

        let v_len = w_len * (self.fov_y.to_radians() / 2.0).tan();
        let u_len = v_len * self.aspect_ratio;

        CameraFrame {
            eye: self.eye,
            u: u * u_len,
            v: v * v_len,
            w,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Orbit around the look at point
    #[default]
    LookAtFixed,
    /// Look around from the eye
    EyeFixed,
}

/// Mouse driven camera control.
///
/// Orientation is tracked as a latitude and longitude in a fixed reference frame. With gimbal
/// lock the up vector of the camera never changes.
#[derive(Debug, Clone)]
pub struct Trackball {
    u: Vec3,
    v: Vec3,
    w: Vec3,
    latitude: f32,
    longitude: f32,
    previous: Option<(f32, f32)>,
    distance: f32,
    pub view_mode: ViewMode,
    pub zoom_multiplier: f32,
    pub gimbal_lock: bool,
}

impl Trackball {
    /// Degrees per pixel
    const DRAG_SPEED: f32 = 0.5;
    const MAX_LATITUDE: f32 = 89.0;

    /// Reference frame is X, Z, Y: longitude turns around Y
    pub fn new(camera: &Camera) -> Self {
        let mut trackball = Self {
            u: Vec3::X,
            v: Vec3::Z,
            w: Vec3::Y,
            latitude: 0.0,
            longitude: 0.0,
            previous: None,
            distance: 0.0,
            view_mode: ViewMode::default(),
            zoom_multiplier: 1.1,
            gimbal_lock: true,
        };
        trackball.reinit_from_camera(camera);
        trackball
    }

    pub fn set_reference_frame(&mut self, u: Vec3, v: Vec3, w: Vec3, camera: &Camera) {
        self.u = u;
        self.v = v;
        self.w = w;
        self.reinit_from_camera(camera);
    }

    /// Recompute latitude, longitude and distance from the camera pose
    pub fn reinit_from_camera(&mut self, camera: &Camera) {
        let offset = camera.eye - camera.look_at;
        self.distance = offset.length();

        let dir = offset.normalize_or_zero();
        let local = Vec3::new(dir.dot(self.u), dir.dot(self.v), dir.dot(self.w));
        self.longitude = local.x.atan2(local.y);
        self.latitude = local.z.clamp(-1.0, 1.0).asin();
    }

    pub fn latitude_degrees(&self) -> f32 {
        self.latitude.to_degrees()
    }

    pub fn longitude_degrees(&self) -> f32 {
        self.longitude.to_degrees()
    }

    pub fn start_tracking(&mut self, x: f32, y: f32) {
        self.previous = Some((x, y));
    }

    pub fn stop_tracking(&mut self) {
        self.previous = None;
    }

    /// Returns whether the camera moved
    pub fn update_tracking(&mut self, x: f32, y: f32, camera: &mut Camera) -> bool {
        let Some((prev_x, prev_y)) = self.previous else {
            self.start_tracking(x, y);
            return false;
        };
        let dx = x - prev_x;
        let dy = y - prev_y;
        self.previous = Some((x, y));

        let latitude = (self.latitude.to_degrees() + Self::DRAG_SPEED * dy)
            .clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);
        let longitude = (self.longitude.to_degrees() - Self::DRAG_SPEED * dx) % 360.0;
        self.latitude = latitude.to_radians();
        self.longitude = longitude.to_radians();

        self.update_camera(camera);
        if !self.gimbal_lock {
            self.w = camera.up;
        }
        true
    }

    /// Zoom towards the look at point, `direction > 0` gets closer
    pub fn wheel(&mut self, direction: f32, camera: &mut Camera) -> bool {
        if direction == 0.0 {
            return false;
        }
        let zoom = if direction > 0.0 {
            1.0 / self.zoom_multiplier
        } else {
            self.zoom_multiplier
        };
        self.distance *= zoom;
        camera.eye = camera.look_at + (camera.eye - camera.look_at) * zoom;
        true
    }

    fn update_camera(&self, camera: &mut Camera) {
        let local = Vec3::new(
            self.latitude.cos() * self.longitude.sin(),
            self.latitude.cos() * self.longitude.cos(),
            self.latitude.sin(),
        );
        let dir = self.u * local.x + self.v * local.y + self.w * local.z;

        match self.view_mode {
            ViewMode::EyeFixed => camera.look_at = camera.eye - dir * self.distance,
            ViewMode::LookAtFixed => camera.eye = camera.look_at + dir * self.distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{Camera, Trackball, ViewMode};

    const EPS: f32 = 1e-4;

    #[test]
    fn frame_of_default_camera() {
        let camera = Camera::default();
        let frame = camera.frame();

        assert_eq!(frame.eye, camera.eye);
        assert!(frame.w.distance(Vec3::new(0.0, 0.0, -17.5)) < EPS);
        assert!(frame.u.normalize().distance(Vec3::X) < EPS);
        assert!(frame.v.normalize().distance(Vec3::Y) < EPS);

        let v_len = 17.5 * 22.5f32.to_radians().tan();
        assert!((frame.v.length() - v_len).abs() < EPS);
        assert!((frame.u.length() - v_len).abs() < EPS);
    }

    #[test]
    fn aspect_ratio_scales_u() {
        let camera = Camera {
            aspect_ratio: 2.0,
            ..Default::default()
        };
        let frame = camera.frame();
        assert!((frame.u.length() - 2.0 * frame.v.length()).abs() < EPS);
    }

    #[test]
    fn trackball_reads_camera_pose() {
        let camera = Camera::default();
        let trackball = Trackball::new(&camera);
        // Eye is straight along +z of the look at point
        assert!(trackball.latitude_degrees().abs() < EPS);
        assert!(trackball.longitude_degrees().abs() < EPS);
    }

    #[test]
    fn orbit_keeps_distance_and_target() {
        let mut camera = Camera::default();
        let mut trackball = Trackball::new(&camera);
        trackball.view_mode = ViewMode::LookAtFixed;

        trackball.start_tracking(100.0, 100.0);
        // 180 pixels is 90 degrees of longitude
        assert!(trackball.update_tracking(280.0, 100.0, &mut camera));

        assert_eq!(camera.look_at, Vec3::new(0.0, 5.0, 0.0));
        assert!(((camera.eye - camera.look_at).length() - 17.5).abs() < EPS);
        assert!(camera.eye.distance(Vec3::new(-17.5, 5.0, 0.0)) < EPS, "{}", camera.eye);
    }

    #[test]
    fn latitude_is_clamped() {
        let mut camera = Camera::default();
        let mut trackball = Trackball::new(&camera);

        trackball.start_tracking(0.0, 0.0);
        trackball.update_tracking(0.0, 10_000.0, &mut camera);
        assert!((trackball.latitude_degrees() - 89.0).abs() < EPS);
        assert_eq!(camera.up, Vec3::Y);
    }

    #[test]
    fn eye_fixed_moves_target() {
        let mut camera = Camera::default();
        let mut trackball = Trackball::new(&camera);
        trackball.view_mode = ViewMode::EyeFixed;

        trackball.start_tracking(0.0, 0.0);
        trackball.update_tracking(10.0, 0.0, &mut camera);
        assert_eq!(camera.eye, Camera::default().eye);
        assert_ne!(camera.look_at, Camera::default().look_at);
    }

    #[test]
    fn first_motion_only_starts_tracking() {
        let mut camera = Camera::default();
        let mut trackball = Trackball::new(&camera);
        assert!(!trackball.update_tracking(50.0, 50.0, &mut camera));
        assert_eq!(camera, Camera::default());
    }

    #[test]
    fn wheel_zoom() {
        let mut camera = Camera::default();
        let mut trackball = Trackball::new(&camera);

        assert!(trackball.wheel(1.0, &mut camera));
        assert!((camera.eye.z - 17.5 / 1.1).abs() < EPS);
        assert!(trackball.wheel(-1.0, &mut camera));
        assert!((camera.eye.z - 17.5).abs() < EPS);
        assert!(!trackball.wheel(0.0, &mut camera));
    }
}
