use serde::{Deserialize, Serialize};

/// Weakest RSSI (dBm) mapped to 0% signal strength.
pub const RSSI_MIN: f64 = -95.0;
/// Strongest RSSI (dBm) mapped to 100% signal strength.
pub const RSSI_MAX: f64 = -40.0;

/// Unit rotation quaternion `(x, y, z, w)`, as sent by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Conjugate divided by the norm.
    ///
    /// A zero quaternion yields NaN components; this is not guarded.
    pub fn invert(&self) -> Quaternion {
        let len = self.norm();
        Quaternion {
            x: -self.x / len,
            y: -self.y / len,
            z: -self.z / len,
            w: self.w / len,
        }
    }

    /// Hamilton product `self * r`. Not commutative.
    ///
    /// With `self` a calibration offset and `r` a raw sample, this applies the offset.
    pub fn rotate(&self, r: &Quaternion) -> Quaternion {
        let Quaternion { x, y, z, w } = *self;
        Quaternion {
            w: w * r.w - x * r.x - y * r.y - z * r.z,
            x: w * r.x + x * r.w + y * r.z - z * r.y,
            y: w * r.y - x * r.z + y * r.w + z * r.x,
            z: w * r.z + x * r.y - y * r.x + z * r.w,
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Raw 3-axis sample (accelerometer in g, gyroscope in deg/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_triplet(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

/// One orientation sample after calibration, bundled with its raw IMU vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImuData {
    pub orientation: Quaternion,
    pub accelerometer: Vector3,
    pub gyroscope: Vector3,
}

/// Map an RSSI reading (dBm) to a 0..100 signal strength, rounded to 2 decimals.
///
/// Readings outside `[RSSI_MIN, RSSI_MAX]` are clamped first.
pub fn map_signal_strength(rssi: f64) -> f64 {
    let clamped = rssi.clamp(RSSI_MIN, RSSI_MAX);
    let percent = (clamped - RSSI_MIN) * 100.0 / (RSSI_MAX - RSSI_MIN);
    (percent * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_quat_eq(a: &Quaternion, b: &Quaternion) {
        assert!((a.x - b.x).abs() < 1e-9, "x: {} vs {}", a.x, b.x);
        assert!((a.y - b.y).abs() < 1e-9, "y: {} vs {}", a.y, b.y);
        assert!((a.z - b.z).abs() < 1e-9, "z: {} vs {}", a.z, b.z);
        assert!((a.w - b.w).abs() < 1e-9, "w: {} vs {}", a.w, b.w);
    }

    #[test]
    fn test_rotate_by_inverse_is_identity() {
        let samples = [
            Quaternion::new(0.050, 0.097, -0.041, -0.994),
            Quaternion::new(0.5, 0.5, 0.5, 0.5),
            Quaternion::new(0.0, 0.7071067811865476, 0.0, 0.7071067811865476),
            Quaternion::IDENTITY,
        ];
        for q in &samples {
            let q = Quaternion::new(q.x / q.norm(), q.y / q.norm(), q.z / q.norm(), q.w / q.norm());
            assert_quat_eq(&q.rotate(&q.invert()), &Quaternion::IDENTITY);
            assert_quat_eq(&q.invert().rotate(&q), &Quaternion::IDENTITY);
        }
    }

    #[test]
    fn test_invert_normalizes() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 2.0);
        assert_quat_eq(&q.invert(), &Quaternion::IDENTITY);
    }

    #[test]
    fn test_invert_zero_is_nan() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).invert();
        assert!(q.w.is_nan());
        assert!(q.x.is_nan());
    }

    #[test]
    fn test_rotate_is_not_commutative() {
        let a = Quaternion::new(0.7071067811865476, 0.0, 0.0, 0.7071067811865476);
        let b = Quaternion::new(0.0, 0.7071067811865476, 0.0, 0.7071067811865476);
        let ab = a.rotate(&b);
        let ba = b.rotate(&a);
        assert!((ab.z - ba.z).abs() > 0.1);
    }

    #[test]
    fn test_vector_from_triplet() {
        let v = Vector3::from_triplet([1.0, -2.0, 3.5]);
        assert_eq!(v, Vector3::new(1.0, -2.0, 3.5));
    }

    #[test]
    fn test_signal_strength_bounds() {
        assert_eq!(map_signal_strength(-95.0), 0.0);
        assert_eq!(map_signal_strength(-40.0), 100.0);
        assert_eq!(map_signal_strength(-200.0), 0.0);
        assert_eq!(map_signal_strength(0.0), 100.0);
    }

    #[test]
    fn test_signal_strength_rounds_to_two_decimals() {
        // (-60 + 95) * 100 / 55 = 63.6363...
        assert_eq!(map_signal_strength(-60.0), 63.64);
    }
}
