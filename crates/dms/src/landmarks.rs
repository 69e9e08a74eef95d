//! Facial landmark input
//!
//! Landmarks come from an external provider once per frame. The set is
//! validated on construction so the geometry code downstream is total.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Points per eye (eyelid order, outer corner first)
pub const EYE_POINTS: usize = 6;

/// Points in the mouth outline (outer lip then inner lip)
pub const MOUTH_POINTS: usize = 20;

/// Mouth-local index of the upper inner lip centre
pub const MOUTH_UPPER_INNER: usize = 14;

/// Mouth-local index of the lower inner lip centre
pub const MOUTH_LOWER_INNER: usize = 18;

/// Size of the full 68-point facial layout
pub const FACE_68_POINTS: usize = 68;

const FACE_68_RIGHT_EYE: Range<usize> = 36..42;
const FACE_68_LEFT_EYE: Range<usize> = 42..48;
const FACE_68_MOUTH: Range<usize> = 48..68;

/// 2D image point (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Validated eye and mouth landmarks for a single face in a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLandmarks", into = "RawLandmarks")]
pub struct LandmarkSet {
    left_eye: [Point; EYE_POINTS],
    right_eye: [Point; EYE_POINTS],
    mouth: [Point; MOUTH_POINTS],
}

impl LandmarkSet {
    /// Build from per-region point lists
    pub fn new(left_eye: &[Point], right_eye: &[Point], mouth: &[Point]) -> Result<Self, DmsError> {
        Ok(Self {
            left_eye: region("left_eye", left_eye)?,
            right_eye: region("right_eye", right_eye)?,
            mouth: region("mouth", mouth)?,
        })
    }

    /// Build from the full 68-point facial layout
    pub fn from_face_68(points: &[Point]) -> Result<Self, DmsError> {
        if points.len() != FACE_68_POINTS {
            return Err(DmsError::InvalidLandmarkSet {
                region: "face",
                reason: format!("expected {} points, got {}", FACE_68_POINTS, points.len()),
            });
        }

        Self::new(
            &points[FACE_68_LEFT_EYE],
            &points[FACE_68_RIGHT_EYE],
            &points[FACE_68_MOUTH],
        )
    }

    pub fn left_eye(&self) -> &[Point; EYE_POINTS] {
        &self.left_eye
    }

    pub fn right_eye(&self) -> &[Point; EYE_POINTS] {
        &self.right_eye
    }

    pub fn mouth(&self) -> &[Point; MOUTH_POINTS] {
        &self.mouth
    }
}

fn region<const N: usize>(name: &'static str, points: &[Point]) -> Result<[Point; N], DmsError> {
    let fixed: [Point; N] = points.try_into().map_err(|_| DmsError::InvalidLandmarkSet {
        region: name,
        reason: format!("expected {} points, got {}", N, points.len()),
    })?;

    if let Some(idx) = fixed.iter().position(|p| !p.is_finite()) {
        return Err(DmsError::InvalidLandmarkSet {
            region: name,
            reason: format!("non-finite coordinate at point {}", idx),
        });
    }

    Ok(fixed)
}

/// Wire form of a landmark set, validated into [`LandmarkSet`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLandmarks {
    left_eye: Vec<Point>,
    right_eye: Vec<Point>,
    mouth: Vec<Point>,
}

impl TryFrom<RawLandmarks> for LandmarkSet {
    type Error = DmsError;

    fn try_from(raw: RawLandmarks) -> Result<Self, Self::Error> {
        Self::new(&raw.left_eye, &raw.right_eye, &raw.mouth)
    }
}

impl From<LandmarkSet> for RawLandmarks {
    fn from(set: LandmarkSet) -> Self {
        Self {
            left_eye: set.left_eye.to_vec(),
            right_eye: set.right_eye.to_vec(),
            mouth: set.mouth.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f64, i as f64 * 2.0)).collect()
    }

    #[test]
    fn test_valid_set() {
        let set = LandmarkSet::new(&points(6), &points(6), &points(20)).unwrap();
        assert_eq!(set.mouth()[MOUTH_UPPER_INNER], Point::new(14.0, 28.0));
    }

    #[test]
    fn test_wrong_cardinality() {
        let err = LandmarkSet::new(&points(5), &points(6), &points(20)).unwrap_err();
        match err {
            DmsError::InvalidLandmarkSet { region, .. } => assert_eq!(region, "left_eye"),
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(LandmarkSet::new(&points(6), &points(6), &points(21)).is_err());
    }

    #[test]
    fn test_non_finite_coordinate() {
        let mut mouth = points(20);
        mouth[3].y = f64::NAN;
        let err = LandmarkSet::new(&points(6), &points(6), &mouth).unwrap_err();
        assert!(matches!(err, DmsError::InvalidLandmarkSet { region: "mouth", .. }));
    }

    #[test]
    fn test_face_68_layout() {
        let face = points(68);
        let set = LandmarkSet::from_face_68(&face).unwrap();
        assert_eq!(set.right_eye()[0], face[36]);
        assert_eq!(set.left_eye()[0], face[42]);
        assert_eq!(set.mouth()[MOUTH_UPPER_INNER], face[62]);
        assert_eq!(set.mouth()[MOUTH_LOWER_INNER], face[66]);

        assert!(LandmarkSet::from_face_68(&points(67)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let good = serde_json::json!({
            "left_eye": points(6),
            "right_eye": points(6),
            "mouth": points(20),
        });
        assert!(serde_json::from_value::<LandmarkSet>(good).is_ok());

        let bad = serde_json::json!({
            "left_eye": points(6),
            "right_eye": points(2),
            "mouth": points(20),
        });
        assert!(serde_json::from_value::<LandmarkSet>(bad).is_err());
    }
}
