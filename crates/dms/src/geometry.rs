//! Scalar signals derived from landmark geometry

use crate::landmarks::{LandmarkSet, Point, EYE_POINTS, MOUTH_LOWER_INNER, MOUTH_POINTS, MOUTH_UPPER_INNER};

/// Eye aspect ratio of a single eye.
///
/// Sum of the two vertical eyelid distances (p2-p6, p3-p5) over twice the
/// horizontal eye width (p1-p4). A zero-width eye reads as fully closed.
pub fn eye_aspect_ratio(eye: &[Point; EYE_POINTS]) -> f64 {
    let vertical_a = eye[1].distance(&eye[5]);
    let vertical_b = eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);

    if horizontal == 0.0 {
        return 0.0;
    }

    (vertical_a + vertical_b) / (2.0 * horizontal)
}

/// Mean EAR over both eyes
pub fn frame_ear(landmarks: &LandmarkSet) -> f64 {
    let left = eye_aspect_ratio(landmarks.left_eye());
    let right = eye_aspect_ratio(landmarks.right_eye());
    (left + right) / 2.0
}

/// Vertical distance between the inner lip centres (pixels, not normalised)
pub fn mouth_opening_distance(mouth: &[Point; MOUTH_POINTS]) -> f64 {
    (mouth[MOUTH_UPPER_INNER].y - mouth[MOUTH_LOWER_INNER].y).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye(height: f64, width: f64) -> [Point; EYE_POINTS] {
        [
            Point::new(0.0, 0.0),
            Point::new(width / 3.0, -height / 2.0),
            Point::new(2.0 * width / 3.0, -height / 2.0),
            Point::new(width, 0.0),
            Point::new(2.0 * width / 3.0, height / 2.0),
            Point::new(width / 3.0, height / 2.0),
        ]
    }

    #[test]
    fn test_open_eye_ratio() {
        // (6 + 6) / (2 * 20)
        let ratio = eye_aspect_ratio(&eye(6.0, 20.0));
        assert!((ratio - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_closed_eye_ratio() {
        assert_eq!(eye_aspect_ratio(&eye(0.0, 20.0)), 0.0);
    }

    #[test]
    fn test_zero_width_is_closed() {
        let degenerate = [Point::new(5.0, 5.0); EYE_POINTS];
        assert_eq!(eye_aspect_ratio(&degenerate), 0.0);
    }

    #[test]
    fn test_frame_ear_averages_eyes() {
        let left = eye(6.0, 20.0);
        let right = eye(2.0, 20.0);
        let mouth = [Point::default(); MOUTH_POINTS];
        let set = LandmarkSet::new(&left, &right, &mouth).unwrap();
        assert!((frame_ear(&set) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_mouth_distance_is_absolute() {
        let mut mouth = [Point::default(); MOUTH_POINTS];
        mouth[MOUTH_UPPER_INNER] = Point::new(50.0, 140.0);
        mouth[MOUTH_LOWER_INNER] = Point::new(50.0, 105.0);
        assert_eq!(mouth_opening_distance(&mouth), 35.0);

        mouth.swap(MOUTH_UPPER_INNER, MOUTH_LOWER_INNER);
        assert_eq!(mouth_opening_distance(&mouth), 35.0);
    }
}
