//! Output dimension planning.

/// Dimensions for one search scale.
///
/// Both axes are scaled and truncated. When `max_dim` is set and the
/// larger axis exceeds it, the larger axis becomes exactly `max_dim` and
/// the other shrinks by the same factor. Neither axis drops below 1.
pub fn plan_dimensions(width: u32, height: u32, max_dim: Option<u32>, scale: f64) -> (u32, u32) {
    let mut w = (f64::from(width) * scale) as u32;
    let mut h = (f64::from(height) * scale) as u32;

    if let Some(max) = max_dim.filter(|&m| m > 0) {
        if w.max(h) > max {
            if w > h {
                h = (f64::from(h) * f64::from(max) / f64::from(w)) as u32;
                w = max;
            } else {
                w = (f64::from(w) * f64::from(max) / f64::from(h)) as u32;
                h = max;
            }
        }
    }

    (w.max(1), h.max(1))
}
