use std::time;

pub fn time(start: time::Instant) -> f32 {
    let elapsed = time::Instant::now() - start;

    elapsed.as_secs() as f32 + elapsed.subsec_nanos() as f32 * 1e-9
}

/// Linear interpolation, `t = 0` yields `from`, `t = 1` yields `to`
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (1.0 - t) * from + t * to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.2, 0.8, 0.0), 0.2);
        assert_eq!(lerp(0.2, 0.8, 1.0), 0.8);
        assert!((lerp(0.2, 0.8, 0.5) - 0.5).abs() < 1e-6);
        assert!((lerp(0.8, 0.2, 0.25) - 0.65).abs() < 1e-6);
    }
}
