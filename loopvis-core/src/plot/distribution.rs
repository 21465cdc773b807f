//! Frequency distributions
//!
//! Monotonic curves mapping `[0, 1]` onto `[0, 1]`.  They decide how the frequency axis
//! is spread over the bars: an ease-out curve gives the low end more bars than the
//! high end.
use std::f32::consts::PI;

pub fn linear(x: f32) -> f32 {
    x
}

pub fn ease_in_circ(x: f32) -> f32 {
    1.0 - (1.0 - x.powi(2)).max(0.0).sqrt()
}

pub fn ease_out_circ(x: f32) -> f32 {
    (1.0 - (x - 1.0).powi(2)).max(0.0).sqrt()
}

pub fn ease_in_exp(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else {
        2.0f32.powf(10.0 * x - 10.0)
    }
}

pub fn ease_out_exp(x: f32) -> f32 {
    if x >= 1.0 {
        1.0
    } else {
        1.0 - 2.0f32.powf(-10.0 * x)
    }
}

pub fn ease_in_sine(x: f32) -> f32 {
    1.0 - (x * PI / 2.0).cos()
}

pub fn ease_out_sine(x: f32) -> f32 {
    (x * PI / 2.0).sin()
}

/// Get the distribution for the specified name
pub fn from_str(name: &str) -> Option<fn(f32) -> f32> {
    match name {
        "linear" => Some(linear),
        "ease_in_circ" => Some(ease_in_circ),
        "ease_out_circ" => Some(ease_out_circ),
        "ease_in_exp" => Some(ease_in_exp),
        "ease_out_exp" => Some(ease_out_exp),
        "ease_in_sine" => Some(ease_in_sine),
        "ease_out_sine" => Some(ease_out_sine),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: &[&str] = &[
        "linear",
        "ease_in_circ",
        "ease_out_circ",
        "ease_in_exp",
        "ease_out_exp",
        "ease_in_sine",
        "ease_out_sine",
    ];

    #[test]
    fn test_monotonic() {
        for name in NAMES {
            let f = from_str(name).unwrap();

            let mut last = f(0.0);
            for i in 1..=1000 {
                let y = f(i as f32 / 1000.0);
                assert!(y >= last - 1e-6, "{} not monotonic at {}", name, i);
                assert!(y >= 0.0 && y <= 1.0 + 1e-6, "{} out of range at {}", name, i);
                last = y;
            }
        }
    }

    #[test]
    fn test_endpoints() {
        for name in NAMES {
            let f = from_str(name).unwrap();

            assert!(f(0.0).abs() < 1e-3, "{}(0) = {}", name, f(0.0));
            assert!((f(1.0) - 1.0).abs() < 1e-6, "{}(1) = {}", name, f(1.0));
        }

        assert!(from_str("ease_in_out_bounce").is_none());
    }
}
