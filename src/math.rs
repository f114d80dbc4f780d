//! Mathematical functions used to shape speed profiles.

/// The default horizontal scale of a sigmoid, in m (or s).
pub const SIGMOID_SCALE: f64 = 50.0;

/// The smallest effective delay of a pulse, in m (or s).
const MIN_PULSE_DELAY: f64 = 250.0;

/// The smallest effective duration of a pulse, in m (or s).
const MIN_PULSE_DURATION: f64 = 1000.0;

/// The portion of a pulse's duration spent on its two ramps, in m (or s).
const PULSE_RAMPS: f64 = 500.0;

/// A logistic function rising from 0 to `amplitude`.
///
/// # Parameters
/// * `x` - The point at which to evaluate the function
/// * `amplitude` - The value approached as `x` tends to infinity
/// * `scale` - Controls the width of the transition
/// * `delay` - The midpoint of the transition
pub fn sigmoid(x: f64, amplitude: f64, scale: f64, delay: f64) -> f64 {
    amplitude / (1.0 + (-(x - delay) / scale).exp())
}

/// A smooth pulse of height `amplitude`, formed as the difference of two sigmoids.
///
/// The delay is raised to at least 250 and the duration to at least 1000;
/// the duration includes both ramps.
pub fn pulse(x: f64, amplitude: f64, delay: f64, duration: f64) -> f64 {
    let delay = f64::max(delay, MIN_PULSE_DELAY);
    let duration = f64::max(duration, MIN_PULSE_DURATION);
    let plateau = PULSE_RAMPS + duration - MIN_PULSE_DURATION;
    sigmoid(x, amplitude, SIGMOID_SCALE, delay)
        - sigmoid(x, amplitude, SIGMOID_SCALE, delay + plateau)
}
