//! Weather comfort index
//!
//! Maps temperature, humidity and pressure onto a 0-100 score. Each variable
//! is banded independently and contributes an additive adjustment to a base
//! of 70. Every weather source and the risk analyzer share this banding.

const BASE: i32 = 70;

fn temperature_adjustment(temperature: f64) -> i32 {
    if (15.0..=25.0).contains(&temperature) {
        10
    } else if (10.0..15.0).contains(&temperature) || (temperature > 25.0 && temperature <= 30.0) {
        5
    } else if temperature < 5.0 || temperature > 30.0 {
        -20
    } else {
        -10
    }
}

fn humidity_adjustment(humidity: f64) -> i32 {
    if (40.0..=60.0).contains(&humidity) {
        10
    } else if (30.0..40.0).contains(&humidity) || (humidity > 60.0 && humidity <= 70.0) {
        5
    } else if humidity < 30.0 || humidity > 80.0 {
        -15
    } else {
        -10
    }
}

fn pressure_adjustment(pressure: f64) -> i32 {
    if (1000.0..=1025.0).contains(&pressure) {
        10
    } else {
        -10
    }
}

/// Compute the comfort index, clamped to [0, 100].
pub fn compute(temperature: f64, humidity: f64, pressure: f64) -> i32 {
    let score = BASE
        + temperature_adjustment(temperature)
        + humidity_adjustment(humidity)
        + pressure_adjustment(pressure);
    score.clamp(0, 100)
}
