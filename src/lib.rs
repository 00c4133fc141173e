pub mod adjust;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod devices;
pub mod engine;
pub mod grab;
pub mod input;
pub mod profile;
pub mod status;
pub mod surface;

pub use engine::Engine;

/// Wraps an angle into `[-180, 180)` degrees.
pub(crate) fn wrap_degrees(degrees: f32) -> f32 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}
