//
// color.rs
// Nifti-Rtstruct-rs
//
// Resolves ROI display colors: explicit colors pass through, missing ones are derived from a stable
// hash of the label key looked up in a continuous palette.
//
// Thales Matheus Mendonça Santos - November 2025

use std::f64::consts::PI;

use sha2::{Digest, Sha256};

use crate::models::Rgb;

/// Number of discrete palette entries a label key can land on.
pub const PALETTE_SIZE: usize = 256;

/// A continuous color map over `[0, 1]` returning RGB channels in `[0, 1]`.
pub trait Palette {
    fn sample(&self, position: f64) -> [f64; 3];
}

/// The "rainbow" map: purple at 0 through green to red at 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rainbow;

impl Palette for Rainbow {
    fn sample(&self, position: f64) -> [f64; 3] {
        let x = position.clamp(0.0, 1.0);
        [
            (2.0 * x - 0.5).abs().min(1.0),
            (PI * x).sin(),
            (PI * x / 2.0).cos(),
        ]
    }
}

/// Return `explicit` unchanged, or a deterministic color for `key` from `palette`.
pub fn resolve(explicit: Option<Rgb>, key: &str, palette: &dyn Palette) -> Rgb {
    match explicit {
        Some(color) => color,
        None => fallback_color(key, palette),
    }
}

pub fn fallback_color(key: &str, palette: &dyn Palette) -> Rgb {
    let index = palette_index(key);
    let position = index as f64 / (PALETTE_SIZE - 1) as f64;
    palette.sample(position).map(to_channel)
}

/// Palette slot for a label key: the first byte of its SHA-256 digest.
pub fn palette_index(key: &str) -> usize {
    let digest = Sha256::digest(key.as_bytes());
    usize::from(digest[0])
}

fn to_channel(value: f64) -> u8 {
    // Truncation, not rounding.
    (value.clamp(0.0, 1.0) * 255.0) as u8
}
