//! Process-wide tuning knobs, read from the environment once

use std::sync::OnceLock;

/// Gray level used by the moment engine to force a grid into {0,1}.
/// Fixed, independent of whatever threshold produced an upstream mask.
pub const MOMENT_BINARIZE_THRESHOLD: u8 = 128;

const DEFAULT_PARALLEL_MIN_PIXELS: usize = 1 << 20;
const DEFAULT_SHAPE_TEMPLATE_SIZE: usize = 200;

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

static PARALLEL_MIN_PIXELS: OnceLock<usize> = OnceLock::new();

/// Pixel count at which `measure_both_auto` switches to the rayon path.
pub fn parallel_min_pixels() -> usize {
    *PARALLEL_MIN_PIXELS.get_or_init(|| {
        parse_env_usize("MOMENTS_PARALLEL_MIN_PIXELS", DEFAULT_PARALLEL_MIN_PIXELS).max(1)
    })
}

static SHAPE_TEMPLATE_SIZE: OnceLock<usize> = OnceLock::new();

/// Canvas side length of the reference shape templates.
pub fn shape_template_size() -> usize {
    *SHAPE_TEMPLATE_SIZE.get_or_init(|| {
        parse_env_usize("MOMENTS_SHAPE_TEMPLATE_SIZE", DEFAULT_SHAPE_TEMPLATE_SIZE).clamp(32, 1024)
    })
}
