//! Comparison chart rendering
//!
//! Draws both frequency profiles, restricted to the shared zoom window,
//! onto an RGBA image and writes it as PNG to a well-known path for the
//! presentation layer. Reference is a solid blue line, test a dashed red
//! one; the y-axis is scaled to 110% of the larger peak inside the window
//! so neither curve touches the top edge.

use std::path::Path;

use image::{Rgba, RgbaImage};
use log::debug;

use crate::error::ChartError;
use crate::spectrum::{FrequencyProfile, ZoomWindow};

pub const CHART_WIDTH: u32 = 900;
pub const CHART_HEIGHT: u32 = 500;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GRID: Rgba<u8> = Rgba([225, 225, 225, 255]);
const REFERENCE_COLOR: Rgba<u8> = Rgba([40, 80, 220, 255]);
const TEST_COLOR: Rgba<u8> = Rgba([220, 50, 50, 255]);

/// Length in pixels of the on/off segments of the dashed test line
const DASH_PERIOD: u32 = 6;

/// Vertical headroom above the tallest peak in the window
const HEADROOM: f32 = 1.1;

/// Render both profiles inside `zoom` and write a PNG to `path`.
pub fn render_comparison(
    reference: &FrequencyProfile,
    test: &FrequencyProfile,
    zoom: ZoomWindow,
    path: &Path,
) -> Result<(), ChartError> {
    let mut img = RgbaImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
    draw_grid(&mut img);

    let peak = peak_in_window(reference, zoom).max(peak_in_window(test, zoom));
    // Both profiles may be flat inside the window; keep the scale sane.
    let y_max = if peak > 0.0 { peak * HEADROOM } else { 1.0 };

    draw_profile(&mut img, reference, zoom, y_max, REFERENCE_COLOR, false);
    draw_profile(&mut img, test, zoom, y_max, TEST_COLOR, true);

    debug!("Writing comparison chart to {}", path.display());
    img.save(path)?;
    Ok(())
}

fn draw_grid(img: &mut RgbaImage) {
    for i in 1..10 {
        let x = i * CHART_WIDTH / 10;
        let y = i * CHART_HEIGHT / 10;
        for row in 0..CHART_HEIGHT {
            img.put_pixel(x, row, GRID);
        }
        for col in 0..CHART_WIDTH {
            img.put_pixel(col, y, GRID);
        }
    }
}

/// Largest normalized power of any bin falling inside the window
fn peak_in_window(profile: &FrequencyProfile, zoom: ZoomWindow) -> f32 {
    profile
        .frequencies()
        .iter()
        .zip(profile.power())
        .filter(|(&f, _)| zoom.contains(f))
        .map(|(_, &p)| p)
        .fold(0.0f32, f32::max)
}

fn draw_profile(
    img: &mut RgbaImage,
    profile: &FrequencyProfile,
    zoom: ZoomWindow,
    y_max: f32,
    color: Rgba<u8>,
    dashed: bool,
) {
    if zoom.span() <= 0.0 {
        return;
    }

    let to_y = |power: f32| -> u32 {
        let normalized = (power / y_max).clamp(0.0, 1.0);
        let y = (normalized * (CHART_HEIGHT - 1) as f32).round() as u32;
        CHART_HEIGHT - 1 - y
    };

    let mut previous_y: Option<u32> = None;
    for x in 0..CHART_WIDTH {
        if dashed && (x / DASH_PERIOD) % 2 == 1 {
            previous_y = None;
            continue;
        }

        let hz = zoom.min_hz + zoom.span() * x as f32 / (CHART_WIDTH - 1) as f32;
        let y = to_y(power_at(profile, hz));

        // Connect to the previous column so steep slopes stay continuous
        let (top, bottom) = match previous_y {
            Some(prev) => (y.min(prev), y.max(prev)),
            None => (y, y),
        };
        for row in top..=bottom {
            img.put_pixel(x, row, color);
        }
        previous_y = Some(y);
    }
}

/// Linearly interpolated power at an arbitrary frequency.
///
/// Frequencies outside the profile's range take the edge bin's value.
fn power_at(profile: &FrequencyProfile, hz: f32) -> f32 {
    let frequencies = profile.frequencies();
    let power = profile.power();
    if frequencies.is_empty() {
        return 0.0;
    }

    let upper = frequencies.partition_point(|&f| f < hz);
    if upper == 0 {
        return power[0];
    }
    if upper >= frequencies.len() {
        return power[frequencies.len() - 1];
    }

    let lower = upper - 1;
    let segment = frequencies[upper] - frequencies[lower];
    if segment <= 0.0 {
        return power[lower];
    }
    let frac = (hz - frequencies[lower]) / segment;
    power[lower] * (1.0 - frac) + power[upper] * frac
}
