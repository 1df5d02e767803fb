//! PNG rendering of map and cross-section products.
//!
//! Each product is painted as a heatmap: values are normalized against the
//! field's own min/max and mapped through a named colormap with linear
//! interpolation between evenly spaced stops. NaN cells come out
//! transparent.

use image::{Rgba, RgbaImage};
use tracing::debug;

use field_engine::{CrossSectionProduct, FieldError, MapProduct, ProductRenderer, Result};

// Evenly spaced RGB stops for the colormap names the variable table uses.
// Anything unrecognized falls back to viridis.
const VIRIDIS: &[(u8, u8, u8)] = &[
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];
const COOLWARM: &[(u8, u8, u8)] = &[
    (59, 76, 192),
    (144, 178, 254),
    (221, 221, 221),
    (245, 156, 125),
    (180, 4, 38),
];
const BLUES: &[(u8, u8, u8)] = &[
    (247, 251, 255),
    (198, 219, 239),
    (107, 174, 214),
    (33, 113, 181),
    (8, 48, 107),
];
const BRBG: &[(u8, u8, u8)] = &[
    (84, 48, 5),
    (191, 129, 45),
    (245, 245, 245),
    (53, 151, 143),
    (0, 60, 48),
];
const RDBU_R: &[(u8, u8, u8)] = &[
    (5, 48, 97),
    (103, 169, 207),
    (247, 247, 247),
    (239, 138, 98),
    (103, 0, 31),
];
const BWR: &[(u8, u8, u8)] = &[
    (0, 0, 255),
    (128, 128, 255),
    (255, 255, 255),
    (255, 128, 128),
    (255, 0, 0),
];
const YLGNBU: &[(u8, u8, u8)] = &[
    (255, 255, 217),
    (199, 233, 180),
    (65, 182, 196),
    (34, 94, 168),
    (8, 29, 88),
];

fn colormap_stops(name: &str) -> &'static [(u8, u8, u8)] {
    match name {
        "viridis" => VIRIDIS,
        "coolwarm" => COOLWARM,
        "Blues" => BLUES,
        "BrBG" => BRBG,
        "RdBu_r" => RDBU_R,
        "bwr" => BWR,
        "YlGnBu" => YLGNBU,
        _ => VIRIDIS,
    }
}

/// Map a normalized value in [0, 1] through evenly spaced stops.
fn interpolate(stops: &[(u8, u8, u8)], normalized: f32) -> (u8, u8, u8) {
    let t = normalized.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
    let low = t.floor() as usize;
    let high = (low + 1).min(stops.len() - 1);
    let frac = t - low as f32;

    let (r1, g1, b1) = stops[low];
    let (r2, g2, b2) = stops[high];
    (
        (r1 as f32 * (1.0 - frac) + r2 as f32 * frac) as u8,
        (g1 as f32 * (1.0 - frac) + g2 as f32 * frac) as u8,
        (b1 as f32 * (1.0 - frac) + b2 as f32 * frac) as u8,
    )
}

/// NaN-aware data range. Returns `None` when every value is NaN.
fn value_range(values: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    let mut range: Option<(f32, f32)> = None;
    for value in values.filter(|v| !v.is_nan()) {
        range = Some(match range {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }
    range
}

fn paint(
    values: impl Iterator<Item = f32> + Clone,
    width: u32,
    height: u32,
    stops: &[(u8, u8, u8)],
) -> RgbaImage {
    let (min_val, max_val) = value_range(values.clone()).unwrap_or((0.0, 0.0));
    let range = max_val - min_val;

    let mut img = RgbaImage::new(width, height);
    for (idx, value) in values.enumerate() {
        let x = idx as u32 % width;
        let y = idx as u32 / width;
        if y >= height {
            break;
        }
        let pixel = if value.is_nan() {
            Rgba([0, 0, 0, 0])
        } else {
            // A flat field paints as the colormap midpoint.
            let normalized = if range.abs() < 1e-6 {
                0.5
            } else {
                (value - min_val) / range
            };
            let (r, g, b) = interpolate(stops, normalized);
            Rgba([r, g, b, 255])
        };
        img.put_pixel(x, y, pixel);
    }
    img
}

/// Renders products to PNG files, one pixel per grid cell.
pub struct PngRenderer;

impl PngRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ProductRenderer for PngRenderer {
    fn render_map(&self, product: &MapProduct<'_>) -> Result<()> {
        let nx = product.values.nx();
        let ny = product.values.ny();
        if product.lons.len() != nx || product.lats.len() != ny {
            return Err(FieldError::Render(format!(
                "axes ({}x{}) do not match grid ({}x{})",
                product.lons.len(),
                product.lats.len(),
                nx,
                ny
            )));
        }

        let img = paint(
            product.values.values().iter().copied(),
            nx as u32,
            ny as u32,
            colormap_stops(product.colormap),
        );
        img.save(&product.output_path)
            .map_err(|e| FieldError::Render(format!("{}: {}", product.output_path.display(), e)))?;

        debug!(
            title = %product.title,
            label = %product.colorbar_label,
            path = %product.output_path.display(),
            "rendered map"
        );
        Ok(())
    }

    fn render_cross_section(&self, product: &CrossSectionProduct<'_>) -> Result<()> {
        let series = product.series;
        let width = series.lats.len();
        let height = series.entries.len();
        if width == 0 || height == 0 {
            return Err(FieldError::Render("empty cross-section".to_string()));
        }
        for (level, means) in &series.entries {
            if means.len() != width {
                return Err(FieldError::Render(format!(
                    "level {} has {} means for {} latitudes",
                    level,
                    means.len(),
                    width
                )));
            }
        }

        // Entries ascend by level, so the top row is the lowest pressure.
        let values = series.entries.iter().flat_map(|(_, means)| means.iter().copied());
        let img = paint(
            values,
            width as u32,
            height as u32,
            colormap_stops(product.colormap),
        );
        img.save(&product.output_path)
            .map_err(|e| FieldError::Render(format!("{}: {}", product.output_path.display(), e)))?;

        debug!(
            title = %product.title,
            label = %product.colorbar_label,
            path = %product.output_path.display(),
            "rendered cross-section"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_engine::{FieldGrid, ZonalMeanSeries};
    use std::path::PathBuf;

    fn map_product(path: PathBuf, values: FieldGrid, lats: &[f64]) -> MapProduct<'_> {
        MapProduct {
            values,
            lats,
            lons: vec![0.0, 120.0, 240.0],
            title: "Temperature at 500 hPa".to_string(),
            colormap: "coolwarm",
            colorbar_label: "Temperature (°C)".to_string(),
            output_path: path,
        }
    }

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        assert_eq!(interpolate(VIRIDIS, 0.0), VIRIDIS[0]);
        assert_eq!(interpolate(VIRIDIS, 1.0), VIRIDIS[4]);
        assert_eq!(interpolate(VIRIDIS, 0.5), VIRIDIS[2]);
        // Out-of-range values clamp to the ends.
        assert_eq!(interpolate(VIRIDIS, -1.0), VIRIDIS[0]);
        assert_eq!(interpolate(VIRIDIS, 2.0), VIRIDIS[4]);
    }

    #[test]
    fn test_value_range_ignores_nan() {
        let values = [f32::NAN, 3.0, -1.0, f32::NAN, 2.0];
        assert_eq!(value_range(values.iter().copied()), Some((-1.0, 3.0)));
        assert_eq!(value_range([f32::NAN].iter().copied()), None);
        assert_eq!(value_range(std::iter::empty()), None);
    }

    #[test]
    fn test_nan_cells_are_transparent() {
        let img = paint([1.0, f32::NAN, 2.0, 3.0].into_iter(), 2, 2, VIRIDIS);
        assert_eq!(img.get_pixel(1, 0).0[3], 0);
        assert_eq!(img.get_pixel(0, 0).0[3], 255);
    }

    #[test]
    fn test_render_map_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temperature_500hPa_f000.png");
        let grid = FieldGrid::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let lats = [45.0, -45.0];

        let renderer = PngRenderer::new();
        renderer.render_map(&map_product(path.clone(), grid, &lats)).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_render_map_rejects_mismatched_axes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let grid = FieldGrid::new(2, 3, vec![1.0; 6]).unwrap();
        let lats = [45.0]; // grid has 2 rows

        let renderer = PngRenderer::new();
        let result = renderer.render_map(&map_product(path, grid, &lats));
        assert!(matches!(result, Err(FieldError::Render(_))));
    }

    #[test]
    fn test_render_cross_section_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zonal_mean_u_f000.png");
        let series = ZonalMeanSeries {
            lats: vec![45.0, 0.0, -45.0],
            entries: vec![(250, vec![30.0, 10.0, 25.0]), (850, vec![5.0, 2.0, 8.0])],
        };

        let renderer = PngRenderer::new();
        let product = CrossSectionProduct {
            series: &series,
            title: "Zonal Mean U component of wind".to_string(),
            colormap: "RdBu_r",
            colorbar_label: "U component of wind (m/s)".to_string(),
            output_path: path.clone(),
        };
        renderer.render_cross_section(&product).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_render_cross_section_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let series = ZonalMeanSeries {
            lats: vec![45.0, -45.0],
            entries: vec![(500, vec![1.0])],
        };

        let renderer = PngRenderer::new();
        let product = CrossSectionProduct {
            series: &series,
            title: "Zonal Mean U component of wind".to_string(),
            colormap: "RdBu_r",
            colorbar_label: "U component of wind (m/s)".to_string(),
            output_path: dir.path().join("out.png"),
        };
        let result = renderer.render_cross_section(&product);
        assert!(matches!(result, Err(FieldError::Render(_))));
    }
}
