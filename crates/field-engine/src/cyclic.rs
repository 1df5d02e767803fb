//! Wrap-around longitude column for globally periodic grids.

use crate::error::{FieldError, Result};
use crate::record::FieldGrid;

/// Full wrap span of a global longitude axis, in degrees.
pub const WRAP_SPAN_DEGREES: f64 = 360.0;

/// Append a wrap-around duplicate of the first longitude column.
///
/// The extended data gains one column equal to the first column, and the
/// longitude axis gains one trailing element equal to the first longitude
/// plus the full wrap span, so contour rendering has no seam at the date
/// line. Output longitude length is always input length + 1.
///
/// This step is opt-in per caller: it is only correct for global,
/// longitude-periodic grids and must be skipped for regional ones.
pub fn add_cyclic_point(values: &FieldGrid, lons: &[f64]) -> Result<(FieldGrid, Vec<f64>)> {
    if lons.is_empty() || values.nx() == 0 {
        return Err(FieldError::MalformedGrid(
            "cannot extend an empty longitude axis".to_string(),
        ));
    }
    if lons.len() != values.nx() {
        return Err(FieldError::MalformedGrid(format!(
            "longitude axis has {} points but grid rows have {}",
            lons.len(),
            values.nx()
        )));
    }

    let extended = values.with_cyclic_column();
    let mut extended_lons = lons.to_vec();
    extended_lons.push(lons[0] + WRAP_SPAN_DEGREES);
    Ok((extended, extended_lons))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_lengths_and_values() {
        let values = FieldGrid::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let lons = vec![0.0, 120.0, 240.0];

        let (extended, extended_lons) = add_cyclic_point(&values, &lons).unwrap();

        assert_eq!(extended_lons.len(), lons.len() + 1);
        assert_eq!(*extended_lons.last().unwrap(), 360.0);
        assert_eq!(extended.nx(), 4);
        assert_eq!(extended.ny(), 2);
        // Appended column equals the first column exactly.
        assert_eq!(extended.row(0), &[1.0, 2.0, 3.0, 1.0]);
        assert_eq!(extended.row(1), &[4.0, 5.0, 6.0, 4.0]);
    }

    #[test]
    fn test_extend_nonzero_first_longitude() {
        let values = FieldGrid::new(1, 2, vec![7.0, 8.0]).unwrap();
        let lons = vec![-180.0, 0.0];
        let (_, extended_lons) = add_cyclic_point(&values, &lons).unwrap();
        assert_eq!(*extended_lons.last().unwrap(), 180.0);
    }

    #[test]
    fn test_extend_rejects_axis_mismatch() {
        let values = FieldGrid::new(1, 3, vec![1.0, 2.0, 3.0]).unwrap();
        let lons = vec![0.0, 180.0];
        let result = add_cyclic_point(&values, &lons);
        assert!(matches!(result, Err(FieldError::MalformedGrid(_))));
    }

    #[test]
    fn test_extend_rejects_empty_axis() {
        let values = FieldGrid::new(0, 0, vec![]).unwrap();
        let result = add_cyclic_point(&values, &[]);
        assert!(matches!(result, Err(FieldError::MalformedGrid(_))));
    }
}
