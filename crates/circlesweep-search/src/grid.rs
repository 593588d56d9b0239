//! Grid generation: every (Canny, accumulator) combination to evaluate.

use crate::types::{ParameterCombination, SearchError, ThresholdRange};

/// Number of cells in the grid over `canny` and `accumulator`, or
/// `None` if it overflows a `usize`.
#[must_use]
pub fn grid_cells(canny: &ThresholdRange, accumulator: &ThresholdRange) -> Option<usize> {
    canny.checked_len()?.checked_mul(accumulator.checked_len()?)
}

/// Build the ordered Cartesian product of two threshold ranges.
///
/// The outer loop runs over `canny`, the inner loop over
/// `accumulator`. A degenerate range (`start > end`) on either axis
/// yields an empty grid, which is a valid zero-result search.
///
/// # Errors
///
/// Returns [`SearchError::InvalidConfig`] if either step is not a
/// positive finite number, or if the grid is too large to count or
/// allocate.
pub fn build_grid(
    canny: &ThresholdRange,
    accumulator: &ThresholdRange,
) -> Result<Vec<ParameterCombination>, SearchError> {
    for (name, range) in [("canny", canny), ("accumulator", accumulator)] {
        if !(range.step.is_finite() && range.step > 0.0) {
            return Err(SearchError::InvalidConfig(format!(
                "{name} step must be > 0 (got {})",
                range.step
            )));
        }
    }

    let cells = grid_cells(canny, accumulator).ok_or_else(|| {
        SearchError::InvalidConfig(format!(
            "grid too large: {} canny x {} accumulator values overflow",
            canny.len(),
            accumulator.len()
        ))
    })?;
    let mut grid = Vec::new();
    grid.try_reserve_exact(cells).map_err(|_| {
        SearchError::InvalidConfig(format!("grid too large: cannot allocate {cells} combinations"))
    })?;

    let accumulator_values: Vec<f64> = accumulator.values().collect();
    for canny_threshold in canny.values() {
        grid.extend(
            accumulator_values
                .iter()
                .map(|&acc| ParameterCombination::new(canny_threshold, acc)),
        );
    }
    Ok(grid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_canny_major() {
        let grid = build_grid(
            &ThresholdRange::new(90.0, 110.0, 10.0),
            &ThresholdRange::new(40.0, 60.0, 10.0),
        )
        .unwrap();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], ParameterCombination::new(90.0, 40.0));
        assert_eq!(grid[1], ParameterCombination::new(90.0, 50.0));
        assert_eq!(grid[3], ParameterCombination::new(100.0, 40.0));
        assert_eq!(grid[8], ParameterCombination::new(110.0, 60.0));
    }

    #[test]
    fn grid_size_matches_formula() {
        let cases = [
            ((10.0, 100.0, 7.0), (5.0, 50.0, 5.0)),
            ((1.0, 1.0, 1.0), (1.0, 9.0, 2.0)),
            ((50.0, 200.0, 10.0), (20.0, 100.0, 5.0)),
            ((0.5, 2.0, 0.25), (3.0, 4.0, 0.5)),
        ];
        for ((cs, ce, cst), (a_s, ae, ast)) in cases {
            let canny = ThresholdRange::new(cs, ce, cst);
            let acc = ThresholdRange::new(a_s, ae, ast);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let expected = (((ce - cs) / cst).floor() as usize + 1)
                * (((ae - a_s) / ast).floor() as usize + 1);
            assert_eq!(build_grid(&canny, &acc).unwrap().len(), expected);
        }
    }

    #[test]
    fn grid_has_no_duplicates() {
        let grid = build_grid(
            &ThresholdRange::new(10.0, 100.0, 3.0),
            &ThresholdRange::new(5.0, 60.0, 5.0),
        )
        .unwrap();
        for (i, a) in grid.iter().enumerate() {
            assert!(grid[i + 1..].iter().all(|b| a != b), "duplicate {a:?}");
        }
    }

    #[test]
    fn degenerate_axis_gives_empty_grid() {
        let grid = build_grid(
            &ThresholdRange::new(110.0, 90.0, 10.0),
            &ThresholdRange::new(40.0, 60.0, 10.0),
        )
        .unwrap();
        assert!(grid.is_empty());

        let grid = build_grid(
            &ThresholdRange::new(90.0, 110.0, 10.0),
            &ThresholdRange::new(60.0, 40.0, 10.0),
        )
        .unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let ok = ThresholdRange::new(1.0, 5.0, 1.0);
        assert!(build_grid(&ThresholdRange::new(1.0, 5.0, 0.0), &ok).is_err());
        assert!(build_grid(&ok, &ThresholdRange::new(1.0, 5.0, -2.0)).is_err());
    }

    #[test]
    fn overflowing_grid_is_rejected() {
        let huge = ThresholdRange::new(1.0, 1e12, 1.0);
        assert_eq!(grid_cells(&huge, &huge), None);
        let err = build_grid(&huge, &huge).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(ref m) if m.contains("grid too large")));
    }

    #[test]
    fn grid_cells_matches_built_grid() {
        let canny = ThresholdRange::new(90.0, 110.0, 10.0);
        let acc = ThresholdRange::new(40.0, 60.0, 5.0);
        assert_eq!(grid_cells(&canny, &acc), Some(15));
        assert_eq!(build_grid(&canny, &acc).unwrap().len(), 15);
    }
}
