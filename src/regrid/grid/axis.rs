/*
Copyright 2024 ERA5 Regrid contributors

This file is part of ERA5 Regrid.

ERA5 Regrid is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

ERA5 Regrid is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with ERA5 Regrid. If not, see https://www.gnu.org/licenses/.
*/

//! Sub-module responsible for checking source grid axes
//! and constructing regular target axes.

use super::AxisName;
use crate::{constants::MAX_GRID_POINTS, errors::GridError, Float};
use float_cmp::approx_eq;
use ndarray::{Array1, ArrayView1};
use serde::Deserialize;

/// Policy of constructing the regular target axis
/// from the source axis extent and the grid step.
///
/// The two policies give different grids (and different
/// number of points) for the same step.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridPolicy {
    /// Fixed number of points spanning `[min, max]` with both ends included.
    /// The actual spacing is the closest one to the step which fits
    /// a whole number of cells in the extent.
    Inclusive,

    /// Arithmetic sequence `min, min + step, ...` kept strictly below `max`
    /// (unless the extent is a whole number of steps within rounding, in
    /// which case `max` is not included either).
    Stepped,
}

impl Default for GridPolicy {
    fn default() -> Self {
        GridPolicy::Inclusive
    }
}

impl GridPolicy {
    /// Number of points of the target axis between `min` and `max`.
    ///
    /// Expects `min < max` and positive, finite `step`. A step tiny
    /// compared to the extent gives an axis which could never be
    /// allocated, and it is reported as [`GridError::AxisTooLong`].
    pub fn axis_len(
        self,
        min: Float,
        max: Float,
        step: Float,
        axis: AxisName,
    ) -> Result<usize, GridError> {
        let ratio = (max - min) / step;

        let points = match self {
            GridPolicy::Inclusive => ratio.round().max(1.0) + 1.0,
            GridPolicy::Stepped => {
                let count = if approx_eq!(Float, ratio, ratio.round(), ulps = 4) {
                    ratio.round()
                } else {
                    ratio.ceil()
                };

                count.max(1.0)
            }
        };

        if !points.is_finite() || points > MAX_GRID_POINTS as Float {
            return Err(GridError::AxisTooLong { axis, points });
        }

        Ok(points as usize)
    }

    /// Builds ascending target axis between `min` and `max`
    /// from the length returned by [`GridPolicy::axis_len`].
    pub fn build_axis(self, min: Float, max: Float, step: Float, len: usize) -> Array1<Float> {
        match self {
            GridPolicy::Inclusive => {
                let mut axis = Array1::linspace(min, max, len);

                // linspace can miss the end by rounding
                if len > 0 {
                    axis[len - 1] = max;
                }

                axis
            }
            GridPolicy::Stepped => (0..len)
                .map(|i| min + (i as Float) * step)
                .filter(|v| *v < max)
                .collect(),
        }
    }
}

/// Returns `(min, max)` of a strictly monotonic axis.
pub fn extent(axis: &Array1<Float>) -> (Float, Float) {
    let first = axis[0];
    let last = axis[axis.len() - 1];

    if first < last {
        (first, last)
    } else {
        (last, first)
    }
}

/// Checks whether the axis can be used as an interpolation
/// axis: at least two finite points, strictly ascending
/// or strictly descending.
pub fn check_axis(axis: &Array1<Float>, name: AxisName) -> Result<(), GridError> {
    check_axis_view(axis.view(), name)
}

pub(super) fn check_axis_view(axis: ArrayView1<Float>, name: AxisName) -> Result<(), GridError> {
    if axis.len() < 2 {
        return Err(GridError::TooFewPoints {
            axis: name,
            len: axis.len(),
        });
    }

    if let Some(index) = axis.iter().position(|v| !v.is_finite()) {
        return Err(GridError::NonFinite { axis: name, index });
    }

    let ascending = axis[0] < axis[1];

    for index in 1..axis.len() {
        let (prev, curr) = (axis[index - 1], axis[index]);

        let ordered = if ascending { prev < curr } else { prev > curr };

        if !ordered {
            return Err(GridError::NotMonotonic { axis: name, index });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_axis, extent, GridPolicy};
    use crate::{errors::GridError, regrid::grid::AxisName, Float};
    use float_cmp::approx_eq;
    use ndarray::{array, Array1};

    fn target_axis(policy: GridPolicy, min: Float, max: Float, step: Float) -> Array1<Float> {
        let len = policy
            .axis_len(min, max, step, AxisName::Latitude)
            .unwrap();

        policy.build_axis(min, max, step, len)
    }

    #[test]
    fn inclusive_axis_spans_whole_extent() {
        let axis = target_axis(GridPolicy::Inclusive, 34.0, 42.0, 0.1);

        assert_eq!(axis.len(), 81);
        assert_eq!(axis[0], 34.0);
        assert_eq!(axis[80], 42.0);
        assert!(approx_eq!(Float, axis[10], 35.0, epsilon = 1e-12));
    }

    #[test]
    fn inclusive_axis_with_step_wider_than_extent() {
        let axis = target_axis(GridPolicy::Inclusive, 0.0, 0.25, 1.0);

        assert_eq!(axis, array![0.0, 0.25]);
    }

    #[test]
    fn stepped_axis_follows_arange() {
        let axis = target_axis(GridPolicy::Stepped, 19.0, 28.0, 0.1);

        assert_eq!(axis.len(), 90);
        assert_eq!(axis[0], 19.0);
        assert!(axis.iter().all(|v| *v < 28.0));

        let axis = target_axis(GridPolicy::Stepped, 0.0, 1.0, 0.3);
        assert_eq!(axis.len(), 4);
        assert!(approx_eq!(Float, axis[3], 0.9, epsilon = 1e-12));
    }

    #[test]
    fn stepped_axis_with_step_wider_than_extent() {
        let axis = target_axis(GridPolicy::Stepped, 0.0, 0.25, 1.0);

        assert_eq!(axis, array![0.0]);
    }

    #[test]
    fn tiny_step_gives_too_long_axis() {
        for policy in [GridPolicy::Inclusive, GridPolicy::Stepped] {
            assert!(matches!(
                policy.axis_len(10.0, 12.0, 1e-300, AxisName::Longitude),
                Err(GridError::AxisTooLong {
                    axis: AxisName::Longitude,
                    ..
                })
            ));

            // ratio overflows to infinity
            assert!(matches!(
                policy.axis_len(-90.0, 90.0, 5e-324, AxisName::Latitude),
                Err(GridError::AxisTooLong { .. })
            ));
        }

        assert_eq!(
            GridPolicy::Inclusive.axis_len(10.0, 12.0, 1.0, AxisName::Latitude),
            Ok(3)
        );
    }

    #[test]
    fn policy_deserializes_from_lowercase() {
        let policy: GridPolicy = serde_yaml::from_str("stepped").unwrap();
        assert_eq!(policy, GridPolicy::Stepped);

        assert_eq!(GridPolicy::default(), GridPolicy::Inclusive);
    }

    #[test]
    fn extent_of_descending_axis() {
        assert_eq!(extent(&array![42.0, 38.0, 34.0]), (34.0, 42.0));
        assert_eq!(extent(&array![19.0, 28.0]), (19.0, 28.0));
    }

    #[test]
    fn axis_checks() {
        assert!(check_axis(&array![1.0, 2.0, 3.0], AxisName::Latitude).is_ok());
        assert!(check_axis(&array![3.0, 2.0, 1.0], AxisName::Latitude).is_ok());

        assert_eq!(
            check_axis(&array![1.0, 3.0, 2.0], AxisName::Latitude),
            Err(GridError::NotMonotonic {
                axis: AxisName::Latitude,
                index: 2
            })
        );
        assert_eq!(
            check_axis(&array![1.0, Float::NAN], AxisName::Longitude),
            Err(GridError::NonFinite {
                axis: AxisName::Longitude,
                index: 1
            })
        );
        assert_eq!(
            check_axis(&Array1::zeros(0), AxisName::Longitude),
            Err(GridError::TooFewPoints {
                axis: AxisName::Longitude,
                len: 0
            })
        );
    }
}
