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

//! Module containing interpolation methods on a regular
//! (axis-aligned, not necessarily evenly spaced) 2D grid.

use super::{axis::check_axis_view, bisection, AxisName};
use crate::{
    errors::{GridError, SearchError},
    Float,
};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use serde::Deserialize;

/// Interpolation method used for resampling.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Linear,
    Nearest,
}

impl Default for Method {
    fn default() -> Self {
        Method::Linear
    }
}

/// Interpolant of a scalar field given on a rectilinear
/// latitude-longitude grid.
///
/// Axes are stored ascending. Descending input axes are reversed
/// together with the corresponding dimension of values, so that
/// cell search can always assume ascending order.
///
/// The interpolant is defined only within the grid extent,
/// queries outside of it return [`GridError::Extrapolation`].
#[derive(Clone, Debug)]
pub struct RegularGridInterpolator {
    latitude: Vec<Float>,
    longitude: Vec<Float>,
    values: Array2<Float>,
    method: Method,
}

impl RegularGridInterpolator {
    pub fn new(
        latitude: ArrayView1<Float>,
        longitude: ArrayView1<Float>,
        values: ArrayView2<Float>,
        method: Method,
    ) -> Result<Self, GridError> {
        check_axis_view(latitude, AxisName::Latitude)?;
        check_axis_view(longitude, AxisName::Longitude)?;

        let expected = (latitude.len(), longitude.len());
        if values.dim() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                found: values.dim(),
            });
        }

        let lat_descending = latitude[0] > latitude[1];
        let lon_descending = longitude[0] > longitude[1];

        let mut values = values;
        if lat_descending {
            values = values.slice_move(s![..;-1, ..]);
        }
        if lon_descending {
            values = values.slice_move(s![.., ..;-1]);
        }

        Ok(RegularGridInterpolator {
            latitude: ascending(latitude, lat_descending),
            longitude: ascending(longitude, lon_descending),
            values: values.to_owned(),
            method,
        })
    }

    /// Evaluates the interpolant at given point.
    pub fn interpolate(&self, lat: Float, lon: Float) -> Result<Float, GridError> {
        let (i, t) = locate(&self.latitude, lat, AxisName::Latitude)?;
        let (j, u) = locate(&self.longitude, lon, AxisName::Longitude)?;

        let value = match self.method {
            Method::Linear => {
                let v00 = self.values[[i, j]];
                let v01 = self.values[[i, j + 1]];
                let v10 = self.values[[i + 1, j]];
                let v11 = self.values[[i + 1, j + 1]];

                (1.0 - t) * (1.0 - u) * v00
                    + (1.0 - t) * u * v01
                    + t * (1.0 - u) * v10
                    + t * u * v11
            }
            Method::Nearest => {
                // ties go to the lower node
                let ni = if t <= 0.5 { i } else { i + 1 };
                let nj = if u <= 0.5 { j } else { j + 1 };

                self.values[[ni, nj]]
            }
        };

        Ok(value)
    }
}

fn ascending(axis: ArrayView1<Float>, descending: bool) -> Vec<Float> {
    let mut axis = axis.to_vec();

    if descending {
        axis.reverse();
    }

    axis
}

/// Finds the enclosing cell of `x` and the normalised
/// distance of `x` from the lower node of that cell.
fn locate(axis: &[Float], x: Float, name: AxisName) -> Result<(usize, Float), GridError> {
    let index = bisection::find_enclosing_cell(axis, &x).map_err(|err| match err {
        SearchError::OutOfBounds | SearchError::EmptyArray => GridError::Extrapolation {
            axis: name,
            value: x,
            min: axis[0],
            max: axis[axis.len() - 1],
        },
    })?;

    let distance = (x - axis[index]) / (axis[index + 1] - axis[index]);

    Ok((index, distance))
}
