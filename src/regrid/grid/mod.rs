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

//! Module with the gridded fields data model and the
//! routine resampling a single field onto a finer grid.

pub mod axis;
mod bisection;
pub mod interpolation;

use self::axis::{check_axis, extent, GridPolicy};
use self::interpolation::{Method, RegularGridInterpolator};
use crate::{constants::MAX_GRID_POINTS, errors::GridError, Float};
use chrono::NaiveDateTime;
use ndarray::{Array1, Array2, Array3};
use std::fmt;

/// Names of the horizontal grid axes, used to tell
/// in error messages which axis is at fault.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum AxisName {
    Latitude,
    Longitude,
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisName::Latitude => write!(f, "latitude"),
            AxisName::Longitude => write!(f, "longitude"),
        }
    }
}

/// A named scalar field at one time instant, defined
/// on the native latitude-longitude grid of the input data.
///
/// Axes can be ascending or descending (ERA5 stores latitudes
/// from north to south), but they have to be strictly monotonic
/// and `values` must have shape `(latitude.len(), longitude.len())`.
#[derive(Clone, PartialEq, Debug)]
pub struct SourceField {
    pub variable: String,
    pub time: NaiveDateTime,
    pub latitude: Array1<Float>,
    pub longitude: Array1<Float>,
    pub values: Array2<Float>,
}

impl SourceField {
    /// Checks that both axes are usable for interpolation
    /// and that the values array matches them.
    pub fn check_grid(&self) -> Result<(), GridError> {
        check_axis(&self.latitude, AxisName::Latitude)?;
        check_axis(&self.longitude, AxisName::Longitude)?;

        let expected = (self.latitude.len(), self.longitude.len());
        let found = self.values.dim();

        if expected != found {
            return Err(GridError::ShapeMismatch { expected, found });
        }

        Ok(())
    }
}

/// A field resampled onto the regular target grid.
/// Target axes are always ascending.
#[derive(Clone, PartialEq, Debug)]
pub struct ResampledField {
    pub variable: String,
    pub time: NaiveDateTime,
    pub latitude: Array1<Float>,
    pub longitude: Array1<Float>,
    pub values: Array2<Float>,
}

/// Resampled fields joined along the time axis.
///
/// `values` has shape `(times.len(), latitude.len(), longitude.len())`.
#[derive(Clone, PartialEq, Debug)]
pub struct ResampledSeries {
    pub variable: String,
    pub times: Vec<NaiveDateTime>,
    pub latitude: Array1<Float>,
    pub longitude: Array1<Float>,
    pub values: Array3<Float>,
}

/// Resamples one field onto the regular grid spanning
/// the extent of its own axes with given `step`.
///
/// The interpolant is evaluated on every target point in row-major
/// order (latitude outer, longitude inner) and the flat result
/// is then reshaped into the target grid shape.
pub fn resample_field(
    field: &SourceField,
    step: Float,
    method: Method,
    policy: GridPolicy,
) -> Result<ResampledField, GridError> {
    field.check_grid()?;

    let (lat_min, lat_max) = extent(&field.latitude);
    let (lon_min, lon_max) = extent(&field.longitude);

    let lat_len = policy.axis_len(lat_min, lat_max, step, AxisName::Latitude)?;
    let lon_len = policy.axis_len(lon_min, lon_max, step, AxisName::Longitude)?;

    match lat_len.checked_mul(lon_len) {
        Some(points) if points <= MAX_GRID_POINTS => (),
        _ => {
            return Err(GridError::TargetTooLarge {
                lat_points: lat_len,
                lon_points: lon_len,
            })
        }
    }

    let new_lat = policy.build_axis(lat_min, lat_max, step, lat_len);
    let new_lon = policy.build_axis(lon_min, lon_max, step, lon_len);

    let interpolator = RegularGridInterpolator::new(
        field.latitude.view(),
        field.longitude.view(),
        field.values.view(),
        method,
    )?;

    let mut flat_values = Vec::with_capacity(new_lat.len() * new_lon.len());

    for lat in &new_lat {
        for lon in &new_lon {
            flat_values.push(interpolator.interpolate(*lat, *lon)?);
        }
    }

    let target_shape = (new_lat.len(), new_lon.len());
    let flat_len = flat_values.len();

    let values = Array2::from_shape_vec(target_shape, flat_values).map_err(|_| {
        GridError::ShapeMismatch {
            expected: target_shape,
            found: (flat_len, 1),
        }
    })?;

    Ok(ResampledField {
        variable: field.variable.clone(),
        time: field.time,
        latitude: new_lat,
        longitude: new_lon,
        values,
    })
}
