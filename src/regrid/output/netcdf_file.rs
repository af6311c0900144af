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

//! Sub-module writing the resampled series as a CF-compliant
//! NetCDF file with `time`, `latitude` and `longitude` coordinates.

use crate::{
    constants::OUTPUT_TIME_UNITS,
    errors::OutputError,
    regrid::grid::ResampledSeries,
    Float,
};
use std::path::Path;

/// Writes the series to a new NetCDF file. The variable keeps
/// its name and has dimensions `(time, latitude, longitude)`,
/// missing values are stored as NaN.
pub(super) fn save_series(series: &ResampledSeries, out_path: &Path) -> Result<(), OutputError> {
    let mut file = netcdf::create(out_path)?;

    file.add_dimension("time", series.times.len())?;
    file.add_dimension("latitude", series.latitude.len())?;
    file.add_dimension("longitude", series.longitude.len())?;

    {
        let times: Vec<i64> = series.times.iter().map(|t| t.timestamp()).collect();

        let mut time_var = file.add_variable::<i64>("time", &["time"])?;
        time_var.put_attribute("standard_name", "time")?;
        time_var.put_attribute("units", OUTPUT_TIME_UNITS)?;
        time_var.put_attribute("calendar", "proleptic_gregorian")?;
        time_var.put_values(times.as_slice(), ..)?;
    }

    {
        let mut lat_var = file.add_variable::<Float>("latitude", &["latitude"])?;
        lat_var.put_attribute("standard_name", "latitude")?;
        lat_var.put_attribute("long_name", "latitude")?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(series.latitude.to_vec().as_slice(), ..)?;
    }

    {
        let mut lon_var = file.add_variable::<Float>("longitude", &["longitude"])?;
        lon_var.put_attribute("standard_name", "longitude")?;
        lon_var.put_attribute("long_name", "longitude")?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_values(series.longitude.to_vec().as_slice(), ..)?;
    }

    {
        // logical order of the array is (time, latitude, longitude)
        let values: Vec<Float> = series.values.iter().copied().collect();

        let mut data_var =
            file.add_variable::<Float>(&series.variable, &["time", "latitude", "longitude"])?;
        data_var.put_attribute("_FillValue", Float::NAN)?;
        data_var.put_values(values.as_slice(), ..)?;
    }

    file.add_attribute("Conventions", "CF-1.8")?;
    file.add_attribute("history", "Resampled onto a regular grid with ERA5 Regrid")?;

    Ok(())
}
