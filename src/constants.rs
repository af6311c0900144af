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

//! Module containing constants used by the program.

use crate::Float;

/// Configuration file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Default spacing (in degrees) of the target grid.
pub const DEFAULT_GRID_STEP: Float = 0.02;

/// Smallest memory limit (in MB) accepted in configuration.
pub const MIN_MEMORY_LIMIT: usize = 128;

/// Names under which the time coordinate column is recognised in input files.
pub const TIME_NAMES: [&str; 2] = ["time", "valid_time"];

/// Names under which the latitude coordinate column is recognised in input files.
pub const LATITUDE_NAMES: [&str; 2] = ["latitude", "lat"];

/// Names under which the longitude coordinate column is recognised in input files.
pub const LONGITUDE_NAMES: [&str; 2] = ["longitude", "lon"];

/// Datetime formats accepted in the time column, tried in order.
pub const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Datetime format used when writing output.
pub const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Columns of ERA5 tables which are coordinates or metadata rather than
/// variables, skipped when the variable to resample is selected automatically.
pub const AUXILIARY_NAMES: [&str; 9] = [
    "number",
    "expver",
    "step",
    "surface",
    "depthBelowLandLayer",
    "heightAboveGround",
    "entireAtmosphere",
    "spatial_ref",
    "band",
];

/// Largest number of points of a target axis and of the whole target grid.
pub const MAX_GRID_POINTS: usize = isize::MAX as usize / std::mem::size_of::<Float>();

/// File extensions recognised as NetCDF.
pub const NETCDF_EXTENSIONS: [&str; 3] = ["nc", "nc4", "netcdf"];

/// File extensions recognised as CSV tables.
pub const CSV_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Time units written to NetCDF output.
pub const OUTPUT_TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";

/// Reference datetime formats accepted in CF time units, tried in order.
/// A bare date (`%Y-%m-%d`) is accepted as well.
pub const TIME_REFERENCE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
