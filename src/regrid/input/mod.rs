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

//! Module responsible for reading gridded input data
//! into the list of fields, one per time step.
//!
//! Two formats are supported, recognised by the file extension:
//!
//! - NetCDF files as downloaded from the Climate Data Store, with
//!   coordinate variables `time` (or `valid_time`), `latitude`, `longitude`
//!   and data variables of dimensions `(time, latitude, longitude)`.
//! - CSV tables in "long" layout with one row per grid cell and time step,
//!   as produced by `xarray.Dataset.to_dataframe().to_csv()`.

mod csv_table;
mod netcdf_file;

use super::configuration::Input;
use super::grid::SourceField;
use super::FileFormat;
use crate::{
    constants::{AUXILIARY_NAMES, LATITUDE_NAMES, LONGITUDE_NAMES, TIME_NAMES},
    errors::InputError,
};
use chrono::{NaiveDateTime, Timelike};
use log::{debug, info};
use rustc_hash::FxHashSet;
use std::path::Path;

/// Reads all input files listed in configuration, joins their
/// time steps ordered by time and drops the excluded hours.
///
/// The same time step can appear in only one of the files.
pub fn read_fields(input: &Input) -> Result<Vec<SourceField>, InputError> {
    let mut variable = input.variable_name.clone();
    let mut fields = vec![];
    let mut times: FxHashSet<NaiveDateTime> = FxHashSet::default();

    for file in &input.data_files {
        debug!("Reading input file {}", file.display());

        let file_fields = read_file(file, variable.as_deref())?;

        // files after the first one have to provide the same variable
        if variable.is_none() {
            variable = file_fields.first().map(|f| f.variable.clone());
        }

        for field in file_fields {
            if !times.insert(field.time) {
                return Err(InputError::DuplicateTime {
                    time: field.time,
                    file: file.clone(),
                });
            }

            fields.push(field);
        }
    }

    if !fields.windows(2).all(|pair| pair[0].time < pair[1].time) {
        debug!("Ordering time steps from all input files by time");
        fields.sort_by_key(|f| f.time);
    }

    let read_count = fields.len();
    fields.retain(|f| !input.exclude_hours.contains(&f.time.hour()));

    if read_count != fields.len() {
        info!(
            "Skipped {} time steps at excluded hours {:?}",
            read_count - fields.len(),
            input.exclude_hours
        );
    }

    if fields.is_empty() {
        return Err(InputError::DataNotSufficient(
            "No time steps left to resample, check your input data",
        ));
    }

    Ok(fields)
}

/// Reads one input file into fields of a single variable.
///
/// When `variable` is `None` the first data variable
/// (neither a coordinate nor ERA5 metadata) is selected.
pub fn read_file(path: &Path, variable: Option<&str>) -> Result<Vec<SourceField>, InputError> {
    match FileFormat::from_path(path) {
        Some(FileFormat::NetCdf) => netcdf_file::read_file(path, variable),
        Some(FileFormat::Csv) => csv_table::read_file(path, variable),
        None => Err(InputError::UnknownFormat(path.to_path_buf())),
    }
}

/// Checks if the column or variable name is one of
/// coordinates or metadata fields, not a variable to resample.
fn is_coordinate(name: &str) -> bool {
    TIME_NAMES
        .iter()
        .chain(&LATITUDE_NAMES)
        .chain(&LONGITUDE_NAMES)
        .chain(&AUXILIARY_NAMES)
        .any(|coordinate| *coordinate == name)
}
