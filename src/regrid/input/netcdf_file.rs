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

//! Sub-module reading NetCDF files as distributed by the
//! Climate Data Store.
//!
//! ERA5 variables are often packed as 16-bit integers with
//! `scale_factor` and `add_offset` attributes, and missing values
//! are marked with `_FillValue` or `missing_value`. Values are
//! unpacked on reading and missing ones are replaced with NaN.
//! Time is decoded from CF units (eg. `hours since 1900-01-01`).

use super::is_coordinate;
use crate::{
    constants::{LATITUDE_NAMES, LONGITUDE_NAMES, TIME_NAMES, TIME_REFERENCE_FORMATS},
    errors::InputError,
    regrid::grid::SourceField,
    Float,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;
use ndarray::{Array1, Array3, Axis};
use netcdf::{AttributeValue, Variable};
use std::path::Path;

/// Reads one NetCDF file into fields of a single variable.
///
/// When `variable` is `None` the first variable of dimensions
/// `(time, latitude, longitude)` that is not a coordinate is selected.
pub(super) fn read_file(path: &Path, variable: Option<&str>) -> Result<Vec<SourceField>, InputError> {
    let file = netcdf::open(path)?;

    let time_var = find_variable(&file, &TIME_NAMES).ok_or(InputError::MissingColumn("time"))?;
    let lat_var =
        find_variable(&file, &LATITUDE_NAMES).ok_or(InputError::MissingColumn("latitude"))?;
    let lon_var =
        find_variable(&file, &LONGITUDE_NAMES).ok_or(InputError::MissingColumn("longitude"))?;

    let layout = [time_var.name(), lat_var.name(), lon_var.name()];

    let data_var = match variable {
        Some(name) => file
            .variable(name)
            .ok_or_else(|| InputError::MissingVariable(name.to_string()))?,
        None => file
            .variables()
            .find(|var| !is_coordinate(&var.name()) && dimension_names(var) == layout)
            .ok_or(InputError::DataNotSufficient(
                "Input file has no variables on the time-latitude-longitude grid",
            ))?,
    };

    let variable_name = data_var.name();
    let dimensions = dimension_names(&data_var);

    if dimensions != layout {
        return Err(InputError::UnsupportedLayout {
            variable: variable_name,
            dimensions: dimensions.join(", "),
        });
    }

    debug!("Selected variable {} from {}", variable_name, path.display());

    let times = read_times(&time_var)?;
    let latitude = Array1::from_vec(read_numbers(&lat_var)?);
    let longitude = Array1::from_vec(read_numbers(&lon_var)?);

    if times.is_empty() {
        return Err(InputError::DataNotSufficient(
            "Input file does not contain any time steps",
        ));
    }

    let shape = (times.len(), latitude.len(), longitude.len());
    let values = Array3::from_shape_vec(shape, read_numbers(&data_var)?).map_err(|_| {
        InputError::UnsupportedLayout {
            variable: variable_name.clone(),
            dimensions: dimensions.join(", "),
        }
    })?;

    let fields = times
        .into_iter()
        .enumerate()
        .map(|(t, time)| SourceField {
            variable: variable_name.clone(),
            time,
            latitude: latitude.clone(),
            longitude: longitude.clone(),
            values: values.index_axis(Axis(0), t).to_owned(),
        })
        .collect();

    Ok(fields)
}

fn find_variable<'f>(file: &'f netcdf::File, names: &[&str]) -> Option<Variable<'f>> {
    names.iter().find_map(|name| file.variable(name))
}

fn dimension_names(var: &Variable) -> Vec<String> {
    var.dimensions().iter().map(|dim| dim.name()).collect()
}

/// Reads all values of the variable as floats, whatever
/// numeric type it is stored in, unpacking and masking them.
fn read_numbers(var: &Variable) -> Result<Vec<Float>, InputError> {
    let raw = read_raw(var)?;

    let scale = numeric_attribute(var, "scale_factor").unwrap_or(1.0);
    let offset = numeric_attribute(var, "add_offset").unwrap_or(0.0);
    let missing = [
        numeric_attribute(var, "_FillValue"),
        numeric_attribute(var, "missing_value"),
    ];

    let values = raw
        .into_iter()
        .map(|v| {
            if missing.contains(&Some(v)) {
                Float::NAN
            } else {
                v * scale + offset
            }
        })
        .collect();

    Ok(values)
}

fn read_raw(var: &Variable) -> Result<Vec<Float>, InputError> {
    if let Ok(values) = var.get_values::<f64, _>(..) {
        return Ok(values);
    }

    if let Ok(values) = var.get_values::<f32, _>(..) {
        return Ok(values.into_iter().map(Float::from).collect());
    }

    if let Ok(values) = var.get_values::<i16, _>(..) {
        return Ok(values.into_iter().map(Float::from).collect());
    }

    if let Ok(values) = var.get_values::<i32, _>(..) {
        return Ok(values.into_iter().map(Float::from).collect());
    }

    let values = var.get_values::<i64, _>(..)?;

    Ok(values.into_iter().map(|v| v as Float).collect())
}

/// Checks for the attribute before reading it, as HDF5
/// reports every missing attribute on stderr.
fn has_attribute(var: &Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn numeric_attribute(var: &Variable, name: &str) -> Option<Float> {
    if !has_attribute(var, name) {
        return None;
    }

    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(v.into()),
        AttributeValue::Short(v) => Some(v.into()),
        AttributeValue::Int(v) => Some(v.into()),
        AttributeValue::Longlong(v) => Some(v as Float),
        _ => None,
    }
}

fn text_attribute(var: &Variable, name: &str) -> Option<String> {
    if !has_attribute(var, name) {
        return None;
    }

    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(text) => Some(text),
        _ => None,
    }
}

fn read_times(var: &Variable) -> Result<Vec<NaiveDateTime>, InputError> {
    let units = text_attribute(var, "units").unwrap_or_default();
    let (unit_seconds, reference) = parse_time_units(&units)?;

    read_raw(var)?
        .into_iter()
        .map(|v| {
            offset_time(reference, v * unit_seconds)
                .ok_or_else(|| InputError::InvalidTimeUnits(units.clone()))
        })
        .collect()
}

/// Parses CF time units `<unit> since <reference>` into the
/// length of the unit in seconds and the reference datetime.
fn parse_time_units(units: &str) -> Result<(Float, NaiveDateTime), InputError> {
    let invalid = || InputError::InvalidTimeUnits(units.to_string());

    let (unit, reference) = units.trim().split_once(" since ").ok_or_else(invalid)?;

    let unit_seconds = match unit.trim().to_lowercase().as_str() {
        "seconds" | "second" | "secs" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        _ => return Err(invalid()),
    };

    let reference = reference
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim();

    let reference = TIME_REFERENCE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(reference, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(reference, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;

    Ok((unit_seconds, reference))
}

fn offset_time(reference: NaiveDateTime, seconds: Float) -> Option<NaiveDateTime> {
    let millis = (seconds * 1000.0).round();

    // far beyond any reanalysis period, and beyond what Duration holds
    if !millis.is_finite() || millis.abs() > 1e17 {
        return None;
    }

    reference.checked_add_signed(Duration::milliseconds(millis as i64))
}

#[cfg(test)]
mod tests {
    use super::{parse_time_units, read_file};
    use crate::{
        errors::InputError,
        regrid::{grid::tests::hour, input::tests::temp_path},
        Float,
    };
    use chrono::NaiveDate;
    use float_cmp::approx_eq;
    use ndarray::array;

    /// Writes a file laid out like a Climate Data Store download:
    /// `valid_time` in seconds since epoch, descending latitudes,
    /// ensemble and experiment metadata, and packed `swvl1`.
    fn write_era5_file(name: &str) -> std::path::PathBuf {
        let path = temp_path(name, "era5.nc");
        let mut file = netcdf::create(&path).unwrap();

        file.add_dimension("valid_time", 2).unwrap();
        file.add_dimension("latitude", 2).unwrap();
        file.add_dimension("longitude", 3).unwrap();

        // 2020-01-01 00:00 and 06:00
        let times: [i64; 2] = [1_577_836_800, 1_577_858_400];
        let packed: [i16; 12] = [100, 110, 120, 130, 140, -32767, 0, 10, 20, 30, 40, 50];
        {
            let mut var = file.add_variable::<i64>("valid_time", &["valid_time"]).unwrap();
            var.put_attribute("units", "seconds since 1970-01-01").unwrap();
            var.put_values(&times, ..).unwrap();
        }
        {
            let mut var = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
            var.put_values(&[42.0_f64, 41.75], ..).unwrap();
        }
        {
            let mut var = file.add_variable::<f64>("longitude", &["longitude"]).unwrap();
            var.put_values(&[19.0_f64, 19.25, 19.5], ..).unwrap();
        }
        {
            let mut var = file.add_variable::<i32>("expver", &["valid_time"]).unwrap();
            var.put_values(&[1_i32, 1], ..).unwrap();
        }
        {
            let mut var = file
                .add_variable::<i16>("swvl1", &["valid_time", "latitude", "longitude"])
                .unwrap();
            var.put_attribute("scale_factor", 0.001).unwrap();
            var.put_attribute("add_offset", 0.2).unwrap();
            var.put_attribute("_FillValue", -32767_i16).unwrap();
            var.put_values(&packed, ..).unwrap();
        }

        path
    }

    #[test]
    fn era5_file_is_read_and_unpacked() {
        let path = write_era5_file("netcdf-era5");

        let fields = read_file(&path, None).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].variable, "swvl1");
        assert_eq!(fields[0].time, hour(0));
        assert_eq!(fields[1].time, hour(6));
        assert_eq!(fields[0].latitude, array![42.0, 41.75]);
        assert_eq!(fields[0].longitude, array![19.0, 19.25, 19.5]);
        assert_eq!(fields[0].values.dim(), (2, 3));

        assert!(approx_eq!(Float, fields[0].values[[0, 0]], 0.3, epsilon = 1e-9));
        assert!(approx_eq!(Float, fields[0].values[[1, 1]], 0.34, epsilon = 1e-9));
        assert!(fields[0].values[[1, 2]].is_nan());
        assert!(approx_eq!(Float, fields[1].values[[1, 2]], 0.25, epsilon = 1e-9));
    }

    #[test]
    fn variable_on_other_dimensions_is_rejected() {
        let path = write_era5_file("netcdf-layout");

        let err = read_file(&path, Some("expver")).unwrap_err();
        assert!(matches!(err, InputError::UnsupportedLayout { variable, .. } if variable == "expver"));

        let err = read_file(&path, Some("t2m")).unwrap_err();
        assert!(matches!(err, InputError::MissingVariable(_)));
    }

    #[test]
    fn time_units_are_parsed() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let era5 = NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();

        assert_eq!(
            parse_time_units("seconds since 1970-01-01").unwrap(),
            (1.0, epoch)
        );
        assert_eq!(
            parse_time_units("hours since 1900-01-01 00:00:00.0").unwrap(),
            (3600.0, era5)
        );
        assert_eq!(
            parse_time_units("days since 1970-01-01T00:00:00Z").unwrap(),
            (86400.0, epoch)
        );

        for units in ["", "fortnights since 1970-01-01", "hours after 1970-01-01"] {
            assert!(matches!(
                parse_time_units(units),
                Err(InputError::InvalidTimeUnits(_))
            ));
        }
    }
}
