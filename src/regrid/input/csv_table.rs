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

//! Sub-module reading CSV tables in "long" layout, with one row
//! per grid cell and time step, as produced for example by
//! `xarray.Dataset.to_dataframe().to_csv()`:
//!
//! ```text
//! valid_time,latitude,longitude,swvl1,t2m
//! 2020-01-01 00:00:00,42.0,19.0,0.31,281.2
//! 2020-01-01 00:00:00,42.0,19.25,0.29,281.0
//! ```

use super::is_coordinate;
use crate::{
    constants::{LATITUDE_NAMES, LONGITUDE_NAMES, TIME_FORMATS, TIME_NAMES},
    errors::InputError,
    regrid::grid::SourceField,
    Float,
};
use chrono::NaiveDateTime;
use csv::StringRecord;
use log::debug;
use ndarray::{Array1, Array2};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

/// Column indices of coordinates and the selected variable.
#[derive(Clone, PartialEq, Debug)]
struct Columns {
    time: usize,
    latitude: usize,
    longitude: usize,
    variable: usize,
    variable_name: String,
}

/// Cells of one time step in the order they were read.
#[derive(Clone, PartialEq, Debug)]
struct RawStep {
    time: NaiveDateTime,
    cells: Vec<(Float, Float, Float)>,
}

/// Reads one CSV file into fields of a single variable.
///
/// When `variable` is `None` the first column that is neither
/// a coordinate nor ERA5 metadata (like `number` or `expver`) is selected.
pub(super) fn read_file(path: &Path, variable: Option<&str>) -> Result<Vec<SourceField>, InputError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = find_columns(&headers, variable)?;

    debug!(
        "Selected variable {} from {}",
        columns.variable_name,
        path.display()
    );

    let mut steps: Vec<RawStep> = vec![];
    let mut step_indices: FxHashMap<NaiveDateTime, usize> = FxHashMap::default();

    for record in reader.records() {
        let record = record?;

        let time = parse_time(field_of(&record, columns.time))?;
        let lat = parse_coordinate(&headers, &record, columns.latitude)?;
        let lon = parse_coordinate(&headers, &record, columns.longitude)?;
        let value = parse_value(&headers, &record, columns.variable)?;

        let step_index = *step_indices.entry(time).or_insert_with(|| {
            steps.push(RawStep {
                time,
                cells: vec![],
            });
            steps.len() - 1
        });

        steps[step_index].cells.push((lat, lon, value));
    }

    if steps.is_empty() {
        return Err(InputError::DataNotSufficient(
            "Input file does not contain any rows",
        ));
    }

    steps
        .into_iter()
        .map(|step| assemble_field(path, &columns.variable_name, step))
        .collect()
}

fn find_columns(headers: &StringRecord, variable: Option<&str>) -> Result<Columns, InputError> {
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|name| *name == h.trim()))
    };

    let time = find(&TIME_NAMES).ok_or(InputError::MissingColumn("time"))?;
    let latitude = find(&LATITUDE_NAMES).ok_or(InputError::MissingColumn("latitude"))?;
    let longitude = find(&LONGITUDE_NAMES).ok_or(InputError::MissingColumn("longitude"))?;

    let variable = match variable {
        Some(name) => headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| InputError::MissingVariable(name.to_string()))?,
        None => (0..headers.len())
            .find(|i| {
                ![time, latitude, longitude].contains(i) && !is_coordinate(headers[*i].trim())
            })
            .ok_or(InputError::DataNotSufficient(
                "Input file has no variable columns",
            ))?,
    };

    Ok(Columns {
        time,
        latitude,
        longitude,
        variable,
        variable_name: headers[variable].trim().to_string(),
    })
}

/// Builds the field of one time step. Axes are distinct
/// coordinates in the order of their first appearance,
/// so the axis direction of the source data is kept.
fn assemble_field(path: &Path, variable: &str, step: RawStep) -> Result<SourceField, InputError> {
    let (latitude, lat_index) = distinct_coordinates(step.cells.iter().map(|c| c.0));
    let (longitude, lon_index) = distinct_coordinates(step.cells.iter().map(|c| c.1));

    let expected = latitude.len() * longitude.len();
    if step.cells.len() != expected {
        return Err(InputError::IncompleteGrid {
            file: path.to_path_buf(),
            time: step.time,
            expected,
            found: step.cells.len(),
        });
    }

    let mut values = Array2::from_elem((latitude.len(), longitude.len()), Float::NAN);
    let mut filled: FxHashSet<(usize, usize)> = FxHashSet::default();

    for (lat, lon, value) in step.cells {
        let i = lat_index[&lat.to_bits()];
        let j = lon_index[&lon.to_bits()];

        if !filled.insert((i, j)) {
            return Err(InputError::DuplicateCell {
                time: step.time,
                lat,
                lon,
            });
        }

        values[[i, j]] = value;
    }

    Ok(SourceField {
        variable: variable.to_string(),
        time: step.time,
        latitude: Array1::from_vec(latitude),
        longitude: Array1::from_vec(longitude),
        values,
    })
}

/// Collects unique coordinates in order of appearance,
/// together with the map from coordinate to its index.
fn distinct_coordinates(
    coordinates: impl Iterator<Item = Float>,
) -> (Vec<Float>, FxHashMap<u64, usize>) {
    let mut distinct = vec![];
    let mut index: FxHashMap<u64, usize> = FxHashMap::default();

    for coordinate in coordinates {
        index.entry(coordinate.to_bits()).or_insert_with(|| {
            distinct.push(coordinate);
            distinct.len() - 1
        });
    }

    (distinct, index)
}

fn field_of(record: &StringRecord, column: usize) -> &str {
    record.get(column).unwrap_or("").trim()
}

fn parse_time(value: &str) -> Result<NaiveDateTime, InputError> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| InputError::InvalidTime(value.to_string()))
}

fn parse_coordinate(
    headers: &StringRecord,
    record: &StringRecord,
    column: usize,
) -> Result<Float, InputError> {
    let value = field_of(record, column);

    value.parse::<Float>().map_err(|_| InputError::InvalidNumber {
        column: headers[column].to_string(),
        value: value.to_string(),
    })
}

/// Empty cells are missing values (eg. soil moisture over the sea)
/// and are read as NaN.
fn parse_value(
    headers: &StringRecord,
    record: &StringRecord,
    column: usize,
) -> Result<Float, InputError> {
    if field_of(record, column).is_empty() {
        return Ok(Float::NAN);
    }

    parse_coordinate(headers, record, column)
}

#[cfg(test)]
mod tests {
    use super::read_file;
    use crate::{
        errors::InputError,
        regrid::{
            grid::tests::hour,
            input::tests::{temp_file, TWO_STEPS},
        },
    };
    use ndarray::array;
    use std::path::Path;

    #[test]
    fn first_variable_is_selected() {
        let path = temp_file("first-variable", "data.csv", TWO_STEPS);

        let fields = read_file(&path, None).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].variable, "swvl1");
        assert_eq!(fields[0].time, hour(0));
        assert_eq!(fields[1].time, hour(19));
        assert_eq!(fields[0].latitude, array![12.0, 10.0]);
        assert_eq!(fields[0].longitude, array![20.0, 24.0]);
        assert_eq!(fields[0].values, array![[3.0, 4.0], [1.0, 2.0]]);
        assert!(fields[1].values[[1, 1]].is_nan());
    }

    #[test]
    fn era5_metadata_columns_are_not_selected() {
        let content = "\
valid_time,latitude,longitude,number,expver,swvl1
2020-01-01 00:00:00,12.0,20.0,0,0001,0.31
2020-01-01 00:00:00,12.0,24.0,0,0001,0.29
2020-01-01 00:00:00,10.0,20.0,0,0001,0.33
2020-01-01 00:00:00,10.0,24.0,0,0001,0.12
";
        let path = temp_file("metadata-columns", "data.csv", content);

        let fields = read_file(&path, None).unwrap();

        assert_eq!(fields[0].variable, "swvl1");
        assert_eq!(fields[0].values, array![[0.31, 0.29], [0.33, 0.12]]);

        let only_metadata = "\
time,latitude,longitude,number,expver
2020-01-01 00:00:00,12.0,20.0,0,0001
";
        let path = temp_file("only-metadata", "data.csv", only_metadata);
        assert!(matches!(
            read_file(&path, None),
            Err(InputError::DataNotSufficient(_))
        ));
    }

    #[test]
    fn named_variable_is_selected() {
        let path = temp_file("named-variable", "data.csv", TWO_STEPS);

        let fields = read_file(&path, Some("t2m")).unwrap();

        assert_eq!(fields[0].variable, "t2m");
        assert_eq!(fields[0].values, array![[280.0, 281.0], [282.0, 283.0]]);

        let err = read_file(&path, Some("tp")).unwrap_err();
        assert!(matches!(err, InputError::MissingVariable(name) if name == "tp"));
    }

    #[test]
    fn incomplete_grid_is_rejected() {
        let content = "\
time,latitude,longitude,t2m
2020-01-01 00:00:00,12.0,20.0,1.0
2020-01-01 00:00:00,12.0,24.0,2.0
2020-01-01 00:00:00,10.0,20.0,3.0
";
        let path = temp_file("incomplete", "data.csv", content);

        let err = read_file(&path, None).unwrap_err();

        assert!(matches!(
            err,
            InputError::IncompleteGrid {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let bad_time = "\
time,latitude,longitude,t2m
yesterday,12.0,20.0,1.0
";
        let path = temp_file("bad-time", "data.csv", bad_time);
        assert!(matches!(
            read_file(&path, None),
            Err(InputError::InvalidTime(_))
        ));

        let bad_number = "\
time,latitude,longitude,t2m
2020-01-01 00:00:00,north,20.0,1.0
";
        let path = temp_file("bad-number", "data.csv", bad_number);
        assert!(matches!(
            read_file(&path, None),
            Err(InputError::InvalidNumber { .. })
        ));

        let no_latitude = "\
time,y,longitude,t2m
2020-01-01 00:00:00,12.0,20.0,1.0
";
        let path = temp_file("no-latitude", "data.csv", no_latitude);
        assert!(matches!(
            read_file(&path, None),
            Err(InputError::MissingColumn("latitude"))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_file(Path::new("./no-such-dir/data.csv"), None).unwrap_err();

        assert!(matches!(err, InputError::Csv(_)));
    }
}
