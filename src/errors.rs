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

use crate::{regrid::grid::AxisName, Float};
use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegridError {
    #[error("Error while reading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while reading input data: {0}")]
    Input(#[from] InputError),

    #[error("{0}")]
    Resample(#[from] ResampleError),

    #[error("Error while joining resampled time steps: {0}")]
    Merge(#[from] MergeError),

    #[error("Error while writing output: {0}")]
    Output(#[from] OutputError),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Cannot set memory limit of {0} MB")]
    MemoryLimit(usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open configuration file: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize configuration file: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds: {0}")]
    OutOfBounds(&'static str),

    #[error("Grid step must be a positive finite number, got {0}")]
    InvalidStep(Float),
}

/// Errors caused by a source grid which cannot be interpolated
/// or by a query point outside of it.
#[derive(Error, Debug, PartialEq)]
pub enum GridError {
    #[error("{axis} axis has {len} points but at least 2 are required")]
    TooFewPoints { axis: AxisName, len: usize },

    #[error("{axis} axis is not strictly monotonic at index {index}")]
    NotMonotonic { axis: AxisName, index: usize },

    #[error("{axis} axis contains non-finite value at index {index}")]
    NonFinite { axis: AxisName, index: usize },

    #[error("Values shape {found:?} does not match axes shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Target {axis} axis would have {points} points, too many to be allocated")]
    AxisTooLong { axis: AxisName, points: Float },

    #[error("Target grid of {lat_points} x {lon_points} points is too large to be allocated")]
    TargetTooLarge { lat_points: usize, lon_points: usize },

    #[error("Point {value} is outside of {axis} axis range [{min}, {max}], extrapolation is not allowed")]
    Extrapolation {
        axis: AxisName,
        value: Float,
        min: Float,
        max: Float,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum SearchError {
    #[error("Cannot search in array with less than two elements")]
    EmptyArray,

    #[error("Searched value is out of array bounds")]
    OutOfBounds,
}

#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("Invalid resampling configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Resampling failed at time step {index} ({time}): {source}")]
    TimeStep {
        index: usize,
        time: NaiveDateTime,
        source: GridError,
    },

    #[error("Resampling worker for time step {0} stopped without result")]
    WorkerLost(usize),
}

#[derive(Error, Debug, PartialEq)]
pub enum MergeError {
    #[error("Nothing to join, the list of resampled fields is empty")]
    EmptySeries,

    #[error("Field {index} has variable {found} while the series has {expected}")]
    VariableMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Field {index} has {axis} axis of {found} points that differs from the {expected} points of the series")]
    GridMismatch {
        index: usize,
        axis: AxisName,
        expected: usize,
        found: usize,
    },

    #[error("Field {index} has values of shape {found:?} that do not match its axes {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Cannot stack resampled fields: {0}")]
    Stack(String),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Cannot read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse input file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot read NetCDF input: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Format of input file {0} is not recognised, use .nc or .csv extension")]
    UnknownFormat(PathBuf),

    #[error("Variable {variable} has dimensions ({dimensions}), expected (time, latitude, longitude)")]
    UnsupportedLayout { variable: String, dimensions: String },

    #[error("Cannot decode time with units \"{0}\"")]
    InvalidTimeUnits(String),

    #[error("Time step {time} from {file} is already present in earlier input")]
    DuplicateTime { time: NaiveDateTime, file: PathBuf },

    #[error("Input data is not sufficient: {0}")]
    DataNotSufficient(&'static str),

    #[error("Column {0} required in input file is missing")]
    MissingColumn(&'static str),

    #[error("Variable {0} not found in input file")]
    MissingVariable(String),

    #[error("Cannot parse {0} as datetime")]
    InvalidTime(String),

    #[error("Cannot parse {value} in column {column} as number")]
    InvalidNumber { column: String, value: String },

    #[error("Grid at {time} in {file} is incomplete: expected {expected} cells, found {found}")]
    IncompleteGrid {
        file: PathBuf,
        time: NaiveDateTime,
        expected: usize,
        found: usize,
    },

    #[error("Cell ({lat}, {lon}) at {time} appears more than once")]
    DuplicateCell {
        time: NaiveDateTime,
        lat: Float,
        lon: Float,
    },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot write output file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot serialize output: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot write NetCDF output: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Format of output file {0} is not recognised, use .nc or .csv extension")]
    UnknownFormat(PathBuf),

    #[error("Output is faulty: {0}")]
    FaultyOutput(&'static str),
}
