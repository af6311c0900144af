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

//! Module responsible for parsing and checking the configuration file.
//!
//! To provide meaningful error messages the configuration file uses
//! [YAML](https://en.wikipedia.org/wiki/YAML) and `serde` to enforce
//! strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use super::grid::{axis::GridPolicy, interpolation::Method};
use super::series::check_step;
use super::FileFormat;
use crate::{constants::DEFAULT_GRID_STEP, constants::MIN_MEMORY_LIMIT, errors::ConfigError};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::Float;

/// Fields with information about input data files.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Input {
    /// List of input files with gridded data.
    ///
    /// Currently those files must meet following criteria:
    ///
    /// - Files are NetCDF (`.nc`, `.nc4`, `.netcdf`) with `time`, `latitude`
    /// and `longitude` coordinates (`valid_time`, `lat` and `lon` are accepted
    /// as well) and the variable on `(time, latitude, longitude)` dimensions,
    /// or CSV tables (`.csv`, `.txt`) with such columns and one column per variable.
    /// - Each time step must cover the whole latitude-longitude grid
    /// and each grid cell can appear only once per time step.
    /// - None of the files can be empty and a time step
    /// can be present in only one file.
    ///
    /// Time steps from all files are joined in the order of time.
    pub data_files: Vec<PathBuf>,

    /// _(Optional)_ Name of the variable to resample.
    ///
    /// Defaults to the first variable (or column) which is neither
    /// a coordinate nor ERA5 metadata such as `number` or `expver`.
    #[serde(default)]
    pub variable_name: Option<String>,

    /// _(Optional)_ Hours (UTC, `0..=23`) of time steps which should
    /// be skipped, eg. `[19]` removes all 19:00 steps.
    ///
    /// Defaults to an empty list.
    #[serde(default)]
    pub exclude_hours: Vec<u32>,
}

impl Input {
    /// Checks if input settings are usable.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.data_files.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one input file is required",
            ));
        }

        if self
            .data_files
            .iter()
            .any(|f| FileFormat::from_path(f).is_none())
        {
            return Err(ConfigError::OutOfBounds(
                "Input files must have a NetCDF (.nc) or CSV (.csv) extension",
            ));
        }

        if self.exclude_hours.iter().any(|h| *h > 23) {
            return Err(ConfigError::OutOfBounds(
                "Excluded hours must be between 0 and 23",
            ));
        }

        Ok(())
    }
}

/// _(Optional)_ Fields controlling how fields are resampled.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct Resampling {
    /// _(Optional)_ Spacing (in degrees) of the target grid
    /// in both latitude and longitude.
    ///
    /// Must be positive. Defaults to `0.02`.
    #[serde(default = "Resampling::default_grid_step")]
    pub grid_step: Float,

    /// _(Optional)_ Interpolation method, `linear` or `nearest`.
    ///
    /// Defaults to `linear`.
    #[serde(default)]
    pub method: Method,

    /// _(Optional)_ How target axes are built from the step:
    /// `inclusive` (both ends of the source extent are included)
    /// or `stepped` (`min, min + step, ...` strictly below the maximum).
    ///
    /// Defaults to `inclusive`.
    #[serde(default)]
    pub grid_policy: GridPolicy,
}

impl Resampling {
    fn default_grid_step() -> Float {
        DEFAULT_GRID_STEP
    }

    /// Checks if the grid step is usable.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        check_step(self.grid_step)
    }
}

impl Default for Resampling {
    fn default() -> Self {
        Resampling {
            grid_step: Resampling::default_grid_step(),
            method: Method::default(),
            grid_policy: GridPolicy::default(),
        }
    }
}

/// Fields with information about the output file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// Path of the output file, written as NetCDF or CSV
    /// depending on the extension. Missing parent
    /// directories are created.
    pub path: PathBuf,

    /// _(Optional)_ Whether an existing output file can be replaced.
    ///
    /// Defaults to `false`, so that already processed data
    /// is never overwritten by accident.
    #[serde(default)]
    pub overwrite: bool,
}

impl Output {
    /// Checks if the output format is known.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if FileFormat::from_path(&self.path).is_none() {
            return Err(ConfigError::OutOfBounds(
                "Output file must have a NetCDF (.nc) or CSV (.csv) extension",
            ));
        }

        Ok(())
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the program.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used for resampling.
    /// With more than one thread time steps are resampled
    /// in parallel on a thread pool of this size.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit in MB.
    /// Useful for enabling meaningful Out-of-memory error messages.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space
    /// (`2^32` or `2^64` bytes).
    ///
    /// The size of the target grid grows with the inverse square of
    /// the grid step, and the whole resampled series is kept in memory
    /// until it is written. When the allocator has a capped memory amount
    /// available it will abort the process with an OOM error message
    /// instead of letting the system slow down and kill the process
    /// without any additional information.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < MIN_MEMORY_LIMIT {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub input: Input,

    #[serde(default)]
    pub resampling: Resampling,

    pub output: Output,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::new_from_slice(data.as_slice())
    }

    pub fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.input.check_bounds()?;
        config.resampling.check_bounds()?;
        config.output.check_bounds()?;
        config.resources.check_bounds()?;

        Ok(config)
    }
}
