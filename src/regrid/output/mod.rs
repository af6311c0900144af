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

//! Module writing the resampled series to disk.
//!
//! The format follows the extension of the output path: NetCDF
//! (same layout as the input data, so the output can be used
//! wherever ERA5 files are) or a long CSV table.

mod csv_table;
mod netcdf_file;

use super::{configuration::Output, grid::ResampledSeries, FileFormat};
use crate::errors::OutputError;
use log::debug;
use std::{fs, path::Path};

/// Checks that the output file can be written before
/// any time is spent on resampling.
///
/// Missing parent directories are created. An existing
/// output file is only accepted when overwriting is enabled.
pub fn prepare_output(output: &Output) -> Result<(), OutputError> {
    debug!("Checking and setting output path");

    if FileFormat::from_path(&output.path).is_none() {
        return Err(OutputError::UnknownFormat(output.path.clone()));
    }

    if output.path.is_dir() {
        return Err(OutputError::FaultyOutput(
            "Output path points to a directory",
        ));
    }

    if output.path.exists() {
        if output.overwrite {
            debug!("Output file exists and will be overwritten");
        } else {
            return Err(OutputError::FaultyOutput(
                "Output file already exists and overwriting is disabled",
            ));
        }
    }

    if let Some(parent) = output.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            debug!("Output directory does not exist so creating a new one");
            fs::create_dir_all(parent)?;
        }
    }

    Ok(())
}

/// Writes the series in the format matching the extension of `out_path`.
pub fn save_series(series: &ResampledSeries, out_path: &Path) -> Result<(), OutputError> {
    match FileFormat::from_path(out_path) {
        Some(FileFormat::NetCdf) => netcdf_file::save_series(series, out_path),
        Some(FileFormat::Csv) => csv_table::save_series(series, out_path),
        None => Err(OutputError::UnknownFormat(out_path.to_path_buf())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::prepare_output;
    use crate::{
        errors::OutputError,
        regrid::{
            configuration::Output,
            grid::{tests::hour, ResampledSeries},
            input::tests::temp_file,
        },
    };
    use ndarray::array;
    use std::env;

    pub(crate) fn series() -> ResampledSeries {
        ResampledSeries {
            variable: "t2m".to_string(),
            times: vec![hour(0), hour(6)],
            latitude: array![10.0, 11.0],
            longitude: array![20.0, 20.5, 21.0],
            values: array![
                [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
                [[7.0, 8.0, 9.0], [10.0, 11.0, 12.5]]
            ],
        }
    }

    #[test]
    fn existing_output_is_protected() {
        let path = temp_file("protected", "resampled.csv", "old");

        let mut output = Output {
            path: path.clone(),
            overwrite: false,
        };

        assert!(matches!(
            prepare_output(&output),
            Err(OutputError::FaultyOutput(_))
        ));

        output.overwrite = true;
        assert!(prepare_output(&output).is_ok());
    }

    #[test]
    fn missing_directories_are_created() {
        let dir = env::temp_dir().join(format!("era5-regrid-nested-{}", std::process::id()));
        let output = Output {
            path: dir.join("a").join("b").join("resampled.csv"),
            overwrite: false,
        };

        prepare_output(&output).unwrap();

        assert!(dir.join("a").join("b").is_dir());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let output = Output {
            path: env::temp_dir().join("era5-regrid-resampled.grib"),
            overwrite: true,
        };

        assert!(matches!(
            prepare_output(&output),
            Err(OutputError::UnknownFormat(_))
        ));
    }
}
