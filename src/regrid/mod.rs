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

//! Module containing the actual resampling code.
//!
//! The run consists of a few linear steps:
//!
//! 1. Configuration is read and checked, output path is prepared.
//! 2. Input files are read into a list of fields, one per time step.
//! 3. Each time step is resampled onto the regular target grid
//!    (in parallel when more than one thread is configured).
//! 4. Resampled steps are joined along the time axis
//!    and written to the output file.
//!
//! Any error stops the whole run, partial results are not written.

pub mod configuration;
pub mod grid;
pub mod input;
pub mod output;
pub mod series;

use self::{
    configuration::Config,
    grid::{ResampledField, SourceField},
};
use crate::{
    constants::{CSV_EXTENSIONS, NETCDF_EXTENSIONS},
    errors::RegridError,
    ALLOCATOR,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{path::Path, sync::Arc};

/// Main resampling function, responsible for all processing steps.
///
/// It reads the provided configuration and input data,
/// resamples all time steps and writes the joined result.
pub fn main(config_path: &Path) -> Result<(), RegridError> {
    info!("Preparing the resampling core");

    let core = Core::new(config_path)?;

    output::prepare_output(&core.config.output)?;

    info!("Reading input data");
    let fields = input::read_fields(&core.config.input)?;

    info!(
        "Resampling {} time steps of {} with {:?} method and {} degree step",
        fields.len(),
        fields[0].variable,
        core.config.resampling.method,
        core.config.resampling.grid_step
    );

    let resampled = core.resample(fields)?;

    info!("Joining resampled time steps");
    let series = series::concatenate(&resampled)?;
    drop(resampled);

    info!("Writing output to {}", core.config.output.path.display());
    output::save_series(&series, &core.config.output.path)?;

    Ok(())
}

/// Structure containing run parameters.
///
/// To run the resampling the configuration needs to be loaded
/// and resources set up, which is then stored in this structure.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: Option<ThreadPool>,
}

impl Core {
    /// Run [`Core`] constructor.
    ///
    /// Before the resampling can start (and to run it safely),
    /// configuration provided by the user must be loaded and checked.
    pub fn new(config_path: &Path) -> Result<Self, RegridError> {
        debug!("Reading configuration from {}", config_path.display());
        let config = Config::new_from_file(config_path)?;

        debug!("Setting memory limit");
        let memory_limit = config.resources.memory;
        ALLOCATOR
            .set_limit(memory_limit.saturating_mul(1024 * 1024))
            .map_err(|_| RegridError::MemoryLimit(memory_limit))?;

        // a single thread runs the plain sequential loop
        let threadpool = if config.resources.threads > 1 {
            debug!("Setting up ThreadPool");
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(config.resources.threads as usize)
                    .stack_size(2 * 1024 * 1024)
                    .build()?,
            )
        } else {
            None
        };

        Ok(Core { config, threadpool })
    }

    /// Resamples all fields with configured settings,
    /// reporting progress in the terminal.
    pub fn resample(&self, fields: Vec<SourceField>) -> Result<Vec<ResampledField>, RegridError> {
        let settings = &self.config.resampling;

        let steps_bar = ProgressBar::new(fields.len() as u64);
        steps_bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .progress_chars("#>-"),
        );
        steps_bar.set_prefix("Resampled time steps");

        let resampled = match &self.threadpool {
            Some(threadpool) => series::resample_series_parallel(
                Arc::new(fields),
                settings.grid_step,
                settings.method,
                settings.grid_policy,
                threadpool,
                Some(&steps_bar),
            ),
            None => series::resample_series_with_progress(
                &fields,
                settings.grid_step,
                settings.method,
                settings.grid_policy,
                Some(&steps_bar),
            ),
        };

        match resampled {
            Ok(resampled) => {
                steps_bar.finish_with_message("All time steps resampled");
                Ok(resampled)
            }
            Err(err) => {
                steps_bar.abandon();
                Err(err.into())
            }
        }
    }
}

/// Format of input and output files, recognised
/// by the (case-insensitive) file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    NetCdf,
    Csv,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();

        if NETCDF_EXTENSIONS.contains(&extension.as_str()) {
            Some(FileFormat::NetCdf)
        } else if CSV_EXTENSIONS.contains(&extension.as_str()) {
            Some(FileFormat::Csv)
        } else {
            None
        }
    }
}
