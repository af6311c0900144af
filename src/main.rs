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

//! ERA5 Regrid resamples gridded reanalysis fields (such as ERA5
//! surface variables) from their native latitude-longitude grid
//! onto a finer regular grid.
//!
//! Every time step of the input is resampled on its own, with
//! bilinear or nearest-neighbour interpolation, and the resampled
//! steps are then joined back into one time series written to disk.
//!
//! The program is configured with a YAML file, by default `config.yaml`
//! in the working directory. Its path can be passed as the only argument.

mod constants;
mod errors;
mod regrid;

#[cfg(test)]
mod super_tests;

use cap::Cap;
use env_logger::Env;
use log::{error, info};
use std::{alloc, env, path::PathBuf};

type Float = f64;

/// Global allocator used by the program.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling
/// when a very small grid step produces an enormous target grid.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
/// Prepares the runtime environment and calls the [`regrid::main`].
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("REGRID_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("REGRID_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    let config_path = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(constants::DEFAULT_CONFIG_PATH), PathBuf::from);

    match regrid::main(&config_path) {
        Ok(_) => info!("Resampling finished. Check the output file and log."),
        Err(err) => {
            error!("Resampling failed with error: {}", err);
            std::process::exit(1);
        }
    }
}
