//! This is a module for integration tests of the program,
//! but with access to private fields and methods.
//!
//! Each test writes a small input file and configuration
//! into a temporary directory and runs the whole resampling
//! as the binary would do.

use crate::{
    errors::{GridError, RegridError, ResampleError},
    regrid::{self, grid::tests::hour, input::read_file, input::tests::temp_file},
    Float,
};
use float_cmp::approx_eq;
use ndarray::array;
use std::path::{Path, PathBuf};

const SCENARIO: &str = "\
valid_time,latitude,longitude,swvl1
2020-01-01 00:00:00,12.0,20.0,3.0
2020-01-01 00:00:00,12.0,24.0,4.0
2020-01-01 00:00:00,10.0,20.0,1.0
2020-01-01 00:00:00,10.0,24.0,2.0
2020-01-01 06:00:00,12.0,20.0,30.0
2020-01-01 06:00:00,12.0,24.0,40.0
2020-01-01 06:00:00,10.0,20.0,10.0
2020-01-01 06:00:00,10.0,24.0,20.0
2020-01-01 19:00:00,12.0,20.0,0.0
2020-01-01 19:00:00,12.0,24.0,0.0
2020-01-01 19:00:00,10.0,20.0,0.0
2020-01-01 19:00:00,10.0,24.0,0.0
";

fn write_config(
    test_name: &str,
    input: &Path,
    output_name: &str,
    extra: &str,
) -> (PathBuf, PathBuf) {
    let output = input
        .parent()
        .map(|dir| dir.join("output").join(output_name))
        .unwrap();

    let config = format!(
        "input:\n  data_files: [\"{}\"]\n  exclude_hours: [19]\noutput:\n  path: \"{}\"\n  overwrite: true\n{}",
        input.display(),
        output.display(),
        extra
    );

    (temp_file(test_name, "config.yaml", &config), output)
}

#[test]
fn whole_run_resamples_and_writes_series() {
    let input = temp_file("run-sequential", "era5.csv", SCENARIO);
    let (config, output) = write_config(
        "run-sequential",
        &input,
        "resampled.csv",
        "resampling:\n  grid_step: 1.0\n",
    );

    regrid::main(&config).unwrap();

    let fields = read_file(&output, None).unwrap();

    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].time, hour(0));
    assert_eq!(fields[1].time, hour(6));
    assert_eq!(fields[0].variable, "swvl1");
    assert_eq!(fields[0].latitude, array![10.0, 11.0, 12.0]);
    assert_eq!(fields[0].longitude, array![20.0, 21.0, 22.0, 23.0, 24.0]);
    assert!(approx_eq!(Float, fields[0].values[[1, 2]], 2.5, ulps = 2));
    assert!(approx_eq!(Float, fields[1].values[[1, 2]], 25.0, ulps = 2));
}

#[test]
fn parallel_run_gives_same_output() {
    let sequential_input = temp_file("run-compare-seq", "era5.csv", SCENARIO);
    let (sequential_config, sequential_output) = write_config(
        "run-compare-seq",
        &sequential_input,
        "resampled.csv",
        "resampling:\n  grid_step: 0.3\n  method: nearest\n",
    );

    let parallel_input = temp_file("run-compare-par", "era5.csv", SCENARIO);
    let (parallel_config, parallel_output) = write_config(
        "run-compare-par",
        &parallel_input,
        "resampled.csv",
        "resampling:\n  grid_step: 0.3\n  method: nearest\nresources:\n  threads: 3\n",
    );

    regrid::main(&sequential_config).unwrap();
    regrid::main(&parallel_config).unwrap();

    assert_eq!(
        std::fs::read_to_string(sequential_output).unwrap(),
        std::fs::read_to_string(parallel_output).unwrap()
    );
}

#[test]
fn netcdf_output_matches_csv_output() {
    let input = temp_file("run-formats", "era5.csv", SCENARIO);
    let extra = "resampling:\n  grid_step: 0.5\n";
    let (csv_config, csv_output) = write_config("run-formats", &input, "resampled.csv", extra);

    let nc_input = temp_file("run-formats-nc", "era5.csv", SCENARIO);
    let (nc_config, nc_output) = write_config("run-formats-nc", &nc_input, "resampled.nc", extra);

    regrid::main(&csv_config).unwrap();
    regrid::main(&nc_config).unwrap();

    let from_csv = read_file(&csv_output, None).unwrap();
    let from_nc = read_file(&nc_output, None).unwrap();

    assert_eq!(from_nc.len(), 2);
    for (csv_field, nc_field) in from_csv.iter().zip(&from_nc) {
        assert_eq!(nc_field.variable, csv_field.variable);
        assert_eq!(nc_field.time, csv_field.time);
        assert_eq!(nc_field.latitude, csv_field.latitude);
        assert_eq!(nc_field.longitude, csv_field.longitude);

        for (a, b) in csv_field.values.iter().zip(nc_field.values.iter()) {
            assert!(approx_eq!(Float, *a, *b, epsilon = 1e-9));
        }
    }
}

#[test]
fn degenerate_input_stops_the_run() {
    let content = "\
time,latitude,longitude,t2m
2020-01-01 00:00:00,12.0,20.0,1.0
2020-01-01 00:00:00,12.0,24.0,2.0
";
    let input = temp_file("run-degenerate", "era5.csv", content);
    let (config, output) = write_config("run-degenerate", &input, "resampled.csv", "");

    let err = regrid::main(&config).unwrap_err();

    assert!(matches!(
        err,
        RegridError::Resample(ResampleError::TimeStep {
            index: 0,
            source: GridError::TooFewPoints { len: 1, .. },
            ..
        })
    ));
    assert!(!output.exists());
}
