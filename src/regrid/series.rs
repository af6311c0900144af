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

//! Module resampling whole time series of fields
//! and joining resampled steps back along the time axis.
//!
//! Each time step is resampled independently of the others,
//! so the steps can be processed in any order or in parallel.
//! Results are always collected by their original index
//! and returned in input order.

use super::grid::{
    axis::GridPolicy, interpolation::Method, resample_field, AxisName, ResampledField,
    ResampledSeries, SourceField,
};
use crate::{
    errors::{ConfigError, GridError, MergeError, ResampleError},
    Float,
};
use indicatif::ProgressBar;
use log::debug;
use ndarray::{stack, Array1, Axis};
use rayon::ThreadPool;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc, Arc,
};

/// Checks that the grid step can be used to build target axes.
pub fn check_step(step: Float) -> Result<(), ConfigError> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidStep(step))
    }
}

/// Resamples every field of the series onto the regular grid
/// with spacing `target_step`, one time step after another.
///
/// Stops at the first failing time step.
pub fn resample_series(
    source_fields: &[SourceField],
    target_step: Float,
    method: Method,
    policy: GridPolicy,
) -> Result<Vec<ResampledField>, ResampleError> {
    resample_series_with_progress(source_fields, target_step, method, policy, None)
}

pub(super) fn resample_series_with_progress(
    source_fields: &[SourceField],
    target_step: Float,
    method: Method,
    policy: GridPolicy,
    progress: Option<&ProgressBar>,
) -> Result<Vec<ResampledField>, ResampleError> {
    check_step(target_step)?;

    let mut resampled = Vec::with_capacity(source_fields.len());

    for (index, field) in source_fields.iter().enumerate() {
        debug!("Resampling time step {} ({})", index, field.time);

        let result = resample_field(field, target_step, method, policy);
        resampled.push(tag_step_error(result, index, field)?);

        if let Some(bar) = progress {
            bar.inc(1);
        }
    }

    Ok(resampled)
}

/// Outcome of one time step run on the thread pool.
#[derive(Debug)]
enum StepOutcome {
    Done(Result<ResampledField, GridError>),
    Skipped,
}

/// Resamples the series like [`resample_series`], but spreads
/// time steps over the threads of `threadpool`.
///
/// Results are put into slots indexed by the original time step
/// index, so the output order and the reported error (the one of
/// the earliest failing step) do not depend on thread scheduling.
///
/// Once a step fails, steps with a greater index which have not
/// started yet are skipped. Steps with a smaller index still run,
/// as one of them may fail as well and take precedence.
pub fn resample_series_parallel(
    source_fields: Arc<Vec<SourceField>>,
    target_step: Float,
    method: Method,
    policy: GridPolicy,
    threadpool: &ThreadPool,
    progress: Option<&ProgressBar>,
) -> Result<Vec<ResampledField>, ResampleError> {
    check_step(target_step)?;

    let steps_count = source_fields.len();
    let first_failure = Arc::new(AtomicUsize::new(usize::MAX));
    let (tx, rx) = mpsc::channel();

    for index in 0..steps_count {
        let tx = tx.clone();
        let source_fields = Arc::clone(&source_fields);
        let first_failure = Arc::clone(&first_failure);

        threadpool.spawn(move || {
            let outcome = run_step(
                index,
                &source_fields[index],
                target_step,
                method,
                policy,
                &first_failure,
            );

            // receiver is only gone when collection below has already failed
            tx.send((index, outcome)).ok();
        });
    }

    drop(tx);

    let mut slots: Vec<Option<StepOutcome>> = (0..steps_count).map(|_| None).collect();

    for (index, outcome) in rx.iter() {
        slots[index] = Some(outcome);

        if let Some(bar) = progress {
            bar.inc(1);
        }
    }

    let mut resampled = Vec::with_capacity(steps_count);

    for (index, slot) in slots.into_iter().enumerate() {
        // skipped steps always follow a failed one, so they are never reached
        let result = match slot {
            Some(StepOutcome::Done(result)) => result,
            Some(StepOutcome::Skipped) | None => return Err(ResampleError::WorkerLost(index)),
        };

        resampled.push(tag_step_error(result, index, &source_fields[index])?);
    }

    Ok(resampled)
}

fn run_step(
    index: usize,
    field: &SourceField,
    target_step: Float,
    method: Method,
    policy: GridPolicy,
    first_failure: &AtomicUsize,
) -> StepOutcome {
    if index > first_failure.load(Ordering::Acquire) {
        debug!("Skipping time step {} after earlier failure", index);
        return StepOutcome::Skipped;
    }

    let result = resample_field(field, target_step, method, policy);

    if result.is_err() {
        first_failure.fetch_min(index, Ordering::AcqRel);
    }

    StepOutcome::Done(result)
}

fn tag_step_error(
    result: Result<ResampledField, GridError>,
    index: usize,
    field: &SourceField,
) -> Result<ResampledField, ResampleError> {
    result.map_err(|source| ResampleError::TimeStep {
        index,
        time: field.time,
        source,
    })
}

/// Joins resampled fields along the time axis.
///
/// All fields must be of the same variable and share
/// identical target latitude and longitude axes.
pub fn concatenate(resampled_fields: &[ResampledField]) -> Result<ResampledSeries, MergeError> {
    let reference = resampled_fields.first().ok_or(MergeError::EmptySeries)?;

    for (index, field) in resampled_fields.iter().enumerate() {
        if field.variable != reference.variable {
            return Err(MergeError::VariableMismatch {
                index,
                expected: reference.variable.clone(),
                found: field.variable.clone(),
            });
        }

        let expected = (field.latitude.len(), field.longitude.len());
        let found = field.values.dim();

        if expected != found {
            return Err(MergeError::ShapeMismatch {
                index,
                expected,
                found,
            });
        }

        check_same_axis(&reference.latitude, &field.latitude, index, AxisName::Latitude)?;
        check_same_axis(&reference.longitude, &field.longitude, index, AxisName::Longitude)?;
    }

    let views: Vec<_> = resampled_fields.iter().map(|f| f.values.view()).collect();
    let values = stack(Axis(0), &views).map_err(|err| MergeError::Stack(err.to_string()))?;

    Ok(ResampledSeries {
        variable: reference.variable.clone(),
        times: resampled_fields.iter().map(|f| f.time).collect(),
        latitude: reference.latitude.clone(),
        longitude: reference.longitude.clone(),
        values,
    })
}

fn check_same_axis(
    expected: &Array1<Float>,
    found: &Array1<Float>,
    index: usize,
    axis: AxisName,
) -> Result<(), MergeError> {
    let identical = expected.len() == found.len()
        && expected
            .iter()
            .zip(found.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits());

    if identical {
        Ok(())
    } else {
        Err(MergeError::GridMismatch {
            index,
            axis,
            expected: expected.len(),
            found: found.len(),
        })
    }
}
