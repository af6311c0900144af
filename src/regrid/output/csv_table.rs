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

//! Sub-module writing the resampled series as a CSV table
//! in the long layout (one row per cell and time step).

use crate::{constants::OUTPUT_TIME_FORMAT, errors::OutputError, regrid::grid::ResampledSeries};
use std::path::Path;

/// Writes the series as `time,latitude,longitude,<variable>` rows
/// ordered by time, then latitude, then longitude.
pub(super) fn save_series(series: &ResampledSeries, out_path: &Path) -> Result<(), OutputError> {
    let mut out_file = csv::Writer::from_path(out_path)?;

    out_file.write_record(&["time", "latitude", "longitude", series.variable.as_str()])?;

    for (t, time) in series.times.iter().enumerate() {
        let time_stamp = time.format(OUTPUT_TIME_FORMAT).to_string();

        for (i, lat) in series.latitude.iter().enumerate() {
            for (j, lon) in series.longitude.iter().enumerate() {
                out_file.write_record(&[
                    time_stamp.clone(),
                    lat.to_string(),
                    lon.to_string(),
                    series.values[[t, i, j]].to_string(),
                ])?;
            }
        }
    }

    out_file.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::save_series;
    use crate::regrid::{
        grid::tests::hour,
        input::{read_file, tests::temp_file},
        output::tests::series,
    };
    use ndarray::array;
    use std::fs;

    #[test]
    fn written_series_reads_back() {
        let path = temp_file("written", "resampled.csv", "");
        let series = series();

        save_series(&series, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("time,latitude,longitude,t2m"));
        assert_eq!(lines.next(), Some("2020-01-01 00:00:00,10,20,1"));
        assert_eq!(content.lines().count(), 13);

        let fields = read_file(&path, None).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].time, hour(6));
        assert_eq!(fields[1].latitude, series.latitude);
        assert_eq!(fields[1].longitude, series.longitude);
        assert_eq!(fields[1].values, array![[7.0, 8.0, 9.0], [10.0, 11.0, 12.5]]);
    }
}
