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

//! Module containg methods for conducting
//! binary search (bisection) of the grid cell
//! enclosing searched values.

use crate::errors::SearchError;

/// Core bisection function, an implementation of binary search
/// for the first element of ascending `array` not smaller than `x`.
///
/// Values outside of `[first, last]` are reported as out of bounds
/// (so are values not comparable with array items, like NaN).
fn binary_search<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    let (first, last) = match (array.first(), array.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SearchError::EmptyArray),
    };

    if !(first <= x && x <= last) {
        return Err(SearchError::OutOfBounds);
    }

    let mut lo = 0;
    let mut hi = array.len() - 1;

    while lo < hi {
        let mid = (lo + hi) / 2;

        if array[mid] >= *x {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    Ok(lo)
}

/// Finds index `i` of the cell `[array[i], array[i + 1]]` of ascending
/// `array` enclosing `x`. Boundary values belong to the outermost cells,
/// interior nodes to the cell on their left.
pub fn find_enclosing_cell<T: PartialOrd>(array: &[T], x: &T) -> Result<usize, SearchError> {
    if array.len() < 2 {
        return Err(SearchError::EmptyArray);
    }

    let found_index = binary_search(array, x)?;

    Ok(found_index.saturating_sub(1))
}
