//! Regional maxima detection with full connectivity.

use super::{for_each_neighbor, neighbor_offsets};
use crate::image::Image;

/// Marks every pixel that belongs to a regional maximum.
///
/// A plateau (connected set of equal pixels) is a regional maximum when all
/// of its outside neighbours are strictly lower and it has at least one.
/// NaN pixels are never maxima and are ignored as neighbours.
pub fn regional_maxima<const D: usize>(image: &Image<D>) -> Vec<bool> {
    let size = image.size();
    let strides = image.grid().strides();
    let data = image.data();
    let offsets = neighbor_offsets::<D>();

    let mut visited = vec![false; data.len()];
    let mut maxima = vec![false; data.len()];
    let mut plateau = Vec::new();
    let mut stack = Vec::new();

    for seed in 0..data.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let value = data[seed];
        if value.is_nan() {
            continue;
        }

        plateau.clear();
        stack.push(seed);
        let mut has_higher = false;
        let mut has_lower = false;
        while let Some(p) = stack.pop() {
            plateau.push(p);
            let index = image.grid().index_of(p);
            for_each_neighbor(&size, &strides, &index, &offsets, |q| {
                let v = data[q];
                if v == value {
                    if !visited[q] {
                        visited[q] = true;
                        stack.push(q);
                    }
                } else if v > value {
                    has_higher = true;
                } else if v < value {
                    has_lower = true;
                }
            });
        }

        if !has_higher && has_lower {
            for &p in &plateau {
                maxima[p] = true;
            }
        }
    }
    maxima
}
