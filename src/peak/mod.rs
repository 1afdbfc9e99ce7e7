//! Peak extraction from a correlation surface.
//!
//! Regional maxima are grouped into connected regions, summarised, and the
//! region with the highest mean value wins.

mod label;
mod maxima;

pub use label::{label_components, label_statistics, LabelMap, RegionStats};
pub use maxima::regional_maxima;

use crate::util::{FftRegError, FftRegResult};

/// Region with the highest mean; the first one in label order wins ties.
///
/// Regions with a non-finite mean are skipped unless nothing else remains.
pub fn select_peak<const D: usize>(stats: &[RegionStats<D>]) -> FftRegResult<&RegionStats<D>> {
    let mut best: Option<&RegionStats<D>> = None;
    for region in stats {
        best = match best {
            None => Some(region),
            Some(current) if beats(region.mean, current.mean) => Some(region),
            keep => keep,
        };
    }
    best.ok_or(FftRegError::NoPeakFound)
}

fn beats(candidate: f64, current: f64) -> bool {
    if !candidate.is_finite() {
        return false;
    }
    !current.is_finite() || candidate > current
}

/// Offsets to all `3^D - 1` neighbours.
pub(crate) fn neighbor_offsets<const D: usize>() -> Vec<[isize; D]> {
    let count = 3usize.pow(D as u32);
    let mut offsets = Vec::with_capacity(count - 1);
    for code in 0..count {
        let mut rest = code;
        let mut offset = [0isize; D];
        for o in offset.iter_mut() {
            *o = (rest % 3) as isize - 1;
            rest /= 3;
        }
        if offset.iter().any(|&o| o != 0) {
            offsets.push(offset);
        }
    }
    offsets
}

/// Calls `f` with the linear index of every in-bounds neighbour of `index`.
pub(crate) fn for_each_neighbor<const D: usize>(
    size: &[usize; D],
    strides: &[usize; D],
    index: &[usize; D],
    offsets: &[[isize; D]],
    mut f: impl FnMut(usize),
) {
    'offsets: for offset in offsets {
        let mut linear = 0usize;
        for axis in 0..D {
            let i = index[axis] as isize + offset[axis];
            if i < 0 || i >= size[axis] as isize {
                continue 'offsets;
            }
            linear += i as usize * strides[axis];
        }
        f(linear);
    }
}

#[cfg(test)]
mod tests {
    use super::{neighbor_offsets, select_peak, RegionStats};
    use crate::util::FftRegError;

    fn region(label: u32, mean: f64) -> RegionStats<2> {
        RegionStats {
            label,
            count: 1,
            mean,
            min: [0, 0],
            max: [0, 0],
        }
    }

    #[test]
    fn neighbor_count_matches_dimension() {
        assert_eq!(neighbor_offsets::<2>().len(), 8);
        assert_eq!(neighbor_offsets::<3>().len(), 26);
    }

    #[test]
    fn highest_mean_wins() {
        let stats = [region(1, 0.2), region(2, 0.9), region(3, 0.5)];
        assert_eq!(select_peak(&stats).unwrap().label, 2);
    }

    #[test]
    fn ties_keep_first_label() {
        let stats = [region(1, 0.1), region(2, 0.7), region(3, 0.7)];
        assert_eq!(select_peak(&stats).unwrap().label, 2);
    }

    #[test]
    fn nan_never_wins() {
        let stats = [region(1, f64::NAN), region(2, -0.3)];
        assert_eq!(select_peak(&stats).unwrap().label, 2);
    }

    #[test]
    fn empty_is_error() {
        let stats: [RegionStats<2>; 0] = [];
        assert_eq!(select_peak(&stats), Err(FftRegError::NoPeakFound));
    }
}
