//! Connected-component labelling and per-region statistics.

use super::{for_each_neighbor, neighbor_offsets};
use crate::image::{Grid, Image};
use crate::util::{FftRegError, FftRegResult};

/// Label image: `0` is background, regions are numbered `1..=count`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap<const D: usize> {
    size: [usize; D],
    labels: Vec<u32>,
    count: u32,
}

impl<const D: usize> LabelMap<D> {
    /// Buffer shape.
    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Per-pixel labels, axis 0 fastest.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Number of regions.
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Summary of one labelled region.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionStats<const D: usize> {
    pub label: u32,
    pub count: usize,
    /// Mean pixel value over the region.
    pub mean: f64,
    /// Bounding box, inclusive.
    pub min: [usize; D],
    pub max: [usize; D],
}

impl<const D: usize> RegionStats<D> {
    /// Bounding box centre as a continuous index, measured from pixel corners.
    pub fn bounding_box_center(&self) -> [f64; D] {
        std::array::from_fn(|i| 0.5 * (self.min[i] + self.max[i]) as f64 + 0.5)
    }
}

/// Labels the fully connected components of `mask`.
///
/// Labels follow the raster order (axis 0 fastest) of each component's
/// first pixel.
pub fn label_components<const D: usize>(
    mask: &[bool],
    size: [usize; D],
) -> FftRegResult<LabelMap<D>> {
    let grid = Grid::new(size)?;
    let total = grid.num_pixels();
    if mask.len() != total {
        return Err(FftRegError::SizeMismatch {
            expected: vec![total],
            got: vec![mask.len()],
        });
    }

    let strides = grid.strides();
    let offsets = neighbor_offsets::<D>();

    let mut labels = vec![0u32; total];
    let mut count = 0u32;
    let mut stack = Vec::new();
    for seed in 0..total {
        if !mask[seed] || labels[seed] != 0 {
            continue;
        }
        count += 1;
        labels[seed] = count;
        stack.push(seed);
        while let Some(p) = stack.pop() {
            let index = grid.index_of(p);
            for_each_neighbor(&size, &strides, &index, &offsets, |q| {
                if mask[q] && labels[q] == 0 {
                    labels[q] = count;
                    stack.push(q);
                }
            });
        }
    }

    Ok(LabelMap {
        size,
        labels,
        count,
    })
}

/// Pixel count, mean value and bounding box of every region, in label order.
pub fn label_statistics<const D: usize>(
    image: &Image<D>,
    labels: &LabelMap<D>,
) -> FftRegResult<Vec<RegionStats<D>>> {
    if image.size() != labels.size() {
        return Err(FftRegError::SizeMismatch {
            expected: image.size().to_vec(),
            got: labels.size().to_vec(),
        });
    }

    let mut sums = vec![0.0f64; labels.count() as usize];
    let mut stats: Vec<RegionStats<D>> = (1..=labels.count())
        .map(|label| RegionStats {
            label,
            count: 0,
            mean: 0.0,
            min: [usize::MAX; D],
            max: [0; D],
        })
        .collect();

    for (linear, (&label, &value)) in labels.labels().iter().zip(image.data()).enumerate() {
        if label == 0 {
            continue;
        }
        let slot = (label - 1) as usize;
        let index = image.grid().index_of(linear);
        let region = &mut stats[slot];
        region.count += 1;
        sums[slot] += f64::from(value);
        for axis in 0..D {
            region.min[axis] = region.min[axis].min(index[axis]);
            region.max[axis] = region.max[axis].max(index[axis]);
        }
    }

    for (region, sum) in stats.iter_mut().zip(sums) {
        region.mean = sum / region.count.max(1) as f64;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::{label_components, label_statistics};
    use crate::image::{Grid, Image};

    #[test]
    fn labels_follow_raster_order() {
        // x fastest:
        // . . . # .
        // # . . . .
        // # . # # .
        #[rustfmt::skip]
        let mask = [
            false, false, false, true, false,
            true, false, false, false, false,
            true, false, true, true, false,
        ];
        let map = label_components(&mask, [5, 3]).unwrap();
        assert_eq!(map.count(), 3);
        assert_eq!(map.labels()[3], 1);
        assert_eq!(map.labels()[5], 2);
        assert_eq!(map.labels()[10], 2);
        assert_eq!(map.labels()[12], 3);
        assert_eq!(map.labels()[13], 3);
    }

    #[test]
    fn diagonal_pixels_are_connected() {
        let mask = [true, false, false, true];
        let map = label_components(&mask, [2, 2]).unwrap();
        assert_eq!(map.count(), 1);
    }

    #[test]
    fn rejects_wrong_mask_length() {
        assert!(label_components(&[true; 5], [2, 2]).is_err());
    }

    #[test]
    fn statistics_cover_each_region() {
        let img = Image::from_fn(Grid::new([4, 4]).unwrap(), |[x, y]| (x + 4 * y) as f32);
        let mask: Vec<bool> = (0..16).map(|i| i == 0 || i == 1 || i == 15).collect();
        let map = label_components(&mask, [4, 4]).unwrap();
        let stats = label_statistics(&img, &map).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].mean, 0.5);
        assert_eq!(stats[0].min, [0, 0]);
        assert_eq!(stats[0].max, [1, 0]);
        assert_eq!(stats[0].bounding_box_center(), [1.0, 0.5]);
        assert_eq!(stats[1].label, 2);
        assert_eq!(stats[1].mean, 15.0);
        assert_eq!(stats[1].bounding_box_center(), [3.5, 3.5]);
    }
}
