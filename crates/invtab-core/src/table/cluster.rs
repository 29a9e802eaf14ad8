//! Greedy row clustering of detected regions.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::models::config::ClusterConfig;

use super::{Region, Row};

/// Pixel thresholds derived from one image's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterThresholds {
    /// Regions with area at or below this are discarded.
    pub min_area: u64,
    /// Regions with width at or below this are discarded.
    pub min_width: u32,
    /// Regions with height at or below this are discarded.
    pub min_height: u32,
    /// Maximum `y` step between consecutive regions of the same row.
    pub y_tolerance: u32,
}

impl ClusterThresholds {
    /// Derive thresholds for an image of the given size.
    pub fn for_image(config: &ClusterConfig, width: u32, height: u32) -> Self {
        let area = width as u64 * height as u64;
        Self {
            min_area: area / config.min_area_divisor.max(1) as u64,
            min_width: width / config.min_width_divisor.max(1),
            min_height: height / config.min_height_divisor.max(1),
            y_tolerance: height / config.row_tolerance_divisor.max(1),
        }
    }

    fn keeps(&self, region: &Region) -> bool {
        region.area() > self.min_area
            && region.width > self.min_width
            && region.height > self.min_height
    }
}

/// Groups unordered regions into top-to-bottom rows of left-to-right columns.
#[derive(Debug, Clone, Default)]
pub struct RowClusterer {
    config: ClusterConfig,
}

impl RowClusterer {
    /// Create a clusterer with the given configuration.
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Cluster regions detected in an image of `image_size` (width, height).
    ///
    /// Regions are filtered by size, padded, sorted by `y`, and assigned to rows
    /// greedily: a region joins the current row when its `y` is within the
    /// tolerance of the previous region's `y`.
    pub fn cluster(&self, regions: Vec<Region>, image_size: (u32, u32)) -> Vec<Row> {
        let (width, height) = image_size;
        let thresholds = ClusterThresholds::for_image(&self.config, width, height);
        let total = regions.len();

        let mut cells: Vec<Region> = regions
            .into_iter()
            .filter(|r| thresholds.keeps(r))
            .map(|r| r.padded(self.config.padding, width, height))
            .collect();

        debug!(
            "Clustering {} of {} regions (min area {}, min size {}x{}, y tolerance {})",
            cells.len(),
            total,
            thresholds.min_area,
            thresholds.min_width,
            thresholds.min_height,
            thresholds.y_tolerance
        );

        cells.sort_by(vertical_order);

        let mut rows = Vec::new();
        let mut iter = cells.into_iter();
        let Some(first) = iter.next() else {
            return rows;
        };

        let mut prev_y = first.y;
        let mut current = Row {
            y: first.y,
            regions: vec![first],
        };

        for region in iter {
            if region.y - prev_y > thresholds.y_tolerance {
                trace!("Closing row at y={} with {} cells", current.y, current.len());
                rows.push(close_row(current));
                current = Row {
                    y: region.y,
                    regions: Vec::new(),
                };
            }
            prev_y = region.y;
            current.regions.push(region);
        }
        rows.push(close_row(current));

        debug!("Clustered into {} rows", rows.len());
        rows
    }
}

fn close_row(mut row: Row) -> Row {
    row.regions.sort_by(horizontal_order);
    row
}

/// Total order by `y` first; remaining keys only break ties.
fn vertical_order(a: &Region, b: &Region) -> Ordering {
    (a.y, a.x, a.width, a.height, &a.text).cmp(&(b.y, b.x, b.width, b.height, &b.text))
}

/// Total order by `x` first; remaining keys only break ties.
fn horizontal_order(a: &Region, b: &Region) -> Ordering {
    (a.x, a.y, a.width, a.height, &a.text).cmp(&(b.x, b.y, b.width, b.height, &b.text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const IMAGE: (u32, u32) = (1000, 1000);

    fn clusterer() -> RowClusterer {
        RowClusterer::new(ClusterConfig {
            min_area_divisor: 10_000,
            min_width_divisor: 100,
            min_height_divisor: 100,
            row_tolerance_divisor: 100,
            padding: 0,
        })
    }

    fn cell(x: u32, y: u32, text: &str) -> Region {
        Region::new(x, y, 50, 20).with_text(text)
    }

    #[test]
    fn test_thresholds_scale_with_image() {
        let t = ClusterThresholds::for_image(&ClusterConfig::default(), 2000, 2800);
        assert_eq!(t.min_area, 1120);
        assert_eq!(t.min_width, 40);
        assert_eq!(t.min_height, 20);
        assert_eq!(t.y_tolerance, 11);
    }

    #[test]
    fn test_empty_input() {
        assert!(clusterer().cluster(Vec::new(), IMAGE).is_empty());
    }

    #[test]
    fn test_single_region() {
        let rows = clusterer().cluster(vec![cell(10, 10, "a")], IMAGE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].texts(), vec!["a"]);
    }

    #[test]
    fn test_small_regions_filtered() {
        let regions = vec![
            Region::new(0, 0, 10, 50),   // too narrow
            Region::new(0, 100, 50, 10), // too short
            Region::new(0, 200, 11, 11),
        ];
        let rows = clusterer().cluster(regions, IMAGE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].regions[0].y, 200);
    }

    #[test]
    fn test_rows_and_columns_ordered() {
        let regions = vec![
            cell(300, 105, "r2c3"),
            cell(10, 12, "r1c1"),
            cell(200, 100, "r2c2"),
            cell(100, 10, "r1c2"),
            cell(5, 108, "r2c1"),
        ];
        let rows = clusterer().cluster(regions, IMAGE);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].texts(), vec!["r1c1", "r1c2"]);
        assert_eq!(rows[1].texts(), vec!["r2c1", "r2c2", "r2c3"]);
        assert!(rows[0].y < rows[1].y);
    }

    #[test]
    fn test_tolerance_compares_previous_region_not_row_start() {
        // Each step is within tolerance (10px), so the drift chains into one row.
        let regions = vec![cell(0, 0, "a"), cell(60, 8, "b"), cell(120, 16, "c"), cell(180, 24, "d")];
        let rows = clusterer().cluster(regions, IMAGE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 4);
    }

    #[test]
    fn test_order_independent() {
        let regions = vec![
            cell(300, 205, "f"),
            cell(10, 12, "a"),
            cell(200, 200, "e"),
            cell(100, 10, "b"),
            cell(5, 208, "d"),
            cell(400, 11, "c"),
            cell(10, 12, "a2"),
        ];
        let expected = clusterer().cluster(regions.clone(), IMAGE);

        let mut reversed = regions.clone();
        reversed.reverse();
        assert_eq!(clusterer().cluster(reversed, IMAGE), expected);

        let mut rotated = regions;
        rotated.rotate_left(3);
        assert_eq!(clusterer().cluster(rotated, IMAGE), expected);
    }

    #[test]
    fn test_padding_applied() {
        let clusterer = RowClusterer::new(ClusterConfig {
            padding: 3,
            ..clusterer().config
        });
        let rows = clusterer.cluster(vec![cell(10, 10, "a")], IMAGE);
        let region = &rows[0].regions[0];
        assert_eq!((region.x, region.y, region.width, region.height), (7, 7, 56, 26));
    }
}
