// SPDX-License-Identifier: MPL-2.0

//! Merging of overlapping sliding-window hits

/// Axis-aligned rectangle in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Clip to a `width`×`height` image; `None` when nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(width as i32);
        let y1 = self.bottom().min(height as i32);
        (x1 > x0 && y1 > y0).then_some(Region {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Whether two candidates belong to the same object
fn similar(a: &Region, b: &Region, eps: f32) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f32 * 0.5;
    (a.x - b.x).abs() as f32 <= delta
        && (a.y - b.y).abs() as f32 <= delta
        && (a.right() - b.right()).abs() as f32 <= delta
        && (a.bottom() - b.bottom()).abs() as f32 <= delta
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Cluster similar rectangles, keep clusters with more than `min_neighbors`
/// members, and drop clusters nested inside a stronger one.
///
/// With `min_neighbors == 0` the input is returned untouched.
pub fn group_regions(regions: Vec<Region>, min_neighbors: usize, eps: f32) -> Vec<Region> {
    if min_neighbors == 0 || regions.is_empty() {
        return regions;
    }

    let n = regions.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if similar(&regions[i], &regions[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    // Accumulate per cluster: (sum x, sum y, sum w, sum h, count)
    let mut sums: Vec<(i64, i64, i64, i64, usize)> = vec![(0, 0, 0, 0, 0); n];
    for (i, r) in regions.iter().enumerate() {
        let root = find(&mut parent, i);
        let s = &mut sums[root];
        s.0 += r.x as i64;
        s.1 += r.y as i64;
        s.2 += r.width as i64;
        s.3 += r.height as i64;
        s.4 += 1;
    }

    let clusters: Vec<(Region, usize)> = sums
        .into_iter()
        .filter(|s| s.4 > 0)
        .map(|(x, y, w, h, count)| {
            let c = count as f64;
            let avg = |v: i64| (v as f64 / c).round() as i32;
            (
                Region {
                    x: avg(x),
                    y: avg(y),
                    width: avg(w),
                    height: avg(h),
                },
                count,
            )
        })
        .collect();

    clusters
        .iter()
        .enumerate()
        .filter(|(_, (_, count))| *count > min_neighbors)
        .filter(|(i, (r1, n1))| {
            !clusters.iter().enumerate().any(|(j, (r2, n2))| {
                if j == *i || *n2 <= min_neighbors {
                    return false;
                }
                let dx = (r2.width as f32 * eps).round() as i32;
                let dy = (r2.height as f32 * eps).round() as i32;
                let inside = r1.x >= r2.x - dx
                    && r1.y >= r2.y - dy
                    && r1.right() <= r2.right() + dx
                    && r1.bottom() <= r2.bottom() + dy;
                inside && (*n2 > (*n1).max(3) || *n1 < 3)
            })
        })
        .map(|(_, (r, _))| *r)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: i32, y: i32, w: i32, h: i32) -> Region {
        Region {
            x,
            y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_cluster_needs_enough_neighbours() {
        let hits = vec![r(10, 10, 40, 40), r(11, 10, 40, 40), r(10, 12, 41, 40)];
        assert_eq!(group_regions(hits.clone(), 2, 0.2).len(), 1);
        assert!(group_regions(hits, 3, 0.2).is_empty());
    }

    #[test]
    fn test_cluster_average() {
        let hits = vec![r(10, 10, 40, 40), r(12, 12, 40, 40)];
        assert_eq!(group_regions(hits, 1, 0.2), vec![r(11, 11, 40, 40)]);
    }

    #[test]
    fn test_separate_objects_stay_apart() {
        let mut hits = Vec::new();
        for d in 0..3 {
            hits.push(r(10 + d, 10, 30, 30));
            hits.push(r(200 + d, 150, 30, 30));
        }
        assert_eq!(group_regions(hits, 2, 0.2).len(), 2);
    }

    #[test]
    fn test_zero_neighbours_passthrough() {
        let hits = vec![r(0, 0, 5, 5), r(1, 1, 5, 5)];
        assert_eq!(group_regions(hits.clone(), 0, 0.2), hits);
    }

    #[test]
    fn test_clamp_to() {
        assert_eq!(r(-5, -5, 10, 10).clamp_to(20, 20), Some(r(0, 0, 5, 5)));
        assert_eq!(r(30, 30, 10, 10).clamp_to(20, 20), None);
    }
}
