use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of one k-means run.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub centroids: Array2<f32>,
    pub counts: Vec<usize>,
    pub inertia: f32,
}

impl Clustering {
    #[inline]
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// Populated centroids paired with their population, most populated first.
    pub fn ranked(&self) -> Vec<(ArrayView1<'_, f32>, usize)> {
        let mut order: Vec<usize> = (0..self.k()).filter(|&i| self.counts[i] > 0).collect();
        order.sort_by(|&a, &b| self.counts[b].cmp(&self.counts[a]));

        order
            .into_iter()
            .map(|i| (self.centroids.row(i), self.counts[i]))
            .collect()
    }
}

#[inline]
fn sq_dist(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Number of distinct rows, counting stops once `limit` is reached.
pub fn distinct_rows(data: ArrayView2<'_, f32>, limit: usize) -> usize {
    let mut seen = HashSet::new();

    for row in data.rows() {
        seen.insert(row.iter().map(|v| v.to_bits()).collect::<Vec<u32>>());

        if seen.len() >= limit {
            break;
        }
    }

    seen.len()
}

/// Index whose running weight sum first reaches `target`, skipping zero weights.
/// Falls back to the last positive weight when rounding leaves the sum short of `target`.
fn weighted_pick(weights: ArrayView1<'_, f32>, target: f32) -> usize {
    let mut acc = 0.0;
    let mut last_positive = 0;

    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 {
            acc += w;
            last_positive = i;

            if acc >= target {
                return i;
            }
        }
    }

    last_positive
}

#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    pub max_iterations: usize,
    pub seed: u64,
}

impl KMeans {
    pub fn new(max_iterations: usize, seed: u64) -> Self {
        Self {
            max_iterations,
            seed,
        }
    }

    fn seed_centroids(&self, data: ArrayView2<'_, f32>, k: usize) -> Option<Array2<f32>> {
        let n = data.nrows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut chosen = vec![rng.gen_range(0..n)];
        let mut d2: Array1<f32> = data
            .rows()
            .into_iter()
            .map(|row| sq_dist(row, data.row(chosen[0])))
            .collect();

        while chosen.len() < k {
            let total: f32 = d2.sum();
            if total <= 0.0 {
                return None;
            }

            let next = weighted_pick(d2.view(), rng.gen::<f32>() * total);
            chosen.push(next);

            let centre = data.row(next);
            for (i, row) in data.rows().into_iter().enumerate() {
                d2[i] = d2[i].min(sq_dist(row, centre));
            }
        }

        Some(data.select(Axis(0), &chosen))
    }

    /// Lloyd iterations from a k-means++ start. `None` when the data has fewer than `k` distinct rows.
    pub fn fit(&self, data: ArrayView2<'_, f32>, k: usize) -> Option<Clustering> {
        let (n, dims) = data.dim();
        if k == 0 || n < k {
            return None;
        }

        let mut centroids = self.seed_centroids(data, k)?;
        let mut labels = vec![usize::MAX; n];

        for _ in 0..self.max_iterations.max(1) {
            let mut changed = false;

            for (i, row) in data.rows().into_iter().enumerate() {
                let mut best = 0;
                let mut best_dist = f32::INFINITY;

                for (c, centre) in centroids.rows().into_iter().enumerate() {
                    let d = sq_dist(row, centre);
                    if d < best_dist {
                        best = c;
                        best_dist = d;
                    }
                }

                if labels[i] != best {
                    labels[i] = best;
                    changed = true;
                }
            }

            if !changed {
                break;
            }

            let mut sums = Array2::<f64>::zeros((k, dims));
            let mut counts = vec![0usize; k];

            for (row, &label) in data.rows().into_iter().zip(labels.iter()) {
                counts[label] += 1;
                for (acc, &v) in sums.row_mut(label).iter_mut().zip(row.iter()) {
                    *acc += v as f64;
                }
            }

            for (c, &count) in counts.iter().enumerate() {
                // an emptied cluster keeps its previous centre
                if count > 0 {
                    for (dst, &sum) in centroids.row_mut(c).iter_mut().zip(sums.row(c).iter()) {
                        *dst = (sum / count as f64) as f32;
                    }
                }
            }
        }

        let mut counts = vec![0usize; k];
        let mut inertia = 0.0f64;

        for (row, &label) in data.rows().into_iter().zip(labels.iter()) {
            counts[label] += 1;
            inertia += sq_dist(row, centroids.row(label)) as f64;
        }

        Some(Clustering {
            centroids,
            counts,
            inertia: inertia as f32,
        })
    }
}

/// Chooses the cluster count by the elbow of the inertia curve.
#[derive(Debug, Clone, Copy)]
pub struct ElbowSearch {
    pub min_clusters: usize,
    pub max_clusters: usize,
    /// Inertia gain, as a fraction of the inertia at `min_clusters`, under which one more cluster is rejected.
    pub threshold: f32,
}

impl ElbowSearch {
    /// Runs k-means for each admissible k and returns the clustering at the elbow.
    /// `None` when no k in range can be fitted.
    pub fn run(&self, kmeans: &KMeans, data: ArrayView2<'_, f32>) -> Option<Clustering> {
        if data.nrows() < self.min_clusters.max(1) {
            return None;
        }

        let max_k = self
            .max_clusters
            .min(distinct_rows(data, self.max_clusters));

        let mut fits = Vec::new();
        for k in self.min_clusters.max(1)..=max_k {
            match kmeans.fit(data, k) {
                Some(fit) => fits.push(fit),
                None => break,
            }
        }

        // gains are measured against the inertia of the smallest k
        let base = fits.first().map(|f| f.inertia).unwrap_or(0.0);
        let best = fits
            .windows(2)
            .position(|pair| {
                let gain = if base > 0.0 {
                    (pair[0].inertia - pair[1].inertia) / base
                } else {
                    0.0
                };

                gain < self.threshold
            })
            .unwrap_or_else(|| fits.len().saturating_sub(1));

        if fits.is_empty() {
            None
        } else {
            Some(fits.swap_remove(best))
        }
    }
}
