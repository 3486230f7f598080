//! Product clustering: feature scaling plus seeded multi-init k-means

use super::aggregator::{product_totals, ProductTotals};
use super::normalizer::SaleRecord;
use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed seed: identical input + k must reproduce identical labels
const KMEANS_SEED: u64 = 42;
/// Random initializations; the lowest-inertia solution is kept
const KMEANS_RUNS: usize = 10;
const MAX_ITERATIONS: u64 = 300;
const TOLERANCE: f64 = 1e-4;
/// Feature vector width: quantity, revenue, mean unit price, sale count
const FEATURES: usize = 4;

/// One product with its aggregate features and assigned cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCluster {
    pub product: String,
    pub quantity: i64,
    pub revenue: f64,
    pub avg_unit_price: f64,
    pub sales_frequency: usize,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub count: usize,
    pub avg_quantity: f64,
    pub avg_revenue: f64,
    pub total_revenue: f64,
    pub products: Vec<String>,
}

/// Cluster assignment plus centers (in original feature units) and
/// per-cluster stats keyed `cluster_<i>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterOutcome {
    pub clusters: Vec<ProductCluster>,
    pub cluster_centers: Vec<Vec<f64>>,
    pub cluster_stats: BTreeMap<String, ClusterStats>,
}

/// Zero-mean / unit-variance feature standardization across the product
/// population, invertible so centers can be reported in original units.
/// Zero-variance features are left unscaled.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(features: &Array2<f64>) -> Self {
        let rows = features.nrows() as f64;
        let mut means = Vec::with_capacity(features.ncols());
        let mut stds = Vec::with_capacity(features.ncols());

        for column in features.columns() {
            let mean = column.sum() / rows;
            let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / rows;
            let std = variance.sqrt();
            means.push(mean);
            stds.push(if std == 0.0 { 1.0 } else { std });
        }

        Self { means, stds }
    }

    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        Array2::from_shape_fn(features.dim(), |(i, j)| {
            (features[[i, j]] - self.means[j]) / self.stds[j]
        })
    }

    pub fn inverse_transform(&self, scaled: &Array2<f64>) -> Vec<Vec<f64>> {
        scaled
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, v)| v * self.stds[j] + self.means[j])
                    .collect()
            })
            .collect()
    }
}

/// Cluster the filtered dataset's products.
///
/// One feature vector per distinct product ({summed quantity, summed
/// revenue, mean unit price, sale count}), standardized across the product
/// population. The requested cluster count is clamped to
/// [2, distinct_product_count]; below 2 distinct products the run degenerates
/// to a single cluster 0 with no centers.
pub fn cluster_products(records: &[SaleRecord], k_requested: usize) -> ClusterOutcome {
    let totals = product_totals(records);
    if totals.is_empty() {
        return ClusterOutcome::default();
    }

    if totals.len() < 2 {
        return degenerate_outcome(&totals);
    }

    let features = feature_matrix(&totals);
    let k = k_requested.clamp(2, totals.len());
    let scaler = StandardScaler::fit(&features);
    let scaled = scaler.transform(&features);

    let dataset = Dataset::new(scaled.clone(), Array1::<usize>::zeros(totals.len()));
    let rng = StdRng::seed_from_u64(KMEANS_SEED);

    let model = match KMeans::params_with(k, rng, L2Dist)
        .n_runs(KMEANS_RUNS)
        .max_n_iterations(MAX_ITERATIONS)
        .tolerance(TOLERANCE)
        .fit(&dataset)
    {
        Ok(model) => model,
        Err(e) => {
            // Unreachable after clamping; degrade instead of failing the request
            log::error!("k-means fit failed (k={}): {}", k, e);
            return degenerate_outcome(&totals);
        }
    };

    let labels = model.predict(&dataset);
    let cluster_centers = scaler.inverse_transform(model.centroids());

    let clusters: Vec<ProductCluster> = totals
        .iter()
        .zip(labels.iter())
        .map(|(t, &label)| product_cluster(t, label))
        .collect();

    let mut cluster_stats = BTreeMap::new();
    for i in 0..k {
        let members: Vec<&ProductCluster> =
            clusters.iter().filter(|c| c.cluster == i).collect();
        cluster_stats.insert(format!("cluster_{}", i), stats_for(&members));
    }

    ClusterOutcome {
        clusters,
        cluster_centers,
        cluster_stats,
    }
}

fn feature_matrix(totals: &[ProductTotals]) -> Array2<f64> {
    Array2::from_shape_fn((totals.len(), FEATURES), |(i, j)| match j {
        0 => totals[i].quantity as f64,
        1 => totals[i].revenue,
        2 => totals[i].mean_unit_price(),
        _ => totals[i].sales as f64,
    })
}

fn product_cluster(totals: &ProductTotals, cluster: usize) -> ProductCluster {
    ProductCluster {
        product: totals.product.clone(),
        quantity: totals.quantity,
        revenue: totals.revenue,
        avg_unit_price: totals.mean_unit_price(),
        sales_frequency: totals.sales,
        cluster,
    }
}

fn stats_for(members: &[&ProductCluster]) -> ClusterStats {
    let count = members.len();
    let total_revenue: f64 = members.iter().map(|m| m.revenue).sum();
    let (avg_quantity, avg_revenue) = if count == 0 {
        (0.0, 0.0)
    } else {
        (
            members.iter().map(|m| m.quantity as f64).sum::<f64>() / count as f64,
            total_revenue / count as f64,
        )
    };

    ClusterStats {
        count,
        avg_quantity,
        avg_revenue,
        total_revenue,
        products: members.iter().map(|m| m.product.clone()).collect(),
    }
}

/// Below 2 distinct products every product lands in cluster 0 with no
/// centers and a single degenerate stats entry.
fn degenerate_outcome(totals: &[ProductTotals]) -> ClusterOutcome {
    let clusters: Vec<ProductCluster> =
        totals.iter().map(|t| product_cluster(t, 0)).collect();
    let members: Vec<&ProductCluster> = clusters.iter().collect();

    let mut cluster_stats = BTreeMap::new();
    cluster_stats.insert("cluster_0".to_string(), stats_for(&members));

    ClusterOutcome {
        clusters,
        cluster_centers: Vec::new(),
        cluster_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_record(product: &str, quantity: i64, unit_price: f64) -> SaleRecord {
        SaleRecord {
            sale_id: "test".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc(),
            region: "East".to_string(),
            product: product.to_string(),
            quantity,
            unit_price,
            total_price: quantity as f64 * unit_price,
        }
    }

    fn spread_records() -> Vec<SaleRecord> {
        vec![
            create_test_record("Bulk", 500, 1.0),
            create_test_record("Bulk", 450, 1.0),
            create_test_record("Premium", 2, 900.0),
            create_test_record("Premium", 3, 950.0),
            create_test_record("Mid", 40, 25.0),
            create_test_record("Niche", 5, 30.0),
        ]
    }

    #[test]
    fn test_empty_records_empty_outcome() {
        let outcome = cluster_products(&[], 3);
        assert!(outcome.clusters.is_empty());
        assert!(outcome.cluster_centers.is_empty());
        assert!(outcome.cluster_stats.is_empty());
    }

    #[test]
    fn test_single_product_degenerates_to_cluster_zero() {
        let records = vec![create_test_record("Only", 10, 5.0)];
        let outcome = cluster_products(&records, 3);

        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.clusters[0].cluster, 0);
        assert!(outcome.cluster_centers.is_empty());
        assert_eq!(outcome.cluster_stats.len(), 1);
        assert_eq!(outcome.cluster_stats["cluster_0"].count, 1);
    }

    #[test]
    fn test_k_clamped_to_product_count() {
        let outcome = cluster_products(&spread_records(), 10);

        // 4 distinct products: k clamps to 4
        assert_eq!(outcome.cluster_centers.len(), 4);
        assert!(outcome.clusters.iter().all(|c| c.cluster < 4));
    }

    #[test]
    fn test_k_clamped_up_to_two() {
        let records = vec![
            create_test_record("A", 10, 1.0),
            create_test_record("B", 500, 90.0),
        ];
        let outcome = cluster_products(&records, 1);
        assert_eq!(outcome.cluster_centers.len(), 2);
    }

    #[test]
    fn test_deterministic_labels() {
        let records = spread_records();
        let first = cluster_products(&records, 3);
        let second = cluster_products(&records, 3);

        assert_eq!(first.clusters, second.clusters);
        assert_eq!(first.cluster_centers, second.cluster_centers);
    }

    #[test]
    fn test_stats_cover_all_products() {
        let outcome = cluster_products(&spread_records(), 3);

        let counted: usize = outcome.cluster_stats.values().map(|s| s.count).sum();
        assert_eq!(counted, outcome.clusters.len());

        let stats_revenue: f64 = outcome
            .cluster_stats
            .values()
            .map(|s| s.total_revenue)
            .sum();
        let product_revenue: f64 = outcome.clusters.iter().map(|c| c.revenue).sum();
        assert!((stats_revenue - product_revenue).abs() < 1e-9);
    }

    #[test]
    fn test_centers_in_original_units() {
        let outcome = cluster_products(&spread_records(), 2);

        // Unscaled feature space: quantities run into the hundreds, so at
        // least one center coordinate must leave the unit-variance range
        assert_eq!(outcome.cluster_centers.len(), 2);
        assert!(outcome
            .cluster_centers
            .iter()
            .any(|center| center[0].abs() > 10.0));
        assert!(outcome
            .cluster_centers
            .iter()
            .all(|center| center.len() == FEATURES));
    }

    #[test]
    fn test_scaler_round_trip() {
        let features = Array2::from_shape_fn((3, 2), |(i, j)| (i * 2 + j) as f64 * 3.5);
        let scaler = StandardScaler::fit(&features);
        let scaled = scaler.transform(&features);
        let restored = scaler.inverse_transform(&scaled);

        for i in 0..3 {
            for j in 0..2 {
                assert!((restored[i][j] - features[[i, j]]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_scaler_zero_variance_column() {
        let features = Array2::from_shape_fn((3, 2), |(i, j)| if j == 0 { 7.0 } else { i as f64 });
        let scaler = StandardScaler::fit(&features);
        let scaled = scaler.transform(&features);

        // Constant column maps to zero rather than NaN
        for i in 0..3 {
            assert_eq!(scaled[[i, 0]], 0.0);
        }
    }
}
