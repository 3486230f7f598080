//! KPI, timeseries, and distribution aggregation over the filtered dataset

use super::normalizer::SaleRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How many products the leaderboards keep
const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_quantity: i64,
}

/// Summed revenue for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRevenue {
    pub region: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuantity {
    pub product: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub product: String,
    pub revenue: f64,
}

/// Per-product rollup, accumulated in encounter order
#[derive(Debug, Clone, Default)]
pub struct ProductTotals {
    pub product: String,
    pub quantity: i64,
    pub revenue: f64,
    pub unit_price_sum: f64,
    pub sales: usize,
}

impl ProductTotals {
    pub fn mean_unit_price(&self) -> f64 {
        if self.sales == 0 {
            0.0
        } else {
            self.unit_price_sum / self.sales as f64
        }
    }
}

pub fn compute_kpis(records: &[SaleRecord]) -> Kpis {
    Kpis {
        total_revenue: records.iter().map(|r| r.total_price).sum(),
        total_quantity: records.iter().map(|r| r.quantity).sum(),
    }
}

/// Daily revenue timeseries: one point per distinct day present, ascending,
/// no gap-filling for missing days.
pub fn daily_timeseries(records: &[SaleRecord]) -> Vec<TimeSeriesPoint> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *days.entry(record.day()).or_insert(0.0) += record.total_price;
    }

    days.into_iter()
        .map(|(date, revenue)| TimeSeriesPoint { date, revenue })
        .collect()
}

/// Revenue per region, sorted descending; ties keep first-encountered order.
pub fn region_distribution(records: &[SaleRecord]) -> Vec<RegionRevenue> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<RegionRevenue> = Vec::new();

    for record in records {
        match index.get(&record.region) {
            Some(&i) => out[i].revenue += record.total_price,
            None => {
                index.insert(record.region.clone(), out.len());
                out.push(RegionRevenue {
                    region: record.region.clone(),
                    revenue: record.total_price,
                });
            }
        }
    }

    // sort_by is stable, so equal revenues keep encounter order
    out.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    out
}

/// Per-product totals in encounter order. Shared by the leaderboards and the
/// clusterer's feature extraction.
pub fn product_totals(records: &[SaleRecord]) -> Vec<ProductTotals> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<ProductTotals> = Vec::new();

    for record in records {
        let i = match index.get(&record.product) {
            Some(&i) => i,
            None => {
                index.insert(record.product.clone(), out.len());
                out.push(ProductTotals {
                    product: record.product.clone(),
                    ..ProductTotals::default()
                });
                out.len() - 1
            }
        };
        out[i].quantity += record.quantity;
        out[i].revenue += record.total_price;
        out[i].unit_price_sum += record.unit_price;
        out[i].sales += 1;
    }

    out
}

pub fn top_products_by_quantity(totals: &[ProductTotals]) -> Vec<ProductQuantity> {
    let mut ranked: Vec<&ProductTotals> = totals.iter().collect();
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranked
        .into_iter()
        .take(TOP_PRODUCTS)
        .map(|t| ProductQuantity {
            product: t.product.clone(),
            quantity: t.quantity,
        })
        .collect()
}

pub fn top_products_by_revenue(totals: &[ProductTotals]) -> Vec<ProductRevenue> {
    let mut ranked: Vec<&ProductTotals> = totals.iter().collect();
    ranked.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    ranked
        .into_iter()
        .take(TOP_PRODUCTS)
        .map(|t| ProductRevenue {
            product: t.product.clone(),
            revenue: t.revenue,
        })
        .collect()
}
