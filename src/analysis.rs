//! Analysis Module
//!
//! 統合テーブルに対する集計処理を提供するモジュール。
//! すべての関数は副作用を持たず、入力テーブルを変更しません。
//! 丸めは表示時ではなく集計時点で2桁に行います。

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::Dimension;
use crate::types::{round2, ConsolidatedTable, SaleRecord};

/// デフォルトの上位件数
pub const DEFAULT_TOP_N: usize = 10;

/// 全体の統計値
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralStats {
    /// 売上合計
    pub total_revenue: f64,
    /// 取引数
    pub transactions: usize,
    /// 平均取引額（取引がない場合はNone）
    pub average_ticket: Option<f64>,
    /// 最初の取引日
    pub first_date: Option<NaiveDate>,
    /// 最後の取引日
    pub last_date: Option<NaiveDate>,
    /// 支店数
    pub branches: usize,
    /// 販売担当者数
    pub salespeople: usize,
    /// 商品数
    pub products: usize,
}

/// 1つの軸に沿った集計結果の1行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionTotal {
    /// 軸の値（支店名、商品名など）
    pub key: String,
    /// 売上合計（2桁丸め）
    pub revenue: f64,
    /// 取引数
    pub transactions: usize,
    /// 販売数量合計
    pub quantity: u128,
    /// 軸全体の売上に対する比率（0.0〜1.0）
    pub share: f64,
}

/// 支店別集計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchStats {
    pub name: String,
    pub revenue: f64,
    pub transactions: usize,
    pub share: f64,
}

/// 販売担当者別集計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalespersonStats {
    pub name: String,
    pub revenue: f64,
    pub transactions: usize,
    /// 丸め済みの売上 ÷ 取引数（2桁丸め）
    pub average_ticket: f64,
}

/// カテゴリ別集計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub name: String,
    pub revenue: f64,
    pub units: u128,
    pub share: f64,
}

/// 商品ランキングの1行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProduct {
    pub name: String,
    pub quantity: u128,
    pub revenue: f64,
}

/// 数量順・売上順の2つの独立した商品ランキング
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TopProducts {
    pub by_quantity: Vec<RankedProduct>,
    pub by_revenue: Vec<RankedProduct>,
}

/// 日別売上
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
}

/// すべての集計結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub stats: GeneralStats,
    pub branches: Vec<BranchStats>,
    pub top_products: TopProducts,
    pub salespeople: Vec<SalespersonStats>,
    pub categories: Vec<CategoryStats>,
    pub daily: Vec<DailyRevenue>,
}

/// すべての集計を実行する
pub fn analyze(table: &ConsolidatedTable, top_n: usize) -> AnalysisReport {
    AnalysisReport {
        stats: general_stats(table),
        branches: branch_summary(table),
        top_products: top_products(table, top_n),
        salespeople: salesperson_summary(table),
        categories: category_summary(table),
        daily: daily_revenue(table),
    }
}

/// 全体の統計値を計算する
pub fn general_stats(table: &ConsolidatedTable) -> GeneralStats {
    let records = &table.records;
    let total: f64 = records.iter().map(|r| r.line_total).sum();
    let transactions = records.len();

    GeneralStats {
        total_revenue: round2(total),
        transactions,
        average_ticket: (transactions > 0).then(|| round2(total / transactions as f64)),
        first_date: records.iter().map(|r| r.date).min(),
        last_date: records.iter().map(|r| r.date).max(),
        branches: distinct(records.iter().map(|r| r.branch.as_str())),
        salespeople: distinct(records.iter().map(|r| r.salesperson.as_str())),
        products: distinct(records.iter().map(|r| r.product.as_str())),
    }
}

/// 指定した軸でグループ化し、売上の降順で返す
///
/// 同額の場合は最初に出現した順序を維持します（安定ソート）。
pub fn aggregate_by(table: &ConsolidatedTable, dimension: Dimension) -> Vec<DimensionTotal> {
    let mut totals = group(&table.records, dimension);
    sort_desc_by(&mut totals, |t| t.revenue);
    totals
}

/// 支店別の売上・取引数・構成比
pub fn branch_summary(table: &ConsolidatedTable) -> Vec<BranchStats> {
    aggregate_by(table, Dimension::Branch)
        .into_iter()
        .map(|t| BranchStats {
            name: t.key,
            revenue: t.revenue,
            transactions: t.transactions,
            share: t.share,
        })
        .collect()
}

/// 数量順・売上順の上位N商品
pub fn top_products(table: &ConsolidatedTable, n: usize) -> TopProducts {
    let products: Vec<RankedProduct> = group(&table.records, Dimension::Product)
        .into_iter()
        .map(|t| RankedProduct {
            name: t.key,
            quantity: t.quantity,
            revenue: t.revenue,
        })
        .collect();

    let mut by_quantity = products.clone();
    sort_desc_by(&mut by_quantity, |p| p.quantity as f64);
    by_quantity.truncate(n);

    let mut by_revenue = products;
    sort_desc_by(&mut by_revenue, |p| p.revenue);
    by_revenue.truncate(n);

    TopProducts {
        by_quantity,
        by_revenue,
    }
}

/// 販売担当者別の売上・取引数・平均取引額
///
/// 平均取引額は丸め済みの売上から計算するため、丸め誤差が累積し得ます。
pub fn salesperson_summary(table: &ConsolidatedTable) -> Vec<SalespersonStats> {
    aggregate_by(table, Dimension::Salesperson)
        .into_iter()
        .map(|t| SalespersonStats {
            average_ticket: round2(t.revenue / t.transactions as f64),
            name: t.key,
            revenue: t.revenue,
            transactions: t.transactions,
        })
        .collect()
}

/// カテゴリ別の売上・数量・構成比
pub fn category_summary(table: &ConsolidatedTable) -> Vec<CategoryStats> {
    aggregate_by(table, Dimension::Category)
        .into_iter()
        .map(|t| CategoryStats {
            name: t.key,
            revenue: t.revenue,
            units: t.quantity,
            share: t.share,
        })
        .collect()
}

/// 日別売上（日付の昇順）
pub fn daily_revenue(table: &ConsolidatedTable) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in &table.records {
        *days.entry(record.date).or_insert(0.0) += record.line_total;
    }

    days.into_iter()
        .map(|(date, revenue)| DailyRevenue {
            date,
            revenue: round2(revenue),
        })
        .collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.collect::<HashSet<_>>().len()
}

#[derive(Default)]
struct Accumulator {
    revenue: f64,
    transactions: usize,
    // 1行あたりの上限は取り込み時に2^53で制限される
    quantity: u128,
}

/// 出現順を保ってグループ化する（ソートなし）
fn group(records: &[SaleRecord], dimension: Dimension) -> Vec<DimensionTotal> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Accumulator)> = Vec::new();

    for record in records {
        let key = dimension_key(record, dimension);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, Accumulator::default()));
                groups.len() - 1
            }
        };

        let acc = &mut groups[slot].1;
        acc.revenue += record.line_total;
        acc.transactions += 1;
        acc.quantity += u128::from(record.quantity);
    }

    // 構成比は丸め済みの値の合計に対して計算する
    let rounded: Vec<f64> = groups.iter().map(|(_, acc)| round2(acc.revenue)).collect();
    let grand_total: f64 = rounded.iter().sum();

    groups
        .into_iter()
        .zip(rounded)
        .map(|((key, acc), revenue)| DimensionTotal {
            key,
            revenue,
            transactions: acc.transactions,
            quantity: acc.quantity,
            share: if grand_total > 0.0 {
                revenue / grand_total
            } else {
                0.0
            },
        })
        .collect()
}

fn dimension_key(record: &SaleRecord, dimension: Dimension) -> String {
    match dimension {
        Dimension::Branch => record.branch.clone(),
        Dimension::Product => record.product.clone(),
        Dimension::Salesperson => record.salesperson.clone(),
        Dimension::Category => record.category.clone(),
        Dimension::Date => record.date.format("%Y-%m-%d").to_string(),
    }
}

/// 降順の安定ソート
fn sort_desc_by<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| key(b).total_cmp(&key(a)));
}
