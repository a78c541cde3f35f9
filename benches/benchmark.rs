//! パフォーマンスベンチマーク
//!
//! sales-consolidatorクレートの各段階の処理時間を測定します。
//!
//! - 集計: 1万 / 10万レコードに対する`analyze`
//! - 読み込み: 生成した入力ディレクトリ（5ファイル × 2,000行）の`consolidate`
//! - 全体: グラフなしの`run`（読み込み → 集計 → レポート保存）

use std::path::Path;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_xlsxwriter::{Workbook, XlsxError};
use sales_consolidator::{
    analyze, consolidate, ConsolidatedTable, ConsolidatorBuilder, SaleRecord, REQUIRED_COLUMNS,
};

const PRODUCTS: [&str; 8] = [
    "Laptop", "Monitor", "Keyboard", "Mouse", "Desk", "Chair", "Lamp", "Notebook",
];
const BRANCHES: [&str; 4] = ["North", "South", "Center", "West"];
const SALESPEOPLE: [&str; 6] = ["Ana", "Luis", "Marta", "Pedro", "Sofía", "Jorge"];

/// 決定的な合成レコードを生成
fn synthetic_table(n: usize) -> ConsolidatedTable {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let records = (0..n)
        .map(|i| {
            SaleRecord::new(
                start + chrono::Duration::days((i % 90) as i64),
                PRODUCTS[i % PRODUCTS.len()],
                if i % 3 == 0 { "Electronics" } else { "Office" },
                (i % 9 + 1) as u64,
                ((i * 37) % 50_000) as f64 / 100.0,
                SALESPEOPLE[i % SALESPEOPLE.len()],
                BRANCHES[i % BRANCHES.len()],
            )
        })
        .collect();
    ConsolidatedTable::from_records(records)
}

/// 入力ファイルを生成
fn write_input_file(path: &Path, rows: u32) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, header) in REQUIRED_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for i in 0..rows {
        let row = i + 1;
        let idx = i as usize;
        worksheet.write_string(row, 0, format!("2024-02-{:02}", i % 28 + 1))?;
        worksheet.write_string(row, 1, PRODUCTS[idx % PRODUCTS.len()])?;
        worksheet.write_string(row, 2, "Office")?;
        worksheet.write_number(row, 3, (i % 9 + 1) as f64)?;
        worksheet.write_number(row, 4, 19.99)?;
        worksheet.write_string(row, 5, SALESPEOPLE[idx % SALESPEOPLE.len()])?;
        worksheet.write_string(row, 6, BRANCHES[idx % BRANCHES.len()])?;
    }
    workbook.save(path)
}

fn benchmark_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for size in [10_000usize, 100_000] {
        let table = synthetic_table(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| black_box(analyze(black_box(table), 10)));
        });
    }

    group.finish();
}

fn benchmark_consolidate(c: &mut Criterion) {
    let tmp = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Warning: Failed to create temp dir: {}. Skipping benchmark.", e);
            return;
        }
    };
    for i in 0..5 {
        if let Err(e) = write_input_file(&tmp.path().join(format!("sales_{:02}.xlsx", i)), 2_000) {
            eprintln!("Warning: Failed to write fixture: {}. Skipping benchmark.", e);
            return;
        }
    }

    let mut group = c.benchmark_group("consolidate");
    group.sample_size(10);
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("5_files_10k_rows", |b| {
        b.iter(|| {
            let table = consolidate(black_box(tmp.path()), "*.xlsx", &REQUIRED_COLUMNS).unwrap();
            black_box(table);
        });
    });

    let output = tmp.path().join("out").join("report.xlsx");
    let consolidator = ConsolidatorBuilder::new()
        .with_input_dir(tmp.path())
        .with_output_path(&output)
        .with_charts(false)
        .build()
        .unwrap();

    group.bench_function("run_without_charts", |b| {
        b.iter(|| black_box(consolidator.run().unwrap()));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(std::time::Duration::from_secs(10))
        .warm_up_time(std::time::Duration::from_secs(3));
    targets = benchmark_analyze, benchmark_consolidate
}

criterion_main!(benches);
