//! Shared test utilities and fixture generators

#![allow(dead_code)]

use chrono::NaiveDateTime;
use polars::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use rfmseg::pipeline::RawTransaction;
use std::path::PathBuf;
use tempfile::TempDir;

/// A small order export in the classic online-retail layout.
///
/// Contains:
/// - customers 17850 (3 lines, one a return), 13047 (2 lines), 12583 (1 line),
///   13748 (1 line) and 14688 (2 lines)
/// - one line without a customer id (dropped during ingestion)
/// - a float-formatted id (`13047.0`) that normalizes to `13047`
pub const SAMPLE_ORDERS_CSV: &str = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,2010-12-01 08:26:00,2.55,17850,United Kingdom
536365,71053,WHITE METAL LANTERN,6,2010-12-01 08:26:00,3.39,17850,United Kingdom
536367,84879,ASSORTED COLOUR BIRD ORNAMENT,32,2010-12-01 08:34:00,1.69,13047,United Kingdom
536370,22728,ALARM CLOCK BAKELIKE PINK,24,2010-12-03 08:45:00,3.75,12583,France
536371,22086,PAPER CHAIN KIT 50'S CHRISTMAS,80,2010-12-01 09:00:00,2.55,13748,United Kingdom
536414,22139,RETROSPOT TEA SET CERAMIC 11 PC,56,2010-12-01 11:52:00,0.00,,United Kingdom
536520,21123,SET/10 IVORY POLKADOT PARTY CANDLES,1,2010-12-01 12:43:00,1.25,14688,United Kingdom
C536548,22244,3 HOOK HANGER MAGIC GARDEN,-1,2010-12-01 14:33:00,1.95,17850,United Kingdom
536592,21703,BAG 125g SWIRLY MARBLES,3,2010-12-03 17:06:00,0.85,14688,United Kingdom
536596,84926A,BIRTHDAY PARTY CORDON BARRIER TAPE,1,2010-12-05 10:00:00,1.25,13047.0,United Kingdom
";

/// Distinct customer ids in [`SAMPLE_ORDERS_CSV`], in id order
pub const SAMPLE_CUSTOMERS: [&str; 5] = ["12583", "13047", "13748", "14688", "17850"];

/// Expected `(customerId, recencyDays, frequency, compositeScore, segment)` per sample
/// customer with the default configuration (snapshot 2010-12-06 10:00)
pub const SAMPLE_EXPECTED: [(&str, i64, u64, &str, &str); 5] = [
    ("12583", 3, 1, "214", "Others"),
    ("13047", 1, 2, "433", "Loyal"),
    ("13748", 5, 1, "124", "Others"),
    ("14688", 2, 2, "341", "Potential"),
    ("17850", 4, 3, "142", "Others"),
];

/// Raw row with every field present
pub fn raw(customer: &str, invoice: &str, timestamp: &str, quantity: &str, price: &str) -> RawTransaction {
    RawTransaction::new(Some(customer), invoice, timestamp, quantity, price)
}

/// Raw row without a customer id
pub fn raw_anonymous(invoice: &str, timestamp: &str, quantity: &str, price: &str) -> RawTransaction {
    RawTransaction::new(None, invoice, timestamp, quantity, price)
}

/// Random but reproducible order lines.
///
/// Customers `1..=n_customers` each get at least one line; the rest are
/// spread at random over the year 2011 with varied quantities and prices.
pub fn random_raw_transactions(n_customers: usize, n_rows: usize, seed: u64) -> Vec<RawTransaction> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n_rows.max(n_customers))
        .map(|i| {
            let customer = if i < n_customers {
                i + 1
            } else {
                rng.gen_range(1..=n_customers)
            };
            let day = rng.gen_range(1..=28);
            let month = rng.gen_range(1..=12);
            let hour = rng.gen_range(8..18);
            let quantity = rng.gen_range(1..50);
            let price = rng.gen_range(1..2_000) as f64 / 100.0;

            raw(
                &customer.to_string(),
                &format!("{}", 500_000 + i),
                &format!("2011-{:02}-{:02} {:02}:{:02}:00", month, day, hour, rng.gen_range(0..60)),
                &quantity.to_string(),
                &format!("{:.2}", price),
            )
        })
        .collect()
}

/// Same orders as [`SAMPLE_ORDERS_CSV`] (without the unused columns) as a typed DataFrame,
/// the way a Parquet export would store them
pub fn sample_orders_dataframe() -> DataFrame {
    df! {
        "InvoiceNo" => ["536365", "536365", "536367", "536370", "536371", "536414", "536520", "C536548", "536592", "536596"],
        "Quantity" => [6i64, 6, 32, 24, 80, 56, 1, -1, 3, 1],
        "InvoiceDate" => [
            "2010-12-01 08:26:00", "2010-12-01 08:26:00", "2010-12-01 08:34:00",
            "2010-12-03 08:45:00", "2010-12-01 09:00:00", "2010-12-01 11:52:00",
            "2010-12-01 12:43:00", "2010-12-01 14:33:00", "2010-12-03 17:06:00",
            "2010-12-05 10:00:00",
        ],
        "UnitPrice" => [2.55f64, 3.39, 1.69, 3.75, 2.55, 0.0, 1.25, 1.95, 0.85, 1.25],
        "CustomerID" => [
            Some(17850.0f64), Some(17850.0), Some(13047.0), Some(12583.0), Some(13748.0),
            None, Some(14688.0), Some(17850.0), Some(14688.0), Some(13047.0),
        ],
    }
    .unwrap()
}

/// [`sample_orders_dataframe`] with `InvoiceDate` stored as a millisecond
/// `Datetime` column instead of text
pub fn sample_orders_dataframe_with_datetimes() -> DataFrame {
    let mut df = sample_orders_dataframe();
    let millis: Vec<i64> = df
        .column("InvoiceDate")
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .map(|s| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .unwrap()
                .and_utc()
                .timestamp_millis()
        })
        .collect();
    let dates = Series::new("InvoiceDate".into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    df.with_column(dates).unwrap();
    df
}

/// Create a temporary directory holding a file with the given contents
pub fn create_temp_file(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("orders.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert two floats agree to within a small absolute tolerance
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
