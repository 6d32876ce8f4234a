//! Report export: JSON round-trip and CSV trade log / equity curve.
//!
//! Persisted reports carry a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::SecondsFormat;
use stratarb_core::domain::PositionSide;
use stratarb_core::Trade;

use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

pub const TRADE_COLUMNS: [&str; 12] = [
    "strategy",
    "symbol",
    "timeframe",
    "side",
    "entry_time",
    "exit_time",
    "entry_price",
    "exit_price",
    "sl",
    "tp",
    "qty",
    "pnl",
];

fn side_label(side: PositionSide) -> &'static str {
    match side {
        PositionSide::Long => "buy",
        PositionSide::Short => "sell",
        PositionSide::Flat => "flat",
    }
}

fn level(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Trade log, one row per closed trade. Times are RFC 3339; absent stop
/// and take levels are blank.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TRADE_COLUMNS)?;

    for t in trades {
        let entry_time = t.entry_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let exit_time = t.exit_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let row: [&str; 12] = [
            t.strategy.as_str(),
            t.symbol.as_str(),
            t.timeframe.as_str(),
            side_label(t.side),
            &entry_time,
            &exit_time,
            &t.entry_price.to_string(),
            &t.exit_price.to_string(),
            &level(t.sl),
            &level(t.tp),
            &t.qty.to_string(),
            &t.pnl.to_string(),
        ];
        wtr.write_record(row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Equity curve as `trade_index,equity`; row 0 is the initial balance.
pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trade_index", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([&i.to_string(), &eq.to_string()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json`, `trades.csv` and `equity.csv` into
/// `output_dir/run_<id prefix>/`. Returns the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("run_{prefix}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)
        .context("failed to write report.json")?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&report.result.trades)?)
        .context("failed to write trades.csv")?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&report.result.equity_curve)?,
    )
    .context("failed to write equity.csv")?;

    Ok(run_dir)
}

pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
