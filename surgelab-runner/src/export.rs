//! Export: JSON, CSV and Markdown artifacts for pattern sets, DNA profiles
//! and backtest reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use surgelab_core::backtest::PerformanceStatistics;
use surgelab_core::domain::SimulatedTrade;
use surgelab_core::patterns::PatternSet;

use crate::backtest::BacktestReport;

// ─── JSON export ────────────────────────────────────────────────────

/// Pretty JSON for any published artifact (`PatternSet`, `DnaProfile`, …).
pub fn export_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: symbol, entry_date, entry_price, exit_date, exit_price,
/// holding_days, return_rate, is_win, stop_loss_triggered, stop_loss_day
pub fn export_trades_csv(trades: &[SimulatedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "holding_days",
        "return_rate",
        "is_win",
        "stop_loss_triggered",
        "stop_loss_day",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.symbol,
            &t.entry_date.to_string(),
            &format!("{:.4}", t.entry_price),
            &t.exit_date.to_string(),
            &format!("{:.4}", t.exit_price),
            &t.holding_days.to_string(),
            &format!("{:.4}", t.return_rate),
            &t.is_win.to_string(),
            &t.stop_loss_triggered.to_string(),
            &t.stop_loss_day.map(|d| d.to_string()).unwrap_or_default(),
        ])?;
    }
    finish(wtr)
}

/// One row per pattern, in rank order.
pub fn export_patterns_csv(set: &PatternSet) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "key",
        "name",
        "occurrence_count",
        "frequency",
        "win_rate",
        "avg_return",
        "max_return",
        "min_return",
        "total_samples",
        "sample_symbols",
    ])?;

    for (i, p) in set.patterns.iter().enumerate() {
        wtr.write_record([
            &(i + 1).to_string(),
            &p.key,
            &p.name,
            &p.occurrence_count.to_string(),
            &format!("{:.2}", p.frequency),
            &format!("{:.2}", p.backtest.win_rate),
            &format!("{:.4}", p.backtest.avg_return),
            &format!("{:.4}", p.backtest.max_return),
            &format!("{:.4}", p.backtest.min_return),
            &p.backtest.total_samples.to_string(),
            &p.sample_symbols.join(" "),
        ])?;
    }
    finish(wtr)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Human-readable summary of a backtest.
pub fn generate_report(report: &BacktestReport) -> String {
    let mut md = String::new();
    md.push_str("# Backtest Report\n\n");
    md.push_str(&format!(
        "Analyzed {} symbols: {} matched, {} failed, {} with too little history.\n\n",
        report.analyzed, report.matched, report.failed, report.skipped_insufficient
    ));

    let Some(stats) = &report.statistics else {
        md.push_str("No trades.\n");
        return md;
    };
    md.push_str("## Performance\n\n| Metric | Value |\n|---|---|\n");
    for (label, value) in stat_rows(stats) {
        md.push_str(&format!("| {label} | {value} |\n"));
    }

    if let Some(stop) = &report.stop_loss {
        md.push_str("\n## Stop Loss\n\n| Metric | Value |\n|---|---|\n");
        md.push_str(&format!("| Triggered | {} |\n", stop.triggered_count));
        md.push_str(&format!("| Trigger Rate | {:.1}% |\n", stop.triggered_rate));
        md.push_str(&format!(
            "| Avg Day to Stop | {:.2} |\n",
            stop.avg_day_to_stop_loss
        ));
    }
    md
}

fn stat_rows(s: &PerformanceStatistics) -> Vec<(&'static str, String)> {
    vec![
        ("Trades", s.total_trades.to_string()),
        ("Win Rate", format!("{:.1}%", s.win_rate)),
        ("Avg Return", format!("{:.2}%", s.avg_return)),
        ("Std Dev", format!("{:.2}", s.std_dev)),
        ("Sharpe", format!("{:.3}", s.sharpe_ratio)),
        ("Max Drawdown", format!("{:.2}%", s.max_drawdown)),
        ("Final Portfolio", format!("{:.4}", s.final_portfolio_value)),
        ("Profit Factor", format!("{:.2}", s.profit_factor)),
        ("Avg Win", format!("{:.2}%", s.avg_win)),
        ("Avg Loss", format!("{:.2}%", s.avg_loss)),
        ("Best Trade", format!("{:.2}%", s.best_trade)),
        ("Worst Trade", format!("{:.2}%", s.worst_trade)),
        ("Avg Holding Days", format!("{:.1}", s.avg_holding_days)),
    ]
}

// ─── Artifacts ──────────────────────────────────────────────────────

/// Write `trades.csv`, `statistics.json` and `report.md` under `output_dir`.
pub fn save_backtest_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    write_file(&output_dir.join("trades.csv"), &export_trades_csv(&report.trades)?)?;
    write_file(
        &output_dir.join("statistics.json"),
        &export_json(&(&report.statistics, &report.stop_loss))?,
    )?;
    write_file(&output_dir.join("report.md"), &generate_report(report))?;
    Ok(output_dir.to_path_buf())
}

pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use surgelab_core::backtest::compute_statistics;

    fn trade(symbol: &str, exit: f64, stop_day: Option<usize>) -> SimulatedTrade {
        let d = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        SimulatedTrade::new(symbol, d, 100.0, d + chrono::Duration::days(3), exit, 3, stop_day)
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let trades = [trade("AAA", 110.0, None), trade("BBB", 92.0, Some(2))];
        let csv = export_trades_csv(&trades).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,entry_date"));
        assert!(lines[1].contains("AAA") && lines[1].contains("10.0000,true"));
        assert!(lines[2].ends_with("true,2"));
    }

    #[test]
    fn report_without_trades() {
        let md = generate_report(&BacktestReport::default());
        assert!(md.contains("No trades."));
    }

    #[test]
    fn artifacts_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let trades = vec![trade("AAA", 110.0, None)];
        let report = BacktestReport {
            statistics: compute_statistics(&trades),
            trades,
            analyzed: 1,
            matched: 1,
            ..BacktestReport::default()
        };
        let out = save_backtest_artifacts(&report, &dir.path().join("run")).unwrap();
        assert!(out.join("trades.csv").exists());
        assert!(out.join("statistics.json").exists());
        let md = std::fs::read_to_string(out.join("report.md")).unwrap();
        assert!(md.contains("| Win Rate | 100.0% |"));
    }
}
