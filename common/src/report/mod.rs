// Report generation: CSV and Excel outputs under the workspace data dir

pub mod csv;
pub mod excel;

use crate::errors::ReportError;
use crate::models::{Signal, StockReport, TechnicalSignal};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Column headers shared by the CSV and Excel outputs
pub const COLUMNS: [&str; 15] = [
    "Symbol",
    "Final Signal",
    "Sentiment Score",
    "Buy Pressure",
    "Sell Pressure",
    "Net Pressure",
    "Bollinger Min",
    "Bollinger Max",
    "Bollinger Current",
    "MACD Current",
    "MACD Signal",
    "RSI Current",
    "Short MA",
    "Long MA",
    "Sector",
];

/// One report row as display strings, in [`COLUMNS`] order
pub fn row_fields(report: &StockReport) -> Vec<String> {
    vec![
        report.symbol.clone(),
        report.final_signal.to_string(),
        format!("{:.2}", report.sentiment_score),
        format!("{}", report.buy_pressure as i64),
        format!("{}", report.sell_pressure as i64),
        format!("{}", report.net_pressure as i64),
        format!("{:.2}", report.technical.bollinger_min),
        format!("{:.2}", report.technical.bollinger_max),
        format!("{:.2}", report.technical.bollinger_current),
        format!("{:.2}", report.technical.macd),
        format!("{:.2}", report.technical.macd_signal),
        format!("{:.2}", report.technical.rsi),
        format!("{:.2}", report.technical.short_ma),
        format!("{:.2}", report.technical.long_ma),
        report.sector.clone().unwrap_or_default(),
    ]
}

/// Order reports for publication: Buys, then Sells, then Holds
///
/// Buys rank technically-confirmed entries first, then higher net pressure,
/// then higher sentiment; Sells mirror that. Symbol breaks remaining ties so
/// identical inputs always produce identical files.
pub fn sort_for_publication(reports: &[StockReport]) -> Vec<StockReport> {
    let mut buys: Vec<StockReport> = reports
        .iter()
        .filter(|r| r.final_signal == Signal::Buy)
        .cloned()
        .collect();
    let mut sells: Vec<StockReport> = reports
        .iter()
        .filter(|r| r.final_signal == Signal::Sell)
        .cloned()
        .collect();
    let mut holds: Vec<StockReport> = reports
        .iter()
        .filter(|r| r.final_signal == Signal::Hold)
        .cloned()
        .collect();

    buys.sort_by(|a, b| {
        let confirmed_a = a.technical.signal == TechnicalSignal::Buy;
        let confirmed_b = b.technical.signal == TechnicalSignal::Buy;
        confirmed_b
            .cmp(&confirmed_a)
            .then_with(|| b.net_pressure.total_cmp(&a.net_pressure))
            .then_with(|| b.sentiment_score.total_cmp(&a.sentiment_score))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    sells.sort_by(|a, b| {
        let confirmed_a = a.technical.signal == TechnicalSignal::Sell;
        let confirmed_b = b.technical.signal == TechnicalSignal::Sell;
        confirmed_b
            .cmp(&confirmed_a)
            .then_with(|| a.net_pressure.total_cmp(&b.net_pressure))
            .then_with(|| a.sentiment_score.total_cmp(&b.sentiment_score))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    holds.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut sorted = buys;
    sorted.append(&mut sells);
    sorted.append(&mut holds);
    sorted
}

/// Writes the full report set for one run
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the overall CSV, the Excel workbook, and per-sector CSVs
    ///
    /// Returns the paths written, for logging and the run record.
    #[instrument(skip(self, reports))]
    pub fn write_all(&self, reports: &[StockReport]) -> Result<Vec<PathBuf>, ReportError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| ReportError::CreateDirFailed {
            path: self.output_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let sorted = sort_for_publication(reports);
        let mut written = Vec::new();

        let csv_path = self.output_dir.join("signals.csv");
        csv::write_signals_csv(&csv_path, &sorted)?;
        written.push(csv_path);

        let excel_path = self.output_dir.join("signals.xlsx");
        excel::write_signals_workbook(&excel_path, &sorted)?;
        written.push(excel_path);

        written.extend(csv::write_sector_csvs(&self.output_dir, &sorted)?);

        info!(
            files = written.len(),
            stocks = sorted.len(),
            dir = %self.output_dir.display(),
            "Reports written"
        );
        Ok(written)
    }
}
