// CSV report output

use crate::errors::ReportError;
use crate::models::StockReport;
use crate::report::{row_fields, COLUMNS};
use csv::WriterBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

fn write_csv(path: &Path, reports: &[&StockReport]) -> Result<(), ReportError> {
    let to_err = |e: csv::Error| ReportError::CsvWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(to_err)?;

    writer.write_record(COLUMNS).map_err(to_err)?;
    for report in reports {
        writer.write_record(row_fields(report)).map_err(to_err)?;
    }

    writer.flush().map_err(|e| ReportError::CsvWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok(())
}

/// Write the overall signals CSV (already sorted for publication)
pub fn write_signals_csv(path: &Path, sorted: &[StockReport]) -> Result<(), ReportError> {
    let rows: Vec<&StockReport> = sorted.iter().collect();
    write_csv(path, &rows)
}

/// Write one CSV per sector for stocks whose listing carries one
///
/// Sector names become file names; path separators are flattened.
pub fn write_sector_csvs(
    output_dir: &Path,
    sorted: &[StockReport],
) -> Result<Vec<PathBuf>, ReportError> {
    let mut by_sector: BTreeMap<String, Vec<&StockReport>> = BTreeMap::new();
    for report in sorted {
        if let Some(sector) = &report.sector {
            by_sector.entry(sector.clone()).or_default().push(report);
        }
    }

    let mut written = Vec::new();
    for (sector, rows) in by_sector {
        let file_name = format!("{}.csv", sector.replace(['/', '\\'], "-"));
        let path = output_dir.join(file_name);
        write_csv(&path, &rows)?;
        debug!(sector = %sector, stocks = rows.len(), "Sector report written");
        written.push(path);
    }

    Ok(written)
}
