// Excel report output
//
// One workbook per run: an Overall sheet with every analyzed stock, plus a
// Buy and a Sell sheet per indicator scored by how far that indicator is
// stretched, strongest candidates first.

use crate::errors::ReportError;
use crate::models::{Signal, StockReport};
use crate::report::{row_fields, COLUMNS};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook, Worksheet, XlsxError};
use std::path::Path;

type ScoreFn = fn(&StockReport) -> f64;

/// Indicator sheets: (name, signal filter, score)
const INDICATOR_SHEETS: [(&str, Signal, ScoreFn); 8] = [
    ("Bollinger_Buy", Signal::Buy, |r| {
        r.technical.bollinger_min - r.technical.bollinger_current
    }),
    ("Bollinger_Sell", Signal::Sell, |r| {
        r.technical.bollinger_current - r.technical.bollinger_max
    }),
    ("MACD_Buy", Signal::Buy, |r| {
        r.technical.macd - r.technical.macd_signal
    }),
    ("MACD_Sell", Signal::Sell, |r| {
        r.technical.macd_signal - r.technical.macd
    }),
    ("RSI_Buy", Signal::Buy, |r| 30.0 - r.technical.rsi),
    ("RSI_Sell", Signal::Sell, |r| r.technical.rsi - 70.0),
    ("MA_Buy", Signal::Buy, |r| {
        r.technical.short_ma - r.technical.long_ma
    }),
    ("MA_Sell", Signal::Sell, |r| {
        r.technical.long_ma - r.technical.short_ma
    }),
];

fn write_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    rows: &[(&StockReport, Option<f64>)],
    with_score: bool,
) -> Result<(), XlsxError> {
    worksheet.set_name(name)?;

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    if with_score {
        worksheet.write_string(0, COLUMNS.len() as u16, "Score")?;
    }

    for (row_idx, (report, score)) in rows.iter().enumerate() {
        let row = row_idx as u32 + 1;
        for (col, field) in row_fields(report).iter().enumerate() {
            worksheet.write_string(row, col as u16, field)?;
        }
        if let Some(score) = score {
            let rounded = (score * 100.0).round() / 100.0;
            worksheet.write_number(row, COLUMNS.len() as u16, rounded)?;
        }
    }

    Ok(())
}

/// Write the signals workbook (input already sorted for publication)
pub fn write_signals_workbook(path: &Path, sorted: &[StockReport]) -> Result<(), ReportError> {
    let to_err = |e: XlsxError| ReportError::ExcelWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut workbook = Workbook::new();

    // Pinned creation metadata: the publish step's no-change guard relies on
    // identical inputs producing byte-identical workbooks.
    let created = ExcelDateTime::from_ymd(2000, 1, 1).map_err(to_err)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let overall_rows: Vec<(&StockReport, Option<f64>)> =
        sorted.iter().map(|r| (r, None)).collect();
    write_sheet(workbook.add_worksheet(), "Overall", &overall_rows, false).map_err(to_err)?;

    for (name, signal, score) in INDICATOR_SHEETS {
        let mut rows: Vec<(&StockReport, Option<f64>)> = sorted
            .iter()
            .filter(|r| r.final_signal == signal)
            .map(|r| (r, Some(score(r))))
            .collect();
        rows.sort_by(|a, b| {
            b.1.unwrap_or(0.0)
                .total_cmp(&a.1.unwrap_or(0.0))
                .then_with(|| a.0.symbol.cmp(&b.0.symbol))
        });

        write_sheet(workbook.add_worksheet(), name, &rows, true).map_err(to_err)?;
    }

    workbook.save(path).map_err(to_err)?;
    Ok(())
}
