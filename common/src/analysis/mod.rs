// Analysis module: turns raw exchange data into per-stock signals
//
// Pure indicator math lives in `indicators`/`pressure`/`sentiment`; the
// `decision` matrix combines their outputs; `analyzer` drives the whole
// thing concurrently across the listed securities.

pub mod analyzer;
pub mod decision;
pub mod indicators;
pub mod pressure;
pub mod sentiment;

pub use analyzer::StockAnalyzer;
pub use decision::decide;
