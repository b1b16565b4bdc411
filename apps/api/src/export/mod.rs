// Export surface: headless-Chrome PDF capture and per-page merge.

pub mod merge;
pub mod pdf;

pub use pdf::PdfExporter;
