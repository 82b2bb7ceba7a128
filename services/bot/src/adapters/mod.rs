pub mod pdf_report;
pub mod telegram;

pub use pdf_report::PdfReportRenderer;
pub use telegram::TelegramTransport;
