//! Input file reader and text report writer

mod reader;
mod writer;

pub use reader::parse_dat;
pub use writer::ReportWriter;
