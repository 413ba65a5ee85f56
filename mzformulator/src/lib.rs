mod args;
mod driver;
mod peak_list;
mod write;

pub use args::*;
pub use driver::{MZFormulator, MZFormulatorError};
pub use peak_list::{read_peak_list, read_peak_list_path};
pub use write::{write_reports, write_tables, QueryReport};
