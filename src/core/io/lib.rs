mod read;
mod table;

pub use read::*;
pub use table::*;

pub mod write;
pub use write::*;

/// Raw column holding the daily index value
pub const RAW_INDEX_COLUMN: &str = "Index Value";
/// Raw column holding the `"<participated>/<total>"` station ratio
pub const RAW_STATIONS_COLUMN: &str = "No. of Stations Participated/ Total Stations";

/// Cleaned target column
pub const INDEX_VALUE: &str = "Index Value";
/// Cleaned numerator of the station ratio
pub const STATIONS_PARTICIPATED: &str = "Stations Participated";
/// Cleaned denominator of the station ratio
pub const TOTAL_STATIONS: &str = "Total Stations";
