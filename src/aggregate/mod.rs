pub mod record;
pub mod table;
pub mod tree;

pub use record::Record;
pub use table::StationTable;
pub use tree::Tree;
