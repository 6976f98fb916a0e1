//! Route matching.

mod table;

pub use edgeway_kernel::PathPattern;
pub use table::RouteTable;
