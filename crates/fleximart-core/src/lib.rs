pub mod clean;
pub mod db;
pub mod error;
pub mod extract;
pub mod load;
pub mod normalize;
pub mod report;
pub mod types;
