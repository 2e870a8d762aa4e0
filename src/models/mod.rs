pub mod data;
pub mod raster;

pub use data::*;
pub use raster::*;
