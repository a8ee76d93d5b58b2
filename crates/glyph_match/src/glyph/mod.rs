pub mod clip;
pub mod lazy;
pub mod raster;
