pub mod cell;
pub mod sheet;
