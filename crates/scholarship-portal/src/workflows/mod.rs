pub mod applications;
pub mod catalog;
