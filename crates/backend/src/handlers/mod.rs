pub mod a001_category;
pub mod logs;
