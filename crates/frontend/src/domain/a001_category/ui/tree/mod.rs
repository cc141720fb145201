mod widget;

pub use widget::CategoryTree;
