pub mod date;
pub mod subscription;

pub use date::MonthYear;
