pub mod page;
pub mod responses;
