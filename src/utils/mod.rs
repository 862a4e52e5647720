pub mod jwt;
pub mod pagination;
