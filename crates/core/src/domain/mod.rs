pub mod addon;
pub mod customer;
pub mod service;
