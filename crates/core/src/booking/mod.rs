pub mod promo;
pub mod relay;
pub mod submission;
