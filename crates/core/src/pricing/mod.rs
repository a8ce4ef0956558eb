pub mod discount;
pub mod evaluator;
pub mod format;
pub mod rules;
pub mod session;
pub mod state;
pub mod table;
