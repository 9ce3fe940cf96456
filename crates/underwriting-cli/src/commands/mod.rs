pub mod scenarios;
pub mod underwriting;
