pub mod engine;
pub mod notify;
pub mod payments;
pub mod postcode;
pub mod pricing;
