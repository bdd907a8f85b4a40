pub mod pricing;
pub mod slug;
pub mod status;
pub mod stock;
pub mod training;
