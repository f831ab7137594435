// Application records and the admin recruiting workflow around the interview.

pub mod handlers;
pub mod models;
pub mod store;
pub mod workflow;
