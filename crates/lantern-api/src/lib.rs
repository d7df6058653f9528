pub mod auth;
pub mod catalog;
pub mod errors;
pub mod middleware;
pub mod public;
pub mod submissions;
