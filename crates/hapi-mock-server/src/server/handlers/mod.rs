pub mod mock;
pub mod requests;
pub mod rules;
pub mod system;
