pub mod constants;
pub mod error;
pub mod native;
pub mod object;
