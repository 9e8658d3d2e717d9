pub mod socket;
pub mod utils;
