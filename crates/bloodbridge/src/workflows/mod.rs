pub mod donors;
pub mod requests;
