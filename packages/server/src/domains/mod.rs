// Business domains
pub mod hotels;
