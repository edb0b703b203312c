pub mod integrate;
pub mod reduce;
pub mod session;
