pub mod country;
pub mod package;
pub mod quote;
pub mod session;
