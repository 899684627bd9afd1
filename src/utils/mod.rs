pub mod datetime;
pub mod jwt;
pub mod password;
pub mod username;

pub use datetime::*;
pub use jwt::*;
pub use password::*;
pub use username::*;
