pub mod auth;
pub mod common;
pub mod pagination;
pub mod profile;
pub mod raffle;
pub mod round;

pub use auth::*;
pub use common::*;
pub use pagination::*;
pub use profile::*;
pub use raffle::*;
pub use round::*;
