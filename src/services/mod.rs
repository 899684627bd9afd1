pub mod auth_service;
pub mod profile_service;
pub mod raffle_service;
pub mod round_service;

pub use auth_service::*;
pub use profile_service::ProfileService;
pub use raffle_service::*;
pub use round_service::RoundService;
