pub mod admin;
pub mod auth;
pub mod profile;
pub mod raffle;

pub use admin::admin_config;
pub use auth::auth_config;
pub use profile::profile_config;
pub use raffle::raffle_config;
