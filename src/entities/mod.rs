pub mod points_transactions;
pub mod profiles;
pub mod raffle_prizes;
pub mod raffle_tickets;
pub mod round_settings;
pub mod users;

pub use points_transactions as points_transaction_entity;
pub use profiles as profile_entity;
pub use raffle_prizes as raffle_prize_entity;
pub use raffle_tickets as raffle_ticket_entity;
pub use round_settings as round_setting_entity;
pub use users as user_entity;
