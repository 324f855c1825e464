mod admin;
mod card;
mod public;
mod user;

pub use admin::admin_routes;
pub use card::card_routes;
pub use public::public_routes;
pub use user::user_routes;
