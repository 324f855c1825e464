mod env;
mod global_state;
mod middleware;
mod response;
mod routes;
mod utils;

pub use routes::{
    admin_routes,
    card_routes,
    public_routes,
    user_routes,
};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use middleware::{authenticate, ensure_admin};
pub use response::{AppError, AppSuccess};
pub use utils::setup_tracing;
