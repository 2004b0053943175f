pub mod api;
pub mod catalog;
pub mod database_ops;

pub mod util {
    pub mod env;
    pub mod logging;
}
