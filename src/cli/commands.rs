pub mod initdb;
pub mod process;
pub mod serve;

pub use initdb::init_database;
pub use process::process_subscriptions;
pub use serve::serve;
