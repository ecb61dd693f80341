pub mod sqlite_user_store;

pub use sqlite_user_store::SqliteUserStore;
