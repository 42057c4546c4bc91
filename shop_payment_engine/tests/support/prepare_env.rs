use log::*;
use shop_payment_engine::SqliteOrderStore;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

/// Points a test at its own throwaway SQLite file under `../data`.
pub fn random_db_path() -> String {
    format!("sqlite://../data/test_store_{}.db", rand::random::<u64>())
}

/// Drops any stale database at `url`, recreates it and brings the schema up
/// to date. Call once at the top of each test.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    recreate_database(url).await;
    apply_migrations(url).await;
}

async fn recreate_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Could not drop stale database at {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("could not create the test database");
    info!("🚀️ Fresh Sqlite database at {url}");
}

async fn apply_migrations(url: &str) {
    let store = SqliteOrderStore::new_with_url(url, 5).await.expect("could not connect to the test database");
    migrate!("./src/sqlite/migrations").run(store.pool()).await.expect("migrations failed");
    info!("🚀️ Schema is up to date");
}
