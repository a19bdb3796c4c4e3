// ============================================================================
// Postgres Post Store Tests
// ============================================================================
//
// Run against the database in DATABASE_URL, e.g.
// `docker run -e POSTGRES_PASSWORD=board -p 5432:5432 postgres`.
// Skipped when DATABASE_URL is not set.
//
// ============================================================================

use board_server::{
    config::DbConfig,
    db::{create_pool, run_migrations, PgPostStore},
    models::{NewPost, PostOrder},
    store::PostStore,
};

async fn connect() -> Option<PgPostStore> {
    let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;
    let config = DbConfig {
        url: Some(url.clone()),
        max_connections: 2,
        acquire_timeout_secs: 5,
    };

    let pool = create_pool(&url, &config)
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");

    Some(PgPostStore::new(pool))
}

fn new_post(content: &str, user: &str) -> NewPost {
    NewPost {
        content: content.to_string(),
        tracking_cookie: "1_abc".to_string(),
        posted_by: user.to_string(),
    }
}

#[tokio::test]
async fn test_pg_store_lifecycle() {
    let Some(store) = connect().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };

    store.ping().await.unwrap();

    let first = store.create(new_post("<b>one</b>", "guest1")).await.unwrap();
    let second = store.create(new_post("two", "guest2")).await.unwrap();
    assert!(second.id > first.id);
    assert_eq!(first.content, "<b>one</b>");
    assert_eq!(first.posted_by, "guest1");
    assert_eq!(first.tracking_cookie, "1_abc");

    let found = store.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(found, first);

    let ids: Vec<i64> = store
        .find_all(PostOrder::IdDesc)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    let second_pos = ids.iter().position(|id| *id == second.id).unwrap();
    let first_pos = ids.iter().position(|id| *id == first.id).unwrap();
    assert!(second_pos < first_pos);

    assert!(store.destroy(first.id).await.unwrap());
    assert!(!store.destroy(first.id).await.unwrap());
    assert!(store.find_by_id(first.id).await.unwrap().is_none());

    store.destroy(second.id).await.unwrap();
}
