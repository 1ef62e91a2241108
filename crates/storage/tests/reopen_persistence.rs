use storage::Storage;

#[tokio::test]
async fn values_survive_reopening_the_database_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("client.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let storage = Storage::new(&database_url).await.expect("open");
        storage
            .put_value("prompt_history", r#"["b","a"]"#)
            .await
            .expect("put");
        storage.pool().close().await;
    }

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened
            .get_value("prompt_history")
            .await
            .expect("get")
            .as_deref(),
        Some(r#"["b","a"]"#)
    );
}
