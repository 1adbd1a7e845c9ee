use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check() {
    let app = spawn_app().await;

    let resp = app.get("/health_check").await;
    assert!(resp.status().is_success());
    assert_eq!(resp.content_length().unwrap(), 0); // empty body
}

#[tokio::test]
async fn static_pages() {
    let app = spawn_app().await;

    for route in ["/confirmed", "/confirm-error"] {
        let resp = app.get(route).await;
        assert_eq!(resp.status().as_u16(), 200, "{route}");
        assert!(resp
            .headers()
            .get("Content-Type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }
}
