//! Remote entries fetched over HTTP

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use federated_bootstrap::{Bootstrap, EntryFetcher, Error, HttpFetcher, Stage};
use serde_json::json;
use tokio::net::TcpListener;
use url::Url;

mod common;
use common::{config, descriptor, plugins_module};

/// Serve `a`'s entry; every other extension 404s
async fn serve() -> Url {
    let entry = json!({
        "name": "a",
        "modules": {
            "./extension": plugins_module(&["a:one", "a:two"]),
            "./style": {"kind": "style", "href": "static/style.css"}
        }
    })
    .to_string();

    let router = Router::new()
        .route(
            "/lab/extensions/a/remoteEntry.json",
            get(move || async move { entry }),
        )
        .fallback(|| async { StatusCode::NOT_FOUND });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Url::parse(&format!("http://{addr}/lab/extensions/")).unwrap()
}

#[tokio::test]
async fn fetcher_reports_http_errors() {
    let base = serve().await;
    let fetcher = HttpFetcher::new();

    let body = fetcher
        .fetch(&base.join("a/remoteEntry.json").unwrap())
        .await
        .unwrap();
    assert!(body.contains("a:one"));

    let missing = fetcher.fetch(&base.join("b/remoteEntry.json").unwrap()).await;
    assert!(matches!(missing, Err(Error::Fetch(msg)) if msg.contains("404")));
}

#[tokio::test]
async fn loads_extensions_over_http() {
    let base = serve().await;
    let extensions = json!([
        descriptor("a", Some("./extension"), Some("./style")),
        descriptor("b", Some("./extension"), None),
    ]);
    let bootstrap = Bootstrap::new(
        config(base.clone(), &extensions, &["a:two"]),
        Arc::new(HttpFetcher::new()),
    );

    let report = bootstrap.assemble(Vec::new()).await.unwrap();

    assert_eq!(report.plugin_ids(), vec!["a:one"]);
    assert_eq!(report.loaded, vec!["a"]);
    assert_eq!(report.failures_in(Stage::Load).len(), 1);
    assert_eq!(report.failures_in(Stage::Load)[0].extension, "b");
    assert_eq!(
        report.styles[0].url,
        base.join("a/static/style.css").unwrap()
    );
}

#[tokio::test]
async fn unsupported_scheme_is_rejected() {
    let fetcher = HttpFetcher::new();
    let result = fetcher
        .fetch(&Url::parse("ftp://example.com/remoteEntry.json").unwrap())
        .await;
    assert!(matches!(result, Err(Error::Fetch(_))));
}
