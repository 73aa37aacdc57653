// tests/crawler_test.rs

mod common;

use common::{context, https, StaticWordlists};
use shadowrecon::core::cancel::CancelSignal;
use shadowrecon::core::probe::{ConcurrencyBudget, ProbeClient, ProbeOptions};
use shadowrecon::core::scanner::crawler::WebCrawler;
use shadowrecon::core::scanner::CrawlSource;
use shadowrecon::core::target::Target;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

fn client() -> ProbeClient {
    ProbeClient::new(&ProbeOptions::default(), ConcurrencyBudget::new(8), None).unwrap()
}

#[tokio::test]
async fn test_crawler_respects_depth_bound() {
    let server = MockServer::start().await;
    page(&server, "/", r#"<html><a href="/a">a</a></html>"#).await;
    page(&server, "/a", r#"<html><a href="/b">b</a></html>"#).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let prober = client();
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse(&server.uri()).unwrap();

    let report = WebCrawler::new(1, 100).crawl(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    let visited: Vec<(String, usize)> =
        report.pages.iter().map(|p| (url::Url::parse(&p.url).unwrap().path().to_string(), p.depth)).collect();
    assert_eq!(visited, vec![("/".to_string(), 0), ("/a".to_string(), 1)]);
}

#[tokio::test]
async fn test_crawler_stops_at_page_limit() {
    let server = MockServer::start().await;
    let links: String = (1..=5).map(|i| format!(r#"<a href="/p{i}">p{i}</a>"#)).collect();
    page(&server, "/", &format!("<html>{links}</html>")).await;
    for i in 1..=5 {
        page(&server, &format!("/p{i}"), "<html><p>leaf</p></html>").await;
    }

    let prober = client();
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse(&server.uri()).unwrap();

    let report = WebCrawler::new(3, 3).crawl(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();
    assert_eq!(report.pages.len(), 3);
}

#[tokio::test]
async fn test_crawler_collects_forms_and_parameters() {
    let server = MockServer::start().await;
    page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/list?category=books">books</a>
            <a href="http://elsewhere.test/">offsite</a>
            <a href="/data.json">data</a>
            <form action="/search" method="get">
                <input type="text" name="query">
                <input type="submit">
            </form>
        </body></html>"#,
    )
    .await;
    page(&server, "/list", "<html><body>list</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"))
        .mount(&server)
        .await;

    let prober = client();
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse(&server.uri()).unwrap();

    let report = WebCrawler::new(2, 50).crawl(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    assert_eq!(report.pages[0].title.as_deref(), Some("Home"));
    assert!(report.pages.iter().all(|p| !p.url.contains("elsewhere.test")));
    assert_eq!(report.failed, 1, "the JSON document is not a page");

    assert_eq!(report.inputs.len(), 1);
    let form = &report.inputs[0];
    assert_eq!(form.method, "GET");
    assert!(form.action.ends_with("/search"));
    assert_eq!(form.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["query"]);

    assert!(report.parameters.contains("category"));
    assert!(report.parameters.contains("query"));
}
