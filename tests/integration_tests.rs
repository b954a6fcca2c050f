//! Integration tests for the translation overlay
//!
//! These run the full boot/switch sequence against a mocked asset server and
//! check the page the way a user would see it.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use translation_overlay::{
    config::OverlayConfig,
    dom::Document,
    engine::OverlayEngine,
    i18n::Language,
    overlay::{RTL_CLASS, RTL_STYLESHEET_ID},
    preference::{FileStore, MemoryStore, PreferenceStore},
};

// ==================== Test Helpers ====================

/// Task list page as rendered by the server
fn task_page() -> Document {
    Document::from_json(
        r##"{
            "tag": "html",
            "attrs": {"lang": "en"},
            "children": [
                {"tag": "head", "children": [
                    {"tag": "link", "attrs": {"rel": "stylesheet", "href": "/static/core/css/main.css"}}
                ]},
                {"tag": "body", "children": [
                    {"tag": "nav", "children": [
                        {"tag": "a", "attrs": {"id": "nav-dashboard", "data-i18n": "nav.dashboard"}, "children": [{"text": "Dashboard"}]},
                        {"tag": "a", "attrs": {"id": "nav-reports", "data-i18n": "nav.reports"}, "children": [{"text": "Reports"}]},
                        {"tag": "a", "attrs": {"id": "switch-ar", "href": "#", "data-lang-select": "ar"}, "children": [{"text": "العربية"}]},
                        {"tag": "a", "attrs": {"id": "switch-en", "href": "#", "data-lang-select": "en"}, "children": [{"text": "English"}]}
                    ]},
                    {"tag": "form", "children": [
                        {"tag": "input", "attrs": {"type": "hidden", "name": "csrfmiddlewaretoken", "value": "task Open"}},
                        {"tag": "input", "attrs": {"id": "search", "placeholder": "Search", "data-i18n-attr": "{\"placeholder\": \"forms.search\"}"}}
                    ]},
                    {"tag": "ul", "children": [
                        {"tag": "li", "attrs": {"id": "row-1"}, "children": [{"text": "Task is Open now"}]},
                        {"tag": "li", "attrs": {"id": "row-2"}, "children": [{"text": "task list"}]},
                        {"tag": "li", "attrs": {"id": "row-3"}, "children": [{"text": "multitasking"}]}
                    ]}
                ]}
            ]
        }"##,
    )
    .expect("valid snapshot")
}

async fn mount_json(server: &MockServer, file: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/static/core/i18n/{}", file)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Arabic dictionary, phrases and lexicon
async fn mount_arabic(server: &MockServer) {
    mount_json(
        server,
        "ar.json",
        json!({
            "nav": {"dashboard": "لوحة التحكم"},
            "forms": {"search": "بحث"}
        }),
    )
    .await;
    mount_json(server, "phrases.ar.json", json!({"Open": "مفتوح"})).await;
    mount_json(server, "lexicon.ar.json", json!({"task": "مهمة"})).await;
}

fn config(server: &MockServer) -> OverlayConfig {
    let mut config = OverlayConfig::for_base_url(&server.uri());
    config.fetch_max_attempts = 1;
    config
}

fn text_of(document: &Document, id: &str) -> String {
    let node = document.element_by_id(id).expect("element exists");
    document.text_content(node)
}

fn attr_of(document: &Document, id: &str, name: &str) -> Option<String> {
    let node = document.element_by_id(id)?;
    document.attr(node, name).map(str::to_string)
}

fn csrf_value(document: &Document) -> Option<String> {
    document
        .elements_with_attr("name")
        .into_iter()
        .find(|n| document.attr(*n, "name") == Some("csrfmiddlewaretoken"))
        .and_then(|n| document.attr(n, "value").map(str::to_string))
}

// ==================== Boot Tests ====================

#[tokio::test]
async fn test_boot_in_arabic_applies_every_pass() {
    let server = MockServer::start().await;
    mount_arabic(&server).await;

    let engine = OverlayEngine::new(
        config(&server),
        Arc::new(MemoryStore::with_value("ar")),
        task_page(),
    )
    .expect("engine should build");
    engine.boot().await.wait().await;

    let page = engine.document().await;

    // Structured pass
    assert_eq!(text_of(&page, "nav-dashboard"), "لوحة التحكم");
    assert_eq!(text_of(&page, "nav-reports"), "Reports");
    assert_eq!(attr_of(&page, "search", "placeholder").as_deref(), Some("بحث"));

    // Sweep
    assert_eq!(text_of(&page, "row-1"), "مهمة is مفتوح now");
    assert_eq!(text_of(&page, "row-2"), "مهمة list");
    assert_eq!(text_of(&page, "row-3"), "multitasking");
    assert_eq!(csrf_value(&page).as_deref(), Some("task Open"));

    // Direction
    assert_eq!(page.attr(page.root(), "lang"), Some("ar"));
    assert!(page.has_class(page.root(), RTL_CLASS));
}

#[tokio::test]
async fn test_boot_with_corrupt_preference_file_resets_to_english() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("temp dir");
    let prefs = temp_dir.path().join("prefs.json");
    std::fs::write(&prefs, r#"{"ui.lang": "klingon"}"#).expect("write prefs");

    let store = Arc::new(FileStore::new(&prefs));
    let engine = OverlayEngine::new(config(&server), store.clone(), task_page()).unwrap();

    let handles = engine.boot().await;
    assert_eq!(handles.language, Language::ENGLISH);
    handles.wait().await;

    assert_eq!(store.load().as_deref(), Some("en"));
    let page = engine.document().await;
    assert_eq!(text_of(&page, "row-1"), "Task is Open now");
}

#[tokio::test]
async fn test_phrase_map_failure_leaves_structured_pass_working() {
    let server = MockServer::start().await;
    mount_json(&server, "ar.json", json!({"nav": {"dashboard": "لوحة التحكم"}})).await;
    Mock::given(method("GET"))
        .and(path("/static/core/i18n/phrases.ar.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = OverlayEngine::new(
        config(&server),
        Arc::new(MemoryStore::with_value("ar")),
        task_page(),
    )
    .unwrap();
    let (structured, sweep) = engine.boot().await.wait().await;

    assert_eq!(structured.applied, 1);
    assert_eq!(sweep.applied, 0);

    let page = engine.document().await;
    assert_eq!(text_of(&page, "nav-dashboard"), "لوحة التحكم");
    assert_eq!(text_of(&page, "row-1"), "Task is Open now");
    assert_eq!(text_of(&page, "row-2"), "task list");
}

#[tokio::test]
async fn test_unreachable_asset_server_keeps_original_page() {
    let engine = OverlayEngine::new(
        OverlayConfig::for_base_url("http://127.0.0.1:9"),
        Arc::new(MemoryStore::with_value("ar")),
        task_page(),
    )
    .unwrap();
    engine.boot().await.wait().await;

    let page = engine.document().await;
    assert_eq!(text_of(&page, "nav-dashboard"), "Dashboard");
    assert_eq!(text_of(&page, "row-1"), "Task is Open now");
    // direction does not depend on the network
    assert!(page.has_class(page.root(), RTL_CLASS));
}

// ==================== Switch Tests ====================

#[tokio::test]
async fn test_switching_to_arabic_twice_injects_one_stylesheet() {
    let server = MockServer::start().await;
    mount_arabic(&server).await;

    let engine =
        OverlayEngine::new(config(&server), Arc::new(MemoryStore::new()), task_page()).unwrap();
    engine.boot().await.wait().await;

    engine.switch_language("ar").await.unwrap().wait().await;
    engine.switch_language("ar").await.unwrap().wait().await;

    let page = engine.document().await;
    assert!(page.has_class(page.root(), RTL_CLASS));
    let links: Vec<_> = page
        .elements_with_attr("id")
        .into_iter()
        .filter(|n| page.attr(*n, "id") == Some(RTL_STYLESHEET_ID))
        .collect();
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_repeated_switch_converges() {
    let server = MockServer::start().await;
    mount_arabic(&server).await;

    let engine =
        OverlayEngine::new(config(&server), Arc::new(MemoryStore::new()), task_page()).unwrap();
    engine.switch_language("ar").await.unwrap().wait().await;
    let first = engine.document().await.to_snapshot();

    engine.switch_language("ar").await.unwrap().wait().await;
    let second = engine.document().await.to_snapshot();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rapid_switches_persist_last_click() {
    let server = MockServer::start().await;
    for file in ["ar.json", "en.json", "phrases.ar.json", "phrases.en.json"] {
        Mock::given(method("GET"))
            .and(path(format!("/static/core/i18n/{}", file)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
    }

    let temp_dir = TempDir::new().expect("temp dir");
    let store = Arc::new(FileStore::new(temp_dir.path().join("prefs.json")));
    let engine = OverlayEngine::new(config(&server), store.clone(), task_page()).unwrap();

    let page = engine.document().await;
    let to_arabic = page.element_by_id("switch-ar").unwrap();
    let to_english = page.element_by_id("switch-en").unwrap();

    // Both clicks land before either fetch resolves
    let first = engine.click(to_arabic).await.expect("arabic is supported");
    let second = engine.click(to_english).await.expect("english is supported");
    assert_eq!(store.load().as_deref(), Some("en"));

    first.wait().await;
    second.wait().await;

    assert_eq!(store.load().as_deref(), Some("en"));
    let page = engine.document().await;
    assert_eq!(page.attr(page.root(), "lang"), Some("en"));
    assert!(!page.has_class(page.root(), RTL_CLASS));
}

#[tokio::test]
async fn test_round_trip_back_to_english() {
    let server = MockServer::start().await;
    mount_arabic(&server).await;
    mount_json(&server, "en.json", json!({"nav": {"dashboard": "Dashboard"}})).await;

    let engine = OverlayEngine::new(
        config(&server),
        Arc::new(MemoryStore::with_value("ar")),
        task_page(),
    )
    .unwrap();
    engine.boot().await.wait().await;
    engine.switch_language("en").await.unwrap().wait().await;

    let page = engine.document().await;
    assert_eq!(text_of(&page, "nav-dashboard"), "Dashboard");
    // mirrored phrase map reverses the phrase, not the lexicon word
    assert_eq!(text_of(&page, "row-1"), "مهمة is Open now");
    assert!(page.element_by_id(RTL_STYLESHEET_ID).is_none());
}

// ==================== Output Tests ====================

#[tokio::test]
async fn test_translated_page_renders_to_html() {
    let server = MockServer::start().await;
    mount_arabic(&server).await;

    let engine = OverlayEngine::new(
        config(&server),
        Arc::new(MemoryStore::with_value("ar")),
        task_page(),
    )
    .unwrap();
    engine.boot().await.wait().await;

    let html = engine.document().await.to_html();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"<html class="rtl-ui" lang="ar">"#));
    assert!(html.contains(r#"href="/static/core/css/rtl.css""#));
    assert!(html.contains("لوحة التحكم"));
}
