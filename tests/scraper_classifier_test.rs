mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{profile_url, test_config, violation_json, FakeDriver, FakePage, FakePost, Reply, ScriptedBackend};
use profile_report_flow::models::snapshot::UNKNOWN_NAME;
use profile_report_flow::models::Target;
use profile_report_flow::services::{ContentScraper, ViolationClassifier};
use profile_report_flow::workflow::locators;

fn scraper() -> ContentScraper {
    ContentScraper::new(&test_config(&std::env::temp_dir()))
}

fn posts(count: usize) -> Vec<FakePost> {
    (0..count)
        .map(|i| FakePost {
            text: format!("post {}", i),
            timestamp: format!("2024-01-0{} 10:00", (i % 9) + 1),
            reactions: i,
        })
        .collect()
}

#[tokio::test]
async fn test_scrape_applies_caps_and_host_filter() {
    let url = profile_url("caps");
    let mut images: Vec<String> = (0..12)
        .map(|i| format!("https://scontent.xx.facebook.com/{}.jpg", i))
        .collect();
    images.insert(0, "https://cdn.example.org/tracker.gif".to_string());

    let driver = FakeDriver::new().with_page(
        &url,
        FakePage {
            name: "Caps Profile".into(),
            bio: "hello".into(),
            posts: posts(8),
            images,
            friends: Some("1,234 friends".into()),
        },
    );

    let snapshot = scraper().scrape(&Target::new(url.clone()), &driver).await;

    assert!(!snapshot.is_error());
    assert_eq!(snapshot.profile_info.name, "Caps Profile");
    assert_eq!(snapshot.profile_info.bio, "hello");
    assert_eq!(snapshot.profile_info.url, url);
    assert_eq!(snapshot.posts.len(), 5);
    assert_eq!(snapshot.posts[2].text, "post 2");
    assert_eq!(snapshot.posts[2].reaction_count, 2);
    assert_eq!(snapshot.posts[2].timestamp, "2024-01-03 10:00");
    assert_eq!(snapshot.image_refs.len(), 10);
    assert!(snapshot.image_refs.iter().all(|src| src.contains("facebook.com")));
    assert_eq!(snapshot.friends_count.as_deref(), Some("1,234 friends"));
}

#[tokio::test]
async fn test_scrape_uses_placeholders_for_missing_parts() {
    let url = profile_url("sparse");
    let driver = FakeDriver::new()
        .with_page(&url, FakePage::default())
        .block(locators::PROFILE_NAME)
        .block(locators::PROFILE_BIO);

    let snapshot = scraper().scrape(&Target::new(url), &driver).await;

    assert!(!snapshot.is_error());
    assert_eq!(snapshot.profile_info.name, UNKNOWN_NAME);
    assert_eq!(snapshot.profile_info.bio, "");
    assert!(snapshot.posts.is_empty());
    assert!(snapshot.image_refs.is_empty());
    assert_eq!(snapshot.friends_count, None);
}

#[tokio::test]
async fn test_scrape_navigation_failure_yields_error_snapshot() {
    let url = profile_url("down");
    let driver = FakeDriver::new().failing_navigation(&url);

    let snapshot = scraper().scrape(&Target::new(url), &driver).await;

    assert!(snapshot.is_error());
    assert!(snapshot.posts.is_empty());
}

#[tokio::test]
async fn test_scrape_unavailable_page_yields_error_snapshot() {
    let url = profile_url("removed");
    let driver = FakeDriver::new().unavailable(&url);

    let snapshot = scraper().scrape(&Target::new(url), &driver).await;

    assert!(snapshot.is_error());
}

#[tokio::test]
async fn test_classifier_keeps_unit_order_and_drops_bad_units() {
    let url = profile_url("mixed");
    let driver = FakeDriver::new().with_page(
        &url,
        FakePage {
            posts: vec![
                FakePost {
                    text: "buy followers now".into(),
                    timestamp: String::new(),
                    reactions: 0,
                },
                FakePost {
                    text: "garbage reply".into(),
                    timestamp: String::new(),
                    reactions: 0,
                },
                FakePost {
                    text: "backend down".into(),
                    timestamp: String::new(),
                    reactions: 0,
                },
            ],
            ..FakePage::default()
        },
    );
    let snapshot = scraper().scrape(&Target::new(url.clone()), &driver).await;

    let backend = Arc::new(
        ScriptedBackend::new()
            .violation_for(&url, "fake_account", 70.0, "Fake Profile")
            .reply("buy followers", Reply::Text(violation_json("spam", 88.0, "Spam")))
            .reply("garbage reply", Reply::Text("I think it's fine.".into()))
            .reply("backend down", Reply::Error),
    );
    let classifier = ViolationClassifier::new(backend.clone(), Duration::from_secs(5));

    let candidates = classifier.classify(&snapshot).await;

    // 主页信息 + 3 条帖子，各请求一次
    assert_eq!(backend.calls().len(), 4);
    let kinds: Vec<_> = candidates.iter().map(|c| c.violation_type.as_str()).collect();
    assert_eq!(kinds, vec!["fake_account", "spam"]);
}

#[tokio::test]
async fn test_classifier_timeout_discards_unit() {
    let url = profile_url("slow");
    let driver = FakeDriver::new();
    let snapshot = scraper().scrape(&Target::new(url.clone()), &driver).await;

    let backend = Arc::new(ScriptedBackend::new().reply(&url, Reply::Hang));
    let classifier = ViolationClassifier::new(backend, Duration::from_millis(50));

    let candidates = classifier.classify(&snapshot).await;
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn test_classifier_skips_error_snapshot() {
    let url = profile_url("down");
    let driver = FakeDriver::new().failing_navigation(&url);
    let snapshot = scraper().scrape(&Target::new(url), &driver).await;

    let backend = Arc::new(ScriptedBackend::new());
    let classifier = ViolationClassifier::new(backend.clone(), Duration::from_secs(1));

    assert!(classifier.classify(&snapshot).await.is_empty());
    assert!(backend.calls().is_empty());
}
