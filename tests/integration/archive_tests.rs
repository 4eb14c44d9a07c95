//! Integration tests for the archive flows
//!
//! Pages come from an in-memory renderer; images are served by a wiremock
//! server so asset downloads go over real HTTP.

use learn_archiver::assets::asset_filename;
use learn_archiver::config::{load_config, Config};
use learn_archiver::crawler::Coordinator;
use learn_archiver::extract::{is_error_document, NO_MAIN_CONTENT};
use learn_archiver::output::{read_failure_list, write_failure_list};
use learn_archiver::render::{SnapshotPage, SnapshotRenderer};
use learn_archiver::storage::{open_store, StructureStore};
use learn_archiver::CrawlTarget;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nportal";

/// Writes a config file with every delay zeroed and loads it back
fn create_test_config(dir: &TempDir, base_url: &str) -> Config {
    let archive_root = dir.path().join("content");
    let toml = format!(
        r#"
[course]
title = "Azure Administrator"
url = "/credentials/certifications/azure-administrator/"
base-url = "{base_url}"

[[learning-path]]
title = "AZ-104 Prerequisites"
url = "/training/paths/az-104-prerequisites/"
expected-modules = 1

[discovery]
settle-time = 0
idle-timeout = 100

[extraction]
navigation-attempts = 1
navigation-retry-delay = 0
idle-timeout = 100
idle-retry-delay = 0
settle-time = 0

[assets]
retry-delay = 0

[batch]
batch-size = 2
batch-delay = 0
unit-delay = 0
module-delay = 0
learning-path-delay = 0

[[retry-tier]]
wait = 0
retries = 1

[[retry-tier]]
wait = 0
retries = 2

[[retry-tier]]
wait = 0
retries = 3

[output]
archive-root = "{root}"
"#,
        base_url = base_url,
        root = archive_root.display()
    );

    let config_path = dir.path().join("archive.toml");
    fs::write(&config_path, toml).expect("Failed to write config");
    load_config(&config_path).expect("Failed to load config")
}

fn unit_url(base_url: &str, slug: &str) -> String {
    format!("{}/training/modules/tour-azure-portal/{}/", base_url, slug)
}

/// One learning path listing one module with two units
fn course_renderer(base_url: &str) -> SnapshotRenderer {
    let image = format!("{}/media/portal.png", base_url);
    SnapshotRenderer::new()
        .with_page(
            format!("{}/training/paths/az-104-prerequisites/", base_url),
            SnapshotPage::new(
                r#"<html><body>
                <a href="/training/modules/tour-azure-portal/1-introduction/">Introduction</a>
                <a href="/training/modules/tour-azure-portal/1-introduction/">Start</a>
                <a href="/training/modules/tour-azure-portal/2-navigate/">Navigate the portal</a>
                <a href="/credentials/">Credentials</a>
                </body></html>"#,
            ),
        )
        .with_page(
            unit_url(base_url, "1-introduction"),
            SnapshotPage::new(
                r#"<html><body><nav>menu</nav><main>
                <h1>Introduction</h1><p>The portal.</p>
                <img src="/media/portal.png">
                <div class="feedback">Was this page helpful?</div>
                </main></body></html>"#,
            )
            .with_title("Introduction - Training")
            .with_image("/media/portal.png", image.clone()),
        )
        .with_page(
            unit_url(base_url, "2-navigate"),
            SnapshotPage::new(
                r#"<html><body><main>
                <h1>Navigate</h1><img src="/media/portal.png" alt="Portal home">
                </main></body></html>"#,
            )
            .with_image("/media/portal.png", image),
        )
}

async fn mount_image(server: &MockServer, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/media/portal.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_writes_documents_and_manifest() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_image(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url);
    let renderer = course_renderer(&base_url);
    let coordinator = Coordinator::new(config.clone(), Arc::new(renderer.clone())).unwrap();

    let (structure, tally) = coordinator.run_full_crawl().await.unwrap();
    coordinator.record_failures(&tally).unwrap();

    assert_eq!(tally.processed(), 2);
    assert_eq!(tally.failed(), 0);
    assert_eq!(structure.total_learning_paths, 1);
    assert_eq!(structure.learning_paths[0].actual_modules, 1);
    assert_eq!(structure.learning_paths[0].modules[0].title, "Tour Azure Portal");
    assert_eq!(renderer.sessions_opened(), renderer.sessions_closed());

    // manifest on disk matches and every unit has its document
    let saved = open_store(&config).load().unwrap();
    assert_eq!(saved, structure);

    let units: Vec<_> = saved.units().collect();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].title, "Introduction");
    assert_eq!(units[1].title, "Navigate the portal");

    let image_file = asset_filename(&format!("{}/media/portal.png", base_url));
    for unit in &units {
        assert!(!unit.local_file.is_empty());
        let document = fs::read_to_string(config.archive_root().join(&unit.local_file)).unwrap();
        assert!(!is_error_document(&document));
        assert!(document.contains(&format!("../../../assets/{}", image_file)));
        assert!(document.contains(&unit.url));
    }

    let first = fs::read_to_string(config.archive_root().join(&units[0].local_file)).unwrap();
    assert!(first.contains("<title>Introduction - Training</title>"));
    assert!(!first.contains("Was this page helpful"));
    assert!(!first.contains("menu"));

    let second = fs::read_to_string(config.archive_root().join(&units[1].local_file)).unwrap();
    assert!(second.contains(r#"alt="Portal home""#));

    let asset = fs::read(config.archive_root().join("assets").join(&image_file)).unwrap();
    assert_eq!(asset, PNG_BYTES);

    assert!(read_failure_list(&config.failures_path()).unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_content_produces_error_document() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_image(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url);
    let renderer = course_renderer(&base_url);
    let broken = unit_url(&base_url, "2-navigate");
    renderer.insert_page(
        broken.clone(),
        SnapshotPage::new("<html><body><div class=\"spinner\">Loading</div></body></html>"),
    );

    let coordinator = Coordinator::new(config.clone(), Arc::new(renderer)).unwrap();
    let (structure, tally) = coordinator.run_full_crawl().await.unwrap();
    coordinator.record_failures(&tally).unwrap();

    assert_eq!(tally.processed(), 1);
    assert_eq!(tally.failed(), 1);
    assert_eq!(tally.attempted(), structure.unit_count());

    let failed_unit = structure.units().find(|unit| unit.url == broken).unwrap();
    let document = fs::read_to_string(config.archive_root().join(&failed_unit.local_file)).unwrap();
    assert!(is_error_document(&document));
    assert!(document.contains(&broken));
    assert!(document.contains(NO_MAIN_CONTENT));

    let failures = read_failure_list(&config.failures_path()).unwrap();
    assert_eq!(failures, vec![failed_unit.target()]);
}

#[tokio::test]
async fn test_recrawl_overwrites_in_place_without_refetching_assets() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_image(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url);
    let renderer = course_renderer(&base_url);

    let first_run = Coordinator::new(config.clone(), Arc::new(renderer.clone())).unwrap();
    let (structure, _) = first_run.run_full_crawl().await.unwrap();
    first_run.shutdown().await;

    // the remote page changed since the full crawl
    let changed = unit_url(&base_url, "2-navigate");
    renderer.insert_page(
        changed.clone(),
        SnapshotPage::new(r#"<main><h1>Navigate</h1><p>Revised</p><img src="/media/portal.png"></main>"#)
            .with_image("/media/portal.png", format!("{}/media/portal.png", base_url)),
    );

    // a fresh coordinator starts with an empty in-memory asset map
    let second_run = Coordinator::new(config.clone(), Arc::new(renderer.clone())).unwrap();
    let tally = second_run.recrawl_manifest().await.unwrap();

    assert_eq!(tally.processed(), 2);
    assert_eq!(tally.failed(), 0);
    assert_eq!(renderer.navigation_count(&changed), 2);

    let unit = structure.units().find(|unit| unit.url == changed).unwrap();
    let document = fs::read_to_string(config.archive_root().join(&unit.local_file)).unwrap();
    assert!(document.contains("Revised"));

    // the manifest is read, never rewritten, by a re-crawl
    assert_eq!(open_store(&config).load().unwrap(), structure);
}

#[tokio::test]
async fn test_retry_escalates_then_rewrites_failure_list() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_image(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url);
    let renderer = course_renderer(&base_url);

    let flaky = unit_url(&base_url, "1-introduction");
    let gone = unit_url(&base_url, "2-navigate");
    renderer.fail_navigation(flaky.clone(), 2);
    renderer.always_fail_navigation(gone.clone());

    let targets = vec![
        CrawlTarget {
            url: flaky.clone(),
            path: "english/01_AZ-104_Prerequisites/01_Tour_Azure_Portal/01_Introduction.html"
                .to_string(),
            title: "Introduction".to_string(),
        },
        CrawlTarget {
            url: gone.clone(),
            path: "english/01_AZ-104_Prerequisites/01_Tour_Azure_Portal/02_Navigate.html"
                .to_string(),
            title: "Navigate".to_string(),
        },
    ];
    write_failure_list(&config.failures_path(), &targets).unwrap();

    let coordinator = Coordinator::new(config.clone(), Arc::new(renderer.clone())).unwrap();
    let pending = read_failure_list(&config.failures_path()).unwrap();
    let tally = coordinator.retry_failed(&pending).await.unwrap();
    coordinator.record_failures(&tally).unwrap();

    assert_eq!(tally.processed(), 1);
    assert_eq!(tally.failed(), 1);
    assert_eq!(renderer.navigation_count(&flaky), 3);
    // 1 + 2 + 3 attempts across the configured tiers
    assert_eq!(renderer.navigation_count(&gone), 6);
    assert_eq!(renderer.sessions_opened(), renderer.sessions_closed());

    let still_failing = read_failure_list(&config.failures_path()).unwrap();
    assert_eq!(still_failing, vec![targets[1].clone()]);

    let recovered = fs::read_to_string(config.archive_root().join(&targets[0].path)).unwrap();
    assert!(!is_error_document(&recovered));
    let abandoned = fs::read_to_string(config.archive_root().join(&targets[1].path)).unwrap();
    assert!(is_error_document(&abandoned));
}

#[tokio::test]
async fn test_single_unit_recrawl() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_image(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url);
    let coordinator = Coordinator::new(config.clone(), Arc::new(course_renderer(&base_url))).unwrap();

    let target = CrawlTarget {
        url: unit_url(&base_url, "1-introduction"),
        path: "english/manual/intro.html".to_string(),
        title: "Introduction".to_string(),
    };
    let tally = coordinator.crawl_single(&target).await.unwrap();

    assert_eq!(tally.processed(), 1);
    assert!(config.archive_root().join(&target.path).is_file());
}
