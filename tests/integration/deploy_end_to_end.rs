//! End-to-end deployment tests against a directory store

use super::test_utils::write_files;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use wood::cdn::{CdnInvalidator, DryRunInvalidator};
use wood::concurrency::CancelToken;
use wood::deploy::{DeployConfig, DeployOrdering, Deployment};
use wood::store::DirectoryStore;

const SITE: &[(&str, &str)] = &[
    ("index.html", "<html>v1</html>"),
    ("about.html", "about"),
    ("contact.html", "contact"),
    ("robots.txt", "User-agent: *"),
    ("favicon.ico", "icon"),
    ("feed.xml", "<rss/>"),
    ("blog/one.html", "one"),
    ("blog/two.html", "two"),
    ("blog/three.html", "three"),
    ("img/logo.png", "logo"),
];

struct Fixture {
    site: TempDir,
    bucket: TempDir,
    cdn: Arc<DryRunInvalidator>,
}

impl Fixture {
    fn new() -> Self {
        let site = TempDir::new().unwrap();
        write_files(site.path(), SITE);
        Self {
            site,
            bucket: TempDir::new().unwrap(),
            cdn: Arc::new(DryRunInvalidator::new("edge", 2)),
        }
    }

    fn deployment(&self, config: DeployConfig) -> Deployment {
        Deployment::new(
            self.site.path().to_path_buf(),
            Arc::new(DirectoryStore::new(self.bucket.path().to_path_buf())),
            vec![self.cdn.clone() as Arc<dyn CdnInvalidator>],
            config,
        )
    }
}

#[tokio::test]
async fn test_initial_deploy_uploads_without_invalidating() {
    let fixture = Fixture::new();
    let report = fixture
        .deployment(DeployConfig::default())
        .run(&CancelToken::new())
        .await
        .unwrap();

    assert!(!report.has_failures());
    assert_eq!(report.comparison.as_ref().unwrap().added_count, SITE.len());
    assert!(report.patterns.is_empty());
    assert!(fixture.cdn.submitted().is_empty());
    assert_eq!(
        fs::read_to_string(fixture.bucket.path().join("blog/two.html")).unwrap(),
        "two"
    );
}

#[tokio::test]
async fn test_redeploy_invalidates_changed_paths() {
    let fixture = Fixture::new();
    let cancel = CancelToken::new();
    fixture
        .deployment(DeployConfig::default())
        .run(&cancel)
        .await
        .unwrap();

    // Rewrite most of the blog, change the index, drop the logo
    write_files(
        fixture.site.path(),
        &[
            ("index.html", "<html>v2</html>"),
            ("blog/one.html", "one v2"),
            ("blog/two.html", "two v2"),
        ],
    );
    fs::remove_file(fixture.site.path().join("img/logo.png")).unwrap();

    let report = fixture
        .deployment(DeployConfig::default())
        .run(&cancel)
        .await
        .unwrap();

    assert!(!report.has_failures());
    let rendered: Vec<String> = report.patterns.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["/blog/*", "/img/logo.png", "/index.html"]);
    assert!(!fixture.bucket.path().join("img").exists());

    // Limit of two patterns per request
    let sizes: Vec<usize> = fixture.cdn.submitted().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 1]);
    assert_eq!(report.invalidations[0].reference_ids().len(), 2);
}

#[tokio::test]
async fn test_concurrent_ordering_reaches_same_state() {
    let fixture = Fixture::new();
    let config = DeployConfig {
        ordering: DeployOrdering::Concurrent,
        ..DeployConfig::default()
    };
    fixture
        .deployment(config.clone())
        .run(&CancelToken::new())
        .await
        .unwrap();

    let plan = fixture.deployment(config).plan().await.unwrap();
    assert!(plan.comparison.is_empty());
    assert!(plan.patterns.is_empty());
}

#[tokio::test]
async fn test_cancelled_deploy_reports_skips() {
    let fixture = Fixture::new();
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = fixture
        .deployment(DeployConfig::default())
        .run(&cancel)
        .await
        .unwrap();

    assert!(report.has_failures());
    assert_eq!(report.sync.skipped().count(), SITE.len());
    assert_eq!(fs::read_dir(fixture.bucket.path()).unwrap().count(), 0);
}
