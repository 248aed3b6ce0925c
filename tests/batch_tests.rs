mod common;

use common::*;
use coupon_validator::prelude::*;
use coupon_validator::{BatchResult, ExecutorError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn executor(browser: FakeBrowser) -> Executor {
    Executor::with_launcher(Arc::new(FakeLauncher::new(browser)))
}

fn coupons(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_batch_runs_each_coupon_in_its_own_directory() {
    let dir = create_test_dir();
    let browser = FakeBrowser::new()
        .with_element("#code", "")
        .with_element("#msg", "Success");

    let result = BatchRunner::new(executor(browser.clone()))
        .run(&fill_and_check_site(), &coupons(&["A", "B"]), dir.path())
        .await
        .unwrap();

    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[0].output_dir, dir.path().join("1-A"));
    assert_eq!(result.entries[1].output_dir, dir.path().join("2-B"));
    assert_eq!(result.valid_count(), 2);

    for entry in &result.entries {
        assert!(entry.output_dir.join("result.json").exists());
        assert!(entry.output_dir.join("screenshot.png").exists());
    }

    let fills: Vec<_> = browser
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("fill"))
        .collect();
    assert_eq!(fills, vec!["fill #code A", "fill #code B"]);
    assert_eq!(browser.close_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_batch_delay_only_between_runs() {
    let dir = create_test_dir();
    let browser = FakeBrowser::new()
        .with_element("#code", "")
        .with_element("#msg", "nope");
    let start = Instant::now();

    BatchRunner::new(executor(browser))
        .run(&fill_and_check_site(), &coupons(&["A", "B", "C"]), dir.path())
        .await
        .unwrap();

    // Two 3s gaps plus each run's 500ms wait after filling
    assert_eq!(start.elapsed(), Duration::from_millis(6000 + 3 * 500));
}

#[tokio::test(start_paused = true)]
async fn test_batch_custom_delay() {
    let dir = create_test_dir();
    let browser = FakeBrowser::new().with_element("#code", "");
    let start = Instant::now();

    BatchRunner::new(executor(browser))
        .delay(Duration::from_millis(250))
        .run(&fill_and_check_site(), &coupons(&["A", "B"]), dir.path())
        .await
        .unwrap();

    assert_eq!(start.elapsed(), Duration::from_millis(250 + 2 * 500));
}

#[tokio::test(start_paused = true)]
async fn test_batch_verdicts_are_independent() {
    let dir = create_test_dir();
    let site = site(
        r##"{
            "productUrl": "https://shop.example/product",
            "actions": [],
            "codeValidation": { "element": "#msg", "validText": "Success" }
        }"##,
    );
    let browser = FakeBrowser::new().with_element("#msg", "Success");

    let result: BatchResult = BatchRunner::new(executor(browser))
        .delay(Duration::ZERO)
        .run(&site, &coupons(&["ONE", "TWO"]), dir.path())
        .await
        .unwrap();

    assert!(result.any_valid());
    assert!(result.entries.iter().all(|e| e.coupon_is_valid));
}

#[tokio::test(start_paused = true)]
async fn test_batch_stops_on_empty_coupon() {
    let dir = create_test_dir();
    let launcher = FakeLauncher::new(FakeBrowser::new());

    let err = BatchRunner::new(Executor::with_launcher(Arc::new(launcher.clone())))
        .run(&fill_and_check_site(), &coupons(&[""]), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::Config(_)));
    assert!(launcher.launches().is_empty());
    assert!(!dir.path().join("1-").exists());
}

#[tokio::test(start_paused = true)]
async fn test_batch_sanitizes_directory_names() {
    let dir = create_test_dir();
    let browser = FakeBrowser::new().with_element("#code", "");

    let result = BatchRunner::new(executor(browser))
        .delay(Duration::ZERO)
        .run(&fill_and_check_site(), &coupons(&["../up", "50% OFF"]), dir.path())
        .await
        .unwrap();

    assert_eq!(result.entries[0].output_dir, dir.path().join("1-___up"));
    assert_eq!(result.entries[1].output_dir, dir.path().join("2-50__OFF"));
    assert!(result.entries[1].output_dir.join("result.json").exists());
}
