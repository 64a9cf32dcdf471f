//! E2E tests for listing and purging current objects.

#![cfg(e2e_test)]

mod common;

use common::TestHelper;
use s3cleaner_rs::exit_code_from_error;

#[tokio::test(flavor = "multi_thread")]
async fn e2e_list_follows_every_page() {
    e2e_timeout!(async {
        // 25 objects with 10 keys per page: three listing pages.
        let helper = TestHelper::new().await;
        let bucket = helper.generate_bucket_name();
        helper.create_bucket(&bucket).await;
        let _guard = helper.bucket_guard(&bucket);

        helper.put_numbered_objects(&bucket, "data/", 25).await;

        let config = helper.build_config(vec!["ls", "-b", &bucket, "--max-keys", "10"]);
        let (report, output) = TestHelper::run_list(config).await;

        assert_eq!(report.total(), 25);
        assert!(report.records().iter().all(|r| r.version_id().is_none()));
        assert!(output.contains("Name:          data/00000\nLast modified: "));
        assert!(output.ends_with(&format!("Found 25 items in bucket {bucket}\n")));
    });
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_list_empty_bucket() {
    e2e_timeout!(async {
        let helper = TestHelper::new().await;
        let bucket = helper.generate_bucket_name();
        helper.create_bucket(&bucket).await;
        let _guard = helper.bucket_guard(&bucket);

        let config = helper.build_config(vec!["ls", "-b", &bucket]);
        let (report, output) = TestHelper::run_list(config).await;

        assert_eq!(report.total(), 0);
        assert_eq!(output, format!("Found 0 items in bucket {bucket}\n"));
    });
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_purge_removes_all_current_objects() {
    e2e_timeout!(async {
        let helper = TestHelper::new().await;
        let bucket = helper.generate_bucket_name();
        helper.create_bucket(&bucket).await;
        let _guard = helper.bucket_guard(&bucket);

        helper.put_numbered_objects(&bucket, "data/", 40).await;

        let config = helper.build_config(vec![
            "del",
            "-b",
            &bucket,
            "--force",
            "--worker-size",
            "8",
            "--max-keys",
            "15",
        ]);
        let result = TestHelper::run_purge(config).await;

        assert!(result.error.is_none(), "{:?}", result.error);
        let summary = result.summary.unwrap();
        assert_eq!(summary.deleted, 40);
        assert_eq!(summary.failed, 0);
        assert!(result.output.contains(&format!("Delete 40 items in bucket {bucket}\n")));
        assert!(result
            .output
            .ends_with(&format!("Deleted 40 of 40 items in bucket {bucket}\n")));

        assert!(helper.list_objects(&bucket).await.is_empty());
    });
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_dry_run_deletes_nothing() {
    e2e_timeout!(async {
        let helper = TestHelper::new().await;
        let bucket = helper.generate_bucket_name();
        helper.create_bucket(&bucket).await;
        let _guard = helper.bucket_guard(&bucket);

        helper.put_numbered_objects(&bucket, "keep/", 5).await;

        let config = helper.build_config(vec!["del", "-b", &bucket, "--dry-run"]);
        let result = TestHelper::run_purge(config).await;

        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.summary.unwrap().total(), 0);
        assert_eq!(helper.list_objects(&bucket).await.len(), 5);
    });
}

#[tokio::test(flavor = "multi_thread")]
async fn e2e_missing_bucket_is_a_list_error() {
    e2e_timeout!(async {
        let helper = TestHelper::new().await;
        let bucket = helper.generate_bucket_name();

        let config = helper.build_config(vec!["del", "-b", &bucket, "--force"]);
        let result = TestHelper::run_purge(config).await;

        let error = result.error.expect("listing a missing bucket fails");
        assert_eq!(exit_code_from_error(&error), 1);
        assert!(format!("{error:#}").contains("Unable to list objects from bucket"));
        assert!(result.output.is_empty());
    });
}
