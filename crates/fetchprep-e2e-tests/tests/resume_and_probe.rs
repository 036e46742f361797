use fetchprep_e2e_tests::{
    RouteSpec, init_tracing, patterned_payload, start_test_server, test_config,
};
use fetchprep_lib::download::{Downloader, ErrorCategory, TransferRequest};

#[tokio::test]
async fn interrupted_transfer_resumes_to_identical_file() {
    init_tracing();
    let server = start_test_server().await;
    let payload = patterned_payload(200_000);
    server.add_route(
        "/large.bin",
        RouteSpec {
            truncate_first_at: Some(60_000),
            ..RouteSpec::payload(payload.clone())
        },
    );

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let destination = temp_dir.path().join("large.bin");
    let downloader = Downloader::new(test_config()).expect("downloader");
    let outcome = downloader
        .transfer(&TransferRequest::new(server.url("/large.bin"), &destination))
        .await;

    assert!(outcome.success, "outcome: {outcome:?}");
    assert_eq!(outcome.file_size, payload.len() as u64);
    assert_eq!(
        std::fs::read(&destination).expect("read destination"),
        payload,
        "resumed file must be byte-identical to a single-pass download"
    );
    assert_eq!(server.hits("/large.bin"), 2);
}

#[tokio::test]
async fn range_past_end_is_treated_as_already_complete() {
    init_tracing();
    let server = start_test_server().await;
    let payload = patterned_payload(32_768);
    server.add_route(
        "/complete.bin",
        RouteSpec {
            fail_first: 1,
            ..RouteSpec::payload(payload.clone())
        },
    );

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let destination = temp_dir.path().join("complete.bin");
    // The destination already holds the full content; the first attempt
    // fails with a 500, the resume attempt asks for a range past the end
    // and gets 416 back.
    std::fs::write(&destination, &payload).expect("seed destination");

    let downloader = Downloader::new(test_config()).expect("downloader");
    let outcome = downloader
        .transfer(&TransferRequest::new(
            server.url("/complete.bin"),
            &destination,
        ))
        .await;

    assert!(outcome.success, "outcome: {outcome:?}");
    assert_eq!(outcome.file_size, payload.len() as u64);
    assert_eq!(std::fs::read(&destination).expect("read"), payload);
    assert_eq!(server.hits("/complete.bin"), 2);
}

#[tokio::test]
async fn server_ignoring_range_restarts_from_scratch() {
    init_tracing();
    let server = start_test_server().await;
    let payload = patterned_payload(100_000);
    server.add_route(
        "/no-ranges.bin",
        RouteSpec {
            body: payload.clone(),
            ranges: false,
            truncate_first_at: Some(30_000),
            ..RouteSpec::default()
        },
    );

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let destination = temp_dir.path().join("no-ranges.bin");
    let downloader = Downloader::new(test_config()).expect("downloader");
    let outcome = downloader
        .transfer(&TransferRequest::new(
            server.url("/no-ranges.bin"),
            &destination,
        ))
        .await;

    // The retry sent a range request, the server answered 200 with the
    // full body; appending would corrupt the file, so the engine rewrites.
    assert!(outcome.success, "outcome: {outcome:?}");
    assert_eq!(std::fs::read(&destination).expect("read"), payload);
    assert_eq!(server.hits("/no-ranges.bin"), 2);
}

#[tokio::test]
async fn resume_disabled_refetches_the_whole_body() {
    init_tracing();
    let server = start_test_server().await;
    let payload = patterned_payload(50_000);
    server.add_route(
        "/no-resume.bin",
        RouteSpec {
            truncate_first_at: Some(10_000),
            ..RouteSpec::payload(payload.clone())
        },
    );

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let destination = temp_dir.path().join("no-resume.bin");
    let downloader = Downloader::new(test_config()).expect("downloader");
    let outcome = downloader
        .transfer(
            &TransferRequest::new(server.url("/no-resume.bin"), &destination).without_resume(),
        )
        .await;

    assert!(outcome.success, "outcome: {outcome:?}");
    assert_eq!(std::fs::read(&destination).expect("read"), payload);
}

#[tokio::test]
async fn probe_reports_remote_metadata_without_writing() {
    init_tracing();
    let server = start_test_server().await;
    let payload = patterned_payload(123_456);
    server.add_payload("/probe.bin", payload);

    let downloader = Downloader::new(test_config()).expect("downloader");
    let info = downloader
        .probe(&server.url("/probe.bin"))
        .await
        .expect("probe");

    assert_eq!(info.status, 200);
    assert_eq!(info.content_length, Some(123_456));
    assert_eq!(info.content_type.as_deref(), Some("application/octet-stream"));
    assert!(info.supports_resume);
    assert!(info.last_modified.is_some());
}

#[tokio::test]
async fn probe_failure_is_a_structured_error() {
    init_tracing();
    let server = start_test_server().await;
    server.add_route(
        "/gone.bin",
        RouteSpec {
            status: Some(404),
            ..RouteSpec::default()
        },
    );

    let downloader = Downloader::new(test_config()).expect("downloader");
    let err = downloader
        .probe(&server.url("/gone.bin"))
        .await
        .expect_err("probe should fail");
    assert_eq!(err.category(), ErrorCategory::Permanent);
}
