use fetchprep_e2e_tests::{RouteSpec, init_tracing, patterned_payload, start_test_server};
use fetchprep_lib::cli::{
    Command, ResolvedCommand, resolve_command, run_batch_download, run_download, run_get_info,
    run_verify,
};
use fetchprep_lib::error::FetchPrepError;
use fetchprep_lib::verification::{ChecksumAlgorithm, StreamingHasher};

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = StreamingHasher::new(ChecksumAlgorithm::Sha256);
    hasher.update(data);
    hasher.finalize()
}

fn download_command(url: String, output: String) -> Command {
    Command::Download {
        url,
        output,
        config_path: None,
        retries: Some(0),
        timeout_secs: None,
        chunk_size: None,
        no_resume: false,
        verify_md5: None,
        verify_sha1: None,
        verify_sha256: None,
        verify_sha512: None,
    }
}

#[tokio::test]
async fn download_command_end_to_end() {
    init_tracing();
    let server = start_test_server().await;
    let payload = patterned_payload(9_000);
    server.add_payload("/cli.bin", payload.clone());

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output = temp_dir.path().join("cli.bin");

    let command = download_command(
        server.url("/cli.bin").to_string(),
        output.to_string_lossy().into_owned(),
    );
    let resolved = resolve_command(command, true).expect("resolve");
    let ResolvedCommand::Download(params) = resolved else {
        panic!("wrong command variant");
    };

    run_download(params).await.expect("download should succeed");
    assert_eq!(std::fs::read(&output).expect("read output"), payload);
}

#[tokio::test]
async fn download_command_surfaces_failure_as_error() {
    init_tracing();
    let server = start_test_server().await;
    server.add_route(
        "/cli-missing.bin",
        RouteSpec {
            status: Some(404),
            ..RouteSpec::default()
        },
    );

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let command = download_command(
        server.url("/cli-missing.bin").to_string(),
        temp_dir
            .path()
            .join("cli-missing.bin")
            .to_string_lossy()
            .into_owned(),
    );
    let resolved = resolve_command(command, true).expect("resolve");
    let ResolvedCommand::Download(params) = resolved else {
        panic!("wrong command variant");
    };

    let err = run_download(params).await.expect_err("download should fail");
    assert!(matches!(err, FetchPrepError::TransferFailed { .. }));
}

#[tokio::test]
async fn batch_download_command_end_to_end_with_report() {
    init_tracing();
    let server = start_test_server().await;
    let temp_dir = tempfile::tempdir().expect("temp dir");

    let verified_payload = patterned_payload(6_000);
    server.add_payload("/batch-a.bin", patterned_payload(3_000));
    server.add_payload("/batch-b.bin", verified_payload.clone());

    let out_a = temp_dir.path().join("out/batch-a.bin");
    let out_b = temp_dir.path().join("out/batch-b.bin");
    let manifest = format!(
        "# test manifest\n{}\t{}\n{}\t{}\tsha256:{}\n",
        server.url("/batch-a.bin"),
        out_a.display(),
        server.url("/batch-b.bin"),
        out_b.display(),
        sha256_hex(&verified_payload),
    );
    let manifest_path = temp_dir.path().join("downloads.txt");
    std::fs::write(&manifest_path, manifest).expect("write manifest");

    let report_path = temp_dir.path().join("report.json");
    let command = Command::BatchDownload {
        manifest_path: manifest_path.to_string_lossy().into_owned(),
        config_path: None,
        retries: Some(0),
        timeout_secs: None,
        parallel: Some(2),
        report_path: Some(report_path.to_string_lossy().into_owned()),
    };
    let resolved = resolve_command(command, true).expect("resolve");
    let ResolvedCommand::BatchDownload(params) = resolved else {
        panic!("wrong command variant");
    };

    run_batch_download(params).await.expect("batch should succeed");

    assert!(out_a.exists());
    assert_eq!(std::fs::read(&out_b).expect("read"), verified_payload);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(report["summary"]["requested"], 2);
    assert_eq!(report["summary"]["succeeded"], 2);
    assert_eq!(report["summary"]["failed"], 0);
    let outcome = &report["outcomes"][server.url("/batch-b.bin").as_str()];
    assert_eq!(outcome["success"], true);
    assert_eq!(outcome["checksum_verified"], true);
}

#[tokio::test]
async fn batch_download_command_fails_when_any_item_fails() {
    init_tracing();
    let server = start_test_server().await;
    let temp_dir = tempfile::tempdir().expect("temp dir");

    server.add_payload("/ok.bin", patterned_payload(1_000));
    server.add_route(
        "/gone.bin",
        RouteSpec {
            status: Some(404),
            ..RouteSpec::default()
        },
    );

    let manifest = format!(
        "{}\t{}\n{}\t{}\n",
        server.url("/ok.bin"),
        temp_dir.path().join("ok.bin").display(),
        server.url("/gone.bin"),
        temp_dir.path().join("gone.bin").display(),
    );
    let manifest_path = temp_dir.path().join("downloads.txt");
    std::fs::write(&manifest_path, manifest).expect("write manifest");

    let command = Command::BatchDownload {
        manifest_path: manifest_path.to_string_lossy().into_owned(),
        config_path: None,
        retries: Some(0),
        timeout_secs: None,
        parallel: None,
        report_path: None,
    };
    let resolved = resolve_command(command, true).expect("resolve");
    let ResolvedCommand::BatchDownload(params) = resolved else {
        panic!("wrong command variant");
    };

    let err = run_batch_download(params).await.expect_err("batch should fail");
    assert!(matches!(
        err,
        FetchPrepError::BatchIncomplete {
            failed: 1,
            requested: 2
        }
    ));
    // The sibling download still completed.
    assert!(temp_dir.path().join("ok.bin").exists());
}

#[tokio::test]
async fn verify_command_round_trips_a_downloaded_file() {
    init_tracing();
    let server = start_test_server().await;
    let payload = patterned_payload(5_000);
    server.add_payload("/verify-me.bin", payload.clone());

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output = temp_dir.path().join("verify-me.bin");
    let resolved = resolve_command(
        download_command(
            server.url("/verify-me.bin").to_string(),
            output.to_string_lossy().into_owned(),
        ),
        true,
    )
    .expect("resolve");
    let ResolvedCommand::Download(params) = resolved else {
        panic!("wrong command variant");
    };
    run_download(params).await.expect("download");

    let command = Command::Verify {
        file: output.to_string_lossy().into_owned(),
        checksum: sha256_hex(&payload),
        algorithm: "sha256".to_string(),
    };
    let ResolvedCommand::Verify(params) = resolve_command(command, true).expect("resolve") else {
        panic!("wrong command variant");
    };
    run_verify(params).await.expect("verification should pass");
}

#[tokio::test]
async fn verify_command_rejects_a_wrong_checksum() {
    init_tracing();
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let file = temp_dir.path().join("data.bin");
    std::fs::write(&file, b"contents").expect("write");

    let command = Command::Verify {
        file: file.to_string_lossy().into_owned(),
        checksum: "0".repeat(64),
        algorithm: "sha256".to_string(),
    };
    let ResolvedCommand::Verify(params) = resolve_command(command, true).expect("resolve") else {
        panic!("wrong command variant");
    };
    let err = run_verify(params).await.expect_err("verification should fail");
    assert!(matches!(err, FetchPrepError::VerificationFailed { .. }));
}

#[tokio::test]
async fn get_info_command_probes_without_downloading() {
    init_tracing();
    let server = start_test_server().await;
    server.add_payload("/info.bin", patterned_payload(2_000));

    let command = Command::GetInfo {
        url: server.url("/info.bin").to_string(),
        config_path: None,
    };
    let ResolvedCommand::GetInfo(params) = resolve_command(command, true).expect("resolve") else {
        panic!("wrong command variant");
    };
    run_get_info(params).await.expect("probe should succeed");
    assert_eq!(server.hits("/info.bin"), 1);
}

#[tokio::test]
async fn cli_config_is_exercised_end_to_end() {
    init_tracing();
    let server = start_test_server().await;
    server.add_payload("/configured.bin", patterned_payload(1_500));

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let settings_path = temp_dir.path().join("fetchprep.json");
    std::fs::write(
        &settings_path,
        r#"{"max_retries": 1, "show_progress": false, "max_parallel": 2}"#,
    )
    .expect("write settings");

    let output = temp_dir.path().join("configured.bin");
    let command = Command::Download {
        url: server.url("/configured.bin").to_string(),
        output: output.to_string_lossy().into_owned(),
        config_path: Some(settings_path.to_string_lossy().into_owned()),
        retries: None,
        timeout_secs: None,
        chunk_size: None,
        no_resume: false,
        verify_md5: None,
        verify_sha1: None,
        verify_sha256: None,
        verify_sha512: None,
    };
    let ResolvedCommand::Download(params) = resolve_command(command, false).expect("resolve")
    else {
        panic!("wrong command variant");
    };
    assert_eq!(params.config.max_retries, 1);
    assert_eq!(params.config.max_parallel, 2);
    assert!(!params.config.show_progress);

    run_download(params).await.expect("download");
    assert!(output.exists());
}
