//! Uploads against a live server

use std::sync::Arc;

use tokio::sync::mpsc;

use report_sftp::config::Settings;
use report_sftp::events::TransferEvent;
use report_sftp::{NamedDataset, ReportUploader, TransferError};

fn remote(server: &super::fixtures::TestSftpServer, name: &str) -> String {
    format!("{}/{}", server.remote_dir.trim_end_matches('/'), name)
}

/// Test a traversal name lands under the base path with CSV quoting
#[tokio::test]
async fn test_upload_sanitizes_name() {
    let server = skip_if_no_server!();
    let uploader = ReportUploader::new(&server.password_settings()).expect("uploader");

    let datasets = vec![NamedDataset::from_rows(
        "../../etc/report.csv",
        vec![vec!["a,b"], vec!["1", "2"]],
    )];
    uploader.upload(&datasets).await.expect("upload");

    let content = server.read_remote(&remote(&server, "report.csv")).await;
    assert_eq!(content, b"\"a,b\"\n1,2\n");
}

/// Test several datasets are written in order and reported as events
#[tokio::test]
async fn test_upload_batch_events() {
    let server = skip_if_no_server!();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let uploader = ReportUploader::with_event_sink(&server.password_settings(), Arc::new(tx))
        .expect("uploader");

    let datasets = vec![
        NamedDataset::from_rows("batch_one.csv", vec![vec!["id", "note"], vec!["1", "say \"hi\""]]),
        NamedDataset::from_rows("batch_two.csv", vec![vec!["id"], vec!["2"]]),
    ];
    uploader.upload(&datasets).await.expect("upload");

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let written: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            TransferEvent::FileWritten { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        written,
        vec![remote(&server, "batch_one.csv"), remote(&server, "batch_two.csv")]
    );
    assert_eq!(events.last(), Some(&TransferEvent::Completed { files: 2 }));

    let content = server.read_remote(&remote(&server, "batch_one.csv")).await;
    assert_eq!(content, b"id,note\n1,\"say \"\"hi\"\"\"\n");
}

/// Test re-uploading a name truncates the previous content
#[tokio::test]
async fn test_upload_overwrites_existing_file() {
    let server = skip_if_no_server!();
    let uploader = ReportUploader::new(&server.password_settings()).expect("uploader");

    let long = vec![NamedDataset::from_rows(
        "overwrite.csv",
        vec![vec!["a long first version"], vec!["with two rows"]],
    )];
    let short = vec![NamedDataset::from_rows("overwrite.csv", vec![vec!["x"]])];
    uploader.upload(&long).await.expect("first upload");
    uploader.upload(&short).await.expect("second upload");

    let content = server.read_remote(&remote(&server, "overwrite.csv")).await;
    assert_eq!(content, b"x\n");
}

/// Test a missing remote directory fails at file creation
#[tokio::test]
async fn test_missing_remote_directory() {
    let server = skip_if_no_server!();
    let settings = Settings {
        remote_path: remote(&server, "does_not_exist_xyz"),
        ..server.password_settings()
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let uploader = ReportUploader::with_event_sink(&settings, Arc::new(tx)).expect("uploader");

    let datasets = vec![
        NamedDataset::from_rows("a.csv", vec![vec!["1"]]),
        NamedDataset::from_rows("b.csv", vec![vec!["2"]]),
    ];
    let err = uploader.upload(&datasets).await.unwrap_err();

    match err {
        TransferError::RemoteFileCreateFailed { path, .. } => {
            assert!(path.ends_with("does_not_exist_xyz/a.csv"));
        }
        other => panic!("expected RemoteFileCreateFailed, got {:?}", other),
    }

    // The connection is released before the failure is reported
    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    let disconnected = events
        .iter()
        .position(|e| matches!(e, TransferEvent::Disconnected { clean: true, .. }))
        .expect("disconnect event");
    let failed = events
        .iter()
        .position(|e| matches!(e, TransferEvent::Failed { .. }))
        .expect("failure event");
    assert!(disconnected < failed);
}
