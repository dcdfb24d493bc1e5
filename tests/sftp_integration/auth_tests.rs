//! Authentication against a live server

use secrecy::SecretString;

use report_sftp::config::{HostKeyPolicy, Settings};
use report_sftp::{NamedDataset, ReportUploader, TransferError};

fn one_report() -> Vec<NamedDataset> {
    vec![NamedDataset::from_rows("auth_check.csv", vec![vec!["ok"]])]
}

/// Test wrong password is reported as a connection failure
#[tokio::test]
async fn test_wrong_password() {
    let server = skip_if_no_server!();

    let settings = Settings {
        password: SecretString::from("wrongpassword"),
        ..server.password_settings()
    };
    let uploader = ReportUploader::new(&settings).expect("uploader");

    let err = uploader.upload(&one_report()).await.unwrap_err();

    assert!(
        matches!(err, TransferError::ConnectionFailed { .. }),
        "Should be ConnectionFailed, got {:?}",
        err
    );
}

/// Test non-existent user fails authentication
#[tokio::test]
async fn test_nonexistent_user() {
    let server = skip_if_no_server!();

    let settings = Settings {
        username: "nonexistent_user_xyz".to_string(),
        ..server.password_settings()
    };
    let uploader = ReportUploader::new(&settings).expect("uploader");

    let err = uploader.upload(&one_report()).await.unwrap_err();

    assert!(matches!(err, TransferError::ConnectionFailed { .. }));
}

/// Test key file authentication when a server key is configured
#[tokio::test]
async fn test_key_file_auth() {
    let server = skip_if_no_server!();
    let Some(key_path) = server.private_key_path.clone() else {
        eprintln!("Skipping test: REPORT_SFTP_TEST_KEY not set");
        return;
    };

    let settings = Settings {
        private_key_path: key_path.to_string_lossy().to_string(),
        password: SecretString::from("wrongpassword"),
        ..server.password_settings()
    };
    let uploader = ReportUploader::new(&settings).expect("uploader");

    uploader
        .upload(&one_report())
        .await
        .expect("Key file auth should succeed");
}

/// Test a pinned fingerprint that does not match refuses the server
#[tokio::test]
async fn test_pinned_fingerprint_mismatch() {
    let server = skip_if_no_server!();

    let settings = Settings {
        host_key: HostKeyPolicy::Fingerprint(
            "SHA256:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string(),
        ),
        ..server.password_settings()
    };
    let uploader = ReportUploader::new(&settings).expect("uploader");

    let err = uploader.upload(&one_report()).await.unwrap_err();

    assert!(matches!(err, TransferError::ConnectionFailed { .. }));
}
