mod support;

use fernvault_client::download::{DirectorySink, safe_filename};
use fernvault_client::notify::Severity;
use fernvault_client::submission::prepare_request;
use fernvault_client::{Delivered, Operation, SelectedFile, SubmitError};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::time::Duration;
use support::{FailingSink, OTHER_VALID_KEY, VALID_KEY, controller, controller_with, test_config};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ten_byte_file() -> SelectedFile {
    SelectedFile::from_bytes("report", "text/plain", b"0123456789".to_vec())
}

async fn mount_never_called(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

// --- Validation before any request ---

#[test]
fn prepare_checks_file_before_key() {
    let err = prepare_request(Operation::Encrypt, None, "", 100).unwrap_err();
    assert_eq!(err, SubmitError::MissingFile);
}

#[test]
fn prepare_checks_size_before_key() {
    let file = ten_byte_file();
    let err = prepare_request(Operation::Encrypt, Some(&file), "", 5).unwrap_err();
    assert_eq!(err, SubmitError::FileTooLarge { limit: 5 });
}

#[test]
fn prepare_builds_request_for_valid_inputs() {
    let file = ten_byte_file();
    let request = prepare_request(Operation::Decrypt, Some(&file), VALID_KEY, 100).unwrap();
    assert_eq!(request.operation, Operation::Decrypt);
    assert_eq!(request.file, file);
    assert_eq!(request.key.as_str(), VALID_KEY);
}

#[tokio::test]
async fn missing_file_alerts_without_request() {
    let server = MockServer::start().await;
    mount_never_called(&server).await;
    let (controller, _) = controller(&server.uri());

    let err = controller.submit(Operation::Encrypt, None, VALID_KEY).await.unwrap_err();
    assert_eq!(err, SubmitError::MissingFile);

    let alerts = controller.ui().notifications().active();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "Please select a file to encrypt.");
    assert_eq!(alerts[0].severity, Severity::Error);
    assert!(!controller.ui().is_loading());
}

#[tokio::test]
async fn short_key_alerts_without_request() {
    let server = MockServer::start().await;
    mount_never_called(&server).await;
    let (controller, _) = controller(&server.uri());
    let file = ten_byte_file();

    let err = controller
        .submit(Operation::Decrypt, Some(&file), "abc")
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::WrongKeyLength { expected: 44, actual: 3 });
    assert_eq!(
        controller.ui().notifications().latest().unwrap().message,
        "Invalid key length. Key must be 44 characters."
    );
}

#[tokio::test]
async fn oversized_file_alerts_without_request() {
    let server = MockServer::start().await;
    mount_never_called(&server).await;
    let mut config = test_config(&server.uri());
    config.max_upload_bytes = 4;
    let controller = controller_with(config, support::RecordingSink::default());
    let file = ten_byte_file();

    let err = controller
        .submit(Operation::Encrypt, Some(&file), VALID_KEY)
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::FileTooLarge { limit: 4 });
    assert_eq!(
        controller.ui().notifications().latest().unwrap().message,
        "File is too large. Maximum size is 4 Bytes."
    );
}

// --- Binary responses ---

#[tokio::test]
async fn encrypt_binary_success_triggers_download() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/encrypt"))
        .and(query_param("download", "1"))
        .and(body_string_contains("0123456789"))
        .and(body_string_contains(VALID_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"report.enc\"")
                .set_body_raw(b"gAAAAABencrypted".to_vec(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (controller, sink) = controller(&server.uri());
    let file = ten_byte_file();
    let delivered = controller
        .submit(Operation::Encrypt, Some(&file), VALID_KEY)
        .await
        .unwrap();

    assert_eq!(
        delivered,
        Delivered::Saved {
            filename: "report.enc".into(),
            path: PathBuf::from("/downloads/report.enc"),
        }
    );
    assert_eq!(
        sink.saved(),
        vec![("report.enc".to_string(), b"gAAAAABencrypted".to_vec())]
    );

    let ui = controller.ui();
    assert!(!ui.is_loading());
    assert_eq!(ui.progress().snapshot().percent, 100);
    assert!(!controller.is_busy());
    let card = ui.download_card().unwrap();
    assert_eq!(card.title, "File encrypted successfully!");
    assert_eq!(card.filename, "report.enc");
    assert!(ui.notifications().active().is_empty());
}

#[tokio::test]
async fn decrypt_binary_without_name_uses_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/decrypt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"plaintext".to_vec(), "application/octet-stream"))
        .mount(&server)
        .await;

    let (controller, sink) = controller(&server.uri());
    let file = SelectedFile::from_bytes("report.enc", "", b"cipher".to_vec());
    controller
        .submit(Operation::Decrypt, Some(&file), OTHER_VALID_KEY)
        .await
        .unwrap();

    assert_eq!(sink.saved()[0].0, "decrypted_file");
}

#[tokio::test]
async fn save_failure_is_one_alert_and_cleans_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/encrypt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "application/octet-stream"))
        .mount(&server)
        .await;

    let controller = controller_with(test_config(&server.uri()), FailingSink);
    let file = ten_byte_file();
    let err = controller
        .submit(Operation::Encrypt, Some(&file), VALID_KEY)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::SaveFailed(_)));
    assert_eq!(controller.ui().notifications().active().len(), 1);
    assert!(!controller.ui().is_loading());
    assert!(controller.ui().download_card().is_none());
}

// --- JSON responses ---

#[tokio::test]
async fn json_failure_alert_is_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/encrypt"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "success": false,
            "error": "bad key"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, sink) = controller(&server.uri());
    let file = ten_byte_file();
    let err = controller
        .submit(Operation::Encrypt, Some(&file), VALID_KEY)
        .await
        .unwrap_err();

    assert_eq!(err, SubmitError::ServerReportedFailure("bad key".into()));
    let alerts = controller.ui().notifications().active();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "bad key");
    assert!(sink.saved().is_empty());
    assert!(!controller.ui().is_loading());
}

#[tokio::test]
async fn json_success_shows_message_and_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/encrypt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "File encrypted successfully",
            "filename": "report.encrypted",
            "download_url": "/download/encrypted"
        })))
        .mount(&server)
        .await;

    let (controller, sink) = controller(&server.uri());
    let file = ten_byte_file();
    let delivered = controller
        .submit(Operation::Encrypt, Some(&file), VALID_KEY)
        .await
        .unwrap();

    let expected_url = format!("{}/download/encrypted", server.uri());
    assert_eq!(
        delivered,
        Delivered::Link {
            filename: "report.encrypted".into(),
            url: expected_url.clone(),
            message: "File encrypted successfully".into(),
        }
    );
    assert!(sink.saved().is_empty());

    let alert = controller.ui().notifications().latest().unwrap();
    assert_eq!(alert.message, "File encrypted successfully");
    assert_eq!(alert.severity, Severity::Success);
    assert_eq!(controller.ui().download_card().unwrap().target, expected_url);
}

#[tokio::test]
async fn follow_link_reuses_the_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/decrypt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc123; Path=/")
                .set_body_json(serde_json::json!({
                    "success": true,
                    "message": "File decrypted successfully",
                    "filename": "report"
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/decrypted"))
        .and(header("cookie", "session=abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"report\"")
                .set_body_raw(b"plain report".to_vec(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (controller, sink) = controller(&server.uri());
    let file = SelectedFile::from_bytes("report.encrypted", "", b"cipher".to_vec());
    let Delivered::Link { url, .. } = controller
        .submit(Operation::Decrypt, Some(&file), VALID_KEY)
        .await
        .unwrap()
    else {
        panic!("expected a link");
    };

    let saved = controller.follow_link(Operation::Decrypt, &url).await.unwrap();
    assert!(matches!(saved, Delivered::Saved { ref filename, .. } if filename == "report"));
    assert_eq!(sink.saved(), vec![("report".to_string(), b"plain report".to_vec())]);
    assert!(!controller.ui().is_loading());
}

#[tokio::test]
async fn follow_link_missing_file_alerts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/encrypted"))
        .respond_with(ResponseTemplate::new(404).set_body_string("File not found"))
        .mount(&server)
        .await;

    let (controller, _) = controller(&server.uri());
    let err = controller
        .follow_link(Operation::Encrypt, "/download/encrypted")
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::NetworkFailure(_)));
    assert_eq!(
        controller.ui().notifications().latest().unwrap().message,
        "Encryption failed. Please try again."
    );
}

// --- Transport failures ---

#[tokio::test]
async fn non_json_error_status_gives_generic_alert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/decrypt"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let (controller, _) = controller(&server.uri());
    let file = ten_byte_file();
    let err = controller
        .submit(Operation::Decrypt, Some(&file), VALID_KEY)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::NetworkFailure(_)));
    let alerts = controller.ui().notifications().active();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "Decryption failed. Please try again.");
    assert!(!controller.ui().is_loading());
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn unreachable_server_gives_generic_alert() {
    // Nothing listens on the discard port.
    let (controller, _) = controller("http://127.0.0.1:9");
    let file = ten_byte_file();
    let err = controller
        .submit(Operation::Encrypt, Some(&file), VALID_KEY)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::NetworkFailure(_)));
    assert_eq!(
        controller.ui().notifications().latest().unwrap().message,
        "Encryption failed. Please try again."
    );
    assert!(!controller.ui().is_loading());
}

// --- Busy guard ---

#[tokio::test]
async fn overlapping_submission_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/encrypt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_raw(b"x".to_vec(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (controller, _) = controller(&server.uri());
    let file = ten_byte_file();

    let (first, second) = tokio::join!(
        controller.submit(Operation::Encrypt, Some(&file), VALID_KEY),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(controller.is_busy());
            assert!(controller.ui().is_loading());
            controller.submit(Operation::Encrypt, Some(&file), VALID_KEY).await
        }
    );

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), SubmitError::Busy);
    assert!(!controller.is_busy());
    assert!(!controller.ui().is_loading());
}

#[tokio::test]
async fn controller_is_reusable_after_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/encrypt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), "application/octet-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, sink) = controller(&server.uri());
    let file = ten_byte_file();
    assert!(controller.submit(Operation::Encrypt, None, VALID_KEY).await.is_err());
    assert!(controller.submit(Operation::Encrypt, Some(&file), VALID_KEY).await.is_ok());
    assert_eq!(sink.saved().len(), 1);
}

// --- Key generation ---

#[tokio::test]
async fn generate_key_alerts_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/generate_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "key": VALID_KEY })))
        .mount(&server)
        .await;

    let (controller, _) = controller(&server.uri());
    assert_eq!(controller.generate_key().await.as_deref(), Some(VALID_KEY));
    assert_eq!(
        controller.ui().notifications().latest().unwrap().message,
        "Key generated successfully! Copy it to a safe place."
    );
    assert!(!controller.ui().is_loading());
}

#[tokio::test]
async fn generate_key_failure_alerts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/generate_key"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (controller, _) = controller(&server.uri());
    assert_eq!(controller.generate_key().await, None);
    let alert = controller.ui().notifications().latest().unwrap();
    assert_eq!(alert.message, "Failed to generate key. Please try again.");
    assert_eq!(alert.severity, Severity::Error);
}

#[tokio::test]
async fn generate_key_during_submission_keeps_the_overlay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/encrypt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(400))
                .set_body_raw(b"x".to_vec(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/generate_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "key": VALID_KEY })))
        .expect(0)
        .mount(&server)
        .await;

    let (controller, _) = controller(&server.uri());
    let file = ten_byte_file();

    let (submitted, generated) = tokio::join!(
        controller.submit(Operation::Encrypt, Some(&file), VALID_KEY),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let key = controller.generate_key().await;
            assert!(controller.is_busy());
            assert!(controller.ui().is_loading());
            key
        }
    );

    assert!(submitted.is_ok());
    assert_eq!(generated, None);
    assert!(controller
        .ui()
        .notifications()
        .active()
        .iter()
        .any(|a| a.message == "Another operation is already in progress."));
    assert!(!controller.ui().is_loading());
}

#[tokio::test]
async fn generate_key_releases_the_busy_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/generate_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "key": VALID_KEY })))
        .mount(&server)
        .await;

    let (controller, _) = controller(&server.uri());
    assert!(controller.generate_key().await.is_some());
    assert!(!controller.is_busy());
    assert!(controller.generate_key().await.is_some());
}

// --- Directory sink ---

#[tokio::test]
async fn directory_sink_writes_into_its_directory() {
    use fernvault_client::download::DownloadSink;

    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path().join("out"));
    let path = sink.save("../../etc/report.enc", b"cipher").await.unwrap();

    assert_eq!(path, dir.path().join("out").join("report.enc"));
    assert_eq!(std::fs::read(&path).unwrap(), b"cipher");
}

#[test]
fn safe_filename_strips_directories() {
    assert_eq!(safe_filename("report.enc").as_deref(), Some("report.enc"));
    assert_eq!(safe_filename("a/b/c.txt").as_deref(), Some("c.txt"));
    assert_eq!(safe_filename(r"C:\temp\x.bin").as_deref(), Some("x.bin"));
    assert_eq!(safe_filename(".."), None);
    assert_eq!(safe_filename("dir/"), None);
    assert_eq!(safe_filename(""), None);
}
