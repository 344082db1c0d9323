use pdf_harvest::config::{DownloadConfig, NetworkConfig, OutputConfig};
use pdf_harvest::download::Downloader;
use pdf_harvest::results::{DownloadStatus, DownloadTask};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn downloader(base_dir: &std::path::Path) -> Arc<Downloader> {
    downloader_with(base_dir, OutputConfig::default())
}

fn downloader_with(base_dir: &std::path::Path, mut output: OutputConfig) -> Arc<Downloader> {
    output.base_dir = base_dir.to_string_lossy().into_owned();
    Arc::new(
        Downloader::new(DownloadConfig::default(), output, &NetworkConfig::default())
            .expect("downloader builds"),
    )
}

fn task(server: &MockServer, name: &str) -> DownloadTask {
    DownloadTask {
        url: format!("{}/{}", server.uri(), name),
        filename: name.to_string(),
    }
}

#[tokio::test]
async fn downloads_batch_to_disk_in_task_order() {
    let server = MockServer::start().await;
    let body_a = common::pdf_bytes("a");
    let body_b = common::pdf_bytes("b");

    // The first file responds slowly so completion order differs from task order
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body_a.clone())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body_b.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let downloader = downloader(dir.path());
    let tasks = vec![task(&server, "a.pdf"), task(&server, "b.pdf")];

    let results = downloader.download_batch(tasks).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success));
    assert_eq!(results[0].filename, "a.pdf");
    assert_eq!(results[1].filename, "b.pdf");
    assert_eq!(results[0].status, DownloadStatus::Completed);
    assert_eq!(results[0].size_bytes, Some(body_a.len() as u64));

    assert_eq!(
        std::fs::read(dir.path().join("a.pdf")).expect("file a"),
        body_a
    );
    assert_eq!(
        std::fs::read(dir.path().join("b.pdf")).expect("file b"),
        body_b
    );
}

#[tokio::test]
async fn existing_file_is_skipped_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.pdf"), b"old contents").expect("seed file");

    let downloader = downloader(dir.path());
    let results = downloader.download_batch(vec![task(&server, "a.pdf")]).await;

    assert_eq!(results[0].status, DownloadStatus::AlreadyExists);
    assert!(results[0].success);
    assert_eq!(results[0].size_bytes, Some(12));
    assert_eq!(results[0].elapsed_seconds, Some(0.0));
    assert_eq!(
        std::fs::read(dir.path().join("a.pdf")).expect("file"),
        b"old contents"
    );
}

#[tokio::test]
async fn overwrite_existing_downloads_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.pdf"), b"old contents").expect("seed file");

    let downloader = downloader_with(
        dir.path(),
        OutputConfig {
            overwrite_existing: true,
            ..OutputConfig::default()
        },
    );
    let results = downloader.download_batch(vec![task(&server, "a.pdf")]).await;

    assert_eq!(results[0].status, DownloadStatus::Completed);
    assert_eq!(
        std::fs::read(dir.path().join("a.pdf")).expect("file"),
        b"fresh"
    );
}

#[tokio::test]
async fn client_error_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let downloader = downloader(dir.path());
    let results = downloader
        .download_batch(vec![task(&server, "gone.pdf")])
        .await;

    assert_eq!(results[0].status, DownloadStatus::Failed);
    assert!(!results[0].success);
    assert!(results[0].error_message.is_some());
    assert!(!dir.path().join("gone.pdf").exists());
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;
    let body = common::pdf_bytes("flaky");

    // First request fails with 500, the retry gets the real file
    Mock::given(method("GET"))
        .and(path("/flaky.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let downloader = downloader(dir.path());
    let results = downloader
        .download_batch(vec![task(&server, "flaky.pdf")])
        .await;

    assert_eq!(results[0].status, DownloadStatus::Completed);
    assert_eq!(
        std::fs::read(dir.path().join("flaky.pdf")).expect("file"),
        body
    );
}

#[tokio::test]
async fn midstream_failure_leaves_no_partial_file() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Advertises far more bytes than it sends, then closes mid-body; the
    // write to disk has already started when the transfer dies
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\nConnection: close\r\n\r\n%PDF-1.5 truncated",
                )
                .await;
        }
    });

    let dir = tempfile::tempdir().expect("tempdir");
    let downloader = Arc::new(
        Downloader::new(
            DownloadConfig {
                retry_count: 1,
                ..DownloadConfig::default()
            },
            OutputConfig {
                base_dir: dir.path().to_string_lossy().into_owned(),
                ..OutputConfig::default()
            },
            &NetworkConfig::default(),
        )
        .expect("downloader builds"),
    );

    let results = downloader
        .download_batch(vec![DownloadTask {
            url: format!("http://{addr}/cut.pdf"),
            filename: "cut.pdf".to_string(),
        }])
        .await;

    assert_eq!(results[0].status, DownloadStatus::Failed);
    assert!(!results[0].success);
    assert!(!dir.path().join("cut.pdf").exists());
}

#[tokio::test]
async fn one_failure_does_not_abort_the_batch() {
    let server = MockServer::start().await;
    let body = common::pdf_bytes("good");

    Mock::given(method("GET"))
        .and(path("/good.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad.pdf"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let downloader = downloader(dir.path());
    let results = downloader
        .download_batch(vec![task(&server, "good.pdf"), task(&server, "bad.pdf")])
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(dir.path().join("good.pdf").exists());
}

#[tokio::test]
async fn host_subfolder_is_created_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let downloader = downloader_with(
        dir.path(),
        OutputConfig {
            create_subfolder: true,
            ..OutputConfig::default()
        },
    );
    let results = downloader.download_batch(vec![task(&server, "a.pdf")]).await;

    assert!(results[0].success);
    let filepath = results[0].filepath.as_ref().expect("filepath");
    assert!(filepath.exists());
    // The file sits one level below the base directory, under the host name
    assert_eq!(
        filepath.parent().and_then(|p| p.parent()),
        Some(dir.path())
    );
}
