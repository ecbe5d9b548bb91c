use shopscrape::images::ImageDownloader;
use shopscrape::config::DownloadConfig;

use super::*;

#[tokio::test]
async fn test_failed_download_logs_record_name() -> anyhow::Result<()> {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = sample_server().await;
    let work = tempfile::tempdir()?;
    let records = sample_records(&server);

    let downloader = ImageDownloader::new(&DownloadConfig::default())?;
    let report = downloader.download_all(&records, work.path()).await;
    assert_eq!(report.attempted, 3);

    let output = logs.contents();
    let error_lines: Vec<&str> = output.lines().filter(|line| line.contains("ERROR")).collect();
    assert_eq!(error_lines.len(), 1);
    assert!(error_lines[0].contains("Ivysaur"));
    assert!(error_lines[0].contains("/img/ivysaur.png"));
    assert!(output.contains("Downloaded image: Bulbasaur__1_bulbasaur-1.png for product: Bulbasaur #1"));
    Ok(())
}
