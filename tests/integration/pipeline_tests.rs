use shopscrape::scraper::JsonFileSource;
use shopscrape::{Pipeline, RecordSet};

use super::*;

#[tokio::test]
async fn test_full_run_from_saved_records() -> anyhow::Result<()> {
    let server = sample_server().await;
    let work = tempfile::tempdir()?;
    let records = sample_records(&server);
    let input = write_input(work.path(), &records);

    let pipeline = Pipeline::new(get_test_config(work.path()), "run source");
    let summary = pipeline.run(&JsonFileSource::new(&input), fixed_now()).await?;

    // Layout
    let ctx = &summary.context;
    assert_eq!(ctx.output_dir, work.path().join("scrapeme.l_20240309_140507"));
    assert!(ctx.images_dir.is_dir());

    // JSON round-trips in order
    let json_path = summary.json_path.clone().expect("JSON report written");
    let decoded: RecordSet = serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
    assert_eq!(decoded, records);

    // One escaped card per record
    let html = std::fs::read_to_string(summary.html_path.clone().expect("HTML report written"))?;
    assert_eq!(html.matches("<div class=\"product\">").count(), 3);
    assert!(html.contains("<h2>Bulbasaur #1</h2>"));
    assert!(html.contains("<h2>Mr. Mime &lt;3</h2>"));
    assert!(html.contains("Price: £1 &amp; up"));

    // Every image attempted, the 404 skipped
    let downloads = summary.downloads.expect("downloads enabled");
    assert_eq!(downloads.attempted, 3);
    assert_eq!(downloads.succeeded(), 2);
    assert_eq!(downloads.failures.len(), 1);
    assert_eq!(downloads.failures[0].name, "Ivysaur");

    let bulbasaur = ctx.images_dir.join("Bulbasaur__1_bulbasaur-1.png");
    assert_eq!(std::fs::read(&bulbasaur)?, PNG_BYTES);
    assert!(ctx.images_dir.join("Mr__Mime__3_122.png").is_file());
    assert!(!ctx.images_dir.join("Ivysaur_ivysaur.png").exists());
    assert_eq!(std::fs::read_dir(&ctx.images_dir)?.count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_rerun_with_same_timestamp_overwrites() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;

    for _ in 0..2 {
        let server = sample_server().await;
        let input = write_input(work.path(), &sample_records(&server));
        let pipeline = Pipeline::new(get_test_config(work.path()), "");

        let summary = pipeline.run(&JsonFileSource::new(&input), fixed_now()).await?;
        assert!(summary.json_path.is_some());
        assert_eq!(summary.downloads.map(|d| d.succeeded()), Some(2));
    }

    let run_dir = work.path().join("scrapeme.l_20240309_140507");
    assert_eq!(std::fs::read_dir(run_dir.join("images"))?.count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_input_is_fatal() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let pipeline = Pipeline::new(get_test_config(work.path()), "");

    let result = pipeline
        .run(&JsonFileSource::new(work.path().join("missing.json")), fixed_now())
        .await;

    let err = result.expect_err("missing input must fail the run");
    assert!(err.is_fatal());
    assert!(!work.path().join("scrapeme.l_20240309_140507").exists());
    Ok(())
}

#[tokio::test]
async fn test_downloads_can_be_disabled() -> anyhow::Result<()> {
    // No mocks mounted: any request would 404 and show up as a failure
    let server = start_image_server(&[]).await;
    let work = tempfile::tempdir()?;
    let input = write_input(work.path(), &sample_records(&server));

    let mut config = get_test_config(work.path());
    config.downloads.enabled = false;
    let summary = Pipeline::new(config, "")
        .run(&JsonFileSource::new(&input), fixed_now())
        .await?;

    assert!(summary.downloads.is_none());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    assert_eq!(std::fs::read_dir(&summary.context.images_dir)?.count(), 0);
    Ok(())
}
