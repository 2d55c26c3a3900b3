// tests/ingest_local.rs
// Local files → LocalTextFeed → run_once → insights.

use lp_intel::{
    run_once, CancellationToken, Classifier, DocType, KeywordConfig, LocalTextFeed, Source,
};
use std::fs;
use std::sync::Arc;

fn classifier() -> Classifier {
    Classifier::new(Arc::new(KeywordConfig::builtin().to_index().unwrap())).unwrap()
}

#[tokio::test]
async fn directory_source_is_read_in_name_order_and_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("calpers");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("b_minutes.html"),
        "<p>The board approved a&nbsp;<b>manager search</b>.</p><p>Nothing else.</p>",
    )
    .unwrap();
    fs::write(docs.join("a_letter.txt"), "Pacing remains on plan for 2025.").unwrap();
    fs::write(docs.join("ignored.pdf"), "%PDF-1.4").unwrap();

    let sources = vec![Arc::new(Source::new("CalPERS", "calpers"))];
    let feed = LocalTextFeed::with_root(dir.path());
    let rep = run_once(&feed, &sources, &classifier(), &CancellationToken::new()).await;

    assert!(rep.feed_errors.is_empty(), "{:?}", rep.feed_errors);
    assert_eq!(rep.documents, 2);
    let cats: Vec<&str> = rep.outcome.insights.iter().map(|i| i.category()).collect();
    assert_eq!(cats, vec!["allocation", "rfp"]);

    let rfp = &rep.outcome.insights[1];
    assert_eq!(rfp.doc().content_type(), "text/html");
    assert_eq!(rfp.excerpt(), "The board approved a manager search.");
    assert_eq!(rfp.context(), "The board approved a manager search. Nothing else.");
}

#[tokio::test]
async fn bad_sources_are_reported_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let ok = dir.path().join("ok.txt");
    fs::write(&ok, "An RFP was released.").unwrap();

    let sources = vec![
        Arc::new(Source::new("Missing", "does/not/exist.txt")),
        Arc::new(Source::new("Remote", "https://example.org/x.html")),
        Arc::new(Source::new("Scan", "minutes.pdf").with_doc_type(DocType::Pdf)),
        Arc::new(Source::new("Good", format!("file://{}", ok.display()))),
    ];
    let feed = LocalTextFeed::with_root(dir.path());
    let rep = run_once(&feed, &sources, &classifier(), &CancellationToken::new()).await;

    let failed: Vec<&str> = rep.feed_errors.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(failed, vec!["Missing", "Remote", "Scan"]);
    assert_eq!(rep.documents, 1);
    assert_eq!(rep.outcome.insights.len(), 1);
    assert_eq!(rep.outcome.insights[0].terms(), vec!["rfp"]);
}

#[tokio::test]
async fn cancelled_before_start_fetches_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let sources = vec![Arc::new(Source::new("A", "a.txt"))];
    let rep = run_once(&LocalTextFeed::new(), &sources, &classifier(), &token).await;
    assert!(rep.outcome.cancelled);
    assert_eq!(rep.documents, 0);
    assert!(rep.feed_errors.is_empty());
}
