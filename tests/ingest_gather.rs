// tests/ingest_gather.rs

mod common;

use ai_intel_dashboard::ingest::{dedup_similar, flatten, gather};
use common::FixedSource;

#[tokio::test]
async fn one_failing_source_does_not_sink_the_others() {
    let sources = vec![
        FixedSource::ok("arXiv", &["paper a", "paper b"]),
        FixedSource::failing("Hacker News"),
        FixedSource::ok("TechCrunch", &["news a"]),
        FixedSource::ok("GitHub", &["repo a", "repo b"]),
    ];

    let batches = gather(&sources).await;
    assert_eq!(batches.len(), 4);
    assert!(batches[1].is_empty());

    let titles: Vec<String> = flatten(batches).into_iter().map(|i| i.title).collect();
    assert_eq!(titles, vec!["paper a", "paper b", "news a", "repo a", "repo b"]);
}

#[tokio::test]
async fn all_sources_failing_gives_empty_batches() {
    let sources = vec![FixedSource::failing("a"), FixedSource::failing("b")];
    let batches = gather(&sources).await;
    assert!(flatten(batches).is_empty());
}

#[tokio::test]
async fn same_story_from_two_sources_survives_without_dedup() {
    let sources = vec![
        FixedSource::ok("TechCrunch", &["OpenAI releases GPT-5"]),
        FixedSource::ok("Hacker News", &["OpenAI releases GPT-5"]),
    ];
    let items = flatten(gather(&sources).await);
    assert_eq!(items.len(), 2);

    let (kept, dropped) = dedup_similar(items, 0.92);
    assert_eq!(dropped, 1);
    assert_eq!(kept[0].source, "TechCrunch");
}
