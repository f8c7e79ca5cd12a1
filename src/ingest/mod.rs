// src/ingest/mod.rs
pub mod http;
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::ingest::types::{RawItem, SourceProvider};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;
use strsim::normalized_levenshtein;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/// Shared handle to an adapter; the gather stage polls them concurrently.
pub type DynSource = Arc<dyn SourceProvider>;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Items produced per source.");
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch/parse failures (source contributed zero items)."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Items dropped by the optional cross-source dedup."
        );
        describe_histogram!("ingest_parse_ms", "Adapter parse time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace (arXiv titles wrap across lines)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 4) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// RFC 2822 (RSS `pubDate`) → UTC. Unparseable dates map to the epoch.
pub fn parse_rfc2822(ts: &str) -> DateTime<Utc> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0))
        .unwrap_or_default()
}

/// RFC 3339 (Atom / GitHub) → UTC. Unparseable dates map to the epoch.
pub fn parse_rfc3339(ts: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(ts.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

pub(crate) fn record_parse(started: std::time::Instant, source: &'static str, n: usize) {
    let ms = started.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms", "source" => source).record(ms);
    counter!("ingest_items_total", "source" => source).increment(n as u64);
}

/// Fetch every source concurrently. A failing source is logged and yields an
/// empty batch; the result keeps the provider order.
pub async fn gather(providers: &[DynSource]) -> Vec<Vec<RawItem>> {
    ensure_metrics_described();

    let fetches = providers.iter().map(|p| async move {
        match p.fetch_latest().await {
            Ok(items) => {
                tracing::info!(target: "ingest", provider = p.name(), count = items.len(), "source fetched");
                items
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, provider = p.name(), "source failed");
                counter!("ingest_source_errors_total", "source" => p.name()).increment(1);
                Vec::new()
            }
        }
    });
    futures::future::join_all(fetches).await
}

/// Merge per-source batches into one sequence, preserving order. No dedup.
pub fn flatten(batches: Vec<Vec<RawItem>>) -> Vec<RawItem> {
    batches.into_iter().flatten().collect()
}

/// Optional cross-source dedup: drop later items sharing a URL with, or having a
/// title at least `similarity` similar to, an earlier kept item.
pub fn dedup_similar(items: Vec<RawItem>, similarity: f64) -> (Vec<RawItem>, usize) {
    ensure_metrics_described();

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut kept_titles: Vec<String> = Vec::new();
    let mut keep = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for it in items {
        let url = it.url.trim_end_matches('/').to_ascii_lowercase();
        let title = it.title.to_lowercase();
        let dup_url = !url.is_empty() && seen_urls.contains(&url);
        let dup_title = kept_titles
            .iter()
            .any(|t| normalized_levenshtein(t, &title) >= similarity);
        if dup_url || dup_title {
            dropped += 1;
            continue;
        }
        seen_urls.insert(url);
        kept_titles.push(title);
        keep.push(it);
    }

    counter!("ingest_dedup_total").increment(dropped as u64);
    (keep, dropped)
}
