use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::anilist::MediaTitle;
use crate::error::Error;

static SEASON_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)(?:[0-9]+\s*(?:st|nd|rd|th)?\s*season|season\s*[0-9]*\s*(?:st|nd|rd|th)?|season|(?:3rd|2nd|1st)\s*season|season\s*[0-9]+|[0-9]+[^0-9A-Za-z_]*season)(?-u:\b)",
    )
    .expect("season marker regex")
});

static EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"E([0-9]+)").expect("episode regex"));

static PREFERRED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)SubsPlease|1080p").expect("preferred release regex"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub title: String,
    pub magnet_uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seeders: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub trait Feed: Sync {
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<Release>, Error>> + Send;
}

/// Strips season markers ("2nd Season", "Season 3", ...). "S2" is left alone.
pub fn normalize_title(title: &str) -> String {
    SEASON_MARKER.replace_all(title, "").trim().to_string()
}

pub fn extract_episode(title: &str) -> u64 {
    let cleaned = normalize_title(title);
    EPISODE
        .captures(&cleaned)
        .map(|caps| caps[1].parse().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

pub fn dedupe(releases: Vec<Release>) -> Vec<Release> {
    let mut seen = HashSet::new();
    releases
        .into_iter()
        .filter(|release| seen.insert(release.magnet_uri.clone()))
        .collect()
}

fn is_preferred(release: &Release) -> bool {
    PREFERRED.is_match(&release.title)
}

pub fn compare_releases(a: &Release, b: &Release) -> Ordering {
    is_preferred(b)
        .cmp(&is_preferred(a))
        .then_with(|| extract_episode(&b.title).cmp(&extract_episode(&a.title)))
        .then_with(|| b.seeders.cmp(&a.seeders))
}

pub fn rank(releases: &mut [Release]) {
    releases.sort_by(compare_releases);
}

pub async fn aggregate<F: Feed>(feed: &F, media: &MediaTitle) -> Result<Vec<Release>, Error> {
    let english = media.english.as_deref().unwrap_or_default();
    let romaji = media.romaji.as_deref().unwrap_or_default();
    let normalized = normalize_title(romaji);

    let (by_english, by_romaji, by_normalized) = tokio::try_join!(
        feed.search(english),
        feed.search(romaji),
        feed.search(&normalized),
    )?;

    let total = by_english.len() + by_romaji.len() + by_normalized.len();
    let combined = by_english
        .into_iter()
        .chain(by_romaji)
        .chain(by_normalized)
        .collect();
    let mut releases = dedupe(combined);
    rank(&mut releases);

    tracing::info!(
        english = %english,
        romaji = %romaji,
        normalized = %normalized,
        total,
        unique = releases.len(),
        "aggregated releases"
    );
    Ok(releases)
}
