use chrono::{DateTime, Datelike};
use serde::Serialize;
use utoipa::ToSchema;

use crate::releases::Release;

const SIZE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RankedRelease {
    pub name: String,
    pub magnet: String,
    pub size: String,
    pub seeders: u64,
    pub date: String,
}

impl From<&Release> for RankedRelease {
    fn from(release: &Release) -> Self {
        Self {
            name: release.title.clone(),
            magnet: release.magnet_uri.clone(),
            size: format_file_size(release.total_size),
            seeders: release.seeders,
            date: format_date(release.timestamp),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReleaseList {
    pub title: String,
    pub releases: Vec<RankedRelease>,
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// `M/DD/YY` in UTC, or an empty string for timestamps chrono cannot represent.
pub fn format_date(timestamp: i64) -> String {
    let Some(date) = DateTime::from_timestamp(timestamp, 0) else {
        return String::new();
    };
    format!(
        "{}/{:02}/{:02}",
        date.month(),
        date.day(),
        date.year().rem_euclid(100)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1152), "1.13 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_450_000_000), "1.35 GB");
        assert_eq!(format_file_size(u64::MAX), "16 EB");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1/01/70");
        assert_eq!(format_date(1_711_116_007), "3/22/24");
        assert_eq!(format_date(1_704_412_800), "1/05/24");
        assert_eq!(format_date(i64::MAX), "");
    }

    #[test]
    fn test_ranked_release_from_release() {
        let release = Release {
            title: "[SubsPlease] Sousou no Frieren - 28 (1080p)".to_string(),
            magnet_uri: "magnet:?xt=urn:btih:aaaa".to_string(),
            total_size: 1536,
            seeders: 312,
            timestamp: 0,
        };
        let row = RankedRelease::from(&release);
        assert_eq!(
            row,
            RankedRelease {
                name: "[SubsPlease] Sousou no Frieren - 28 (1080p)".to_string(),
                magnet: "magnet:?xt=urn:btih:aaaa".to_string(),
                size: "1.5 KB".to_string(),
                seeders: 312,
                date: "1/01/70".to_string(),
            }
        );
    }
}
