//! Analysis to rollup aggregation
//!
//! Converts one analysis into the per-facet deltas it contributes. Records
//! come out in the order their key is first seen in the analysis.

use std::collections::HashMap;
use std::hash::Hash;

use crate::domain::analysis::{AnalysisResult, Vulnerability};
use crate::domain::dashboard::{
    RollupRecord, TimeBucketGranularity, VulnerabilitiesByAuthor, VulnerabilitiesByLanguage,
    VulnerabilitiesByRepository, VulnerabilitiesByTime, VulnerabilityCounters,
};

/// Author key used when a finding carries neither email nor author name
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Language key used when a finding has no language
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// The four facet deltas of one analysis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisRollups {
    pub by_author: Vec<VulnerabilitiesByAuthor>,
    pub by_language: Vec<VulnerabilitiesByLanguage>,
    pub by_repository: Vec<VulnerabilitiesByRepository>,
    pub by_time: Vec<VulnerabilitiesByTime>,
}

impl AnalysisRollups {
    pub fn is_empty(&self) -> bool {
        self.by_author.is_empty()
            && self.by_language.is_empty()
            && self.by_repository.is_empty()
            && self.by_time.is_empty()
    }
}

/// Pure transformer from analyses to rollup records
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisAggregator {
    time_bucket: TimeBucketGranularity,
}

impl AnalysisAggregator {
    pub fn new(time_bucket: TimeBucketGranularity) -> Self {
        Self { time_bucket }
    }

    pub fn time_bucket(&self) -> TimeBucketGranularity {
        self.time_bucket
    }

    /// Produce all four facets at once
    pub fn aggregate(&self, analysis: &AnalysisResult) -> AnalysisRollups {
        AnalysisRollups {
            by_author: self.by_author(analysis),
            by_language: self.by_language(analysis),
            by_repository: self.by_repository(analysis),
            by_time: self.by_time(analysis),
        }
    }

    pub fn by_author(&self, analysis: &AnalysisResult) -> Vec<VulnerabilitiesByAuthor> {
        rollup(analysis, author_key, |author, vulnerability| {
            VulnerabilitiesByAuthor {
                author,
                vulnerability,
                created_at: analysis.created_at,
            }
        })
    }

    pub fn by_language(&self, analysis: &AnalysisResult) -> Vec<VulnerabilitiesByLanguage> {
        rollup(analysis, language_key, |language, vulnerability| {
            VulnerabilitiesByLanguage {
                language,
                vulnerability,
                created_at: analysis.created_at,
            }
        })
    }

    pub fn by_repository(&self, analysis: &AnalysisResult) -> Vec<VulnerabilitiesByRepository> {
        let repository_name = if analysis.repository_name.trim().is_empty() {
            analysis.repository_id.to_string()
        } else {
            analysis.repository_name.clone()
        };

        rollup(
            analysis,
            |_| repository_name.clone(),
            |repository_name, vulnerability| VulnerabilitiesByRepository {
                repository_name,
                vulnerability,
                created_at: analysis.created_at,
            },
        )
    }

    pub fn by_time(&self, analysis: &AnalysisResult) -> Vec<VulnerabilitiesByTime> {
        let bucket = self.time_bucket.truncate(analysis.created_at);

        rollup(
            analysis,
            |_| bucket,
            |time, vulnerability| VulnerabilitiesByTime {
                time,
                vulnerability,
                created_at: analysis.created_at,
            },
        )
    }
}

fn author_key(vuln: &Vulnerability) -> String {
    vuln.commit
        .author_identity()
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string()
}

fn language_key(vuln: &Vulnerability) -> String {
    match vuln.language.trim() {
        "" => UNKNOWN_LANGUAGE.to_string(),
        language => language.to_string(),
    }
}

/// Group the analysis's findings by `key_of`, one record per distinct key
fn rollup<K, R>(
    analysis: &AnalysisResult,
    key_of: impl Fn(&Vulnerability) -> K,
    build: impl Fn(K, VulnerabilityCounters) -> R,
) -> Vec<R>
where
    K: Clone + Eq + Hash,
    R: RollupRecord,
{
    let mut records: Vec<R> = Vec::new();
    let mut positions: HashMap<K, usize> = HashMap::new();

    for vuln in analysis.vulnerabilities() {
        let key = key_of(vuln);
        let position = *positions.entry(key.clone()).or_insert_with(|| {
            let counters =
                VulnerabilityCounters::new(analysis.workspace_id, Some(analysis.repository_id));
            records.push(build(key, counters));
            records.len() - 1
        });

        records[position]
            .vulnerability_mut()
            .record(vuln.severity, vuln.vuln_type);
    }

    records
}
