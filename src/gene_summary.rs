//! Per-sample gene status and mutation description summary of reviewed calls
//!

use std::collections::{BTreeMap, BTreeSet, HashSet};

use itertools::Itertools;
use log::warn;

use crate::call_record::{Call, CallRecord};
use crate::sample_manifest::{SampleManifest, SampleMapping};

#[derive(Clone, Debug, PartialEq)]
pub struct SampleGeneSummary {
    pub sample_id: String,
    pub mapping: Option<SampleMapping>,

    /// Detected or not detected status for every gene in the summary gene list
    pub gene_status: BTreeMap<String, Call>,

    pub overall_status: Call,

    /// First non-missing genome equivalent value among the sample's records
    pub total_genome_equivalents: Option<f64>,

    /// One line per detected mutation, None if the sample has no detected mutation
    pub description: Option<String>,
}

impl SampleGeneSummary {
    /// Description text for the mutant summary table
    pub fn description_label(&self) -> &str {
        self.description.as_deref().unwrap_or("NMD")
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneSummary {
    /// All gene names observed in the call records, sorted
    pub genes: Vec<String>,

    pub samples: Vec<SampleGeneSummary>,
}

fn format_optional_value(value: Option<f64>) -> String {
    match value {
        Some(x) => x.to_string(),
        None => "NA".to_string(),
    }
}

/// Mutation description line: `gene | cds change | MAF | mutant molecules`
fn describe_mutation(record: &CallRecord) -> String {
    format!(
        "{} | {} | {} | {}",
        record.gene_name,
        record.cds_change,
        format_optional_value(record.maf_percent),
        format_optional_value(record.mutant_molecules)
    )
}

/// Summarize one sample's calls
///
/// # Arguments
/// * `genes` - Sorted gene list
/// * `records` - All call records of the sample, in input order
///
fn summarize_sample(
    sample_id: &str,
    mapping: Option<&SampleMapping>,
    genes: &[String],
    records: &[&CallRecord],
) -> SampleGeneSummary {
    let gene_status = genes
        .iter()
        .map(|gene| {
            let detected = records
                .iter()
                .any(|x| &x.gene_name == gene && x.call.is_detected());
            let status = if detected {
                Call::MutationDetected
            } else {
                Call::NotDetected
            };
            (gene.clone(), status)
        })
        .collect::<BTreeMap<_, _>>();

    let overall_status = if gene_status.values().any(|x| x.is_detected()) {
        Call::MutationDetected
    } else {
        Call::NotDetected
    };

    let total_genome_equivalents = records.iter().find_map(|x| x.genome_equivalents);

    let descriptions = gene_status
        .iter()
        .filter(|(_, status)| status.is_detected())
        .flat_map(|(gene, _)| {
            records
                .iter()
                .filter(move |x| &x.gene_name == gene && x.call.is_detected())
                .map(|x| describe_mutation(x))
        })
        .collect::<Vec<_>>();
    let description = if descriptions.is_empty() {
        None
    } else {
        Some(descriptions.join("\n"))
    };

    SampleGeneSummary {
        sample_id: sample_id.to_string(),
        mapping: mapping.cloned(),
        gene_status,
        overall_status,
        total_genome_equivalents,
        description,
    }
}

/// Build the gene summary for all samples in the reviewed call set
///
/// Samples follow manifest order when a manifest is given, with any called sample missing from
/// the manifest appended in first-appearance order. Without a manifest, samples are listed in
/// first-appearance order in `records`.
///
pub fn summarize_genes(records: &[CallRecord], manifest: Option<&SampleManifest>) -> GeneSummary {
    let genes = records
        .iter()
        .map(|x| x.gene_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    let called_samples = records.iter().map(|x| x.sample_id.as_str()).unique();
    let sample_ids = match manifest {
        Some(manifest) => {
            let manifest_samples = manifest.sample_ids().collect::<HashSet<_>>();
            let unlisted = called_samples
                .filter(|x| !manifest_samples.contains(x))
                .collect::<Vec<_>>();
            if !unlisted.is_empty() {
                warn!(
                    "{} called samples are missing from the sample manifest: {}",
                    unlisted.len(),
                    unlisted.join(", ")
                );
            }
            manifest.sample_ids().chain(unlisted).collect::<Vec<_>>()
        }
        None => called_samples.collect(),
    };

    let samples = sample_ids
        .into_iter()
        .map(|sample_id| {
            let sample_records = records
                .iter()
                .filter(|x| x.sample_id == sample_id)
                .collect::<Vec<_>>();
            let mapping = manifest.and_then(|x| x.get(sample_id));
            summarize_sample(sample_id, mapping, &genes, &sample_records)
        })
        .collect();

    GeneSummary { genes, samples }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(sample_id: &str, gene: &str, cds: &str, call: Call) -> CallRecord {
        CallRecord::new_test_record(sample_id, gene, cds, "p.X", call)
    }

    fn get_test_records() -> Vec<CallRecord> {
        let mut records = vec![
            rec("S1", "TP53", "c.524G>A", Call::MutationDetected),
            rec("S1", "KRAS", "c.35G>A", Call::NotDetected),
            rec("S1", "KRAS", "c.34G>T", Call::MutationDetected),
            rec("S1", "TP53", "c.743G>A", Call::MutationDetected),
            rec("S2", "KRAS", "c.35G>A", Call::NotDetected),
            rec("S2", "PIK3CA", "c.3140A>G", Call::Other("LowGE".to_string())),
        ];
        records[0].maf_percent = Some(0.25);
        records[0].mutant_molecules = Some(3.0);
        records[0].genome_equivalents = None;
        records[1].genome_equivalents = Some(1500.0);
        records[2].genome_equivalents = Some(1600.0);
        records[2].maf_percent = Some(1.5);
        records[2].mutant_molecules = Some(22.5);
        records[4].genome_equivalents = Some(800.0);
        records
    }

    #[test]
    fn test_summarize_genes() {
        let summary = summarize_genes(&get_test_records(), None);
        assert_eq!(summary.genes, vec!["KRAS", "PIK3CA", "TP53"]);
        assert_eq!(summary.samples.len(), 2);

        let s1 = &summary.samples[0];
        assert_eq!(s1.sample_id, "S1");
        assert_eq!(s1.gene_status["KRAS"], Call::MutationDetected);
        assert_eq!(s1.gene_status["PIK3CA"], Call::NotDetected);
        assert_eq!(s1.gene_status["TP53"], Call::MutationDetected);
        assert_eq!(s1.overall_status, Call::MutationDetected);
        assert_eq!(s1.total_genome_equivalents, Some(1500.0));
        assert_eq!(
            s1.description.as_deref(),
            Some("KRAS | c.34G>T | 1.5 | 22.5\nTP53 | c.524G>A | 0.25 | 3\nTP53 | c.743G>A | NA | NA")
        );

        let s2 = &summary.samples[1];
        assert!(s2.gene_status.values().all(|x| *x == Call::NotDetected));
        assert_eq!(s2.overall_status, Call::NotDetected);
        assert_eq!(s2.total_genome_equivalents, Some(800.0));
        assert_eq!(s2.description, None);
        assert_eq!(s2.description_label(), "NMD");
    }

    #[test]
    fn test_summarize_genes_manifest_order() {
        let manifest = SampleManifest {
            samples: vec![
                SampleMapping {
                    sample_id: "S2".to_string(),
                    external_id1: Some("P2".to_string()),
                    ..Default::default()
                },
                SampleMapping {
                    sample_id: "S0".to_string(),
                    ..Default::default()
                },
            ],
        };
        let summary = summarize_genes(&get_test_records(), Some(&manifest));
        let ids = summary
            .samples
            .iter()
            .map(|x| x.sample_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["S2", "S0", "S1"]);

        assert_eq!(
            summary.samples[0].mapping.as_ref().unwrap().external_id1.as_deref(),
            Some("P2")
        );

        // A manifest sample without calls is reported as not detected
        let s0 = &summary.samples[1];
        assert_eq!(s0.overall_status, Call::NotDetected);
        assert_eq!(s0.total_genome_equivalents, None);
        assert!(s0.mapping.is_some());
        assert!(summary.samples[2].mapping.is_none());
    }
}
