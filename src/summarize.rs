use camino::Utf8Path;
use log::info;
use thousands::Separable;

use crate::cli;
use crate::errors::Result;
use crate::gene_summary::summarize_genes;
use crate::normalize::normalize_call_table;
use crate::raw_table::RawTable;
use crate::report_output::{write_gene_summary, write_mutant_summary, write_variant_summary};
use crate::run_stats::{SummarizeRunStats, write_run_stats};
use crate::sample_manifest::build_sample_manifest;
use crate::variant_summary::summarize_variants;

pub const GENE_SUMMARY_FILENAME: &str = "gene_summary.tsv";
pub const MUTANT_SUMMARY_FILENAME: &str = "mutant_summary.tsv";
pub const VARIANT_SUMMARY_FILENAME: &str = "variant_summary.tsv";

pub fn run_summarize_command(settings: &cli::SummarizeSettings) -> Result<()> {
    let start = std::time::Instant::now();
    let output_dir = &settings.output_dir;

    // Reviewed calls are already free of control samples
    let table = RawTable::from_tsv_file(
        Utf8Path::new(&settings.reviewed_calls_filename),
        "reviewed calls",
    )?;
    let records = normalize_call_table(&table, "reviewed calls", &[], None)?;

    let manifest = match &settings.manifest_filename {
        Some(filename) => {
            let table = RawTable::from_tsv_file(Utf8Path::new(filename), "sample manifest")?;
            Some(build_sample_manifest(&table, None)?)
        }
        None => None,
    };

    let summary = summarize_genes(&records, manifest.as_ref());
    let detected_sample_count = summary
        .samples
        .iter()
        .filter(|x| x.overall_status.is_detected())
        .count();
    info!(
        "Summarized {} samples over {} genes, {} samples with a detected mutation",
        summary.samples.len().separate_with_commas(),
        summary.genes.len(),
        detected_sample_count.separate_with_commas()
    );

    write_gene_summary(&output_dir.join(GENE_SUMMARY_FILENAME), &summary)?;
    write_mutant_summary(&output_dir.join(MUTANT_SUMMARY_FILENAME), &summary)?;

    let variants = summarize_variants(&records, manifest.as_ref());
    write_variant_summary(&output_dir.join(VARIANT_SUMMARY_FILENAME), &variants)?;

    let run_stats = SummarizeRunStats {
        reviewed_record_count: records.len(),
        sample_count: summary.samples.len(),
        gene_count: summary.genes.len(),
        detected_sample_count,
        detected_variant_count: variants.len(),
        total_runtime_secs: start.elapsed().as_secs_f64(),
    };
    write_run_stats(output_dir, &run_stats);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_record::Call;
    use crate::normalize::default_control_markers;

    #[test]
    fn test_summarize_test_data() {
        let table = RawTable::from_tsv_file(Utf8Path::new("./test_data/calls.tsv"), "calls").unwrap();
        let records =
            normalize_call_table(&table, "calls", &default_control_markers(), None).unwrap();
        let table =
            RawTable::from_tsv_file(Utf8Path::new("./test_data/manifest.tsv"), "manifest").unwrap();
        let manifest = build_sample_manifest(&table, None).unwrap();

        let summary = summarize_genes(&records, Some(&manifest));
        assert_eq!(summary.genes, vec!["KRAS", "PIK3CA", "TP53"]);

        let ids = summary
            .samples
            .iter()
            .map(|x| x.sample_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["S002", "S001", "S003", "S999"]);

        let s001 = &summary.samples[1];
        assert_eq!(s001.gene_status["KRAS"], Call::MutationDetected);
        assert_eq!(s001.gene_status["TP53"], Call::NotDetected);
        assert_eq!(s001.description.as_deref(), Some("KRAS | c.35G>A | 10 | 100"));
        let mapping = s001.mapping.as_ref().unwrap();
        assert_eq!(mapping.external_id1.as_deref(), Some("P001-V1"));
        assert_eq!(mapping.external_id2.as_deref(), Some("202401150930"));

        let s002 = &summary.samples[0];
        assert_eq!(
            s002.description.as_deref(),
            Some("PIK3CA | c.3140A>G | 0.5 | 5\nTP53 | c.524G>A | 1 | 10")
        );

        let s999 = &summary.samples[3];
        assert_eq!(s999.overall_status, Call::NotDetected);
        assert_eq!(s999.description_label(), "NMD");

        // Detected variants in input order, each with its sample's external identifiers
        let variants = summarize_variants(&records, Some(&manifest));
        let labels = variants
            .iter()
            .map(|x| (x.record.sample_id.as_str(), x.record.gene_name.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            vec![
                ("S001", "KRAS"),
                ("S002", "TP53"),
                ("S003", "KRAS"),
                ("S002", "PIK3CA")
            ]
        );
        let mapping = variants[1].mapping.as_ref().unwrap();
        assert_eq!(mapping.external_id1.as_deref(), Some("P002-V1"));
        assert_eq!(variants[1].record.extra_field("COSMIC ID"), Some("COSM10648"));
    }
}
