//! Convert raw instrument exports into canonical call records
//!
//! Normalization runs in three steps:
//! 1. Control-sample rows are removed based on the sample identifier
//! 2. Header aliases used by the various instrument and review exports are renamed to one
//!    canonical column name per field
//! 3. Harmonized rows are parsed into typed `CallRecord`s
//!

use log::{debug, info};
use strum::IntoEnumIterator;
use thousands::Separable;

use crate::call_record::{Call, CallRecord};
use crate::errors::{Result, ReviewError};
use crate::raw_table::RawTable;

/// Sample identifier substrings marking positive and no-template/negative control samples
pub const DEFAULT_CONTROL_MARKERS: &[&str] = &["PC", "NC", "NTC"];

/// Tag carried by comparator (background) assay sample identifiers
pub const DEFAULT_COMPARATOR_SAMPLE_TAG: &str = "BC";

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::EnumIter, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CallField {
    SampleId,
    GeneName,
    CdsChange,
    AaChange,
    Call,
    UidsPerAmplicon,
    Supermutants,
    GenomeEquivalents,
    CommentInternal,
    CommentExternal,
    AmpliconId,
    MafPercent,
    MutantMolecules,
}

impl CallField {
    /// Header names used for this field in raw summary and result review exports
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::SampleId => &["SampleId", "SampleID", "Sample ID"],
            Self::GeneName => &["Gene Name", "GeneName"],
            Self::CdsChange => &["CDS Change", "CDSChange"],
            Self::AaChange => &["AA Change", "AAChange"],
            Self::Call => &["Call"],
            Self::UidsPerAmplicon => &["#UIDs/Amplicon", "UIDAMP"],
            Self::Supermutants => &["#Supermutants", "SUPMUT"],
            Self::GenomeEquivalents => &["Total DNA Amount (GE)", "GE", "TOTDNAMT"],
            Self::CommentInternal => &["Comment Call (Internal)"],
            Self::CommentExternal => &["Comment Call (External)"],
            Self::AmpliconId => &["Amplicon ID", "AmpliconID"],
            Self::MafPercent => &["MAF [%]", "MAF[%]"],
            Self::MutantMolecules => &["Mutant Molecules", "MutantMolecules", "MUTMOL"],
        }
    }

    /// Canonical column name
    pub fn name(&self) -> &'static str {
        (*self).into()
    }

    fn matches_header(&self, header: &str) -> bool {
        header == self.name() || self.aliases().contains(&header)
    }

    fn from_header(header: &str) -> Option<Self> {
        Self::iter().find(|x| x.matches_header(header))
    }

    fn is_required(&self) -> bool {
        matches!(
            self,
            Self::SampleId | Self::GeneName | Self::CdsChange | Self::AaChange | Self::Call
        )
    }
}

/// Find the sample identifier column under any of its accepted header names
fn find_sample_id_column(table: &RawTable) -> Result<usize> {
    let field = CallField::SampleId;
    table
        .columns
        .iter()
        .position(|x| field.matches_header(x))
        .ok_or_else(|| {
            ReviewError::schema(
                field.name(),
                format!(
                    "no sample identifier column found, expected one of: {}",
                    field.aliases().join(", ")
                ),
            )
        })
}

/// Remove all rows whose sample identifier contains any of the control markers
///
/// The marker match is a case-sensitive substring test.
///
pub fn drop_control_samples(table: &RawTable, control_markers: &[String]) -> Result<RawTable> {
    let sample_index = find_sample_id_column(table)?;

    let rows = table
        .rows
        .iter()
        .filter(|row| {
            let sample_id = row[sample_index].as_str();
            let is_control = control_markers
                .iter()
                .any(|marker| sample_id.contains(marker.as_str()));
            if is_control {
                debug!("Dropping control sample row: '{sample_id}'");
            }
            !is_control
        })
        .cloned()
        .collect::<Vec<_>>();

    Ok(RawTable::new(table.columns.clone(), rows))
}

/// Rename all recognized header aliases to canonical field names
///
/// Unrecognized columns are kept under their original name.
///
pub fn harmonize_columns(table: &RawTable) -> Result<RawTable> {
    let mut seen = Vec::new();
    let mut columns = Vec::with_capacity(table.columns.len());
    for header in table.columns.iter() {
        match CallField::from_header(header) {
            Some(field) => {
                if seen.contains(&field) {
                    return Err(ReviewError::schema(
                        field.name(),
                        format!("more than one input column maps to this field (last: '{header}')"),
                    ));
                }
                seen.push(field);
                columns.push(field.name().to_string());
            }
            None => columns.push(header.clone()),
        }
    }
    Ok(RawTable::new(columns, table.rows.clone()))
}

/// Cell text for an optional column, absent columns read as empty
fn get_cell(row: &[String], index: Option<usize>) -> &str {
    match index {
        Some(i) => row[i].as_str(),
        None => "",
    }
}

fn parse_optional_text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_optional_number(value: &str, field: CallField, row_number: usize) -> Result<Option<f64>> {
    match value {
        "" | "NA" | "NaN" | "nan" | "-" => Ok(None),
        _ => value.parse::<f64>().map(Some).map_err(|_| {
            ReviewError::schema(
                field.name(),
                format!("can't parse value '{value}' on data row {row_number} as a number"),
            )
        }),
    }
}

/// Parse rows of a harmonized table into call records
///
pub fn parse_call_records(table: &RawTable) -> Result<Vec<CallRecord>> {
    // Resolve the column index of every field up front, so that missing required columns are
    // reported before any row is touched
    let mut field_index = Vec::new();
    for field in CallField::iter() {
        let index = if field.is_required() {
            Some(table.required_column_index(field.name())?)
        } else {
            table.column_index(field.name())
        };
        field_index.push((field, index));
    }
    // Every other named column is carried through unchanged
    let extra_columns = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && !CallField::iter().any(|x| x.name() == name.as_str()))
        .map(|(index, name)| (index, name.clone()))
        .collect::<Vec<_>>();

    let index_of = |field: CallField| -> Option<usize> {
        field_index
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, i)| *i)
    };

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_index, row) in table.rows.iter().enumerate() {
        let row_number = row_index + 1;
        let text = |field: CallField| get_cell(row, index_of(field));
        let number = |field: CallField| parse_optional_number(text(field), field, row_number);

        let sample_id = text(CallField::SampleId);
        if sample_id.is_empty() {
            return Err(ReviewError::schema(
                CallField::SampleId.name(),
                format!("empty sample identifier on data row {row_number}"),
            ));
        }

        // Unrecognized call strings are kept as Call::Other
        let call_text = text(CallField::Call);
        let call = call_text
            .parse::<Call>()
            .unwrap_or_else(|_| Call::Other(call_text.to_string()));

        records.push(CallRecord {
            sample_id: sample_id.to_string(),
            gene_name: text(CallField::GeneName).to_string(),
            cds_change: text(CallField::CdsChange).to_string(),
            aa_change: text(CallField::AaChange).to_string(),
            call,
            uids_per_amplicon: number(CallField::UidsPerAmplicon)?,
            supermutants: number(CallField::Supermutants)?,
            genome_equivalents: number(CallField::GenomeEquivalents)?,
            comment_internal: parse_optional_text(text(CallField::CommentInternal)),
            comment_external: parse_optional_text(text(CallField::CommentExternal)),
            amplicon_id: parse_optional_text(text(CallField::AmpliconId)),
            maf_percent: number(CallField::MafPercent)?,
            mutant_molecules: number(CallField::MutantMolecules)?,
            extra_fields: extra_columns
                .iter()
                .map(|(index, name)| (name.clone(), row[*index].clone()))
                .collect(),
        });
    }
    Ok(records)
}

/// Remove every occurrence of the comparator assay tag from each sample identifier
///
pub fn remove_sample_tag(records: Vec<CallRecord>, tag: &str) -> Vec<CallRecord> {
    if tag.is_empty() {
        return records;
    }
    records
        .into_iter()
        .map(|mut x| {
            x.sample_id = x.sample_id.replace(tag, "");
            x
        })
        .collect()
}

/// Full normalization of one raw export into canonical call records
///
/// # Arguments
/// * `label` - Describes the dataset in log messages
/// * `sample_tag` - If given, this tag is stripped from all sample identifiers after parsing
///
pub fn normalize_call_table(
    table: &RawTable,
    label: &str,
    control_markers: &[String],
    sample_tag: Option<&str>,
) -> Result<Vec<CallRecord>> {
    let filtered = drop_control_samples(table, control_markers)?;
    info!(
        "Removed {} control sample rows from {label} table",
        (table.rows.len() - filtered.rows.len()).separate_with_commas()
    );
    let harmonized = harmonize_columns(&filtered)?;
    let records = parse_call_records(&harmonized)?;
    let records = match sample_tag {
        Some(tag) => remove_sample_tag(records, tag),
        None => records,
    };
    info!(
        "Normalized {} {label} call records",
        records.len().separate_with_commas()
    );
    Ok(records)
}

#[cfg(test)]
pub fn default_control_markers() -> Vec<String> {
    DEFAULT_CONTROL_MARKERS
        .iter()
        .map(|x| x.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_table() -> RawTable {
        let text = "\
SampleId\tGene Name\tCDS Change\tAA Change\tCall\t#UIDs/Amplicon\t#Supermutants\tGE\tComment Call (Internal)
S1\tKRAS\tc.35G>A\tp.G12D\tMD\t1000\t5\t2000\t
PC-01\tKRAS\tc.35G>A\tp.G12D\tMD\t1000\t50\t2000\t
S2NTC\tTP53\tc.524G>A\tp.R175H\tNMD\t1000\t0\t2000\t
NC-02\tTP53\tc.524G>A\tp.R175H\tNMD\t1000\t0\t2000\t
pc-lower\tTP53\tc.524G>A\tp.R175H\tNMD\t\t\t\tcheck
";
        RawTable::from_tsv_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_drop_control_samples() {
        let table = get_test_table();
        let filtered = drop_control_samples(&table, &default_control_markers()).unwrap();
        let sample_ids = filtered.rows.iter().map(|x| x[0].as_str()).collect::<Vec<_>>();

        // Lower case marker is not a control match
        assert_eq!(sample_ids, vec!["S1", "pc-lower"]);
    }

    #[test]
    fn test_drop_control_samples_missing_column() {
        let table = RawTable::new(vec!["Gene Name".to_string()], vec![vec!["KRAS".to_string()]]);
        let result = drop_control_samples(&table, &default_control_markers());
        assert!(matches!(
            result,
            Err(ReviewError::Schema { field, .. }) if field == "sample_id"
        ));
    }

    #[test]
    fn test_harmonize_columns() {
        let table = harmonize_columns(&get_test_table()).unwrap();
        assert_eq!(table.columns[0], "sample_id");
        assert_eq!(table.columns[5], "uids_per_amplicon");
        assert_eq!(table.columns[7], "genome_equivalents");
        assert_eq!(table.columns[8], "comment_internal");
    }

    #[test]
    fn test_harmonize_columns_conflict() {
        let table = RawTable::new(
            vec!["SampleId".to_string(), "Sample ID".to_string()],
            Vec::new(),
        );
        assert!(matches!(
            harmonize_columns(&table),
            Err(ReviewError::Schema { .. })
        ));
    }

    #[test]
    fn test_normalize_call_table() {
        let records = normalize_call_table(
            &get_test_table(),
            "test",
            &default_control_markers(),
            None,
        )
        .unwrap();
        assert_eq!(records.len(), 2);

        let r0 = &records[0];
        assert_eq!(r0.sample_id, "S1");
        assert_eq!(r0.call, Call::MutationDetected);
        assert_eq!(r0.uids_per_amplicon, Some(1000.0));
        assert_eq!(r0.supermutants, Some(5.0));
        assert_eq!(r0.genome_equivalents, Some(2000.0));
        assert_eq!(r0.comment_internal, None);

        let r1 = &records[1];
        assert_eq!(r1.call, Call::NotDetected);
        assert_eq!(r1.uids_per_amplicon, None);
        assert_eq!(r1.comment_internal.as_deref(), Some("check"));
    }

    #[test]
    fn test_parse_extra_columns() {
        let text = "\
SampleId\tGene Name\tCOSMIC ID\tCDS Change\tAA Change\tCall\tClinVar\t
S1\tKRAS\tCOSM521\tc.35G>A\tp.G12D\tMD\t\t
";
        let table = harmonize_columns(&RawTable::from_tsv_reader(text.as_bytes()).unwrap()).unwrap();
        let records = parse_call_records(&table).unwrap();

        // Unnamed trailing column is dropped, blank cells are kept
        assert_eq!(
            records[0].extra_fields,
            vec![
                ("COSMIC ID".to_string(), "COSM521".to_string()),
                ("ClinVar".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_bad_number() {
        let text = "SampleID\tGeneName\tCDSChange\tAAChange\tCall\tGE\nS1\tKRAS\tc.1A>T\tp.M1L\tMD\tlots\n";
        let table = harmonize_columns(&RawTable::from_tsv_reader(text.as_bytes()).unwrap()).unwrap();
        assert!(matches!(
            parse_call_records(&table),
            Err(ReviewError::Schema { field, .. }) if field == "genome_equivalents"
        ));
    }

    #[test]
    fn test_parse_missing_required_column() {
        let text = "SampleID\tGeneName\tCDSChange\tCall\nS1\tKRAS\tc.1A>T\tMD\n";
        let table = harmonize_columns(&RawTable::from_tsv_reader(text.as_bytes()).unwrap()).unwrap();
        assert!(matches!(
            parse_call_records(&table),
            Err(ReviewError::Schema { field, .. }) if field == "aa_change"
        ));
    }

    #[test]
    fn test_remove_sample_tag() {
        let records = vec![CallRecord::new_test_record(
            "S1BC",
            "KRAS",
            "c.35G>A",
            "p.G12D",
            Call::MutationDetected,
        )];
        let records = remove_sample_tag(records, DEFAULT_COMPARATOR_SAMPLE_TAG);
        assert_eq!(records[0].sample_id, "S1");
    }
}
