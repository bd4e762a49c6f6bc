//! Sample manifest: external identifiers for each assay sample
//!

use std::collections::HashSet;

use regex::Regex;
use strum::IntoEnumIterator;

use crate::errors::{Result, ReviewError};
use crate::raw_table::RawTable;

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::EnumIter, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
enum ManifestField {
    SampleId,
    ExternalId1,
    ExternalId2,
    ExternalId3,
}

impl ManifestField {
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::SampleId => &["Inostics ID", "InosticsID", "Sample ID", "SampleId", "SampleID"],
            Self::ExternalId1 => &["External ID1 (Patient ID-Visit)", "External ID1"],
            Self::ExternalId2 => &["External ID2 (Collection datetime)", "External ID2"],
            Self::ExternalId3 => &["Scan External Barcode", "External ID3"],
        }
    }

    fn name(&self) -> &'static str {
        (*self).into()
    }

    /// Spreadsheet headers may wrap onto several lines, so all whitespace runs are compared as a
    /// single space
    fn matches_header(&self, header: &str) -> bool {
        let header = header.split_whitespace().collect::<Vec<_>>().join(" ");
        header == self.name() || self.aliases().contains(&header.as_str())
    }
}

/// External identifiers for one sample
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SampleMapping {
    pub sample_id: String,

    /// Patient and visit identifier
    pub external_id1: Option<String>,

    /// Collection datetime
    pub external_id2: Option<String>,

    /// External barcode
    pub external_id3: Option<String>,
}

impl SampleMapping {
    fn field_mut(&mut self, field: ManifestField) -> Option<&mut Option<String>> {
        match field {
            ManifestField::SampleId => None,
            ManifestField::ExternalId1 => Some(&mut self.external_id1),
            ManifestField::ExternalId2 => Some(&mut self.external_id2),
            ManifestField::ExternalId3 => Some(&mut self.external_id3),
        }
    }
}

/// Sample mappings in first-seen manifest order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleManifest {
    pub samples: Vec<SampleMapping>,
}

impl SampleManifest {
    pub fn get(&self, sample_id: &str) -> Option<&SampleMapping> {
        self.samples.iter().find(|x| x.sample_id == sample_id)
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|x| x.sample_id.as_str())
    }
}

/// Build the sample manifest from a raw sample list table
///
/// Rows sharing a sample identifier are collapsed, keeping the first non-empty value of each
/// external identifier. A trailing `.0` is removed from the collection datetime identifier.
///
/// # Arguments
/// * `called_samples` - If given, only samples in this set are included
///
pub fn build_sample_manifest(
    table: &RawTable,
    called_samples: Option<&HashSet<String>>,
) -> Result<SampleManifest> {
    let find_column = |field: ManifestField| table.columns.iter().position(|x| field.matches_header(x));

    let sample_field = ManifestField::SampleId;
    let sample_index = find_column(sample_field).ok_or_else(|| {
        ReviewError::schema(
            sample_field.name(),
            format!(
                "no sample identifier column found in sample manifest, expected one of: {}",
                sample_field.aliases().join(", ")
            ),
        )
    })?;
    let field_index = ManifestField::iter()
        .filter(|&x| x != sample_field)
        .map(|x| (x, find_column(x)))
        .collect::<Vec<_>>();

    // Spreadsheet exports turn integer datetime codes into floats
    let float_suffix = Regex::new(r"\.0$").unwrap();

    let mut manifest = SampleManifest::default();
    for row in table.rows.iter() {
        let sample_id = row[sample_index].as_str();
        if sample_id.is_empty() {
            continue;
        }
        if let Some(called_samples) = called_samples {
            if !called_samples.contains(sample_id) {
                continue;
            }
        }

        let position = match manifest.samples.iter().position(|x| x.sample_id == sample_id) {
            Some(x) => x,
            None => {
                manifest.samples.push(SampleMapping {
                    sample_id: sample_id.to_string(),
                    ..Default::default()
                });
                manifest.samples.len() - 1
            }
        };
        let mapping = &mut manifest.samples[position];

        for &(field, index) in field_index.iter() {
            let Some(index) = index else {
                continue;
            };
            let value = row[index].as_str();
            if value.is_empty() {
                continue;
            }
            let value = if field == ManifestField::ExternalId2 {
                float_suffix.replace(value, "").to_string()
            } else {
                value.to_string()
            };
            if let Some(slot) = mapping.field_mut(field) {
                if slot.is_none() {
                    *slot = Some(value);
                }
            }
        }
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_table() -> RawTable {
        let text = "\
Inostics ID\t\"External ID1\n(Patient ID-Visit)\"\t\"External ID2\n(Collection datetime)\"\tScan External Barcode \tPlasma Vol. [mL]
S2\tP002-V1\t\t\t4.0
S1\tP001-V1\t202401150930.0\tBC-11\t4.0
S2\t\t202401161015.0\tBC-22\t4.0
S3\tP003-V1\t202401171100\tBC-33\t4.0
S2\tP999-V9\t1.0\tBC-99\t4.0
";
        RawTable::from_tsv_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_build_sample_manifest() {
        let manifest = build_sample_manifest(&get_test_table(), None).unwrap();
        let ids = manifest.sample_ids().collect::<Vec<_>>();
        assert_eq!(ids, vec!["S2", "S1", "S3"]);

        // First non-empty value for each field
        let s2 = manifest.get("S2").unwrap();
        assert_eq!(s2.external_id1.as_deref(), Some("P002-V1"));
        assert_eq!(s2.external_id2.as_deref(), Some("202401161015"));
        assert_eq!(s2.external_id3.as_deref(), Some("BC-22"));

        let s3 = manifest.get("S3").unwrap();
        assert_eq!(s3.external_id2.as_deref(), Some("202401171100"));
    }

    #[test]
    fn test_build_sample_manifest_called_samples() {
        let called = ["S1".to_string(), "S9".to_string()].into_iter().collect();
        let manifest = build_sample_manifest(&get_test_table(), Some(&called)).unwrap();
        assert_eq!(manifest.samples.len(), 1);
        assert_eq!(manifest.samples[0].sample_id, "S1");
        assert_eq!(manifest.samples[0].external_id2.as_deref(), Some("202401150930"));
    }

    #[test]
    fn test_build_sample_manifest_missing_sample_column() {
        let table = RawTable::new(vec!["External ID1".to_string()], Vec::new());
        assert!(matches!(
            build_sample_manifest(&table, None),
            Err(ReviewError::Schema { field, .. }) if field == "sample_id"
        ));
    }
}
