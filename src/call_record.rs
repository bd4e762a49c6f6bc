use std::fmt;

use serde::{Serialize, Serializer};

/// Categorical mutation call assigned to one variant in one sample
///
/// Instrument exports occasionally carry call strings other than MD/NMD, these are preserved
/// as-is and never take part in comparator confirmation.
///
#[derive(Clone, Debug, Eq, Hash, PartialEq, strum::EnumString)]
pub enum Call {
    #[strum(serialize = "MD")]
    MutationDetected,

    #[strum(serialize = "NMD")]
    NotDetected,

    #[strum(default)]
    Other(String),
}

impl Call {
    pub fn as_str(&self) -> &str {
        match self {
            Call::MutationDetected => "MD",
            Call::NotDetected => "NMD",
            Call::Other(x) => x.as_str(),
        }
    }

    pub fn is_detected(&self) -> bool {
        *self == Call::MutationDetected
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Call {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Natural join key of a variant call: sample, coding change and amino-acid change
///
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VariantKey {
    pub sample_id: String,
    pub cds_change: String,
    pub aa_change: String,
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.sample_id, self.cds_change, self.aa_change)
    }
}

impl Serialize for VariantKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One variant call for one sample in one run
///
/// The raw count fields are optional at parse time. Rows which never reach comparator
/// confirmation are allowed to leave them blank, and the molecule-count estimator reports any
/// missing value it actually needs.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CallRecord {
    pub sample_id: String,
    pub gene_name: String,
    pub cds_change: String,
    pub aa_change: String,
    pub call: Call,
    pub uids_per_amplicon: Option<f64>,
    pub supermutants: Option<f64>,
    pub genome_equivalents: Option<f64>,
    pub comment_internal: Option<String>,
    pub comment_external: Option<String>,
    pub amplicon_id: Option<String>,
    pub maf_percent: Option<f64>,
    pub mutant_molecules: Option<f64>,

    /// Input columns with no canonical field (COSMIC ID, ClinVar, run metadata...), as
    /// `(column name, cell text)` in input column order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_fields: Vec<(String, String)>,
}

impl CallRecord {
    pub fn key(&self) -> VariantKey {
        VariantKey {
            sample_id: self.sample_id.clone(),
            cds_change: self.cds_change.clone(),
            aa_change: self.aa_change.clone(),
        }
    }

    pub fn extra_field(&self, name: &str) -> Option<&str> {
        self.extra_fields
            .iter()
            .find(|(x, _)| x == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set the value of an extra column, replacing any existing value under the same name
    pub fn set_extra_field(&mut self, name: &str, value: &str) {
        match self.extra_fields.iter_mut().find(|(x, _)| x == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .extra_fields
                .push((name.to_string(), value.to_string())),
        }
    }

    #[cfg(test)]
    pub fn new_test_record(
        sample_id: &str,
        gene_name: &str,
        cds_change: &str,
        aa_change: &str,
        call: Call,
    ) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            gene_name: gene_name.to_string(),
            cds_change: cds_change.to_string(),
            aa_change: aa_change.to_string(),
            call,
            uids_per_amplicon: None,
            supermutants: None,
            genome_equivalents: None,
            comment_internal: None,
            comment_external: None,
            amplicon_id: None,
            maf_percent: None,
            mutant_molecules: None,
            extra_fields: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_counts(mut self, uids_per_amplicon: f64, supermutants: f64, ge: f64) -> Self {
        self.uids_per_amplicon = Some(uids_per_amplicon);
        self.supermutants = Some(supermutants);
        self.genome_equivalents = Some(ge);
        self
    }
}

/// A tumor-assay call record
pub type MutationCallRecord = CallRecord;

/// A call record from the independent background (comparator) assay
pub type ComparatorCallRecord = CallRecord;
