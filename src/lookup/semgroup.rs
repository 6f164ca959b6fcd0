//! Semantic groups: coarse categories derived from an item's `instance of` (P31) types.
//!
//! Codes follow the UMLS semantic-group abbreviations (DISO, GENE, CHEM, …).

use std::collections::BTreeSet;

/// Type item -> semantic group code
pub const SEMANTIC_GROUPS: &[(&str, &str)] = &[
    ("Q12136", "DISO"),     // disease
    ("Q169872", "DISO"),    // symptom
    ("Q7187", "GENE"),      // gene
    ("Q417841", "GENE"),    // protein family
    ("Q898273", "GENE"),    // protein domain
    ("Q8054", "CHEM"),      // protein
    ("Q11173", "CHEM"),     // chemical compound
    ("Q12140", "CHEM"),     // medication
    ("Q16521", "LIVB"),     // taxon
    ("Q5", "LIVB"),         // human
    ("Q4936952", "ANAT"),   // anatomical structure
    ("Q5058355", "ANAT"),   // cellular component
    ("Q2996394", "PHYS"),   // biological process
    ("Q14860489", "PHYS"),  // molecular function
    ("Q13442814", "CONC"),  // scholarly article
];

/// Type items whose instances are too numerous to count
pub const UNCOUNTED_TYPES: &[&str] = &["Q5"];

pub fn semantic_group(type_qid: &str) -> Option<&'static str> {
    let bare = type_qid.trim_start_matches("wd:");
    SEMANTIC_GROUPS.iter().find(|(qid, _)| *qid == bare).map(|(_, group)| *group)
}

/// Distinct groups of a set of type items; unknown types are ignored
pub fn semantic_groups<'a>(type_qids: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    type_qids
        .into_iter()
        .filter_map(semantic_group)
        .map(str::to_string)
        .collect()
}
