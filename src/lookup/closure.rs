//! One-hop exact-match closure over foreign CURIEs and native ids.
//!
//! Foreign inputs are resolved to items, every item's external-id claims are
//! turned back into CURIEs, and the union is reported. An item whose claims
//! yield no CURIE at all is "dead": it is evidence of nothing, itself
//! included, and is dropped from the output.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::curie::NativeId;
use crate::error::{CurieError, LookupError, Result};
use crate::lookup::claims::ClaimsRetriever;
use crate::lookup::resolver::EquivalenceResolver;

/// Everything the closure learned about one input set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceSet {
    /// Inputs as received, native ids normalized to `wd:Q…`
    pub inputs: BTreeSet<String>,
    /// Native inputs plus every item a foreign input resolved to
    pub native_ids: BTreeSet<NativeId>,
    /// CURIEs derived from each item's external-id claims
    pub curies_by_id: BTreeMap<NativeId, Vec<String>>,
    /// Items that yielded no CURIE
    pub dead_ids: BTreeSet<NativeId>,
}

impl EquivalenceSet {
    /// Derived CURIEs plus live native ids
    pub fn identifiers(&self) -> BTreeSet<String> {
        let mut identifiers: BTreeSet<String> = self.curies_by_id.values().flatten().cloned().collect();
        identifiers.extend(
            self.native_ids
                .iter()
                .filter(|id| !self.dead_ids.contains(*id))
                .map(NativeId::to_curie),
        );
        identifiers
    }

    /// Identifiers the caller did not already send
    pub fn new_identifiers(&self) -> BTreeSet<String> {
        self.identifiers().difference(&self.inputs).cloned().collect()
    }

    /// Closure output: empty when nothing new is known, otherwise every
    /// identifier of the set, matched inputs included
    pub fn into_matches(self) -> Vec<String> {
        if self.new_identifiers().is_empty() {
            return Vec::new();
        }
        self.identifiers().into_iter().collect()
    }
}

/// Collect the working native ids and their CURIEs for `inputs`.
///
/// An input in an unregistered namespace contributes nothing; a malformed
/// input fails the whole call, as does any upstream error.
pub async fn build_equivalence_set(
    resolver: &EquivalenceResolver,
    claims: &ClaimsRetriever,
    inputs: &[String],
) -> Result<EquivalenceSet> {
    let mut set = EquivalenceSet::default();

    for input in inputs.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
        if let Some(id) = NativeId::parse_prefixed(input) {
            set.inputs.insert(id.to_curie());
            set.native_ids.insert(id);
            continue;
        }

        set.inputs.insert(input.to_string());
        match resolver.resolve(input).await {
            Ok(items) => set.native_ids.extend(items),
            Err(LookupError::Curie(err @ CurieError::UnknownNamespace { .. })) => {
                warn!(input, error = %err, "input contributes nothing to closure");
            }
            Err(err) => return Err(err),
        }
    }

    if set.native_ids.is_empty() {
        return Ok(set);
    }

    let ids: Vec<NativeId> = set.native_ids.iter().cloned().collect();
    let curies = claims.get_claims_as_curies(&ids).await?;
    for id in &set.native_ids {
        match curies.get(&id.to_curie()) {
            Some(found) if !found.is_empty() => {
                set.curies_by_id.insert(id.clone(), found.clone());
            }
            _ => {
                set.dead_ids.insert(id.clone());
            }
        }
    }

    debug!(
        inputs = set.inputs.len(),
        items = set.native_ids.len(),
        dead = set.dead_ids.len(),
        "built equivalence set"
    );
    Ok(set)
}

/// Identifiers exactly matching the input set, or empty if none are new
pub async fn close_exact_matches(
    resolver: &EquivalenceResolver,
    claims: &ClaimsRetriever,
    inputs: &[String],
) -> Result<Vec<String>> {
    Ok(build_equivalence_set(resolver, claims, inputs).await?.into_matches())
}

/// Exact matches of a single concept: its items plus every CURIE they carry
pub async fn exact_matches(
    resolver: &EquivalenceResolver,
    claims: &ClaimsRetriever,
    concept_id: &str,
) -> Result<Vec<String>> {
    let concept_id = concept_id.trim();
    let ids = match NativeId::parse_prefixed(concept_id) {
        Some(id) => vec![id],
        None => resolver.resolve(concept_id).await?,
    };
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let curies = claims.get_claims_as_curies(&ids).await?;
    let mut matches: BTreeSet<String> = curies.into_values().flatten().collect();
    matches.extend(ids.iter().map(NativeId::to_curie));
    Ok(matches.into_iter().collect())
}
