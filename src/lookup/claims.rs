//! Bulk retrieval of entity claims and their conversion to CURIEs.
//!
//! Entity records are fetched in batches through the [`EntitySource`]; each
//! statement becomes a [`Claim`] whose main value, qualifiers and reference
//! snaks are decoded into the closed [`ClaimValue`] union. Only claims whose
//! property has the `external-id` datatype can yield an equivalence link,
//! and only when the property maps to a registered namespace.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::curie::{curie_for_property, NamespaceRegistry, NativeId};
use crate::error::{LookupError, Result};
use crate::graph::{ordered_snaks, EntitySource, RawDataValue, RawEntity, RawSnak, RawStatement};

pub const EXTERNAL_ID_DATATYPE: &str = "external-id";

/// Decoded value of a snak
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimValue {
    String(String),
    /// Referenced entity id, e.g. `Q550455`
    EntityId(String),
    /// Wikibase timestamp, e.g. `+2017-01-31T00:00:00Z`
    Time(String),
    MonolingualText(String),
    /// Raw amount string; never used for equivalence
    Quantity(String),
    /// `novalue` / `somevalue` snak without a datavalue
    NoValue { snak_type: String },
    /// Value type this parser does not decode
    Unsupported { value_type: String },
}

impl ClaimValue {
    pub fn decode(snak_type: &str, datavalue: Option<&RawDataValue>) -> ClaimValue {
        let Some(datavalue) = datavalue else {
            return ClaimValue::NoValue { snak_type: snak_type.to_string() };
        };
        let field = |name: &str| datavalue.value.get(name).and_then(|v| v.as_str()).map(str::to_string);
        let decoded = match datavalue.value_type.as_str() {
            "string" => datavalue.value.as_str().map(|s| ClaimValue::String(s.to_string())),
            "wikibase-entityid" => field("id").map(ClaimValue::EntityId),
            "time" => field("time").map(ClaimValue::Time),
            "monolingualtext" => field("text").map(ClaimValue::MonolingualText),
            "quantity" => field("amount").map(ClaimValue::Quantity),
            _ => None,
        };
        decoded.unwrap_or_else(|| ClaimValue::Unsupported { value_type: datavalue.value_type.clone() })
    }

    /// Wikibase value-type tag this value was decoded from
    pub fn value_type(&self) -> &str {
        match self {
            ClaimValue::String(_) => "string",
            ClaimValue::EntityId(_) => "wikibase-entityid",
            ClaimValue::Time(_) => "time",
            ClaimValue::MonolingualText(_) => "monolingualtext",
            ClaimValue::Quantity(_) => "quantity",
            ClaimValue::NoValue { snak_type } => snak_type,
            ClaimValue::Unsupported { value_type } => value_type,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClaimValue::String(v)
            | ClaimValue::EntityId(v)
            | ClaimValue::Time(v)
            | ClaimValue::MonolingualText(v)
            | ClaimValue::Quantity(v) => Some(v),
            ClaimValue::NoValue { .. } | ClaimValue::Unsupported { .. } => None,
        }
    }

    /// The value as text, or an `UnsupportedValue` error naming the property
    pub fn require_str(&self, property: &str) -> Result<&str> {
        self.as_str().ok_or_else(|| LookupError::UnsupportedValue {
            property: property.to_string(),
            value_type: self.value_type().to_string(),
        })
    }
}

impl Serialize for ClaimValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(value) = self.as_str() {
            map.serialize_entry("datavalue", value)?;
        }
        map.serialize_entry("datavaluetype", self.value_type())?;
        map.end()
    }
}

/// A property/value pair inside a qualifier or reference block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snak {
    pub property: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(flatten)]
    pub value: ClaimValue,
}

impl Snak {
    fn from_raw(raw: &RawSnak) -> Snak {
        let value = ClaimValue::decode(&raw.snaktype, raw.datavalue.as_ref());
        log_caveats(&raw.property, &value);
        Snak { property: raw.property.clone(), datatype: raw.datatype.clone(), value }
    }
}

fn log_caveats(property: &str, value: &ClaimValue) {
    match value {
        ClaimValue::Quantity(amount) => {
            warn!(property, amount = amount.as_str(), "quantity value passed through as raw amount, unit dropped")
        }
        ClaimValue::Unsupported { value_type } => {
            warn!(property, value_type = value_type.as_str(), "skipping undecodable snak value")
        }
        _ => {}
    }
}

/// One statement made by an entity.
///
/// `property`, `datatype` and `value` are `None` only after
/// [`Claim::into_curie_projection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub id: String,
    pub rank: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(flatten)]
    pub value: Option<ClaimValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Vec<Snak>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Snak>,
    #[serde(rename = "datavaluecurie", skip_serializing_if = "Option::is_none")]
    pub curie: Option<String>,
}

impl Claim {
    pub fn from_raw(raw: &RawStatement) -> Claim {
        let main = Snak::from_raw(&raw.mainsnak);
        let references = raw
            .references
            .iter()
            .map(|block| ordered_snaks(&block.snaks, &block.snaks_order).into_iter().map(Snak::from_raw).collect())
            .collect();
        let qualifiers = ordered_snaks(&raw.qualifiers, &raw.qualifiers_order)
            .into_iter()
            .map(Snak::from_raw)
            .collect();

        Claim {
            id: raw.id.clone(),
            rank: raw.rank.clone(),
            property: Some(main.property),
            datatype: main.datatype,
            value: Some(main.value),
            references,
            qualifiers,
            curie: None,
        }
    }

    pub fn is_external_id(&self) -> bool {
        self.datatype.as_deref() == Some(EXTERNAL_ID_DATATYPE)
    }

    /// Fill `curie` when the property maps to a registered namespace
    pub fn derive_curie(&mut self, registry: &NamespaceRegistry) {
        let (Some(property), Some(value)) = (self.property.as_deref(), self.value.as_ref()) else {
            return;
        };
        if registry.namespace_for_property(property).is_none() {
            return;
        }
        match value.require_str(property) {
            Ok(raw) => self.curie = curie_for_property(registry, property, raw),
            Err(err) => warn!(claim = %self.id, error = %err, "external-id claim without a text value"),
        }
    }

    /// Keep only what a CURIE-level caller needs: id, rank, evidence and the CURIE
    pub fn into_curie_projection(mut self) -> Claim {
        self.property = None;
        self.datatype = None;
        self.value = None;
        self
    }
}

/// All claims of an entity, ordered by property number then statement order
pub fn parse_claims(entity: &RawEntity) -> Vec<Claim> {
    let mut properties: Vec<&String> = entity.claims.keys().collect();
    properties.sort_by_key(|p| (p.len(), p.as_str()));
    properties
        .into_iter()
        .flat_map(|p| entity.claims[p].iter())
        .map(Claim::from_raw)
        .collect()
}

pub type ClaimsById = BTreeMap<NativeId, Vec<Claim>>;

pub struct ClaimsRetriever {
    registry: Arc<NamespaceRegistry>,
    entities: Arc<dyn EntitySource>,
}

impl ClaimsRetriever {
    pub fn new(registry: Arc<NamespaceRegistry>, entities: Arc<dyn EntitySource>) -> Self {
        Self { registry, entities }
    }

    /// Every claim of every entity, fetched in bulk
    pub async fn get_claims(&self, ids: &[NativeId]) -> Result<ClaimsById> {
        if ids.is_empty() {
            return Ok(ClaimsById::new());
        }
        let entities = self.entities.fetch_entities(ids).await?;
        Ok(entities
            .iter()
            .filter_map(|(key, entity)| NativeId::parse(key).map(|id| (id, parse_claims(entity))))
            .collect())
    }

    /// External-id claims only, each with its CURIE derived where possible
    pub async fn get_external_id_claims(&self, ids: &[NativeId]) -> Result<ClaimsById> {
        let mut claims = self.get_claims(ids).await?;
        for entity_claims in claims.values_mut() {
            entity_claims.retain(Claim::is_external_id);
            for claim in entity_claims.iter_mut() {
                claim.derive_curie(&self.registry);
            }
        }
        Ok(claims)
    }

    /// External-id claims that produced a CURIE, projected down to the CURIE
    pub async fn get_curie_claims(&self, ids: &[NativeId]) -> Result<ClaimsById> {
        let claims = self.get_external_id_claims(ids).await?;
        Ok(claims
            .into_iter()
            .map(|(id, entity_claims)| {
                let projected = entity_claims
                    .into_iter()
                    .filter(|claim| claim.curie.is_some())
                    .map(Claim::into_curie_projection)
                    .collect();
                (id, projected)
            })
            .collect())
    }

    /// `wd:Q…` -> CURIEs carried by that entity
    pub async fn get_claims_as_curies(&self, ids: &[NativeId]) -> Result<BTreeMap<String, Vec<String>>> {
        let claims = self.get_curie_claims(ids).await?;
        Ok(claims
            .into_iter()
            .map(|(id, entity_claims)| {
                let curies = entity_claims.into_iter().filter_map(|claim| claim.curie).collect();
                (id.to_curie(), curies)
            })
            .collect())
    }
}
