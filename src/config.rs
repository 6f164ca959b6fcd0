use std::time::Duration;

pub const DEFAULT_SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";
pub const DEFAULT_API_ENDPOINT: &str = "https://www.wikidata.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "garbanzo/0.1 (https://github.com/SuLab/garbanzo)";

/// Wikidata rejects `wbgetentities` requests naming more ids than this
pub const WIKIDATA_MAX_IDS_PER_REQUEST: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Size and lifetime bounds for a read-through cache
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,
    /// Seconds an entry stays valid after insertion
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        Self { capacity, ttl_secs }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 10_000, ttl_secs: 300 }
    }
}

#[derive(Debug, Clone)]
pub struct GarbanzoConfig {
    /// SPARQL endpoint receiving graph-pattern queries
    pub sparql_endpoint: String,
    /// MediaWiki action API used for entity and search lookups
    pub api_endpoint: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Ids per `wbgetentities` call; clamped to the Wikidata limit
    pub max_entities_per_request: usize,
    /// Resolver, concept and label caches
    pub lookup_cache: CacheConfig,
    /// Unfiltered statement pages keyed by source id set
    pub statement_cache: CacheConfig,
}

impl GarbanzoConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn entity_batch_size(&self) -> usize {
        self.max_entities_per_request.clamp(1, WIKIDATA_MAX_IDS_PER_REQUEST)
    }
}

impl Default for GarbanzoConfig {
    fn default() -> Self {
        Self {
            sparql_endpoint: DEFAULT_SPARQL_ENDPOINT.to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 60,
            max_entities_per_request: WIKIDATA_MAX_IDS_PER_REQUEST,
            lookup_cache: CacheConfig::default(),
            statement_cache: CacheConfig::new(100, 300),
        }
    }
}
