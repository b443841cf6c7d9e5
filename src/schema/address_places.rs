//! Built-in schema for the `address_places` index (version v2).

use super::SchemaDescriptor;
use crate::config::SchemaConfig;
use crate::error::Result;
use serde_json::{json, Map, Value};

pub const ADDRESS_PLACES_VERSION: &str = "v2";

/// Languages indexed for names and address components
const LANGUAGES: [&str; 3] = ["my", "en", "zh"];

const ADDRESS_COMPONENTS: [&str; 5] = ["country", "city", "region", "road", "building"];

/// Analyzer applied by the engine's Myanmar segmentation plugin
const MYANMAR_ANALYZER: &str = "myanmar_kytea_analyzer";

/// Desired `address_places` schema for the given index name and parameters
pub fn address_places(index_name: &str, config: &SchemaConfig) -> Result<SchemaDescriptor> {
    SchemaDescriptor::new(
        index_name,
        ADDRESS_PLACES_VERSION,
        address_places_settings(config),
        address_places_mapping(),
        config.fingerprint_fields.as_slice(),
    )
}

fn address_places_settings(config: &SchemaConfig) -> Value {
    json!({
        "index.max_ngram_diff": config.max_ngram_diff,
        "index.mapping.total_fields.limit": config.total_fields_limit,
        "analysis": {
            "analyzer": {
                "myanmar_ngram": {
                    "type": "custom",
                    "tokenizer": "standard",
                    "filter": ["lowercase", "my_ngram"]
                },
                "generic_edge": {
                    "type": "custom",
                    "tokenizer": "standard",
                    "filter": ["lowercase", "edge_gram"]
                }
            },
            "filter": {
                "my_ngram": {
                    "type": "ngram",
                    "min_gram": config.ngram_min,
                    "max_gram": config.ngram_max
                },
                "edge_gram": {
                    "type": "edge_ngram",
                    "min_gram": config.edge_ngram_min,
                    "max_gram": config.edge_ngram_max
                }
            }
        }
    })
}

fn address_places_mapping() -> Value {
    json!({
        "properties": {
            "osm_type": keyword(),
            "osm_id": {"type": "long"},
            "place_id": {"type": "long"},
            "class": keyword(),
            "type": keyword(),
            "admin_level": {"type": "integer"},
            "rank_address": {"type": "integer"},
            "rank_search": {"type": "integer"},
            "importance": {"type": "double"},
            "country_code": keyword(),
            "postcode": keyword(),
            "indexed_date": {"type": "date"},
            "centroid": {"type": "geo_point"},
            "names": object(names_properties()),
            "address": object(address_properties()),
            "search": object(search_properties()),
            "address_parts": {
                "type": "nested",
                "properties": address_part_properties()
            }
        }
    })
}

fn keyword() -> Value {
    json!({"type": "keyword"})
}

fn object(properties: Map<String, Value>) -> Value {
    json!({ "properties": properties })
}

/// Text with an exact-match `keyword` sub-field
fn text_with_keyword() -> Value {
    json!({"type": "text", "fields": {"keyword": keyword()}})
}

/// Searchable name: full text, a bounded keyword, and an ngram sub-field
fn name_field(language: Option<&str>) -> Value {
    let keyword = json!({"type": "keyword", "ignore_above": 512});
    if language == Some("my") {
        return json!({
            "type": "text",
            "analyzer": MYANMAR_ANALYZER,
            "search_analyzer": MYANMAR_ANALYZER,
            "fields": {
                "keyword": keyword,
                "ngram": {
                    "type": "text",
                    "analyzer": "myanmar_ngram",
                    "search_analyzer": "myanmar_ngram"
                }
            }
        });
    }

    json!({
        "type": "text",
        "fields": {
            "keyword": keyword,
            "ngram": {
                "type": "text",
                "analyzer": "generic_edge",
                "search_analyzer": "standard"
            }
        }
    })
}

fn names_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("name_default".to_string(), name_field(None));
    for lang in LANGUAGES {
        props.insert(format!("name_{}", lang), name_field(Some(lang)));
    }
    props
}

fn address_properties() -> Map<String, Value> {
    let mut props = Map::new();
    for component in ADDRESS_COMPONENTS {
        for lang in LANGUAGES {
            props.insert(format!("{}_{}", component, lang), text_with_keyword());
        }
    }
    props.insert("house_number".to_string(), keyword());
    props.insert("postcode".to_string(), keyword());
    props
}

fn search_properties() -> Map<String, Value> {
    let mut props = Map::new();
    for lang in LANGUAGES {
        let field = if lang == "my" {
            json!({"type": "text", "analyzer": MYANMAR_ANALYZER})
        } else {
            json!({"type": "text"})
        };
        props.insert(format!("full_{}", lang), field);
    }
    props.insert("tokens".to_string(), keyword());
    props
}

fn address_part_properties() -> Map<String, Value> {
    let mut names = Map::new();
    names.insert("name_default".to_string(), text_with_keyword());
    for lang in LANGUAGES {
        names.insert(format!("name_{}", lang), text_with_keyword());
    }

    let mut props = Map::new();
    props.insert("address_place_id".to_string(), json!({"type": "long"}));
    props.insert("osm_type".to_string(), keyword());
    props.insert("osm_id".to_string(), json!({"type": "long"}));
    props.insert("rank".to_string(), json!({"type": "integer"}));
    props.insert("part_class".to_string(), keyword());
    props.insert("part_type".to_string(), keyword());
    props.insert("name".to_string(), object(names));
    props
}
