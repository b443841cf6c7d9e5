//! Built-in search templates for the `address_places` index.

use super::TemplateSpec;
use serde_json::{json, Value};

pub const STRUCTURED_TEMPLATE: &str = "address_structured_v2";
pub const FALLBACK_TEMPLATE: &str = "address_fallback_v2";
pub const UNIVERSAL_TEMPLATE: &str = "address_universal_v2";

/// The fixed template set, in upsert order
pub fn builtin_templates() -> Vec<TemplateSpec> {
    vec![
        TemplateSpec::new(STRUCTURED_TEMPLATE, structured_query()),
        TemplateSpec::new(FALLBACK_TEMPLATE, fallback_query()),
        TemplateSpec::new(UNIVERSAL_TEMPLATE, universal_query()),
    ]
}

fn match_param(field: &str, param: &str) -> Value {
    json!({"match": {field: {"query": format!("{{{{{}}}}}", param)}}})
}

/// Any clause may match; results sorted by score and sized by `{{size}}`
fn scored_should(clauses: Vec<Value>) -> Value {
    json!({
        "query": {
            "bool": {
                "should": clauses,
                "minimum_should_match": 1
            }
        },
        "sort": [{"_score": "desc"}],
        "size": "{{size}}"
    })
}

/// Caller passes pre-split address components
fn structured_query() -> Value {
    scored_should(vec![
        match_param("address.city_my", "city_my"),
        match_param("address.region_my", "region_my"),
        match_param("address.road_my", "road_my"),
        json!({"term": {"address.house_number": "{{house_number}}"}}),
        match_param("address.building_my", "building_my"),
    ])
}

/// Free-text fallback across languages
fn fallback_query() -> Value {
    scored_should(vec![
        match_param("search.full_my", "keyword"),
        match_param("search.full_en", "keyword"),
        match_param("search.full_zh", "keyword"),
        match_param("names.name_my.ngram", "keyword"),
        match_param("names.name_en.ngram", "keyword"),
    ])
}

/// Full text plus nested address parts, boosted by part rank
fn universal_query() -> Value {
    let nested_parts = json!({
        "nested": {
            "path": "address_parts",
            "query": {
                "function_score": {
                    "query": {
                        "bool": {
                            "should": [
                                match_param("address_parts.name.name_my", "keyword"),
                                match_param("address_parts.name.name:my", "keyword")
                            ],
                            "minimum_should_match": 1
                        }
                    },
                    "functions": [{
                        "script_score": {
                            "script": {
                                "source": "Math.pow(2, doc['address_parts.rank'].value / 5.0)"
                            }
                        }
                    }],
                    "boost_mode": "multiply"
                }
            },
            "score_mode": "avg"
        }
    });

    scored_should(vec![
        nested_parts,
        match_param("search.full_my", "keyword"),
        match_param("names.name_my.ngram", "keyword"),
    ])
}
