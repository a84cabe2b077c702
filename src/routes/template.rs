use std::collections::HashMap;

use axum::{response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::utils::template::{
    find_phonetic_directives, normalize_literal_newlines, substitute_variables, unique_variables,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/template/parse", post(parse_template))
}

#[derive(Deserialize)]
struct ParseBody {
    text: String,
    #[serde(default)]
    values: HashMap<String, String>,
}

/// Variables and phonetic directives in a script, plus a preview with the
/// supplied values filled in.
async fn parse_template(Json(body): Json<ParseBody>) -> Json<Value> {
    let text = normalize_literal_newlines(&body.text);
    let variables = unique_variables(&text);
    let missing: Vec<&String> = variables
        .iter()
        .filter(|v| !body.values.contains_key(*v))
        .collect();

    Json(json!({
        "variables": variables,
        "missing": missing,
        "phonetics": find_phonetic_directives(&text),
        "preview": substitute_variables(&text, &body.values),
    }))
}
