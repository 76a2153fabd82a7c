// API specification loading
//
// Central Manager publishes an OpenAPI-style document whose `paths`
// entries carry a vendor extension naming the public path for that
// operation. The extension values form the allow-list every outbound
// request is validated against.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;

/// Default on-disk location of the specification document.
pub const DEFAULT_SPEC_PATH: &str = "files/f5cm-apispec.json";

#[derive(Deserialize)]
struct ApiSpec {
    #[serde(default)]
    paths: IndexMap<String, PathItem>,
}

#[derive(Deserialize)]
struct PathItem {
    // The rest of the path item (operations, parameters) is irrelevant
    // to the allow-list and left undeserialized.
    #[serde(rename = "x-f5-cm-public-api-path")]
    public_api_path: Option<String>,
}

/// Load the allow-list of public API paths from the spec document.
///
/// Returns one entry per `paths` item, in document order. Items
/// without the public-path extension stay in the list as `None`;
/// membership checks run against the raw list as-is.
pub fn load_valid_paths(path: &Path) -> Result<Vec<Option<String>>, Error> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::SpecIo {
        path: path.to_owned(),
        source,
    })?;

    let spec: ApiSpec = serde_json::from_str(&raw).map_err(|source| Error::SpecParse {
        path: path.to_owned(),
        source,
    })?;

    let paths: Vec<Option<String>> = spec
        .paths
        .into_values()
        .map(|item| item.public_api_path)
        .collect();

    debug!(count = paths.len(), "loaded API spec allow-list");
    Ok(paths)
}
