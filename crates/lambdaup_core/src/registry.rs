use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("failed to list functions: {0}")]
    Request(String),

    #[error("malformed function list: {0}")]
    Parse(String),

    #[error("function list pagination repeated marker {0}")]
    RepeatedMarker(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFunction {
    #[serde(rename = "FunctionName")]
    pub function_name: String,
}

/// One response of the remote function listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionListPage {
    #[serde(rename = "Functions", default)]
    pub functions: Vec<RemoteFunction>,
    #[serde(rename = "NextMarker", default, skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
}

impl FunctionListPage {
    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(text).map_err(|error| RegistryError::Parse(error.to_string()))
    }
}

/// Functions deployed at the moment the snapshot was taken. Valid for a
/// single reconciliation only; fetch a fresh one for every deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFunctionSet {
    #[serde(rename = "Functions", default)]
    pub functions: Vec<RemoteFunction>,
}

impl RemoteFunctionSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            functions: names
                .into_iter()
                .map(|name| RemoteFunction {
                    function_name: name.into(),
                })
                .collect(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(text).map_err(|error| RegistryError::Parse(error.to_string()))
    }

    /// Exact, case-sensitive match.
    pub fn has(&self, function_name: &str) -> bool {
        self.functions
            .iter()
            .any(|function| function.function_name == function_name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Fetches pages until the remote side stops returning a marker, so
/// existence is never decided on a truncated listing.
pub fn drain_function_pages<F>(mut fetch_page: F) -> Result<RemoteFunctionSet, RegistryError>
where
    F: FnMut(Option<&str>) -> Result<FunctionListPage, String>,
{
    let mut snapshot = RemoteFunctionSet::default();
    let mut seen_markers: Vec<String> = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page = fetch_page(marker.as_deref()).map_err(RegistryError::Request)?;
        debug!(
            functions = page.functions.len(),
            has_more = page.next_marker.is_some(),
            "fetched function list page"
        );
        snapshot.functions.extend(page.functions);

        match page.next_marker {
            Some(next) if !next.is_empty() => {
                if seen_markers.contains(&next) {
                    return Err(RegistryError::RepeatedMarker(next));
                }
                seen_markers.push(next.clone());
                marker = Some(next);
            }
            _ => return Ok(snapshot),
        }
    }
}
