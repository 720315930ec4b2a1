//! Field conversions for records written by old app versions.

use crate::types::{TaskAttachment, UserActivity};
use serde_json::Value;

/// Build a `file://` URI from a filesystem path, percent-encoding each segment.
pub fn file_uri(path: &str) -> String {
    let encoded: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("file:///{}", encoded.join("/"))
}

/// Resolve an old picture value to a URI.
///
/// Old comments stored the picture as a JSON object holding either a `uri`
/// or a filesystem `path`. Anything else resolves to no picture.
pub fn legacy_picture_uri(value: Option<&str>) -> Option<String> {
    let value = value.filter(|v| !v.is_empty())?;
    if !value.contains("uri") && !value.contains("path") {
        return None;
    }
    let json: Value = serde_json::from_str(value).ok()?;
    if let Some(uri) = json.get("uri").and_then(Value::as_str) {
        return Some(uri.to_string());
    }
    json.get("path").and_then(Value::as_str).map(file_uri)
}

impl UserActivity {
    /// Rewrite an old JSON picture reference as a URI.
    pub fn convert_picture_uri(&mut self) {
        self.picture = legacy_picture_uri(self.picture.as_deref());
    }
}

impl TaskAttachment {
    /// Move an old filesystem path into `uri`. An existing `uri` wins.
    pub fn convert_path_uri(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        if self.uri.as_deref().is_none_or(str::is_empty) && !path.is_empty() {
            self.uri = Some(file_uri(&path));
        }
    }
}
