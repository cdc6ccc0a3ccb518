use serde::de::DeserializeOwned;
use serde_json::Value;

/// A payload decode failure together with where in the payload it happened.
#[derive(Debug)]
pub struct PathError {
    pub path: String,
    pub source: serde_json::Error,
}

/// Deserialize with JSON-path context kept alongside the error.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, PathError> {
    match serde_path_to_error::deserialize::<_, T>(value) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(PathError { path, source: err.into_inner() })
        }
    }
}
