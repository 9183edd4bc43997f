use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
///
/// Errors come back as `(path, message)`; syntax errors report the root path.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, (String, String)> {
    let de = &mut serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, T>(&mut *de).map_err(split)?;
    de.end().map_err(|err| (".".to_string(), err.to_string()))?;
    Ok(value)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, (String, String)> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize::<_, T>(&mut *de).map_err(split)?;
    de.end().map_err(|err| (".".to_string(), err.to_string()))?;
    Ok(value)
}

fn split(err: serde_path_to_error::Error<serde_json::Error>) -> (String, String) {
    let path = err.path().to_string();
    (path, err.into_inner().to_string())
}
