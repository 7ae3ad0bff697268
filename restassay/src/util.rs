use crate::{data::Headers, error::Error};
use hyper::{
    header::{HeaderName, HeaderValue},
    HeaderMap,
};

pub fn extract_headers(header_map: &HeaderMap) -> Headers {
    // it currently ignores header values with opaque characters
    header_map
        .iter()
        .map(|(k, v)| (k.as_str(), v.to_str()))
        .filter_map(|(key, value)| value.ok().map(|v| (key, String::from(v))))
        .collect()
}

pub fn put_headers(header_map: &mut HeaderMap<HeaderValue>, headers: &Headers) -> Result<(), Error> {
    for (key, value) in headers.iter() {
        let header_name = HeaderName::from_lowercase(key.as_bytes())?;
        let header_value = HeaderValue::from_str(value)?;
        header_map.insert(header_name, header_value);
    }

    Ok(())
}
