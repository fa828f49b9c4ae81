//! GetMap and GetCapabilities KVP URL helpers.
//!
//! KVP parameter names are case-insensitive in WMS, values are not. These
//! helpers never reorder the parameters they did not touch.

use url::Url;

/// Identity of a GetMap endpoint for batching purposes.
///
/// Two requests with equal keys can be answered by one GetMap call with
/// their LAYERS lists concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GetMapKey {
    pub origin: String,
    pub path: String,
    pub service: String,
    pub version: String,
}

impl GetMapKey {
    pub fn from_url(url: &Url) -> Self {
        Self {
            origin: url.origin().ascii_serialization(),
            path: url.path().to_string(),
            service: get_param(url, "SERVICE")
                .unwrap_or_default()
                .to_uppercase(),
            version: get_param(url, "VERSION").unwrap_or_default(),
        }
    }
}

/// Look up a query parameter by case-insensitive name.
pub fn get_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.into_owned())
}

/// Set a query parameter, replacing any existing spelling of the same name
/// in place or appending it.
pub fn set_param(url: &mut Url, name: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut replaced = false;
    pairs.retain_mut(|(k, v)| {
        if !k.eq_ignore_ascii_case(name) {
            return true;
        }
        if replaced {
            return false;
        }
        *k = name.to_string();
        *v = value.to_string();
        replaced = true;
        true
    });
    if !replaced {
        pairs.push((name.to_string(), value.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
}

/// GetMap request URL for one layer on the given endpoint.
///
/// `base` may already carry vendor parameters (`?map=foo&`), they are kept.
pub fn get_map_url(
    base: &str,
    version: &str,
    layer: &str,
    style: Option<&str>,
    format: &str,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    set_param(&mut url, "SERVICE", crate::SERVICE_WMS);
    set_param(&mut url, "VERSION", version);
    set_param(&mut url, "REQUEST", "GetMap");
    set_param(&mut url, "LAYERS", layer);
    set_param(&mut url, "STYLES", style.unwrap_or(""));
    set_param(&mut url, "FORMAT", format);
    set_param(&mut url, "TRANSPARENT", "TRUE");
    Ok(url)
}

/// GetCapabilities request URL for the given endpoint.
pub fn get_capabilities_url(base: &str, version: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    set_param(&mut url, "SERVICE", crate::SERVICE_WMS);
    set_param(&mut url, "VERSION", version);
    set_param(&mut url, "REQUEST", "GetCapabilities");
    Ok(url)
}

/// Append the LAYERS and STYLES of `other` to those of `url`.
///
/// STYLES stays positionally aligned with LAYERS; a request without STYLES
/// contributes empty entries.
pub fn merge_layer_params(url: &mut Url, other: &Url) {
    let layers = split_list(get_param(url, "LAYERS"));
    let styles = split_list(get_param(url, "STYLES"));
    let other_layers = split_list(get_param(other, "LAYERS"));
    let other_styles = split_list(get_param(other, "STYLES"));

    let mut merged_layers = layers.clone();
    merged_layers.extend(other_layers.iter().cloned());

    let mut merged_styles = pad(styles, layers.len());
    merged_styles.extend(pad(other_styles, other_layers.len()));

    set_param(url, "LAYERS", &merged_layers.join(","));
    set_param(url, "STYLES", &merged_styles.join(","));
}

fn split_list(value: Option<String>) -> Vec<String> {
    match value {
        Some(v) if !v.is_empty() => v.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn pad(mut values: Vec<String>, len: usize) -> Vec<String> {
    values.resize(len, String::new());
    values
}
