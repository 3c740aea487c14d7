//! Edit links that reopen the add form with a snippet already filled in.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::location::Location;

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const CODE_PARAM: &str = "code";
const FILENAME_PARAM: &str = "filename";

/// Form contents decoded from `#/add?code=...&filename=...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddPrefill {
    pub code: String,
    pub filename: String,
}

/// Build `#/add?code=<code>&filename=<filename>`.
pub fn edit_link(code: &str, filename: &str) -> String {
    format!(
        "#/add?{CODE_PARAM}={}&{FILENAME_PARAM}={}",
        utf8_percent_encode(code, URI_COMPONENT),
        utf8_percent_encode(filename, URI_COMPONENT)
    )
}

/// Prefill carried by a location, if it has a code or a filename.
pub fn decode_prefill(location: &Location<'_>) -> Option<AddPrefill> {
    let decode = |key: &str| {
        location
            .param(key)
            .map(|value| percent_decode_str(value).decode_utf8_lossy().into_owned())
    };
    let code = decode(CODE_PARAM);
    let filename = decode(FILENAME_PARAM);
    if code.is_none() && filename.is_none() {
        return None;
    }
    Some(AddPrefill {
        code: code.unwrap_or_default(),
        filename: filename.unwrap_or_default(),
    })
}
