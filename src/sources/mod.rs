// src/sources/mod.rs

pub mod price_csv;
pub mod sheet_csv;

use std::borrow::Cow;

/// Delimiters the statistical offices alternate between, in sniffing order.
pub(crate) const SEPARATOR_CANDIDATES: &[u8] = &[b';', b',', b'\t'];

/// Decode raw payload bytes. INDEC serves a mix of UTF-8 and Latin-1 files;
/// anything that is not valid UTF-8 is decoded as Windows-1252.
pub fn decode_bytes(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            Cow::Owned(text.into_owned())
        }
    }
}
