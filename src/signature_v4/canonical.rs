//! canonicalization primitives

use crate::data_structures::OrderedHeaders;
use crate::utils::{crypto, Also};

use smallvec::SmallVec;

/// A signed header is absent from the request
#[derive(Debug, thiserror::Error)]
#[error("signed header `{name}` is missing")]
pub struct MissingSignedHeader {
    /// the lowercase header name
    pub name: String,
}

/// custom uri encode
fn uri_encode(output: &mut String, input: &[u8], encode_slash: bool) {
    /// hex uppercase table
    const HEX_UPPERCASE_TABLE: [u8; 16] = *b"0123456789ABCDEF";

    output.reserve(input.len());

    for &byte in input {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'~' | b'.' => {
                output.push(char::from(byte));
            }
            b'/' if !encode_slash => output.push('/'),
            _ => {
                macro_rules! to_hex {
                    ($n:expr) => {{
                        #[allow(clippy::indexing_slicing)]
                        char::from(HEX_UPPERCASE_TABLE[usize::from($n)]) // a 4-bits number is always less then 16
                    }};
                }

                output.push('%');
                output.push(to_hex!(byte.wrapping_shr(4)));
                output.push(to_hex!(byte & 15));
            }
        }
    }
}

/// Percent-encodes a path. Unreserved characters and `/` are kept.
#[must_use]
pub fn percent_encode_path(path: &str) -> String {
    String::new().also(|s| uri_encode(s, path.as_bytes(), false))
}

/// Percent-encodes a query key or value. `/` is encoded, `~` is not.
#[must_use]
pub fn percent_encode_query_component(value: &str) -> String {
    String::new().also(|s| uri_encode(s, value.as_bytes(), true))
}

/// Decodes `%XX` sequences once. Malformed sequences are kept verbatim.
#[must_use]
pub fn percent_decode(input: &str) -> Vec<u8> {
    /// hex digit value
    const fn hex_val(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b == b'%' {
            let hi = bytes.get(i.wrapping_add(1)).copied().and_then(hex_val);
            let lo = bytes.get(i.wrapping_add(2)).copied().and_then(hex_val);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                output.push(hi.wrapping_shl(4) | lo);
                i = i.wrapping_add(3);
                continue;
            }
        }
        output.push(b);
        i = i.wrapping_add(1);
    }
    output
}

/// `<CanonicalURI>`: the raw path decoded once and re-encoded. An empty path is `/`.
#[must_use]
pub fn canonical_uri(raw_path: &str) -> String {
    if raw_path.is_empty() {
        return "/".to_owned();
    }
    let decoded = percent_decode(raw_path);
    String::with_capacity(raw_path.len()).also(|s| uri_encode(s, &decoded, false))
}

/// Splits a raw query into byte pairs, each part decoded once
///
/// `+` is a space. Empty segments are skipped and a segment without `=`
/// has an empty value. Bytes are kept as they are, valid UTF-8 or not.
#[must_use]
pub fn decode_query(raw_query: &str) -> Vec<(Vec<u8>, Vec<u8>)> {
    let decode = |part: &str| {
        if part.contains('+') {
            percent_decode(&part.replace('+', " "))
        } else {
            percent_decode(part)
        }
    };

    raw_query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((name, value)) => (decode(name), decode(value)),
            None => (decode(segment), Vec::new()),
        })
        .collect()
}

/// `<CanonicalQueryString>`
///
/// Keys and values are encoded, then sorted by encoded key and encoded value.
#[must_use]
pub fn canonical_query_string<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let encoded: SmallVec<[(String, String); 16]> = pairs
        .into_iter()
        .map(|(n, v)| {
            (
                String::new().also(|s| uri_encode(s, n.as_ref(), true)),
                String::new().also(|s| uri_encode(s, v.as_ref(), true)),
            )
        })
        .collect::<SmallVec<[(String, String); 16]>>()
        .also(|qs| qs.sort());

    let mut ans = String::with_capacity(encoded.len().saturating_mul(16));
    for (i, (name, value)) in encoded.iter().enumerate() {
        if i != 0 {
            ans.push('&');
        }
        ans.push_str(name);
        ans.push('=');
        ans.push_str(value);
    }
    ans
}

/// trims a header value and collapses inner whitespace runs
fn push_trimmed(output: &mut String, value: &str) {
    let mut first = true;
    for word in value.split_ascii_whitespace() {
        if !first {
            output.push(' ');
        }
        first = false;
        output.push_str(word);
    }
}

/// `<CanonicalHeaders>` in the order of `signed_names`
///
/// `signed_names` must be lowercase. Repeated headers are joined by `,`.
///
/// # Errors
/// Returns an error naming the first signed header the request lacks
pub fn canonical_headers(
    headers: &OrderedHeaders<'_>,
    signed_names: &[impl AsRef<str>],
) -> Result<String, MissingSignedHeader> {
    let mut ans = String::with_capacity(256);
    for name in signed_names {
        let name = name.as_ref();
        let values = headers.get_all(name);
        if values.is_empty() {
            return Err(MissingSignedHeader {
                name: name.to_owned(),
            });
        }
        ans.push_str(name);
        ans.push(':');
        for (i, value) in values.iter().enumerate() {
            if i != 0 {
                ans.push(',');
            }
            push_trimmed(&mut ans, value);
        }
        ans.push('\n');
    }
    Ok(ans)
}

/// lowercase hex sha256
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    crypto::hex_sha256(data)
}
