//! The framed-datagram wrapper used over transports (long-poll) that cannot
//! preserve message boundaries.
//!
//! One envelope is a concatenation of `U+FFFD <decimal length> U+FFFD
//! <payload>`, repeated for each message in the batch. **Length is measured
//! in Unicode scalar values (`char` count), not UTF-8 bytes** — this is an
//! explicit, documented choice carried over from the original protocol
//! description to keep this client byte-for-byte compatible with servers
//! that frame the same way; an implementation that switched to byte length
//! would desynchronize against any such server as soon as a payload
//! contained a multi-byte character.
//!
//! A leading `U+FFFD` is the sentinel that triggers wrapper parsing at all:
//! a payload that doesn't start with it is a single, unwrapped message and is
//! returned as-is.

use crate::error::DecodeError;

const SENTINEL: char = '\u{FFFD}';

/// Wrap a batch of already-encoded frames for transmission over a
/// boundary-losing transport.
pub fn wrap<'a, I: IntoIterator<Item = &'a str>>(payloads: I) -> String {
    let mut out = String::new();
    for payload in payloads {
        out.push(SENTINEL);
        out.push_str(&payload.chars().count().to_string());
        out.push(SENTINEL);
        out.push_str(payload);
    }
    out
}

/// Unwrap a framed-datagram envelope into its constituent payloads.
///
/// If `text` doesn't start with the sentinel, it is treated as a single
/// unwrapped message and returned verbatim as the only element.
pub fn unwrap(text: &str) -> Result<Vec<String>, DecodeError> {
    if text.is_empty() {
        // The only producer of an empty string is `wrap` applied to zero
        // payloads — an actual single empty-string message never reaches
        // this function unwrapped (callers skip empty transport reads
        // before calling in; see `transports::xhr::poll_loop`).
        return Ok(Vec::new());
    }
    if !text.starts_with(SENTINEL) {
        return Ok(vec![text.to_string()]);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != SENTINEL {
            return Err(DecodeError::TruncatedWrapper);
        }
        i += 1;

        let len_start = i;
        while i < chars.len() && chars[i] != SENTINEL {
            i += 1;
        }
        if i >= chars.len() {
            return Err(DecodeError::TruncatedWrapper);
        }
        let len_str: String = chars[len_start..i].iter().collect();
        let declared: usize = len_str
            .parse()
            .map_err(|_| DecodeError::InvalidLength(len_str.clone()))?;
        i += 1; // skip the closing sentinel of the length field

        let payload_start = i;
        let payload_end = payload_start + declared;
        if payload_end > chars.len() {
            return Err(DecodeError::LengthMismatch {
                declared,
                found: chars.len() - payload_start,
            });
        }
        let payload: String = chars[payload_start..payload_end].iter().collect();
        out.push(payload);
        i = payload_end;
    }

    Ok(out)
}
