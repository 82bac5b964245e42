use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::Path;

/// Text decoded from an export file, with the decoder that produced it.
#[derive(Debug)]
pub struct DecodedHtml {
    pub text: String,
    pub encoding: &'static str,
    /// True when invalid UTF-8 sequences were dropped from a mostly UTF-8 input.
    pub lossy: bool,
}

/// Read an export file and decode it to text.
///
/// Only I/O errors are fatal. Undecodable bytes never are: see [`decode_html`].
pub fn read_html(path: &Path, preferred: Option<&'static Encoding>) -> Result<DecodedHtml> {
    let bytes = fs::read(path).wrap_err_with(|| format!("Failed to read: {}", path.display()))?;
    Ok(decode_html(&bytes, preferred))
}

/// Resolve a WHATWG encoding label such as `"latin1"` or `"shift_jis"`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| eyre!("Unknown encoding label: {:?}", label))
}

/// Decode raw bytes by walking the encoding chain.
///
/// Order: the caller's preferred encoding, a byte-order mark, strict UTF-8,
/// then one of two fallbacks. Input that is mostly UTF-8 (at least as many
/// well-formed multi-byte characters as invalid sequences) keeps its UTF-8
/// text and loses only the invalid bytes. Anything else is read as
/// Windows-1252, which is what `latin1`, `iso-8859-1` and `cp1252` all
/// resolve to and which maps every byte.
pub fn decode_html(bytes: &[u8], preferred: Option<&'static Encoding>) -> DecodedHtml {
    if let Some(encoding) = preferred
        && let Some(text) = decode_strict(encoding, bytes)
    {
        return DecodedHtml {
            text,
            encoding: encoding.name(),
            lossy: false,
        };
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes)
        && let Some(text) = decode_strict(encoding, &bytes[bom_len..])
    {
        return DecodedHtml {
            text,
            encoding: encoding.name(),
            lossy: false,
        };
    }

    let scan = scan_utf8(bytes);
    if scan.invalid == 0 || scan.multibyte >= scan.invalid {
        return DecodedHtml {
            text: scan.text,
            encoding: UTF_8.name(),
            lossy: scan.invalid > 0,
        };
    }

    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    DecodedHtml {
        text: text.into_owned(),
        encoding: WINDOWS_1252.name(),
        lossy: false,
    }
}

struct Utf8Scan {
    /// The input with invalid sequences dropped.
    text: String,
    multibyte: usize,
    invalid: usize,
}

fn scan_utf8(bytes: &[u8]) -> Utf8Scan {
    let mut scan = Utf8Scan {
        text: String::with_capacity(bytes.len()),
        multibyte: 0,
        invalid: 0,
    };
    for chunk in bytes.utf8_chunks() {
        let valid = chunk.valid();
        scan.text.push_str(valid);
        scan.multibyte += valid.chars().filter(|c| !c.is_ascii()).count();
        if !chunk.invalid().is_empty() {
            scan.invalid += 1;
        }
    }
    scan
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}
