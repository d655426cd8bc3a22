// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest document encoding and strict decoding.
//!
//! The served document is a JSON array of descriptors, pretty-printed with
//! four-space indentation, non-ASCII left unescaped, followed by a newline.

use pluginmaster_core::PluginmasterError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use sha2::{Digest, Sha256};

use crate::descriptor::PluginDescriptor;
use crate::validation::validate_descriptor;

/// Render descriptors to the canonical document bytes.
///
/// Callers pass descriptors in their served order; rendering never reorders.
pub fn render_document(descriptors: &[PluginDescriptor]) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::with_capacity(256 * descriptors.len().max(1));
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    descriptors.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

/// Strong ETag for a rendered document.
pub fn document_etag(bytes: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(bytes)))
}

/// Decode a manifest document and validate every entry.
///
/// Unknown fields, wrong types and invalid descriptors are all errors: the
/// document is either trusted as a whole or rejected.
pub fn parse_document(bytes: &[u8]) -> Result<Vec<PluginDescriptor>, PluginmasterError> {
    let descriptors: Vec<PluginDescriptor> = serde_json::from_slice(bytes)?;
    for (index, descriptor) in descriptors.iter().enumerate() {
        if let Err(e) = validate_descriptor(descriptor) {
            tracing::warn!(index, name = %descriptor.name, error = %e, "invalid descriptor in manifest document");
            return Err(e.into());
        }
    }
    Ok(descriptors)
}
