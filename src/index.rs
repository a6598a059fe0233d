// Streaming scans over the repository's XML indexes
//
// The master index, group indexes and POMs are all shallow, so a single
// forward pass over pull events is enough: no tree is built.

use std::collections::HashSet;

use xml::reader::{EventReader, XmlEvent};

use crate::error::{Error, Result};
use crate::model::{ArtifactId, Coordinate, FileTypeTag, NamespaceId, ResolvedArtifact, VersionTag};

const MASTER_INDEX: &str = "master index";
const GROUP_INDEX: &str = "group index";
const POM: &str = "POM";

/// Parse the master index: every direct child of the root names a namespace.
pub fn parse_namespace_index(xml: &str) -> Result<Vec<NamespaceId>> {
    let mut namespaces = Vec::new();
    let mut depth = 0usize;

    for event in EventReader::from_str(xml) {
        match event.map_err(|e| Error::malformed(MASTER_INDEX, e.to_string()))? {
            XmlEvent::StartElement { name, .. } => {
                depth += 1;
                if depth == 2 {
                    namespaces.push(NamespaceId::new(name.local_name));
                }
            }
            XmlEvent::EndElement { .. } => depth = depth.saturating_sub(1),
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    Ok(namespaces)
}

/// Parse a namespace's group index into one artifact per listed version.
///
/// The root element carries the namespace name; each child is an artifact
/// whose `versions` attribute holds a comma-separated version list.
pub fn parse_coordinate_index(namespace: &NamespaceId, xml: &str) -> Result<Vec<ResolvedArtifact>> {
    let document = format!("{} for {}", GROUP_INDEX, namespace);
    let mut artifacts = Vec::new();
    let mut seen = HashSet::new();
    let mut depth = 0usize;

    for event in EventReader::from_str(xml) {
        match event.map_err(|e| Error::malformed(&document, e.to_string()))? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                depth += 1;
                if depth == 1 {
                    if name.local_name != namespace.as_str() {
                        return Err(Error::malformed(
                            &document,
                            format!("root element is <{}>", name.local_name),
                        ));
                    }
                    continue;
                }
                if depth != 2 || name.local_name == namespace.as_str() {
                    continue;
                }

                let versions = attributes
                    .iter()
                    .find(|attr| attr.name.local_name == "versions")
                    .ok_or_else(|| {
                        Error::malformed(
                            &document,
                            format!("<{}> has no versions attribute", name.local_name),
                        )
                    })?;

                let coordinate =
                    Coordinate::new(namespace.clone(), ArtifactId::new(name.local_name.as_str()));
                for version in versions.value.split(',').map(str::trim) {
                    if version.is_empty() {
                        continue;
                    }
                    // Repeated versions would download into the same directory twice.
                    let artifact = coordinate.at(VersionTag::new(version));
                    if seen.insert(artifact.clone()) {
                        artifacts.push(artifact);
                    }
                }
            }
            XmlEvent::EndElement { .. } => depth = depth.saturating_sub(1),
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    Ok(artifacts)
}

/// Read `<packaging>` from a POM, falling back to `jar` when it is absent.
pub fn parse_file_type(xml: &str) -> Result<FileTypeTag> {
    let mut depth = 0usize;
    let mut capturing = false;
    let mut text = String::new();

    for event in EventReader::from_str(xml) {
        match event.map_err(|e| Error::malformed(POM, e.to_string()))? {
            XmlEvent::StartElement { name, .. } => {
                depth += 1;
                capturing = depth == 2 && name.local_name == "packaging";
            }
            XmlEvent::Characters(chunk) | XmlEvent::CData(chunk) if capturing => {
                text.push_str(&chunk);
            }
            XmlEvent::EndElement { .. } => {
                if capturing {
                    let packaging = text.trim();
                    if !packaging.is_empty() {
                        return Ok(FileTypeTag::new(packaging));
                    }
                    capturing = false;
                }
                depth = depth.saturating_sub(1);
            }
            XmlEvent::EndDocument => break,
            _ => {}
        }
    }

    Ok(FileTypeTag::default())
}
