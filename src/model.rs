//! The LSIF wire model: vertices and edges as specified in spec §6.
//!
//! Shape follows the two reference encodings found in the retrieval pack
//! (`helix-lsp-types::lsif` and `lsif-type::vertex`): an outer `{id, type,
//! ...}` envelope, `type` distinguishing vertex/edge, and a `label` picking
//! the variant within each. `Id` is a plain `u64` rather than LSP's
//! `NumberOrString` — spec §4.1 requires a strictly increasing integer
//! counter, never a string id.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::range::{Position as SpecPosition, Range as SpecRange};

pub type Id = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl From<SpecPosition> for Position {
    fn from(p: SpecPosition) -> Self {
        Position {
            line: p.line,
            character: p.character,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCoords {
    pub start: Position,
    pub end: Position,
}

impl From<SpecRange> for RangeCoords {
    fn from(r: SpecRange) -> Self {
        RangeCoords {
            start: r.start.into(),
            end: r.end.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Id,
    #[serde(flatten)]
    pub data: Element,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Element {
    #[serde(rename = "vertex")]
    Vertex(Vertex),
    #[serde(rename = "edge")]
    Edge(Edge),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Default for ToolInfo {
    fn default() -> Self {
        ToolInfo {
            name: "lsif-go".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "utf-16")]
    Utf16,
}

/// The closed family of elements this indexer emits (spec §6's mandatory
/// `label` set, trimmed to what §4 actually produces).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "label")]
pub enum Vertex {
    MetaData(MetaData),
    Project(Project),
    Document(Document),
    Range(#[serde(flatten)] RangeCoords),
    ResultSet(ResultSet),
    Moniker(Moniker),
    PackageInformation(PackageInformation),
    DefinitionResult,
    ReferenceResult,
    HoverResult { result: HoverContents },
    #[serde(rename = "$event")]
    Event(Event),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub version: String,
    pub project_root: Url,
    pub position_encoding: Encoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_info: Option<ToolInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub kind: String,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            kind: "go".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub uri: Url,
    pub language_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Default for ResultSet {
    fn default() -> Self {
        ResultSet { key: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MonikerKind {
    Import,
    Export,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moniker {
    pub kind: MonikerKind,
    pub scheme: String,
    pub identifier: String,
}

impl Moniker {
    pub fn gomod(kind: MonikerKind, identifier: String) -> Self {
        Moniker {
            kind,
            scheme: "gomod".to_string(),
            identifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInformation {
    pub name: String,
    pub manager: String,
    pub version: String,
}

impl PackageInformation {
    pub fn gomod(name: String, version: String) -> Self {
        PackageInformation {
            name,
            manager: "gomod".to_string(),
            version,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedString {
    pub language: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoverContents {
    Markup { kind: String, value: String },
}

impl HoverContents {
    pub fn plaintext(value: String) -> Self {
        HoverContents::Markup {
            kind: "markdown".to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Begin,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventScope {
    Document,
    Project,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub kind: EventKind,
    pub scope: EventScope,
    pub data: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    Definitions,
    References,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub out_v: Id,
    pub in_v: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDataMultiIn {
    pub out_v: Id,
    pub in_vs: Vec<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub document: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<ItemKind>,
    #[serde(flatten)]
    pub edge_data: EdgeDataMultiIn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "label")]
pub enum Edge {
    Contains(EdgeDataMultiIn),
    Next(EdgeData),
    Moniker(EdgeData),
    NextMoniker(EdgeData),
    PackageInformation(EdgeData),
    Item(Item),
    #[serde(rename = "textDocument/definition")]
    Definition(EdgeData),
    #[serde(rename = "textDocument/references")]
    References(EdgeData),
    #[serde(rename = "textDocument/hover")]
    Hover(EdgeData),
}

impl Edge {
    pub fn contains(out_v: Id, in_vs: Vec<Id>) -> Self {
        Edge::Contains(EdgeDataMultiIn { out_v, in_vs })
    }

    pub fn next(out_v: Id, in_v: Id) -> Self {
        Edge::Next(EdgeData { out_v, in_v })
    }

    pub fn moniker(out_v: Id, in_v: Id) -> Self {
        Edge::Moniker(EdgeData { out_v, in_v })
    }

    pub fn next_moniker(out_v: Id, in_v: Id) -> Self {
        Edge::NextMoniker(EdgeData { out_v, in_v })
    }

    pub fn package_information(out_v: Id, in_v: Id) -> Self {
        Edge::PackageInformation(EdgeData { out_v, in_v })
    }

    pub fn definition(out_v: Id, in_v: Id) -> Self {
        Edge::Definition(EdgeData { out_v, in_v })
    }

    pub fn references(out_v: Id, in_v: Id) -> Self {
        Edge::References(EdgeData { out_v, in_v })
    }

    pub fn hover(out_v: Id, in_v: Id) -> Self {
        Edge::Hover(EdgeData { out_v, in_v })
    }

    pub fn item_of_definitions(out_v: Id, in_vs: Vec<Id>, document: Id) -> Self {
        Edge::Item(Item {
            document,
            property: Some(ItemKind::Definitions),
            edge_data: EdgeDataMultiIn { out_v, in_vs },
        })
    }

    pub fn item_of_references(out_v: Id, in_vs: Vec<Id>, document: Id) -> Self {
        Edge::Item(Item {
            document,
            property: Some(ItemKind::References),
            edge_data: EdgeDataMultiIn { out_v, in_vs },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_serializes_with_flattened_coordinates() {
        let v = Vertex::Range(RangeCoords {
            start: Position { line: 0, character: 0 },
            end: Position { line: 0, character: 3 },
        });
        let entry = Entry {
            id: 1,
            data: Element::Vertex(v),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"label\":\"range\""));
        assert!(json.contains("\"start\""));
        assert!(json.contains("\"type\":\"vertex\""));
    }

    #[test]
    fn moniker_and_package_information_use_gomod_scheme() {
        let m = Moniker::gomod(MonikerKind::Export, "a:T".to_string());
        assert_eq!(m.scheme, "gomod");
        let p = PackageInformation::gomod("github.com/org/lib".to_string(), "v1.2.3".to_string());
        assert_eq!(p.manager, "gomod");
    }
}
