//! The "Loader" external collaborator (spec §6): loads and (conceptually)
//! type-checks a workspace, handing back packages with `Defs`/`Uses` maps.
//!
//! Performing real Go type-checking is an explicit Non-goal (spec §1); the
//! trait below is the seam a real type-checker would sit behind. The default
//! implementation, [`TreeSitterLoader`], approximates `Defs`/`Uses`
//! syntactically with `tree-sitter-go` so the rest of the pipeline
//! (§4.2–§4.5) is exercisable end to end without one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::Walk;
use smol_str::SmolStr;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{IndexError, Result};
use crate::range::ByteRange;

/// The closed family of identifier kinds the rest of the pipeline switches
/// on (spec's Design Notes: "type-switches over analyzer objects ... a
/// tagged variant; the match per pass is a total function").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Constant,
    Variable,
    NamedType,
    Label,
    PackageName,
    Field,
}

/// The key used to find (or create) a symbol's hub, per spec §3's
/// Definition record: position for most kinds, qualified name for
/// functions, the type's string form for named types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HubKey {
    Position(FileOffset),
    FunctionName(String),
    TypeString(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileOffset {
    pub file: Arc<PathBuf>,
    pub offset: usize,
}

/// One identifier occurrence that defines a symbol.
#[derive(Debug, Clone)]
pub struct Definition {
    pub kind: SymbolKind,
    pub name: SmolStr,
    /// The identifier used in export/import monikers. Equal to `name` for
    /// every kind except `Field`, where it is `<enclosing-type>.<field>`
    /// (spec §8 S1: the field `X` of `T` monikers as `T.X`, not bare `X`).
    pub qualified_name: SmolStr,
    pub file: Arc<PathBuf>,
    pub byte_range: ByteRange,
    pub hub_key: HubKey,
    pub exported: bool,
    pub quoted: bool,
    pub doc_comment: Option<String>,
    /// The import path this definition names, set only for `PackageName`
    /// definitions; consumed by the driver to resolve the import moniker.
    pub import_path: Option<String>,
}

/// One identifier occurrence that uses a symbol defined elsewhere (or
/// nowhere known to this workspace).
#[derive(Debug, Clone)]
pub struct Use {
    pub name: SmolStr,
    pub file: Arc<PathBuf>,
    pub byte_range: ByteRange,
    pub hub_key: HubKey,
    /// Import path of the package the symbol would belong to, if this use
    /// is a selector on a known import alias (e.g. `pkg.Symbol`). Used by
    /// pass 3 when no local definition record is found.
    pub external_package: Option<String>,
    pub quoted: bool,
}

/// One source file as handed back by the loader: its text (needed to turn
/// byte offsets into code points) and the definitions/uses found in it.
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub defs: Vec<Definition>,
    pub uses: Vec<Use>,
    /// Byte ranges of declarations with an attached doc comment, widest
    /// first, consumed by the Package Data Cache (spec §4.2).
    pub commented_spans: Vec<CommentedSpan>,
    /// Raw (position, enclosing-type chain, field name) facts for every
    /// struct/interface field, handed to the Package Data Cache so it can
    /// assemble and cache the qualified field moniker itself (spec §4.2).
    pub field_facts: Vec<FieldFact>,
}

#[derive(Debug, Clone)]
pub struct CommentedSpan {
    pub range: ByteRange,
    pub doc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FieldFact {
    pub offset: usize,
    /// Dot-joined chain of enclosing type/anonymous-field names, e.g. `T` or
    /// `T.Inner` for a field nested inside an anonymous composite.
    pub owner_chain: String,
    pub field_name: SmolStr,
}

pub struct Package {
    pub import_path: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

pub trait Loader: Send + Sync {
    /// Loads every Go package under `project_root`. A package that fails to
    /// parse is skipped with a warning (spec §7, package-local); this method
    /// only returns `Err` for the fatal condition of zero usable packages.
    fn load(&self, project_root: &Path) -> Result<Vec<Package>>;
}

/// Default [`Loader`]: walks `*.go` files with `ignore::Walk` (the same
/// crate the teacher uses for file traversal) and classifies identifiers
/// with `tree-sitter-go`.
pub struct TreeSitterLoader;

impl TreeSitterLoader {
    pub fn new() -> Self {
        Self
    }

    fn go_files(root: &Path) -> Vec<PathBuf> {
        Walk::new(root)
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e == "go")
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    fn parse(text: &str) -> Option<Tree> {
        let mut parser = Parser::new();
        parser.set_language(tree_sitter_go::language()).ok()?;
        parser.parse(text, None)
    }
}

impl Default for TreeSitterLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for TreeSitterLoader {
    fn load(&self, project_root: &Path) -> Result<Vec<Package>> {
        let files = Self::go_files(project_root);
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_dir: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        for f in files {
            let dir = f.parent().unwrap_or(project_root).to_path_buf();
            by_dir.entry(dir).or_default().push(f);
        }

        let mut packages = Vec::new();
        for (dir, mut paths) in by_dir {
            // Deterministic tie-break for "the" package declaration site
            // among multiple files (spec's Open Question): lexical filename
            // order.
            paths.sort();

            let import_path = dir
                .strip_prefix(project_root)
                .unwrap_or(&dir)
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");

            let mut files = Vec::new();
            for path in paths {
                let text = match std::fs::read_to_string(&path) {
                    Ok(t) => t,
                    Err(err) => {
                        tracing::warn!(?path, %err, "skipping unreadable file");
                        continue;
                    }
                };
                let tree = match Self::parse(&text) {
                    Some(t) => t,
                    None => {
                        tracing::warn!(?path, "skipping file: failed to parse");
                        continue;
                    }
                };
                let file_arc = Arc::new(path.clone());
                let analysis = analyze_file(file_arc.clone(), &text, &tree);
                files.push(SourceFile {
                    path,
                    text,
                    defs: analysis.defs,
                    uses: analysis.uses,
                    commented_spans: analysis.commented_spans,
                    field_facts: analysis.field_facts,
                });
            }

            if !files.is_empty() {
                packages.push(Package {
                    import_path,
                    dir,
                    files,
                });
            }
        }

        if packages.is_empty() {
            return Err(IndexError::NoPackages(project_root.to_path_buf()));
        }
        packages.sort_by(|a, b| a.import_path.cmp(&b.import_path));
        Ok(packages)
    }
}

struct FileAnalysis {
    defs: Vec<Definition>,
    uses: Vec<Use>,
    commented_spans: Vec<CommentedSpan>,
    field_facts: Vec<FieldFact>,
}

/// Local import alias -> import path, used to tag qualified uses with the
/// external package they would resolve to.
struct ImportAlias {
    local_name: SmolStr,
    import_path: String,
}

/// Exposes `analyze_file` to other modules' tests (the driver's pipeline
/// tests need real `Definition`/`Use` records without going through a full
/// `TreeSitterLoader::load` over a directory).
#[cfg(test)]
pub(crate) fn analyze_file_for_tests(
    file: Arc<PathBuf>,
    text: &str,
    tree: &Tree,
) -> (Vec<Definition>, Vec<Use>, Vec<CommentedSpan>, Vec<FieldFact>) {
    let analysis = analyze_file(file, text, tree);
    (analysis.defs, analysis.uses, analysis.commented_spans, analysis.field_facts)
}

fn analyze_file(file: Arc<PathBuf>, text: &str, tree: &Tree) -> FileAnalysis {
    let mut defs = Vec::new();
    let mut uses = Vec::new();
    let mut commented_spans = Vec::new();
    let mut field_facts = Vec::new();
    let mut aliases: Vec<ImportAlias> = Vec::new();

    let root = tree.root_node();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        walk_top_level(
            &file,
            text,
            child,
            &mut defs,
            &mut uses,
            &mut commented_spans,
            &mut field_facts,
            &mut aliases,
        );
    }

    collect_uses(&file, text, root, &defs, &aliases, &mut uses);

    FileAnalysis {
        defs,
        uses,
        commented_spans,
        field_facts,
    }
}

fn node_name(node: Node, text: &str) -> SmolStr {
    SmolStr::new(node.utf8_text(text.as_bytes()).unwrap_or(""))
}

fn byte_range(node: Node) -> ByteRange {
    ByteRange::new(node.start_byte(), node.end_byte())
}

fn is_exported(name: &str) -> bool {
    name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn leading_doc_comment(node: Node, text: &str) -> Option<String> {
    let mut sibling = node.prev_sibling()?;
    let mut lines = Vec::new();
    loop {
        if sibling.kind() == "comment" {
            lines.push(sibling.utf8_text(text.as_bytes()).unwrap_or("").to_string());
            match sibling.prev_sibling() {
                Some(s) => sibling = s,
                None => break,
            }
        } else {
            break;
        }
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_top_level(
    file: &Arc<PathBuf>,
    text: &str,
    node: Node,
    defs: &mut Vec<Definition>,
    _uses: &mut Vec<Use>,
    commented_spans: &mut Vec<CommentedSpan>,
    field_facts: &mut Vec<FieldFact>,
    aliases: &mut Vec<ImportAlias>,
) {
    match node.kind() {
        "import_declaration" => {
            walk_import_decl(file, text, node, defs, aliases);
        }
        "function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_name(name_node, text);
                let qualified = format!("{}.{}", package_name_of(file), name);
                let doc = leading_doc_comment(node, text);
                commented_spans.push(CommentedSpan {
                    range: byte_range(node),
                    doc: doc.clone(),
                });
                defs.push(Definition {
                    kind: SymbolKind::Function,
                    exported: is_exported(&name),
                    qualified_name: name.clone(),
                    name,
                    file: file.clone(),
                    byte_range: byte_range(name_node),
                    hub_key: HubKey::FunctionName(qualified),
                    quoted: false,
                    doc_comment: doc,
                    import_path: None,
                });
            }
            if let Some(params) = node.child_by_field_name("parameters") {
                collect_parameters(file, text, params, defs);
            }
            if let Some(body) = node.child_by_field_name("body") {
                collect_local_declarations(file, text, body, defs);
            }
        }
        "method_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_name(name_node, text);
                let receiver_type = node
                    .child_by_field_name("receiver")
                    .and_then(|r| receiver_type_name(r, text))
                    .unwrap_or_default();
                let qualified = format!("{}.({}).{}", package_name_of(file), receiver_type, name);
                let doc = leading_doc_comment(node, text);
                commented_spans.push(CommentedSpan {
                    range: byte_range(node),
                    doc: doc.clone(),
                });
                defs.push(Definition {
                    kind: SymbolKind::Function,
                    exported: is_exported(&name),
                    qualified_name: SmolStr::new(format!("{}.{}", receiver_type, name)),
                    name,
                    file: file.clone(),
                    byte_range: byte_range(name_node),
                    hub_key: HubKey::FunctionName(qualified),
                    quoted: false,
                    doc_comment: doc,
                    import_path: None,
                });
            }
            if let Some(receiver) = node.child_by_field_name("receiver") {
                collect_parameters(file, text, receiver, defs);
            }
            if let Some(params) = node.child_by_field_name("parameters") {
                collect_parameters(file, text, params, defs);
            }
            if let Some(body) = node.child_by_field_name("body") {
                collect_local_declarations(file, text, body, defs);
            }
        }
        "const_declaration" | "var_declaration" => {
            let kind = if node.kind() == "const_declaration" {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };
            let doc = leading_doc_comment(node, text);
            let mut spec_cursor = node.walk();
            for spec in node.children(&mut spec_cursor) {
                if spec.kind() != "const_spec" && spec.kind() != "var_spec" {
                    continue;
                }
                let mut name_cursor = spec.walk();
                for name_node in spec.children_by_field_name("name", &mut name_cursor) {
                    let name = node_name(name_node, text);
                    defs.push(Definition {
                        kind,
                        exported: is_exported(&name),
                        qualified_name: name.clone(),
                        name,
                        file: file.clone(),
                        byte_range: byte_range(name_node),
                        hub_key: HubKey::Position(FileOffset {
                            file: file.clone(),
                            offset: name_node.start_byte(),
                        }),
                        quoted: false,
                        doc_comment: doc.clone(),
                        import_path: None,
                    });
                }
            }
        }
        "type_declaration" => {
            let doc = leading_doc_comment(node, text);
            let mut spec_cursor = node.walk();
            for spec in node.children(&mut spec_cursor) {
                if spec.kind() != "type_spec" {
                    continue;
                }
                if let Some(name_node) = spec.child_by_field_name("name") {
                    let name = node_name(name_node, text);
                    let type_string = format!("{}.{}", package_name_of(file), name);
                    commented_spans.push(CommentedSpan {
                        range: byte_range(spec),
                        doc: doc.clone(),
                    });
                    defs.push(Definition {
                        kind: SymbolKind::NamedType,
                        exported: is_exported(&name),
                        qualified_name: name.clone(),
                        name: name.clone(),
                        file: file.clone(),
                        byte_range: byte_range(name_node),
                        hub_key: HubKey::TypeString(type_string),
                        quoted: false,
                        doc_comment: doc.clone(),
                        import_path: None,
                    });
                    if let Some(type_node) = spec.child_by_field_name("type") {
                        collect_struct_fields(
                            file,
                            text,
                            type_node,
                            &name,
                            defs,
                            commented_spans,
                            field_facts,
                        );
                    }
                }
            }
        }
        _ => {}
    }
}

fn receiver_type_name(receiver: Node, text: &str) -> Option<String> {
    let mut cursor = receiver.walk();
    for param in receiver.children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(t) = param.child_by_field_name("type") {
                let raw = t.utf8_text(text.as_bytes()).ok()?;
                return Some(raw.trim_start_matches('*').to_string());
            }
        }
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn collect_struct_fields(
    file: &Arc<PathBuf>,
    text: &str,
    type_node: Node,
    owner: &str,
    defs: &mut Vec<Definition>,
    commented_spans: &mut Vec<CommentedSpan>,
    field_facts: &mut Vec<FieldFact>,
) {
    if type_node.kind() != "struct_type" && type_node.kind() != "interface_type" {
        return;
    }
    let mut cursor = type_node.walk();
    for member_list in type_node.children(&mut cursor) {
        let mut member_cursor = member_list.walk();
        for member in member_list.children(&mut member_cursor) {
            let name_node = match member.kind() {
                "field_declaration" | "method_spec" => member.child_by_field_name("name"),
                _ => None,
            };
            if let Some(name_node) = name_node {
                let name = node_name(name_node, text);
                let doc = leading_doc_comment(member, text);
                commented_spans.push(CommentedSpan {
                    range: byte_range(member),
                    doc: doc.clone(),
                });
                defs.push(Definition {
                    kind: SymbolKind::Field,
                    exported: is_exported(&name),
                    qualified_name: SmolStr::new(format!("{}.{}", owner, name)),
                    name: name.clone(),
                    file: file.clone(),
                    byte_range: byte_range(name_node),
                    hub_key: HubKey::Position(FileOffset {
                        file: file.clone(),
                        offset: name_node.start_byte(),
                    }),
                    quoted: false,
                    doc_comment: doc,
                    import_path: None,
                });
                field_facts.push(FieldFact {
                    offset: name_node.start_byte(),
                    owner_chain: owner.to_string(),
                    field_name: name.clone(),
                });
                // Anonymous/embedded nested composites descend with the
                // chain extended by this member's own name, so a field
                // nested two levels deep monikers as `T.Inner.X`, not a
                // bare `T.X` that could collide with a real top-level `X`.
                if let Some(nested) = member.child_by_field_name("type") {
                    collect_struct_fields(
                        file,
                        text,
                        nested,
                        &format!("{}.{}", owner, name),
                        defs,
                        commented_spans,
                        field_facts,
                    );
                }
            } else if let Some(nested) = member.child_by_field_name("type") {
                collect_struct_fields(file, text, nested, owner, defs, commented_spans, field_facts);
            }
        }
    }
}

/// Registers function parameters and named receivers as `Variable`
/// definitions, keyed by position like any other local symbol, so
/// references to them inside the body resolve instead of permanently
/// falling to "unresolved use".
fn collect_parameters(file: &Arc<PathBuf>, text: &str, params: Node, defs: &mut Vec<Definition>) {
    let mut cursor = params.walk();
    for param in params.children(&mut cursor) {
        if param.kind() != "parameter_declaration" && param.kind() != "variadic_parameter_declaration" {
            continue;
        }
        let mut name_cursor = param.walk();
        for name_node in param.children_by_field_name("name", &mut name_cursor) {
            push_local_variable(file, text, name_node, defs);
        }
    }
}

/// Walks a function/method body recursively, registering every `:=` and
/// `var` declaration's identifiers as `Variable` definitions. Does not
/// descend into nested function literals' parameter lists twice — those
/// are reached as ordinary `func_literal` nodes in the same walk.
fn collect_local_declarations(file: &Arc<PathBuf>, text: &str, node: Node, defs: &mut Vec<Definition>) {
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        match n.kind() {
            "short_var_declaration" => {
                if let Some(left) = n.child_by_field_name("left") {
                    let mut cursor = left.walk();
                    for ident in left.children(&mut cursor) {
                        if ident.kind() == "identifier" {
                            push_local_variable(file, text, ident, defs);
                        }
                    }
                }
            }
            "var_spec" => {
                let mut cursor = n.walk();
                for name_node in n.children_by_field_name("name", &mut cursor) {
                    push_local_variable(file, text, name_node, defs);
                }
            }
            "func_literal" => {
                if let Some(params) = n.child_by_field_name("parameters") {
                    collect_parameters(file, text, params, defs);
                }
            }
            _ => {}
        }
        let mut cursor = n.walk();
        for child in n.children(&mut cursor) {
            stack.push(child);
        }
    }
}

fn push_local_variable(file: &Arc<PathBuf>, text: &str, name_node: Node, defs: &mut Vec<Definition>) {
    let name = node_name(name_node, text);
    if name == "_" {
        return;
    }
    defs.push(Definition {
        kind: SymbolKind::Variable,
        exported: false,
        qualified_name: name.clone(),
        name,
        file: file.clone(),
        byte_range: byte_range(name_node),
        hub_key: HubKey::Position(FileOffset {
            file: file.clone(),
            offset: name_node.start_byte(),
        }),
        quoted: false,
        doc_comment: None,
        import_path: None,
    });
}

fn walk_import_decl(
    file: &Arc<PathBuf>,
    text: &str,
    node: Node,
    defs: &mut Vec<Definition>,
    aliases: &mut Vec<ImportAlias>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let specs: Vec<Node> = if child.kind() == "import_spec_list" {
            let mut c = child.walk();
            child.children(&mut c).collect()
        } else if child.kind() == "import_spec" {
            vec![child]
        } else {
            continue;
        };
        for spec in specs {
            if spec.kind() != "import_spec" {
                continue;
            }
            let path_node = match spec.child_by_field_name("path") {
                Some(p) => p,
                None => continue,
            };
            let raw_path = path_node.utf8_text(text.as_bytes()).unwrap_or("\"\"");
            let import_path = raw_path.trim_matches('"').to_string();
            let local_name = spec
                .child_by_field_name("name")
                .map(|n| node_name(n, text))
                .unwrap_or_else(|| {
                    SmolStr::new(import_path.rsplit('/').next().unwrap_or(&import_path))
                });

            let hub_key = HubKey::Position(FileOffset {
                file: file.clone(),
                offset: path_node.start_byte(),
            });

            defs.push(Definition {
                kind: SymbolKind::PackageName,
                exported: false,
                qualified_name: local_name.clone(),
                name: local_name.clone(),
                file: file.clone(),
                byte_range: byte_range(path_node),
                hub_key,
                quoted: true,
                doc_comment: None,
                import_path: Some(import_path.clone()),
            });

            aliases.push(ImportAlias {
                local_name,
                import_path,
            });
        }
    }
}

/// Whether `node` is the callee of its enclosing `call_expression` —
/// `Foo` in `Foo()`, not in e.g. `x := Foo`.
fn is_call_target(node: Node) -> bool {
    node.parent()
        .and_then(|parent| {
            if parent.kind() != "call_expression" {
                return None;
            }
            parent.child_by_field_name("function")
        })
        .map(|callee| callee.start_byte() == node.start_byte() && callee.end_byte() == node.end_byte())
        .unwrap_or(false)
}

fn package_name_of(file: &Path) -> String {
    file.parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "main".to_string())
}

fn collect_uses(
    file: &Arc<PathBuf>,
    text: &str,
    root: Node,
    defs: &[Definition],
    aliases: &[ImportAlias],
    uses: &mut Vec<Use>,
) {
    let def_starts: std::collections::HashSet<usize> =
        defs.iter().map(|d| d.byte_range.start).collect();

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "selector_expression" {
            if let (Some(operand), Some(field)) = (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ) {
                if operand.kind() == "identifier" {
                    let operand_name = node_name(operand, text);
                    if let Some(alias) = aliases.iter().find(|a| a.local_name == operand_name) {
                        let field_name = node_name(field, text);
                        // Keyed by (import path, field), distinct from the
                        // import statement's own hub key, so this falls
                        // through to external-package resolution in pass 3
                        // instead of linking to the import declaration itself.
                        let hub_key = HubKey::FunctionName(format!(
                            "{}.{}",
                            alias.import_path, field_name
                        ));
                        uses.push(Use {
                            name: field_name,
                            file: file.clone(),
                            byte_range: byte_range(field),
                            hub_key,
                            external_package: Some(alias.import_path.clone()),
                            quoted: false,
                        });
                        continue;
                    }
                }
            }
        }

        if node.kind() == "identifier" || node.kind() == "type_identifier" {
            if !def_starts.contains(&node.start_byte()) {
                let name = node_name(node, text);
                // Same-package function calls and named-type references have
                // no operand to key off of, so match them against the
                // qualified-name schemes their definitions use instead of
                // falling back to a by-position key that could never match.
                let hub_key = if node.kind() == "type_identifier" {
                    HubKey::TypeString(format!("{}.{}", package_name_of(file), name))
                } else if is_call_target(node) {
                    HubKey::FunctionName(format!("{}.{}", package_name_of(file), name))
                } else {
                    HubKey::Position(FileOffset {
                        file: file.clone(),
                        offset: node.start_byte(),
                    })
                };
                uses.push(Use {
                    name: name.clone(),
                    file: file.clone(),
                    byte_range: byte_range(node),
                    hub_key,
                    external_package: None,
                    quoted: false,
                });
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_identifiers_are_detected() {
        assert!(is_exported("Foo"));
        assert!(!is_exported("foo"));
        assert!(!is_exported("_foo"));
    }

    #[test]
    fn struct_with_exported_field_produces_two_definitions() {
        let src = "package a\n\ntype T struct {\n\tX int\n}\n";
        let tree = TreeSitterLoader::parse(src).expect("parses");
        let file = Arc::new(PathBuf::from("a/a.go"));
        let analysis = analyze_file(file, src, &tree);
        let kinds: Vec<_> = analysis.defs.iter().map(|d| d.kind).collect();
        assert!(kinds.contains(&SymbolKind::NamedType));
        assert!(kinds.contains(&SymbolKind::Field));
        let t_def = analysis
            .defs
            .iter()
            .find(|d| d.kind == SymbolKind::NamedType)
            .unwrap();
        let x_def = analysis
            .defs
            .iter()
            .find(|d| d.kind == SymbolKind::Field)
            .unwrap();
        assert_ne!(t_def.hub_key, x_def.hub_key);
    }

    #[test]
    fn function_declaration_is_keyed_by_qualified_name() {
        let src = "package pkg\n\nfunc Foo() {}\n";
        let tree = TreeSitterLoader::parse(src).expect("parses");
        let file = Arc::new(PathBuf::from("pkg/d.go"));
        let analysis = analyze_file(file, src, &tree);
        let foo = analysis
            .defs
            .iter()
            .find(|d| d.kind == SymbolKind::Function)
            .unwrap();
        assert_eq!(foo.hub_key, HubKey::FunctionName("pkg.Foo".to_string()));
        assert!(foo.exported);
    }

    #[test]
    fn import_spec_is_marked_quoted_with_full_literal_span() {
        let src = "package a\n\nimport \"fmt\"\n";
        let tree = TreeSitterLoader::parse(src).expect("parses");
        let file = Arc::new(PathBuf::from("a/a.go"));
        let analysis = analyze_file(file, src, &tree);
        let import_def = analysis
            .defs
            .iter()
            .find(|d| d.kind == SymbolKind::PackageName)
            .unwrap();
        assert!(import_def.quoted);
        let quoted_text = &src[import_def.byte_range.start..import_def.byte_range.end];
        assert_eq!(quoted_text, "\"fmt\"");
    }
}
