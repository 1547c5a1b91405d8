use crate::error::{IntegrationError, Result};
use crate::integration::{LanguageIntegration, ScoreComponent};
use crate::metadata::{AccessDescriptor, FileMetadata, StructureInfo};
use crate::runtime::{probe_node_exports, ProbeLimits, RuntimeExport};
use async_trait::async_trait;
use sigscout_signature::{Signature, TargetKind};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// JavaScript/TypeScript integration backed by tree-sitter.
///
/// Extracts top-level classes, functions, interfaces, enums and constant
/// declarations, and tracks how each one leaves the module (ESM named or
/// default exports, CommonJS `module.exports` assignments).
#[derive(Debug, Default)]
pub struct JsIntegration;

/// Deferred export marker: `export default Foo`, `export { Foo }` and
/// CommonJS assignments can appear before or after the declaration they
/// export, so they are applied in a second pass.
struct ExportMark {
    name: String,
    access: AccessDescriptor,
}

impl JsIntegration {
    pub fn new() -> Self {
        Self
    }

    fn grammar_for(extension: &str) -> Result<tree_sitter::Language> {
        match extension {
            "js" | "mjs" | "cjs" | "jsx" => Ok(tree_sitter_javascript::LANGUAGE.into()),
            "ts" => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            "tsx" => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
            other => Err(IntegrationError::Grammar(format!(
                "no grammar for extension '{other}'"
            ))),
        }
    }

    /// Parse file content that is already in memory
    pub fn parse_source(&self, path: &Path, content: &str) -> Result<Option<FileMetadata>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let language = Self::grammar_for(&extension)?;

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| IntegrationError::Grammar(e.to_string()))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| IntegrationError::parse(path.display().to_string(), "parser bailed"))?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module")
            .to_string();

        let mut structures = Vec::new();
        let mut marks = Vec::new();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.visit_top_level(content, &stem, child, &mut structures, &mut marks);
        }

        for mark in marks {
            if let Some(structure) = structures
                .iter_mut()
                .find(|s| s.name.eq_ignore_ascii_case(&mark.name))
            {
                structure.exported = true;
                structure.access = mark.access;
            }
        }

        if structures.is_empty() {
            return Ok(None);
        }
        Ok(Some(FileMetadata {
            path: path.to_path_buf(),
            language: self.language_id().to_string(),
            structures,
        }))
    }

    fn visit_top_level(
        &self,
        content: &str,
        stem: &str,
        node: Node,
        structures: &mut Vec<StructureInfo>,
        marks: &mut Vec<ExportMark>,
    ) {
        match node.kind() {
            "export_statement" => self.visit_export(content, stem, node, structures, marks),
            "expression_statement" => {
                self.visit_commonjs_export(content, stem, node, structures, marks);
            }
            _ => {
                structures.extend(self.extract_declarations(content, stem, node));
            }
        }
    }

    fn visit_export(
        &self,
        content: &str,
        stem: &str,
        node: Node,
        structures: &mut Vec<StructureInfo>,
        marks: &mut Vec<ExportMark>,
    ) {
        let is_default = {
            let mut cursor = node.walk();
            let has_default = node.children(&mut cursor).any(|c| c.kind() == "default");
            has_default
        };

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "export_clause" => {
                    // export { A, B as C }
                    let mut clause_cursor = child.walk();
                    for spec in child.children(&mut clause_cursor) {
                        if spec.kind() != "export_specifier" {
                            continue;
                        }
                        if let Some(name) = spec
                            .child_by_field_name("name")
                            .map(|n| node_text(content, n).to_string())
                        {
                            let alias = spec
                                .child_by_field_name("alias")
                                .map(|n| node_text(content, n).to_string())
                                .unwrap_or_else(|| name.clone());
                            // `export { Foo as default }` is a default
                            // export; the runtime reports it as one.
                            let access = if alias == "default" {
                                AccessDescriptor::Default
                            } else {
                                AccessDescriptor::named(alias)
                            };
                            marks.push(ExportMark { name, access });
                        }
                    }
                }
                "identifier" => {
                    // export default Foo
                    if is_default {
                        marks.push(ExportMark {
                            name: node_text(content, child).to_string(),
                            access: AccessDescriptor::Default,
                        });
                    }
                }
                _ => {
                    let mut declared = self.extract_declarations(content, stem, child);
                    if declared.is_empty() && is_default {
                        // export default <anonymous expression>
                        if let Some(structure) =
                            self.extract_anonymous(content, stem, child)
                        {
                            declared.push(structure);
                        }
                    }
                    for mut structure in declared {
                        structure.exported = true;
                        structure.access = if is_default {
                            AccessDescriptor::Default
                        } else {
                            AccessDescriptor::named(structure.name.clone())
                        };
                        structures.push(structure);
                    }
                }
            }
        }
    }

    /// `module.exports = X`, `module.exports.Y = X`, `exports.Y = X`
    fn visit_commonjs_export(
        &self,
        content: &str,
        stem: &str,
        node: Node,
        structures: &mut Vec<StructureInfo>,
        marks: &mut Vec<ExportMark>,
    ) {
        let Some(assignment) = first_child_of_kind(node, "assignment_expression") else {
            return;
        };
        let Some(left) = assignment.child_by_field_name("left") else {
            return;
        };
        let Some(right) = assignment.child_by_field_name("right") else {
            return;
        };

        let left_text = node_text(content, left);
        let access = if left_text == "module.exports" {
            AccessDescriptor::Direct
        } else if let Some(prop) = left_text
            .strip_prefix("module.exports.")
            .or_else(|| left_text.strip_prefix("exports."))
        {
            AccessDescriptor::named(prop)
        } else {
            return;
        };

        match right.kind() {
            "identifier" => marks.push(ExportMark {
                name: node_text(content, right).to_string(),
                access,
            }),
            _ => {
                if let Some(mut structure) = self.extract_anonymous(content, stem, right) {
                    if let AccessDescriptor::Named { name } = &access {
                        structure.name = name.clone();
                    }
                    structure.exported = true;
                    structure.access = access;
                    structures.push(structure);
                }
            }
        }
    }

    /// Structures declared by one top-level node
    fn extract_declarations(&self, content: &str, stem: &str, node: Node) -> Vec<StructureInfo> {
        match node.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                self.extract_class(content, node).into_iter().collect()
            }
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                self.extract_function(content, node).into_iter().collect()
            }
            "interface_declaration" => self.extract_interface(content, node).into_iter().collect(),
            "enum_declaration" => self.extract_enum(content, node).into_iter().collect(),
            "internal_module" | "module" => {
                self.extract_namespace(content, node).into_iter().collect()
            }
            "lexical_declaration" | "variable_declaration" => {
                self.extract_variables(content, stem, node)
            }
            _ => Vec::new(),
        }
    }

    /// Best-effort structure for an anonymous exported expression; named
    /// after the file when the expression itself carries no name.
    fn extract_anonymous(&self, content: &str, stem: &str, node: Node) -> Option<StructureInfo> {
        match node.kind() {
            "class" => {
                let mut structure = self.extract_class(content, node).unwrap_or_else(|| {
                    StructureInfo::new(stem, TargetKind::Class, node.start_position().row + 1)
                });
                if structure.name.is_empty() {
                    structure.name = stem.to_string();
                }
                Some(structure)
            }
            "arrow_function" | "function_expression" | "function" | "generator_function" => Some(
                StructureInfo::new(stem, TargetKind::Function, node.start_position().row + 1),
            ),
            "object" | "number" | "string" | "array" | "template_string" | "true" | "false" => {
                let mut structure =
                    StructureInfo::new(stem, TargetKind::Value, node.start_position().row + 1);
                if node.kind() == "object" {
                    structure.fields = object_keys(content, node);
                }
                Some(structure)
            }
            _ => None,
        }
    }

    fn extract_class(&self, content: &str, node: Node) -> Option<StructureInfo> {
        let name = named_identifier(content, node)?;
        let mut structure =
            StructureInfo::new(name, TargetKind::Class, node.start_position().row + 1);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "decorator" => {
                    // `@Injectable()` and `@Injectable` both record as
                    // `Injectable`.
                    let text = node_text(content, child).trim_start_matches('@');
                    let name = text.split('(').next().unwrap_or(text).trim();
                    structure.annotations.push(name.to_string());
                }
                "type_parameters" => {
                    structure.generics = type_parameter_names(content, child);
                }
                "class_heritage" => {
                    self.extract_heritage(content, child, &mut structure);
                }
                "class_body" => {
                    self.extract_class_body(content, child, &mut structure);
                }
                _ => {}
            }
        }
        Some(structure)
    }

    fn extract_heritage(&self, content: &str, heritage: Node, structure: &mut StructureInfo) {
        let mut cursor = heritage.walk();
        let mut saw_clause = false;
        for child in heritage.children(&mut cursor) {
            match child.kind() {
                "extends_clause" => {
                    saw_clause = true;
                    let mut clause_cursor = child.walk();
                    for ty in child.children(&mut clause_cursor) {
                        if ty.is_named() {
                            structure.extends =
                                Some(base_type_name(node_text(content, ty)));
                            break;
                        }
                    }
                }
                "implements_clause" => {
                    saw_clause = true;
                    let mut clause_cursor = child.walk();
                    for ty in child.children(&mut clause_cursor) {
                        if ty.is_named() {
                            structure
                                .implements
                                .push(base_type_name(node_text(content, ty)));
                        }
                    }
                }
                _ => {}
            }
        }
        if !saw_clause {
            // JS grammar: class_heritage is a bare `extends <expression>`
            let mut cursor = heritage.walk();
            for child in heritage.children(&mut cursor) {
                if child.is_named() {
                    structure.extends = Some(base_type_name(node_text(content, child)));
                    break;
                }
            }
        }
    }

    fn extract_class_body(&self, content: &str, body: Node, structure: &mut StructureInfo) {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    if let Some(name) = member
                        .child_by_field_name("name")
                        .map(|n| node_text(content, n).to_string())
                    {
                        if name != "constructor" {
                            structure.methods.push(name);
                        }
                    }
                }
                // Data fields, including closure-valued ones. These are
                // deliberately not methods.
                "field_definition" | "public_field_definition" => {
                    if let Some(name) = member
                        .child_by_field_name("name")
                        .or_else(|| first_child_of_kind(member, "property_identifier"))
                        .map(|n| node_text(content, n).to_string())
                    {
                        structure.fields.push(name);
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_function(&self, content: &str, node: Node) -> Option<StructureInfo> {
        let name = named_identifier(content, node)?;
        let mut structure =
            StructureInfo::new(name, TargetKind::Function, node.start_position().row + 1);
        if let Some(params) = first_child_of_kind(node, "type_parameters") {
            structure.generics = type_parameter_names(content, params);
        }
        Some(structure)
    }

    fn extract_interface(&self, content: &str, node: Node) -> Option<StructureInfo> {
        let name = named_identifier(content, node)?;
        let mut structure =
            StructureInfo::new(name, TargetKind::Interface, node.start_position().row + 1);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "type_parameters" => {
                    structure.generics = type_parameter_names(content, child);
                }
                "extends_type_clause" | "extends_clause" => {
                    let mut clause_cursor = child.walk();
                    for ty in child.children(&mut clause_cursor) {
                        if ty.is_named() {
                            structure.extends = Some(base_type_name(node_text(content, ty)));
                            break;
                        }
                    }
                }
                "interface_body" | "object_type" => {
                    let mut body_cursor = child.walk();
                    for member in child.children(&mut body_cursor) {
                        let name = member
                            .child_by_field_name("name")
                            .map(|n| node_text(content, n).to_string());
                        match (member.kind(), name) {
                            ("method_signature", Some(name)) => structure.methods.push(name),
                            ("property_signature", Some(name)) => structure.fields.push(name),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        Some(structure)
    }

    fn extract_enum(&self, content: &str, node: Node) -> Option<StructureInfo> {
        let name = named_identifier(content, node)?;
        let mut structure =
            StructureInfo::new(name, TargetKind::Enum, node.start_position().row + 1);
        if let Some(body) = first_child_of_kind(node, "enum_body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "property_identifier" => {
                        structure.fields.push(node_text(content, member).to_string());
                    }
                    "enum_assignment" => {
                        if let Some(name) = member
                            .child_by_field_name("name")
                            .or_else(|| first_child_of_kind(member, "property_identifier"))
                        {
                            structure.fields.push(node_text(content, name).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(structure)
    }

    fn extract_namespace(&self, content: &str, node: Node) -> Option<StructureInfo> {
        let name = named_identifier(content, node)?;
        Some(StructureInfo::new(
            name,
            TargetKind::Module,
            node.start_position().row + 1,
        ))
    }

    fn extract_variables(&self, content: &str, stem: &str, node: Node) -> Vec<StructureInfo> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator
                .child_by_field_name("name")
                .filter(|n| n.kind() == "identifier")
                .map(|n| node_text(content, n).to_string())
            else {
                continue;
            };
            let structure = match declarator.child_by_field_name("value") {
                Some(value) => {
                    let mut structure = self
                        .extract_anonymous(content, stem, value)
                        .unwrap_or_else(|| {
                            StructureInfo::new(
                                name.clone(),
                                TargetKind::Value,
                                declarator.start_position().row + 1,
                            )
                        });
                    structure.name = name;
                    structure.line = declarator.start_position().row + 1;
                    structure.access = AccessDescriptor::named(structure.name.clone());
                    structure.exported = false;
                    structure
                }
                None => StructureInfo::new(
                    name,
                    TargetKind::Value,
                    declarator.start_position().row + 1,
                ),
            };
            out.push(structure);
        }
        out
    }
}

#[async_trait]
impl LanguageIntegration for JsIntegration {
    fn language_id(&self) -> &'static str {
        "javascript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["js", "mjs", "cjs", "jsx", "ts", "tsx"]
    }

    async fn parse_file(&self, path: &Path) -> Result<Option<FileMetadata>> {
        let content = tokio::fs::read_to_string(path).await?;
        self.parse_source(path, &content)
    }

    fn score_extension(
        &self,
        structure: &StructureInfo,
        signature: &Signature,
    ) -> Vec<ScoreComponent> {
        // The module's primary export is the overwhelmingly common target
        // when a caller asks for a name.
        let primary = matches!(
            structure.access,
            AccessDescriptor::Direct | AccessDescriptor::Default
        );
        if primary && signature.name.is_some() {
            vec![ScoreComponent::new("js:primary-export", 3.0)]
        } else {
            Vec::new()
        }
    }

    async fn probe_runtime(
        &self,
        path: &Path,
        limits: &ProbeLimits,
    ) -> Result<Option<Vec<RuntimeExport>>> {
        Ok(Some(probe_node_exports(path, limits).await?))
    }
}

fn node_text<'a>(content: &'a str, node: Node) -> &'a str {
    &content[node.start_byte()..node.end_byte()]
}

fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// Name node of a declaration; grammars disagree on the identifier kind
fn named_identifier(content: &str, node: Node) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(node_text(content, name).to_string());
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "identifier" | "type_identifier"))
        .map(|c| node_text(content, c).to_string());
    found
}

fn type_parameter_names(content: &str, params: Node) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();
    for param in params.children(&mut cursor) {
        if param.kind() != "type_parameter" {
            continue;
        }
        let mut inner = param.walk();
        let name = param
            .children(&mut inner)
            .find(|c| matches!(c.kind(), "type_identifier" | "identifier"));
        if let Some(name) = name {
            names.push(node_text(content, name).to_string());
        }
    }
    names
}

fn object_keys(content: &str, object: Node) -> Vec<String> {
    let mut keys = Vec::new();
    let mut cursor = object.walk();
    for pair in object.children(&mut cursor) {
        if pair.kind() == "pair" {
            if let Some(key) = pair.child_by_field_name("key") {
                let key = node_text(content, key).trim_matches(|c| c == '"' || c == '\'');
                keys.push(key.to_string());
            }
        }
    }
    keys
}

/// Strip generic arguments and namespace qualifiers from a type reference
fn base_type_name(raw: &str) -> String {
    let no_generics = raw.split('<').next().unwrap_or(raw).trim();
    no_generics
        .rsplit('.')
        .next()
        .unwrap_or(no_generics)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn parse(name: &str, source: &str) -> FileMetadata {
        JsIntegration::new()
            .parse_source(&PathBuf::from(name), source)
            .unwrap()
            .expect("expected structures")
    }

    #[test]
    fn extracts_commonjs_class() {
        let metadata = parse(
            "calculator.js",
            r#"
class Calculator {
    constructor() { this.total = 0; }
    add(a, b) { return a + b; }
    subtract(a, b) { return a - b; }
}
module.exports = Calculator;
"#,
        );

        assert_eq!(metadata.structures.len(), 1);
        let calc = &metadata.structures[0];
        assert_eq!(calc.name, "Calculator");
        assert_eq!(calc.kind, TargetKind::Class);
        assert_eq!(calc.methods, vec!["add", "subtract"]);
        assert!(calc.exported);
        assert_eq!(calc.access, AccessDescriptor::Direct);
    }

    #[test]
    fn extracts_esm_default_export() {
        let metadata = parse(
            "service.mjs",
            r#"
export default class UserService extends BaseService {
    create(user) { return user; }
}
"#,
        );

        let service = &metadata.structures[0];
        assert_eq!(service.access, AccessDescriptor::Default);
        assert_eq!(service.extends.as_deref(), Some("BaseService"));
        assert!(service.exported);
    }

    #[test]
    fn closure_valued_fields_are_not_methods() {
        let metadata = parse(
            "sneaky.js",
            r#"
class Sneaky {
    add = (a, b) => a + b;
    actual(x) { return x; }
}
module.exports = Sneaky;
"#,
        );

        let sneaky = &metadata.structures[0];
        assert_eq!(sneaky.methods, vec!["actual"]);
        assert_eq!(sneaky.fields, vec!["add"]);
    }

    #[test]
    fn constant_export_is_a_value() {
        let metadata = parse(
            "calculator.js",
            r#"
const Calculator = Math.PI * 2;
module.exports = Calculator;
"#,
        );

        let constant = &metadata.structures[0];
        assert_eq!(constant.name, "Calculator");
        assert_eq!(constant.kind, TargetKind::Value);
        assert_eq!(constant.access, AccessDescriptor::Direct);
    }

    #[test]
    fn named_exports_mark_structures() {
        let metadata = parse(
            "mixed.js",
            r#"
class Alpha { run() {} }
class Beta { walk() {} }
module.exports.Alpha = Alpha;
"#,
        );

        let alpha = metadata
            .structures
            .iter()
            .find(|s| s.name == "Alpha")
            .unwrap();
        assert!(alpha.exported);
        assert_eq!(alpha.access, AccessDescriptor::named("Alpha"));
        let beta = metadata
            .structures
            .iter()
            .find(|s| s.name == "Beta")
            .unwrap();
        assert!(!beta.exported);
    }

    #[test]
    fn typescript_interface_and_generics() {
        let metadata = parse(
            "repo.ts",
            r#"
export interface Repository<T> {
    save(entity: T): Promise<T>;
    count: number;
}

export class UserRepository implements Repository<User> {
    save(entity) { return Promise.resolve(entity); }
}
"#,
        );

        let iface = metadata
            .structures
            .iter()
            .find(|s| s.kind == TargetKind::Interface)
            .unwrap();
        assert_eq!(iface.name, "Repository");
        assert_eq!(iface.generics, vec!["T"]);
        assert_eq!(iface.methods, vec!["save"]);
        assert_eq!(iface.fields, vec!["count"]);

        let class = metadata
            .structures
            .iter()
            .find(|s| s.kind == TargetKind::Class)
            .unwrap();
        assert_eq!(class.implements, vec!["Repository"]);
    }

    #[test]
    fn aliased_default_export_gets_default_access() {
        let metadata = parse(
            "widget.mjs",
            r#"
class Widget { render() {} }
export { Widget as default };
"#,
        );

        let widget = &metadata.structures[0];
        assert!(widget.exported);
        assert_eq!(widget.access, AccessDescriptor::Default);
    }

    #[test]
    fn decorators_become_annotations() {
        let metadata = parse(
            "service.ts",
            r#"
@Injectable()
@Deprecated
class UserService {
    create(user) { return user; }
}
"#,
        );

        let service = &metadata.structures[0];
        assert_eq!(service.annotations, vec!["Injectable", "Deprecated"]);
        assert_eq!(service.methods, vec!["create"]);
    }

    #[test]
    fn arrow_const_is_a_function() {
        let metadata = parse(
            "util.js",
            r#"
const formatDate = (d) => d.toISOString();
module.exports.formatDate = formatDate;
"#,
        );

        let func = &metadata.structures[0];
        assert_eq!(func.kind, TargetKind::Function);
        assert!(func.exported);
    }

    #[test]
    fn file_without_structures_is_none() {
        let result = JsIntegration::new()
            .parse_source(&PathBuf::from("empty.js"), "// nothing here\n")
            .unwrap();
        assert!(result.is_none());
    }
}
