use std::collections::BTreeSet;

use tree_sitter::{Language, Node, Parser};

use super::{BackendModel, SourceExtractor};
use crate::error::ExtractError;

/// Callee-name fragments that mark a class attribute as a Django schema field.
pub const DJANGO_FIELD_MARKERS: &[&str] = &[
    "Field",
    "CharField",
    "TextField",
    "IntegerField",
    "BooleanField",
    "DateTimeField",
    "ForeignKey",
    "ManyToManyField",
    "OneToOneField",
    "EmailField",
    "URLField",
    "FileField",
    "ImageField",
    "DecimalField",
    "AutoField",
];

/// Extracts `name = models.SomeField(...)` assignments from every class that
/// inherits from something.
pub struct DjangoModelExtractor {
    markers: Vec<String>,
}

impl Default for DjangoModelExtractor {
    fn default() -> Self {
        Self::new(DJANGO_FIELD_MARKERS.iter().map(|m| m.to_string()).collect())
    }
}

impl DjangoModelExtractor {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }

    fn is_field_constructor(&self, callee: &str) -> bool {
        self.markers.iter().any(|marker| callee.contains(marker.as_str()))
    }

    fn visit(&self, node: Node, src: &[u8], models: &mut Vec<BackendModel>) {
        if node.kind() == "class_definition" {
            // Plain helper classes (no bases) are skipped along with everything inside them.
            if !has_bases(node) {
                return;
            }
            let Some(name) = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(src).ok())
            else {
                return;
            };
            let Some(body) = node.child_by_field_name("body") else {
                return;
            };

            let fields = self.class_body_fields(body, src);
            match models.iter_mut().find(|m| m.name == name) {
                Some(existing) => existing.fields.extend(fields),
                None => models.push(BackendModel {
                    name: name.to_string(),
                    fields,
                    line: node.start_position().row + 1,
                }),
            }

            // Nested classes become their own models; their fields were never
            // part of `class_body_fields` above.
            self.visit_children(body, src, models);
            return;
        }

        self.visit_children(node, src, models);
    }

    fn visit_children(&self, node: Node, src: &[u8], models: &mut Vec<BackendModel>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, src, models);
        }
    }

    /// Fields assigned directly in a class body. Statements nested in
    /// methods, conditionals or inner classes are not considered.
    fn class_body_fields(&self, body: Node, src: &[u8]) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let mut inner = statement.walk();
            for expr in statement.named_children(&mut inner) {
                if expr.kind() == "assignment" {
                    self.assignment_fields(expr, src, &mut fields);
                }
            }
        }
        fields
    }

    fn assignment_fields(&self, assignment: Node, src: &[u8], fields: &mut BTreeSet<String>) {
        // `a = b = f()` nests as assignment(left: a, right: assignment(left: b, right: f()))
        let mut targets = Vec::new();
        let mut current = assignment;
        let value = loop {
            if current.child_by_field_name("type").is_some() {
                return;
            }
            let Some(left) = current.child_by_field_name("left") else {
                return;
            };
            targets.push(left);
            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                Some(right) => break right,
                None => return,
            }
        };

        if value.kind() != "call" {
            return;
        }
        let Some(callee) = value.child_by_field_name("function").and_then(|f| callee_name(f, src))
        else {
            return;
        };
        if !self.is_field_constructor(callee) {
            return;
        }

        for target in targets {
            if target.kind() != "identifier" {
                continue;
            }
            if let Ok(name) = target.utf8_text(src) {
                if !name.starts_with('_') {
                    fields.insert(name.to_string());
                }
            }
        }
    }
}

impl SourceExtractor for DjangoModelExtractor {
    type Output = Vec<BackendModel>;

    fn extract(&self, source: &str) -> Result<Vec<BackendModel>, ExtractError> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser.set_language(&language)?;
        let tree = parser.parse(source, None).ok_or(ExtractError::NoTree)?;
        let root = tree.root_node();

        // tree-sitter recovers from more than a Python 3 parser accepts, so a
        // clean tree is still checked for legacy statements and bad dedents.
        let rejected = if root.has_error() {
            Some(first_error(root).map(position).unwrap_or((1, 1)))
        } else {
            first_rejected(root, source).map(position)
        };
        if let Some((line, column)) = rejected {
            return Err(ExtractError::Syntax { line, column });
        }

        let mut models = Vec::new();
        self.visit(root, source.as_bytes(), &mut models);
        tracing::debug!(models = models.len(), "extracted django models");
        Ok(models)
    }
}

/// Positional base classes; `class Foo():` and `class Foo(metaclass=M):` have none.
fn has_bases(class: Node) -> bool {
    let Some(args) = class.child_by_field_name("superclasses") else {
        return false;
    };
    let mut cursor = args.walk();
    let has_base = args
        .named_children(&mut cursor)
        .any(|arg| !matches!(arg.kind(), "keyword_argument" | "dictionary_splat" | "comment"));
    has_base
}

/// `models.CharField` -> `CharField`, `CharField` -> `CharField`.
fn callee_name<'a>(function: Node, src: &'a [u8]) -> Option<&'a str> {
    match function.kind() {
        "attribute" => function.child_by_field_name("attribute")?.utf8_text(src).ok(),
        "identifier" => function.utf8_text(src).ok(),
        _ => None,
    }
}

/// Python 2 statement forms the grammar still parses.
const PYTHON2_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

fn position(node: Node) -> (usize, usize) {
    let start = node.start_position();
    (start.row + 1, start.column + 1)
}

fn first_rejected<'t>(node: Node<'t>, src: &str) -> Option<Node<'t>> {
    if PYTHON2_STATEMENTS.contains(&node.kind()) {
        return Some(node);
    }
    if matches!(node.kind(), "module" | "block") {
        if let Some(statement) = misaligned_statement(node, src) {
            return Some(statement);
        }
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    children.into_iter().find_map(|child| first_rejected(child, src))
}

/// First statement that opens a line at a different column than its
/// siblings. Module-level statements must start at column 0.
fn misaligned_statement<'t>(container: Node<'t>, src: &str) -> Option<Node<'t>> {
    let mut expected = (container.kind() == "module").then_some(0);
    let mut cursor = container.walk();
    let statements: Vec<Node<'t>> = container
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();

    for statement in statements {
        let column = statement.start_position().column;
        // `a = 1; b = 2` and `class A: pass` put statements mid-line.
        if !opens_line(src, statement.start_byte(), column) {
            continue;
        }
        match expected {
            Some(indent) if indent != column => return Some(statement),
            Some(_) => {}
            None => expected = Some(column),
        }
    }
    None
}

fn opens_line(src: &str, start_byte: usize, column: usize) -> bool {
    src.as_bytes()
        .get(start_byte.saturating_sub(column)..start_byte)
        .is_some_and(|prefix| prefix.iter().all(|&b| matches!(b, b' ' | b'\t' | b'\x0c')))
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> Vec<BackendModel> {
        DjangoModelExtractor::default()
            .extract(src)
            .expect("source should parse")
    }

    fn fields_of<'a>(models: &'a [BackendModel], name: &str) -> Vec<&'a str> {
        models
            .iter()
            .find(|m| m.name == name)
            .unwrap_or_else(|| panic!("model {} not extracted: {:?}", name, models))
            .fields
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_extracts_fields_from_django_model() {
        let src = r#"
from django.db import models


class Organization(models.Model):
    id = models.UUIDField(primary_key=True)
    name = models.CharField(max_length=255)
    created_by = models.ForeignKey("UserModel", on_delete=models.CASCADE)
    topics = models.ManyToManyField("Topic", blank=True)
    objects = models.Manager()

    def __str__(self):
        return self.name
"#;
        let models = extract(src);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].line, 5);
        assert_eq!(
            fields_of(&models, "Organization"),
            vec!["created_by", "id", "name", "topics"],
            "Manager() is not a schema field"
        );
    }

    #[test]
    fn test_bare_field_constructor_counts() {
        let src = "class Organization(Model):\n    name = CharField(max_length=10)\n    tagline = CharField()\n";
        assert_eq!(fields_of(&extract(src), "Organization"), vec!["name", "tagline"]);
    }

    #[test]
    fn test_class_without_bases_is_skipped() {
        let src = r#"
class Helper:
    value = models.CharField()

class Empty():
    value = models.CharField()

class WithMeta(metaclass=ABCMeta):
    value = models.CharField()
"#;
        assert!(extract(src).is_empty(), "no positional bases means no model");
    }

    #[test]
    fn test_model_without_fields_is_still_recorded() {
        let models = extract("class Marker(models.Model):\n    pass\n");
        assert_eq!(models.len(), 1);
        assert!(models[0].fields.is_empty());
    }

    #[test]
    fn test_meta_class_does_not_leak_or_hide_fields() {
        let src = r#"
class Event(models.Model):
    name = models.CharField()

    class Meta:
        ordering = models.CharField()

    start_time = models.DateTimeField()
"#;
        let models = extract(src);
        assert_eq!(models.len(), 1, "Meta has no bases: {:?}", models);
        assert_eq!(fields_of(&models, "Event"), vec!["name", "start_time"]);
    }

    #[test]
    fn test_nested_model_class_keeps_its_own_fields() {
        let src = r#"
class Outer(models.Model):
    outer_field = models.TextField()

    class Inner(models.Model):
        inner_field = models.TextField()
"#;
        let models = extract(src);
        assert_eq!(fields_of(&models, "Outer"), vec!["outer_field"]);
        assert_eq!(fields_of(&models, "Inner"), vec!["inner_field"]);
    }

    #[test]
    fn test_chained_assignment_records_every_target() {
        let models = extract("class Pair(models.Model):\n    a = b = models.IntegerField()\n");
        assert_eq!(fields_of(&models, "Pair"), vec!["a", "b"]);
    }

    #[test]
    fn test_skips_private_annotated_tuple_and_method_assignments() {
        let src = r#"
class Resource(models.Model):
    _cache = models.CharField()
    typed: str = models.CharField()
    left, right = models.CharField(), models.CharField()
    url = models.URLField()

    def save(self, *args, **kwargs):
        hidden = models.CharField()
        super().save(*args, **kwargs)
"#;
        assert_eq!(fields_of(&extract(src), "Resource"), vec!["url"]);
    }

    #[test]
    fn test_duplicate_class_names_merge() {
        let src = r#"
class Group(models.Model):
    name = models.CharField()

class Group(models.Model):
    category = models.CharField()
"#;
        let models = extract(src);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].line, 2, "keeps the first declaration line");
        assert_eq!(fields_of(&models, "Group"), vec!["category", "name"]);
    }

    #[test]
    fn test_decorated_class_is_found() {
        let src = "@register\nclass Flag(models.Model):\n    is_active = models.BooleanField()\n";
        assert_eq!(fields_of(&extract(src), "Flag"), vec!["is_active"]);
    }

    #[test]
    fn test_custom_marker_vocabulary() {
        let extractor = DjangoModelExtractor::new(vec!["Column".to_string()]);
        let models = extractor
            .extract("class T(Base):\n    a = Column(Integer)\n    b = models.CharField()\n")
            .unwrap();
        assert_eq!(fields_of(&models, "T"), vec!["a"]);
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let err = DjangoModelExtractor::default()
            .extract("class Broken(models.Model)\n    name = models.CharField(\n")
            .expect_err("broken source must not extract");
        match err {
            ExtractError::Syntax { line, .. } => assert!(line >= 1),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    fn syntax_error_line(src: &str) -> usize {
        match DjangoModelExtractor::default().extract(src) {
            Err(ExtractError::Syntax { line, .. }) => line,
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_python2_print_statement_is_fatal() {
        let src = "print \"hello\"\nclass A(models.Model):\n    name = models.CharField()\n";
        assert_eq!(syntax_error_line(src), 1);
    }

    #[test]
    fn test_python2_exec_statement_is_fatal() {
        let src = "class A(models.Model):\n    name = models.CharField()\n\nexec \"code\"\n";
        assert_eq!(syntax_error_line(src), 4);
    }

    #[test]
    fn test_dedent_to_unopened_column_is_fatal() {
        let src = "class A(models.Model):\n        x = models.CharField()\n    y = models.CharField()\n";
        assert!(syntax_error_line(src) >= 2);
    }

    #[test]
    fn test_indented_module_statement_is_fatal() {
        let src = "class A(models.Model):\n    x = models.CharField()\n\n  class B(models.Model):\n      y = models.CharField()\n";
        assert!(syntax_error_line(src) >= 2);
    }

    #[test]
    fn test_python3_layouts_still_parse() {
        let src = r#"
print("loading models")

class A(models.Model): name = models.CharField()

class B(models.Model):
    # schema fields
    x = models.CharField(); y = models.CharField()
    z = models.CharField(
            max_length=10,
    )

    def save(self):
        if self.x:
            pass
        else:
            pass
"#;
        let models = extract(src);
        assert_eq!(fields_of(&models, "A"), vec!["name"]);
        assert_eq!(fields_of(&models, "B"), vec!["x", "y", "z"]);
    }
}
