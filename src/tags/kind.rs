//! Per-kind tag strategies.
//!
//! Each [`TagKind`] decides three things for a symbol: the tag name, the
//! regular expression used to find its declaration line, and the extension
//! fields written after the ex command.

use crate::provider::{EntityKind, ParentRef, SymbolEntity, OBJECT_TYPE_TAG, STRUCT_TYPE_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Interface,
    Struct,
    Object,
    Function,
    Method,
    Member,
    Operator,
    Require,
}

impl TagKind {
    /// Single-letter `kind:` code
    pub fn code(&self) -> char {
        match self {
            TagKind::Interface => 'i',
            TagKind::Struct => 's',
            TagKind::Object => 'o',
            TagKind::Function => 'f',
            TagKind::Method => 'm',
            TagKind::Member => 'v',
            TagKind::Operator => 'p',
            TagKind::Require => 'r',
        }
    }

    /// Declaring keyword; members have none
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            TagKind::Interface => Some("interface"),
            TagKind::Struct => Some("struct"),
            TagKind::Object => Some("object"),
            TagKind::Function | TagKind::Method => Some("function"),
            TagKind::Operator => Some("operator"),
            TagKind::Require => Some("require"),
            TagKind::Member => None,
        }
    }

    /// Whether tagging a type also tags its methods and members
    pub fn recurses(&self) -> bool {
        matches!(self, TagKind::Struct | TagKind::Object)
    }

    pub fn tag_name(&self, entity: &SymbolEntity) -> String {
        entity.name.clone()
    }

    /// Search expression locating the declaration of `tag_name`
    pub fn pattern(&self, tag_name: &str) -> String {
        let name = regex::escape(tag_name);
        match self {
            // `inline` methods have no function keyword
            TagKind::Method => format!(r"(function|inline)[\s\t]+.*{}[\s\t\(?!]", name),
            // `Type name;` or `Type name = ...;`
            TagKind::Member => format!(r"[\d\w]+[\s\t]+{}([^\w\d]+=|;)", name),
            _ => format!(
                r"{}.*[ \t.]+{}[^\w\d]",
                self.keyword().unwrap_or_default(),
                name
            ),
        }
    }

    /// Extension fields, without the trailing `line:` field
    pub fn fields(
        &self,
        extension: &str,
        entity: &SymbolEntity,
        parent: Option<&ParentRef>,
        rule: CategoryRule,
    ) -> Vec<String> {
        let kind = format!("kind:{}", self.code());

        match self {
            TagKind::Method | TagKind::Member => {
                let category = rule.resolve(parent);
                let owner = match self {
                    TagKind::Method => entity.this_type.as_str(),
                    _ => parent.map(|p| p.name.as_str()).unwrap_or_default(),
                };
                vec![
                    kind,
                    "access:public".to_string(),
                    format!("namespace:{}", extension),
                    format!("{}:{}", category.as_str(), owner),
                ]
            }
            _ => {
                let mut fields = vec![kind];
                if !extension.is_empty() {
                    fields.push(format!("namespace:{}", extension));
                }
                fields
            }
        }
    }
}

impl From<EntityKind> for TagKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Require => TagKind::Require,
            EntityKind::Interface => TagKind::Interface,
            EntityKind::Struct => TagKind::Struct,
            EntityKind::Object => TagKind::Object,
            EntityKind::Function => TagKind::Function,
            EntityKind::Operator => TagKind::Operator,
            EntityKind::Method => TagKind::Method,
            EntityKind::Member => TagKind::Member,
        }
    }
}

/// Category of the type declaring a method or member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerCategory {
    Object,
    Struct,
    Class,
}

impl OwnerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerCategory::Object => "object",
            OwnerCategory::Struct => "struct",
            OwnerCategory::Class => "class",
        }
    }
}

/// How a parent's runtime type name maps to an [`OwnerCategory`].
///
/// The historical rule only recognises objects, so struct members come out
/// as `class:`. `distinguish_structs` reports them as `struct:` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryRule {
    pub distinguish_structs: bool,
}

impl CategoryRule {
    pub fn new(distinguish_structs: bool) -> Self {
        Self { distinguish_structs }
    }

    pub fn resolve(&self, parent: Option<&ParentRef>) -> OwnerCategory {
        match parent {
            Some(p) if p.type_tag.contains(OBJECT_TYPE_TAG) => OwnerCategory::Object,
            Some(p) if self.distinguish_structs && p.type_tag.contains(STRUCT_TYPE_TAG) => {
                OwnerCategory::Struct
            }
            _ => OwnerCategory::Class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn matches(kind: TagKind, name: &str, line: &str) -> bool {
        Regex::new(&kind.pattern(name)).unwrap().is_match(line)
    }

    fn object_parent(name: &str) -> ParentRef {
        ParentRef {
            name: name.to_string(),
            type_tag: OBJECT_TYPE_TAG.to_string(),
        }
    }

    fn struct_parent(name: &str) -> ParentRef {
        ParentRef {
            name: name.to_string(),
            type_tag: STRUCT_TYPE_TAG.to_string(),
        }
    }

    #[test]
    fn test_codes() {
        let codes: String = [
            TagKind::Interface,
            TagKind::Struct,
            TagKind::Object,
            TagKind::Function,
            TagKind::Method,
            TagKind::Member,
            TagKind::Operator,
            TagKind::Require,
        ]
        .iter()
        .map(|k| k.code())
        .collect();
        assert_eq!(codes, "isofmvpr");
    }

    #[test]
    fn test_keyword_pattern_matches_declaration() {
        assert!(matches(TagKind::Object, "Foo", "object Foo {\n"));
        assert!(matches(TagKind::Object, "Foo", "object Foo : Bar {"));
        assert!(matches(TagKind::Struct, "Vec3", "struct Vec3 {"));
        assert!(matches(TagKind::Interface, "Solver", "interface Solver {"));
        assert!(matches(TagKind::Require, "Math", "require Math;"));
        assert!(matches(TagKind::Function, "doThing", "function Float doThing() {"));
        assert!(matches(
            TagKind::Operator,
            "solveTask",
            "operator solveTask<<<index>>>(io Float v) {"
        ));
    }

    #[test]
    fn test_keyword_pattern_needs_word_boundary() {
        assert!(!matches(TagKind::Object, "Foo", "object FooBar {"));
        assert!(!matches(TagKind::Object, "Foo", "struct Foo {"));
        // name at end of line without terminator
        assert!(!matches(TagKind::Require, "Math", "require Math"));
        assert!(matches(TagKind::Require, "Math", "require Math\n"));
    }

    #[test]
    fn test_dotted_function_names() {
        assert!(matches(TagKind::Function, "bar", "function Float Foo.bar() {"));
    }

    #[test]
    fn test_method_pattern() {
        assert!(matches(TagKind::Method, "bar", "  function Float bar() {"));
        assert!(matches(TagKind::Method, "bar", "inline Float Foo.bar!() {"));
        assert!(matches(TagKind::Method, "bar", "function Foo.bar?() {"));
        assert!(!matches(TagKind::Method, "bar", "  Float bar() {"));
    }

    #[test]
    fn test_member_pattern() {
        assert!(matches(TagKind::Member, "x", "  Integer x;"));
        assert!(matches(TagKind::Member, "x", "  Float32 x = 1.0;"));
        assert!(!matches(TagKind::Member, "x", "  x = 1;"));
        assert!(!matches(TagKind::Member, "x", "  Integer xy;"));
    }

    #[test]
    fn test_pattern_escapes_name() {
        assert!(matches(TagKind::Operator, "+", "operator + (Vec3 a, Vec3 b) {"));
        assert!(!matches(TagKind::Operator, "+", "operator x (Vec3 a) {"));
    }

    #[test]
    fn test_plain_fields() {
        let entity = SymbolEntity::new("Foo", EntityKind::Object, "foo.kl");
        let rule = CategoryRule::default();

        assert_eq!(
            TagKind::Object.fields("Geometry", &entity, None, rule),
            vec!["kind:o", "namespace:Geometry"]
        );
        assert_eq!(TagKind::Object.fields("", &entity, None, rule), vec!["kind:o"]);
    }

    #[test]
    fn test_method_fields_use_own_this_type() {
        let method =
            SymbolEntity::new("reset", EntityKind::Method, "foo.kl").with_this_type("Base");
        let parent = object_parent("Derived");

        let fields = TagKind::Method.fields("", &method, Some(&parent), CategoryRule::default());
        assert_eq!(
            fields,
            vec!["kind:m", "access:public", "namespace:", "object:Base"]
        );
    }

    #[test]
    fn test_member_fields_use_parent_name() {
        let member = SymbolEntity::new("x", EntityKind::Member, "foo.kl").with_this_type("Integer");
        let parent = object_parent("Foo");

        let fields = TagKind::Member.fields("Ext", &member, Some(&parent), CategoryRule::default());
        assert_eq!(
            fields,
            vec!["kind:v", "access:public", "namespace:Ext", "object:Foo"]
        );
    }

    #[test]
    fn test_historical_rule_never_yields_struct() {
        let rule = CategoryRule::default();
        assert_eq!(rule.resolve(Some(&object_parent("A"))), OwnerCategory::Object);
        assert_eq!(rule.resolve(Some(&struct_parent("B"))), OwnerCategory::Class);
        assert_eq!(rule.resolve(None), OwnerCategory::Class);
    }

    #[test]
    fn test_distinguish_structs_rule() {
        let rule = CategoryRule::new(true);
        assert_eq!(rule.resolve(Some(&object_parent("A"))), OwnerCategory::Object);
        assert_eq!(rule.resolve(Some(&struct_parent("B"))), OwnerCategory::Struct);
        assert_eq!(rule.resolve(None), OwnerCategory::Class);
    }

    #[test]
    fn test_from_entity_kind() {
        assert_eq!(TagKind::from(EntityKind::Member), TagKind::Member);
        assert_eq!(TagKind::from(EntityKind::Require), TagKind::Require);
    }
}
