//! Path expressions over [`Element`] trees.
//!
//! The supported subset of XPath is what CDA extraction needs:
//!
//! - origins `//`, `/`, `.//`, `./` or a bare relative step
//! - steps `prefix:local`, `local` (no namespace) or `*`
//! - predicates `[@attr]`, `[@attr="value"]` and `[relative/path]`
//!
//! Prefixes resolve against the fixed table in [`super::NAMESPACES`].
//! Results are returned in document order without duplicates.

use super::{Element, namespace_for_prefix};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Name {
        namespace: Option<&'static str>,
        local: String,
    },
}

impl NameTest {
    fn matches(&self, element: Element<'_>) -> bool {
        match self {
            Self::Any => true,
            Self::Name { namespace, local } => {
                element.local_name() == local && element.namespace() == *namespace
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    HasAttribute {
        namespace: Option<&'static str>,
        name: String,
    },
    AttributeEquals {
        namespace: Option<&'static str>,
        name: String,
        value: String,
    },
    Exists(PathExpr),
}

impl Predicate {
    fn holds(&self, element: Element<'_>) -> bool {
        match self {
            Self::HasAttribute { namespace, name } => lookup(element, *namespace, name).is_some(),
            Self::AttributeEquals {
                namespace,
                name,
                value,
            } => lookup(element, *namespace, name) == Some(value.as_str()),
            Self::Exists(path) => !path.evaluate(element).is_empty(),
        }
    }
}

fn lookup<'d>(element: Element<'d>, namespace: Option<&str>, name: &str) -> Option<&'d str> {
    match namespace {
        Some(namespace) => element.attr_ns(namespace, name),
        None => element.attr(name),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

impl Step {
    fn accepts(&self, element: Element<'_>) -> bool {
        self.test.matches(element) && self.predicates.iter().all(|p| p.holds(element))
    }

    fn apply<'d>(&self, context: &[Element<'d>]) -> Vec<Element<'d>> {
        let mut selected: Vec<Element<'d>> = Vec::new();
        for &element in context {
            match self.axis {
                Axis::Child => selected.extend(element.children().filter(|e| self.accepts(*e))),
                Axis::Descendant => {
                    selected.extend(element.descendants().filter(|e| self.accepts(*e)));
                }
            }
        }
        in_document_order(selected)
    }
}

fn in_document_order(mut elements: Vec<Element<'_>>) -> Vec<Element<'_>> {
    elements.sort_by_key(Element::index);
    elements.dedup();
    elements
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    absolute: bool,
    steps: Vec<Step>,
}

impl PathExpr {
    /// Compiles an expression, failing with [`IngestError::InvalidPath`].
    pub fn parse(expr: &str) -> Result<Self> {
        let mut parser = Parser { src: expr, pos: 0 };
        let path = parser.path()?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(path)
    }

    /// Evaluates the expression with `context` as the context element.
    pub fn evaluate<'d>(&self, context: Element<'d>) -> Vec<Element<'d>> {
        let mut steps = self.steps.iter();
        let Some(first) = steps.next() else {
            return Vec::new();
        };

        let mut current = if self.absolute {
            // The document node's only child is the root element.
            let root = context.document().root();
            let candidates: Vec<Element<'d>> = match first.axis {
                Axis::Child => vec![root],
                Axis::Descendant => std::iter::once(root).chain(root.descendants()).collect(),
            };
            candidates.into_iter().filter(|e| first.accepts(*e)).collect()
        } else {
            first.apply(&[context])
        };

        for step in steps {
            if current.is_empty() {
                break;
            }
            current = step.apply(&current);
        }
        current
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn error(&self, message: &str) -> IngestError {
        IngestError::InvalidPath {
            expr: self.src.to_string(),
            message: format!("{message} at offset {}", self.pos),
        }
    }

    fn path(&mut self) -> Result<PathExpr> {
        self.skip_whitespace();
        let (absolute, mut axis) = if self.eat(".//") {
            (false, Axis::Descendant)
        } else if self.eat("./") {
            (false, Axis::Child)
        } else if self.eat("//") {
            (true, Axis::Descendant)
        } else if self.eat("/") {
            (true, Axis::Child)
        } else {
            (false, Axis::Child)
        };

        let mut steps = Vec::new();
        loop {
            steps.push(self.step(axis)?);
            if self.eat("//") {
                axis = Axis::Descendant;
            } else if self.eat("/") {
                axis = Axis::Child;
            } else {
                break;
            }
        }

        Ok(PathExpr { absolute, steps })
    }

    fn step(&mut self, axis: Axis) -> Result<Step> {
        let test = if self.eat("*") {
            NameTest::Any
        } else {
            let (namespace, local) = self.qualified_name()?;
            NameTest::Name { namespace, local }
        };

        let mut predicates = Vec::new();
        while self.eat("[") {
            predicates.push(self.predicate()?);
            self.skip_whitespace();
            if !self.eat("]") {
                return Err(self.error("expected ']'"));
            }
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        self.skip_whitespace();
        if !self.eat("@") {
            return Ok(Predicate::Exists(self.path()?));
        }

        let (namespace, name) = self.qualified_name()?;
        self.skip_whitespace();
        if !self.eat("=") {
            return Ok(Predicate::HasAttribute { namespace, name });
        }
        self.skip_whitespace();
        let value = self.quoted()?;
        Ok(Predicate::AttributeEquals {
            namespace,
            name,
            value,
        })
    }

    fn quoted(&mut self) -> Result<String> {
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a quoted value")),
        };
        self.pos += 1;
        let Some(len) = self.rest().find(quote) else {
            return Err(self.error("unterminated string"));
        };
        let value = self.rest()[..len].to_string();
        self.pos += len + 1;
        Ok(value)
    }

    fn name(&mut self) -> Result<String> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_alphabetic() || c == '_' => {}
            _ => return Err(self.error("expected a name")),
        }
        let len = chars
            .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
            .map_or(rest.len(), |(i, _)| i);
        let name = rest[..len].to_string();
        self.pos += len;
        Ok(name)
    }

    fn qualified_name(&mut self) -> Result<(Option<&'static str>, String)> {
        let first = self.name()?;
        if !self.eat(":") {
            return Ok((None, first));
        }
        let local = self.name()?;
        match namespace_for_prefix(&first) {
            Some(namespace) => Ok((Some(namespace), local)),
            None => Err(self.error(&format!("unknown namespace prefix '{first}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    const DOC: &str = r#"<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <recordTarget><patientRole><id extension="123"/></patientRole></recordTarget>
  <component><structuredBody>
    <component><section>
      <code code="48765-2"/>
      <entry><act><entryRelationship>
        <observation negationInd="true"><value xsi:type="CD" code="x"/></observation>
      </entryRelationship></act></entry>
    </section></component>
    <component><section>
      <code code="11450-4"/>
      <entry><observation><value xsi:type="PQ" value="1"/></observation></entry>
      <entry><observation><value xsi:type="CD" code="J45"/></observation></entry>
    </section></component>
  </structuredBody></component>
</ClinicalDocument>"#;

    fn doc() -> XmlDocument {
        XmlDocument::parse("DOC0001.XML", DOC).unwrap()
    }

    #[test]
    fn test_absolute_descendant_with_nested_predicate() {
        let doc = doc();
        let sections = doc
            .select(r#"//v3:section[v3:code[@code="48765-2"]]"#)
            .unwrap();
        assert_eq!(sections.len(), 1);
        let observations = sections[0]
            .select(".//v3:entry/v3:act/v3:entryRelationship/v3:observation")
            .unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].attr("negationInd"), Some("true"));
    }

    #[test]
    fn test_prefixed_attribute_predicate() {
        let doc = doc();
        let values = doc.select(r#"//v3:value[@xsi:type="PQ"]"#).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].attr("value"), Some("1"));
        assert_eq!(doc.select("//v3:value[@xsi:type]").unwrap().len(), 3);
    }

    #[test]
    fn test_absolute_child_path_starts_at_root() {
        let doc = doc();
        let id = doc
            .select_first("/v3:ClinicalDocument/v3:recordTarget/v3:patientRole/v3:id")
            .unwrap()
            .unwrap();
        assert_eq!(id.attr("extension"), Some("123"));
        assert!(doc.select("/v3:recordTarget").unwrap().is_empty());
    }

    #[test]
    fn test_relative_steps_and_wildcard() {
        let doc = doc();
        let root = doc.root();
        assert_eq!(root.select("v3:recordTarget/*/v3:id").unwrap().len(), 1);
        assert_eq!(root.select("./v3:component").unwrap().len(), 1);
        // Unprefixed names match elements outside any namespace only.
        assert!(root.select("recordTarget").unwrap().is_empty());
    }

    #[test]
    fn test_descendant_results_are_deduplicated() {
        let doc = doc();
        let observations = doc.select("//v3:component//v3:observation").unwrap();
        assert_eq!(observations.len(), 3);
    }

    #[test]
    fn test_invalid_expressions() {
        for expr in ["", "//", "//v9:section", "//v3:section[@code", "//v3:a[@b='c]", "v3:a b"] {
            assert!(
                matches!(PathExpr::parse(expr), Err(IngestError::InvalidPath { .. })),
                "{expr:?} should be rejected"
            );
        }
    }
}
