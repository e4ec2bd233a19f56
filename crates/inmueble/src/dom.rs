//! Tree-query interface the extractors use to navigate a listing page.
//!
//! The extraction code is generic over [`QueryableNode`]; the `scraper` crate's
//! [`ElementRef`] is the implementation used for real pages.

use regex::Regex;
use scraper::ElementRef;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeChild<N> {
    Text(String),
    Element(N),
}

#[derive(Debug, Clone, Copy)]
pub enum TextMode<'a> {
    /// Every descendant text node concatenated as-is.
    Raw,
    /// Descendant text nodes joined with `separator`. With `strip`, each node
    /// is trimmed and whitespace-only nodes are skipped.
    Joined { separator: &'a str, strip: bool },
}

#[derive(Debug, Clone, Copy)]
pub enum ClassFilter<'a> {
    /// One of the element's class tokens equals the value.
    Token(&'a str),
    /// The raw class attribute contains the value.
    Contains(&'a str),
    /// The pattern matches somewhere in the raw class attribute.
    Pattern(&'a Regex),
}

#[derive(Debug, Clone, Copy)]
pub struct NodeQuery<'a> {
    tag: &'a str,
    id: Option<&'a str>,
    class: Option<ClassFilter<'a>>,
    attr: Option<(&'a str, &'a str)>,
}

impl<'a> NodeQuery<'a> {
    pub fn tag(tag: &'a str) -> Self {
        Self {
            tag,
            id: None,
            class: None,
            attr: None,
        }
    }

    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    pub fn class_token(mut self, token: &'a str) -> Self {
        self.class = Some(ClassFilter::Token(token));
        self
    }

    pub fn class_contains(mut self, fragment: &'a str) -> Self {
        self.class = Some(ClassFilter::Contains(fragment));
        self
    }

    pub fn class_pattern(mut self, pattern: &'a Regex) -> Self {
        self.class = Some(ClassFilter::Pattern(pattern));
        self
    }

    pub fn attr(mut self, name: &'a str, value: &'a str) -> Self {
        self.attr = Some((name, value));
        self
    }

    pub fn matches<N: QueryableNode>(&self, node: &N) -> bool {
        if !node.tag_name().eq_ignore_ascii_case(self.tag) {
            return false;
        }
        if let Some(id) = self.id
            && node.attribute("id") != Some(id)
        {
            return false;
        }
        if let Some((name, value)) = self.attr
            && node.attribute(name) != Some(value)
        {
            return false;
        }
        match self.class {
            None => true,
            Some(filter) => {
                let Some(class) = node.attribute("class") else {
                    return false;
                };
                match filter {
                    ClassFilter::Token(token) => class.split_whitespace().any(|c| c == token),
                    ClassFilter::Contains(fragment) => class.contains(fragment),
                    ClassFilter::Pattern(pattern) => pattern.is_match(class),
                }
            }
        }
    }
}

pub trait QueryableNode: Clone + PartialEq + Sized {
    fn tag_name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Direct children, text nodes included, in document order.
    fn child_nodes(&self) -> Vec<NodeChild<Self>>;

    /// Siblings after this node, text nodes included, in document order.
    fn next_sibling_nodes(&self) -> Vec<NodeChild<Self>>;

    /// Element descendants in document order, excluding the node itself.
    fn element_descendants(&self) -> Vec<Self>;

    fn text_nodes(&self) -> Vec<String>;

    fn extract_text(&self, mode: TextMode) -> String {
        let nodes = self.text_nodes();
        match mode {
            TextMode::Raw => nodes.concat(),
            TextMode::Joined {
                separator,
                strip: false,
            } => nodes.join(separator),
            TextMode::Joined {
                separator,
                strip: true,
            } => nodes
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(separator),
        }
    }

    fn find(&self, query: &NodeQuery) -> Option<Self> {
        self.element_descendants()
            .into_iter()
            .find(|node| query.matches(node))
    }

    fn find_all(&self, query: &NodeQuery) -> Vec<Self> {
        self.element_descendants()
            .into_iter()
            .filter(|node| query.matches(node))
            .collect()
    }

    /// Elements matching any of the queries, once each, in document order.
    fn find_any(&self, queries: &[NodeQuery]) -> Vec<Self> {
        self.element_descendants()
            .into_iter()
            .filter(|node| queries.iter().any(|q| q.matches(node)))
            .collect()
    }
}

impl QueryableNode for ElementRef<'_> {
    fn tag_name(&self) -> &str {
        self.value().name()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn child_nodes(&self) -> Vec<NodeChild<Self>> {
        self.children()
            .filter_map(|node| match ElementRef::wrap(node) {
                Some(element) => Some(NodeChild::Element(element)),
                None => node.value().as_text().map(|t| NodeChild::Text(String::from(&**t))),
            })
            .collect()
    }

    fn next_sibling_nodes(&self) -> Vec<NodeChild<Self>> {
        self.next_siblings()
            .filter_map(|node| match ElementRef::wrap(node) {
                Some(element) => Some(NodeChild::Element(element)),
                None => node.value().as_text().map(|t| NodeChild::Text(String::from(&**t))),
            })
            .collect()
    }

    fn element_descendants(&self) -> Vec<Self> {
        self.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .collect()
    }

    fn text_nodes(&self) -> Vec<String> {
        self.text().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn fragment(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_find_by_class_filters() {
        let document = fragment(
            r#"<div id="main">
                <div class="row fw-bold text-center"><span class="text-muted small">A</span></div>
                <div class="col-sm-12 col-md-6 my-1">B</div>
            </div>"#,
        );
        let root = document.root_element();
        let row = Regex::new("row fw-bold").unwrap();

        let main = root
            .find(&NodeQuery::tag("div").id("main"))
            .expect("Should find main");
        assert!(main.find(&NodeQuery::tag("div").class_pattern(&row)).is_some());
        assert!(
            main.find(&NodeQuery::tag("span").class_token("small"))
                .is_some()
        );
        assert!(
            main.find(&NodeQuery::tag("span").class_token("smal"))
                .is_none()
        );
        assert_eq!(
            main.find_all(&NodeQuery::tag("div").class_contains("col-md-6 my-1"))
                .len(),
            1
        );
    }

    #[test]
    fn test_find_any_keeps_document_order() {
        let document = fragment(
            r#"<section><p class="b">1</p><p class="a">2</p><p class="b">3</p><p class="c">4</p></section>"#,
        );
        let root = document.root_element();
        let found = root.find_any(&[
            NodeQuery::tag("p").class_token("a"),
            NodeQuery::tag("p").class_token("b"),
        ]);
        let texts: Vec<String> = found
            .iter()
            .map(|n| n.extract_text(TextMode::Raw))
            .collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_children_and_siblings_include_text() {
        let document =
            fragment(r#"<div class="cell">Clave: <span class="fw-bold">Valor</span> cola<i></i> fin</div>"#);
        let cell = document
            .root_element()
            .find(&NodeQuery::tag("div").class_token("cell"))
            .unwrap();

        let children = cell.child_nodes();
        assert_eq!(children.len(), 5);
        assert_eq!(children[0], NodeChild::Text("Clave: ".to_string()));

        let span = cell.find(&NodeQuery::tag("span")).unwrap();
        let siblings = span.next_sibling_nodes();
        assert_eq!(siblings[0], NodeChild::Text(" cola".to_string()));
        assert!(matches!(&siblings[1], NodeChild::Element(e) if e.tag_name() == "i"));
    }

    #[test]
    fn test_extract_text_modes() {
        let document = fragment(r#"<p>Uno<br>  <b>Dos</b>  <br>Tres</p>"#);
        let p = document.root_element().find(&NodeQuery::tag("p")).unwrap();

        assert_eq!(p.extract_text(TextMode::Raw), "Uno  Dos  Tres");
        assert_eq!(
            p.extract_text(TextMode::Joined {
                separator: "\n",
                strip: false
            }),
            "Uno\n  \nDos\n  \nTres"
        );
        assert_eq!(
            p.extract_text(TextMode::Joined {
                separator: " ",
                strip: true
            }),
            "Uno Dos Tres"
        );
    }

    #[test]
    fn test_attribute_query() {
        let document = fragment(
            r#"<html><head><meta property="og:description" content="Hola"></head><body></body></html>"#,
        );
        let meta = document
            .root_element()
            .find(&NodeQuery::tag("meta").attr("property", "og:description"))
            .unwrap();
        assert_eq!(meta.attribute("content"), Some("Hola"));
    }
}
