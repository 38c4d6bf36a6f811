//! Parsed page tree and the queries the extractors run against it.
//!
//! The tree wraps [`scraper::Html`]. It is not `Send`, so it is built after
//! the last await point of a request and dropped before the response is
//! written.

use scraper::{ElementRef, Html};

/// Matches an element whose attribute value contains a substring.
///
/// Listing pages use generated class names such as
/// `app-informations__Title-sc-1x2y3z`, so the match is containment anywhere
/// in the value rather than equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrPattern<'p> {
    attribute: &'p str,
    needle: &'p str,
}

impl<'p> AttrPattern<'p> {
    /// Match on the `class` attribute.
    pub const fn class_contains(needle: &'p str) -> Self {
        Self {
            attribute: "class",
            needle,
        }
    }

    /// Match on an arbitrary attribute.
    pub const fn attr_contains(attribute: &'p str, needle: &'p str) -> Self {
        Self { attribute, needle }
    }

    /// The attribute this pattern inspects.
    pub const fn attribute(&self) -> &'p str {
        self.attribute
    }

    /// The substring this pattern looks for.
    pub const fn needle(&self) -> &'p str {
        self.needle
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        element
            .value()
            .attr(self.attribute)
            .is_some_and(|value| value.contains(self.needle))
    }
}

/// An in-memory tree of a fetched page.
#[derive(Debug)]
pub struct ParsedDocument {
    html: Html,
}

impl ParsedDocument {
    /// Parse a page body. HTML parsing is error-tolerant and never fails.
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// The document's root element.
    pub fn root(&self) -> Node<'_> {
        Node(self.html.root_element())
    }

    /// First element in document order with the given tag whose attribute
    /// matches the pattern.
    pub fn find(&self, tag: &str, pattern: &AttrPattern<'_>) -> Option<Node<'_>> {
        let root = self.root();
        std::iter::once(root)
            .chain(root.descendants())
            .find(|node| node.is(tag) && pattern.matches(&node.0))
    }
}

/// A borrowed element of a [`ParsedDocument`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    /// Lower-case tag name.
    pub fn name(&self) -> &'a str {
        self.0.value().name()
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    fn is(&self, tag: &str) -> bool {
        self.name().eq_ignore_ascii_case(tag)
    }

    /// Every descendant element in document order, excluding this one.
    pub fn descendants(&self) -> impl Iterator<Item = Node<'a>> {
        self.0
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(Node)
    }

    /// First descendant element with the given tag.
    pub fn find(&self, tag: &str) -> Option<Node<'a>> {
        self.descendants().find(|node| node.is(tag))
    }

    /// First element with the given tag that starts after this element's
    /// opening tag in document order.
    ///
    /// The walk covers this element's own descendants before moving on to
    /// whatever follows it, so chained calls visit matching elements one by
    /// one in the order they appear in the source.
    pub fn find_next(&self, tag: &str) -> Option<Node<'a>> {
        let id = self.0.id();
        self.0
            .tree()
            .root()
            .descendants()
            .skip_while(|node| node.id() != id)
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(Node)
            .find(|node| node.is(tag))
    }

    /// Concatenated text of this element and everything under it.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }
}
