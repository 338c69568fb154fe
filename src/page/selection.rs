use kuchiki::NodeRef;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("range endpoint is not a text node")]
    NotATextNode,
    #[error("offset {offset} is past the end of a {len}-char text node")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("range crosses a node boundary")]
    CrossesNodeBoundary,
}

/// One end of a text range: a text node and a char offset into it.
#[derive(Debug, Clone)]
pub struct RangePoint {
    pub node: NodeRef,
    pub offset: usize,
}

impl RangePoint {
    pub fn new(node: NodeRef, offset: usize) -> Result<Self, SelectionError> {
        let len = {
            let text = node.as_text().ok_or(SelectionError::NotATextNode)?;
            text.borrow().chars().count()
        };
        if offset > len {
            return Err(SelectionError::OffsetOutOfRange { offset, len });
        }
        Ok(Self { node, offset })
    }
}

/// A selected run of text, the `window.getSelection()` range counterpart.
#[derive(Debug, Clone)]
pub struct TextRange {
    pub start: RangePoint,
    pub end: RangePoint,
}

impl TextRange {
    /// Reversed offsets within one node are normalized; cross-node order is
    /// taken as given.
    pub fn new(start: RangePoint, end: RangePoint) -> Self {
        if start.node == end.node && start.offset > end.offset {
            return Self {
                start: RangePoint {
                    node: start.node,
                    offset: end.offset,
                },
                end: RangePoint {
                    node: end.node,
                    offset: start.offset,
                },
            };
        }
        Self { start, end }
    }

    /// The selected text, also across node boundaries (document-order scan
    /// between the endpoints). A range built backwards reads the same as
    /// its forward twin.
    pub fn text(&self) -> String {
        if self.start.node == self.end.node {
            let content = borrow_text(&self.start.node);
            return slice_chars(&content, self.start.offset, self.end.offset).to_string();
        }

        let (first, last) = self.ordered();
        let mut collected = String::new();
        let mut started = false;
        for node in self.common_ancestor().inclusive_descendants() {
            if node == first.node {
                let content = borrow_text(&node);
                collected.push_str(suffix_chars(&content, first.offset));
                started = true;
                continue;
            }
            if node == last.node {
                if started {
                    let content = borrow_text(&node);
                    collected.push_str(slice_chars(&content, 0, last.offset));
                }
                break;
            }
            if started {
                if let Some(text) = node.as_text() {
                    collected.push_str(&text.borrow());
                }
            }
        }
        collected
    }

    /// Endpoints in document order; whichever node the scan reaches first
    /// is the effective start.
    fn ordered(&self) -> (&RangePoint, &RangePoint) {
        for node in self.common_ancestor().inclusive_descendants() {
            if node == self.start.node {
                return (&self.start, &self.end);
            }
            if node == self.end.node {
                return (&self.end, &self.start);
            }
        }
        (&self.start, &self.end)
    }

    /// Nearest common inclusive ancestor of the two endpoints.
    pub fn common_ancestor(&self) -> NodeRef {
        let start_chain: Vec<NodeRef> = self.start.node.inclusive_ancestors().collect();
        for candidate in self.end.node.inclusive_ancestors() {
            if start_chain.iter().any(|node| *node == candidate) {
                return candidate;
            }
        }
        self.start.node.clone()
    }

    /// The `Range.surroundContents` contract: split the text node and wrap
    /// the middle. A range spanning more than one node fails with
    /// `CrossesNodeBoundary` so callers can fall back.
    pub fn surround(&self, wrapper: &NodeRef) -> Result<(), SelectionError> {
        if self.start.node != self.end.node {
            return Err(SelectionError::CrossesNodeBoundary);
        }
        let node = &self.start.node;
        let cell = node.as_text().ok_or(SelectionError::NotATextNode)?;
        let content = cell.borrow().clone();

        let middle = slice_chars(&content, self.start.offset, self.end.offset).to_string();
        let prefix = slice_chars(&content, 0, self.start.offset).to_string();
        let suffix = suffix_chars(&content, self.end.offset).to_string();

        node.insert_after(wrapper.clone());
        wrapper.append(NodeRef::new_text(middle));
        if !suffix.is_empty() {
            wrapper.insert_after(NodeRef::new_text(suffix));
        }
        if prefix.is_empty() {
            node.detach();
        } else {
            *cell.borrow_mut() = prefix;
        }
        Ok(())
    }
}

/// The page's current selection.
#[derive(Debug, Default)]
pub struct SelectionState {
    current: Option<TextRange>,
}

impl SelectionState {
    pub fn set(&mut self, range: TextRange) {
        self.current = Some(range);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&TextRange> {
        self.current.as_ref()
    }
}

fn borrow_text(node: &NodeRef) -> String {
    node.as_text()
        .map(|text| text.borrow().clone())
        .unwrap_or_default()
}

fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(s.len()))
        .nth(chars)
        .unwrap_or(s.len())
}

fn slice_chars(s: &str, start: usize, end: usize) -> &str {
    &s[byte_index(s, start)..byte_index(s, end)]
}

fn suffix_chars(s: &str, start: usize) -> &str {
    &s[byte_index(s, start)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::document::{self, PageDocument};

    fn first_text_child(node: &NodeRef) -> NodeRef {
        node.children()
            .find(|child| child.as_text().is_some())
            .expect("text child")
    }

    #[test]
    fn rejects_offsets_past_the_node() {
        let doc = PageDocument::parse("<html><body><p id=\"p\">short</p></body></html>");
        let text = first_text_child(&doc.element_by_id("p").unwrap());
        assert_eq!(
            RangePoint::new(text, 9).unwrap_err(),
            SelectionError::OffsetOutOfRange { offset: 9, len: 5 }
        );
    }

    #[test]
    fn rejects_element_endpoints() {
        let doc = PageDocument::parse("<html><body><p id=\"p\">short</p></body></html>");
        let element = doc.element_by_id("p").unwrap();
        assert_eq!(
            RangePoint::new(element, 0).unwrap_err(),
            SelectionError::NotATextNode
        );
    }

    #[test]
    fn normalizes_reversed_offsets_in_one_node() {
        let doc = PageDocument::parse("<html><body><p id=\"p\">hello world</p></body></html>");
        let text = first_text_child(&doc.element_by_id("p").unwrap());
        let range = TextRange::new(
            RangePoint::new(text.clone(), 11).unwrap(),
            RangePoint::new(text, 6).unwrap(),
        );
        assert_eq!(range.text(), "world");
    }

    #[test]
    fn text_spans_node_boundaries() {
        let doc = PageDocument::parse(
            "<html><body><p id=\"p\">one <b id=\"b\">two</b> three</p></body></html>",
        );
        let p = doc.element_by_id("p").unwrap();
        let start = first_text_child(&p);
        let end = p
            .children()
            .filter(|child| child.as_text().is_some())
            .last()
            .unwrap();
        let range = TextRange::new(
            RangePoint::new(start, 0).unwrap(),
            RangePoint::new(end, 5).unwrap(),
        );
        assert_eq!(range.text(), "one two thre");
        assert_eq!(range.common_ancestor(), p);
    }

    #[test]
    fn reversed_cross_node_range_reads_forward() {
        let doc = PageDocument::parse(
            "<html><body><p id=\"p\">one <b>two</b> three</p></body></html>",
        );
        let p = doc.element_by_id("p").unwrap();
        let first = first_text_child(&p);
        let last = p
            .children()
            .filter(|child| child.as_text().is_some())
            .last()
            .unwrap();
        let backwards = TextRange::new(
            RangePoint::new(last, 5).unwrap(),
            RangePoint::new(first, 0).unwrap(),
        );
        assert_eq!(backwards.text(), "one two thre");
    }

    #[test]
    fn surround_splits_a_single_text_node() {
        let doc = PageDocument::parse("<html><body><p id=\"p\">hello world</p></body></html>");
        let text = first_text_child(&doc.element_by_id("p").unwrap());
        let range = TextRange::new(
            RangePoint::new(text.clone(), 6).unwrap(),
            RangePoint::new(text, 11).unwrap(),
        );
        let wrapper = document::create_element("span");
        range.surround(&wrapper).unwrap();
        assert_eq!(wrapper.text_contents(), "world");
        let html = doc.html().unwrap();
        assert!(html.contains("hello <span>world</span>"));
    }

    #[test]
    fn surround_at_node_start_drops_the_empty_prefix() {
        let doc = PageDocument::parse("<html><body><p id=\"p\">hello</p></body></html>");
        let text = first_text_child(&doc.element_by_id("p").unwrap());
        let range = TextRange::new(
            RangePoint::new(text.clone(), 0).unwrap(),
            RangePoint::new(text, 5).unwrap(),
        );
        let wrapper = document::create_element("span");
        range.surround(&wrapper).unwrap();
        assert!(doc.html().unwrap().contains("<p id=\"p\"><span>hello</span></p>"));
    }

    #[test]
    fn surround_refuses_cross_node_ranges() {
        let doc = PageDocument::parse(
            "<html><body><p id=\"p\">one <b>two</b> three</p></body></html>",
        );
        let p = doc.element_by_id("p").unwrap();
        let start = first_text_child(&p);
        let end = p
            .children()
            .filter(|child| child.as_text().is_some())
            .last()
            .unwrap();
        let range = TextRange::new(
            RangePoint::new(start, 0).unwrap(),
            RangePoint::new(end, 3).unwrap(),
        );
        let wrapper = document::create_element("span");
        assert_eq!(
            range.surround(&wrapper).unwrap_err(),
            SelectionError::CrossesNodeBoundary
        );
    }

    #[test]
    fn whitespace_only_selection_is_detectable() {
        let doc = PageDocument::parse("<html><body><p id=\"p\">a   b</p></body></html>");
        let text = first_text_child(&doc.element_by_id("p").unwrap());
        let range = TextRange::new(
            RangePoint::new(text.clone(), 1).unwrap(),
            RangePoint::new(text, 4).unwrap(),
        );
        assert!(range.text().trim().is_empty());
    }
}
