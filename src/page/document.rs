use std::io;

use html5ever::{namespace_url, ns, LocalName, QualName};
use kuchiki::traits::*;
use kuchiki::{parse_html, Attribute, ExpandedName, NodeRef};

/// Owns the parsed DOM for one page. Node identity is kuchiki pointer
/// equality, so handles stay valid across mutation.
pub struct PageDocument {
    root: NodeRef,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            root: parse_html().one(html),
        }
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Serialize the whole document back to HTML.
    pub fn html(&self) -> io::Result<String> {
        let mut bytes = Vec::new();
        self.root.serialize(&mut bytes)?;
        String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    pub fn body(&self) -> Option<NodeRef> {
        self.root
            .select_first("body")
            .ok()
            .map(|el| el.as_node().clone())
    }

    pub fn head(&self) -> Option<NodeRef> {
        self.root
            .select_first("head")
            .ok()
            .map(|el| el.as_node().clone())
    }

    /// First element in document order carrying `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.root.inclusive_descendants().find(|node| {
            node.as_element()
                .map_or(false, |el| el.attributes.borrow().get("id") == Some(id))
        })
    }

    /// Every element in document order. Collected so callers can mutate
    /// attributes while walking.
    pub fn elements(&self) -> Vec<NodeRef> {
        self.root
            .inclusive_descendants()
            .filter(|node| node.as_element().is_some())
            .collect()
    }
}

pub fn create_element(tag: &str) -> NodeRef {
    NodeRef::new_element(
        QualName::new(None, ns!(html), LocalName::from(tag)),
        Vec::<(ExpandedName, Attribute)>::new(),
    )
}

pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element()
        .map(|el| el.name.local.as_ref().to_ascii_lowercase())
}

pub fn get_attr(node: &NodeRef, name: &str) -> Option<String> {
    let element = node.as_element()?;
    let attributes = element.attributes.borrow();
    attributes.get(name).map(str::to_string)
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element
            .attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }
}

pub fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().remove(name);
    }
}

pub fn has_class(node: &NodeRef, class: &str) -> bool {
    get_attr(node, "class")
        .map_or(false, |list| list.split_whitespace().any(|c| c == class))
}

pub fn add_class(node: &NodeRef, class: &str) {
    if has_class(node, class) {
        return;
    }
    let list = match get_attr(node, "class") {
        Some(existing) if !existing.trim().is_empty() => format!("{existing} {class}"),
        _ => class.to_string(),
    };
    set_attr(node, "class", &list);
}

/// Drops `class` from the class list; the attribute itself goes away when
/// the list empties, so cleared pages serialize without a stray `class=""`.
pub fn remove_class(node: &NodeRef, class: &str) {
    let Some(existing) = get_attr(node, "class") else {
        return;
    };
    let remaining: Vec<&str> = existing
        .split_whitespace()
        .filter(|c| *c != class)
        .collect();
    if remaining.is_empty() {
        remove_attr(node, "class");
    } else {
        set_attr(node, "class", &remaining.join(" "));
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

fn format_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn style_property(node: &NodeRef, property: &str) -> Option<String> {
    let style = get_attr(node, "style")?;
    parse_style(&style)
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(property))
        .map(|(_, value)| value)
}

/// Updates one declaration in place; unrelated declarations keep their
/// order and an updated property keeps its slot.
pub fn set_style_property(node: &NodeRef, property: &str, value: &str) {
    let mut declarations = get_attr(node, "style")
        .map(|style| parse_style(&style))
        .unwrap_or_default();
    match declarations
        .iter_mut()
        .find(|(name, _)| name.eq_ignore_ascii_case(property))
    {
        Some(slot) => slot.1 = value.to_string(),
        None => declarations.push((property.to_string(), value.to_string())),
    }
    set_attr(node, "style", &format_style(&declarations));
}

pub fn remove_style_property(node: &NodeRef, property: &str) {
    let Some(style) = get_attr(node, "style") else {
        return;
    };
    let declarations: Vec<(String, String)> = parse_style(&style)
        .into_iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case(property))
        .collect();
    if declarations.is_empty() {
        remove_attr(node, "style");
    } else {
        set_attr(node, "style", &format_style(&declarations));
    }
}

/// Insert `wrapper` at `node`'s position and move `node` inside it.
pub fn wrap_node(node: &NodeRef, wrapper: &NodeRef) {
    node.insert_before(wrapper.clone());
    wrapper.append(node.clone());
}

/// Splice `wrapper`'s children into its place and detach the wrapper.
pub fn unwrap_node(wrapper: &NodeRef) {
    let children: Vec<NodeRef> = wrapper.children().collect();
    for child in children {
        wrapper.insert_before(child);
    }
    wrapper.detach();
}

/// Nearest inclusive ancestor element with the given tag name.
pub fn ancestor_with_tag(node: &NodeRef, tag: &str) -> Option<NodeRef> {
    node.inclusive_ancestors().find(|candidate| {
        candidate
            .as_element()
            .map_or(false, |el| el.name.local.as_ref().eq_ignore_ascii_case(tag))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_element_by_id() {
        let doc = PageDocument::parse(
            "<html><body><p id=\"a\">one</p><p id=\"a\">two</p></body></html>",
        );
        let found = doc.element_by_id("a").expect("element");
        assert_eq!(found.text_contents(), "one");
    }

    #[test]
    fn class_list_roundtrip() {
        let doc = PageDocument::parse("<html><body><p id=\"x\" class=\"lede\">t</p></body></html>");
        let node = doc.element_by_id("x").unwrap();
        add_class(&node, "mark");
        assert!(has_class(&node, "lede"));
        assert!(has_class(&node, "mark"));
        remove_class(&node, "mark");
        remove_class(&node, "lede");
        assert_eq!(get_attr(&node, "class"), None);
    }

    #[test]
    fn style_updates_preserve_unrelated_declarations() {
        let doc = PageDocument::parse(
            "<html><body><p id=\"x\" style=\"color: red; margin: 0\">t</p></body></html>",
        );
        let node = doc.element_by_id("x").unwrap();
        set_style_property(&node, "background-color", "rgba(255, 255, 0, 0.5)");
        set_style_property(&node, "color", "blue");
        assert_eq!(
            get_attr(&node, "style").unwrap(),
            "color: blue; margin: 0; background-color: rgba(255, 255, 0, 0.5)"
        );
        remove_style_property(&node, "background-color");
        remove_style_property(&node, "color");
        remove_style_property(&node, "margin");
        assert_eq!(get_attr(&node, "style"), None);
    }

    #[test]
    fn style_parsing_tolerates_odd_declarations() {
        let doc = PageDocument::parse(
            "<html><body><p id=\"x\" style=\";; color ; cursor: pointer;\">t</p></body></html>",
        );
        let node = doc.element_by_id("x").unwrap();
        assert_eq!(style_property(&node, "cursor").as_deref(), Some("pointer"));
        assert_eq!(style_property(&node, "color"), None);
    }

    #[test]
    fn wrap_then_unwrap_restores_structure() {
        let doc = PageDocument::parse("<html><body><p id=\"x\">t</p></body></html>");
        let before = doc.html().unwrap();
        let node = doc.element_by_id("x").unwrap();
        let wrapper = create_element("div");
        wrap_node(&node, &wrapper);
        assert_eq!(node.parent().as_ref(), Some(&wrapper));
        unwrap_node(&wrapper);
        assert_eq!(doc.html().unwrap(), before);
    }

    #[test]
    fn finds_link_ancestor() {
        let doc = PageDocument::parse(
            "<html><body><a href=\"/x\"><span id=\"inner\">go</span></a></body></html>",
        );
        let inner = doc.element_by_id("inner").unwrap();
        let anchor = ancestor_with_tag(&inner, "a").expect("anchor");
        assert_eq!(get_attr(&anchor, "href").as_deref(), Some("/x"));
        assert!(ancestor_with_tag(&inner, "button").is_none());
    }
}
