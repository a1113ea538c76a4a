//! Minimal element tree that cards are built as and patched through before
//! being serialised to HTML.

use maud::Render;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    styles: Vec<(String, String)>,
    children: Vec<Node>,
}

const VOID_TAGS: &[&str] = &["img", "hr", "br", "input", "meta"];

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, names: &str) -> Self {
        for name in names.split_whitespace() {
            self.add_class(name);
        }
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn style(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_style(name, value);
        self
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.children.push(Node::Text(value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn children(mut self, items: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(items.into_iter().map(Node::Element));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn last_element_mut(&mut self) -> Option<&mut Element> {
        self.children.iter_mut().rev().find_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|class| class == name)
    }

    pub fn add_class(&mut self, name: &str) {
        if !self.has_class(name) {
            self.classes.push(name.to_string());
        }
    }

    pub fn remove_class(&mut self, name: &str) {
        self.classes.retain(|class| class != name);
    }

    pub fn get_style(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_style(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.styles.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.styles.push((name.to_string(), value)),
        }
    }

    pub fn remove_style(&mut self, name: &str) {
        self.styles.retain(|(key, _)| key != name);
    }

    pub fn is_hidden(&self) -> bool {
        self.get_style("display") == Some("none")
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, value: impl Into<String>) {
        self.children = vec![Node::Text(value.into())];
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(value) => out.push_str(value),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn element_children_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search including `self`.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.element_children().find_map(|child| child.find(pred))
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        self.element_children_mut()
            .find_map(|child| child.find_mut(pred))
    }

    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        if pred(self) {
            out.push(self);
        }
        for child in self.element_children() {
            child.find_all(pred, out);
        }
    }

    /// Visits `self` and every descendant, parents before children.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in self.element_children_mut() {
            child.visit_mut(f);
        }
    }

    pub fn by_class(&self, name: &str) -> Option<&Element> {
        self.find(&|element| element.has_class(name))
    }

    pub fn by_class_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.find_mut(&|element| element.has_class(name))
    }

    pub fn all_by_class(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.find_all(&|element| element.has_class(name), &mut out);
        out
    }

    pub fn by_id(&self, id: &str) -> Option<&Element> {
        self.find(&|element| element.get_attr("id") == Some(id))
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.find_mut(&|element| element.get_attr("id") == Some(id))
    }

    /// Removes matching direct children and returns how many were dropped.
    pub fn remove_children(&mut self, pred: &dyn Fn(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|child| match child {
            Node::Element(element) => !pred(element),
            Node::Text(_) => true,
        });
        before - self.children.len()
    }

    pub fn to_html(&self) -> String {
        self.render().into_string()
    }
}

impl Render for Element {
    fn render_to(&self, buffer: &mut String) {
        buffer.push('<');
        buffer.push_str(&self.tag);
        if !self.classes.is_empty() {
            buffer.push_str(" class=\"");
            self.classes.join(" ").render_to(buffer);
            buffer.push('"');
        }
        for (name, value) in &self.attrs {
            buffer.push(' ');
            buffer.push_str(name);
            buffer.push_str("=\"");
            value.render_to(buffer);
            buffer.push('"');
        }
        if !self.styles.is_empty() {
            let css: String = self
                .styles
                .iter()
                .map(|(name, value)| format!("{name}:{value};"))
                .collect();
            buffer.push_str(" style=\"");
            css.render_to(buffer);
            buffer.push('"');
        }
        buffer.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            match child {
                Node::Text(value) => value.render_to(buffer),
                Node::Element(element) => element.render_to(buffer),
            }
        }
        buffer.push_str("</");
        buffer.push_str(&self.tag);
        buffer.push('>');
    }
}
