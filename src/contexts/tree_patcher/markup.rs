use super::MarkupError;

/// A parsed composition file: the top-level pieces that matter for patching,
/// with everything else kept verbatim so rendering reproduces the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(super) segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Untouched source text.
    Source(String),
    /// A prologue directive such as `"use client"`.
    Directive(String),
    Import(ImportDecl),
    /// The markup returned by the default-exported component.
    Root(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub raw: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// `{...}` child, verbatim.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub open_tag: String,
    pub children: Vec<Node>,
    /// `None` for self-closing elements.
    pub close_tag: Option<String>,
}

impl Element {
    pub fn self_closing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            open_tag: format!("<{} />", name),
            children: Vec::new(),
            close_tag: None,
        }
    }

    pub fn render_into(&self, out: &mut String) {
        out.push_str(&self.open_tag);
        for child in &self.children {
            match child {
                Node::Element(e) => e.render_into(out),
                Node::Text(t) | Node::Expression(t) => out.push_str(t),
            }
        }
        if let Some(close) = &self.close_tag {
            out.push_str(close);
        }
    }

    fn is_heading(&self) -> bool {
        let b = self.name.as_bytes();
        b.len() == 2 && b[0] == b'h' && (b'1'..=b'6').contains(&b[1])
    }

    /// Concatenated text children with whitespace collapsed.
    fn direct_text(&self) -> String {
        let joined: String = self
            .children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        joined.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn has_heading(&self, title: &str) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(e) => {
                (e.is_heading() && e.direct_text().eq_ignore_ascii_case(title)) || e.has_heading(title)
            }
            _ => false,
        })
    }

    fn remove_section(&mut self, title: &str) -> bool {
        for i in 0..self.children.len() {
            let Node::Element(child) = &mut self.children[i] else {
                continue;
            };
            if child.remove_section(title) {
                return true;
            }
            if child.name == "section" && child.has_heading(title) {
                self.children.remove(i);
                if i > 0 && matches!(&self.children[i - 1], Node::Text(t) if t.trim().is_empty()) {
                    self.children.remove(i - 1);
                }
                return true;
            }
        }
        false
    }

    fn contains(&self, name: &str) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(e) => e.name == name || e.contains(name),
            _ => false,
        })
    }

    fn child_indent(&self) -> String {
        match self.children.first() {
            Some(Node::Text(t)) if t.trim().is_empty() && t.contains('\n') => {
                t.rsplit('\n').next().unwrap_or("").to_string()
            }
            _ => "  ".to_string(),
        }
    }
}

impl Document {
    pub fn parse(src: &str) -> Result<Self, MarkupError> {
        super::scanner::parse_document(src)
    }

    /// Concatenates every piece back; an unmodified document renders to its
    /// exact input.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Source(s) | Segment::Directive(s) => out.push_str(s),
                Segment::Import(i) => out.push_str(&i.raw),
                Segment::Root(e) => e.render_into(&mut out),
            }
        }
        out
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Import(i) => Some(i),
            _ => None,
        })
    }

    /// First import whose module specifier is one of `sources`.
    pub fn find_import(&self, sources: &[String]) -> Option<&ImportDecl> {
        self.imports().find(|i| sources.iter().any(|s| *s == i.source))
    }

    /// Adds an import after the existing ones, or after the prologue
    /// directives when there are none.
    pub fn insert_import(&mut self, raw: &str, source: &str) {
        let decl = Segment::Import(ImportDecl {
            raw: raw.to_string(),
            source: source.to_string(),
        });
        let anchor = self
            .segments
            .iter()
            .rposition(|s| matches!(s, Segment::Import(_)))
            .or_else(|| {
                self.segments
                    .iter()
                    .rposition(|s| matches!(s, Segment::Directive(_)))
            });
        match anchor {
            Some(i) => {
                self.segments.insert(i + 1, Segment::Source("\n".to_string()));
                self.segments.insert(i + 2, decl);
            }
            None => {
                self.segments.insert(0, decl);
                self.segments.insert(1, Segment::Source("\n".to_string()));
            }
        }
    }

    pub fn root(&self) -> Option<&Element> {
        self.segments.iter().find_map(|s| match s {
            Segment::Root(e) => Some(e),
            _ => None,
        })
    }

    fn root_mut(&mut self) -> Option<&mut Element> {
        self.segments.iter_mut().find_map(|s| match s {
            Segment::Root(e) => Some(e),
            _ => None,
        })
    }

    /// Removes the nearest `section` enclosing a heading whose text equals
    /// `title` (ignoring case and whitespace runs).
    pub fn remove_section_by_heading(&mut self, title: &str) -> bool {
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        self.root_mut().is_some_and(|root| root.remove_section(&title))
    }

    pub fn contains_element(&self, name: &str) -> bool {
        self.root().is_some_and(|root| root.name == name || root.contains(name))
    }

    /// Adds `element` as the last child of the root markup, on its own line
    /// at the indentation of the existing children.
    pub fn append_to_root(&mut self, element: Element) -> Result<(), MarkupError> {
        let root = self.root_mut().ok_or(MarkupError::NoRootMarkup)?;
        if root.close_tag.is_none() {
            return Err(MarkupError::SelfClosingRoot(root.name.clone()));
        }
        let indent = root.child_indent();
        let trailing_ws = matches!(root.children.last(), Some(Node::Text(t)) if t.trim().is_empty());
        if trailing_ws {
            let at = root.children.len() - 1;
            root.children.insert(at, Node::Text(format!("\n{}", indent)));
            root.children.insert(at + 1, Node::Element(element));
        } else {
            root.children.push(Node::Text(format!("\n{}", indent)));
            root.children.push(Node::Element(element));
        }
        Ok(())
    }

    /// Quote character and trailing-semicolon habit of the existing imports.
    pub fn import_style(&self) -> (char, bool) {
        match self.imports().next() {
            Some(i) => {
                let quote = if i.raw.contains('"') { '"' } else { '\'' };
                (quote, i.raw.trim_end().ends_with(';'))
            }
            None => ('\'', true),
        }
    }
}
