use super::markup::{Document, Element, ImportDecl, Node, Segment};
use super::MarkupError;
use regex::Regex;
use std::sync::OnceLock;

fn default_function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^export\s+default\s+(?:async\s+)?function\b").expect("valid regex"))
}

/// Byte-level walker over TSX source. Only ASCII delimiters are ever used as
/// slice boundaries, and the top-level loop advances a whole char at a time,
/// so every slice lands on a char boundary.
struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
        }
    }

    fn at(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    fn skip_ws(&self, mut pos: usize) -> usize {
        while self.at(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        pos
    }

    fn skip_string(&self, start: usize) -> Result<usize, MarkupError> {
        let quote = self.bytes[start];
        let mut i = start + 1;
        while let Some(b) = self.at(i) {
            match b {
                b'\\' => i += 2,
                b if b == quote => return Ok(i + 1),
                _ => i += 1,
            }
        }
        Err(MarkupError::Unterminated("string", start))
    }

    fn skip_template(&self, start: usize) -> Result<usize, MarkupError> {
        let mut i = start + 1;
        while let Some(b) = self.at(i) {
            match b {
                b'\\' => i += 2,
                b'`' => return Ok(i + 1),
                b'$' if self.at(i + 1) == Some(b'{') => i = self.matching(i + 1)?,
                _ => i += 1,
            }
        }
        Err(MarkupError::Unterminated("template literal", start))
    }

    fn skip_comment(&self, start: usize) -> Result<usize, MarkupError> {
        if self.at(start + 1) == Some(b'/') {
            let end = self.src[start..].find('\n').map(|n| start + n).unwrap_or(self.src.len());
            return Ok(end);
        }
        match self.src[start + 2..].find("*/") {
            Some(n) => Ok(start + 2 + n + 2),
            None => Err(MarkupError::Unterminated("comment", start)),
        }
    }

    /// Whether a `<` at `pos` opens markup rather than comparing or
    /// starting a type argument list.
    fn markup_starts(&self, pos: usize) -> bool {
        let next_ok = self
            .at(pos + 1)
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'>');
        if !next_ok {
            return false;
        }
        let mut i = pos;
        while i > 0 && self.bytes[i - 1].is_ascii_whitespace() {
            i -= 1;
        }
        if i == 0 {
            return true;
        }
        let prev = self.bytes[i - 1];
        if b"(,?:=>&|{[;!".contains(&prev) {
            return true;
        }
        if is_word(prev) {
            let end = i;
            while i > 0 && is_word(self.bytes[i - 1]) {
                i -= 1;
            }
            return matches!(&self.src[i..end], "return" | "yield" | "default");
        }
        false
    }

    /// Skips a string, template, comment or markup element at `pos`.
    fn skip_atom(&self, pos: usize) -> Result<Option<usize>, MarkupError> {
        let end = match self.bytes[pos] {
            b'"' | b'\'' => self.skip_string(pos)?,
            b'`' => self.skip_template(pos)?,
            b'/' if matches!(self.at(pos + 1), Some(b'/') | Some(b'*')) => self.skip_comment(pos)?,
            b'<' if self.markup_starts(pos) => self.parse_element(pos)?.1,
            _ => return Ok(None),
        };
        Ok(Some(end))
    }

    /// Position just past the bracket matching the one at `open`.
    fn matching(&self, open: usize) -> Result<usize, MarkupError> {
        let (opener, closer) = match self.bytes[open] {
            b'(' => (b'(', b')'),
            b'[' => (b'[', b']'),
            _ => (b'{', b'}'),
        };
        let mut depth = 0usize;
        let mut i = open;
        while i < self.bytes.len() {
            if let Some(end) = self.skip_atom(i)? {
                i = end;
                continue;
            }
            let b = self.bytes[i];
            if b == opener {
                depth += 1;
            } else if b == closer {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            i += 1;
        }
        Err(MarkupError::Unterminated("bracket", open))
    }

    fn parse_element(&self, start: usize) -> Result<(Element, usize), MarkupError> {
        let mut i = start + 1;
        while self
            .at(i)
            .is_some_and(|b| is_word(b) || b == b'.' || b == b':' || b == b'-')
        {
            i += 1;
        }
        let name = self.src[start + 1..i].to_string();

        loop {
            match self.at(i) {
                None => return Err(MarkupError::Unterminated("tag", start)),
                Some(b'"') | Some(b'\'') => i = self.skip_string(i)?,
                Some(b'{') => i = self.matching(i)?,
                Some(b'/') if self.at(i + 1) == Some(b'>') => {
                    let end = i + 2;
                    let element = Element {
                        name,
                        open_tag: self.src[start..end].to_string(),
                        children: Vec::new(),
                        close_tag: None,
                    };
                    return Ok((element, end));
                }
                Some(b'>') => {
                    i += 1;
                    break;
                }
                Some(_) => i += 1,
            }
        }
        let open_tag = self.src[start..i].to_string();

        let mut children = Vec::new();
        loop {
            match self.at(i) {
                None => return Err(MarkupError::Unterminated("element", start)),
                Some(b'<') if self.at(i + 1) == Some(b'/') => {
                    let close_end = self.src[i..]
                        .find('>')
                        .map(|n| i + n + 1)
                        .ok_or(MarkupError::Unterminated("closing tag", i))?;
                    let close_tag = self.src[i..close_end].to_string();
                    let found = close_tag[2..close_tag.len() - 1].trim();
                    if found != name {
                        return Err(MarkupError::MismatchedClose {
                            expected: name,
                            found: found.to_string(),
                        });
                    }
                    let element = Element {
                        name,
                        open_tag,
                        children,
                        close_tag: Some(close_tag),
                    };
                    return Ok((element, close_end));
                }
                Some(b'<') => {
                    let (child, end) = self.parse_element(i)?;
                    children.push(Node::Element(child));
                    i = end;
                }
                Some(b'{') => {
                    let end = self.matching(i)?;
                    children.push(Node::Expression(self.src[i..end].to_string()));
                    i = end;
                }
                Some(_) => {
                    let end = self.src[i..]
                        .find(['<', '{'])
                        .map(|n| i + n)
                        .unwrap_or(self.src.len());
                    children.push(Node::Text(self.src[i..end].to_string()));
                    i = end;
                }
            }
        }
    }

    /// Start of the markup returned last at the top level of the function
    /// body spanning `body_open..body_end`.
    fn returned_markup(&self, body_open: usize, body_end: usize) -> Result<Option<usize>, MarkupError> {
        let mut depth = 0usize;
        let mut last_return = None;
        let mut i = body_open + 1;
        while i < body_end - 1 {
            if let Some(end) = self.skip_atom(i)? {
                i = end;
                continue;
            }
            let b = self.bytes[i];
            match b {
                b'{' | b'(' | b'[' => depth += 1,
                b'}' | b')' | b']' => depth = depth.saturating_sub(1),
                _ if is_word(b) => {
                    let start = i;
                    while self.at(i).is_some_and(is_word) {
                        i += 1;
                    }
                    if depth == 0 && &self.src[start..i] == "return" {
                        last_return = Some(i);
                    }
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        let Some(after) = last_return else {
            return Ok(None);
        };
        let mut i = self.skip_ws(after);
        if self.at(i) == Some(b'(') {
            i = self.skip_ws(i + 1);
        }
        Ok((self.at(i) == Some(b'<')).then_some(i))
    }

    /// Locates the default-exported function starting at `pos`: its root
    /// markup, the markup span, and the end of the function.
    fn default_component(&self, pos: usize) -> Result<(Element, (usize, usize), usize), MarkupError> {
        let params = self.src[pos..]
            .find('(')
            .map(|n| pos + n)
            .ok_or(MarkupError::NoRootMarkup)?;
        let after_params = self.matching(params)?;
        let body_open = self.src[after_params..]
            .find('{')
            .map(|n| after_params + n)
            .ok_or(MarkupError::NoRootMarkup)?;
        let body_end = self.matching(body_open)?;
        let start = self
            .returned_markup(body_open, body_end)?
            .ok_or(MarkupError::NoRootMarkup)?;
        let (root, end) = self.parse_element(start)?;
        Ok((root, (start, end), end.max(body_end)))
    }

    fn line_start(&self, pos: usize) -> bool {
        self.src[..pos]
            .rsplit('\n')
            .next()
            .is_some_and(|line| line.trim().is_empty())
    }

    fn keyword_at(&self, pos: usize, word: &str) -> bool {
        self.src[pos..].starts_with(word)
            && !self.at(pos + word.len()).is_some_and(is_word)
            && (pos == 0 || !is_word(self.bytes[pos - 1]))
    }

    /// Import statement at `pos`: its end and module specifier. `None` for
    /// dynamic `import(...)`.
    fn import_statement(&self, pos: usize) -> Result<Option<(usize, String)>, MarkupError> {
        let mut i = pos + "import".len();
        while let Some(b) = self.at(i) {
            match b {
                b'(' => return Ok(None),
                b'"' | b'\'' => {
                    let end = self.skip_string(i)?;
                    let source = self.src[i + 1..end - 1].to_string();
                    let end = if self.at(end) == Some(b';') { end + 1 } else { end };
                    return Ok(Some((end, source)));
                }
                _ => i += 1,
            }
        }
        Err(MarkupError::Unterminated("import", pos))
    }
}

pub fn parse_document(src: &str) -> Result<Document, MarkupError> {
    let scanner = Scanner::new(src);
    let bytes = src.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut depth = 0usize;
    let mut seen_code = false;
    let mut root_found = false;
    let mut i = 0;

    let flush = |segments: &mut Vec<Segment>, from: usize, to: usize| {
        if to > from {
            segments.push(Segment::Source(src[from..to].to_string()));
        }
    };

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if depth == 0 && scanner.line_start(i) {
            if !seen_code && (b == b'"' || b == b'\'') {
                let end = scanner.skip_string(i)?;
                if src[i + 1..end - 1].starts_with("use ") {
                    let end = if scanner.at(end) == Some(b';') { end + 1 } else { end };
                    flush(&mut segments, text_start, i);
                    segments.push(Segment::Directive(src[i..end].to_string()));
                    i = end;
                    text_start = end;
                    continue;
                }
            }
            if scanner.keyword_at(i, "import") {
                if let Some((end, source)) = scanner.import_statement(i)? {
                    flush(&mut segments, text_start, i);
                    segments.push(Segment::Import(ImportDecl {
                        raw: src[i..end].to_string(),
                        source,
                    }));
                    seen_code = true;
                    i = end;
                    text_start = end;
                    continue;
                }
            }
            if !root_found && default_function_re().is_match(&src[i..]) {
                let (root, (start, root_end), end) = scanner.default_component(i)?;
                flush(&mut segments, text_start, start);
                segments.push(Segment::Root(root));
                root_found = true;
                seen_code = true;
                text_start = root_end;
                i = end;
                continue;
            }
        }

        if let Some(end) = scanner.skip_atom(i)? {
            if !(b == b'/' && matches!(scanner.at(i + 1), Some(b'/') | Some(b'*'))) {
                seen_code = true;
            }
            i = end;
            continue;
        }
        seen_code = true;
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += src[i..].chars().next().map_or(1, char::len_utf8);
    }
    flush(&mut segments, text_start, src.len());

    if !root_found {
        return Err(MarkupError::NoRootMarkup);
    }
    Ok(Document { segments })
}
