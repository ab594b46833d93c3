//! Class-block discovery.
//!
//! Finds `class Name { ... }` blocks anywhere in the input and splits each
//! body into property initializers, an optional constructor and methods.
//! Brace matching skips string literals, template literals and comments so a
//! `}` inside `'...'` does not close a block early. There is no grammar
//! behind this: the scanner is a best-effort reader for the subset of class
//! syntax animation components actually use.

use regex::Regex;
use smol_str::SmolStr;
use std::ops::Range;
use std::sync::LazyLock;
use text_size::{TextRange, TextSize};

static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bclass\s+([A-Za-z_$][\w$]*)(?:\s*<[^>{]*>)?(?:\s+extends\s+([A-Za-z_$][\w$.]*)(?:\s*<[^>{]*>)?)?(?:\s+implements\s+[^{]+?)?\s*\{",
    )
    .expect("class header pattern is valid")
});

static METHOD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\A((?:(?:public|private|protected|static|async|override|get|set)\s+)*)\*?\s*([A-Za-z_$#][\w$]*)\s*(?:<[^>()]*>)?\s*\(",
    )
    .expect("method header pattern is valid")
});

static RETURN_TYPE_THEN_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A\s*(?::[^{;=]+)?\{").expect("return type pattern is valid")
});

static PROPERTY_INITIALIZER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\A((?:(?:public|private|protected|readonly|static|declare|override)\s+)*)([A-Za-z_$#][\w$]*)\s*[?!]?\s*(?::[^=]+)?=([^>][\s\S]*)\z",
    )
    .expect("property initializer pattern is valid")
});

const NOT_METHOD_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "with",
];

/// A class-like definition found in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassBlock {
    /// The class name.
    pub name: SmolStr,
    /// The `extends` target, if any.
    pub extends: Option<SmolStr>,
    /// Range from the `class` keyword to the closing brace.
    pub range: TextRange,
    /// Property declarations that carry an initializer, in source order.
    pub fields: Vec<FieldInitializer>,
    /// The `constructor(...) { ... }` block, if present.
    pub constructor: Option<MethodBlock>,
    /// All other methods, in source order.
    pub methods: Vec<MethodBlock>,
}

impl ClassBlock {
    /// Whether the class has a method or initialized property with this name.
    pub fn defines(&self, member: &str) -> bool {
        self.methods.iter().any(|m| m.name == member) || self.fields.iter().any(|f| f.name == member)
    }
}

/// A class property with an initializer, e.g. `segmentCount: number = 30;`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldInitializer {
    pub name: SmolStr,
    /// The initializer expression, without the trailing semicolon.
    pub value: String,
    /// Declared with `static`.
    pub is_static: bool,
    /// Range of the whole declaration.
    pub range: TextRange,
}

/// How a method-like member is accessed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum MemberKind {
    #[default]
    Method,
    /// `get name() { ... }`
    Getter,
    /// `set name(value) { ... }`
    Setter,
}

/// A method-like block inside a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MethodBlock {
    pub name: SmolStr,
    pub kind: MemberKind,
    /// Declared with `static`.
    pub is_static: bool,
    /// Raw parameter list text between the parentheses.
    pub params: String,
    /// Raw body text between the braces.
    pub body: String,
    /// Range from the method name to the closing brace.
    pub range: TextRange,
}

/// Finds every class block in the input, in source order.
pub fn scan_classes(source: &str) -> Vec<ClassBlock> {
    let mut classes = Vec::new();
    let mut pos = 0;

    while let Some(caps) = CLASS_HEADER.captures_at(source, pos) {
        let Some(header) = caps.get(0) else {
            break;
        };
        let open = header.end() - 1;
        let Some(close) = matching_delimiter(source, open) else {
            tracing::debug!(offset = header.start(), "unterminated class body, skipping");
            pos = header.end();
            continue;
        };

        let mut class = ClassBlock {
            name: SmolStr::new(&caps[1]),
            extends: caps.get(2).map(|m| SmolStr::new(m.as_str())),
            range: range(header.start(), close + 1),
            fields: Vec::new(),
            constructor: None,
            methods: Vec::new(),
        };
        scan_body(source, open + 1, close, &mut class);
        tracing::debug!(
            class = %class.name,
            methods = class.methods.len(),
            fields = class.fields.len(),
            has_constructor = class.constructor.is_some(),
            "found class block"
        );
        classes.push(class);
        pos = close + 1;
    }

    classes
}

/// Walks a class body at depth zero, alternating between members.
fn scan_body(source: &str, start: usize, end: usize, class: &mut ClassBlock) {
    let mut pos = start;

    while pos < end {
        pos = skip_trivia(source, pos, end);
        if pos >= end {
            break;
        }

        if let Some((method, next)) = method_at(source, pos, end) {
            if method.name == "constructor" {
                if class.constructor.is_none() {
                    class.constructor = Some(method);
                }
            } else {
                class.methods.push(method);
            }
            pos = next;
            continue;
        }

        let statement_end = statement_end(source, pos, end);
        let statement = source[pos..statement_end].trim().trim_end_matches(';').trim();
        if let Some(field) = parse_initializer(statement, range(pos, statement_end)) {
            class.fields.push(field);
        }
        pos = statement_end + 1;
    }
}

/// Reads a method starting exactly at `pos`, returning it and the offset after its body.
fn method_at(source: &str, pos: usize, end: usize) -> Option<(MethodBlock, usize)> {
    let window = &source[pos..end];
    let caps = METHOD_HEADER.captures(window)?;
    let name = caps.get(2)?;
    if NOT_METHOD_NAMES.contains(&name.as_str()) {
        return None;
    }

    let paren_open = pos + caps.get(0)?.end() - 1;
    let paren_close = matching_delimiter(source, paren_open).filter(|&c| c < end)?;

    let after_params = &source[paren_close + 1..end];
    let body_header = RETURN_TYPE_THEN_BODY.find(after_params)?;
    let brace_open = paren_close + 1 + body_header.end() - 1;
    let brace_close = matching_delimiter(source, brace_open).filter(|&c| c < end)?;

    let modifiers: Vec<&str> = caps[1].split_whitespace().collect();
    let kind = if modifiers.contains(&"get") {
        MemberKind::Getter
    } else if modifiers.contains(&"set") {
        MemberKind::Setter
    } else {
        MemberKind::Method
    };

    let method = MethodBlock {
        name: SmolStr::new(name.as_str().trim_start_matches('#')),
        kind,
        is_static: modifiers.contains(&"static"),
        params: source[paren_open + 1..paren_close].to_string(),
        body: source[brace_open + 1..brace_close].to_string(),
        range: range(pos + name.start(), brace_close + 1),
    };
    Some((method, brace_close + 1))
}

fn parse_initializer(statement: &str, range: TextRange) -> Option<FieldInitializer> {
    let caps = PROPERTY_INITIALIZER.captures(statement)?;
    let value = caps[3].trim();
    if value.is_empty() {
        return None;
    }
    Some(FieldInitializer {
        name: SmolStr::new(caps[2].trim_start_matches('#')),
        value: value.to_string(),
        is_static: caps[1].split_whitespace().any(|m| m == "static"),
        range,
    })
}

/// Skips whitespace, comments and stray semicolons.
fn skip_trivia(source: &str, mut pos: usize, end: usize) -> usize {
    let bytes = source.as_bytes();
    while pos < end {
        match bytes[pos] {
            b' ' | b'\t' | b'\r' | b'\n' | b';' => pos += 1,
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = source[pos..end].find('\n').map_or(end, |n| pos + n + 1);
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos = source[pos + 2..end].find("*/").map_or(end, |n| pos + 2 + n + 2);
            }
            // Decorators are dropped along with their argument list.
            b'@' => {
                pos += 1;
                while pos < end
                    && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'_' | b'$' | b'.'))
                {
                    pos += 1;
                }
                if bytes.get(pos) == Some(&b'(') {
                    pos = matching_delimiter(source, pos).map_or(end, |c| c + 1);
                }
            }
            _ => break,
        }
    }
    pos
}

/// Finds the end of a property statement: a `;` or newline outside any nesting.
fn statement_end(source: &str, start: usize, end: usize) -> usize {
    let bytes = source.as_bytes();
    let mut pos = start;
    let mut depth = 0usize;

    while pos < end {
        match bytes[pos] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'\'' | b'"' | b'`' => {
                pos = skip_string(source, pos).unwrap_or(end);
                continue;
            }
            b';' if depth == 0 => return pos,
            b'\n' if depth == 0 => {
                // A line ending in an operator continues on the next line.
                let line = source[start..pos].trim_end();
                if !line.ends_with('=') && !line.ends_with(',') && !line.ends_with("=>") {
                    return pos;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    end
}

/// Returns the index of the delimiter closing the one at `open`.
///
/// Handles `{}`, `()` and `[]`, skipping strings, template literals (with
/// nested `${}` expressions) and comments.
pub fn matching_delimiter(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let (opener, closer) = match bytes.get(open)? {
        b'{' => (b'{', b'}'),
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        _ => return None,
    };

    let mut depth = 0usize;
    let mut pos = open;
    while pos < bytes.len() {
        let b = bytes[pos];
        match b {
            b'\'' | b'"' | b'`' => {
                pos = skip_string(source, pos)?;
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = source[pos..].find('\n').map_or(bytes.len(), |n| pos + n + 1);
                continue;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos = source[pos + 2..].find("*/").map(|n| pos + 2 + n + 2)?;
                continue;
            }
            _ if b == opener => depth += 1,
            _ if b == closer => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Returns the byte ranges of string literals, template literals and
/// comments, in source order.
///
/// Text outside these ranges is code. An unterminated literal runs to the
/// end of its line, or to the end of the input for templates and block
/// comments.
pub fn literal_ranges(source: &str) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let mut ranges = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let end = match bytes[pos] {
            b'\'' | b'"' | b'`' => skip_string(source, pos).unwrap_or(bytes.len()),
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                source[pos..].find('\n').map_or(bytes.len(), |n| pos + n)
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => source[pos + 2..]
                .find("*/")
                .map_or(bytes.len(), |n| pos + 2 + n + 2),
            _ => {
                pos += 1;
                continue;
            }
        };
        ranges.push(pos..end);
        pos = end.max(pos + 1);
    }
    ranges
}

/// Skips the string literal starting at `start`, returning the offset after it.
fn skip_string(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let quote = bytes[start];
    let mut pos = start + 1;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'$' if quote == b'`' && bytes.get(pos + 1) == Some(&b'{') => {
                pos = matching_delimiter(source, pos + 1)? + 1;
            }
            b'\n' if quote != b'`' => return Some(pos),
            b if b == quote => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

fn range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_line_class() {
        let classes =
            scan_classes("class Foo { constructor(){ this.x = 1; } move(dx){ this.x = this.x + dx; } }");
        assert_eq!(classes.len(), 1);
        let foo = &classes[0];
        assert_eq!(foo.name, "Foo");
        let ctor = foo.constructor.as_ref().unwrap();
        assert_eq!(ctor.body.trim(), "this.x = 1;");
        assert_eq!(foo.methods.len(), 1);
        assert_eq!(foo.methods[0].name, "move");
        assert_eq!(foo.methods[0].params, "dx");
        assert_eq!(foo.methods[0].body.trim(), "this.x = this.x + dx;");
    }

    #[test]
    fn test_typed_members() {
        let source = r#"
    class RibbonStrip {
      segments: RibbonSegment[] = [];
      segmentCount: number = 30;
      private label?: string;
      width = 100

      constructor() {
        this.initialize();
      }

      update(time: number): void {
        const t = time * 2;
      }

      draw(ctx: CanvasRenderingContext2D) {
        ctx.fillStyle = '}';
      }
    }
"#;
        let classes = scan_classes(source);
        assert_eq!(classes.len(), 1);
        let strip = &classes[0];
        let fields: Vec<_> = strip
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![("segments", "[]"), ("segmentCount", "30"), ("width", "100")]
        );
        let names: Vec<_> = strip.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["update", "draw"]);
        assert_eq!(strip.methods[0].params, "time: number");
        assert!(strip.methods[1].body.contains("'}'"));
        assert!(strip.defines("update"));
        assert!(strip.defines("segmentCount"));
        assert!(!strip.defines("initialize"));
    }

    #[test]
    fn test_multiple_classes_in_order() {
        let source = "class A { a() {} }\nfunction f() {}\nclass B extends A { b() {} }";
        let classes = scan_classes(source);
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(classes[1].extends.as_deref(), Some("A"));
    }

    #[test]
    fn test_nested_braces_and_template_literals() {
        let source = "class T { run() { const s = `${ {a: 1}.a }}`; if (x) { y(); } } after() {} }";
        let classes = scan_classes(source);
        let names: Vec<_> = classes[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["run", "after"]);
    }

    #[test]
    fn test_comments_between_members() {
        let source = "class C {\n  // draw() { not a method }\n  /* } */\n  draw() { paint(); }\n}";
        let classes = scan_classes(source);
        assert_eq!(classes[0].methods.len(), 1);
        assert_eq!(classes[0].methods[0].body.trim(), "paint();");
    }

    #[test]
    fn test_unterminated_class_is_skipped() {
        assert!(scan_classes("class Broken { draw() {").is_empty());
    }

    #[test]
    fn test_no_classes() {
        assert!(scan_classes("const x = 1;").is_empty());
        assert!(scan_classes("").is_empty());
    }

    #[test]
    fn test_accessor_and_static_modifiers() {
        let source = "class Dot {\n  get radius() { return this.r; }\n  set radius(v) { this.r = v; }\n  static create() { return new Dot(); }\n  get(key) { return key; }\n}";
        let classes = scan_classes(source);
        let members: Vec<_> = classes[0]
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m.kind, m.is_static))
            .collect();
        assert_eq!(
            members,
            vec![
                ("radius", MemberKind::Getter, false),
                ("radius", MemberKind::Setter, false),
                ("create", MemberKind::Method, true),
                ("get", MemberKind::Method, false),
            ]
        );
    }

    #[test]
    fn test_field_ranges_follow_source_order() {
        let source = "class W {\n  update = (t) => { step(t); };\n  draw(ctx) {}\n}";
        let class = &scan_classes(source)[0];
        assert_eq!(class.fields[0].name, "update");
        assert_eq!(&source[class.fields[0].range], "update = (t) => { step(t); }");
        assert!(class.fields[0].range.start() < class.methods[0].range.start());
        assert!(!class.fields[0].is_static);

        let class = &scan_classes("class C { static count = 0; private static seed: number = 7; }")[0];
        let statics: Vec<_> = class.fields.iter().map(|f| (f.name.as_str(), f.is_static)).collect();
        assert_eq!(statics, vec![("count", true), ("seed", true)]);
    }

    #[test]
    fn test_literal_ranges() {
        let source = "a('let', \"b\") // it's\nc(`x${'}'}y`) /* d */ e";
        let literals: Vec<_> = literal_ranges(source)
            .into_iter()
            .map(|r| &source[r])
            .collect();
        assert_eq!(
            literals,
            vec!["'let'", "\"b\"", "// it's", "`x${'}'}y`", "/* d */"]
        );
        assert!(literal_ranges("no literals here").is_empty());
        assert_eq!(literal_ranges("x = 'open\ny"), vec![4..9]);
    }

    #[test]
    fn test_matching_delimiter() {
        let source = "f(a, (b), ')') + 1";
        assert_eq!(matching_delimiter(source, 1), Some(13));
        assert_eq!(matching_delimiter(source, 0), None);
    }
}
