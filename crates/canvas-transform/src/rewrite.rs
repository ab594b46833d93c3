//! Class-to-procedure rewriting.
//!
//! Each class block becomes a constructor procedure followed by one procedure
//! per method. Bodies go through a fixed list of local text substitutions so
//! they still run once detached from class and block scoping:
//! - `let` / `const` declarations become `var`
//! - type annotations, `as` casts and non-null assertions are dropped
//! - `[...xs]` copies become `xs.slice()`
//! - arrow callbacks with block bodies become `function` expressions
//!
//! Substitutions only touch code: string literals, template literals and
//! comments pass through unchanged. Arrow functions whose body mentions
//! `this` are left alone, since turning them into `function` expressions
//! would rebind `this`.

use crate::descriptor::{ProcedureDefinition, ProcedureKind};
use canvas_extract::{
    literal_ranges, matching_delimiter, ClassBlock, FieldInitializer, MemberKind, MethodBlock,
    TextSize,
};
use regex::{Captures, Regex};
use std::iter;
use std::sync::LazyLock;

/// Property initializers used when a class has neither a constructor nor
/// initialized properties.
const DEFAULT_INITIALIZER: &[(&str, &str)] = &[
    ("segments", "[]"),
    ("segmentCount", "30"),
    ("width", "100"),
];

/// A single regex substitution applied to procedure bodies.
struct Substitution {
    id: &'static str,
    regex: Regex,
    replacement: &'static str,
}

impl Substitution {
    fn new(id: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            id,
            regex: Regex::new(pattern).expect("substitution patterns are valid regexes"),
            replacement,
        }
    }

    /// Replaces matches outside literals and comments. Returns `None` when
    /// nothing changed.
    fn apply(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut changed = false;
        let mut code_start = 0;

        let end = text.len()..text.len();
        for literal in literal_ranges(text).into_iter().chain(iter::once(end)) {
            let code = &text[code_start..literal.start];
            let replaced = self.regex.replace_all(code, self.replacement);
            changed |= replaced != code;
            out.push_str(&replaced);
            out.push_str(&text[literal.clone()]);
            code_start = literal.end;
        }

        changed.then_some(out)
    }
}

static SUBSTITUTIONS: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    vec![
        Substitution::new(
            "typed-declaration",
            r"\b(?:let|const|var)(\s+)([A-Za-z_$][\w$]*)\s*:\s*[^=;\n]+?\s*=",
            "var${1}${2} =",
        ),
        Substitution::new(
            "typed-declaration-without-value",
            r"\b(?:let|const|var)(\s+)([A-Za-z_$][\w$]*)\s*:\s*[^=;\n]+;",
            "var${1}${2};",
        ),
        Substitution::new("block-scoped-declaration", r"(^|[^.\w$])(?:let|const)\b", "${1}var"),
        Substitution::new(
            "array-spread-copy",
            r"\[\s*\.\.\.\s*([A-Za-z_$][\w$.]*)\s*\]",
            "${1}.slice()",
        ),
        Substitution::new(
            "generic-constructor-call",
            r"\bnew\s+([A-Za-z_$][\w$.]*)\s*<[^<>()]*>\s*\(",
            "new ${1}(",
        ),
        Substitution::new(
            "as-cast",
            r"\s+as\s+(?:[A-Z][\w$.]*(?:<[^<>]*>)?|any|unknown|number|string|boolean|const)(?:\[\])*",
            "",
        ),
        Substitution::new("non-null-assertion", r"([\w$)\]])!([.;),\[])", "${1}${2}"),
    ]
});

static ARROW_WITH_PARENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([^()]*)\)\s*(?::\s*[\w$.<>\[\]]+\s*)?=>\s*\{")
        .expect("arrow pattern is valid")
});
static ARROW_SINGLE_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w$.])([A-Za-z_$][\w$]*)\s*=>\s*\{").expect("arrow pattern is valid")
});
static ARROW_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?:async\s+)?\(([^()]*)\)\s*(?::[^=]+)?=>\s*\{")
        .expect("arrow property pattern is valid")
});
static SUPER_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*super\s*\(.*\)\s*;?\s*$").expect("super pattern is valid"));
static PARAM_MODIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?:(?:public|private|protected|readonly|override)\s+)+")
        .expect("modifier pattern is valid")
});

/// A parsed parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Parameter {
    /// The parameter as emitted, `name` or `name = default`.
    text: String,
    name: String,
    /// A constructor parameter property (`constructor(private x)`).
    property: bool,
}

/// Rewrites every class into procedures, preserving source order.
pub fn rewrite_classes(classes: &[ClassBlock]) -> Vec<ProcedureDefinition> {
    let procedures: Vec<_> = classes.iter().flat_map(rewrite_class).collect();
    tracing::debug!(
        classes = classes.len(),
        procedures = procedures.len(),
        "rewrote class blocks"
    );
    procedures
}

/// Rewrites one class: the constructor first, then methods in source order.
///
/// Arrow-valued properties count as methods and keep their place among the
/// other methods.
pub fn rewrite_class(class: &ClassBlock) -> Vec<ProcedureDefinition> {
    let (arrow_methods, plain_fields): (Vec<&FieldInitializer>, Vec<&FieldInitializer>) = class
        .fields
        .iter()
        .partition(|field| ARROW_PROPERTY.is_match(&field.value));
    let (static_fields, instance_fields): (Vec<&FieldInitializer>, Vec<&FieldInitializer>) =
        plain_fields.into_iter().partition(|field| field.is_static);

    let mut members: Vec<(TextSize, ProcedureDefinition)> = class
        .methods
        .iter()
        .map(|method| (method.range.start(), method_procedure(class, method)))
        .collect();
    members.extend(arrow_methods.into_iter().filter_map(|field| {
        arrow_property_method(class, field).map(|procedure| (field.range.start(), procedure))
    }));
    members.extend(static_fields.into_iter().map(|field| {
        let procedure = ProcedureDefinition {
            owner: class.name.clone(),
            kind: ProcedureKind::StaticValue(field.name.clone()),
            is_static: true,
            params: Vec::new(),
            body: rewrite_body(&field.value),
        };
        (field.range.start(), procedure)
    }));
    members.sort_by_key(|(start, _)| *start);

    let mut procedures = vec![rewrite_constructor(class, &instance_fields)];
    procedures.extend(members.into_iter().map(|(_, procedure)| procedure));
    procedures
}

fn method_procedure(class: &ClassBlock, method: &MethodBlock) -> ProcedureDefinition {
    let name = method.name.clone();
    let kind = match method.kind {
        MemberKind::Method => ProcedureKind::Method(name),
        MemberKind::Getter => ProcedureKind::Getter(name),
        MemberKind::Setter => ProcedureKind::Setter(name),
    };
    ProcedureDefinition {
        owner: class.name.clone(),
        kind,
        is_static: method.is_static,
        params: parameter_texts(&method.params),
        body: rewrite_body(&method.body),
    }
}

fn rewrite_constructor(class: &ClassBlock, fields: &[&FieldInitializer]) -> ProcedureDefinition {
    let mut lines: Vec<String> = fields
        .iter()
        .map(|field| format!("this.{} = {};", field.name, rewrite_body(&field.value)))
        .collect();

    let params = match &class.constructor {
        Some(ctor) => constructor_lines(ctor, &mut lines),
        None if fields.is_empty() => {
            tracing::debug!(class = %class.name, "no initializer found, using default fields");
            lines.extend(
                DEFAULT_INITIALIZER
                    .iter()
                    .map(|(name, value)| format!("this.{} = {};", name, value)),
            );
            if class.defines("initialize") {
                lines.push("this.initialize();".to_string());
            }
            Vec::new()
        }
        None => Vec::new(),
    };

    ProcedureDefinition::constructor(class.name.clone(), params, lines.join("\n"))
}

/// Appends the constructor body to `lines` and returns the parameter list.
fn constructor_lines(ctor: &MethodBlock, lines: &mut Vec<String>) -> Vec<String> {
    let params = parse_params(&ctor.params);
    lines.extend(
        params
            .iter()
            .filter(|p| p.property)
            .map(|p| format!("this.{} = {};", p.name, p.name)),
    );

    let body = rewrite_body(&ctor.body);
    lines.extend(
        body.lines()
            .filter(|line| !SUPER_CALL.is_match(line))
            .map(str::to_string),
    );

    params.into_iter().map(|p| p.text).collect()
}

/// Turns `update = (time: number) => { ... }` into an `update` method.
fn arrow_property_method(
    class: &ClassBlock,
    field: &FieldInitializer,
) -> Option<ProcedureDefinition> {
    let header = ARROW_PROPERTY.captures(&field.value)?;
    let open = header.get(0)?.end() - 1;
    let close = matching_delimiter(&field.value, open)?;
    Some(ProcedureDefinition {
        owner: class.name.clone(),
        kind: ProcedureKind::Method(field.name.clone()),
        is_static: field.is_static,
        params: parameter_texts(&header[1]),
        body: rewrite_body(&field.value[open + 1..close]),
    })
}

/// Splits a raw parameter list and strips type annotations and modifiers.
pub fn parameter_texts(raw: &str) -> Vec<String> {
    parse_params(raw).into_iter().map(|p| p.text).collect()
}

fn parse_params(raw: &str) -> Vec<Parameter> {
    split_top_level(raw, b',')
        .into_iter()
        .filter_map(|piece| parse_param(piece.trim()))
        .collect()
}

fn parse_param(piece: &str) -> Option<Parameter> {
    if piece.is_empty() {
        return None;
    }

    let modifiers = PARAM_MODIFIERS.find(piece).map_or(0, |m| m.end());
    let property = modifiers > 0;
    let piece = &piece[modifiers..];

    let (head, default) = match top_level_assignment(piece) {
        Some(eq) => (&piece[..eq], Some(rewrite_body(piece[eq + 1..].trim()))),
        None => (piece, None),
    };

    let head = match top_level_colon(head) {
        Some(colon) => &head[..colon],
        None => head,
    };
    let name = head.trim().trim_end_matches('?').trim().to_string();
    if name.is_empty() {
        return None;
    }

    let text = match default {
        Some(default) => format!("{} = {}", name, default),
        None => name.clone(),
    };
    Some(Parameter {
        text,
        name,
        property,
    })
}

/// Splits on a separator that is outside brackets and strings.
fn split_top_level(raw: &str, separator: u8) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut quote: Option<u8> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q && (i == 0 || bytes[i - 1] != b'\\') {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'>' if i > 0 && bytes[i - 1] != b'=' => depth = depth.saturating_sub(1),
            _ if b == separator && depth == 0 => {
                pieces.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&raw[start..]);
    pieces
}

/// Finds a default-value `=` at depth zero (not `==`, `=>`, `<=`, ...).
fn top_level_assignment(piece: &str) -> Option<usize> {
    let bytes = piece.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'>' if i > 0 && bytes[i - 1] != b'=' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                let compound = matches!(prev, Some(b'=' | b'!' | b'<' | b'>'))
                    || matches!(next, Some(b'=' | b'>'));
                if !compound {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn top_level_colon(head: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in head.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' | b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Applies the body substitutions and normalizes indentation.
pub fn rewrite_body(raw: &str) -> String {
    let mut text = normalize_indentation(raw);
    for substitution in SUBSTITUTIONS.iter() {
        if let Some(rewritten) = substitution.apply(&text) {
            tracing::trace!(rule = substitution.id, "applied substitution");
            text = rewritten;
        }
    }
    rewrite_arrow_callbacks(&text)
}

/// Rewrites `(a, b) => {` and `a => {` into `function(a, b) {` when the
/// arrow body does not use `this`.
fn rewrite_arrow_callbacks(text: &str) -> String {
    let mut text = text.to_string();

    loop {
        let Some((start, end, replacement)) = next_arrow_rewrite(&text) else {
            break;
        };
        text.replace_range(start..end, &replacement);
    }
    text
}

/// Finds the first arrow header that can be rewritten, returning the header
/// range and its replacement.
fn next_arrow_rewrite(text: &str) -> Option<(usize, usize, String)> {
    let literals = literal_ranges(text);
    let in_literal = |offset: usize| literals.iter().any(|r| r.contains(&offset));
    let candidates = ARROW_WITH_PARENS
        .captures_iter(text)
        .map(|caps| arrow_candidate(&caps, 0, 1))
        .chain(
            ARROW_SINGLE_PARAM
                .captures_iter(text)
                .map(|caps| arrow_candidate(&caps, 2, 2)),
        );

    for (start, end, params) in candidates {
        let open = end - 1;
        if in_literal(start) || in_literal(open) {
            continue;
        }
        let Some(close) = matching_delimiter(text, open) else {
            continue;
        };
        if mentions_this(&text[open + 1..close]) {
            continue;
        }
        let replacement = format!("function({}) {{", parameter_texts(&params).join(", "));
        return Some((start, end, replacement));
    }
    None
}

/// Extracts `(header start, header end, raw params)` from an arrow match.
fn arrow_candidate(
    caps: &Captures<'_>,
    start_group: usize,
    params_group: usize,
) -> (usize, usize, String) {
    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let start = caps.get(start_group).map_or(whole.start, |m| m.start());
    let params = caps.get(params_group).map_or("", |m| m.as_str()).to_string();
    (start, whole.end, params)
}

fn mentions_this(body: &str) -> bool {
    body.match_indices("this")
        .any(|(i, _)| is_word_boundary(body, i) && is_word_boundary(body, i + 4))
}

fn is_word_boundary(text: &str, index: usize) -> bool {
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$';
    let bytes = text.as_bytes();
    let before = index.checked_sub(1).map(|i| bytes[i]);
    let at = bytes.get(index).copied();
    match (before, at) {
        (Some(a), Some(b)) => !(is_ident(a) && is_ident(b)),
        _ => true,
    }
}

/// Drops surrounding blank lines and the common indentation.
///
/// Text on the first line (right after the opening brace) is trimmed on its
/// own so `{ a();\n    b(); }` dedents by the indentation of `b();`.
fn normalize_indentation(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(first);
    let lines = &lines[first..=last];

    let starts_inline = first == 0 && raw.lines().next().is_some_and(|l| !l.trim().is_empty());
    let rest = if starts_inline { &lines[1..] } else { lines };
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation(l))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if line.trim().is_empty() {
                ""
            } else if i == 0 && starts_inline {
                line.trim()
            } else {
                strip_indent(line, indent)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Leading spaces and tabs, in bytes. Other whitespace counts as content.
fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn strip_indent(line: &str, indent: usize) -> &str {
    &line[indentation(line).min(indent)..]
}
