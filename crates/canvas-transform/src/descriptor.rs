//! Descriptor and output types.

use smol_str::SmolStr;

/// The fully resolved description of one component, ready for generation.
///
/// Built fresh for each conversion by [`crate::resolve_descriptor`]; every
/// field is populated, either from the input or from a default.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ComponentDescriptor {
    /// Identifier-safe component name.
    pub name: String,
    /// Canvas width in pixels, always positive.
    pub canvas_width: u32,
    /// Canvas height in pixels, always positive.
    pub canvas_height: u32,
    /// Page and frame background color literal.
    pub background_color: String,
    /// The `id` of the canvas element the script draws into.
    pub canvas_id: String,
    /// Script file named by the input markup, kept verbatim.
    pub script_reference: Option<String>,
    /// Rewritten procedures in emission order.
    pub procedures: Vec<ProcedureDefinition>,
}

impl ComponentDescriptor {
    /// File name for the generated markup document.
    pub fn markup_file_name(&self) -> String {
        format!("{}.html", self.name.to_lowercase())
    }

    /// File name for the generated script document.
    pub fn script_file_name(&self) -> String {
        format!("{}.js", self.name.to_lowercase())
    }

    /// Owners in the order their first procedure appears.
    pub fn owners(&self) -> Vec<&str> {
        let mut owners: Vec<&str> = Vec::new();
        for procedure in &self.procedures {
            if !owners.contains(&procedure.owner.as_str()) {
                owners.push(procedure.owner.as_str());
            }
        }
        owners
    }

    /// Procedures attached to one owner, in emission order.
    pub fn procedures_of<'a>(
        &'a self,
        owner: &'a str,
    ) -> impl Iterator<Item = &'a ProcedureDefinition> + 'a {
        self.procedures.iter().filter(move |p| p.owner == owner)
    }

    /// Whether an owner has an instance method with the given name.
    pub fn owner_defines(&self, owner: &str, method: &str) -> bool {
        self.procedures_of(owner).any(|p| {
            !p.is_static && matches!(&p.kind, ProcedureKind::Method(name) if name == method)
        })
    }

    /// The owner the render loop instantiates.
    ///
    /// This is the last owner with an `update` or `draw` method, so helper
    /// classes declared before the animated one are not picked. Falls back to
    /// the last owner.
    pub fn primary_owner(&self) -> Option<&str> {
        let owners = self.owners();
        owners
            .iter()
            .rev()
            .find(|owner| {
                self.owner_defines(owner, "update") || self.owner_defines(owner, "draw")
            })
            .or_else(|| owners.last())
            .copied()
    }
}

/// What a procedure is to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ProcedureKind {
    /// The initializer, emitted as the owner's constructor function.
    Constructor,
    /// A plain method.
    Method(SmolStr),
    /// A property read accessor.
    Getter(SmolStr),
    /// A property write accessor.
    Setter(SmolStr),
    /// A static data property; the body holds its initializer expression.
    StaticValue(SmolStr),
}

/// One rewritten unit of behavior attached to an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProcedureDefinition {
    /// The class this procedure belongs to.
    pub owner: SmolStr,
    pub kind: ProcedureKind,
    /// Attached to the owner itself instead of its prototype.
    pub is_static: bool,
    /// Parameter names, with default values where the source had them.
    pub params: Vec<String>,
    /// Rewritten body, dedented, one statement line per line.
    pub body: String,
}

impl ProcedureDefinition {
    /// Creates a method procedure.
    pub fn method(
        owner: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        params: Vec<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            kind: ProcedureKind::Method(name.into()),
            is_static: false,
            params,
            body: body.into(),
        }
    }

    /// Creates a constructor procedure.
    pub fn constructor(
        owner: impl Into<SmolStr>,
        params: Vec<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            kind: ProcedureKind::Constructor,
            is_static: false,
            params,
            body: body.into(),
        }
    }

    /// The method name, `constructor` for initializers.
    pub fn method_name(&self) -> &str {
        match &self.kind {
            ProcedureKind::Constructor => "constructor",
            ProcedureKind::Method(name)
            | ProcedureKind::Getter(name)
            | ProcedureKind::Setter(name)
            | ProcedureKind::StaticValue(name) => name.as_str(),
        }
    }

    /// Whether this is a getter or setter.
    pub fn is_accessor(&self) -> bool {
        matches!(self.kind, ProcedureKind::Getter(_) | ProcedureKind::Setter(_))
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, ProcedureKind::Constructor)
    }
}

/// The two generated documents and their suggested file names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OutputArtifacts {
    pub markup_text: String,
    pub script_text: String,
    pub markup_file_name: String,
    pub script_file_name: String,
}

/// Turns a raw name (identifier, document title, ...) into a PascalCase
/// identifier.
///
/// Leading characters that cannot start an identifier are dropped; spaces,
/// `-`, `.` and `_` start a new word. Returns `None` when nothing usable is
/// left.
pub fn sanitize_identifier(raw: &str) -> Option<String> {
    let raw = raw.trim_start_matches(|c: char| !(c.is_ascii_alphabetic() || c == '$'));

    let mut result = String::with_capacity(raw.len());
    let mut capitalize_next = true;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '$' {
            if capitalize_next {
                result.push(c.to_ascii_uppercase());
                capitalize_next = false;
            } else {
                result.push(c);
            }
        } else if c.is_whitespace() || matches!(c, '-' | '.' | '_') {
            capitalize_next = true;
        }
    }

    (!result.is_empty()).then_some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_procedures(procedures: Vec<ProcedureDefinition>) -> ComponentDescriptor {
        ComponentDescriptor {
            name: "RibbonAnimation".to_string(),
            canvas_width: 550,
            canvas_height: 550,
            background_color: "#F0EEE6".to_string(),
            canvas_id: "animationCanvas".to_string(),
            script_reference: None,
            procedures,
        }
    }

    #[test]
    fn test_file_names() {
        let descriptor = with_procedures(Vec::new());
        assert_eq!(descriptor.markup_file_name(), "ribbonanimation.html");
        assert_eq!(descriptor.script_file_name(), "ribbonanimation.js");
    }

    #[test]
    fn test_owners_in_first_seen_order() {
        let descriptor = with_procedures(vec![
            ProcedureDefinition::constructor("Segment", vec![], ""),
            ProcedureDefinition::constructor("Strip", vec![], ""),
            ProcedureDefinition::method("Segment", "reset", vec![], ""),
        ]);
        assert_eq!(descriptor.owners(), vec!["Segment", "Strip"]);
        assert_eq!(descriptor.procedures_of("Segment").count(), 2);
    }

    #[test]
    fn test_primary_owner_prefers_animated_class() {
        let descriptor = with_procedures(vec![
            ProcedureDefinition::method("Strip", "update", vec!["time".into()], ""),
            ProcedureDefinition::constructor("Segment", vec![], ""),
        ]);
        assert_eq!(descriptor.primary_owner(), Some("Strip"));
    }

    #[test]
    fn test_primary_owner_falls_back_to_last() {
        let descriptor = with_procedures(vec![
            ProcedureDefinition::constructor("A", vec![], ""),
            ProcedureDefinition::constructor("B", vec![], ""),
        ]);
        assert_eq!(descriptor.primary_owner(), Some("B"));
        assert_eq!(with_procedures(vec![]).primary_owner(), None);
    }

    #[test]
    fn test_static_update_does_not_make_owner_animated() {
        let mut update = ProcedureDefinition::method("Factory", "update", vec![], "");
        update.is_static = true;
        let descriptor = with_procedures(vec![
            ProcedureDefinition::method("Strip", "draw", vec!["ctx".into()], ""),
            update,
        ]);
        assert!(!descriptor.owner_defines("Factory", "update"));
        assert_eq!(descriptor.primary_owner(), Some("Strip"));
    }

    #[test]
    fn test_method_name() {
        let ctor = ProcedureDefinition::constructor("Foo", vec![], "");
        let method = ProcedureDefinition::method("Foo", "move", vec!["dx".into()], "");
        assert_eq!(ctor.method_name(), "constructor");
        assert!(ctor.is_constructor());
        assert_eq!(method.method_name(), "move");
        assert!(!method.is_constructor());
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Foo").as_deref(), Some("Foo"));
        assert_eq!(
            sanitize_identifier("Ribbon Animation").as_deref(),
            Some("RibbonAnimation")
        );
        assert_eq!(
            sanitize_identifier("my-ribbon.fold").as_deref(),
            Some("MyRibbonFold")
        );
        assert_eq!(sanitize_identifier("3d waves").as_deref(), Some("DWaves"));
        assert_eq!(sanitize_identifier("+++"), None);
        assert_eq!(sanitize_identifier(""), None);
    }
}
