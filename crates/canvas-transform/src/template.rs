//! Markup and script generation.
//!
//! Both documents are plain text assembled from the descriptor. The script
//! wraps everything in a `DOMContentLoaded` handler, declares each owner as a
//! constructor function with prototype methods, and drives the primary owner
//! from a `requestAnimationFrame` loop. Getters and setters become
//! `Object.defineProperty` calls, and static members are assigned to the
//! owner itself.

use crate::descriptor::{ComponentDescriptor, OutputArtifacts, ProcedureDefinition, ProcedureKind};

/// Per-frame time increment fed to `update`.
pub const TIME_STEP: &str = "0.00125";

const BODY_INDENT: &str = "        ";
const ACCESSOR_BODY_INDENT: &str = "            ";

/// Options for document generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Read `bg` and `transparent` from the page URL to override the
    /// background at runtime.
    pub url_overrides: bool,
}

/// Renders both documents for a descriptor.
pub fn generate(descriptor: &ComponentDescriptor, options: &TemplateOptions) -> OutputArtifacts {
    let script_file_name = descriptor.script_file_name();
    let script_src = descriptor
        .script_reference
        .as_deref()
        .unwrap_or(&script_file_name);

    OutputArtifacts {
        markup_text: render_markup(descriptor, script_src),
        script_text: render_script(descriptor, options),
        markup_file_name: descriptor.markup_file_name(),
        script_file_name,
    }
}

/// Renders the markup document that hosts the canvas.
pub fn render_markup(descriptor: &ComponentDescriptor, script_src: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            margin: 0;
            padding: 0;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            background: {background};
            overflow: hidden;
        }}

        canvas {{
            display: block;
        }}
    </style>
</head>
<body>
    <canvas id="{canvas_id}" width="{width}" height="{height}"></canvas>
    <script src="{script_src}"></script>
</body>
</html>
"#,
        title = descriptor.name,
        background = descriptor.background_color,
        canvas_id = escape_attribute(&descriptor.canvas_id),
        width = descriptor.canvas_width,
        height = descriptor.canvas_height,
        script_src = escape_attribute(script_src),
    )
}

/// Renders the script document.
pub fn render_script(descriptor: &ComponentDescriptor, options: &TemplateOptions) -> String {
    let mut out = String::new();
    let background = escape_js_string(&descriptor.background_color);

    out.push_str(&format!(
        "// {} - standalone canvas animation\n",
        descriptor.name
    ));
    out.push_str("document.addEventListener('DOMContentLoaded', function() {\n");
    out.push_str(&format!(
        "    var canvas = document.getElementById('{}');\n",
        escape_js_string(&descriptor.canvas_id)
    ));
    out.push_str("    if (!canvas) return;\n\n");
    out.push_str("    var ctx = canvas.getContext('2d');\n");
    out.push_str("    if (!ctx) return;\n\n");
    out.push_str(&format!("    canvas.width = {};\n", descriptor.canvas_width));
    out.push_str(&format!("    canvas.height = {};\n", descriptor.canvas_height));

    if options.url_overrides {
        render_url_overrides(&mut out, &background);
    }

    for owner in descriptor.owners() {
        render_owner(&mut out, descriptor, owner);
    }

    if let Some(primary) = descriptor.primary_owner() {
        render_loop(&mut out, descriptor, primary, &background, options);
    }

    out.push_str("});\n");
    out
}

fn render_url_overrides(out: &mut String, background: &str) {
    out.push_str("\n    var config = {\n");
    out.push_str(&format!("        backgroundColor: '{background}',\n"));
    out.push_str("        transparentBackground: false\n");
    out.push_str("    };\n\n");
    out.push_str("    var urlParams = new URLSearchParams(window.location.search);\n");
    out.push_str("    if (urlParams.has('bg')) {\n");
    out.push_str("        config.backgroundColor = '#' + urlParams.get('bg');\n");
    out.push_str("        document.body.style.background = config.backgroundColor;\n");
    out.push_str("    }\n");
    out.push_str("    if (urlParams.get('transparent') === 'true') {\n");
    out.push_str("        config.transparentBackground = true;\n");
    out.push_str("        document.body.style.background = 'transparent';\n");
    out.push_str("    }\n");
}

fn render_owner(out: &mut String, descriptor: &ComponentDescriptor, owner: &str) {
    let procedures: Vec<&ProcedureDefinition> = descriptor.procedures_of(owner).collect();

    out.push_str(&format!("\n    // {owner} definition\n"));
    match procedures.iter().find(|p| p.is_constructor()) {
        Some(ctor) => render_function(out, &format!("var {owner}"), ctor),
        None => out.push_str(&format!("    var {owner} = function() {{}};\n")),
    }

    let mut defined_properties: Vec<(&str, bool)> = Vec::new();
    for method in procedures.iter().filter(|p| !p.is_constructor()) {
        let name = method.method_name();
        if method.is_accessor() {
            if defined_properties.contains(&(name, method.is_static)) {
                continue;
            }
            defined_properties.push((name, method.is_static));
            out.push('\n');
            render_property(out, owner, name, method.is_static, &procedures);
            continue;
        }

        out.push('\n');
        if let ProcedureKind::StaticValue(_) = method.kind {
            render_static_value(out, owner, method);
            continue;
        }
        let target = if method.is_static {
            format!("{owner}.{name}")
        } else {
            format!("{owner}.prototype.{name}")
        };
        render_function(out, &target, method);
    }
}

fn render_function(out: &mut String, target: &str, procedure: &ProcedureDefinition) {
    let params = procedure.params.join(", ");
    if procedure.body.trim().is_empty() {
        out.push_str(&format!("    {target} = function({params}) {{}};\n"));
        return;
    }

    out.push_str(&format!("    {target} = function({params}) {{\n"));
    push_body(out, &procedure.body, BODY_INDENT);
    out.push_str("    };\n");
}

/// Emits one `Object.defineProperty` call holding every getter and setter
/// declared for `name`.
fn render_property(
    out: &mut String,
    owner: &str,
    name: &str,
    is_static: bool,
    procedures: &[&ProcedureDefinition],
) {
    let target = if is_static {
        owner.to_string()
    } else {
        format!("{owner}.prototype")
    };
    out.push_str(&format!(
        "    Object.defineProperty({target}, '{}', {{\n",
        escape_js_string(name)
    ));

    let accessors = procedures
        .iter()
        .filter(|p| p.is_accessor() && p.is_static == is_static && p.method_name() == name);
    for accessor in accessors {
        let key = match accessor.kind {
            ProcedureKind::Setter(_) => "set",
            _ => "get",
        };
        let params = accessor.params.join(", ");
        if accessor.body.trim().is_empty() {
            out.push_str(&format!("        {key}: function({params}) {{}},\n"));
            continue;
        }
        out.push_str(&format!("        {key}: function({params}) {{\n"));
        push_body(out, &accessor.body, ACCESSOR_BODY_INDENT);
        out.push_str("        },\n");
    }

    out.push_str("        configurable: true\n");
    out.push_str("    });\n");
}

fn render_static_value(out: &mut String, owner: &str, procedure: &ProcedureDefinition) {
    let mut lines = procedure.body.lines();
    let first = lines.next().unwrap_or("undefined");
    out.push_str(&format!("    {owner}.{} = {first}", procedure.method_name()));
    for line in lines {
        out.push_str("\n    ");
        out.push_str(line);
    }
    out.push_str(";\n");
}

fn push_body(out: &mut String, body: &str, indent: &str) {
    for line in body.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(indent);
            out.push_str(line);
            out.push('\n');
        }
    }
}

fn render_loop(
    out: &mut String,
    descriptor: &ComponentDescriptor,
    primary: &str,
    background: &str,
    options: &TemplateOptions,
) {
    out.push_str("\n    // Animation loop\n");
    out.push_str(&format!("    var animation = new {primary}();\n"));
    out.push_str("    var time = 0;\n");
    out.push_str("    var animationFrameId;\n\n");
    out.push_str("    function animate() {\n");

    if options.url_overrides {
        out.push_str("        if (config.transparentBackground) {\n");
        out.push_str("            ctx.clearRect(0, 0, canvas.width, canvas.height);\n");
        out.push_str("        } else {\n");
        out.push_str("            ctx.fillStyle = config.backgroundColor;\n");
        out.push_str("            ctx.fillRect(0, 0, canvas.width, canvas.height);\n");
        out.push_str("        }\n\n");
    } else {
        out.push_str(&format!("        ctx.fillStyle = '{background}';\n"));
        out.push_str("        ctx.fillRect(0, 0, canvas.width, canvas.height);\n\n");
    }

    out.push_str(&format!("        time += {TIME_STEP};\n"));
    if descriptor.owner_defines(primary, "update") {
        out.push_str("        animation.update(time);\n");
    }
    if descriptor.owner_defines(primary, "draw") {
        out.push_str("        animation.draw(ctx);\n");
    }
    out.push('\n');
    out.push_str("        animationFrameId = requestAnimationFrame(animate);\n");
    out.push_str("    }\n\n");
    out.push_str("    animate();\n\n");
    out.push_str("    // Cleanup on page unload\n");
    out.push_str("    window.addEventListener('beforeunload', function() {\n");
    out.push_str("        cancelAnimationFrame(animationFrameId);\n");
    out.push_str("    });\n");
}

fn escape_js_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
