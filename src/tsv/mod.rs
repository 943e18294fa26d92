//! The TSV codec (component F): YAML front matter plus a tab-separated body.

pub mod escape;
pub mod reader;
pub mod writer;
pub mod yaml_scalar;

pub use reader::{read_mapping_set, ExternalMetadata};
pub use writer::write_mapping_set;

/// A minimal YAML AST used only to control the front matter's block style
/// and scalar quoting deterministically (`serde_yaml`'s emitter does not
/// expose that choice, see `yaml_scalar`).
#[derive(Debug, Clone, PartialEq)]
pub enum YamlNode {
    /// A leaf scalar, formatted via [`yaml_scalar::format_scalar`].
    Scalar(String),
    /// A block sequence.
    List(Vec<YamlNode>),
    /// A block mapping, in the given key order.
    Map(Vec<(String, YamlNode)>),
}

impl YamlNode {
    /// Render this node as a top-level YAML document body (no leading
    /// `---`), two-space indented, block style throughout.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Map(entries) => render_map(entries, 0, &mut out),
            other => render_scalar_or_list(other, 0, &mut out),
        }
        out
    }
}

fn indent_str(level: usize) -> String {
    " ".repeat(level * 2)
}

fn render_map(entries: &[(String, YamlNode)], level: usize, out: &mut String) {
    for (key, value) in entries {
        match value {
            YamlNode::Scalar(s) => {
                out.push_str(&indent_str(level));
                out.push_str(key);
                out.push_str(": ");
                out.push_str(&yaml_scalar::format_scalar(s));
                out.push('\n');
            }
            YamlNode::List(items) if items.is_empty() => {
                out.push_str(&indent_str(level));
                out.push_str(key);
                out.push_str(": []\n");
            }
            YamlNode::List(items) => {
                out.push_str(&indent_str(level));
                out.push_str(key);
                out.push_str(":\n");
                render_list(items, level, out);
            }
            YamlNode::Map(sub) if sub.is_empty() => {
                out.push_str(&indent_str(level));
                out.push_str(key);
                out.push_str(": {}\n");
            }
            YamlNode::Map(sub) => {
                out.push_str(&indent_str(level));
                out.push_str(key);
                out.push_str(":\n");
                render_map(sub, level + 1, out);
            }
        }
    }
}

fn render_list(items: &[YamlNode], level: usize, out: &mut String) {
    for item in items {
        match item {
            YamlNode::Scalar(s) => {
                out.push_str(&indent_str(level));
                out.push_str("- ");
                out.push_str(&yaml_scalar::format_scalar(s));
                out.push('\n');
            }
            YamlNode::Map(entries) => {
                let mut lines = String::new();
                render_map(entries, level + 1, &mut lines);
                let mut iter = lines.lines();
                out.push_str(&indent_str(level));
                out.push_str("- ");
                if let Some(first) = iter.next() {
                    out.push_str(first.trim_start());
                    out.push('\n');
                }
                for rest in iter {
                    out.push_str(rest);
                    out.push('\n');
                }
            }
            YamlNode::List(sub) => {
                out.push_str(&indent_str(level));
                out.push_str("-\n");
                render_list(sub, level + 1, out);
            }
        }
    }
}

fn render_scalar_or_list(node: &YamlNode, level: usize, out: &mut String) {
    match node {
        YamlNode::Scalar(s) => out.push_str(&yaml_scalar::format_scalar(s)),
        YamlNode::List(items) => render_list(items, level, out),
        YamlNode::Map(entries) => render_map(entries, level, out),
    }
}
