//! Serialization (spec §4.C `write`, §6 "Serialization — format options").

use super::{Document, NodeId, NodeKind, XmlVersion};
use std::io::{self, Write};

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Serialization toggles (spec §6). A `Copy` struct with a `Default` impl,
/// following `roxmltree::ParsingOptions`'s shape.
#[derive(Clone, Copy, Debug)]
pub struct FormatOptions {
    pub indent: bool,
    pub indent_width: u32,
    pub indent_attributes: bool,
    pub collapse_tags: bool,
    pub html: bool,
    pub suppress_comments: bool,
    pub escape_white_space: bool,
    pub escape_double_quote: bool,
    pub write_prolog: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            indent: false,
            indent_width: 0,
            indent_attributes: false,
            collapse_tags: true,
            html: false,
            suppress_comments: false,
            escape_white_space: false,
            escape_double_quote: true,
            write_prolog: false,
        }
    }
}

impl Document {
    /// Serializes the whole document using `self.format`.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        self.write_with_options(sink, &self.format)
    }

    pub fn write_with_options<W: Write>(&self, sink: &mut W, opt: &FormatOptions) -> io::Result<()> {
        if opt.write_prolog {
            write!(sink, "<?xml version=\"{}\" encoding=\"{}\"?>", version_str(self.version), self.encoding)?;
            if opt.indent {
                writeln!(sink)?;
            }
            if let Some(dt) = &self.doctype {
                write_doctype(sink, dt)?;
                if opt.indent {
                    writeln!(sink)?;
                }
            }
        }
        for (i, child) in self.all_nodes(None).enumerate() {
            if opt.indent && i > 0 {
                writeln!(sink)?;
            }
            self.write_node(sink, child, 0, opt)?;
        }
        Ok(())
    }

    fn write_indent<W: Write>(&self, sink: &mut W, depth: u32, opt: &FormatOptions) -> io::Result<()> {
        if opt.indent {
            writeln!(sink)?;
            for _ in 0..(depth * opt.indent_width) {
                write!(sink, " ")?;
            }
        }
        Ok(())
    }

    fn write_node<W: Write>(&self, sink: &mut W, id: NodeId, depth: u32, opt: &FormatOptions) -> io::Result<()> {
        match self.kind(id) {
            NodeKind::Element => self.write_element(sink, id, depth, opt),
            NodeKind::Text => write!(sink, "{}", escape_text(&self.str(id), opt)),
            NodeKind::CData => write!(sink, "<![CDATA[{}]]>", self.str(id)),
            NodeKind::Comment => {
                if !opt.suppress_comments {
                    write!(sink, "<!--{}-->", split_double_hyphen(&self.str(id)))
                } else {
                    Ok(())
                }
            }
            NodeKind::ProcessingInstruction => {
                let target = self.pi_target(id).unwrap_or("");
                match self.pi_data(id) {
                    Some(data) if !data.is_empty() => write!(sink, "<?{} {}?>", target, data),
                    _ => write!(sink, "<?{}?>", target),
                }
            }
            _ => Ok(()),
        }
    }

    fn write_element<W: Write>(&self, sink: &mut W, id: NodeId, depth: u32, opt: &FormatOptions) -> io::Result<()> {
        let qname = self.qname(id).unwrap();
        write!(sink, "<{}", qname)?;
        for (i, &attr) in self.attributes(id).iter().enumerate() {
            if opt.indent_attributes && i > 0 {
                self.write_indent(sink, depth + 1, opt)?;
                write!(sink, "{}", " ".repeat(qname.len() + 1))?;
            } else {
                write!(sink, " ")?;
            }
            write!(sink, "{}=\"{}\"", self.qname(attr).unwrap(), escape_attr_value(self.attribute_value(attr), opt))?;
        }

        let is_void_in_html = opt.html && HTML_VOID_ELEMENTS.contains(&self.local_name(id));
        let has_children = self.all_nodes(Some(id)).next().is_some();

        if !has_children {
            if is_void_in_html || (opt.collapse_tags && !opt.html) {
                write!(sink, "/>")?;
                return Ok(());
            }
            if opt.html || !opt.collapse_tags {
                write!(sink, ">")?;
                write!(sink, "</{}>", qname)?;
                return Ok(());
            }
            write!(sink, "/>")?;
            return Ok(());
        }

        write!(sink, ">")?;
        for child in self.all_nodes(Some(id)) {
            if opt.indent && self.kind(child) == NodeKind::Element {
                self.write_indent(sink, depth + 1, opt)?;
            }
            self.write_node(sink, child, depth + 1, opt)?;
        }
        if opt.indent {
            self.write_indent(sink, depth, opt)?;
        }
        write!(sink, "</{}>", qname)
    }

    /// Serializes just this node (and its subtree if a container).
    pub fn write_node_to<W: Write>(&self, id: NodeId, sink: &mut W, opt: &FormatOptions) -> io::Result<()> {
        self.write_node(sink, id, 0, opt)
    }
}

fn version_str(v: XmlVersion) -> &'static str {
    match v {
        XmlVersion::V1_0 => "1.0",
        XmlVersion::V1_1 => "1.1",
    }
}

fn write_doctype<W: Write>(sink: &mut W, dt: &super::Doctype) -> io::Result<()> {
    write!(sink, "<!DOCTYPE {}", dt.name)?;
    match (&dt.public_id, &dt.system_id) {
        (Some(p), Some(s)) => write!(sink, " PUBLIC \"{}\" \"{}\"", p, s)?,
        (None, Some(s)) => write!(sink, " SYSTEM \"{}\"", s)?,
        _ => {}
    }
    write!(sink, ">")
}

fn split_double_hyphen(s: &str) -> String {
    s.replace("--", "- -")
}

fn escape_text(s: &str, opt: &FormatOptions) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' if opt.escape_white_space => out.push_str("&#10;"),
            '\r' if opt.escape_white_space => out.push_str("&#13;"),
            '\t' if opt.escape_white_space => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr_value(s: &str, opt: &FormatOptions) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if opt.escape_double_quote => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}
