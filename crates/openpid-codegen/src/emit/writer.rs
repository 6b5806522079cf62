//! Indentation-aware source text builder.

use openpid_model::naming::hex_const;

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current depth. Empty lines carry no indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `///` doc lines; each input line becomes one doc line.
    pub fn doc(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.line("///");
            return;
        }
        for line in text.lines() {
            if line.is_empty() {
                self.line("///");
            } else {
                self.line(format!("/// {line}"));
            }
        }
    }

    pub fn comment(&mut self, text: impl AsRef<str>) {
        for line in text.as_ref().lines() {
            self.line(format!("// {line}"));
        }
    }

    /// Open a block: writes `header {` and indents.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.depth += 1;
    }

    /// Open a bare `{` scope.
    pub fn open_scope(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    /// Close a block opened with [`CodeWriter::open`].
    pub fn close(&mut self) {
        self.close_with("}");
    }

    pub fn close_with(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// A mask or constant as a hex literal.
pub(crate) fn literal(value: u64) -> String {
    if value < 10 {
        format!("{value:#x}")
    } else {
        hex_const(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_and_docs() {
        let mut w = CodeWriter::new();
        w.doc("Handle.\n\n# Safety");
        w.open("impl Foo");
        w.open("fn bar(&self)");
        w.comment("nothing");
        w.close();
        w.close();
        assert_eq!(
            w.finish(),
            "/// Handle.\n///\n/// # Safety\nimpl Foo {\n    fn bar(&self) {\n        // nothing\n    }\n}\n"
        );
    }

    #[test]
    fn literals_are_always_hex() {
        assert_eq!(literal(0), "0x0");
        assert_eq!(literal(8), "0x8");
        assert_eq!(literal(0xFFFF_FFFE), "0xffff_fffe");
    }

    #[test]
    fn blank_lines_have_no_trailing_whitespace() {
        let mut w = CodeWriter::new();
        w.open("mod m");
        w.blank();
        w.line("");
        w.close();
        assert_eq!(w.finish(), "mod m {\n\n\n}\n");
    }
}
