//! Lua source primitives: literal escaping and an indenting line writer.

use std::fmt::Write as _;

/// Quote `s` as a double-quoted Lua string literal.
pub fn lua_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\{}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Format a finite number as a Lua numeric literal. Whole values are
/// written without a fractional part.
pub fn lua_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Lua table literal of strings: `{ "a", "b" }`.
pub fn lua_string_list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = items.iter().map(|s| lua_string(s.as_ref())).collect();
    format!("{{ {} }}", body.join(", "))
}

/// Line-oriented writer with four-space indentation.
#[derive(Debug, Default)]
pub struct LuaWriter {
    out: String,
    depth: usize,
}

impl LuaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current depth. Embedded newlines are split and
    /// each piece indented.
    pub fn line(&mut self, text: &str) -> &mut Self {
        for piece in text.split('\n') {
            if piece.is_empty() {
                self.out.push('\n');
                continue;
            }
            for _ in 0..self.depth {
                self.out.push_str("    ");
            }
            self.out.push_str(piece);
            self.out.push('\n');
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// Write `text` and indent what follows.
    pub fn open(&mut self, text: &str) -> &mut Self {
        self.line(text);
        self.depth += 1;
        self
    }

    /// Dedent and write `text`.
    pub fn close(&mut self, text: &str) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    /// `key = value,` inside a table constructor.
    pub fn field(&mut self, key: &str, value: &str) -> &mut Self {
        self.line(&format!("{key} = {value},"))
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_escape_quotes_and_controls() {
        assert_eq!(lua_string("plain"), "\"plain\"");
        assert_eq!(lua_string("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(lua_string("a\\b"), "\"a\\\\b\"");
        assert_eq!(lua_string("two\nlines"), "\"two\\nlines\"");
        assert_eq!(lua_string("\u{1}"), "\"\\1\"");
        assert_eq!(lua_string("Épée"), "\"Épée\"");
    }

    #[test]
    fn numbers_drop_trailing_zero() {
        assert_eq!(lua_number(4.0), "4");
        assert_eq!(lua_number(-3.0), "-3");
        assert_eq!(lua_number(1.5), "1.5");
        assert_eq!(lua_number(0.1), "0.1");
    }

    #[test]
    fn writer_indents_blocks() {
        let mut w = LuaWriter::new();
        w.open("if x then").line("y()\nz()").close("end");
        assert_eq!(w.finish(), "if x then\n    y()\n    z()\nend\n");
    }

    #[test]
    fn string_lists() {
        assert_eq!(lua_string_list::<&str>(&[]), "{}");
        assert_eq!(lua_string_list(&["a", "b"]), "{ \"a\", \"b\" }");
    }
}
