//! Browser-safety rewrites for code samples embedded in articles
//!
//! Articles quote server-side JavaScript (environment variables, `Buffer`,
//! `require`). The rewrites below turn those references into expressions a
//! browser can evaluate, or comment them out when there is no equivalent.

use lazy_static::lazy_static;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;

/// Trailing note appended to commented-out imports
const UNAVAILABLE_NOTE: &str = "// not available in the browser";

lazy_static! {
    static ref NODE_ENV: Regex = Regex::new(r"process\.env\.NODE_ENV\b").unwrap();
    static ref ENV_VAR: Regex = Regex::new(r"process\.env\.\w+").unwrap();
    static ref BUFFER_ALLOC: Regex = Regex::new(r"Buffer\.alloc\((\d+)\)").unwrap();
    static ref BUFFER_FROM: Regex = Regex::new(r"Buffer\.from\(([^)]+)\)").unwrap();
    static ref REQUIRE: Regex =
        Regex::new(r#"const\s+\w+\s*=\s*require\(['"][^'"]+['"]\)(?:\.promises)?;?"#).unwrap();
    static ref FS_REQUIRE: Regex = Regex::new(
        r#"(?:const|let|var)\s+[^=;\n]+=\s*require\(['"](?:node:)?fs(?:/promises)?['"]\)(?:\.promises)?;?"#
    )
    .unwrap();
    static ref FS_IMPORT: Regex =
        Regex::new(r#"import\s+[^;\n]+?\s+from\s+['"](?:node:)?fs(?:/promises)?['"];?"#).unwrap();
}

/// Applies the browser-safety rewrites to markdown text
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite the whole text, prose included
    ///
    /// Total and idempotent: patterns that do not match leave the text as is,
    /// and imports directly behind `//` are not commented out twice.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(text);

        replace(&mut out, &NODE_ENV, |_| "'development'".to_string());
        replace(&mut out, &ENV_VAR, |_| "undefined".to_string());
        replace(&mut out, &BUFFER_ALLOC, |caps| {
            format!("new Uint8Array({})", &caps[1])
        });
        replace(&mut out, &BUFFER_FROM, |caps| {
            format!("new TextEncoder().encode({})", &caps[1])
        });
        comment_out(&mut out, &REQUIRE);
        comment_out(&mut out, &FS_REQUIRE);
        comment_out(&mut out, &FS_IMPORT);

        out
    }

    /// Rewrite only the contents of code blocks, leaving prose untouched
    ///
    /// The document is parsed first; the source bytes of every fenced or
    /// indented code block are normalized and spliced back in place. A
    /// leading YAML front-matter block is parsed as metadata and left alone.
    pub fn normalize_code_blocks<'a>(&self, markdown: &'a str) -> Cow<'a, str> {
        let options = Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
            | Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;

        // One range per block, spanning all of its text, so patterns that
        // wrap across lines are still seen whole
        let mut in_code = false;
        let mut block: Option<Range<usize>> = None;
        let mut ranges = Vec::new();
        for (event, range) in Parser::new_ext(markdown, options).into_offset_iter() {
            match event {
                Event::Start(Tag::CodeBlock(_)) => in_code = true,
                Event::End(TagEnd::CodeBlock) => {
                    in_code = false;
                    ranges.extend(block.take());
                }
                Event::Text(_) if in_code => {
                    block = Some(match block.take() {
                        Some(open) => open.start..range.end,
                        None => range,
                    });
                }
                _ => {}
            }
        }

        let mut out = String::with_capacity(markdown.len());
        let mut last = 0;
        let mut changed = false;
        for range in ranges {
            if range.start < last {
                continue;
            }
            let original = &markdown[range.clone()];
            let normalized = self.normalize(original);
            if let Cow::Owned(rewritten) = normalized {
                out.push_str(&markdown[last..range.start]);
                out.push_str(&rewritten);
                last = range.end;
                changed = true;
            }
        }

        if !changed {
            return Cow::Borrowed(markdown);
        }
        out.push_str(&markdown[last..]);
        Cow::Owned(out)
    }
}

/// Shorthand for `Normalizer::new().normalize(text)`
pub fn normalize(text: &str) -> String {
    Normalizer::new().normalize(text).into_owned()
}

fn replace<F>(text: &mut Cow<'_, str>, re: &Regex, rep: F)
where
    F: FnMut(&Captures) -> String,
{
    if !re.is_match(&**text) {
        return;
    }
    let replaced = re.replace_all(&**text, rep).into_owned();
    *text = Cow::Owned(replaced);
}

fn comment_out(text: &mut Cow<'_, str>, re: &Regex) {
    if !re.is_match(&**text) {
        return;
    }
    let source: &str = &**text;
    let replaced = re
        .replace_all(source, |caps: &Captures| {
            let m = caps.get(0).map_or("", |m| m.as_str());
            let start = caps.get(0).map_or(0, |m| m.start());
            let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
            // Already commented out: the match directly follows `//`
            if source[line_start..start].trim_end().ends_with("//") {
                m.to_string()
            } else {
                format!("// {} {}", m, UNAVAILABLE_NOTE)
            }
        })
        .into_owned();
    *text = Cow::Owned(replaced);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_env_becomes_development() {
        let out = normalize("if (process.env.NODE_ENV === 'production') {}");
        assert!(out.contains("'development'"));
        assert!(!out.contains("process.env.NODE_ENV"));
    }

    #[test]
    fn test_other_env_vars_become_undefined() {
        let out = normalize("const key = process.env.API_KEY;");
        assert_eq!(out, "const key = undefined;");
    }

    #[test]
    fn test_buffer_alloc() {
        let out = normalize("const buf = Buffer.alloc(16);");
        assert!(out.contains("new Uint8Array(16)"));
    }

    #[test]
    fn test_buffer_from() {
        let out = normalize("const bytes = Buffer.from('hello');");
        assert_eq!(out, "const bytes = new TextEncoder().encode('hello');");
    }

    #[test]
    fn test_require_is_commented_out() {
        let out = normalize("const path = require('path');\nconsole.log(path);");
        assert_eq!(
            out,
            "// const path = require('path'); // not available in the browser\nconsole.log(path);"
        );
    }

    #[test]
    fn test_fs_promises_variants() {
        let out = normalize("const fs = require('fs').promises;");
        assert!(out.starts_with("// const fs = require('fs').promises;"));

        let out = normalize("const { readFile } = require(\"fs\").promises;");
        assert!(out.starts_with("// const { readFile } = require(\"fs\").promises;"));

        let out = normalize("import { readFile } from 'fs/promises';");
        assert!(out.starts_with("// import { readFile } from 'fs/promises';"));
    }

    #[test]
    fn test_idempotent() {
        let text = r#"
const fs = require('fs');
const { stat } = require('fs').promises;
import fs2 from 'node:fs';
const mode = process.env.NODE_ENV;
const port = process.env.PORT;
const a = Buffer.alloc(8);
const b = Buffer.from(text);
"#;
        let once = normalize(text);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_url_before_require_is_still_commented_out() {
        let out = normalize("fetch('http://x'); const fs = require('fs');");
        assert_eq!(
            out,
            "fetch('http://x'); // const fs = require('fs'); // not available in the browser"
        );
        assert_eq!(normalize(&out), out);
    }

    #[test]
    fn test_already_commented_require_is_left_alone() {
        let text = "//const fs = require('fs');\n// import fs from 'fs';";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn test_unmatched_text_is_borrowed() {
        let normalizer = Normalizer::new();
        let text = "Nothing to see here.";
        assert!(matches!(normalizer.normalize(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_code_blocks_only() {
        let doc = "Prose mentions process.env.NODE_ENV.\n\n```js\nconst mode = process.env.NODE_ENV;\n```\n";
        let out = Normalizer::new().normalize_code_blocks(doc);
        assert!(out.starts_with("Prose mentions process.env.NODE_ENV."));
        assert!(out.contains("const mode = 'development';"));
    }

    #[test]
    fn test_code_blocks_see_patterns_across_lines() {
        let doc = "```js\nconst bytes = Buffer.from(\n  data\n);\n```\n";
        let out = Normalizer::new().normalize_code_blocks(doc);
        assert_eq!(
            out,
            "```js\nconst bytes = new TextEncoder().encode(\n  data\n);\n```\n"
        );
    }

    #[test]
    fn test_code_blocks_leave_front_matter() {
        let doc = "---\ntitle: process.env.NODE_ENV\n---\n\n    Buffer.alloc(4)\n";
        let out = Normalizer::new().normalize_code_blocks(doc);
        assert!(out.contains("title: process.env.NODE_ENV"));
        assert!(out.contains("new Uint8Array(4)"));
    }
}
