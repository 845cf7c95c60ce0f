use super::{Outline, OutlineNode, StructureParser};
use crate::error::Result;
use crate::types::HierarchyLevel;
use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:export|default|public|private|protected|internal|abstract|final|sealed|static|partial|open|data|case|pub(?:\([^)]*\))?)\s+)*(class|interface|namespace|module|enum|struct|trait|object|protocol|record|impl)(?:\s*<[^>]*>)?\s+([A-Za-z_]\w*(?:(?:::|\.)\w+)*)",
    )
    .expect("class pattern is valid")
});

static KEYWORD_FN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*\(?(?:(?:export|default|public|private|protected|internal|static|async|override|virtual|abstract|final|inline|suspend|open|unsafe|const|pub(?:\([^)]*\))?|extern(?:\s+"[^"]*")?)\s+)*(?:def|fn|func|function|fun|method|sub|defn)\b\s*\*?\s*(?:\([^)]*\)\s*)?([A-Za-z_$][\w$!?']*)"#,
    )
    .expect("function pattern is valid")
});

static C_LIKE_FN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:[\w:<>\[\],*&]+\s+)+)[*&]*([A-Za-z_~][\w:~]*)\s*\([^;]*$")
        .expect("c-like function pattern is valid")
});

const NOT_FUNCTION_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "else", "elif", "new", "sizeof", "match",
];

const NOT_TYPE_WORDS: &[&str] = &["return", "else", "new", "throw", "await", "case", "delete", "yield"];

/// Line-signature parser for languages without a grammar, and the fallback
/// when grammar parsing fails.
///
/// Emits class-like (level 3) and function-like (level 4) nodes only. A block
/// ends before the next non-blank line indented no deeper than its signature,
/// keeping a closing `}`, `)` or `end` at the signature's indentation.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicParser;

impl HeuristicParser {
    pub const fn new() -> Self {
        Self
    }
}

impl StructureParser for HeuristicParser {
    fn parse(&mut self, source: &[u8]) -> Result<Outline> {
        let text = String::from_utf8_lossy(source);
        let lines: Vec<&str> = text.split('\n').collect();
        let mut outline = Outline::default();
        // (node index, end line) of classes that may still contain later lines
        let mut open_classes: Vec<(usize, usize)> = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            let line_no = row + 1;
            let Some((level, kind, name)) = match_signature(line) else {
                continue;
            };

            let indent = indent_width(line);
            let end_line = block_end(&lines, row, indent) + 1;

            open_classes.retain(|&(_, end)| end >= line_no);
            let parent = open_classes.last().map(|&(idx, _)| idx);

            let idx = outline.push(OutlineNode {
                level,
                kind,
                name,
                start_line: line_no,
                end_line,
                parent,
            });
            if level == HierarchyLevel::Class {
                open_classes.push((idx, end_line));
            }
        }

        Ok(outline)
    }
}

fn match_signature(line: &str) -> Option<(HierarchyLevel, String, Option<String>)> {
    if let Some(caps) = CLASS_RE.captures(line) {
        let keyword = caps.get(1).map_or("class", |m| m.as_str());
        let name = caps.get(2).map(|m| m.as_str().to_string());
        return Some((HierarchyLevel::Class, keyword.to_string(), name));
    }

    if let Some(caps) = KEYWORD_FN_RE.captures(line) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        return Some((HierarchyLevel::Function, "function".to_string(), name));
    }

    let caps = C_LIKE_FN_RE.captures(line)?;
    let name = caps.get(2)?.as_str();
    let first_word = caps
        .get(1)?
        .as_str()
        .split_whitespace()
        .next()
        .unwrap_or_default();
    if NOT_FUNCTION_NAMES.contains(&name) || NOT_TYPE_WORDS.contains(&first_word) {
        return None;
    }
    Some((
        HierarchyLevel::Function,
        "function".to_string(),
        Some(name.to_string()),
    ))
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn is_closer(trimmed: &str) -> bool {
    trimmed.starts_with('}')
        || trimmed.starts_with(')')
        || trimmed.starts_with(']')
        || trimmed == "end"
        || trimmed.starts_with("end ")
        || trimmed.starts_with("end;")
}

/// Zero-based index of the last line belonging to the block opened at `start`
fn block_end(lines: &[&str], start: usize, indent: usize) -> usize {
    let mut end = start;
    for (row, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if indent_width(line) > indent {
            end = row;
            continue;
        }
        if indent_width(line) == indent {
            // Allman brace on its own line
            if trimmed.starts_with('{') {
                end = row;
                continue;
            }
            if is_closer(trimmed) {
                end = row;
                // `) -> T {` closes a wrapped signature and opens the body
                if trimmed.ends_with('{') || trimmed.ends_with(':') {
                    continue;
                }
            }
        }
        break;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(source: &str) -> Outline {
        HeuristicParser::new().parse(source.as_bytes()).unwrap()
    }

    #[test]
    fn kotlin_class_with_methods() {
        let source = "\
package app

class Greeter(val name: String) {
    fun greet(): String {
        return \"hi $name\"
    }

    fun wave() {
        println(\"wave\")
    }
}

fun main() {
    Greeter(\"x\").greet()
}
";
        let out = outline(source);
        assert_eq!(out.count_level(HierarchyLevel::Class), 1);
        assert_eq!(out.count_level(HierarchyLevel::Function), 3);

        let class = &out.nodes[0];
        assert_eq!(class.kind, "class");
        assert_eq!(class.name.as_deref(), Some("Greeter"));
        assert_eq!((class.start_line, class.end_line), (3, 11));

        let greet = &out.nodes[1];
        assert_eq!(greet.name.as_deref(), Some("greet"));
        assert_eq!((greet.start_line, greet.end_line), (4, 6));
        assert_eq!(greet.parent, Some(0));

        let main = &out.nodes[3];
        assert_eq!(main.name.as_deref(), Some("main"));
        assert_eq!(main.parent, None);
        assert_eq!((main.start_line, main.end_line), (13, 15));
    }

    #[test]
    fn ruby_blocks_end_at_end_keyword() {
        let source = "\
module Shop
  class Cart
    def total
      items.sum
    end
  end
end
";
        let out = outline(source);
        assert_eq!(out.nodes.len(), 3);
        assert_eq!(out.nodes[0].kind, "module");
        assert_eq!((out.nodes[0].start_line, out.nodes[0].end_line), (1, 7));
        assert_eq!((out.nodes[1].start_line, out.nodes[1].end_line), (2, 6));
        assert_eq!(out.nodes[1].parent, Some(0));
        let total = &out.nodes[2];
        assert_eq!((total.start_line, total.end_line), (3, 5));
        assert_eq!(total.parent, Some(1));
    }

    #[test]
    fn c_like_signatures_skip_control_flow() {
        let source = "\
static int add(int a, int b) {
    if (a > b) {
        return a;
    }
    return add(b, a);
}
";
        let out = outline(source);
        assert_eq!(out.nodes.len(), 1);
        assert_eq!(out.nodes[0].name.as_deref(), Some("add"));
        assert_eq!((out.nodes[0].start_line, out.nodes[0].end_line), (1, 6));
    }

    #[test]
    fn wrapped_signature_keeps_body() {
        let source = "\
pub fn build(
    a: u32,
) -> u32 {
    a
}
";
        let out = outline(source);
        assert_eq!(out.nodes.len(), 1);
        assert_eq!(out.nodes[0].end_line, 5);
    }

    #[test]
    fn children_lie_within_parents() {
        let source = "\
class A {
  method one() {
    x
  }
}
function two() {
  y
}
";
        let out = outline(source);
        for node in &out.nodes {
            if let Some(parent) = node.parent {
                let p = &out.nodes[parent];
                assert!(p.start_line <= node.start_line && node.end_line <= p.end_line);
            }
        }
        assert_eq!(out.nodes.last().and_then(|n| n.parent), None);
    }

    #[test]
    fn plain_text_yields_nothing() {
        assert!(outline("just some words\nand more words\n").is_empty());
        assert!(outline("").is_empty());
    }

    #[test]
    fn class_names_stop_at_punctuation() {
        let out = outline("class Cart:\n    def total(self):\n        return 1\n");
        assert_eq!(out.nodes[0].name.as_deref(), Some("Cart"));
        assert_eq!(out.nodes[1].name.as_deref(), Some("total"));

        let out = outline("module Shop::Billing\nend\n");
        assert_eq!(out.nodes[0].name.as_deref(), Some("Shop::Billing"));
    }
}
