//! Text normalization applied to program input, captured output and
//! expected output before they are compared.

fn is_indent(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_blank(line: &str) -> bool {
    line.trim_start_matches(is_indent).is_empty()
}

fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches(is_indent).len()]
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

/// Remove the whitespace prefix shared by every non-blank line
///
/// Lines made only of spaces and tabs are emptied and do not take part in
/// computing the shared prefix.
pub fn dedent(text: &str) -> String {
    let margin = text
        .split('\n')
        .filter(|line| !is_blank(line))
        .map(indentation)
        .reduce(common_prefix)
        .unwrap_or("");

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !is_blank(line) {
            out.push_str(line.strip_prefix(margin).unwrap_or(line));
        }
    }
    out
}

/// Dedent, then trim surrounding whitespace
pub fn refine(text: &str) -> String {
    dedent(text).trim().to_string()
}

/// Refined text as fed to a program's standard input
///
/// Non-empty input ends with a newline so line-oriented readers see a
/// complete last line.
pub fn refine_input(text: &str) -> String {
    let mut input = refine(text);
    if !input.is_empty() {
        input.push('\n');
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn removes_common_indentation() {
        let text = "
            3
            1 2
              nested
        ";
        assert_eq!(refine(text), "3\n1 2\n  nested");
    }

    #[test]
    fn whitespace_only_lines_do_not_limit_margin() {
        assert_eq!(dedent("    a\n  \n    b"), "a\n\nb");
    }

    #[test]
    fn mixed_tabs_and_spaces_share_only_common_prefix() {
        assert_eq!(dedent("\t  a\n\t b"), "  a\n b");
    }

    #[test]
    fn no_common_margin_is_unchanged() {
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }

    #[test]
    fn trims_surrounding_blank_lines() {
        assert_eq!(refine("\n\n  HELLO  \n\n"), "HELLO");
        assert_eq!(refine(""), "");
        assert_eq!(refine(" \n\t\n"), "");
    }

    #[test]
    fn input_gets_trailing_newline() {
        assert_eq!(refine_input("  hello\n"), "hello\n");
        assert_eq!(refine_input("   "), "");
    }

    proptest! {
        #[test]
        fn refine_is_idempotent(text in "[ \t\na-c]{0,64}") {
            let once = refine(&text);
            prop_assert_eq!(refine(&once), once);
        }

        #[test]
        fn uniform_indentation_is_removed(
            lines in proptest::collection::vec("[a-z][a-z ]{0,8}[a-z]", 1..6),
            indent in 0usize..8,
        ) {
            let pad = " ".repeat(indent);
            let text: String = lines
                .iter()
                .map(|line| format!("{pad}{line}\n"))
                .collect();
            let wrapped = format!("\n{text}\n");
            prop_assert_eq!(refine(&wrapped), lines.join("\n"));
        }
    }
}
