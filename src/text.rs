//! Small string helpers shared by parsers, renderers and postprocessors

/// Prefix every line that has non-whitespace content with `prefix`
pub fn indent(s: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for line in s.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(prefix);
        }
        out.push_str(line);
    }
    out
}

/// Remove the whitespace prefix shared by all non-blank lines
///
/// Whitespace-only lines are emptied and do not take part in finding the prefix.
pub fn dedent(s: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in s.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let leading = &line[..line.len() - line.trim_start().len()];
        margin = Some(match margin {
            None => leading,
            Some(current) => common_prefix(current, leading),
        });
    }
    let margin = margin.unwrap_or("");

    let mut out = String::with_capacity(s.len());
    for line in s.split_inclusive('\n') {
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        if body.trim().is_empty() {
            out.push_str(newline);
        } else {
            out.push_str(body.strip_prefix(margin).unwrap_or(body));
            out.push_str(newline);
        }
    }
    out
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let end = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()));
    &a[..end]
}

/// Drop leading and trailing lines for which `is_blank` holds, joining the rest with `\n`
pub fn trim_blank_lines(s: &str, is_blank: impl Fn(&str) -> bool) -> String {
    let lines: Vec<&str> = s.split('\n').collect();
    let start = lines.iter().position(|line| !is_blank(line));
    let end = lines.iter().rposition(|line| !is_blank(line));
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

pub fn is_whitespace_only(line: &str) -> bool {
    line.trim().is_empty()
}
