/// Strip blank and comment-only lines from a rendered shell script.
///
/// A shebang on the first line is kept verbatim. Every other retained line is
/// trimmed. Lines starting with `#!` after the first are not comments and stay.
pub fn minify_script(content: &str) -> String {
    let mut clean_lines = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if index == 0 && line.starts_with("#!") {
            clean_lines.push(line);
            continue;
        }

        let stripped = line.trim();
        if stripped.is_empty() || (stripped.starts_with('#') && !stripped.starts_with("#!")) {
            continue;
        }
        clean_lines.push(stripped);
    }

    clean_lines.join("\n")
}
