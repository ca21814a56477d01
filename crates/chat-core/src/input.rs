use std::sync::OnceLock;

use regex::Regex;

fn ansi_escape() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    // CSI sequences (colors, cursor moves) and OSC sequences (titles, hyperlinks).
    ANSI.get_or_init(|| {
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
            .expect("static ANSI pattern is valid")
    })
}

/// Normalizes pasted text before it reaches the draft: strips terminal
/// formatting, unifies line endings and drops control characters other than
/// newline and tab.
pub fn sanitize_paste(raw: &str) -> String {
    let stripped = ansi_escape().replace_all(raw, "");
    let unified = stripped.replace("\r\n", "\n").replace('\r', "\n");
    unified
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}
