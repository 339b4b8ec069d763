use console::{measure_text_width, style};
use std::iter;

use crate::config::Identity;

/// Prints a framed, colorized summary of the pending rewrite.
///
/// The box is sized to the widest **visible** line, using
/// [`console::measure_text_width`] so ANSI codes do not skew the padding.
/// Borders are styled independently from the content so that colored
/// lines inside do not bleed into the frame.
///
/// # Parameters
///
/// * `identity` – The author/committer every commit will receive.
/// * `targets` – The remotes that will be cloned, rewritten, and force pushed.
///
/// # Examples
///
/// ```no_run
/// use rewit::banner::print_banner;
/// use rewit::config::Identity;
///
/// print_banner(
///     &Identity::new("Jane Doe", "jane@example.com"),
///     &["git@github.com:acme/widgets"],
/// );
/// ```
pub fn print_banner(identity: &Identity, targets: &[&str]) {
    let lines = banner_lines(identity, targets);

    let max_width = lines
        .iter()
        .map(|l| measure_text_width(l))
        .max()
        .unwrap_or(0)
        + 2;

    let border = "═".repeat(max_width);
    let top = style(format!("╔{}╗", border)).blue().bold();
    let bottom = style(format!("╚{}╝", border)).blue().bold();
    let left = style("║ ").blue().bold().to_string();
    let right = style("║").blue().bold().to_string();

    println!();
    println!("{top}");
    for line in lines {
        let visible = measure_text_width(&line);
        let pad = max_width - visible; // includes the one space after left border
        println!("{}{}{}{}", left, line, " ".repeat(pad - 1), right);
    }
    println!("{bottom}");
    println!();
}

/// Builds the banner text: title, warning, new identity, then one line per target.
///
/// **Note:** the warning lines carry ANSI styling; measure them with
/// `console::measure_text_width` rather than `str::len()`.
fn banner_lines(identity: &Identity, targets: &[&str]) -> Vec<String> {
    let top = [
        "This process will clone and rewrite the commit history",
        "for the following repositories:",
        "",
    ]
    .into_iter()
    .map(|s| s.to_string());

    let repos = targets.iter().map(|t| format!("  {}", t));

    let warning = iter::once(String::new()).chain(
        [
            style("Every branch and tag will be force pushed.")
                .yellow()
                .bold()
                .to_string(),
            style("Existing remote history will be overwritten.")
                .yellow()
                .to_string(),
        ]
        .into_iter(),
    );

    let author = iter::once(String::new()).chain(iter::once(format!(
        "New author and committer: {}",
        identity
    )));

    top.chain(repos).chain(warning).chain(author).collect()
}

#[cfg(test)]
mod tests {
    use super::banner_lines;
    use crate::config::Identity;

    #[test]
    fn banner_lists_every_target_and_identity() {
        let id = Identity::new("Jane Doe", "jane@example.com");
        let lines = banner_lines(&id, &["git@github.com:acme/a", "git@github.com:acme/b"]);
        let s = lines.join("\n");

        assert!(s.contains("for the following repositories:"));
        assert!(s.contains("  git@github.com:acme/a"));
        assert!(s.contains("  git@github.com:acme/b"));
        assert!(s.contains("force pushed"));
        assert!(s.contains("New author and committer: Jane Doe <jane@example.com>"));
    }

    #[test]
    fn banner_target_lines_keep_document_order() {
        let id = Identity::new("A", "a@b");
        let lines = banner_lines(&id, &["x/second", "x/first"]);
        let second = lines.iter().position(|l| l.ends_with("x/second")).unwrap();
        let first = lines.iter().position(|l| l.ends_with("x/first")).unwrap();
        assert!(second < first);
    }
}
