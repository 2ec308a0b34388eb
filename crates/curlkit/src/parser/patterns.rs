//! Compiled patterns for the curl command parser.
//!
//! Flag patterns require the flag to start the input or follow whitespace,
//! so `-d` inside a URL path or a header value is not taken for a flag.

use regex::Regex;
use std::sync::LazyLock;

/// First absolute http/https URL; stops at whitespace, quotes and `$`.
pub(super) static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s'"$]+"#).expect("valid URL pattern"));

/// `-X METHOD` / `--request METHOD`, method optionally quoted.
pub(super) static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:-X|--request)\s+['"]?([A-Za-z]+)['"]?"#)
        .expect("valid method pattern")
});

/// `-H 'Name: Value'` / `--header "Name: Value"`; quoting is required.
pub(super) static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:-H|--header)\s+(?:'([^']*)'|"([^"]*)")"#)
        .expect("valid header pattern")
});

/// Body flags with a single-quoted, double-quoted or bare argument.
pub(super) static DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|\s)(?:--data-ascii|--data-binary|--data-urlencode|--data-raw|--data|-d)\s+(?:'([^']*)'|"([^"]*)"|(\S+))"#,
    )
    .expect("valid data pattern")
});

/// `-u user[:pass]` / `--user user[:pass]`.
pub(super) static USER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:-u|--user)\s+(?:'([^']*)'|"([^"]*)"|(\S+))"#)
        .expect("valid user pattern")
});

/// `-k` / `--insecure` as a standalone flag.
pub(super) static INSECURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:-k|--insecure)(?:\s|$)"#).expect("valid insecure pattern")
});

/// Value of the first participating group among a quoted/bare alternation.
pub(super) fn first_group<'h>(caps: &regex::Captures<'h>) -> Option<&'h str> {
    caps.iter().skip(1).flatten().next().map(|m| m.as_str())
}

/// Unescape the `\n`, `\t` and `\r` sequences a shell user would type.
pub(super) fn unescape(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\r", "\r")
}
