//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge code or response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    let mut cut = max;
    while !s.is_char_boundary(cut) {
      cut -= 1;
    }
    format!("{}… ({} bytes total)", &s[..cut], s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trunc_keeps_short_strings_intact() {
    assert_eq!(trunc_for_log("fn foo() {}", 64), "fn foo() {}");
  }

  #[test]
  fn trunc_reports_total_size() {
    let s = "x".repeat(100);
    let t = trunc_for_log(&s, 10);
    assert!(t.starts_with("xxxxxxxxxx"));
    assert!(t.ends_with("(100 bytes total)"));
  }
}
