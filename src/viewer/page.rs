const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>Display Cam</title>
    <style>
      :root { color-scheme: dark; }
      body { margin:0; background:#0b0b0b; color:#eee; font-family: system-ui, -apple-system, Segoe UI, Roboto, Ubuntu, Cantarell, 'Helvetica Neue', Arial; }
      header { padding:12px 16px; border-bottom:1px solid #222; display:flex; align-items:center; gap:12px; }
      .badge { font-size:12px; padding:2px 8px; background:#222; border-radius:999px; }
      .still { margin:20px auto; max-width:640px; background:#222; padding:16px; border-radius:12px; }
      .still img { border-radius:8px; }
      .wrap { display:flex; justify-content:center; align-items:center; height: calc(100vh - 120px); }
      img { max-width:100%; max-height:100%; display:block; }
      footer { position:fixed; bottom:8px; left:16px; opacity:.6; font-size:12px; }
      a { color:#9cf; text-decoration:none; }
    </style>
  </head>
  <body>
    <header>
      <div><strong>Display Cam</strong></div>
      <div class="badge">{{BADGE}}</div>
      <div style="margin-left:auto; font-size:14px">
        <a href="/snapshot">snapshot</a>
      </div>
    </header>
{{STILL}}
    <div class="wrap">
      <img src="/stream" alt="camera stream" />
    </div>

    <footer>
      /stream (MJPEG) &bull; /snapshot (JPEG) &bull; /healthz
    </footer>
  </body>
</html>
"#;

const STILL_SECTION: &str = r#"
    <div class="still">
      <img src="/lara" alt="still image" />
    </div>
"#;

/// Viewer landing page. The still section appears only when a static image exists.
pub fn render_index(badge: &str, show_still: bool) -> String {
    INDEX_TEMPLATE
        .replace("{{BADGE}}", &escape_html(badge))
        .replace("{{STILL}}", if show_still { STILL_SECTION } else { "" })
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_links_stream_and_snapshot() {
        let html = render_index("localhost", false);
        assert!(html.contains(r#"<img src="/stream""#));
        assert!(html.contains(r#"href="/snapshot""#));
        assert!(!html.contains("/lara"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn still_section_is_optional() {
        assert!(render_index("localhost", true).contains(r#"src="/lara""#));
    }

    #[test]
    fn badge_is_escaped() {
        let html = render_index("<pi>", false);
        assert!(html.contains("&lt;pi&gt;"));
    }
}
