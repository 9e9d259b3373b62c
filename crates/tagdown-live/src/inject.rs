//! Live-page augmentation.
//!
//! The converter writes a plain static page; before serving it we splice
//! in a small stylesheet for the theme toggle and a script that opens the
//! reload websocket. The file on disk is never modified, only the served
//! copy.

/// Styles for the floating theme toggle plus the dark-theme overrides it
/// switches on.
pub const THEME_STYLES: &str = r#"<style>
#theme-toggle {
  position: fixed;
  top: 12px;
  right: 12px;
  z-index: 1000;
  padding: 6px 10px;
  border: 1px solid currentColor;
  border-radius: 4px;
  background: transparent;
  color: inherit;
  cursor: pointer;
}
body.dark-theme {
  background-color: #1e1e1e;
  color: #d4d4d4;
}
body.dark-theme a {
  color: #6cb6ff;
}
body.dark-theme .content-table td,
body.dark-theme .content-table th {
  border-color: #444;
}
</style>"#;

/// Script appended before `</body>`: reload-on-message websocket with
/// reconnect, and a persistent light/dark toggle.
pub const LIVE_SCRIPT: &str = r#"<button id="theme-toggle" type="button">theme</button>
<script>
(function () {
  function connect() {
    var socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = function (event) {
      if (event.data === "reload") {
        window.location.reload();
      }
    };
    socket.onclose = function () {
      setTimeout(connect, 1000);
    };
  }
  connect();

  var toggle = document.getElementById("theme-toggle");
  if (localStorage.getItem("theme") === "dark") {
    document.body.classList.add("dark-theme");
  }
  toggle.addEventListener("click", function () {
    var dark = document.body.classList.toggle("dark-theme");
    localStorage.setItem("theme", dark ? "dark" : "light");
  });
})();
</script>"#;

/// Splice the live additions into a rendered page. Styles go at the end
/// of `<head>`, the script at the end of `<body>`. A page missing either
/// marker is served with that addition appended at the end rather than
/// dropped.
pub fn inject_live_page(page: &str) -> String {
    let mut out = String::with_capacity(page.len() + THEME_STYLES.len() + LIVE_SCRIPT.len());

    match page.find("</head>") {
        Some(at) => {
            out.push_str(&page[..at]);
            out.push_str(THEME_STYLES);
            out.push('\n');
            out.push_str(&page[at..]);
        }
        None => {
            out.push_str(page);
            out.push('\n');
            out.push_str(THEME_STYLES);
        }
    }

    match out.rfind("</body>") {
        Some(at) => {
            let mut injected =
                String::with_capacity(out.len() + LIVE_SCRIPT.len() + 1);
            injected.push_str(&out[..at]);
            injected.push_str(LIVE_SCRIPT);
            injected.push('\n');
            injected.push_str(&out[at..]);
            injected
        }
        None => {
            out.push('\n');
            out.push_str(LIVE_SCRIPT);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_land_inside_head_and_script_inside_body() {
        let page = "<!DOCTYPE html>\n<html><head><title>t</title></head><body><p>x</p></body></html>";

        let served = inject_live_page(page);

        let head_close = served.find("</head>").unwrap();
        let body_close = served.rfind("</body>").unwrap();
        assert!(served.find("#theme-toggle").unwrap() < head_close);
        let script_at = served.find("new WebSocket").unwrap();
        assert!(script_at > head_close);
        assert!(script_at < body_close);
        // Original content survives untouched.
        assert!(served.contains("<p>x</p>"));
    }

    #[test]
    fn test_page_without_markers_still_gets_both_additions() {
        let served = inject_live_page("<p>fragment only</p>");

        assert!(served.contains("<p>fragment only</p>"));
        assert!(served.contains("#theme-toggle"));
        assert!(served.contains("new WebSocket"));
    }

    #[test]
    fn test_injection_is_idempotent_per_serve() {
        let page = "<html><head></head><body></body></html>";

        let served = inject_live_page(page);

        assert_eq!(served.matches("new WebSocket").count(), 1);
        assert_eq!(served.matches("#theme-toggle {").count(), 1);
    }
}
