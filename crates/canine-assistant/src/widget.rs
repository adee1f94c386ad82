use axum::http::header;
use axum::response::IntoResponse;

/// Embeddable chat widget for page builders that strip inline scripts.
/// Mounts into `#canine-assistant` (created if missing) and posts to the
/// `/chat` endpoint on the host it was loaded from.
pub const WIDGET_JS: &str = r#"(function () {
  var script = document.currentScript;
  var endpoint = new URL("/chat", script ? script.src : window.location.href).toString();

  function el(tag, attrs, text) {
    var node = document.createElement(tag);
    Object.keys(attrs || {}).forEach(function (k) { node.setAttribute(k, attrs[k]); });
    if (text) node.textContent = text;
    return node;
  }

  function mount() {
    var root = document.getElementById("canine-assistant");
    if (!root) {
      root = el("div", { id: "canine-assistant" });
      document.body.appendChild(root);
    }
    var log = el("div", { "class": "ca-log", "aria-live": "polite" });
    var form = el("form", { "class": "ca-form" });
    var input = el("textarea", { "class": "ca-input", rows: "3", placeholder: "Ask about health, training, showing or breeding" });
    var button = el("button", { type: "submit", "class": "ca-send" }, "Ask");
    form.appendChild(input);
    form.appendChild(button);
    root.appendChild(log);
    root.appendChild(form);

    function append(role, text, sources) {
      var entry = el("div", { "class": "ca-msg ca-" + role });
      entry.appendChild(el("p", {}, text));
      if (sources && sources.length) {
        var list = el("ul", { "class": "ca-sources" });
        sources.forEach(function (href) {
          var item = el("li");
          item.appendChild(el("a", { href: href, target: "_blank", rel: "noopener" }, href));
          list.appendChild(item);
        });
        entry.appendChild(list);
      }
      log.appendChild(entry);
      log.scrollTop = log.scrollHeight;
    }

    form.addEventListener("submit", function (ev) {
      ev.preventDefault();
      var message = input.value.trim();
      if (!message) return;
      append("user", message);
      input.value = "";
      button.disabled = true;
      fetch(endpoint, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ message: message })
      })
        .then(function (res) {
          return res.json().then(function (body) { return { ok: res.ok, body: body }; });
        })
        .then(function (r) {
          if (r.ok) append("assistant", r.body.reply, r.body.sources);
          else append("error", r.body.error || "Something went wrong.");
        })
        .catch(function () { append("error", "Network error, please try again."); })
        .then(function () { button.disabled = false; });
    });
  }

  if (document.readyState === "loading") document.addEventListener("DOMContentLoaded", mount);
  else mount();
})();
"#;

pub async fn widget_js() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        WIDGET_JS,
    )
}
