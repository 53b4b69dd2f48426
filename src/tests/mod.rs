use super::*;

mod fragment_updates;
mod selector_engine;

pub(crate) const GUIDE_HTML: &str = r#"
<div>
  <div class="main">
    <form id="day-form" method="get" action="./">
      <input type="date" name="date" value="2024-05-01">
      <input type="submit" value="Show">
    </form>
    <table>
      <tr>
        <td class="main-program">NHK</td>
        <td class="main-hour">05</td>
        <td><a id="event-link" href="?selected-event=40123&amp;want-event=1" data-fragment="event">News</a></td>
      </tr>
    </table>
  </div>
  <div class="event">
    <p id="event-title">(no event selected)</p>
  </div>
</div>
"#;

pub(crate) const EVENT_RESPONSE: &str =
    r#"<div class="event"><p id="event-title">News at five</p></div>"#;

pub(crate) fn main_response(hour: &str) -> String {
    format!(
        r#"<div class="main"><form id="day-form" method="get" action="./"><input type="date" name="date" value="2024-05-02"></form><table><tr><td class="main-program">NHK</td><td class="main-hour">{hour}</td></tr></table></div>"#
    )
}

pub(crate) struct MockGuideServer {
    pages: HashMap<String, String>,
    pub(crate) requests: Vec<FragmentRequest>,
}

impl MockGuideServer {
    pub(crate) fn new() -> Self {
        Self {
            pages: HashMap::new(),
            requests: Vec::new(),
        }
    }

    pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

impl FragmentServer for MockGuideServer {
    fn respond(&mut self, request: &FragmentRequest) -> std::result::Result<String, String> {
        self.requests.push(request.clone());
        self.pages
            .get(&request.url)
            .cloned()
            .ok_or_else(|| format!("no page for {}", request.url))
    }
}
