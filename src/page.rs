use super::*;

// The guide page migrated its sticky cells from hour/program to
// main-hour/main-program; both generations are honored.
const HOUR_CELL_SELECTOR: &str = "td.hour, td.main-hour";
const PROGRAM_CELL_SELECTOR: &str = "td.program, td.main-program";

const DEFAULT_FRAGMENT: &str = "main";
const EVENT_FRAGMENT: &str = "event";
const FRAGMENT_MODE_PARAM: &str = "mode";
const FRAGMENT_MODE_VALUE: &str = "html";
const WANT_EVENT_PARAM: &str = "want-event";
const FRAGMENT_ATTR: &str = "data-fragment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

// Navigation state as an explicit value instead of ambient browser globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub url: String,
    pub method: Method,
    pub body: Option<String>,
}

impl Navigation {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
        }
    }
}

// Maps a logical navigation to the request actually sent: the mode=html
// query parameter asks the server for the bare fragment.
pub fn route(navigation: &Navigation) -> Navigation {
    Navigation {
        url: url::with_query_param(&navigation.url, FRAGMENT_MODE_PARAM, FRAGMENT_MODE_VALUE),
        method: navigation.method,
        body: navigation.body.clone(),
    }
}

// URLs carrying a non-empty want-event flag display the event fragment.
pub fn fragment_for(navigation: &Navigation) -> &'static str {
    let wants_event = url::query_param(&navigation.url, WANT_EVENT_PARAM)
        .map(|value| !value.is_empty())
        .unwrap_or(false);
    if wants_event {
        EVENT_FRAGMENT
    } else {
        DEFAULT_FRAGMENT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRequest {
    pub id: FetchId,
    pub fragment: String,
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    generation: u64,
}

impl FragmentRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { generation: u64 },
}

#[derive(Debug, Clone, Copy, Default)]
struct FragmentState {
    generation: u64,
    loading: bool,
}

pub trait FragmentServer {
    fn respond(&mut self, request: &FragmentRequest) -> std::result::Result<String, String>;
}

#[derive(Debug)]
pub struct Page {
    dom: Dom,
    history: History,
    scroll_x: i64,
    scroll_y: i64,
    pending: Vec<FragmentRequest>,
    fragment_states: HashMap<String, FragmentState>,
    next_fetch_id: u64,
    stale_drops: u64,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_url("./", html)
    }

    pub fn from_html_with_url(url: &str, html: &str) -> Result<Self> {
        let dom = html::parse_html(html)?;
        let mut page = Self {
            dom,
            history: History::new(url.to_string()),
            scroll_x: 0,
            scroll_y: 0,
            pending: Vec::new(),
            fragment_states: HashMap::new(),
            next_fetch_id: 0,
            stale_drops: 0,
        };
        // The original script runs one positioning pass at load time.
        page.update_positions()?;
        Ok(page)
    }

    pub fn url(&self) -> &str {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn scroll_offset(&self) -> (i64, i64) {
        (self.scroll_x, self.scroll_y)
    }

    pub fn pending_requests(&self) -> &[FragmentRequest] {
        &self.pending
    }

    pub fn load_state(&self, fragment: &str) -> LoadState {
        match self.fragment_states.get(fragment) {
            Some(state) if state.loading => LoadState::Loading {
                generation: state.generation,
            },
            _ => LoadState::Idle,
        }
    }

    pub fn stale_responses(&self) -> u64 {
        self.stale_drops
    }

    pub fn scroll_to(&mut self, x: i64, y: i64) -> Result<()> {
        self.scroll_x = x;
        self.scroll_y = y;
        self.update_positions()
    }

    // Mirrors the viewport offsets onto the sticky cells: hour headers track
    // the horizontal offset, program headers the vertical one.
    pub fn update_positions(&mut self) -> Result<()> {
        let left = format!("{}px", self.scroll_x);
        for cell in self.dom.query_selector_all(HOUR_CELL_SELECTOR)? {
            self.dom.set_style_property(cell, "left", &left)?;
        }
        let top = format!("{}px", self.scroll_y);
        for cell in self.dom.query_selector_all(PROGRAM_CELL_SELECTOR)? {
            self.dom.set_style_property(cell, "top", &top)?;
        }
        Ok(())
    }

    pub fn update_fragment(&mut self, name: &str) -> FetchId {
        let navigation = Navigation::get(self.url().to_string());
        self.enqueue(name, navigation)
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let node = self.required_node(selector)?;
        let Some((target, href)) = self.href_target(node) else {
            // No href anywhere on the ancestor chain: browser default applies.
            return Ok(());
        };

        let resolved = url::resolve(self.url(), &href);
        self.history.push(resolved.clone());
        let fragment = self
            .dom
            .attr(target, FRAGMENT_ATTR)
            .unwrap_or_else(|| DEFAULT_FRAGMENT.to_string());
        self.enqueue(&fragment, Navigation::get(resolved));
        Ok(())
    }

    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let node = self.required_node(selector)?;
        let form = if self
            .dom
            .tag_name(node)
            .map(|tag| tag.eq_ignore_ascii_case("form"))
            .unwrap_or(false)
        {
            node
        } else {
            self.dom
                .find_ancestor_by_tag(node, "form")
                .ok_or_else(|| Error::SelectorNotFound(format!("form for {selector}")))?
        };

        let method = forms::form_method(&self.dom, form);
        let action = self.dom.attr(form, "action").unwrap_or_default();
        let action = if action.is_empty() {
            self.url().to_string()
        } else {
            url::resolve(self.url(), &action)
        };

        let pairs = forms::serialize_form(&self.dom, form);
        let encoded = url::form_urlencode(&pairs);
        let navigation = match method {
            Method::Get => Navigation::get(url::with_query(&action, &encoded)),
            Method::Post => Navigation {
                url: action,
                method: Method::Post,
                body: Some(encoded),
            },
        };

        self.history.push(navigation.url.clone());
        self.disable_fragment_controls(DEFAULT_FRAGMENT)?;
        self.enqueue(DEFAULT_FRAGMENT, navigation);
        Ok(())
    }

    pub fn back(&mut self) -> bool {
        if !self.history.back() {
            return false;
        }
        self.on_pop_state();
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.history.forward() {
            return false;
        }
        self.on_pop_state();
        true
    }

    // The URL already changed when a popstate fires; re-fetch the fragment it
    // names without pushing a new entry.
    fn on_pop_state(&mut self) {
        let navigation = Navigation::get(self.url().to_string());
        let fragment = fragment_for(&navigation);
        self.enqueue(fragment, navigation);
    }

    pub fn complete(&mut self, id: FetchId, response_html: &str) -> Result<()> {
        let pos = self
            .pending
            .iter()
            .position(|request| request.id == id)
            .ok_or(Error::UnknownFetch(id.0))?;
        let request = self.pending.remove(pos);

        let state = self
            .fragment_states
            .get_mut(&request.fragment)
            .ok_or_else(|| Error::Dom(format!("no state for fragment {}", request.fragment)))?;
        if request.generation != state.generation {
            // A newer request for this fragment superseded the response.
            self.stale_drops += 1;
            return Ok(());
        }
        state.loading = false;

        self.apply_fragment(&request.fragment, response_html)?;
        self.update_positions()
    }

    pub fn fail(&mut self, id: FetchId, reason: &str) -> Result<()> {
        let pos = self
            .pending
            .iter()
            .position(|request| request.id == id)
            .ok_or(Error::UnknownFetch(id.0))?;
        let request = self.pending.remove(pos);

        if let Some(state) = self.fragment_states.get_mut(&request.fragment) {
            if state.generation == request.generation {
                state.loading = false;
            }
        }
        Err(Error::Fetch {
            url: request.url,
            reason: reason.to_string(),
        })
    }

    pub fn run_to_idle(&mut self, server: &mut dyn FragmentServer) -> Result<()> {
        while let Some(request) = self.pending.first().cloned() {
            match server.respond(&request) {
                Ok(body) => self.complete(request.id, &body)?,
                Err(reason) => self.fail(request.id, &reason)?,
            }
        }
        Ok(())
    }

    fn enqueue(&mut self, fragment: &str, navigation: Navigation) -> FetchId {
        let state = self
            .fragment_states
            .entry(fragment.to_string())
            .or_default();
        state.generation += 1;
        state.loading = true;
        let generation = state.generation;

        let id = FetchId(self.next_fetch_id);
        self.next_fetch_id += 1;

        let routed = route(&navigation);
        self.pending.push(FragmentRequest {
            id,
            fragment: fragment.to_string(),
            method: routed.method,
            url: routed.url,
            body: routed.body,
            generation,
        });
        id
    }

    fn apply_fragment(&mut self, name: &str, response_html: &str) -> Result<()> {
        let selector = format!(".{name}");
        let target = self
            .dom
            .query_selector(&selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.clone()))?;

        let response = html::parse_html(response_html)?;
        let replacement = response
            .query_selector(&selector)?
            .ok_or_else(|| Error::SelectorNotFound(format!("{selector} in fragment response")))?;

        let grafted = self.dom.graft_subtree(&response, replacement)?;
        self.dom.replace_node(target, grafted)
    }

    fn disable_fragment_controls(&mut self, fragment: &str) -> Result<()> {
        let selector = format!(".{fragment}");
        let Some(container) = self.dom.query_selector(&selector)? else {
            return Ok(());
        };
        for control in forms::form_controls_in(&self.dom, container) {
            self.dom.set_disabled(control, true)?;
        }
        Ok(())
    }

    fn href_target(&self, node: NodeId) -> Option<(NodeId, String)> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let Some(href) = self.dom.attr(current, "href") {
                return Some((current, href));
            }
            cursor = self.dom.parent(current);
        }
        None
    }

    fn required_node(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.into()))
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let node = self.required_node(selector)?;
        Ok(self.dom.text_content(node).trim().to_string())
    }

    pub fn style_property(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let node = self.required_node(selector)?;
        Ok(self.dom.style_property(node, name))
    }

    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let node = self.required_node(selector)?;
        Ok(self.dom.attr(node, name))
    }

    pub fn set_value(&mut self, selector: &str, value: &str) -> Result<()> {
        let node = self.required_node(selector)?;
        self.dom.set_value(node, value)
    }

    pub fn set_checked(&mut self, selector: &str, checked: bool) -> Result<()> {
        let node = self.required_node(selector)?;
        self.dom.set_checked(node, checked)
    }

    pub fn is_disabled(&self, selector: &str) -> Result<bool> {
        let node = self.required_node(selector)?;
        Ok(self.dom.disabled(node))
    }

    pub fn fragment_html(&self, name: &str) -> Result<String> {
        let selector = format!(".{name}");
        let node = self.required_node(&selector)?;
        Ok(self.dom.dump_node(node))
    }

    pub fn dump(&self) -> String {
        self.dom.dump()
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let actual = self.text(selector)?;
        if actual == expected {
            return Ok(());
        }
        Err(Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: truncate_chars(&self.dump(), 200),
        })
    }
}
