use super::*;

// Textarea and select values come from content rather than a value attribute,
// so a freshly parsed tree needs one seeding pass.
pub(crate) fn initialize_control_values(dom: &mut Dom) -> Result<()> {
    let mut nodes = Vec::new();
    dom.collect_elements_dfs(dom.root, &mut nodes);
    for node in nodes {
        let Some(tag) = dom.tag_name(node).map(str::to_ascii_lowercase) else {
            continue;
        };
        if tag == "textarea" {
            let text = dom.text_content(node);
            dom.set_value(node, &text)?;
        } else if tag == "select" {
            let value = select_value(dom, node);
            dom.set_value(node, &value)?;
        }
    }
    Ok(())
}

pub(crate) fn is_form_control(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    element.tag_name.eq_ignore_ascii_case("input")
        || element.tag_name.eq_ignore_ascii_case("select")
        || element.tag_name.eq_ignore_ascii_case("textarea")
        || element.tag_name.eq_ignore_ascii_case("button")
}

pub(crate) fn form_controls_in(dom: &Dom, root: NodeId) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    dom.collect_descendants_dfs(root, &mut nodes);
    nodes
        .into_iter()
        .filter(|node| is_form_control(dom, *node))
        .collect()
}

pub(crate) fn form_method(dom: &Dom, form: NodeId) -> Method {
    match dom.attr(form, "method") {
        Some(method) if !method.eq_ignore_ascii_case("get") => Method::Post,
        _ => Method::Get,
    }
}

// Successful controls in tree order, per the HTML form submission rules the
// original relied on through jQuery's serializeArray.
pub(crate) fn serialize_form(dom: &Dom, form: NodeId) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for control in form_controls_in(dom, form) {
        let Some(name) = dom.attr(control, "name").filter(|name| !name.is_empty()) else {
            continue;
        };
        if dom.disabled(control) {
            continue;
        }

        let tag = dom
            .tag_name(control)
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match tag.as_str() {
            "select" => out.push((name, select_value(dom, control))),
            "textarea" => out.push((name, dom.value(control).unwrap_or_default())),
            "input" => {
                let kind = input_type(dom, control);
                match kind.as_str() {
                    "submit" | "button" | "reset" | "image" | "file" => {}
                    "checkbox" | "radio" => {
                        if dom.element(control).is_some_and(|element| element.checked) {
                            let value = dom.value(control).unwrap_or_default();
                            let value = if value.is_empty() {
                                "on".to_string()
                            } else {
                                value
                            };
                            out.push((name, value));
                        }
                    }
                    _ => out.push((name, dom.value(control).unwrap_or_default())),
                }
            }
            // Buttons only participate as the submitter, which this model
            // does not track.
            _ => {}
        }
    }
    out
}

fn input_type(dom: &Dom, node_id: NodeId) -> String {
    dom.attr(node_id, "type")
        .map(|kind| kind.to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string())
}

fn select_value(dom: &Dom, select_node: NodeId) -> String {
    let mut options = Vec::new();
    collect_select_options(dom, select_node, &mut options);
    if options.is_empty() {
        return String::new();
    }

    let selected = options
        .iter()
        .copied()
        .find(|option| dom.attr(*option, "selected").is_some())
        .unwrap_or(options[0]);
    option_effective_value(dom, selected)
}

fn collect_select_options(dom: &Dom, node: NodeId, out: &mut Vec<NodeId>) {
    let mut nodes = Vec::new();
    dom.collect_descendants_dfs(node, &mut nodes);
    for candidate in nodes {
        if dom
            .tag_name(candidate)
            .map(|tag| tag.eq_ignore_ascii_case("option"))
            .unwrap_or(false)
        {
            out.push(candidate);
        }
    }
}

fn option_effective_value(dom: &Dom, option_node: NodeId) -> String {
    if let Some(value) = dom.attr(option_node, "value") {
        return value;
    }
    dom.text_content(option_node)
}
