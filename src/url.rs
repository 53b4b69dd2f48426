use super::*;

// Splits into (path part, query without '?', fragment with '#').
fn split_parts(url: &str) -> (&str, &str, &str) {
    let (without_fragment, fragment) = match url.find('#') {
        Some(pos) => (&url[..pos], &url[pos..]),
        None => (url, ""),
    };
    match without_fragment.find('?') {
        Some(pos) => (&without_fragment[..pos], &without_fragment[pos + 1..], fragment),
        None => (without_fragment, "", fragment),
    }
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(pair), String::new()),
        })
        .collect()
}

pub(crate) fn query_param(url: &str, key: &str) -> Option<String> {
    let (_, query, _) = split_parts(url);
    query_pairs(query)
        .into_iter()
        .find(|(pair_key, _)| pair_key == key)
        .map(|(_, value)| value)
}

pub(crate) fn with_query_param(url: &str, key: &str, value: &str) -> String {
    let (base, query, fragment) = split_parts(url);
    let mut pairs = query_pairs(query);
    if let Some(pos) = pairs.iter().position(|(pair_key, _)| pair_key == key) {
        pairs[pos].1 = value.to_string();
    } else {
        pairs.push((key.to_string(), value.to_string()));
    }
    format!("{base}?{}{fragment}", form_urlencode(&pairs))
}

pub(crate) fn with_query(url: &str, query: &str) -> String {
    let (base, _, fragment) = split_parts(url);
    if query.is_empty() {
        format!("{base}{fragment}")
    } else {
        format!("{base}?{query}{fragment}")
    }
}

fn has_scheme(url: &str) -> bool {
    let stop = url.find(['/', '?', '#']).unwrap_or(url.len());
    url.starts_with(|ch: char| ch.is_ascii_alphabetic()) && url[..stop].contains(':')
}

fn split_origin(url: &str) -> (&str, &str) {
    let Some(scheme_sep) = url.find("://") else {
        return ("", url);
    };
    let after = scheme_sep + 3;
    let end = url[after..]
        .find(['/', '?', '#'])
        .map(|pos| after + pos)
        .unwrap_or(url.len());
    (&url[..end], &url[end..])
}

pub(crate) fn resolve(base: &str, href: &str) -> String {
    if href.is_empty() {
        return base.to_string();
    }
    if has_scheme(href) {
        return href.to_string();
    }

    let (origin, base_rest) = split_origin(base);
    let (base_path, base_query, _) = split_parts(base_rest);

    if let Some(rest) = href.strip_prefix("//") {
        // Protocol-relative: keep the base scheme.
        return match base.split_once("://") {
            Some((scheme, _)) => format!("{scheme}://{rest}"),
            None => href.to_string(),
        };
    }

    if href.starts_with('#') {
        let query = if base_query.is_empty() {
            String::new()
        } else {
            format!("?{base_query}")
        };
        return format!("{origin}{base_path}{query}{href}");
    }

    if href.starts_with('?') {
        return format!("{origin}{base_path}{href}");
    }

    let (href_path, href_query, href_fragment) = split_parts(href);
    let mut tail = String::new();
    if !href_query.is_empty() {
        tail.push('?');
        tail.push_str(href_query);
    }
    tail.push_str(href_fragment);

    if href_path.starts_with('/') {
        return format!("{origin}{}{tail}", normalize_path(href_path));
    }

    let dir = match base_path.rfind('/') {
        Some(pos) => &base_path[..pos + 1],
        None => "",
    };
    let joined = format!("{dir}{href_path}");
    format!("{origin}{}{tail}", normalize_path(&joined))
}

fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let trailing_slash =
        path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..") || path == ".";
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return if absolute { "/".to_string() } else { "./".to_string() };
    }

    let mut out = String::new();
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if trailing_slash {
        out.push('/');
    }
    out
}

pub(crate) fn form_urlencode(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (idx, (key, value)) in pairs.iter().enumerate() {
        if idx > 0 {
            out.push('&');
        }
        out.push_str(&encode_component(key));
        out.push('=');
        out.push_str(&encode_component(value));
    }
    out
}

fn encode_component(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for byte in src.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

pub(crate) fn decode_component(src: &str) -> String {
    let bytes = src.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                let high = (bytes[i + 1] as char).to_digit(16).unwrap_or(0) as u8;
                let low = (bytes[i + 2] as char).to_digit(16).unwrap_or(0) as u8;
                out.push(high * 16 + low);
                i += 3;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
