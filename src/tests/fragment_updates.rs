use super::*;

#[test]
fn update_fragment_requests_the_current_url_in_html_mode() -> Result<()> {
    let mut page = Page::from_html_with_url("./?date=2024-05-01", GUIDE_HTML)?;
    page.update_fragment("main");

    let request = &page.pending_requests()[0];
    assert_eq!(request.fragment, "main");
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, "./?date=2024-05-01&mode=html");
    assert_eq!(page.load_state("main"), LoadState::Loading { generation: 1 });
    Ok(())
}

#[test]
fn completed_update_replaces_the_fragment_subtree() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let id = page.update_fragment("main");
    page.complete(id, &main_response("06"))?;

    assert_eq!(page.text("td.main-hour")?, "06");
    assert_eq!(page.load_state("main"), LoadState::Idle);
    // The untouched event fragment survives.
    page.assert_text("#event-title", "(no event selected)")?;
    Ok(())
}

#[test]
fn completion_reruns_positioning_on_the_new_cells() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    page.scroll_to(64, 32)?;

    let id = page.update_fragment("main");
    page.complete(id, &main_response("06"))?;

    assert_eq!(
        page.style_property("td.main-hour", "left")?,
        Some("64px".to_string())
    );
    assert_eq!(
        page.style_property("td.main-program", "top")?,
        Some("32px".to_string())
    );
    Ok(())
}

#[test]
fn stale_response_cannot_overwrite_a_newer_one() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let first = page.update_fragment("main");
    let second = page.update_fragment("main");

    page.complete(second, &main_response("07"))?;
    page.complete(first, &main_response("06"))?;

    assert_eq!(page.text("td.main-hour")?, "07");
    assert_eq!(page.stale_responses(), 1);
    assert_eq!(page.load_state("main"), LoadState::Idle);
    Ok(())
}

#[test]
fn stale_response_arriving_first_is_also_dropped() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let first = page.update_fragment("main");
    let second = page.update_fragment("main");

    page.complete(first, &main_response("06"))?;
    assert_eq!(page.text("td.main-hour")?, "05");
    assert_eq!(page.load_state("main"), LoadState::Loading { generation: 2 });

    page.complete(second, &main_response("07"))?;
    assert_eq!(page.text("td.main-hour")?, "07");
    Ok(())
}

#[test]
fn fragments_load_independently() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let main_id = page.update_fragment("main");
    page.update_fragment("event");

    page.complete(main_id, &main_response("06"))?;
    assert_eq!(page.load_state("main"), LoadState::Idle);
    assert_eq!(
        page.load_state("event"),
        LoadState::Loading { generation: 1 }
    );
    Ok(())
}

#[test]
fn failed_fetch_clears_loading_and_leaves_the_page_alone() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let before = page.dump();
    let id = page.update_fragment("main");

    let result = page.fail(id, "connection refused");
    assert!(matches!(result, Err(Error::Fetch { .. })));
    assert_eq!(page.load_state("main"), LoadState::Idle);
    assert_eq!(page.dump(), before);
    assert_eq!(page.history().len(), 1);
    Ok(())
}

#[test]
fn unknown_fetch_ids_are_rejected() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let id = page.update_fragment("main");
    page.complete(id, &main_response("06"))?;

    let result = page.complete(id, &main_response("07"));
    assert!(matches!(result, Err(Error::UnknownFetch(_))));
    Ok(())
}

#[test]
fn response_without_the_fragment_is_an_error() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let id = page.update_fragment("main");
    let result = page.complete(id, "<div class=\"other\"></div>");
    assert!(matches!(result, Err(Error::SelectorNotFound(_))));
    Ok(())
}

#[test]
fn run_to_idle_drains_the_queue_through_a_server() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let mut server = MockGuideServer::new()
        .page("./?mode=html", &main_response("06"))
        .page(
            "./?selected-event=40123&want-event=1&mode=html",
            EVENT_RESPONSE,
        );

    page.update_fragment("main");
    page.click("#event-link")?;
    page.run_to_idle(&mut server)?;

    assert!(page.pending_requests().is_empty());
    assert_eq!(server.requests.len(), 2);
    assert_eq!(page.text("td.main-hour")?, "06");
    page.assert_text("#event-title", "News at five")?;
    Ok(())
}

#[test]
fn run_to_idle_surfaces_server_refusals() -> Result<()> {
    let mut page = Page::from_html(GUIDE_HTML)?;
    let mut server = MockGuideServer::new();
    page.update_fragment("main");

    let result = page.run_to_idle(&mut server);
    assert!(matches!(result, Err(Error::Fetch { .. })));
    assert!(page.pending_requests().is_empty());
    Ok(())
}
