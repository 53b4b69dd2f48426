use super::*;

fn guide_dom() -> Result<Dom> {
    html::parse_html(GUIDE_HTML)
}

#[test]
fn class_and_tag_steps_match() -> Result<()> {
    let dom = guide_dom()?;
    assert_eq!(dom.query_selector_all("td.main-hour")?.len(), 1);
    assert_eq!(dom.query_selector_all("td")?.len(), 3);
    assert_eq!(dom.query_selector_all(".main")?.len(), 1);
    assert!(dom.query_selector("td.missing")?.is_none());
    Ok(())
}

#[test]
fn selector_groups_merge_without_duplicates() -> Result<()> {
    let dom = guide_dom()?;
    assert_eq!(dom.query_selector_all("td.main-hour, td.main-program")?.len(), 2);
    assert_eq!(dom.query_selector_all("td.main-hour, td")?.len(), 3);
    Ok(())
}

#[test]
fn id_and_attribute_conditions_match() -> Result<()> {
    let dom = guide_dom()?;
    assert!(dom.query_selector("#event-link")?.is_some());
    assert!(dom.query_selector("a[data-fragment]")?.is_some());
    assert!(dom.query_selector("a[data-fragment=event]")?.is_some());
    assert!(dom.query_selector("a[data-fragment='event']")?.is_some());
    assert!(dom.query_selector("a[data-fragment=other]")?.is_none());
    Ok(())
}

#[test]
fn descendant_and_child_combinators_match() -> Result<()> {
    let dom = guide_dom()?;
    assert_eq!(dom.query_selector_all(".main td")?.len(), 3);
    assert!(dom.query_selector("table > tr")?.is_some());
    assert!(dom.query_selector("table > td")?.is_none());
    assert!(dom.query_selector(".event td")?.is_none());
    Ok(())
}

#[test]
fn compound_steps_require_every_condition() -> Result<()> {
    let dom = guide_dom()?;
    assert!(dom.query_selector("a#event-link[data-fragment=event]")?.is_some());
    assert!(dom.query_selector("td#event-link")?.is_none());
    Ok(())
}

#[test]
fn unsupported_selectors_are_rejected() {
    let dom = guide_dom().unwrap();
    assert!(matches!(
        dom.query_selector(""),
        Err(Error::UnsupportedSelector(_))
    ));
    assert!(matches!(
        dom.query_selector("td >"),
        Err(Error::UnsupportedSelector(_))
    ));
    assert!(matches!(
        dom.query_selector("td:first-child"),
        Err(Error::UnsupportedSelector(_))
    ));
    assert!(matches!(
        dom.query_selector("td, , a"),
        Err(Error::UnsupportedSelector(_))
    ));
}
