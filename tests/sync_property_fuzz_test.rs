use guide_sync::{FetchId, Page};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseError, TestCaseResult};

const SYNC_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/sync_property_fuzz_test.txt";
const DEFAULT_SYNC_PROPTEST_CASES: u32 = 128;

fn sync_proptest_cases() -> u32 {
    std::env::var("GUIDE_SYNC_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SYNC_PROPTEST_CASES)
}

fn guide_html(hours: usize, programs: usize) -> String {
    let mut cells = String::new();
    for idx in 0..hours {
        cells.push_str(&format!(r#"<td class="main-hour" id="h{idx}">{idx}</td>"#));
    }
    for idx in 0..programs {
        cells.push_str(&format!(r#"<td class="main-program" id="p{idx}">{idx}</td>"#));
    }
    format!(r#"<div class="main"><table><tr>{cells}</tr></table></div>"#)
}

fn check_positions_mirror_offsets(
    hours: usize,
    programs: usize,
    offsets: &[(i64, i64)],
) -> TestCaseResult {
    let mut page = Page::from_html(&guide_html(hours, programs))
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;

    for (x, y) in offsets.iter().copied() {
        page.scroll_to(x, y)
            .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;

        for idx in 0..hours {
            let left = page
                .style_property(&format!("#h{idx}"), "left")
                .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
            prop_assert_eq!(left, Some(format!("{x}px")), "hour cell {} at ({}, {})", idx, x, y);
        }
        for idx in 0..programs {
            let top = page
                .style_property(&format!("#p{idx}"), "top")
                .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
            prop_assert_eq!(top, Some(format!("{y}px")), "program cell {} at ({}, {})", idx, x, y);
        }
    }
    Ok(())
}

fn check_latest_generation_wins(order: &[usize]) -> TestCaseResult {
    let count = order.len();
    let mut page = Page::from_html(r#"<div class="main"><p id="stamp">initial</p></div>"#)
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;

    let ids: Vec<FetchId> = (0..count).map(|_| page.update_fragment("main")).collect();
    for idx in order.iter().copied() {
        page.complete(
            ids[idx],
            &format!(r#"<div class="main"><p id="stamp">{idx}</p></div>"#),
        )
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    }

    let stamp = page
        .text("#stamp")
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    prop_assert_eq!(
        stamp,
        (count - 1).to_string(),
        "completion order {:?} let a stale response win",
        order
    );
    prop_assert_eq!(page.stale_responses(), (count - 1) as u64);
    Ok(())
}

fn completion_order_strategy() -> BoxedStrategy<Vec<usize>> {
    (1usize..=6)
        .prop_flat_map(|count| Just((0..count).collect::<Vec<_>>()).prop_shuffle())
        .boxed()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: sync_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(SYNC_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn positions_mirror_every_scroll_offset(
        hours in 0usize..5,
        programs in 0usize..5,
        offsets in vec((-10_000i64..10_000, -10_000i64..10_000), 1..=8),
    ) {
        check_positions_mirror_offsets(hours, programs, &offsets)?;
    }

    #[test]
    fn latest_fragment_generation_wins_any_completion_order(
        order in completion_order_strategy(),
    ) {
        check_latest_generation_wins(&order)?;
    }
}
