//! Browser-backed tests for the eoka driver.
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test -p shelfcheck-web --test e2e -- --ignored

use eoka::Browser;
use shelfcheck_web::{
    Collector, CollectorConfig, Driver, EokaDriver, Selectors, SettlePolicy, StopReason,
    TimingConfig, Waits,
};
use std::time::Duration;

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

async fn open(html: &str) -> (Browser, EokaDriver) {
    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");
    let driver = EokaDriver::new(page);
    driver
        .goto(&format!("data:text/html,{}", html))
        .await
        .expect("Failed to navigate");
    (browser, driver)
}

fn grid_selectors() -> Selectors {
    Selectors {
        product_card: ".card".into(),
        product_name: ".name".into(),
        product_price: ".price".into(),
        product_rating: ".rating".into(),
        load_more: "button.more".into(),
        ..Selectors::default()
    }
}

fn quick_timing() -> TimingConfig {
    TimingConfig {
        wait_timeout_ms: 3000,
        initial_settle: SettlePolicy::Fixed { ms: 100 },
        load_more_settle: SettlePolicy::Stable {
            quiet_ms: 200,
            max_ms: 2000,
        },
        ..TimingConfig::default()
    }
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_element_reads() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, driver) = open(
        r#"<div class="card"><span class="name"> TV 50 </span></div>
        <input type="checkbox" value="2500-5000" checked>
        <button disabled>Off</button>
        <p style="display:none">hidden</p>"#,
    )
    .await;

    let card = driver.find_element(".card").await.expect("card");
    let name = driver.find_element_in(&card, ".name").await.expect("name");
    assert_eq!(driver.text(&name).await.unwrap(), "TV 50");

    let checkbox = driver.find_element("input").await.unwrap();
    assert_eq!(
        driver.attribute(&checkbox, "value").await.unwrap(),
        Some("2500-5000".to_string())
    );
    assert_eq!(driver.attribute(&checkbox, "missing").await.unwrap(), None);
    assert!(driver.is_selected(&checkbox).await.unwrap());

    let button = driver.find_element("button").await.unwrap();
    assert!(!driver.is_enabled(&button).await.unwrap());

    let hidden = driver.find_element("p").await.unwrap();
    assert!(!driver.is_displayed(&hidden).await.unwrap());

    assert!(driver.find_element(".nothing").await.unwrap_err().is_not_found());

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_removed_element_is_stale() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, driver) = open(r#"<button id="b">Go</button>"#).await;

    let button = driver.find_element("button").await.unwrap();
    driver
        .evaluate("(() => { document.getElementById('b').remove(); return true; })()")
        .await
        .unwrap();

    assert!(driver.text(&button).await.unwrap_err().is_stale());
    assert!(driver.click(&button).await.unwrap_err().is_stale());

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_click_and_fill() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, driver) = open(
        r#"<input id="q" type="text">
        <input id="c" type="checkbox">"#,
    )
    .await;

    let input = driver.find_element("input[type='text']").await.unwrap();
    driver.fill(&input, "Smart TV").await.unwrap();
    let value = driver
        .evaluate("document.getElementById('q').value")
        .await
        .unwrap();
    assert_eq!(value.as_str(), Some("Smart TV"));

    let checkbox = driver.find_element("input[type='checkbox']").await.unwrap();
    driver.click(&checkbox).await.unwrap();
    assert!(driver.is_selected(&checkbox).await.unwrap());

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_collects_across_load_more() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, driver) = open(
        r#"<div id="grid">
          <div class="card"><span class="name">TV 1</span><span class="price">R$ 2.000,00</span></div>
        </div>
        <button class="more" onclick="
          document.getElementById('grid').insertAdjacentHTML('beforeend',
            '<div class=card><span class=name>TV 2</span><span class=price>R$ 4.500,00</span><span class=rating>4.7</span></div>');
          this.remove();">Mais</button>"#,
    )
    .await;

    let selectors = grid_selectors();
    let timing = quick_timing();
    let collector = Collector::new(&driver, &selectors, &timing, CollectorConfig::default());
    let collection = collector.collect_above_threshold(3500.0).await.unwrap();

    assert_eq!(collection.rounds, 2);
    assert_eq!(collection.stop, StopReason::Satisfied);
    assert_eq!(collection.records.len(), 1);
    assert_eq!(collection.records[0].name, "TV 2");
    assert_eq!(collection.records[0].price, 4500.0);
    assert_eq!(collection.records[0].rating, "4.7");

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_wait_for_delayed_element() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, driver) = open(
        r#"<script>
          setTimeout(() => document.body.insertAdjacentHTML('beforeend', '<p class=late>here</p>'), 500);
        </script>"#,
    )
    .await;

    let waits = Waits::new(&driver, Duration::from_secs(5), Duration::from_millis(100));
    waits.page_ready().await.unwrap();
    let late = waits.visible(".late").await.unwrap();
    assert_eq!(driver.text(&late).await.unwrap(), "here");

    browser.close().await.expect("Failed to close browser");
}
