use async_trait::async_trait;
use jobtrail_core::{JobKey, SiteId, Timestamp};
use jobtrail_engine::{CardId, CardStyle, Highlight, JobBoard, Outcome, Page, Reconciler, Treatment};
use jobtrail_sites::{JobDescriptor, SiteRegistry};
use jobtrail_store::{MemoryStore, RecordStore, StoredJob};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Notify;

fn linkedin_card(id: &str) -> String {
    format!(
        r#"<div class="job-card-container" data-job-id="{id}">
             <a class="job-card-container__link"><span aria-hidden="true">Rust Engineer</span></a>
             <div class="artdeco-entity-lockup__subtitle"><span>Acme</span></div>
             <div class="artdeco-entity-lockup__caption"><ul><li><span>Berlin</span></li></ul></div>
           </div>"#
    )
}

const LINKEDIN_CARD_LOADING: &str = r#"<div class="job-card-container">
     <a class="job-card-container__link"><span aria-hidden="true">Rust Engineer</span></a>
   </div>"#;

fn xing_card(id: &str) -> String {
    format!(
        r#"<article data-xds="Card">
             <a class="card-styles__CardLink-sc-1 x" href="/jobs/{id}"></a>
             <h2 data-xds="Headline">Rust Engineer (m/w/d)</h2>
             <p class="teaser__Company-sc-2">Acme GmbH</p>
             <p class="teaser__City-sc-3">Berlin</p>
           </article>"#
    )
}

fn stepstone_card(id: &str) -> String {
    format!(
        r#"<article data-testid="job-item" id="job-item-{id}">
             <a data-testid="job-item-title" href="/stellenangebote--Rust-Engineer-Berlin-Acme--{id}-inline.html">Rust Engineer</a>
             <span data-at="job-item-company-name">Acme AG</span>
           </article>"#
    )
}

fn reconciler(site: &str, store: &Arc<MemoryStore>, page: &Page) -> Reconciler {
    let registry = SiteRegistry::with_defaults().expect("registry");
    let registration = registry
        .get(&SiteId::new(site).expect("valid site"))
        .expect("site registered")
        .clone();
    Reconciler::new(registration, store.clone(), page.clone())
}

async fn seed(store: &MemoryStore, site: &str, id: &str) {
    let descriptor = JobDescriptor {
        site: SiteId::new(site).expect("valid site"),
        local_id: Some(id.to_string()),
        title: "Rust Engineer".to_string(),
        company: "Acme".to_string(),
        location: "Berlin".to_string(),
    };
    let entry = StoredJob::merge(None, &descriptor, id, Timestamp::now());
    store
        .set(&JobKey::from_local_id(id).expect("valid key"), &entry)
        .await
        .expect("seed record");
}

async fn stored(store: &MemoryStore, id: &str) -> Option<StoredJob> {
    store
        .get(&JobKey::from_local_id(id).expect("valid key"))
        .await
        .expect("read record")
}

fn occurrences(entry: &StoredJob) -> Vec<(String, String)> {
    entry
        .job
        .occurrences
        .iter()
        .map(|(site, id)| (site.to_string(), id.clone()))
        .collect()
}

#[tokio::test]
async fn test_unseen_job_captured_on_hover() {
    let page = Page::new();
    page.insert(&stepstone_card("123456"));
    let store = Arc::new(MemoryStore::new());
    let reconciler = reconciler("stepstone", &store, &page);

    let report = reconciler.scan().await;
    let card = report.cards[0].card;
    assert_eq!(report.cards[0].outcome, Outcome::Treated(Treatment::DeferredCapture));
    assert_eq!(page.style(card).background, None);
    assert!(stored(&store, "123456").await.is_none());

    page.interact(card).await;

    let entry = stored(&store, "123456").await.expect("record created");
    assert_eq!(
        occurrences(&entry),
        vec![("stepstone".to_string(), "123456".to_string())]
    );
    assert_eq!(entry.job.company, "Acme AG");
    assert_eq!(page.style(card).background, Some(Highlight::Yellow));
}

#[tokio::test]
async fn test_partner_coverage_progresses_green_then_orange() {
    let page = Page::new();
    let store = Arc::new(MemoryStore::new());
    seed(&store, "linkedin", "42").await;

    // Xing card for a job known from LinkedIn.
    page.insert(&xing_card("42"));
    let xing = reconciler("xing", &store, &page);
    let report = xing.scan().await;
    let xing_card_id = report.cards[0].card;
    assert_eq!(
        report.cards[0].outcome,
        Outcome::Treated(Treatment::Highlight(Highlight::Green))
    );
    assert_eq!(page.style(xing_card_id).background, Some(Highlight::Green));

    page.interact(xing_card_id).await;
    let entry = stored(&store, "42").await.expect("record present");
    assert_eq!(
        occurrences(&entry),
        vec![
            ("linkedin".to_string(), "42".to_string()),
            ("xing".to_string(), "42".to_string()),
        ]
    );
    assert_eq!(entry.job.company, "Acme GmbH");
    assert_eq!(page.style(xing_card_id).background, Some(Highlight::Yellow));

    // A freshly rendered LinkedIn card for the same job.
    let node = page.insert(&linkedin_card("42"));
    let linkedin = reconciler("linkedin", &store, &page);
    let report = linkedin.scan().await;
    let line = report
        .cards
        .iter()
        .find(|line| line.card.node == node)
        .expect("new card scanned");
    assert_eq!(line.outcome, Outcome::Treated(Treatment::Highlight(Highlight::Orange)));
    assert_eq!(page.style(line.card).background, Some(Highlight::Orange));
    assert_eq!(page.listener_count(line.card), 0);
}

#[tokio::test]
async fn test_duplicate_suppressed_without_write() {
    let page = Page::new();
    let store = Arc::new(MemoryStore::new());
    seed(&store, "linkedin", "990000").await;
    let writes = store.write_count();

    page.insert(&stepstone_card("990000"));
    let stepstone = reconciler("stepstone", &store, &page);
    let report = stepstone.scan().await;
    let card = report.cards[0].card;

    assert_eq!(report.cards[0].outcome, Outcome::Treated(Treatment::Suppress));
    assert!(page.style(card).hidden);
    page.interact(card).await;
    assert_eq!(store.write_count(), writes);
}

#[tokio::test]
async fn test_no_write_without_interaction() {
    let page = Page::new();
    page.insert_all([
        linkedin_card("1").as_str(),
        linkedin_card("2").as_str(),
        linkedin_card("3").as_str(),
    ]);
    let store = Arc::new(MemoryStore::new());
    let linkedin = reconciler("linkedin", &store, &page);

    let report = linkedin.scan().await;
    assert_eq!(report.treated, 3);
    linkedin.scan().await;
    assert_eq!(store.write_count(), 0);
    assert!(store.get_all().await.expect("read all").is_empty());
}

#[tokio::test]
async fn test_marked_card_costs_nothing() {
    let page = Page::new();
    page.insert(&linkedin_card("7"));
    let store = Arc::new(MemoryStore::new());
    let linkedin = reconciler("linkedin", &store, &page);

    let report = linkedin.scan().await;
    let card = report.cards[0].card;
    let (reads, writes, style) = (store.read_count(), store.write_count(), page.style(card));

    let descriptor = JobDescriptor {
        site: SiteId::new("linkedin").expect("valid site"),
        local_id: Some("7".to_string()),
        title: "Changed".to_string(),
        company: String::new(),
        location: String::new(),
    };
    assert_eq!(linkedin.reconcile(card, Some(descriptor)).await, Outcome::AlreadyProcessed);
    assert_eq!(store.read_count(), reads);
    assert_eq!(store.write_count(), writes);
    assert_eq!(page.style(card), style);
}

#[tokio::test]
async fn test_repeated_captures_never_drop_sites() {
    let page = Page::new();
    let store = Arc::new(MemoryStore::new());
    seed(&store, "xing", "55").await;

    let first = page.insert(&linkedin_card("55"));
    let linkedin = reconciler("linkedin", &store, &page);
    linkedin.scan().await;
    page.interact(CardId { node: first, index: 0 }).await;

    // Re-rendered card, captured again after reset.
    linkedin.reset();
    let second = page.insert(&linkedin_card("55"));
    let report = linkedin.scan().await;
    assert!(report
        .cards
        .iter()
        .all(|line| line.outcome == Outcome::Treated(Treatment::Highlight(Highlight::Orange))));
    page.interact(CardId { node: second, index: 0 }).await;

    let entry = stored(&store, "55").await.expect("record present");
    assert!(entry.job.seen_on(&SiteId::new("xing").expect("valid site")));
    assert!(entry.job.seen_on(&SiteId::new("linkedin").expect("valid site")));
}

#[tokio::test]
async fn test_capture_failure_keeps_visuals_and_rearms() {
    let page = Page::new();
    page.insert(&xing_card("77"));
    let store = Arc::new(MemoryStore::new());
    let xing = reconciler("xing", &store, &page);

    let report = xing.scan().await;
    let card = report.cards[0].card;

    store.fail_writes(true);
    page.interact(card).await;
    assert_eq!(page.style(card).background, None);
    assert_eq!(page.listener_count(card), 1);
    assert_eq!(xing.armed_cards(), vec![card]);

    store.fail_writes(false);
    page.interact(card).await;
    assert_eq!(page.style(card).background, Some(Highlight::Yellow));
    assert!(stored(&store, "77").await.is_some());
    assert!(xing.armed_cards().is_empty());
}

#[tokio::test]
async fn test_lookup_failure_retried_next_scan() {
    let page = Page::new();
    page.insert(&xing_card("88"));
    let store = Arc::new(MemoryStore::new());
    seed(&store, "linkedin", "88").await;
    let xing = reconciler("xing", &store, &page);

    store.fail_reads(true);
    let report = xing.scan().await;
    let card = report.cards[0].card;
    assert_eq!(report.failed, 1);
    assert_eq!(page.style(card).background, None);
    assert!(!xing.marks().is_marked(card));

    store.fail_reads(false);
    let report = xing.scan().await;
    assert_eq!(report.treated, 1);
    assert_eq!(page.style(card).background, Some(Highlight::Green));
}

#[tokio::test]
async fn test_board_reset_clears_records_and_highlights() {
    let page = Page::new();
    let store = Arc::new(MemoryStore::new());
    seed(&store, "linkedin", "31").await;
    page.insert(&linkedin_card("31"));

    let board = JobBoard::new(store.clone());
    let linkedin = reconciler("linkedin", &store, &page);
    let report = linkedin.scan().await;
    let card = report.cards[0].card;
    assert_eq!(page.style(card).background, Some(Highlight::Yellow));

    board.reset().await.expect("reset");
    linkedin.reset();
    assert_eq!(page.style(card).background, None);

    let report = linkedin.scan().await;
    assert_eq!(report.cards[0].outcome, Outcome::Treated(Treatment::DeferredCapture));
    assert!(board.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_card_without_id_left_for_next_scan() {
    let page = Page::new();
    let placeholder = page.insert(LINKEDIN_CARD_LOADING);
    let store = Arc::new(MemoryStore::new());
    let linkedin = reconciler("linkedin", &store, &page);

    let report = linkedin.scan().await;
    let card = report.cards[0].card;
    assert_eq!(report.cards[0].outcome, Outcome::Skipped);
    assert_eq!(report.cards[0].key, None);
    assert!(!linkedin.marks().is_marked(card));
    assert_eq!(page.style(card), CardStyle::default());
    assert_eq!(page.listener_count(card), 0);
    assert_eq!(store.read_count(), 0);

    // Still unmarked, so the next pass looks at it again.
    let report = linkedin.scan().await;
    assert_eq!(report.cards[0].outcome, Outcome::Skipped);

    // The site finishes rendering the card with its id.
    page.remove(placeholder);
    let node = page.insert(&linkedin_card("64"));
    let report = linkedin.scan().await;
    assert_eq!(report.cards.len(), 1);
    let line = &report.cards[0];
    assert_eq!(line.card.node, node);
    assert_eq!(line.outcome, Outcome::Treated(Treatment::DeferredCapture));
    assert!(linkedin.marks().is_marked(line.card));
    assert_eq!(page.listener_count(line.card), 1);
}

/// Store whose reads wait until the test releases them.
#[derive(Default)]
struct GatedStore {
    inner: MemoryStore,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn get(&self, key: &JobKey) -> jobtrail_store::Result<Option<StoredJob>> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.get(key).await
    }

    async fn get_all(&self) -> jobtrail_store::Result<BTreeMap<JobKey, StoredJob>> {
        self.inner.get_all().await
    }

    async fn set(&self, key: &JobKey, value: &StoredJob) -> jobtrail_store::Result<()> {
        self.inner.set(key, value).await
    }

    async fn clear(&self) -> jobtrail_store::Result<()> {
        self.inner.clear().await
    }
}

#[tokio::test]
async fn test_card_removed_during_lookup_untouched() {
    let page = Page::new();
    let node = page.insert(&linkedin_card("65"));
    let card = CardId { node, index: 0 };
    let store = Arc::new(GatedStore::default());
    let registry = SiteRegistry::with_defaults().expect("registry");
    let registration = registry
        .get(&SiteId::new("linkedin").expect("valid site"))
        .expect("site registered")
        .clone();
    let linkedin = Reconciler::new(registration, store.clone(), page.clone());

    let descriptor = JobDescriptor {
        site: SiteId::new("linkedin").expect("valid site"),
        local_id: Some("65".to_string()),
        title: "Rust Engineer".to_string(),
        company: "Acme".to_string(),
        location: "Berlin".to_string(),
    };

    let (outcome, ()) = tokio::join!(linkedin.reconcile(card, Some(descriptor)), async {
        store.entered.notified().await;
        page.remove(node);
        store.release.notify_one();
    });

    assert_eq!(outcome, Outcome::Skipped);
    assert!(!linkedin.marks().is_marked(card));
    assert!(linkedin.armed_cards().is_empty());
    assert_eq!(page.listener_count(card), 0);
    assert_eq!(store.inner.write_count(), 0);
}
