//! Subcommand implementations. Output goes to the given writer.

use crate::cli::ScanArgs;
use crate::context::AppContext;
use anyhow::{anyhow, bail, Context, Result};
use jobtrail_core::AppConfig;
use jobtrail_engine::{Highlight, JobBoard, ObservationScheduler, Outcome, Page, ScanReport, Treatment};
use std::io::Write;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Reconcile a saved listing page once, optionally hovering every pending card.
pub async fn scan(ctx: &AppContext, args: &ScanArgs, out: &mut dyn Write) -> Result<ScanReport> {
    let html = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let page = Page::from_html(&html);
    let debounce = ctx.config.observer.debounce();

    let scheduler = match (&args.site, &args.url) {
        (Some(site), _) => ObservationScheduler::for_site(
            &ctx.registry,
            site,
            ctx.store.clone(),
            page.clone(),
            debounce,
        )?,
        (None, Some(raw)) => {
            let url = Url::parse(raw).with_context(|| format!("invalid URL: {raw}"))?;
            let host = url
                .host_str()
                .ok_or_else(|| anyhow!("URL has no host: {raw}"))?;
            ObservationScheduler::for_host(&ctx.registry, host, ctx.store.clone(), page.clone(), debounce)?
        }
        (None, None) => bail!("either --site or --url is required"),
    };

    let report = scheduler.scan_now().await;
    for line in &report.cards {
        let key = line.key.as_ref().map_or("-", |key| key.as_str());
        writeln!(out, "{:<8} {:<24} {}", line.card.to_string(), key, describe(line.outcome))?;
    }
    writeln!(out, "{report}")?;

    if args.interact_all {
        let armed = scheduler.reconciler().armed_cards();
        debug!(cards = armed.len(), "simulating interaction");
        for card in &armed {
            page.interact(*card).await;
        }
        let captured = armed
            .iter()
            .filter(|card| page.style(**card).background == Some(Highlight::Yellow))
            .count();
        writeln!(out, "Captured {captured} of {} pending card(s).", armed.len())?;
        writeln!(out)?;
        list(ctx, false, out).await?;
    }

    Ok(report)
}

fn describe(outcome: Outcome) -> String {
    match outcome {
        Outcome::Treated(Treatment::DeferredCapture) => "new: captured on hover".to_string(),
        Outcome::Treated(treatment) => treatment.to_string(),
        Outcome::AlreadyProcessed => "already processed".to_string(),
        Outcome::Skipped => "skipped: no job id".to_string(),
        Outcome::Failed => "failed: store unavailable".to_string(),
    }
}

/// Print every tracked job. Returns how many were printed.
pub async fn list(ctx: &AppContext, json: bool, out: &mut dyn Write) -> Result<usize> {
    let board = JobBoard::new(ctx.store.clone());
    let listings = board.list().await?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &listings)?;
        writeln!(out)?;
        return Ok(listings.len());
    }

    if listings.is_empty() {
        writeln!(out, "No jobs tracked yet.")?;
        return Ok(0);
    }

    for listing in &listings {
        let sites: Vec<&str> = listing.sites.iter().map(|site| site.as_str()).collect();
        writeln!(
            out,
            "{}  {} | {} | {}  [{}]  saved {}",
            listing.key,
            or_dash(&listing.title),
            or_dash(&listing.company),
            or_dash(&listing.location),
            sites.join(", "),
            listing.saved_at
        )?;
    }
    Ok(listings.len())
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

/// Forget every tracked job.
pub async fn reset(ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
    JobBoard::new(ctx.store.clone()).reset().await?;
    writeln!(out, "All jobs reset.")?;
    Ok(())
}

/// Print the effective configuration, or write the defaults to `path`.
pub fn config(config: &AppConfig, init: bool, path: &Path, out: &mut dyn Write) -> Result<()> {
    if init {
        AppConfig::default()
            .save_to(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writeln!(out, "Wrote default configuration to {}", path.display())?;
        return Ok(());
    }

    writeln!(out, "# {}", path.display())?;
    write!(out, "{}", toml::to_string_pretty(config)?)?;
    Ok(())
}
