use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::{extract_statement, process_batch};
use crate::categorize::Categorizer;
use crate::config::{self, Config};
use crate::db::{Database, StatementRecord, TransactionStore};
use crate::extract::{Bank, Extraction, Extractor, StatementContext};
use crate::models::{Category, StatementInput, StatementPeriod, StatementSource};
use crate::reconcile::{apply_plan, plan_remediation, validate_statement, ApplyOptions, RemediationPlan};
use crate::source::source_for;

pub(crate) fn as_cli(args: &[String], cfg: &Config, db: &mut Database) -> Result<()> {
    match args[1].as_str() {
        "extract" => cli_extract(&args[2..], cfg),
        "import" => cli_import(&args[2..], cfg, db),
        "batch" => cli_batch(&args[2..], cfg, db),
        "validate" => cli_validate(&args[2..], cfg, db),
        "apply" => cli_apply(&args[2..], db),
        "review" => cli_review(&args[2..], db),
        "export" => cli_export(&args[2..], db),
        "recategorize" => cli_recategorize(&args[2..], cfg, db),
        "config" => cli_config(&args[2..], cfg),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("cardledger {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("cardledger - credit-card statements to a deduplicated ledger");
    println!();
    println!("Usage: cardledger [-v|-q] <command>");
    println!();
    println!("Commands:");
    println!("  extract <file> --resource <id> --statement <id>   Print the transactions in a statement");
    let banks: Vec<&str> = Bank::all().iter().map(Bank::as_str).collect();
    println!("    --bank <name>               Skip detection ({})", banks.join(", "));
    println!("    --period <from>..<to>       Statement period, YYYY-MM-DD");
    println!("    --json                      Print JSON instead of a table");
    println!("  import <file> --resource <id> --statement <id>    Extract and store new transactions");
    println!("    --pdf --password <pw>       <file> is an encrypted PDF (needs pdftotext)");
    println!("  batch <dir> --resource <id>   Import every *.txt in <dir>; statement id = file stem");
    println!("    --workers <n>               Concurrent statements (default from config)");
    println!("  validate <file> --resource <id> --statement <id>  Diff a statement against the store");
    println!("    --out <dir>                 Where to write <statement>.report.json / .plan.json");
    println!("  apply <plan.json>             Apply a remediation plan");
    println!("    --confirm-removals          Also delete rows the statement does not contain");
    println!("    --only <1,3>                Apply only these operation numbers");
    println!("  review [--resource <id>]      List transactions flagged for review");
    println!("  export <file.csv> [--resource <id>]   Export stored transactions");
    println!("  recategorize [--resource <id>]        Re-run category rules on stored `Other` rows");
    println!("  config init|show              Write or print the configuration");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}

// ── Argument helpers ─────────────────────────────────────────

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn require<'a>(args: &'a [String], flag: &str, usage: &str) -> Result<&'a str> {
    flag_value(args, flag).ok_or_else(|| anyhow::anyhow!("Missing {flag}. Usage: {usage}"))
}

fn positional<'a>(args: &'a [String], usage: &str) -> Result<&'a str> {
    args.first()
        .filter(|a| !a.starts_with('-'))
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Usage: {usage}"))
}

fn parse_period(s: &str) -> Result<StatementPeriod> {
    let (from, to) = s
        .split_once("..")
        .ok_or_else(|| anyhow::anyhow!("Period must look like 2025-08-01..2025-08-31"))?;
    let start = NaiveDate::parse_from_str(from.trim(), "%Y-%m-%d")
        .with_context(|| format!("bad period start '{from}'"))?;
    let end = NaiveDate::parse_from_str(to.trim(), "%Y-%m-%d")
        .with_context(|| format!("bad period end '{to}'"))?;
    if end < start {
        anyhow::bail!("Period ends before it starts: {s}");
    }
    Ok(StatementPeriod { start, end })
}

fn parse_only(s: &str) -> Result<Vec<usize>> {
    s.split(',')
        .map(|n| {
            n.trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| anyhow::anyhow!("--only takes 1-based numbers, got '{n}'"))
        })
        .collect()
}

/// Common `<file> --resource --statement [--bank] [--period] [--pdf --password]` shape.
fn statement_input(args: &[String], usage: &str) -> Result<StatementInput> {
    let file = PathBuf::from(shellexpand(positional(args, usage)?));
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let source = if has_flag(args, "--pdf") {
        let password = require(args, "--password", usage)?;
        StatementSource::Pdf {
            path: file,
            password: password.to_string(),
        }
    } else {
        StatementSource::Text(file)
    };
    Ok(StatementInput {
        statement_id: require(args, "--statement", usage)?.to_string(),
        resource_identifier: require(args, "--resource", usage)?.to_string(),
        period: flag_value(args, "--period").map(parse_period).transpose()?,
        bank: flag_value(args, "--bank").map(str::to_string),
        source,
    })
}

fn read_statement(input: &StatementInput) -> Result<(StatementContext, String)> {
    let ctx = StatementContext::from_input(input)?;
    let text = source_for(&input.source).read_text(&input.statement_id)?;
    Ok((ctx, text))
}

fn persist(db: &mut Database, input: &StatementInput, extraction: &Extraction) -> Result<usize> {
    db.upsert_statement(&StatementRecord {
        id: input.statement_id.clone(),
        resource_identifier: input.resource_identifier.clone(),
        period: input.period,
        bank: extraction.bank.as_str().to_string(),
    })?;
    db.insert_transactions_batch(&extraction.transactions)
}

// ── Commands ─────────────────────────────────────────────────

fn cli_extract(args: &[String], cfg: &Config) -> Result<()> {
    let usage = "cardledger extract <file> --resource <id> --statement <id> [--bank <name>] [--json]";
    let input = statement_input(args, usage)?;
    let (ctx, text) = read_statement(&input)?;
    let extraction = Extractor::new(cfg).extract(&text, &ctx)?;

    if has_flag(args, "--json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&extraction).context("serialize extraction")?
        );
        return Ok(());
    }

    println!(
        "{:<10} {:<32} {:>12} {:<6} {:<14} Review",
        "Date", "Description", "Amount", "Type", "Category"
    );
    println!("{}", "─".repeat(86));
    for t in &extraction.transactions {
        println!(
            "{:<10} {:<32} {:>12.2} {:<6} {:<14} {}",
            t.date,
            truncate(&t.description, 32),
            t.amount,
            t.kind.as_str(),
            t.category.as_str(),
            t.ambiguous_reason().unwrap_or_default(),
        );
    }
    let debits = extraction.transactions.iter().filter(|t| t.is_debit()).count();
    let credits = extraction.transactions.iter().filter(|t| t.is_credit()).count();
    let net: rust_decimal::Decimal = extraction.transactions.iter().map(|t| t.signed_amount()).sum();
    println!();
    println!(
        "{} ({}): {} debits, {} credits, net {:.2}",
        ctx.statement_id, extraction.bank, debits, credits, net
    );
    println!(
        "{} flagged, {} lines skipped, {} rows discarded",
        extraction.flagged(),
        extraction.skipped_lines,
        extraction.discarded_rows,
    );
    Ok(())
}

fn cli_import(args: &[String], cfg: &Config, db: &mut Database) -> Result<()> {
    let usage = "cardledger import <file> --resource <id> --statement <id> [--pdf --password <pw>]";
    let input = statement_input(args, usage)?;
    let (ctx, text) = read_statement(&input)?;
    let extraction = Extractor::new(cfg).extract(&text, &ctx)?;

    let count = persist(db, &input, &extraction)?;
    let dupes = extraction.transactions.len() - count;
    println!("Detected format: {}", extraction.bank);
    println!("Imported {count} new transactions ({dupes} duplicates skipped)");
    println!("Store holds {} transactions", db.get_transaction_count()?);
    if extraction.flagged() > 0 {
        println!(
            "{} transactions need review (cardledger review --resource {})",
            extraction.flagged(),
            input.resource_identifier
        );
    }
    Ok(())
}

fn cli_batch(args: &[String], cfg: &Config, db: &mut Database) -> Result<()> {
    let usage = "cardledger batch <dir> --resource <id> [--workers <n>]";
    let dir = PathBuf::from(shellexpand(positional(args, usage)?));
    let resource = require(args, "--resource", usage)?;
    let workers = match flag_value(args, "--workers") {
        Some(n) => n
            .parse::<usize>()
            .with_context(|| format!("--workers takes a number, got '{n}'"))?,
        None => cfg.batch.workers,
    };

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("read {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    if files.is_empty() {
        println!("No .txt statements in {}", dir.display());
        return Ok(());
    }

    let inputs: Vec<StatementInput> = files
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            Some(StatementInput::from_text_file(path, resource, &stem))
        })
        .collect();

    let extractor = Extractor::new(cfg);
    let results = process_batch(&inputs, workers, |input| extract_statement(&extractor, input));

    let mut failed = 0;
    for (input, result) in inputs.iter().zip(&results) {
        match result {
            Ok(extraction) => {
                let count = persist(db, input, extraction)?;
                println!(
                    "  {:<24} {:<8} {} new, {} duplicate, {} flagged",
                    input.statement_id,
                    extraction.bank.as_str(),
                    count,
                    extraction.transactions.len() - count,
                    extraction.flagged(),
                );
            }
            Err(e) => {
                failed += 1;
                println!("  {:<24} FAILED   {e}", input.statement_id);
            }
        }
    }
    println!("{} statements, {} failed", inputs.len(), failed);
    Ok(())
}

fn cli_validate(args: &[String], cfg: &Config, db: &mut Database) -> Result<()> {
    let usage = "cardledger validate <file> --resource <id> --statement <id> [--out <dir>]";
    let mut input = statement_input(args, usage)?;
    if input.period.is_none() {
        input.period = db
            .get_statement(&input.statement_id)?
            .and_then(|stored| stored.period);
    }
    let out_dir = PathBuf::from(shellexpand(flag_value(args, "--out").unwrap_or(".")));
    fs::create_dir_all(&out_dir).with_context(|| format!("create {}", out_dir.display()))?;

    let ctx = StatementContext::from_input(&input)?;
    let extractor = Extractor::new(cfg);
    let report = match source_for(&input.source).read_text(&input.statement_id) {
        Ok(text) => validate_statement(&extractor, &text, &ctx, &*db)?,
        Err(e) => {
            log::error!("{e}");
            let persisted = db.transactions_for_statement(&ctx.statement_id)?;
            crate::reconcile::failed_report(&ctx, persisted, &e)
        }
    };

    let report_path = out_dir.join(format!("{}.report.json", ctx.statement_id));
    let json = serde_json::to_string_pretty(&report).context("serialize report")?;
    fs::write(&report_path, json).with_context(|| format!("write {}", report_path.display()))?;
    println!("{}", report.summary());
    println!("Report written to {}", report_path.display());

    match plan_remediation(&report) {
        Some(plan) => {
            let plan_path = out_dir.join(format!("{}.plan.json", ctx.statement_id));
            plan.save(&plan_path)?;
            println!();
            println!("Proposed operations:");
            for (i, op) in plan.operations.iter().enumerate() {
                println!("  {:>3}. {}", i + 1, op.describe());
            }
            println!("Plan written to {}", plan_path.display());
            println!("Review it, then: cardledger apply {}", plan_path.display());
        }
        None if report.is_clean() => println!("No drift."),
        None => {}
    }
    Ok(())
}

fn cli_apply(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "cardledger apply <plan.json> [--confirm-removals] [--only 1,3]";
    let path = PathBuf::from(shellexpand(positional(args, usage)?));
    let plan = RemediationPlan::load(&path)?;
    let opts = ApplyOptions {
        confirm_removals: has_flag(args, "--confirm-removals"),
        only: flag_value(args, "--only").map(parse_only).transpose()?,
    };

    let summary = apply_plan(&plan, db, &opts)?;
    println!(
        "{}: {} added, {} updated, {} removed, {} skipped",
        plan.statement_id, summary.added, summary.updated, summary.removed, summary.skipped
    );
    if !opts.confirm_removals && plan.operations.iter().any(|op| op.is_remove()) {
        println!("Removals were held back; rerun with --confirm-removals to apply them.");
    }
    Ok(())
}

fn cli_review(args: &[String], db: &mut Database) -> Result<()> {
    let resource = flag_value(args, "--resource");
    let txns = db.needing_review(resource)?;
    if txns.is_empty() {
        println!("Nothing to review");
        return Ok(());
    }

    println!(
        "{:<20} {:<10} {:<28} {:>12} {:<6} Reasons",
        "ID", "Date", "Description", "Amount", "Type"
    );
    println!("{}", "─".repeat(100));
    for t in &txns {
        println!(
            "{:<20} {:<10} {:<28} {:>12.2} {:<6} {}",
            t.id,
            t.date,
            truncate(&t.description, 28),
            t.amount,
            t.kind.as_str(),
            t.ambiguous_reason().unwrap_or_default(),
        );
    }
    println!("{} transactions need review", txns.len());
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let resource = flag_value(args, "--resource");
    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/cardledger-export.csv")
        });

    let count = db.export_to_csv(Path::new(&output_path), resource)?;
    if count == 0 {
        println!("No transactions to export");
    } else {
        println!("Exported {count} transactions to {output_path}");
    }
    Ok(())
}

fn cli_recategorize(args: &[String], cfg: &Config, db: &mut Database) -> Result<()> {
    let resource = flag_value(args, "--resource");
    let mut txns = db.get_transactions(resource)?;
    let before: Vec<Category> = txns.iter().map(|t| t.category).collect();
    Categorizer::new(&cfg.categories).categorize_batch(&mut txns);

    let mut changed = 0;
    for (txn, old) in txns.iter().zip(before) {
        if txn.category != old && db.update_transaction(txn)? {
            log::debug!("{}: {old} -> {}", txn.id, txn.category);
            changed += 1;
        }
    }
    println!("{changed} of {} transactions recategorized", txns.len());
    Ok(())
}

fn cli_config(args: &[String], cfg: &Config) -> Result<()> {
    let path = config::config_path()?;
    match args.first().map(String::as_str) {
        Some("init") => {
            if path.exists() && !has_flag(args, "--force") {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::save_config(&Config::default(), &path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Some("show") | None => {
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
        }
        Some(other) => anyhow::bail!("Unknown config command: {other} (expected init or show)"),
    }
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
