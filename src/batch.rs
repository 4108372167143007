use crossbeam_channel::bounded;
use std::thread;

use crate::error::StatementError;
use crate::extract::{Extraction, Extractor, StatementContext};
use crate::models::StatementInput;
use crate::source::source_for;

pub(crate) type StatementResult = Result<Extraction, StatementError>;

/// Read and extract one statement. Used as the batch pipeline by the CLI.
pub(crate) fn extract_statement(extractor: &Extractor, input: &StatementInput) -> StatementResult {
    let ctx = StatementContext::from_input(input)?;
    let text = source_for(&input.source).read_text(&input.statement_id)?;
    extractor.extract(&text, &ctx)
}

/// Run `pipeline` over every input with at most `workers` threads.
///
/// Jobs go out over a bounded channel as `(index, input)` and come back
/// tagged with the same index, so results are returned in input order. A
/// failed statement is just an `Err` in its slot; the others still run.
pub(crate) fn process_batch<F>(inputs: &[StatementInput], workers: usize, pipeline: F) -> Vec<StatementResult>
where
    F: Fn(&StatementInput) -> StatementResult + Sync,
{
    let workers = workers.clamp(1, inputs.len().max(1));
    let (job_tx, job_rx) = bounded::<(usize, &StatementInput)>(workers);
    let (result_tx, result_rx) = bounded::<(usize, StatementResult)>(inputs.len());
    let pipeline = &pipeline;

    thread::scope(|scope| {
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok((i, input)) = rx.recv() {
                    let result = pipeline(input);
                    if let Err(e) = &result {
                        log::error!("{}: {e}", input.statement_id);
                    }
                    if tx.send((i, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(job_rx);

        for job in inputs.iter().enumerate() {
            if job_tx.send(job).is_err() {
                log::error!("batch workers exited early, {} statements not queued", inputs.len() - job.0);
                break;
            }
        }
        drop(job_tx);
    });
    drop(result_tx);

    let mut slots: Vec<Option<StatementResult>> = inputs.iter().map(|_| None).collect();
    for (i, result) in result_rx.iter() {
        slots[i] = Some(result);
    }

    slots
        .into_iter()
        .zip(inputs)
        .map(|(slot, input)| {
            slot.unwrap_or_else(|| {
                Err(StatementError::Source {
                    statement_id: input.statement_id.clone(),
                    source: std::io::Error::other("statement was never processed"),
                })
            })
        })
        .collect()
}
