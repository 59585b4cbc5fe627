//! Cursor-driven paging across deferred jobs

use super::models::Accumulator;
use super::poller::{poll, PollPolicy};
use super::submitter::submit;
use crate::config::Credentials;
use crate::error::Result;
use crate::network::Transport;
use crate::query::QuerySpec;
use tracing::{debug, info};

/// Run submit/poll cycles until the cursor runs out, a page comes back
/// empty, or `spec.cap` rows have been gathered.
///
/// Rows keep server order within and across pages. Any failure aborts the
/// whole run; rows gathered so far are dropped.
pub async fn fetch_pages(
    transport: &dyn Transport,
    credentials: &Credentials,
    spec: &QuerySpec,
    policy: PollPolicy,
) -> Result<Accumulator> {
    let mut acc = Accumulator::new(spec.cap);

    loop {
        let job = submit(transport, credentials, spec, acc.cursor.as_deref()).await?;
        let page = poll(transport, credentials, &job, &spec.original, policy).await?;
        let page_len = page.rows.len();

        let done = acc.absorb(page);
        debug!(
            "Page {} returned {} rows ({} total, cap {})",
            acc.pages,
            page_len,
            acc.rows.len(),
            acc.cap
        );

        if done {
            break;
        }
    }

    info!(
        "Query finished after {} page(s) with {} rows",
        acc.pages,
        acc.rows.len()
    );
    Ok(acc)
}
