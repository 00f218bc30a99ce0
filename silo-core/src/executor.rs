use crate::{Result, RowLabeled, RowsAffected};
use std::future::Future;

/// Executes synthesized SQL text against the store.
///
/// Drivers own the connection and its lifecycle; the core only hands them
/// statement text and consumes the ordered row sequence that comes back.
pub trait Executor: Send {
    /// Run a statement and collect its labeled rows. Modify statements
    /// yield an empty sequence.
    fn fetch(&mut self, sql: String) -> impl Future<Output = Result<Vec<RowLabeled>>> + Send;

    /// Run a modify statement. The default routes through `fetch` and
    /// reports no affected-row count; drivers that know better override it.
    fn execute(&mut self, sql: String) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            self.fetch(sql).await?;
            Ok(RowsAffected::default())
        }
    }
}
