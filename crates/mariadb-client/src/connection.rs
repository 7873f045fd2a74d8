//! Connection handle.
//!
//! A [`Connection`] owns the transport, the configuration, the prepared
//! statement cache and the two-phase commit state of one server session.
//! Every operation takes `&mut self`, so a connection and the cursor
//! borrowing it are used by one caller at a time.

use mariadb_protocol::CharsetId;

use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::statement_cache::{PreparedStatement, StatementCache};
use crate::tpc::{TpcCompletion, TpcState, TpcStep, TpcTracker, Xid, tpc_statements};
use crate::transport::Transport;

/// A client session over a [`Transport`].
pub struct Connection<T: Transport> {
    transport: T,
    config: Config,
    cache: StatementCache,
    tpc: TpcTracker,
}

/// A prepared statement checked out for one execution.
#[derive(Debug)]
pub(crate) struct Checkout {
    pub(crate) stmt: PreparedStatement,
    /// The statement is not cached and must be closed after use.
    pub(crate) owned: bool,
}

impl<T: Transport> Connection<T> {
    /// Create a connection over an established transport.
    pub fn new(transport: T, config: Config) -> Self {
        let cache = StatementCache::new(config.prep_stmt_cache_size);
        Self {
            transport,
            config,
            cache,
            tpc: TpcTracker::new(),
        }
    }

    /// Open a cursor.
    pub fn cursor(&mut self) -> Cursor<'_, T> {
        Cursor::new(self)
    }

    /// The connection configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connection character set.
    #[must_use]
    pub fn charset(&self) -> CharsetId {
        self.config.charset
    }

    /// The prepared statement cache.
    #[must_use]
    pub fn statement_cache(&self) -> &StatementCache {
        &self.cache
    }

    /// The underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close all cached statements and return the transport.
    pub fn close(mut self) -> Result<T> {
        for stmt in self.cache.clear() {
            self.transport.close_statement(stmt.statement_id())?;
        }
        Ok(self.transport)
    }

    /// Prepare `sql`, consulting the statement cache first.
    pub(crate) fn checkout(&mut self, sql: &str) -> Result<Checkout> {
        if let Some(stmt) = self.cache.get(sql) {
            return Ok(Checkout {
                stmt: stmt.clone(),
                owned: false,
            });
        }

        let meta = self.transport.prepare(sql)?;
        tracing::debug!(
            sql = sql,
            id = meta.statement_id,
            params = meta.param_count,
            columns = meta.fields.len(),
            "prepared statement"
        );
        let stmt = PreparedStatement::new(sql, meta);
        let id = stmt.statement_id();

        match self.cache.insert(stmt.clone()) {
            Some(rejected) if rejected.statement_id() == id => Ok(Checkout { stmt, owned: true }),
            Some(evicted) => {
                self.transport.close_statement(evicted.statement_id())?;
                Ok(Checkout { stmt, owned: false })
            }
            None => Ok(Checkout { stmt, owned: false }),
        }
    }

    pub(crate) fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    // ========================================================================
    // Two-Phase Commit
    // ========================================================================

    /// Current two-phase commit state.
    #[must_use]
    pub fn tpc_state(&self) -> TpcState {
        self.tpc.state()
    }

    /// The active global transaction id.
    #[must_use]
    pub fn tpc_xid(&self) -> Option<&Xid> {
        self.tpc.xid()
    }

    /// Start a global transaction.
    pub fn tpc_begin(&mut self, xid: Xid) -> Result<()> {
        let mut next = self.tpc.clone();
        next.begin(xid.clone())?;
        self.run_tpc(TpcStep::Begin, &xid)?;
        self.tpc = next;
        Ok(())
    }

    /// Prepare the active global transaction.
    pub fn tpc_prepare(&mut self) -> Result<()> {
        let mut next = self.tpc.clone();
        let xid = next.prepare()?.clone();
        self.run_tpc(TpcStep::Prepare, &xid)?;
        self.tpc = next;
        Ok(())
    }

    /// Commit the active global transaction.
    pub fn tpc_commit(&mut self) -> Result<TpcCompletion> {
        let mut next = self.tpc.clone();
        let (xid, completion) = next.commit()?;
        self.run_tpc(TpcStep::Commit(completion), &xid)?;
        self.tpc = next;
        Ok(completion)
    }

    /// Roll back the active global transaction.
    pub fn tpc_rollback(&mut self) -> Result<TpcCompletion> {
        let mut next = self.tpc.clone();
        let (xid, completion) = next.rollback()?;
        self.run_tpc(TpcStep::Rollback(completion), &xid)?;
        self.tpc = next;
        Ok(completion)
    }

    fn run_tpc(&mut self, step: TpcStep, xid: &Xid) -> Result<()> {
        let ending = step.ends_branch() && !self.tpc.branch_ended();
        for (i, sql) in tpc_statements(step, xid, self.tpc.branch_ended())
            .iter()
            .enumerate()
        {
            tracing::debug!(statement = %sql, "two-phase commit step");
            self.transport.query(sql)?;
            // XA END comes first; keep it recorded if a later statement fails
            if ending && i == 0 {
                self.tpc.mark_ended();
            }
        }
        Ok(())
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("tpc", &self.tpc)
            .finish_non_exhaustive()
    }
}
