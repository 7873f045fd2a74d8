//! Two-phase commit state tracking.
//!
//! A connection runs at most one global (XA) transaction at a time:
//!
//! ```text
//! None --begin--> XidSet --prepare--> Prepared
//!  ^                |                    |
//!  +----commit / rollback (one phase)    |
//!  +----commit / rollback (two phase)----+
//! ```
//!
//! Every transition that is not allowed from the current state fails with a
//! programming error and leaves the tracker unchanged.
//!
//! The tracker also remembers whether the server branch was already ended
//! with `XA END`, so that a completion retried after a failed prepare does
//! not end it a second time.

use std::fmt;

use crate::error::{Error, Result};

/// Maximum length of a global transaction id.
pub const MAX_XID_LEN: usize = 64;

/// State of the connection's global transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TpcState {
    /// No global transaction.
    #[default]
    None,
    /// A transaction id is active.
    XidSet,
    /// The transaction was prepared.
    Prepared,
}

/// How a global transaction was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TpcCompletion {
    /// Completed without a prepare step.
    OnePhase,
    /// Completed after `prepare`.
    TwoPhase,
}

/// A global transaction id: 1 to 64 opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Xid(Vec<u8>);

impl Xid {
    /// Create a transaction id, checking its length.
    pub fn new(id: impl Into<Vec<u8>>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_XID_LEN {
            return Err(Error::programming(format!(
                "transaction id must be 1 to {MAX_XID_LEN} bytes, got {}",
                id.len()
            )));
        }
        Ok(Self(id))
    }

    /// The raw id.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Render the id as an XA statement literal.
    ///
    /// Printable ASCII ids are quoted with `'` and `\` escaped; anything else
    /// is written as a hex literal.
    #[must_use]
    pub fn as_sql_literal(&self) -> String {
        if self.0.iter().all(|b| (0x20..0x7F).contains(b)) {
            let mut out = String::with_capacity(self.0.len() + 2);
            out.push('\'');
            for &b in &self.0 {
                if b == b'\'' || b == b'\\' {
                    out.push('\\');
                }
                out.push(char::from(b));
            }
            out.push('\'');
            out
        } else {
            let hex: String = self.0.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}

impl TryFrom<&str> for Xid {
    type Error = Error;

    fn try_from(id: &str) -> Result<Self> {
        Self::new(id.as_bytes())
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_sql_literal())
    }
}

/// The two-phase commit state machine of one connection.
#[derive(Debug, Clone, Default)]
pub struct TpcTracker {
    state: TpcState,
    xid: Option<Xid>,
    ended: bool,
}

impl TpcTracker {
    /// A tracker with no active transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TpcState {
        self.state
    }

    /// The active transaction id.
    #[must_use]
    pub fn xid(&self) -> Option<&Xid> {
        self.xid.as_ref()
    }

    /// Whether `XA END` was already sent for the active transaction.
    #[must_use]
    pub fn branch_ended(&self) -> bool {
        self.ended
    }

    /// Record that `XA END` succeeded.
    pub fn mark_ended(&mut self) {
        if self.state != TpcState::None {
            self.ended = true;
        }
    }

    /// Start a global transaction. Only valid with no active transaction.
    pub fn begin(&mut self, xid: Xid) -> Result<()> {
        if self.state != TpcState::None {
            return Err(Error::programming("transaction already started"));
        }
        self.state = TpcState::XidSet;
        self.xid = Some(xid);
        self.ended = false;
        Ok(())
    }

    /// Prepare the active transaction.
    pub fn prepare(&mut self) -> Result<&Xid> {
        match (self.state, self.xid.as_ref()) {
            (TpcState::XidSet, Some(xid)) => {
                self.state = TpcState::Prepared;
                self.ended = true;
                Ok(xid)
            }
            (TpcState::Prepared, _) => Err(Error::programming("transaction already prepared")),
            _ => Err(Error::programming("transaction not started")),
        }
    }

    /// Commit the active transaction.
    pub fn commit(&mut self) -> Result<(Xid, TpcCompletion)> {
        self.finish()
    }

    /// Roll back the active transaction.
    pub fn rollback(&mut self) -> Result<(Xid, TpcCompletion)> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(Xid, TpcCompletion)> {
        let completion = match self.state {
            TpcState::None => return Err(Error::programming("transaction not started")),
            TpcState::XidSet => TpcCompletion::OnePhase,
            TpcState::Prepared => TpcCompletion::TwoPhase,
        };
        let xid = self
            .xid
            .take()
            .ok_or_else(|| Error::programming("transaction not started"))?;
        self.state = TpcState::None;
        self.ended = false;
        Ok((xid, completion))
    }
}

/// A server-side step of a global transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TpcStep {
    /// `tpc_begin`.
    Begin,
    /// `tpc_prepare`.
    Prepare,
    /// `tpc_commit`.
    Commit(TpcCompletion),
    /// `tpc_rollback`.
    Rollback(TpcCompletion),
}

impl TpcStep {
    /// Whether the step starts by ending the active branch.
    #[must_use]
    pub const fn ends_branch(self) -> bool {
        matches!(
            self,
            Self::Prepare
                | Self::Commit(TpcCompletion::OnePhase)
                | Self::Rollback(TpcCompletion::OnePhase)
        )
    }
}

/// The XA statements that carry out `step`, in order.
///
/// `XA END`, when needed, comes first. It is left out once the branch was
/// ended.
#[must_use]
pub fn tpc_statements(step: TpcStep, xid: &Xid, branch_ended: bool) -> Vec<String> {
    let id = xid.as_sql_literal();
    let mut out = Vec::with_capacity(2);
    if step.ends_branch() && !branch_ended {
        out.push(format!("XA END {id}"));
    }
    out.push(match step {
        TpcStep::Begin => format!("XA START {id}"),
        TpcStep::Prepare => format!("XA PREPARE {id}"),
        TpcStep::Commit(TpcCompletion::OnePhase) => format!("XA COMMIT {id} ONE PHASE"),
        TpcStep::Commit(TpcCompletion::TwoPhase) => format!("XA COMMIT {id}"),
        TpcStep::Rollback(_) => format!("XA ROLLBACK {id}"),
    });
    out
}
