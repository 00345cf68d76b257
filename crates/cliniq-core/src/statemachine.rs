//! Forward-only status transition tables.
//!
//! Each money-bearing or schedule-bearing entity kind gets a fixed,
//! declarative table of allowed edges. The tables are data, not code, so
//! the rules stay auditable and testable independent of the hook logic
//! that enforces them. Updating an entity to its current status is always
//! a valid no-op.

use crate::models::invoice::InvoiceStatus;
use crate::models::visit::VisitStatus;

/// A transition table over a status type.
///
/// Rows list every non-terminal vertex with its outgoing edges; vertices
/// absent from the table are terminal.
pub struct StateMachine<S: 'static> {
    transitions: &'static [(S, &'static [S])],
}

impl<S: Copy + Eq> StateMachine<S> {
    pub const fn new(transitions: &'static [(S, &'static [S])]) -> Self {
        Self { transitions }
    }

    /// Whether `current -> next` is an allowed edge. Idempotent updates
    /// (`next == current`) are always allowed.
    pub fn is_valid_transition(&self, current: S, next: S) -> bool {
        current == next || self.available_transitions(current).contains(&next)
    }

    /// Outgoing edges from `current`; empty for terminal or unknown states.
    pub fn available_transitions(&self, current: S) -> &'static [S] {
        self.transitions
            .iter()
            .find(|(from, _)| *from == current)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }

    pub fn is_terminal(&self, status: S) -> bool {
        self.available_transitions(status).is_empty()
    }
}

/// Invoice lifecycle: `Draft -> {Issued, Cancelled}`,
/// `Issued -> {PartiallyPaid, Paid, Cancelled}`,
/// `PartiallyPaid -> {Paid, Cancelled}`; `Paid` and `Cancelled` terminal.
pub static INVOICE_TRANSITIONS: StateMachine<InvoiceStatus> = StateMachine::new(&[
    (
        InvoiceStatus::Draft,
        &[InvoiceStatus::Issued, InvoiceStatus::Cancelled],
    ),
    (
        InvoiceStatus::Issued,
        &[
            InvoiceStatus::PartiallyPaid,
            InvoiceStatus::Paid,
            InvoiceStatus::Cancelled,
        ],
    ),
    (
        InvoiceStatus::PartiallyPaid,
        &[InvoiceStatus::Paid, InvoiceStatus::Cancelled],
    ),
]);

/// Visit lifecycle: `Scheduled -> {Confirmed, Cancelled}`,
/// `Confirmed -> {Completed, Cancelled}`, `Cancelled -> Scheduled`
/// (reschedule); `Completed` terminal.
pub static VISIT_TRANSITIONS: StateMachine<VisitStatus> = StateMachine::new(&[
    (
        VisitStatus::Scheduled,
        &[VisitStatus::Confirmed, VisitStatus::Cancelled],
    ),
    (
        VisitStatus::Confirmed,
        &[VisitStatus::Completed, VisitStatus::Cancelled],
    ),
    (VisitStatus::Cancelled, &[VisitStatus::Scheduled]),
]);
