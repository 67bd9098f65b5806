//! Money ledger for the Humanity simulation.
//!
//! Every currency unit held by a human lives in this ledger. Balances are
//! signed (debt is allowed) and every change is tagged with a flow kind so
//! that the money supply can be audited at the end of every hour.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`Ledger`] struct: atomic per-agent accounts and flow counters.
//! - [`conservation`] -- Hourly money-supply verification.
//!
//! # Flow kinds
//!
//! | Flow | Direction |
//! |------|-----------|
//! | Salary, `ActionBonus`, `ApartmentSale`, `DebtWriteOff` | Source |
//! | `LivingExpense`, `ActionPrice`, `ApartmentPurchase`, `EstateRemainder` | Sink |
//! | `FamilySupport`, Inheritance | Internal |

pub mod conservation;
pub mod ledger;

// Re-export primary types at crate root.
pub use conservation::{ConservationResult, LedgerAnomaly, verify_conservation};
pub use ledger::{Flow, FlowDirection, FlowTotals, Ledger};
