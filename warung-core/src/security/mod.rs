//! Edge shield: traffic shaping and anti-bot countermeasures
//!
//! Every component keeps its state in a bounded in-process cache and reads
//! time through the shared [`Clock`](crate::clock::Clock). State is per
//! instance and heuristic: two instances never see each other's counters.

pub mod blackhole;
pub mod classifier;
pub mod cloak;
pub mod decoy;
pub mod gate;
pub mod patterns;
pub mod rate_limit;
pub mod reputation;
pub mod sacrifice;

pub use blackhole::Blackhole;
pub use classifier::{classify, VisitorClass};
pub use cloak::{css_stego, dna_profile, inject_dna, Cloak, DnaProfile};
pub use decoy::escape_html;
pub use gate::{Gate, Screening, Verdict};
pub use rate_limit::{RateLimitPolicy, RateLimiter};
pub use reputation::Blacklist;
pub use sacrifice::{EnergyPolicy, IdentityStatus, Redirect, SacrificeIdentity, SacrificialRedirector};
