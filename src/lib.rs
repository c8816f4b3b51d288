pub mod config;
pub mod content;
pub mod lookup;
pub mod markup;
pub mod progress;
pub mod reconcile;
pub mod refresh;
pub mod slug;
pub mod textutil;

pub use lookup::{build_address_lookup, AddressLookup, Localizable};
pub use reconcile::{reconcile, ReconcileOptions, Reconciled, Reconciler};
