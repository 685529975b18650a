pub mod container;
pub mod state;

pub use container::{Commit, EntityStore, Ticket};
pub use state::{EntityState, StoreEvent};
