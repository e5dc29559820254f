//! Lodestone engine: store lifecycle, transactions, live objects, queries
//!
//! The engine ties the core types and the storage layer together:
//! - `store`: open/close/delete and the shared store state
//! - `migration`: schema/version resolution at open time
//! - `transaction`: the write-transaction guard (rollback on drop)
//! - `object`: live object handles with shared-record identity
//! - `query`: lazy predicate queries in creation order

mod migration;
mod object;
mod query;
mod store;
mod transaction;

pub use object::Object;
pub use query::{CompareOp, Predicate, Results, ResultsIter};
pub use store::Store;
pub use transaction::WriteTransaction;
