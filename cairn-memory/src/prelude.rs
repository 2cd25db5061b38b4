pub use crate::error::{MemoryError, Result};
pub use crate::sqlite_store::SqliteMemoryStore;
pub use crate::store::{MemoryStore, StoreReceipt};
pub use crate::types::{Author, Memory, MemoryRelation, MemoryType, ModifyAction, NewMemory, Project, RelationKind};
