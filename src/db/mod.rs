pub mod memory;
pub mod pg;
pub mod pool;
pub mod queries;

pub use memory::MemoryOrderGateway;
pub use pg::PgOrderGateway;
pub use pool::create_pool;
