//! Pool domain - pool records, bounded membership and the registry that mutates them

mod member_list;
mod pool_state;
mod registry;

pub use member_list::{MemberList, MemberToken};
pub use pool_state::Pool;
pub use registry::{AddToken, PoolRegistry, Registration};
