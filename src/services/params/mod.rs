pub mod resolver;
pub mod ssm;
pub mod store;

pub use resolver::{ParameterKeys, ParameterResolver, PoolParams};
pub use ssm::SsmParameterStore;
pub use store::{Parameter, ParameterStore, ParameterStoreError};
