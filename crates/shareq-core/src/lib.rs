pub mod clock;
pub mod ids;
pub mod model;
pub mod policy;
pub mod types;

pub use clock::*;
pub use ids::*;
pub use model::*;
pub use policy::*;
pub use types::*;
